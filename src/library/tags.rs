//! Tag reading with file-name fallbacks

use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use std::path::Path;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// What the pool needs from a file's tags
#[derive(Debug, Clone, PartialEq)]
pub struct TrackTags {
    pub artist: String,
    pub title: String,
    pub genre: Option<String>,
    /// Tagged tempo; trusted by the extractor when present
    pub bpm: Option<f64>,
}

impl TrackTags {
    /// Tags guessed from the file name: "Artist - Title.ext" or just "Title.ext"
    pub fn from_file_name(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .unwrap_or_default();
        let (artist, title) = match stem.split_once(" - ") {
            Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
                (artist.trim().to_string(), title.trim().to_string())
            }
            _ => (UNKNOWN_ARTIST.to_string(), stem),
        };
        Self {
            artist,
            title,
            genre: None,
            bpm: None,
        }
    }
}

/// Read artist/title/genre/BPM; never fails, missing fields come from the
/// file name
pub fn read_tags(path: &Path) -> TrackTags {
    let mut tags = TrackTags::from_file_name(path);

    let tagged = match Probe::open(path).and_then(|p| p.read()) {
        Ok(tagged) => tagged,
        Err(e) => {
            log::debug!("No readable tags in {:?}: {}", path, e);
            return tags;
        }
    };
    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return tags;
    };

    if let Some(artist) = non_empty(tag.artist().as_deref()) {
        tags.artist = artist;
    }
    if let Some(title) = non_empty(tag.title().as_deref()) {
        tags.title = title;
    }
    tags.genre = non_empty(tag.genre().as_deref());
    tags.bpm = tag_bpm(tag);
    tags
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn tag_bpm(tag: &Tag) -> Option<f64> {
    [ItemKey::Bpm, ItemKey::IntegerBpm]
        .iter()
        .filter_map(|key| tag.get_string(key))
        .find_map(parse_bpm)
}

/// Parse a BPM tag value such as "128", "127.9" or "128 BPM"
pub fn parse_bpm(raw: &str) -> Option<f64> {
    let number = raw
        .trim()
        .trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace())
        .replace(',', ".");
    number
        .parse::<f64>()
        .ok()
        .filter(|bpm| bpm.is_finite() && *bpm > 20.0 && *bpm < 400.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_fallback() {
        let tags = TrackTags::from_file_name(Path::new("/music/Daft Punk - Aerodynamic.mp3"));
        assert_eq!(tags.artist, "Daft Punk");
        assert_eq!(tags.title, "Aerodynamic");

        let tags = TrackTags::from_file_name(Path::new("/music/untitled.wav"));
        assert_eq!(tags.artist, UNKNOWN_ARTIST);
        assert_eq!(tags.title, "untitled");
    }

    #[test]
    fn test_parse_bpm() {
        assert_eq!(parse_bpm("128"), Some(128.0));
        assert_eq!(parse_bpm(" 127,5 BPM"), Some(127.5));
        assert_eq!(parse_bpm("0"), None);
        assert_eq!(parse_bpm("fast"), None);
    }

    #[test]
    fn test_unreadable_file_uses_name() {
        let tags = read_tags(Path::new("/nonexistent/Artist - Song.flac"));
        assert_eq!(tags.artist, "Artist");
        assert_eq!(tags.title, "Song");
        assert_eq!(tags.bpm, None);
    }
}
