//! Track pool from a directory of audio files
//!
//! Scans for audio files and reads their tags. Analysis happens later, in
//! the mix pipeline.

mod scan;
mod tags;

pub use scan::{is_audio_file, scan_dir, AUDIO_EXTENSIONS};
pub use tags::{parse_bpm, read_tags, TrackTags, UNKNOWN_ARTIST};

use std::io;
use std::path::{Path, PathBuf};

/// An audio file with its tags, not yet analyzed
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub path: PathBuf,
    pub tags: TrackTags,
}

impl PoolEntry {
    pub fn new(path: PathBuf) -> Self {
        let tags = read_tags(&path);
        Self { path, tags }
    }

    /// Stable id of the file, the md5 of its path
    pub fn id(&self) -> String {
        format!("{:x}", md5::compute(self.path.to_string_lossy().as_bytes()))
    }
}

/// Scan `root` and read tags of every audio file found
pub fn load_pool(root: &Path) -> io::Result<Vec<PoolEntry>> {
    let entries: Vec<PoolEntry> = scan_dir(root)?.into_iter().map(PoolEntry::new).collect();
    let tagged_bpm = entries.iter().filter(|e| e.tags.bpm.is_some()).count();
    log::info!(
        "Track pool: {} files ({} with tagged BPM)",
        entries.len(),
        tagged_bpm
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pool_id_matches_track_id() {
        let entry = PoolEntry::new(PathBuf::from("/music/x.mp3"));
        let track = crate::model::MixTrack::new(
            PathBuf::from("/music/x.mp3"),
            "a",
            "b",
            crate::model::TrackAnalysis::from_metadata(100.0, 120.0, None, 5),
        );
        assert_eq!(entry.id(), track.id);
    }

    #[test]
    fn test_load_pool_reads_names() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Artist - Tune.wav"), b"not audio").unwrap();
        let pool = load_pool(temp.path()).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].tags.artist, "Artist");
        assert_eq!(pool[0].tags.title, "Tune");
    }
}
