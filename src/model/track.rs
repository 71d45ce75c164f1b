use super::analysis::TrackAnalysis;
use super::key::CamelotKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A track taking part in one mix job, with its analysis attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixTrack {
    /// Unique identifier for this track (md5 of the file path)
    pub id: String,

    /// File path to the audio file
    pub file_path: PathBuf,

    pub artist: String,

    pub title: String,

    /// Genre (optional), drives BPM tolerance and phrase length
    pub genre: Option<String>,

    pub bpm: f64,

    pub camelot_key: Option<CamelotKey>,

    /// Normalized energy 0..1
    pub energy: f32,

    /// Optional 0..1 preference/danceability hint from the pool provider
    pub danceability: Option<f32>,

    pub analysis: TrackAnalysis,
}

impl MixTrack {
    /// Build a mix track from an analysis, taking BPM/key/energy from it
    pub fn new(file_path: PathBuf, artist: &str, title: &str, analysis: TrackAnalysis) -> Self {
        let id = format!("{:x}", md5::compute(file_path.to_string_lossy().as_bytes()));
        Self {
            id,
            file_path,
            artist: artist.to_string(),
            title: title.to_string(),
            genre: None,
            bpm: analysis.bpm,
            camelot_key: analysis.key,
            energy: analysis.energy as f32 / 10.0,
            danceability: None,
            analysis,
        }
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = genre;
        self
    }

    pub fn with_danceability(mut self, danceability: Option<f32>) -> Self {
        self.danceability = danceability.map(|d| d.clamp(0.0, 1.0));
        self
    }

    /// Copy with manually overridden mix points; the original stays untouched
    pub fn with_mix_points(&self, mix_in: Option<f64>, mix_out: Option<f64>) -> Self {
        let mut copy = self.clone();
        copy.analysis = self.analysis.with_mix_points(mix_in, mix_out);
        copy
    }

    pub fn duration(&self) -> f64 {
        self.analysis.duration
    }

    /// "Artist - Title" for logs and notes
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    /// Same-artist check used by the sequencer (case-insensitive, empty never matches)
    pub fn same_artist(&self, other: &MixTrack) -> bool {
        let a = self.artist.trim();
        let b = other.artist.trim();
        !a.is_empty() && a.eq_ignore_ascii_case(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(artist: &str) -> MixTrack {
        MixTrack::new(
            PathBuf::from(format!("/music/{}.mp3", artist)),
            artist,
            "Song",
            TrackAnalysis::from_metadata(180.0, 128.0, None, 5),
        )
    }

    #[test]
    fn test_energy_from_analysis() {
        let t = track("A");
        assert!((t.energy - 0.5).abs() < 1e-6);
        assert_eq!(t.bpm, 128.0);
        assert_eq!(t.id.len(), 32);
    }

    #[test]
    fn test_same_artist() {
        let a = track("Daft Punk");
        let mut b = track("Other");
        b.artist = " daft punk ".to_string();
        assert!(a.same_artist(&b));

        let mut empty1 = track("x");
        empty1.artist = String::new();
        let empty2 = empty1.clone();
        assert!(!empty1.same_artist(&empty2));
    }

    #[test]
    fn test_mix_point_override_is_copy() {
        let original = track("A");
        let overridden = original.with_mix_points(Some(16.0), Some(150.0));
        assert_eq!(overridden.analysis.mix_in_point, 16.0);
        assert_eq!(overridden.analysis.mix_out_point, 150.0);
        assert_eq!(original.analysis.mix_in_point, 0.0);
    }
}
