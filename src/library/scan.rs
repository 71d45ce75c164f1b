//! Directory scanning for audio files

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions treated as audio, lowercase
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "aiff", "aif"];

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// All audio files under `root`, sorted by path
///
/// Unreadable entries below the root are logged and skipped.
pub fn scan_dir(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        ));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    log::info!("Found {} audio files under {:?}", files.len(), root);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("/music/a.MP3")));
        assert!(is_audio_file(Path::new("b.flac")));
        assert!(!is_audio_file(Path::new("cover.jpg")));
        assert!(!is_audio_file(Path::new("README")));
    }

    #[test]
    fn test_scan_dir_recurses_and_sorts() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("b/c")).unwrap();
        fs::write(temp.path().join("b/c/2.wav"), b"").unwrap();
        fs::write(temp.path().join("1.mp3"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();

        let files = scan_dir(temp.path()).unwrap();
        assert_eq!(files, vec![temp.path().join("1.mp3"), temp.path().join("b/c/2.wav")]);
    }

    #[test]
    fn test_scan_missing_dir() {
        assert!(scan_dir(Path::new("/nonexistent/music/dir")).is_err());
    }
}
