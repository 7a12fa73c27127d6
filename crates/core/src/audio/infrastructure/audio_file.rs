use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::elevenlabs_transformer::validate_audio;
use crate::audio::domain::transform_error::TransformError;
use crate::shared::atomic_file::write_atomic;
use crate::shared::audio_asset::AudioAsset;
use crate::shared::constants::{APP_DIR_NAME, AUDIO_EXTENSIONS, MAX_AUDIO_BYTES};

#[derive(Error, Debug)]
pub enum AudioFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("{path} is not a supported audio file (use {})", AUDIO_EXTENSIONS.join(", "))]
    Unsupported { path: PathBuf },
    #[error("{path} is {size} bytes; the maximum file size is 10 MB")]
    TooLarge { path: PathBuf, size: u64 },
    #[error(transparent)]
    Invalid(#[from] TransformError),
}

/// Loads a file from disk into an [`AudioAsset`] named after the file.
pub fn read_audio_file(path: &Path) -> Result<AudioAsset, AudioFileError> {
    let data = fs::read(path).map_err(|e| AudioFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    Ok(AudioAsset::from_named_bytes(name, data))
}

/// Writes an asset's bytes to `dest`, via a `.part` file renamed into place.
pub fn write_audio_file(dest: &Path, audio: &AudioAsset) -> Result<(), AudioFileError> {
    write_atomic(dest, audio.data()).map_err(|source| AudioFileError::Write {
        path: dest.to_path_buf(),
        source,
    })
}

/// Loads a file the user picked as the source clip.
///
/// Rejects files without an audio extension and files over the size limit
/// before reading them, then applies the same checks a transformation would.
pub fn load_source_audio(path: &Path) -> Result<AudioAsset, AudioFileError> {
    if !is_audio_path(path) {
        return Err(AudioFileError::Unsupported {
            path: path.to_path_buf(),
        });
    }
    let size = fs::metadata(path)
        .map_err(|e| AudioFileError::Read {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();
    if size > MAX_AUDIO_BYTES {
        return Err(AudioFileError::TooLarge {
            path: path.to_path_buf(),
            size,
        });
    }
    let audio = read_audio_file(path)?;
    validate_audio(&audio)?;
    Ok(audio)
}

fn is_audio_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Platform cache directory for transformed clips written out for playback.
pub fn audio_cache_dir() -> Result<PathBuf, AudioFileError> {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR_NAME).join("transformed"))
        .ok_or(AudioFileError::NoCacheDir)
}

/// Deletes every cached clip, including those in subdirectories such as
/// the blind-test folder. A missing directory is not an error.
pub fn purge_audio_cache(dir: &Path) -> Result<usize, AudioFileError> {
    let removed = purge_dir(dir)?;
    log::info!("Purged {removed} cached clips from {}", dir.display());
    Ok(removed)
}

fn purge_dir(dir: &Path) -> Result<usize, AudioFileError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(AudioFileError::Read {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            removed += purge_dir(&path)?;
            if let Err(e) = fs::remove_dir(&path) {
                log::debug!("Keeping {}: {e}", path.display());
            }
        } else if fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(0);

/// A clip written to the cache directory, deleted when dropped.
///
/// Holding one per displayed asset ties the on-disk copy to the asset's
/// lifetime, so replacing an upload or a result releases the old file.
#[derive(Debug)]
pub struct CachedAudioFile {
    path: PathBuf,
}

impl CachedAudioFile {
    pub fn create(dir: &Path, audio: &AudioAsset) -> Result<Self, AudioFileError> {
        Self::create_named(dir, audio.name(), audio)
    }

    /// Writes `audio` under a caller-chosen name, e.g. a neutral blind-test
    /// label that does not give away which clip is which.
    pub fn create_named(
        dir: &Path,
        name: &str,
        audio: &AudioAsset,
    ) -> Result<Self, AudioFileError> {
        let id = NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("{}-{id}-{name}", std::process::id()));
        write_audio_file(&path, audio)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CachedAudioFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::debug!("Could not remove {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_audio_file_uses_file_name_and_mime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sample.wav");
        fs::write(&path, vec![7u8; 512]).unwrap();

        let asset = read_audio_file(&path).unwrap();
        assert_eq!(asset.name(), "sample.wav");
        assert_eq!(asset.mime_type(), "audio/wav");
        assert_eq!(asset.size_bytes(), 512);
    }

    #[test]
    fn test_read_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        let result = read_audio_file(&tmp.path().join("missing.wav"));
        assert!(matches!(result, Err(AudioFileError::Read { .. })));
    }

    #[test]
    fn test_write_audio_file_is_atomic() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out").join("sample_british.wav");
        let asset = AudioAsset::new("sample_british.wav", "audio/wav", vec![1, 2, 3]);

        write_audio_file(&dest, &asset).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), vec![1, 2, 3]);
        assert!(!tmp.path().join("out").join("sample_british.wav.part").exists());
    }

    #[test]
    fn test_cached_file_removed_on_drop() {
        let tmp = TempDir::new().unwrap();
        let asset = AudioAsset::new("clip.wav", "audio/wav", vec![0; 16]);

        let cached = CachedAudioFile::create(tmp.path(), &asset).unwrap();
        let path = cached.path().to_path_buf();
        assert!(path.exists());
        drop(cached);
        assert!(!path.exists());
    }

    #[test]
    fn test_create_named_uses_given_name() {
        let tmp = TempDir::new().unwrap();
        let asset = AudioAsset::new("secret_british.wav", "audio/wav", vec![0; 4]);
        let cached = CachedAudioFile::create_named(tmp.path(), "audio_a.wav", &asset).unwrap();
        let file_name = cached.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.ends_with("audio_a.wav"));
        assert!(!file_name.contains("british"));
    }

    #[test]
    fn test_cached_files_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let asset = AudioAsset::new("clip.wav", "audio/wav", vec![0; 16]);
        let a = CachedAudioFile::create(tmp.path(), &asset).unwrap();
        let b = CachedAudioFile::create(tmp.path(), &asset).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_purge_removes_files_and_tolerates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.wav"), b"a").unwrap();
        fs::write(tmp.path().join("b.wav"), b"b").unwrap();

        assert_eq!(purge_audio_cache(tmp.path()).unwrap(), 2);
        assert_eq!(purge_audio_cache(&tmp.path().join("missing")).unwrap(), 0);
    }

    #[test]
    fn test_purge_reaches_blind_test_clips() {
        let tmp = TempDir::new().unwrap();
        let blind = tmp.path().join("blind");
        fs::create_dir_all(&blind).unwrap();
        fs::write(blind.join("123-0-audio_a.wav"), b"a").unwrap();
        fs::write(blind.join("123-1-audio_b.wav"), b"b").unwrap();
        fs::write(tmp.path().join("clip_irish.wav"), b"c").unwrap();

        assert_eq!(purge_audio_cache(tmp.path()).unwrap(), 3);
        assert!(!blind.join("123-0-audio_a.wav").exists());
        assert!(!blind.exists());
        assert!(tmp.path().exists());
    }

    #[test]
    fn test_load_source_audio_accepts_audio_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Voice.MP3");
        fs::write(&path, vec![1u8; 64]).unwrap();

        let audio = load_source_audio(&path).unwrap();
        assert_eq!(audio.mime_type(), "audio/mpeg");
    }

    #[test]
    fn test_load_source_audio_rejects_non_audio() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let err = load_source_audio(&path).unwrap_err();
        assert!(matches!(err, AudioFileError::Unsupported { .. }));
        assert!(err.to_string().contains("wav"));
    }

    #[test]
    fn test_load_source_audio_rejects_oversized_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("long.wav");
        fs::write(&path, vec![0u8; MAX_AUDIO_BYTES as usize + 1]).unwrap();

        let err = load_source_audio(&path).unwrap_err();
        assert!(matches!(err, AudioFileError::TooLarge { .. }));
    }

    #[test]
    fn test_load_source_audio_rejects_empty_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.wav");
        fs::write(&path, b"").unwrap();

        let err = load_source_audio(&path).unwrap_err();
        assert!(matches!(
            err,
            AudioFileError::Invalid(TransformError::InvalidAudio(_))
        ));
    }
}
