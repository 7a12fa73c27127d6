use std::path::Path;

use thiserror::Error;

use crate::audio::infrastructure::audio_file::{audio_cache_dir, purge_audio_cache, AudioFileError};
use crate::shared::constants::APP_VERSION_STORAGE_KEY;
use crate::storage::domain::key_value_store::{KeyValueStore, StorageError};

/// Build identifier shipped with this binary.
pub const BUILD_ID: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    FirstRun,
    Unchanged,
    Upgraded { previous: String },
}

impl VersionStatus {
    pub fn needs_invalidation(&self) -> bool {
        !matches!(self, VersionStatus::Unchanged)
    }
}

/// Startup check comparing the shipped build id with the one stored last run.
///
/// When they differ (or nothing is stored), `invalidate` runs once and then the
/// stored marker is replaced in a single write. If `invalidate` fails the
/// marker is left untouched so the next start tries again.
pub fn reconcile_build_version<E>(
    store: &dyn KeyValueStore,
    build_id: &str,
    invalidate: impl FnOnce(&VersionStatus) -> Result<(), E>,
) -> Result<VersionStatus, E>
where
    E: From<StorageError>,
{
    let status = match store.get(APP_VERSION_STORAGE_KEY) {
        None => VersionStatus::FirstRun,
        Some(stored) if stored == build_id => VersionStatus::Unchanged,
        Some(stored) => VersionStatus::Upgraded { previous: stored },
    };

    if status.needs_invalidation() {
        log::info!("Build changed ({status:?} -> {build_id}), clearing cached state");
        invalidate(&status)?;
        store.set(APP_VERSION_STORAGE_KEY, build_id)?;
    }
    Ok(status)
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Cache(#[from] AudioFileError),
}

/// Runs the build check for this binary, clearing cached clips on a new build.
pub fn startup_check(store: &dyn KeyValueStore) -> Result<VersionStatus, StartupError> {
    let cache_dir = audio_cache_dir()?;
    startup_check_in(store, BUILD_ID, &cache_dir)
}

fn startup_check_in(
    store: &dyn KeyValueStore,
    build_id: &str,
    cache_dir: &Path,
) -> Result<VersionStatus, StartupError> {
    reconcile_build_version(store, build_id, |_| {
        purge_audio_cache(cache_dir)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::infrastructure::memory_store::MemoryStore;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[derive(Debug)]
    enum TestError {
        Storage,
        Invalidate,
    }

    impl From<StorageError> for TestError {
        fn from(_: StorageError) -> Self {
            TestError::Storage
        }
    }

    #[test]
    fn test_first_run_invalidates_and_stores() {
        let store = MemoryStore::new();
        let calls = Cell::new(0);
        let status = reconcile_build_version::<TestError>(&store, "1.0.0", |_| {
            calls.set(calls.get() + 1);
            Ok(())
        })
        .unwrap();

        assert_eq!(status, VersionStatus::FirstRun);
        assert_eq!(calls.get(), 1);
        assert_eq!(store.get(APP_VERSION_STORAGE_KEY).as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_same_build_does_nothing() {
        let store = MemoryStore::new();
        store.set(APP_VERSION_STORAGE_KEY, "1.0.0").unwrap();
        let status = reconcile_build_version::<TestError>(&store, "1.0.0", |_| {
            panic!("must not invalidate an unchanged build")
        })
        .unwrap();
        assert_eq!(status, VersionStatus::Unchanged);
    }

    #[test]
    fn test_upgrade_runs_once() {
        let store = MemoryStore::new();
        store.set(APP_VERSION_STORAGE_KEY, "0.9.0").unwrap();
        let calls = Cell::new(0);
        let run = || {
            reconcile_build_version::<TestError>(&store, "1.0.0", |_| {
                calls.set(calls.get() + 1);
                Ok(())
            })
            .unwrap()
        };

        assert_eq!(
            run(),
            VersionStatus::Upgraded {
                previous: "0.9.0".into()
            }
        );
        assert_eq!(run(), VersionStatus::Unchanged);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failed_invalidation_keeps_old_marker() {
        let store = MemoryStore::new();
        store.set(APP_VERSION_STORAGE_KEY, "0.9.0").unwrap();
        let result = reconcile_build_version(&store, "1.0.0", |_| Err(TestError::Invalidate));

        assert!(matches!(result, Err(TestError::Invalidate)));
        assert_eq!(store.get(APP_VERSION_STORAGE_KEY).as_deref(), Some("0.9.0"));
    }

    #[test]
    fn test_startup_check_purges_cache_on_new_build() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("old_british.wav"), b"x").unwrap();
        let store = MemoryStore::new();
        store.set(APP_VERSION_STORAGE_KEY, "0.1.0").unwrap();

        let status = startup_check_in(&store, "0.2.0", tmp.path()).unwrap();
        assert!(status.needs_invalidation());
        assert!(!tmp.path().join("old_british.wav").exists());

        std::fs::write(tmp.path().join("new.wav"), b"x").unwrap();
        startup_check_in(&store, "0.2.0", tmp.path()).unwrap();
        assert!(tmp.path().join("new.wav").exists());
    }

    #[test]
    fn test_new_build_clears_blind_test_clips() {
        let tmp = TempDir::new().unwrap();
        let blind = tmp.path().join("blind");
        std::fs::create_dir_all(&blind).unwrap();
        std::fs::write(blind.join("123-0-audio_a.wav"), b"x").unwrap();
        let store = MemoryStore::new();
        store.set(APP_VERSION_STORAGE_KEY, "0.1.0").unwrap();

        let status = startup_check_in(&store, "0.2.0", tmp.path()).unwrap();
        assert!(status.needs_invalidation());
        assert!(!blind.join("123-0-audio_a.wav").exists());
    }
}
