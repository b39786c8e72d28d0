//! Upload Directory
//!
//! `StorageDir` is the handle to the one directory where uploaded files are
//! kept. It is constructed once at startup and passed to the handlers through
//! `AppState`; nothing in the crate refers to the directory globally.
//!
//! All filesystem access goes through `tokio::fs`, which runs the blocking
//! calls on tokio's blocking pool. There is no locking: concurrent uploads of
//! the same name race at the filesystem level and the last writer wins.

pub mod filename;

pub use filename::validate_filename;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::types::{AppError, AppResult};

/// Handle to the upload directory
#[derive(Debug, Clone)]
pub struct StorageDir {
    root: PathBuf,
}

/// Outcome of a best-effort [`StorageDir::clear`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub removed: usize,
    pub failed: usize,
}

impl ClearReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// A regular file currently present in the upload directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl StorageDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn is_available(&self) -> bool {
        fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory (and its parents) if it is missing.
    pub async fn ensure_exists(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Remove every entry directly under the root.
    ///
    /// Never fails: problems are logged and counted in the report so that
    /// startup can carry on. Directories are removed recursively.
    pub async fn clear(&self) -> ClearReport {
        let mut report = ClearReport::default();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.root.display(), "Upload directory does not exist, nothing to clear");
                return report;
            }
            Err(e) => {
                error!(path = %self.root.display(), "Failed to read upload directory: {}", e);
                report.failed += 1;
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!(path = %self.root.display(), "Failed to enumerate upload directory: {}", e);
                    report.failed += 1;
                    break;
                }
            };

            let path = entry.path();
            match remove_entry(&entry).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed stale upload");
                    report.removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Entry disappeared before it could be removed");
                }
                Err(e) => {
                    error!(path = %path.display(), "Failed to remove entry: {}", e);
                    report.failed += 1;
                }
            }
        }

        if report.removed == 0 && report.failed == 0 {
            debug!(path = %self.root.display(), "Upload directory already empty");
        } else if report.is_clean() {
            info!(path = %self.root.display(), removed = report.removed, "Upload directory cleared");
        } else {
            warn!(
                path = %self.root.display(),
                removed = report.removed,
                failed = report.failed,
                "Upload directory only partially cleared"
            );
        }

        report
    }

    /// Path for `filename` inside the root, after validating the name.
    pub fn resolve(&self, filename: &str) -> AppResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    /// Write `contents` to `filename`, replacing any existing file.
    pub async fn write(&self, filename: &str, contents: &[u8]) -> AppResult<PathBuf> {
        let path = self.resolve(filename)?;
        fs::write(&path, contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "Stored file");
        Ok(path)
    }

    /// Look up a stored file. Missing names and directories are `NotFound`.
    pub async fn open(&self, filename: &str) -> AppResult<StoredFile> {
        let path = self.resolve(filename)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(AppError::NotFound),
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(AppError::NotFound);
        }

        Ok(StoredFile {
            name: filename.to_string(),
            path,
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    /// Names of all immediate entries, files and directories alike, sorted.
    pub async fn list(&self) -> AppResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        names.sort();
        Ok(names)
    }
}

async fn remove_entry(entry: &fs::DirEntry) -> io::Result<()> {
    let path = entry.path();
    // file_type() does not follow symlinks, so a link to a directory is unlinked
    if entry.file_type().await?.is_dir() {
        fs::remove_dir_all(&path).await
    } else {
        fs::remove_file(&path).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_in(temp_dir: &TempDir) -> StorageDir {
        StorageDir::new(temp_dir.path().join("uploaded_files"))
    }

    #[tokio::test]
    async fn test_ensure_exists_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageDir::new(temp_dir.path().join("a/b/uploads"));

        storage.ensure_exists().await.unwrap();
        storage.ensure_exists().await.unwrap();

        assert!(storage.root().is_dir());
    }

    #[tokio::test]
    async fn test_ensure_exists_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("uploads");
        std::fs::write(&root, b"not a directory").unwrap();

        let storage = StorageDir::new(&root);
        assert!(matches!(storage.ensure_exists().await, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_clear_removes_files_and_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);
        storage.ensure_exists().await.unwrap();

        std::fs::write(storage.root().join("a.txt"), b"a").unwrap();
        std::fs::write(storage.root().join("b.bin"), b"b").unwrap();
        std::fs::create_dir_all(storage.root().join("nested/deeper")).unwrap();
        std::fs::write(storage.root().join("nested/deeper/c.txt"), b"c").unwrap();

        let report = storage.clear().await;

        assert_eq!(report, ClearReport { removed: 3, failed: 0 });
        assert!(storage.root().is_dir());
        assert_eq!(std::fs::read_dir(storage.root()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_clear_on_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);
        storage.ensure_exists().await.unwrap();

        let report = storage.clear().await;
        assert_eq!(report, ClearReport::default());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_clear_on_missing_directory_does_not_fail() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);

        let report = storage.clear().await;
        assert_eq!(report, ClearReport::default());
    }

    #[tokio::test]
    async fn test_clear_counts_unreadable_root_as_failure() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("uploaded_files");
        std::fs::write(&root, b"not a directory").unwrap();

        let report = StorageDir::new(&root).clear().await;

        assert_eq!(report, ClearReport { removed: 0, failed: 1 });
        assert!(!report.is_clean());
        assert!(root.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clear_continues_past_failed_removal() {
        use super::test_support::{lock_directory, unlock_directory};

        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);
        storage.ensure_exists().await.unwrap();

        std::fs::write(storage.root().join("a.txt"), b"a").unwrap();
        let locked = storage.root().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("inner.txt"), b"stuck").unwrap();

        if !lock_directory(&locked) {
            // Directory permissions are not enforced for this user
            return;
        }

        let report = storage.clear().await;
        unlock_directory(&locked);

        assert_eq!(report, ClearReport { removed: 1, failed: 1 });
        assert!(!storage.root().join("a.txt").exists());
        assert!(locked.join("inner.txt").exists());
    }

    #[tokio::test]
    async fn test_write_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);
        storage.ensure_exists().await.unwrap();

        storage.write("a.txt", b"first version").await.unwrap();
        let path = storage.write("a.txt", b"second").await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_write_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);
        storage.ensure_exists().await.unwrap();

        let result = storage.write("../escaped.txt", b"nope").await;

        assert!(matches!(result, Err(AppError::InvalidFilename(_))));
        assert!(!temp_dir.path().join("escaped.txt").exists());
    }

    #[tokio::test]
    async fn test_write_fails_when_root_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);

        assert!(matches!(storage.write("a.txt", b"a").await, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_open_reports_size_and_rejects_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);
        storage.ensure_exists().await.unwrap();

        storage.write("hello.txt", b"hello").await.unwrap();
        std::fs::create_dir(storage.root().join("subdir")).unwrap();

        let file = storage.open("hello.txt").await.unwrap();
        assert_eq!(file.name, "hello.txt");
        assert_eq!(file.size, 5);
        assert!(file.modified.is_some());

        assert!(matches!(storage.open("subdir").await, Err(AppError::NotFound)));
        assert!(matches!(storage.open("missing.txt").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_includes_directories_and_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);
        storage.ensure_exists().await.unwrap();

        assert!(storage.list().await.unwrap().is_empty());

        storage.write("y.bin", b"y").await.unwrap();
        storage.write("x.bin", b"x").await.unwrap();
        std::fs::create_dir(storage.root().join("leftover")).unwrap();

        assert_eq!(storage.list().await.unwrap(), vec!["leftover", "x.bin", "y.bin"]);
    }

    #[tokio::test]
    async fn test_list_fails_when_root_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_in(&temp_dir);

        assert!(matches!(storage.list().await, Err(AppError::Io(_))));
    }
}
