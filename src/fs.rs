//! Filesystem access module
//!
//! Thin async wrappers over `tokio::fs` exposing exactly the capability
//! the handler consumes: stat, type probes, whole-file reads, and
//! opening a file for ranged reads. A missing file is the `None` state,
//! never an error; genuine I/O failures propagate.

use std::io;
use std::time::UNIX_EPOCH;
use tokio::fs;

/// The subset of stat output the handler cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    /// Seconds since the Unix epoch; 0 when unavailable.
    pub mtime: i64,
    /// Inode number; 0 on platforms without one.
    pub inode: u64,
}

/// Stat a path. `None` means the path does not exist (or is not
/// reachable), which callers treat as a missing resource.
pub async fn stat(path: &str) -> Option<FileStat> {
    let metadata = fs::metadata(path).await.ok()?;

    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or(0);

    Some(FileStat {
        size: metadata.len(),
        mtime,
        inode: inode_of(&metadata),
    })
}

pub async fn is_directory(path: &str) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

pub async fn is_file(path: &str) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Read an entire file into memory. Used only for the small-file
/// buffering optimization.
pub async fn read(path: &str) -> io::Result<Vec<u8>> {
    fs::read(path).await
}

/// Open a file for ranged streaming reads.
pub async fn open_for_read(path: &str) -> io::Result<fs::File> {
    fs::File::open(path).await
}

/// Size of a file as of right now, bypassing any cached stat.
pub async fn size_of(path: &str) -> io::Result<u64> {
    Ok(fs::metadata(path).await?.len())
}

#[cfg(unix)]
fn inode_of(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn inode_of(_metadata: &std::fs::Metadata) -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_stat_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hello").unwrap();

        let stat = stat(&path_str(&file)).await.unwrap();
        assert_eq!(stat.size, 5);
        assert!(stat.mtime > 0);
        #[cfg(unix)]
        assert!(stat.inode > 0);
    }

    #[tokio::test]
    async fn test_stat_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(stat(&path_str(&missing)).await.is_none());
    }

    #[tokio::test]
    async fn test_type_probes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();

        assert!(is_directory(&path_str(dir.path())).await);
        assert!(!is_file(&path_str(dir.path())).await);
        assert!(is_file(&path_str(&file)).await);
        assert!(!is_directory(&path_str(&file)).await);
    }
}
