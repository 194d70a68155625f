//! Resolved file metadata
//!
//! Immutable per-resource metadata computed on a cache miss: existence,
//! stat fields, the derived entity tag, and optionally the buffered
//! file content for small files.

use crate::fs::FileStat;
use hyper::body::Bytes;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Metadata for one resolved resource. Created once per lookup and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Filesystem path actually served; differs from the request path
    /// when a directory index file was substituted.
    pub path: String,
    pub exists: bool,
    pub size: u64,
    /// Seconds since the Unix epoch; 0 if unknown.
    pub mtime: i64,
    /// 0 when unavailable or disabled.
    pub inode: u64,
    /// Empty when the file does not exist.
    pub etag: String,
    /// Whole file content for buffered small files. When present its
    /// length always equals `size`.
    pub buffer: Option<Bytes>,
}

impl FileInfo {
    /// Metadata for a path with no servable file behind it.
    #[must_use]
    pub fn non_existent(path: &str) -> Self {
        Self {
            path: path.to_string(),
            exists: false,
            size: 0,
            mtime: 0,
            inode: 0,
            etag: String::new(),
            buffer: None,
        }
    }

    /// Metadata for an existing file served by streaming from disk.
    #[must_use]
    pub fn unbuffered(path: &str, stat: FileStat, use_etag_inode: bool) -> Self {
        Self {
            path: path.to_string(),
            exists: true,
            size: stat.size,
            mtime: stat.mtime,
            inode: stat.inode,
            etag: generate_etag(path, &stat, use_etag_inode),
            buffer: None,
        }
    }

    /// Metadata for an existing file with its content held in memory.
    ///
    /// The size is taken from the buffer rather than the stat result so
    /// the `buffer.len() == size` invariant holds even if the file
    /// changed between stat and read.
    #[must_use]
    pub fn buffered(path: &str, stat: FileStat, use_etag_inode: bool, contents: Bytes) -> Self {
        Self {
            path: path.to_string(),
            exists: true,
            size: contents.len() as u64,
            mtime: stat.mtime,
            inode: stat.inode,
            etag: generate_etag(path, &stat, use_etag_inode),
            buffer: Some(contents),
        }
    }

    #[must_use]
    pub const fn is_buffered(&self) -> bool {
        self.buffer.is_some()
    }
}

/// Derive an entity tag from the path and stat fields.
fn generate_etag(path: &str, stat: &FileStat, use_inode: bool) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    stat.mtime.hash(&mut hasher);
    stat.size.hash(&mut hasher);
    if use_inode {
        stat.inode.hash(&mut hasher);
    }
    format!("{:x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: FileStat = FileStat {
        size: 4,
        mtime: 1_700_000_000,
        inode: 42,
    };

    #[test]
    fn test_non_existent_has_empty_etag() {
        let info = FileInfo::non_existent("/tmp/missing");
        assert!(!info.exists);
        assert!(info.etag.is_empty());
        assert_eq!(info.size, 0);
        assert!(info.buffer.is_none());
    }

    #[test]
    fn test_etag_stable_for_same_inputs() {
        let a = FileInfo::unbuffered("/tmp/f", STAT, true);
        let b = FileInfo::unbuffered("/tmp/f", STAT, true);
        assert_eq!(a.etag, b.etag);
        assert!(!a.etag.is_empty());
    }

    #[test]
    fn test_etag_changes_with_mtime() {
        let a = FileInfo::unbuffered("/tmp/f", STAT, true);
        let newer = FileStat {
            mtime: STAT.mtime + 1,
            ..STAT
        };
        let b = FileInfo::unbuffered("/tmp/f", newer, true);
        assert_ne!(a.etag, b.etag);
    }

    #[test]
    fn test_etag_inode_toggle() {
        let with_inode = FileInfo::unbuffered("/tmp/f", STAT, true);
        let other_inode = FileStat { inode: 43, ..STAT };

        assert_ne!(
            with_inode.etag,
            FileInfo::unbuffered("/tmp/f", other_inode, true).etag
        );
        assert_eq!(
            FileInfo::unbuffered("/tmp/f", STAT, false).etag,
            FileInfo::unbuffered("/tmp/f", other_inode, false).etag
        );
    }

    #[test]
    fn test_buffered_size_tracks_buffer() {
        let info = FileInfo::buffered("/tmp/f", STAT, true, Bytes::from_static(b"test"));
        assert!(info.is_buffered());
        assert_eq!(info.size, 4);
        assert_eq!(info.buffer.as_ref().unwrap().len() as u64, info.size);
    }
}
