//! Request path sanitization module
//!
//! Lexical dot-segment removal applied before any cache or filesystem
//! access. This is the sole defense against path traversal, so it never
//! consults the filesystem.

/// Remove `.` and `..` segments from a request path.
///
/// `..` pops the last accumulated segment and clamps at the root, so a
/// request can never ascend above the document root. Empty segments
/// produced by repeated slashes are dropped. The result always begins
/// with `/`.
///
/// # Examples
/// ```
/// use docroot::http::path::remove_dot_path_segments;
/// assert_eq!(remove_dot_path_segments("/../../../index.htm"), "/index.htm");
/// assert_eq!(remove_dot_path_segments("/a/./b/../c"), "/a/c");
/// ```
#[must_use]
pub fn remove_dot_path_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut output = String::with_capacity(path.len());
    for segment in &segments {
        output.push('/');
        output.push_str(segment);
    }

    if output.is_empty() {
        output.push('/');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_unchanged() {
        assert_eq!(remove_dot_path_segments("/"), "/");
        assert_eq!(remove_dot_path_segments("/index.htm"), "/index.htm");
        assert_eq!(remove_dot_path_segments("/a/b/c"), "/a/b/c");
    }

    #[test]
    fn test_traversal_clamped_at_root() {
        assert_eq!(remove_dot_path_segments("/../../../index.htm"), "/index.htm");
        assert_eq!(remove_dot_path_segments("/.."), "/");
        assert_eq!(remove_dot_path_segments("/dir/../../"), "/");
    }

    #[test]
    fn test_mixed_dot_segments() {
        assert_eq!(
            remove_dot_path_segments("/dir/../dir//..//././index.htm"),
            "/index.htm"
        );
        assert_eq!(remove_dot_path_segments("/a/./b/./c/.."), "/a/b");
    }

    #[test]
    fn test_double_slashes_collapsed() {
        assert_eq!(remove_dot_path_segments("//a///b"), "/a/b");
    }

    #[test]
    fn test_dotted_names_preserved() {
        assert_eq!(remove_dot_path_segments("/a/.hidden"), "/a/.hidden");
        assert_eq!(remove_dot_path_segments("/a/..b/c"), "/a/..b/c");
    }

    #[test]
    fn test_always_rooted() {
        assert_eq!(remove_dot_path_segments(""), "/");
        assert_eq!(remove_dot_path_segments("a/b"), "/a/b");
    }
}
