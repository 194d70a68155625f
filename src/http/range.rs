//! HTTP Range request parsing module
//!
//! Parses `Range` headers into validated byte spans, including the
//! multi-range form served as `multipart/byteranges` (RFC 7233).

/// An inclusive byte span within a resource of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte position.
    pub start: u64,
    /// Last byte position, inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by this range.
    #[must_use]
    pub const fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this span.
    #[must_use]
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{size}", self.start, self.end)
    }
}

/// A fully parsed `Range` header plus the response framing data.
#[derive(Debug, Clone)]
pub struct ByteRangeRequest {
    /// Multipart boundary token, fixed per handler instance.
    pub boundary: String,
    /// Ranges in the exact order the client specified them.
    pub ranges: Vec<ByteRange>,
    /// Resolved content type of the underlying resource.
    pub content_type: String,
}

/// Parse a raw `Range` header value against a resource size.
///
/// Returns the ranges in client order, unmerged. Any malformed or
/// unsatisfiable segment invalidates the whole header (`None`), which
/// callers turn into a 416 response.
#[must_use]
pub fn parse_byte_ranges(size: u64, raw_ranges: &str) -> Option<Vec<ByteRange>> {
    let cleaned: String = raw_ranges.chars().filter(|c| *c != ' ').collect();
    let cleaned = strip_bytes_prefix(&cleaned);

    let size = i64::try_from(size).ok()?;
    let mut ranges = Vec::new();

    for segment in cleaned.split(',') {
        // A segment without the dash separator is malformed; reject the
        // whole header, not just this segment.
        let (start_str, end_str) = segment.split_once('-')?;

        let (start, end) = match (start_str.is_empty(), end_str.is_empty()) {
            // Suffix form "-N": the last N bytes. The -1 is required
            // because byte ranges are inclusive and start at 0.
            (true, false) => {
                let suffix: i64 = parse_int(end_str)?;
                (size - suffix - 1, size - 1)
            }
            // Prefix form "N-": from N through the end.
            (false, true) => (parse_int(start_str)?, size - 1),
            (true, true) => return None,
            (false, false) => (parse_int(start_str)?, parse_int(end_str)?),
        };

        if start >= size || end < start || end < 0 || start < 0 {
            return None;
        }

        // Bounds checked above, the casts cannot wrap.
        #[allow(clippy::cast_sign_loss)]
        ranges.push(ByteRange {
            start: start as u64,
            end: end as u64,
        });
    }

    Some(ranges)
}

/// Parse a `Content-Range` value of the form `bytes {start}-{end}/{size}`
/// back into its components.
#[must_use]
pub fn parse_content_range(value: &str) -> Option<(u64, u64, u64)> {
    let rest = value.strip_prefix("bytes ")?;
    let (span, size) = rest.split_once('/')?;
    let (start, end) = span.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?, size.parse().ok()?))
}

fn strip_bytes_prefix(value: &str) -> &str {
    if value.len() >= 6 && value[..6].eq_ignore_ascii_case("bytes=") {
        &value[6..]
    } else {
        value
    }
}

fn parse_int(value: &str) -> Option<i64> {
    // Strict digits only; a stray sign or separator malforms the header.
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_range() {
        let ranges = parse_byte_ranges(4, "bytes=1-2").unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 1, end: 2 }]);
        assert_eq!(ranges[0].content_length(), 2);
    }

    #[test]
    fn test_prefix_range() {
        let ranges = parse_byte_ranges(100, "bytes=50-").unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 50, end: 99 }]);
    }

    #[test]
    fn test_suffix_range_is_inclusive() {
        // "-0" addresses the final byte; the -1 in the math keeps the
        // span zero-indexed and inclusive.
        let ranges = parse_byte_ranges(4, "bytes=-0").unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 3, end: 3 }]);

        let ranges = parse_byte_ranges(100, "bytes=-19").unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 80, end: 99 }]);
    }

    #[test]
    fn test_multi_range_preserves_client_order() {
        let ranges = parse_byte_ranges(4, "bytes=-0,1-2,2-").unwrap();
        assert_eq!(
            ranges,
            vec![
                ByteRange { start: 3, end: 3 },
                ByteRange { start: 1, end: 2 },
                ByteRange { start: 2, end: 3 },
            ]
        );
    }

    #[test]
    fn test_overlapping_ranges_not_merged() {
        let ranges = parse_byte_ranges(10, "bytes=0-5,3-8").unwrap();
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_spaces_and_case_tolerated() {
        let ranges = parse_byte_ranges(10, "Bytes= 0 - 4").unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 0, end: 4 }]);
    }

    #[test]
    fn test_start_beyond_size_rejects_header() {
        assert!(parse_byte_ranges(4, "bytes=7-10").is_none());
    }

    #[test]
    fn test_one_bad_segment_rejects_all() {
        assert!(parse_byte_ranges(100, "bytes=0-5,500-").is_none());
        assert!(parse_byte_ranges(100, "bytes=0-5,nodash").is_none());
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(parse_byte_ranges(100, "bytes=5-2").is_none());
    }

    #[test]
    fn test_empty_both_sides_rejected() {
        assert!(parse_byte_ranges(100, "bytes=-").is_none());
    }

    #[test]
    fn test_oversized_suffix_rejected() {
        // "-10" on a 4 byte file would start before byte 0.
        assert!(parse_byte_ranges(4, "bytes=-10").is_none());
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(parse_byte_ranges(100, "bytes=a-b").is_none());
    }

    #[test]
    fn test_content_range_round_trip() {
        for range in [
            ByteRange { start: 0, end: 0 },
            ByteRange { start: 1, end: 2 },
            ByteRange { start: 80, end: 99 },
        ] {
            let header = range.content_range(100);
            assert_eq!(
                parse_content_range(&header),
                Some((range.start, range.end, 100))
            );
        }
    }
}
