//! Conditional request evaluation module
//!
//! RFC 7232 precondition checks against a resource's modification time
//! and entity tag. The evaluation order is fixed because the headers
//! interact; see `check_preconditions`.

use crate::http::date::parse_http_date;
use hyper::header::{
    HeaderMap, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, IF_UNMODIFIED_SINCE, RANGE,
};

/// Outcome of precondition evaluation. Ephemeral, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Ok,
    NotModified,
    Failed,
    IfRangeOk,
    IfRangeFailed,
}

/// Evaluate the conditional request headers against `mtime` and `etag`.
///
/// Pure function over the request headers. The branch order must not be
/// reordered: If-Match, If-None-Match, If-Modified-Since,
/// If-Unmodified-Since, then If-Range (only when a Range header is also
/// present). Unparseable dates are treated as absent headers.
#[must_use]
pub fn check_preconditions(headers: &HeaderMap, mtime: i64, etag: &str) -> Precondition {
    if let Some(if_match) = header_str(headers, IF_MATCH.as_str()) {
        if !contains_ignore_case(if_match, etag) {
            return Precondition::Failed;
        }
    }

    if let Some(if_none_match) = header_str(headers, IF_NONE_MATCH.as_str()) {
        if contains_ignore_case(if_none_match, etag) {
            return Precondition::NotModified;
        }
    }

    if let Some(since) = header_date(headers, IF_MODIFIED_SINCE.as_str()) {
        if mtime > since {
            return Precondition::NotModified;
        }
    }

    if let Some(since) = header_date(headers, IF_UNMODIFIED_SINCE.as_str()) {
        if mtime > since {
            return Precondition::Failed;
        }
    }

    let Some(if_range) = header_str(headers, IF_RANGE.as_str()) else {
        return Precondition::Ok;
    };
    if headers.get(RANGE).is_none() {
        return Precondition::Ok;
    }

    // An If-Range value may be either an HTTP date or an entity tag
    // (RFC 7233 section 3.2). Try the date interpretation first.
    if let Some(http_date) = parse_http_date(if_range).filter(|&ts| ts != 0) {
        return if http_date > mtime {
            Precondition::IfRangeOk
        } else {
            Precondition::IfRangeFailed
        };
    }

    if etag == if_range {
        Precondition::IfRangeOk
    } else {
        Precondition::IfRangeFailed
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Header parsed as an HTTP date; absent, unparseable, and epoch-zero
/// values all count as missing.
fn header_date(headers: &HeaderMap, name: &str) -> Option<i64> {
    header_str(headers, name)
        .and_then(parse_http_date)
        .filter(|&ts| ts != 0)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !needle.is_empty()
        && haystack
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::date::format_http_date;
    use hyper::header::HeaderValue;

    const MTIME: i64 = 1_700_000_000;
    const ETAG: &str = "deadbeefcafe1234";

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                hyper::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_no_headers_is_ok() {
        assert_eq!(
            check_preconditions(&HeaderMap::new(), MTIME, ETAG),
            Precondition::Ok
        );
    }

    #[test]
    fn test_if_match_mismatch_fails() {
        let map = headers(&[("if-match", "any value")]);
        assert_eq!(check_preconditions(&map, MTIME, ETAG), Precondition::Failed);
    }

    #[test]
    fn test_if_match_is_case_insensitive() {
        let map = headers(&[("if-match", &ETAG.to_uppercase())]);
        assert_eq!(check_preconditions(&map, MTIME, ETAG), Precondition::Ok);
    }

    #[test]
    fn test_if_none_match_match_is_not_modified() {
        let map = headers(&[("if-none-match", ETAG)]);
        assert_eq!(
            check_preconditions(&map, MTIME, ETAG),
            Precondition::NotModified
        );
    }

    #[test]
    fn test_if_none_match_within_list() {
        let map = headers(&[("if-none-match", &format!("\"other\", {ETAG}"))]);
        assert_eq!(
            check_preconditions(&map, MTIME, ETAG),
            Precondition::NotModified
        );
    }

    #[test]
    fn test_if_modified_since_older_date_is_not_modified() {
        let map = headers(&[("if-modified-since", &format_http_date(MTIME - 3600))]);
        assert_eq!(
            check_preconditions(&map, MTIME, ETAG),
            Precondition::NotModified
        );
    }

    #[test]
    fn test_if_modified_since_newer_date_is_ok() {
        let map = headers(&[("if-modified-since", &format_http_date(MTIME + 3600))]);
        assert_eq!(check_preconditions(&map, MTIME, ETAG), Precondition::Ok);
    }

    #[test]
    fn test_if_modified_since_garbage_ignored() {
        let map = headers(&[("if-modified-since", "yesterday-ish")]);
        assert_eq!(check_preconditions(&map, MTIME, ETAG), Precondition::Ok);
    }

    #[test]
    fn test_if_unmodified_since_older_date_fails() {
        let map = headers(&[("if-unmodified-since", &format_http_date(MTIME - 3600))]);
        assert_eq!(check_preconditions(&map, MTIME, ETAG), Precondition::Failed);
    }

    #[test]
    fn test_if_match_checked_before_if_none_match() {
        let map = headers(&[("if-match", "other"), ("if-none-match", ETAG)]);
        assert_eq!(check_preconditions(&map, MTIME, ETAG), Precondition::Failed);
    }

    #[test]
    fn test_if_range_without_range_header_is_ok() {
        let map = headers(&[("if-range", ETAG)]);
        assert_eq!(check_preconditions(&map, MTIME, ETAG), Precondition::Ok);
    }

    #[test]
    fn test_if_range_etag_match() {
        let map = headers(&[("if-range", ETAG), ("range", "bytes=0-1")]);
        assert_eq!(
            check_preconditions(&map, MTIME, ETAG),
            Precondition::IfRangeOk
        );
    }

    #[test]
    fn test_if_range_etag_mismatch() {
        let map = headers(&[("if-range", "foo"), ("range", "bytes=0-1")]);
        assert_eq!(
            check_preconditions(&map, MTIME, ETAG),
            Precondition::IfRangeFailed
        );
    }

    #[test]
    fn test_if_range_date_after_mtime_ok() {
        let map = headers(&[
            ("if-range", &format_http_date(MTIME + 1)),
            ("range", "bytes=0-1"),
        ]);
        assert_eq!(
            check_preconditions(&map, MTIME, ETAG),
            Precondition::IfRangeOk
        );
    }

    #[test]
    fn test_if_range_date_at_or_before_mtime_fails() {
        let map = headers(&[
            ("if-range", &format_http_date(MTIME)),
            ("range", "bytes=0-1"),
        ]);
        assert_eq!(
            check_preconditions(&map, MTIME, ETAG),
            Precondition::IfRangeFailed
        );
    }
}
