//! HTTP date handling module
//!
//! Parsing and formatting of HTTP-date values (RFC 7231 section 7.1.1.1)
//! for `Last-Modified`, `Expires` and the conditional request headers.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// IMF-fixdate, the preferred format: `Sun, 06 Nov 1994 08:49:37 GMT`.
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format: `Sunday, 06-Nov-94 08:49:37 GMT`.
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete asctime format: `Sun Nov  6 08:49:37 1994`.
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Format a Unix timestamp as an IMF-fixdate header value.
#[must_use]
pub fn format_http_date(epoch: i64) -> String {
    Utc.timestamp_opt(epoch, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .format(IMF_FIXDATE)
        .to_string()
}

/// Parse an HTTP-date header value into a Unix timestamp.
///
/// Accepts the three formats a recipient is required to understand.
/// Returns `None` for anything unparseable; callers treat that the same
/// as an absent header.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    for format in [IMF_FIXDATE, RFC_850, ASCTIME] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc().timestamp());
        }
    }
    None
}
