//! HTTP protocol modules
//!
//! The pure pieces of the request-to-response engine: path
//! sanitization, date handling, MIME resolution, Range parsing,
//! conditional request evaluation, and response building.

pub mod date;
pub mod mime;
pub mod path;
pub mod precondition;
pub mod range;
pub mod response;

pub use precondition::{check_preconditions, Precondition};
pub use range::{parse_byte_ranges, ByteRange, ByteRangeRequest};
pub use response::ResponseBody;
