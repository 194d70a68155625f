//! Static file HTTP response engine
//!
//! Resolves request paths against a document root, evaluates HTTP
//! caching and conditional request semantics, and emits the correct
//! response shape: full body, 304, 412, 416, single byte range, or
//! multipart byteranges. A bounded TTL metadata cache with a
//! small-file content buffer avoids redundant filesystem work.

pub mod config;
pub mod error;
pub mod fs;
pub mod handler;
pub mod http;
pub mod logger;

pub use error::DocRootError;
pub use handler::{DocumentRoot, StaticResource};
pub use http::response::ResponseBody;
