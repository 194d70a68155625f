//! Request handling modules
//!
//! File metadata, the TTL cache, streaming bodies, and the handlers
//! that tie them together.

pub mod body;
pub mod cache;
pub mod document_root;
pub mod file_info;
pub mod static_resource;

pub use document_root::{DocumentRoot, ErrorHandler, FallbackHandler};
pub use file_info::FileInfo;
pub use static_resource::StaticResource;
