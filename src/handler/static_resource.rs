//! Single static resource handler
//!
//! Serves one fixed file regardless of the request URI, reusing the
//! document root machinery for caching, conditional requests, and
//! range responses.

use crate::error::DocRootError;
use crate::handler::document_root::DocumentRoot;
use crate::http::path::remove_dot_path_segments;
use crate::http::response::ResponseBody;
use std::collections::HashMap;
use std::path::Path;

pub struct StaticResource {
    document_root: DocumentRoot,
    /// Fixed request path within the parent directory, always `/name`.
    path: String,
}

impl StaticResource {
    /// Create a handler that always serves the file at `path`.
    pub fn new(path: &str) -> Result<Self, DocRootError> {
        let sanitized = remove_dot_path_segments(path);
        let file = Path::new(&sanitized);

        let root = file
            .parent()
            .ok_or_else(|| DocRootError::InvalidRoot(sanitized.clone()))?;
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocRootError::InvalidRoot(sanitized.clone()))?;

        Ok(Self {
            document_root: DocumentRoot::new(root)?,
            path: format!("/{name}"),
        })
    }

    /// Respond with the fixed resource, ignoring the request path.
    pub async fn handle_request<B>(
        &self,
        request: &hyper::Request<B>,
    ) -> hyper::Response<ResponseBody> {
        self.document_root.respond_to_path(&self.path, request).await
    }

    /// Serve the resource with a specific content type instead of the
    /// extension-derived one.
    pub fn set_mime_type(&mut self, mime_type: &str) -> Result<(), DocRootError> {
        if let Some(extension) = Path::new(&self.path).extension().and_then(|e| e.to_str()) {
            let mut overrides = HashMap::new();
            overrides.insert(extension.to_string(), mime_type.to_string());
            self.document_root.set_mime_types(&overrides);
        }

        self.document_root.set_default_mime_type(mime_type)
    }

    pub fn set_use_etag_inode(&mut self, use_inode: bool) {
        self.document_root.set_use_etag_inode(use_inode);
    }

    pub fn set_expires_period(&mut self, seconds: i64) {
        self.document_root.set_expires_period(seconds);
    }

    pub fn set_text_charset(&mut self, charset: &str) -> Result<(), DocRootError> {
        self.document_root.set_default_text_charset(charset)
    }

    pub fn set_use_aggressive_cache_headers(&mut self, aggressive: bool) {
        self.document_root.set_use_aggressive_cache_headers(aggressive);
    }

    pub fn set_aggressive_cache_multiplier(&mut self, multiplier: f64) -> Result<(), DocRootError> {
        self.document_root.set_aggressive_cache_multiplier(multiplier)
    }

    pub fn set_cache_entry_ttl(&mut self, seconds: u64) {
        self.document_root.set_cache_entry_ttl(seconds);
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.document_root.set_debug(debug);
    }

    pub fn on_start(&mut self) -> Result<(), DocRootError> {
        self.document_root.on_start()
    }

    pub fn on_stop(&mut self) {
        self.document_root.on_stop();
    }
}
