//! MIME type resolution module
//!
//! Maps file extensions to content types using explicit per-extension
//! overrides, a loaded association table, and a configurable default.
//! Resolved `text/*` types gain a charset parameter when they carry none.

use crate::error::DocRootError;
use std::collections::HashMap;
use std::path::Path;

/// The association table bundled with the crate, loaded on startup when
/// no table was supplied by the caller.
pub const DEFAULT_MIME_TABLE: &str = include_str!("../../resources/mime");

/// Extension based content-type resolver.
#[derive(Debug, Clone)]
pub struct MimeResolver {
    /// Explicit overrides, consulted before the loaded table.
    overrides: HashMap<String, String>,
    /// Table loaded from a mime association file.
    file_types: HashMap<String, String>,
    default_type: String,
    default_charset: String,
}

impl Default for MimeResolver {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            file_types: HashMap::new(),
            default_type: "text/plain".to_string(),
            default_charset: "utf-8".to_string(),
        }
    }
}

impl MimeResolver {
    /// Resolve the content type for a filesystem path.
    ///
    /// Lookup order: overrides, loaded table, default type. A `text/*`
    /// result without an explicit charset parameter gets the default
    /// charset appended.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let mime = match extension {
            Some(ext) => self
                .overrides
                .get(&ext)
                .or_else(|| self.file_types.get(&ext))
                .map_or(self.default_type.as_str(), String::as_str),
            None => self.default_type.as_str(),
        };

        if starts_with_ignore_case(mime, "text/") && !contains_ignore_case(mime, "charset=") {
            return format!("{mime}; charset={}", self.default_charset);
        }

        mime.to_string()
    }

    /// Install a per-extension override. Leading dots and case are
    /// normalized away.
    pub fn set_override(&mut self, extension: &str, mime_type: &str) {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.overrides.insert(ext, mime_type.to_string());
    }

    /// Load an association table from the contents of a mime file.
    ///
    /// The grammar is permissive: each line is whitespace-delimited
    /// `extension type/subtype`; anything else is skipped. An input that
    /// produces no associations at all is an error, reported against
    /// `origin` (the file path or a placeholder for the bundled table).
    pub fn load_table(&mut self, contents: &str, origin: &str) -> Result<(), DocRootError> {
        let table = parse_mime_table(contents);
        if table.is_empty() {
            return Err(DocRootError::MimeFileEmpty(origin.to_string()));
        }
        self.file_types = table;
        Ok(())
    }

    /// Whether an association table has been loaded.
    #[must_use]
    pub fn has_table(&self) -> bool {
        !self.file_types.is_empty()
    }

    pub fn set_default_type(&mut self, mime_type: String) {
        self.default_type = mime_type;
    }

    pub fn set_default_charset(&mut self, charset: String) {
        self.default_charset = charset;
    }
}

/// Parse whitespace-delimited `extension mime/type` pairs, skipping
/// comments and lines that do not match.
fn parse_mime_table(contents: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let (Some(ext), Some(mime)) = (tokens.next(), tokens.next()) else {
            continue;
        };

        if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            continue;
        }
        if mime.chars().filter(|&c| c == '/').count() != 1 {
            continue;
        }

        table.insert(ext.to_ascii_lowercase(), mime.to_string());
    }

    table
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len() && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn contains_ignore_case(value: &str, needle: &str) -> bool {
    value.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}
