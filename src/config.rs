//! Configuration module
//!
//! Layered configuration for the demo server binary: `config.toml` when
//! present, `DOCROOT_`-prefixed environment variables on top, defaults
//! underneath.

use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
}

/// Static content settings, mirroring the handler's setters.
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Document root directory.
    pub root: String,
    pub index_files: Vec<String>,
    pub default_mime_type: String,
    pub default_text_charset: String,
    /// Optional mime association file; the bundled table is used when unset.
    pub mime_file: Option<String>,
    pub use_etag_inode: bool,
    /// Client cache period in seconds; 0 disables client caching.
    pub expires_period: i64,
    pub aggressive_cache_headers: bool,
    pub aggressive_cache_multiplier: f64,
    pub cache_entry_ttl: u64,
    pub cache_entry_limit: usize,
    pub buffered_file_limit: usize,
    pub buffered_file_size_limit: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("DOCROOT"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.access_log", true)?
            .set_default("content.root", "public")?
            .set_default("content.index_files", vec!["index.html", "index.htm"])?
            .set_default("content.default_mime_type", "text/plain")?
            .set_default("content.default_text_charset", "utf-8")?
            .set_default("content.use_etag_inode", true)?
            .set_default("content.expires_period", 86400 * 7)?
            .set_default("content.aggressive_cache_headers", false)?
            .set_default("content.aggressive_cache_multiplier", 0.9)?
            .set_default("content.cache_entry_ttl", 10)?
            .set_default("content.cache_entry_limit", 2048)?
            .set_default("content.buffered_file_limit", 50)?
            .set_default("content.buffered_file_size_limit", 524_288)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
