//! Document root request handler
//!
//! The orchestrating handler: sanitizes the request path, consults the
//! metadata cache, resolves files (including directory index
//! substitution), evaluates conditional request headers, and emits
//! full-body, 304, 412, 416, single-range, or multipart byterange
//! responses.

use crate::error::DocRootError;
use crate::fs::{self, FileStat};
use crate::handler::body::{stream_file_range, stream_multipart};
use crate::handler::cache::FileCache;
use crate::handler::file_info::FileInfo;
use crate::http::date::format_http_date;
use crate::http::mime::{MimeResolver, DEFAULT_MIME_TABLE};
use crate::http::path::remove_dot_path_segments;
use crate::http::precondition::{check_preconditions, Precondition};
use crate::http::range::{parse_byte_ranges, ByteRangeRequest};
use crate::http::response::{
    build_error_response, build_not_modified_response, build_options_response, empty_body,
    full_body, ResponseBody,
};
use crate::logger;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hyper::header::{
    HeaderMap, HeaderValue, ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, ETAG, EXPIRES, LAST_MODIFIED, PRAGMA, RANGE,
};
use hyper::{Method, Request, Response, StatusCode};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Produces a standard error response for a status code.
pub type ErrorHandler = Box<dyn Fn(StatusCode) -> Response<ResponseBody> + Send + Sync>;

/// Invoked with the request URI when no resource exists for a path.
pub type FallbackHandler = Box<dyn Fn(&hyper::Uri) -> Response<ResponseBody> + Send + Sync>;

/// Static file handler rooted at a directory.
///
/// Configuration happens through the setters before `on_start`; request
/// serving afterwards only takes `&self`, so the handler can be shared
/// behind an `Arc`.
pub struct DocumentRoot {
    root: String,
    running: bool,
    debug: bool,
    multipart_boundary: String,
    cache: FileCache,
    mime: MimeResolver,
    error_handler: ErrorHandler,
    fallback: Option<FallbackHandler>,
    indexes: Vec<String>,
    use_etag_inode: bool,
    expires_period: i64,
    use_aggressive_cache_headers: bool,
    aggressive_cache_multiplier: f64,
    cache_entry_ttl: u64,
    cache_entry_limit: usize,
    buffered_file_limit: usize,
    buffered_file_size_limit: u64,
}

impl DocumentRoot {
    /// Create a handler serving files under `root`.
    ///
    /// The root must be an existing readable directory; anything else is
    /// a configuration error raised here rather than at request time.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, DocRootError> {
        let display = root.as_ref().display().to_string();

        let is_dir = std::fs::metadata(root.as_ref())
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(DocRootError::InvalidRoot(display));
        }

        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|_| DocRootError::InvalidRoot(display))?;
        let root = root.to_string_lossy().trim_end_matches('/').to_string();

        Ok(Self {
            root,
            running: false,
            debug: cfg!(debug_assertions),
            multipart_boundary: URL_SAFE_NO_PAD.encode(rand::random::<[u8; 16]>()),
            cache: FileCache::new(),
            mime: MimeResolver::default(),
            error_handler: Box::new(build_error_response),
            fallback: None,
            indexes: vec!["index.html".to_string(), "index.htm".to_string()],
            use_etag_inode: true,
            expires_period: 86400 * 7,
            use_aggressive_cache_headers: false,
            aggressive_cache_multiplier: 0.9,
            cache_entry_ttl: 10,
            cache_entry_limit: 2048,
            buffered_file_limit: 50,
            buffered_file_size_limit: 524_288,
        })
    }

    /// Respond to an HTTP request for a filesystem resource.
    pub async fn handle_request<B>(&self, request: &Request<B>) -> Response<ResponseBody> {
        let path = remove_dot_path_segments(request.uri().path());
        self.respond_to_path(&path, request).await
    }

    /// Serve an already-sanitized request path. Used directly by
    /// handlers that pin the path regardless of the request URI.
    pub async fn respond_to_path<B>(
        &self,
        request_path: &str,
        request: &Request<B>,
    ) -> Response<ResponseBody> {
        let info = match self.fetch_cached(request_path, request.headers()) {
            Some(info) => info,
            None => self.lookup_and_cache(request_path).await,
        };

        self.respond_from_info(&info, request).await
    }

    /// Cached metadata for a request path, honoring the cache bypass
    /// signals. A browser force-refresh sends `no-cache`, which lets
    /// developers skip stale representations right after writing to
    /// disk; debug mode skips the cache entirely for the same reason.
    fn fetch_cached(&self, request_path: &str, headers: &HeaderMap) -> Option<Arc<FileInfo>> {
        if self.debug {
            return None;
        }

        for name in [CACHE_CONTROL, PRAGMA] {
            for value in headers.get_all(name) {
                if value
                    .to_str()
                    .is_ok_and(|v| v.trim().eq_ignore_ascii_case("no-cache"))
                {
                    return None;
                }
            }
        }

        self.cache.get(request_path)
    }

    async fn lookup_and_cache(&self, request_path: &str) -> Arc<FileInfo> {
        let real_path = format!("{}{}", self.root, request_path);
        let info = Arc::new(self.lookup(&real_path).await);

        // Cache under the request path, not the resolved path: a
        // directory request and its index file are the same entry.
        if self.cache.len() < self.cache_entry_limit {
            self.cache.insert(
                request_path,
                Arc::clone(&info),
                Duration::from_secs(self.cache_entry_ttl),
                self.cache_entry_limit,
            );
        }

        info
    }

    async fn lookup(&self, path: &str) -> FileInfo {
        let Some(stat) = fs::stat(path).await else {
            return FileInfo::non_existent(path);
        };

        let (path, stat) = if fs::is_directory(path).await {
            match self.coalesce_index_path(path).await {
                Some(found) => found,
                None => return FileInfo::non_existent(path),
            }
        } else {
            (path.to_string(), stat)
        };

        if self.should_buffer(stat) {
            match fs::read(&path).await {
                Ok(contents) => {
                    return FileInfo::buffered(&path, stat, self.use_etag_inode, contents.into())
                }
                Err(e) => logger::log_warning(&format!(
                    "Failed buffering '{path}', serving unbuffered: {e}"
                )),
            }
        }

        FileInfo::unbuffered(&path, stat, self.use_etag_inode)
    }

    async fn coalesce_index_path(&self, dir_path: &str) -> Option<(String, FileStat)> {
        let dir_path = dir_path.trim_end_matches('/');
        for index in &self.indexes {
            let candidate = format!("{dir_path}/{index}");
            if fs::is_file(&candidate).await {
                if let Some(stat) = fs::stat(&candidate).await {
                    return Some((candidate, stat));
                }
            }
        }
        None
    }

    fn should_buffer(&self, stat: FileStat) -> bool {
        if stat.size == 0 || stat.size > self.buffered_file_size_limit {
            return false;
        }
        if self.cache.buffered_len() >= self.buffered_file_limit {
            return false;
        }
        if self.cache.len() >= self.cache_entry_limit {
            return false;
        }
        true
    }

    async fn respond_from_info<B>(
        &self,
        info: &FileInfo,
        request: &Request<B>,
    ) -> Response<ResponseBody> {
        if !info.exists {
            if let Some(fallback) = &self.fallback {
                return fallback(request.uri());
            }
            return (self.error_handler)(StatusCode::NOT_FOUND);
        }

        let is_head = request.method() == Method::HEAD;
        match request.method() {
            &Method::GET | &Method::HEAD => {}
            &Method::OPTIONS => return build_options_response(),
            _ => {
                let mut response = (self.error_handler)(StatusCode::METHOD_NOT_ALLOWED);
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("GET, HEAD, OPTIONS"));
                return response;
            }
        }

        match check_preconditions(request.headers(), info.mtime, &info.etag) {
            Precondition::Ok | Precondition::IfRangeOk => {}
            Precondition::NotModified => {
                return build_not_modified_response(info.mtime, &info.etag)
            }
            Precondition::Failed => return (self.error_handler)(StatusCode::PRECONDITION_FAILED),
            // A failed If-Range means "send me the whole thing instead".
            Precondition::IfRangeFailed => return self.non_range_response(info, is_head).await,
        }

        let Some(range_header) = request.headers().get(RANGE).and_then(|v| v.to_str().ok())
        else {
            return self.non_range_response(info, is_head).await;
        };

        if let Some(ranges) = parse_byte_ranges(info.size, range_header) {
            let range_request = ByteRangeRequest {
                boundary: self.multipart_boundary.clone(),
                ranges,
                content_type: self.mime.resolve(&info.path),
            };
            return self.range_response(&range_request, info, is_head).await;
        }

        // The only remaining response we can send.
        let mut response = (self.error_handler)(StatusCode::RANGE_NOT_SATISFIABLE);
        if let Ok(value) = HeaderValue::from_str(&format!("*/{}", info.size)) {
            response.headers_mut().insert(CONTENT_RANGE, value);
        }
        response
    }

    /// Headers shared by every response that serves an existing file.
    fn common_response_builder(&self, info: &FileInfo) -> hyper::http::response::Builder {
        let mut builder = Response::builder()
            .header(ACCEPT_RANGES, "bytes")
            .header(ETAG, info.etag.as_str())
            .header(LAST_MODIFIED, format_http_date(info.mtime));

        let can_cache = self.expires_period > 0;
        if can_cache && self.use_aggressive_cache_headers {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let post_check = (self.expires_period as f64 * self.aggressive_cache_multiplier) as i64;
            let pre_check = self.expires_period - post_check;
            builder = builder.header(
                CACHE_CONTROL,
                format!(
                    "public, post-check={post_check}, pre-check={pre_check}, max-age={}",
                    self.expires_period
                ),
            );
        } else if can_cache {
            builder = builder
                .header(
                    CACHE_CONTROL,
                    format!("public, max-age={}", self.expires_period),
                )
                .header(
                    EXPIRES,
                    format_http_date(unix_now().saturating_add(self.expires_period)),
                );
        } else {
            builder = builder
                .header(CACHE_CONTROL, "public")
                .header(EXPIRES, "0");
        }

        builder
    }

    async fn non_range_response(&self, info: &FileInfo, is_head: bool) -> Response<ResponseBody> {
        let content_type = self.mime.resolve(&info.path);
        let builder = self
            .common_response_builder(info)
            .header(CONTENT_TYPE, content_type);

        if let Some(buffer) = &info.buffer {
            let body = if is_head {
                empty_body()
            } else {
                full_body(buffer.clone())
            };
            return finish(builder.header(CONTENT_LENGTH, info.size), body);
        }

        // Don't trust the cached size for unbuffered content, otherwise
        // we serve truncated files when the file grew after caching.
        // Range validation deliberately still uses the cached size.
        let size = match fs::size_of(&info.path).await {
            Ok(size) => size,
            Err(e) => return self.filesystem_failure(&info.path, &e),
        };

        let builder = builder.header(CONTENT_LENGTH, size);
        if is_head || size == 0 {
            return finish(builder, empty_body());
        }

        match fs::open_for_read(&info.path).await {
            Ok(file) => finish(builder, stream_file_range(file, 0, size - 1)),
            Err(e) => self.filesystem_failure(&info.path, &e),
        }
    }

    async fn range_response(
        &self,
        range_request: &ByteRangeRequest,
        info: &FileInfo,
        is_head: bool,
    ) -> Response<ResponseBody> {
        let mut builder = self
            .common_response_builder(info)
            .status(StatusCode::PARTIAL_CONTENT);

        let is_multi_range = range_request.ranges.len() > 1;
        if is_multi_range {
            builder = builder.header(
                CONTENT_TYPE,
                format!(
                    "multipart/byteranges; boundary={}",
                    range_request.boundary
                ),
            );
        } else {
            let range = range_request.ranges[0];
            builder = builder
                .header(CONTENT_LENGTH, range.content_length())
                .header(CONTENT_RANGE, range.content_range(info.size))
                .header(CONTENT_TYPE, range_request.content_type.as_str());
        }

        if is_head {
            return finish(builder, empty_body());
        }

        let file = match fs::open_for_read(&info.path).await {
            Ok(file) => file,
            Err(e) => return self.filesystem_failure(&info.path, &e),
        };

        let body = if is_multi_range {
            stream_multipart(file, range_request.clone(), info.size)
        } else {
            let range = range_request.ranges[0];
            stream_file_range(file, range.start, range.end)
        };

        finish(builder, body)
    }

    fn filesystem_failure(&self, path: &str, error: &std::io::Error) -> Response<ResponseBody> {
        logger::log_error(&format!("Filesystem failure serving '{path}': {error}"));
        (self.error_handler)(StatusCode::INTERNAL_SERVER_ERROR)
    }

    // Configuration. All setters validate eagerly so bad values fail at
    // setup time, never while serving.

    /// Handler used when no file exists for the requested path. Must be
    /// installed before `on_start`.
    pub fn set_fallback(&mut self, fallback: FallbackHandler) -> Result<(), DocRootError> {
        if self.running {
            return Err(DocRootError::AlreadyStarted);
        }
        self.fallback = Some(fallback);
        Ok(())
    }

    pub fn set_error_handler(&mut self, error_handler: ErrorHandler) {
        self.error_handler = error_handler;
    }

    /// Index filenames probed, in order, when a directory is requested.
    /// Empty names are dropped and duplicates collapse.
    pub fn set_indexes(&mut self, indexes: Vec<String>) {
        let mut seen = Vec::new();
        for index in indexes {
            if !index.is_empty() && !seen.contains(&index) {
                seen.push(index);
            }
        }
        self.indexes = seen;
    }

    pub fn set_use_etag_inode(&mut self, use_inode: bool) {
        self.use_etag_inode = use_inode;
    }

    /// Client cache period in seconds; negative values clamp to 0,
    /// which disables client caching (`Expires: 0`).
    pub fn set_expires_period(&mut self, seconds: i64) {
        self.expires_period = seconds.max(0);
    }

    /// Install per-extension content-type overrides.
    pub fn set_mime_types(&mut self, mime_types: &HashMap<String, String>) {
        for (extension, mime_type) in mime_types {
            self.mime.set_override(extension, mime_type);
        }
    }

    /// Load the extension association table from a mime file.
    pub async fn load_mime_file_types(&mut self, mime_file: &str) -> Result<(), DocRootError> {
        let contents = tokio::fs::read_to_string(mime_file).await.map_err(|e| {
            DocRootError::MimeFileUnreadable {
                path: mime_file.to_string(),
                source: e,
            }
        })?;
        self.mime.load_table(&contents, mime_file)
    }

    pub fn set_default_mime_type(&mut self, mime_type: &str) -> Result<(), DocRootError> {
        if mime_type.is_empty() {
            return Err(DocRootError::InvalidConfig(
                "default mime type expects a non-empty string".to_string(),
            ));
        }
        self.mime.set_default_type(mime_type.to_string());
        Ok(())
    }

    pub fn set_default_text_charset(&mut self, charset: &str) -> Result<(), DocRootError> {
        if charset.is_empty() {
            return Err(DocRootError::InvalidConfig(
                "default charset expects a non-empty string".to_string(),
            ));
        }
        self.mime.set_default_charset(charset.to_string());
        Ok(())
    }

    pub fn set_use_aggressive_cache_headers(&mut self, aggressive: bool) {
        self.use_aggressive_cache_headers = aggressive;
    }

    /// Fraction of the expiry period reported as `post-check`. Must lie
    /// strictly between 0 and 1.
    pub fn set_aggressive_cache_multiplier(&mut self, multiplier: f64) -> Result<(), DocRootError> {
        if multiplier > 0.0 && multiplier < 1.0 {
            self.aggressive_cache_multiplier = multiplier;
            Ok(())
        } else {
            Err(DocRootError::InvalidConfig(format!(
                "aggressive cache multiplier expects a float between 0 and 1; {multiplier} specified"
            )))
        }
    }

    /// Metadata cache TTL in seconds; 0 resets to the default of 10.
    pub fn set_cache_entry_ttl(&mut self, seconds: u64) {
        self.cache_entry_ttl = if seconds == 0 { 10 } else { seconds };
    }

    /// Maximum number of cached metadata entries; 0 disables caching.
    pub fn set_cache_entry_limit(&mut self, count: usize) {
        self.cache_entry_limit = count;
    }

    /// Maximum number of entries whose content is buffered in memory;
    /// 0 disables buffering.
    pub fn set_buffered_file_limit(&mut self, count: usize) {
        self.buffered_file_limit = count;
    }

    /// Largest file size eligible for in-memory buffering; 0 resets to
    /// the default of 512 KiB.
    pub fn set_buffered_file_size_limit(&mut self, bytes: u64) {
        self.buffered_file_size_limit = if bytes == 0 { 524_288 } else { bytes };
    }

    /// Debug mode always bypasses the metadata cache.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Startup hook: marks the handler running and loads the bundled
    /// mime table when the caller supplied none.
    pub fn on_start(&mut self) -> Result<(), DocRootError> {
        self.running = true;
        if !self.mime.has_table() {
            self.mime.load_table(DEFAULT_MIME_TABLE, "resources/mime")?;
        }
        Ok(())
    }

    /// Shutdown hook: marks the handler inactive.
    pub fn on_stop(&mut self) {
        self.running = false;
    }
}

fn finish(builder: hyper::http::response::Builder, body: ResponseBody) -> Response<ResponseBody> {
    builder.body(body).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build file response: {e}"));
        build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or(0)
}
