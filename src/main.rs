use docroot::config::Config;
use docroot::handler::DocumentRoot;
use docroot::logger;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    let handler = Arc::new(build_handler(&cfg).await?);
    logger::log_server_start(&addr, &cfg);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        if cfg.logging.access_log {
            logger::log_connection_accepted(&peer_addr);
        }

        let handler = Arc::clone(&handler);
        let access_log = cfg.logging.access_log;

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let conn = http1::Builder::new().serve_connection(
                io,
                service_fn(move |req| {
                    let handler = Arc::clone(&handler);
                    async move {
                        if access_log {
                            logger::log_request(req.method(), req.uri(), req.version());
                        }
                        Ok::<_, Infallible>(handler.handle_request(&req).await)
                    }
                }),
            );

            if let Err(err) = conn.await {
                logger::log_connection_error(&err);
            }
        });
    }
}

/// Build and configure the document root handler from the loaded config.
async fn build_handler(cfg: &Config) -> Result<DocumentRoot, docroot::DocRootError> {
    let content = &cfg.content;
    let mut handler = DocumentRoot::new(&content.root)?;

    handler.set_indexes(content.index_files.clone());
    handler.set_default_mime_type(&content.default_mime_type)?;
    handler.set_default_text_charset(&content.default_text_charset)?;
    handler.set_use_etag_inode(content.use_etag_inode);
    handler.set_expires_period(content.expires_period);
    handler.set_use_aggressive_cache_headers(content.aggressive_cache_headers);
    handler.set_aggressive_cache_multiplier(content.aggressive_cache_multiplier)?;
    handler.set_cache_entry_ttl(content.cache_entry_ttl);
    handler.set_cache_entry_limit(content.cache_entry_limit);
    handler.set_buffered_file_limit(content.buffered_file_limit);
    handler.set_buffered_file_size_limit(content.buffered_file_size_limit);

    if let Some(mime_file) = &content.mime_file {
        handler.load_mime_file_types(mime_file).await?;
    }

    handler.on_start()?;
    Ok(handler)
}

fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEPORT + SO_REUSEADDR so a replacement process can bind
    // while old connections drain.
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
