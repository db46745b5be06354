//! Development server.
//!
//! Serves the build output over HTTP with `tiny_http` while, optionally,
//! a watcher thread rebuilds the site on source changes.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │ (rebuild loop)   │
//! └────────┬────────┘     └────────┬─────────┘
//!          │ read                  │ write
//!          ▼                       ▼
//!            config.build.output (public/)
//! ```
//!
//! The output directory is shared without isolation: a request landing
//! mid-rebuild may see a half-written site.

use crate::{config::SiteConfig, log, watch::watch_for_changes_blocking};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
    thread,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

const NOT_FOUND: &str = "404 Not Found";

/// Serve the output directory until Ctrl+C.
pub fn serve_site(config: Arc<SiteConfig>) -> Result<()> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface address: {}", config.serve.interface))?;
    let addr = SocketAddr::new(interface, config.serve.port);

    let server = Server::http(addr).map_err(|err| anyhow!("Failed to bind {addr}: {err}"))?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr}");

    if config.serve.watch {
        let config = Arc::clone(&config);
        thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config) {
                log!("watch"; "{err:#}");
            }
        });
    }

    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, &config.build.output) {
            log!("serve"; "request error: {err}");
        }
    }

    Ok(())
}

fn handle_request(request: Request, root: &Path) -> Result<()> {
    match resolve_request_path(root, request.url()) {
        Some(path) => serve_file(request, &path),
        None => serve_not_found(request),
    }
}

/// Map a request URL onto a file under `root`.
///
/// The URL is percent-decoded and its query string dropped. Directories
/// resolve to their `index.html`. Paths escaping `root` resolve to nothing.
fn resolve_request_path(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;
    let rel = Path::new(decoded.trim_matches('/'));

    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let local = root.join(rel);
    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    index.is_file().then_some(index)
}

// ============================================================================
// Response Helpers
// ============================================================================

fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content).with_header(content_type(guess_content_type(path))?);
    request.respond(response)?;
    Ok(())
}

fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![content_type("text/plain; charset=utf-8")?],
        Cursor::new(NOT_FOUND),
        Some(NOT_FOUND.len()),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn content_type(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("Invalid header value: {value}"))
}

/// Guess MIME content type from file extension.
fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn output() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("blog/hello world.html"), "post").unwrap();
        fs::write(dir.path().join("blog/index.html"), "blog").unwrap();
        dir
    }

    #[test]
    fn test_resolve_root_and_directory_index() {
        let dir = output();
        let root = dir.path();
        assert_eq!(resolve_request_path(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve_request_path(root, "/blog/"), Some(root.join("blog/index.html")));
        assert_eq!(resolve_request_path(root, "/blog"), Some(root.join("blog/index.html")));
    }

    #[test]
    fn test_resolve_decodes_and_strips_query() {
        let dir = output();
        let root = dir.path();
        assert_eq!(
            resolve_request_path(root, "/blog/hello%20world.html?t=123"),
            Some(root.join("blog/hello world.html"))
        );
        assert_eq!(
            resolve_request_path(root, "/index.html#top"),
            Some(root.join("index.html"))
        );
    }

    #[test]
    fn test_resolve_missing() {
        let dir = output();
        assert_eq!(resolve_request_path(dir.path(), "/nope.html"), None);
        assert_eq!(resolve_request_path(dir.path(), "/empty/"), None);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = output();
        let root = dir.path().join("blog");
        assert_eq!(resolve_request_path(&root, "/../index.html"), None);
        assert_eq!(resolve_request_path(&root, "/%2e%2e/index.html"), None);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("a.CSS")), "text/css; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("a.woff2")), "font/woff2");
        assert_eq!(guess_content_type(Path::new("a")), "application/octet-stream");
    }
}
