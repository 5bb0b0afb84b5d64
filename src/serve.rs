//! HTTP interface to the wiki.
//!
//! A single-threaded `tiny_http` server: requests are read one at a time on
//! the main thread and handed to [`handlers::dispatch`].
//!
//! ```text
//! tiny_http::Request ──► Incoming ──► dispatch(wiki) ──► Reply ──► Response
//! ```

mod handlers;
mod html;
mod route;

use crate::{config::ServeConfig, log, wiki::Wiki};
use anyhow::{Context, Result, anyhow};
use handlers::{Incoming, Reply};
use std::{
    io::{Cursor, Read},
    net::{IpAddr, SocketAddr, ToSocketAddrs},
    path::Path,
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `wiki` until Ctrl+C is received.
pub fn serve_wiki(config: &ServeConfig, wiki: &Wiki) -> Result<()> {
    let interface = resolve_interface(&config.interface)?;
    let (server, addr) = try_bind_port(interface, config.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, wiki) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// `localhost`, `0.0.0.0`, `::1` ... → the first address it resolves to.
fn resolve_interface(interface: &str) -> Result<IpAddr> {
    if let Ok(ip) = interface.parse() {
        return Ok(ip);
    }
    (interface, 0)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve interface `{interface}`"))?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| anyhow!("Interface `{interface}` resolves to no address"))
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(mut request: Request, wiki: &Wiki) -> Result<()> {
    let incoming = read_request(&mut request)?;
    let reply = handlers::dispatch(wiki, &incoming);

    if !reply.is_success() {
        log!("serve"; "{} {} -> {}", incoming.method, incoming.path, reply.status);
    }
    request.respond(into_response(reply)?)?;
    Ok(())
}

/// Decode the URL and read the whole body.
fn read_request(request: &mut Request) -> Result<Incoming> {
    let (raw_path, query) = request
        .url()
        .split_once('?')
        .map(|(path, query)| (path.to_owned(), query.to_owned()))
        .unwrap_or_else(|| (request.url().to_owned(), String::new()));

    // Decode URL-encoded characters (e.g., %20 → space)
    let path = urlencoding::decode(&raw_path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or(raw_path);

    let is_json = request.headers().iter().any(|header| {
        header.field.equiv("Content-Type")
            && header.value.as_str().starts_with("application/json")
    });

    let mut body = Vec::new();
    request
        .as_reader()
        .read_to_end(&mut body)
        .context("Failed to read request body")?;

    Ok(Incoming {
        method: request.method().clone(),
        path,
        query,
        is_json,
        body,
    })
}

fn into_response(reply: Reply) -> Result<Response<Cursor<Vec<u8>>>> {
    let mut headers = vec![header("Content-Type", reply.content_type)?];
    if let Some(location) = &reply.location {
        headers.push(header("Location", location)?);
    }

    let length = reply.body.len();
    Ok(Response::new(
        StatusCode(reply.status),
        headers,
        Cursor::new(reply.body),
        Some(length),
        None,
    ))
}

fn header(field: &str, value: &str) -> Result<Header> {
    Header::from_bytes(field, value).map_err(|()| anyhow!("Invalid header `{field}: {value}`"))
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/b.md")), "text/markdown; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("cat.PNG")), "application/octet-stream");
        assert_eq!(guess_content_type(Path::new("cat.png")), "image/png");
    }

    #[test]
    fn test_resolve_interface() {
        assert_eq!(resolve_interface("127.0.0.1").unwrap(), IpAddr::from([127, 0, 0, 1]));
        assert!(resolve_interface("localhost").unwrap().is_loopback());
    }

    #[test]
    fn test_into_response_redirect() {
        let response = into_response(Reply::redirect("/notes/edit")).unwrap();
        assert_eq!(response.status_code(), StatusCode(302));
        assert!(
            response
                .headers()
                .iter()
                .any(|h| h.field.equiv("Location") && h.value.as_str() == "/notes/edit")
        );
    }

    #[test]
    fn test_try_bind_port_retries() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let (_server, addr) = try_bind_port(IpAddr::from([127, 0, 0, 1]), port, MAX_PORT_RETRIES).unwrap();
        assert_ne!(addr.port(), port);
        assert!(addr.port() > port);
    }
}
