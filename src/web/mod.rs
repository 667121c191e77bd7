//! Embedded web dashboard for apiview.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that acts as
//! both the Display Surface and the Command Source:
//! - A single-page tabbed view, one tab per endpoint, plus the parameter
//!   inputs that trigger a `fetchData` command
//! - JSON API endpoints the page polls for rendered tab content
//!
//! Launched via `apiview serve` (default: `http://127.0.0.1:9747`).

mod api;
pub mod board;
mod frontend;

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::session::CommandSender;

pub use board::{SharedBoard, TabBoard};

/// Everything a request handler may touch.
#[derive(Clone)]
pub struct Dashboard {
    pub board: SharedBoard,
    pub commands: CommandSender,
    pub started: Instant,
}

impl Dashboard {
    pub fn new(board: SharedBoard, commands: CommandSender) -> Self {
        Self {
            board,
            commands,
            started: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on the given address.
///
/// Blocks the current thread and handles requests sequentially. Errors are
/// handled per request without taking the server down.
pub fn serve(addr: &str, dashboard: &Dashboard, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("apiview dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    serve_requests(&server, dashboard, true);
    Ok(())
}

/// Answer requests until the server is dropped.
pub fn serve_requests(server: &Server, dashboard: &Dashboard, access_log: bool) {
    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let resp = dispatch(dashboard, &method, &url, body.as_deref()).unwrap_or_else(|e| {
            let body = serde_json::json!({ "error": format!("{e:#}") }).to_string();
            Response::from_data(body.into_bytes())
                .with_header(content_type_json())
                .with_status_code(StatusCode(500))
        });
        let _ = request.respond(resp);

        if access_log {
            println!(
                "{} {} {}",
                method,
                url,
                chrono::Local::now().format("%H:%M:%S")
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn dispatch(
    dashboard: &Dashboard,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend(dashboard)),

        (&Method::Get, "/api/tabs") => api::get_tabs(dashboard),
        (&Method::Get, "/api/renders") => api::get_renders(dashboard),
        (&Method::Post, "/api/command") => api::post_command(dashboard, body.unwrap_or("")),
        (&Method::Get, "/api/health") => api::get_health(dashboard),

        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend(dashboard: &Dashboard) -> Response<Cursor<Vec<u8>>> {
    let names = dashboard.board.lock().names().to_vec();
    let html = frontend::render_page(&names);
    Response::from_data(html.into_bytes())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

pub(crate) fn content_type_json() -> Header {
    header("Content-Type", "application/json; charset=utf-8")
}

fn content_type_html() -> Header {
    header("Content-Type", "text/html; charset=utf-8")
}

/// Build a header from static ASCII parts.
fn header(name: &'static str, value: &'static str) -> Header {
    match Header::from_bytes(name, value) {
        Ok(h) => h,
        Err(()) => unreachable!("static header {name} is valid ASCII"),
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
