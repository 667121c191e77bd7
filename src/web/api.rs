//! JSON API handlers for the dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::activity;
use crate::session::Command;

use super::board::TabContent;
use super::{Dashboard, content_type_json};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TabsResponse {
    tabs: Vec<String>,
}

#[derive(Serialize)]
struct RendersResponse {
    latest_cycle: u64,
    renders: Vec<TabContent>,
}

#[derive(Serialize)]
struct HealthResponse {
    endpoints: usize,
    rendered: usize,
    latest_cycle: u64,
    uptime_secs: u64,
    logging_enabled: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(data: &T, status: u16) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/tabs` — endpoint names in tab order.
pub fn get_tabs(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let tabs = dashboard.board.lock().names().to_vec();
    json_response(&TabsResponse { tabs }, 200)
}

/// `GET /api/renders` — latest content of every rendered tab.
pub fn get_renders(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let (latest_cycle, renders) = {
        let board = dashboard.board.lock();
        (board.latest_cycle(), board.snapshot())
    };
    json_response(
        &RendersResponse {
            latest_cycle,
            renders,
        },
        200,
    )
}

/// `POST /api/command` — a user input event from the page.
///
/// Expects `{ "command": "fetchData", "data": { "projectId", "appName", "pipelineName" } }`.
/// Malformed bodies get a 400; the session is not touched.
pub fn post_command(dashboard: &Dashboard, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let command: Command = match serde_json::from_str(body) {
        Ok(c) => c,
        Err(e) => {
            let err = serde_json::json!({ "error": format!("invalid command: {e}") });
            return json_response(&err, 400);
        }
    };

    dashboard.commands.send(command)?;
    activity::log_event("command accepted from dashboard");

    json_response(&serde_json::json!({ "accepted": true }), 202)
}

/// `GET /api/health` — dashboard status summary.
pub fn get_health(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let resp = {
        let board = dashboard.board.lock();
        HealthResponse {
            endpoints: board.names().len(),
            rendered: board.snapshot().len(),
            latest_cycle: board.latest_cycle(),
            uptime_secs: dashboard.started.elapsed().as_secs(),
            logging_enabled: activity::is_enabled(),
        }
    };
    json_response(&resp, 200)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            endpoints: 3,
            rendered: 2,
            latest_cycle: 7,
            uptime_secs: 60,
            logging_enabled: false,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"endpoints\":3"));
        assert!(json.contains("\"latest_cycle\":7"));
    }

    #[test]
    fn tabs_response_serializes_in_order() {
        let resp = TabsResponse {
            tabs: vec!["Builds".to_string(), "Deploys".to_string()],
        };
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"tabs":["Builds","Deploys"]}"#
        );
    }
}
