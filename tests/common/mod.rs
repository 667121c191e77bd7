//! Shared fixtures: a local `tiny_http` server standing in for the remote
//! JSON endpoints.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tiny_http::{Header, Response, Server, StatusCode};

/// Canned response for one path.
#[derive(Clone)]
pub struct Route {
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// A fixture HTTP server answering from a fixed route table. Unknown paths
/// get a 404. Stops when dropped.
pub struct Fixture {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    pub addr: SocketAddr,
}

impl Fixture {
    pub fn start(routes: &[(&str, Route)]) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind fixture server"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("fixture server has an IP address");

        let table: HashMap<String, Route> = routes
            .iter()
            .map(|(path, route)| (path.to_string(), route.clone()))
            .collect();

        let worker = Arc::clone(&server);
        let handle = thread::spawn(move || {
            for request in worker.incoming_requests() {
                let route = table
                    .get(request.url())
                    .cloned()
                    .unwrap_or_else(|| Route::status(404, r#"{"error":"not found"}"#));
                let resp = Response::from_string(route.body)
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json").unwrap(),
                    )
                    .with_status_code(StatusCode(route.status));
                let _ = request.respond(resp);
            }
        });

        Self {
            server,
            handle: Some(handle),
            addr,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Keep tests from writing to the real activity log.
pub fn quiet() {
    apiview::activity::set_enabled(false);
}
