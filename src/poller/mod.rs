//! Poll cycles: fetch every endpoint, format, deliver.
//!
//! A poll cycle walks a [`RegistrySnapshot`] in order and, for each endpoint,
//! produces exactly one [`RenderPayload`] on the render channel: a formatted
//! table on success or `Error: <message>` on any failure. Endpoints are
//! independent; one failing never delays or aborts the others.
//!
//! Every cycle gets a monotonically increasing id carried on its payloads so
//! the display can discard deliveries from a superseded cycle.

pub mod fetch;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam::channel::Sender;
use serde::Serialize;
use serde_json::Value;

use crate::activity;
use crate::format;
use crate::registry::{RegistrySnapshot, ResolvedEndpoint};

pub use fetch::{Fetch, HttpFetcher};

/// Identifier of one poll cycle. Starts at 1.
pub type CycleId = u64;

// ---------------------------------------------------------------------------
// Results and payloads
// ---------------------------------------------------------------------------

/// Outcome of fetching one endpoint within a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success { endpoint_name: String, value: Value },
    Failure { endpoint_name: String, message: String },
}

impl FetchResult {
    pub fn endpoint_name(&self) -> &str {
        match self {
            Self::Success { endpoint_name, .. } | Self::Failure { endpoint_name, .. } => {
                endpoint_name
            }
        }
    }
}

/// The unit delivered to the display, one per endpoint per cycle.
///
/// Serializes to the render delivery event `{ "api", "data", "cycle" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPayload {
    #[serde(rename = "api")]
    pub endpoint_name: String,
    #[serde(rename = "data")]
    pub html: String,
    pub cycle: CycleId,
}

/// HTML for one fetch result.
pub fn render(result: &FetchResult) -> String {
    match result {
        FetchResult::Success { value, .. } => format::format(value),
        FetchResult::Failure { message, .. } => format::format_error(message),
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Runs poll cycles against a fetcher and delivers onto the render channel.
///
/// Cheap to clone; clones share the fetcher, the channel and the cycle
/// counter.
#[derive(Clone)]
pub struct Poller {
    fetcher: Arc<dyn Fetch>,
    sink: Sender<RenderPayload>,
    next_cycle: Arc<AtomicU64>,
}

impl Poller {
    pub fn new(fetcher: Arc<dyn Fetch>, sink: Sender<RenderPayload>) -> Self {
        Self {
            fetcher,
            sink,
            next_cycle: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Id the next cycle will receive.
    pub fn peek_next_cycle(&self) -> CycleId {
        self.next_cycle.load(Ordering::SeqCst)
    }

    fn allocate_cycle(&self) -> CycleId {
        self.next_cycle.fetch_add(1, Ordering::SeqCst)
    }

    /// Fetch a single endpoint.
    pub fn resolve(&self, endpoint: &ResolvedEndpoint) -> FetchResult {
        resolve_with(self.fetcher.as_ref(), endpoint)
    }

    /// Start a poll cycle and return immediately.
    ///
    /// One worker thread per endpoint; each delivers its payload the moment
    /// its fetch completes. Delivery order between endpoints is unspecified.
    pub fn run_poll_cycle(&self, snapshot: Arc<RegistrySnapshot>) -> CycleId {
        let cycle = self.allocate_cycle();
        activity::log_event(&format!(
            "cycle {cycle} started endpoints={}",
            snapshot.len()
        ));

        for idx in 0..snapshot.len() {
            let shared = Arc::clone(&snapshot);
            let fetcher = Arc::clone(&self.fetcher);
            let sink = self.sink.clone();

            let spawned = thread::Builder::new()
                .name(format!("apiview-fetch-{cycle}-{idx}"))
                .spawn(move || {
                    if let Some(endpoint) = shared.iter().nth(idx) {
                        let payload = payload_for(cycle, &resolve_with(fetcher.as_ref(), endpoint));
                        deliver(&sink, payload);
                    }
                });

            // Could not get a thread: fetch inline so the endpoint still
            // gets its payload.
            if spawned.is_err()
                && let Some(endpoint) = snapshot.iter().nth(idx)
            {
                let payload = payload_for(cycle, &self.resolve(endpoint));
                deliver(&self.sink, payload);
            }
        }

        cycle
    }

    /// Run a poll cycle and wait for every endpoint.
    ///
    /// Fetches still run concurrently. Payloads are delivered on the render
    /// channel as they complete and are also returned in registry order.
    pub fn run_poll_cycle_blocking(&self, snapshot: &RegistrySnapshot) -> Vec<RenderPayload> {
        let cycle = self.allocate_cycle();
        activity::log_event(&format!(
            "cycle {cycle} started endpoints={} (blocking)",
            snapshot.len()
        ));

        thread::scope(|scope| {
            let handles: Vec<_> = snapshot
                .iter()
                .map(|endpoint| {
                    scope.spawn(move || {
                        let payload = payload_for(cycle, &self.resolve(endpoint));
                        deliver(&self.sink, payload.clone());
                        payload
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(snapshot.iter())
                .map(|(handle, endpoint)| {
                    handle.join().unwrap_or_else(|_| RenderPayload {
                        endpoint_name: endpoint.name.clone(),
                        html: format::format_error("fetch worker panicked"),
                        cycle,
                    })
                })
                .collect()
        })
    }
}

fn resolve_with(fetcher: &dyn Fetch, endpoint: &ResolvedEndpoint) -> FetchResult {
    match fetcher.fetch(&endpoint.url) {
        Ok(value) => FetchResult::Success {
            endpoint_name: endpoint.name.clone(),
            value,
        },
        Err(err) => FetchResult::Failure {
            endpoint_name: endpoint.name.clone(),
            message: err.to_string(),
        },
    }
}

fn payload_for(cycle: CycleId, result: &FetchResult) -> RenderPayload {
    match result {
        FetchResult::Success { endpoint_name, .. } => {
            activity::log_event(&format!("cycle {cycle} endpoint=\"{endpoint_name}\" ok"));
        }
        FetchResult::Failure {
            endpoint_name,
            message,
        } => {
            activity::log_event(&format!(
                "cycle {cycle} endpoint=\"{endpoint_name}\" error=\"{message}\""
            ));
        }
    }

    RenderPayload {
        endpoint_name: result.endpoint_name().to_string(),
        html: render(result),
        cycle,
    }
}

/// Deliver one payload. A closed render channel means the display is gone;
/// the payload is dropped.
fn deliver(sink: &Sender<RenderPayload>, payload: RenderPayload) {
    if sink.send(payload).is_err() {
        activity::log_event("render channel closed, payload dropped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::registry::Registry;
    use crossbeam::channel::unbounded;
    use serde_json::json;

    struct StubFetcher;

    impl Fetch for StubFetcher {
        fn fetch(&self, url: &str) -> Result<Value, FetchError> {
            match url {
                "http://ok" => Ok(json!({"id": 1})),
                "http://slow" => {
                    thread::sleep(std::time::Duration::from_millis(50));
                    Ok(json!("late"))
                }
                _ => Err(FetchError::Transport("timeout".to_string())),
            }
        }
    }

    fn snapshot(json_text: &str) -> RegistrySnapshot {
        crate::activity::set_enabled(false);
        Registry::from_json(json_text).unwrap().snapshot()
    }

    #[test]
    fn render_failure_is_error_text() {
        let html = render(&FetchResult::Failure {
            endpoint_name: "A".to_string(),
            message: "timeout".to_string(),
        });
        assert_eq!(html, "Error: timeout");
    }

    #[test]
    fn payload_serializes_to_delivery_event() {
        let payload = RenderPayload {
            endpoint_name: "A".to_string(),
            html: "<table></table>".to_string(),
            cycle: 3,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, json!({"api": "A", "data": "<table></table>", "cycle": 3}));
    }

    #[test]
    fn blocking_cycle_returns_payloads_in_registry_order() {
        let (tx, rx) = unbounded();
        let poller = Poller::new(Arc::new(StubFetcher), tx);
        let snap = snapshot(
            r#"{"apis":[{"name":"Slow","url":"http://slow"},{"name":"Bad","url":"http://bad"},{"name":"Ok","url":"http://ok"}]}"#,
        );

        let payloads = poller.run_poll_cycle_blocking(&snap);
        let names: Vec<_> = payloads.iter().map(|p| p.endpoint_name.as_str()).collect();
        assert_eq!(names, vec!["Slow", "Bad", "Ok"]);
        assert_eq!(payloads[1].html, "Error: timeout");
        assert!(payloads[2].html.contains("<th>id</th><td>1</td>"));
        assert_eq!(rx.try_iter().count(), 3);
    }

    #[test]
    fn cycle_ids_increase() {
        let (tx, _rx) = unbounded();
        let poller = Poller::new(Arc::new(StubFetcher), tx);
        let snap = snapshot(r#"{"apis":[{"name":"Ok","url":"http://ok"}]}"#);

        let first = poller.run_poll_cycle_blocking(&snap)[0].cycle;
        let second = poller.run_poll_cycle(Arc::new(snap));
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(poller.peek_next_cycle(), 3);
    }

    #[test]
    fn async_cycle_delivers_one_payload_per_endpoint() {
        let (tx, rx) = unbounded();
        let poller = Poller::new(Arc::new(StubFetcher), tx);
        let snap = snapshot(
            r#"{"apis":[{"name":"A","url":"http://ok"},{"name":"B","url":"http://bad"},{"name":"C","url":"http://slow"}]}"#,
        );

        let cycle = poller.run_poll_cycle(Arc::new(snap));

        let mut names: Vec<String> = (0..3)
            .map(|_| {
                let payload = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
                assert_eq!(payload.cycle, cycle);
                payload.endpoint_name
            })
            .collect();
        names.sort();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn closed_render_channel_does_not_panic() {
        let (tx, rx) = unbounded();
        drop(rx);
        let poller = Poller::new(Arc::new(StubFetcher), tx);
        let snap = snapshot(r#"{"apis":[{"name":"Ok","url":"http://ok"}]}"#);
        assert_eq!(poller.run_poll_cycle_blocking(&snap).len(), 1);
    }
}
