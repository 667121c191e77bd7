/// HTTP fetching for the poller.
///
/// The [`Fetch`] trait is the seam between the poll cycle and the network.
/// [`HttpFetcher`] is the production implementation: one synchronous `ureq`
/// GET per call, no timeout override, no retry. Non-2xx responses, transport
/// failures and undecodable bodies are all mapped to a [`FetchError`].
use serde_json::Value;

use crate::error::{DecodeError, FetchError};

/// Fetch and decode one endpoint.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// `ureq`-backed fetcher.
///
/// Holds a shared agent so connections are pooled across endpoints that live
/// on the same host.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .call()
            .map_err(classify)?;

        resp.into_json::<Value>()
            .map_err(|e| FetchError::from(DecodeError(decode_message(&e))))
    }
}

fn classify(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => FetchError::Status(code),
        ureq::Error::Transport(transport) => FetchError::Transport(transport.to_string()),
    }
}

/// `into_json` wraps the serde error in an `io::Error`; surface the inner
/// message when there is one.
fn decode_message(err: &std::io::Error) -> String {
    err.get_ref()
        .map(|inner| inner.to_string())
        .unwrap_or_else(|| err.to_string())
}
