//! Error taxonomy for the polling pipeline.
//!
//! - [`ConfigError`]: the endpoint file is missing or malformed. Fatal at
//!   startup.
//! - [`FetchError`]: one endpoint could not be fetched or decoded. Recovered
//!   per endpoint by rendering `Error: <message>` into that endpoint's tab.
//! - [`DecodeError`]: the response body was not JSON. Surfaced to the user
//!   exactly like a [`FetchError`].

use std::path::PathBuf;

use thiserror::Error;

/// The endpoint file could not be turned into a registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read endpoint file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("endpoint file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("endpoint file declares no apis")]
    Empty,

    #[error("duplicate endpoint name '{0}'")]
    DuplicateName(String),

    #[error("endpoint at index {0} has an empty name")]
    EmptyName(usize),

    #[error("endpoint '{name}' has an invalid url '{url}': {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },
}

/// Response body could not be decoded as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// A single endpoint fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, TLS error, ...
    #[error("{0}")]
    Transport(String),

    /// Server answered with a non-2xx status.
    #[error("Request failed with status code {0}")]
    Status(u16),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_displays_bare_message() {
        let err = FetchError::Transport("timeout".to_string());
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn status_error_mentions_code() {
        assert_eq!(
            FetchError::Status(404).to_string(),
            "Request failed with status code 404"
        );
    }

    #[test]
    fn decode_error_is_transparent() {
        let err: FetchError = DecodeError("expected value at line 1 column 1".to_string()).into();
        assert_eq!(err.to_string(), "expected value at line 1 column 1");
    }

    #[test]
    fn config_error_names_duplicate() {
        let err = ConfigError::DuplicateName("Pipeline".to_string());
        assert!(err.to_string().contains("'Pipeline'"));
    }

    #[test]
    fn config_error_names_invalid_url() {
        let err = ConfigError::InvalidUrl {
            name: "Builds".to_string(),
            url: "//host".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "endpoint 'Builds' has an invalid url '//host': relative URL without a base"
        );
    }
}
