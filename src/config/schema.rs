/// Settings schema and defaults for apiview.
///
/// Defines the TOML-serializable settings structure with the sections
/// `[server]`, `[registry]`, and `[logging]`. Every field has a built-in
/// default; users only set what they want to override.
///
/// The poll interval is intentionally absent: it is fixed at one hour.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

/// Top-level apiview settings.
///
/// Maps directly to `~/.apiview/config.toml` and `.apiview.toml`. All
/// sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiviewConfig {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Embedded dashboard server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the dashboard.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [registry]
// ---------------------------------------------------------------------------

/// Where the endpoint file lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path to the JSON endpoint file. Relative paths resolve against the
    /// working directory.
    pub path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: "apiConfig.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write the activity log to `~/.apiview/activity.log`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl ApiviewConfig {
    /// The annotated settings file written by `apiview config init`.
    pub fn default_toml() -> &'static str {
        DEFAULT_TOML
    }
}

const DEFAULT_TOML: &str = r#"# apiview settings
#
# Layering: built-in defaults < ~/.apiview/config.toml < ./.apiview.toml < CLI flags

[server]
# Address the dashboard listens on.
addr = "127.0.0.1:9747"
# Open the dashboard in the default browser when `apiview serve` starts.
open_browser = true

[registry]
# JSON endpoint file: { "apis": [ { "name": "...", "url": "..." } ] }
path = "apiConfig.json"

[logging]
# Append session, cycle, and command events to ~/.apiview/activity.log.
enabled = true
"#;
