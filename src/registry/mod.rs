//! Endpoint registry.
//!
//! Holds the ordered list of named endpoints read from the endpoint file
//! (`apiConfig.json` by default):
//!
//! ```json
//! { "apis": [ { "name": "Pipeline", "url": "https://ci.example.com/PID/APP/PIPE" } ] }
//! ```
//!
//! Each stored `url` is a template. A poll cycle never reads the template
//! directly; it consumes a [`RegistrySnapshot`] whose URLs were derived from
//! the templates and the current [`Parameters`]. Snapshots are immutable, so
//! a parameter change builds a fresh one instead of rewriting URLs under a
//! running cycle.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Placeholders recognised inside a URL template.
const PROJECT_ID: &str = "{projectId}";
const APP_NAME: &str = "{appName}";
const PIPELINE_NAME: &str = "{pipelineName}";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named, independently pollable data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Display-tab key. Unique within a registry.
    pub name: String,
    /// URL template, stored under `url` in the endpoint file.
    #[serde(rename = "url")]
    pub url_template: String,
}

/// User-supplied template parameters. Free-form, never validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameters {
    pub project_id: String,
    pub app_name: String,
    pub pipeline_name: String,
}

/// An endpoint with the concrete URL for one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub name: String,
    pub url: String,
}

/// Immutable, ordered view of the registry consumed by one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySnapshot {
    endpoints: Vec<ResolvedEndpoint>,
}

impl RegistrySnapshot {
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEndpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Look up the resolved URL for an endpoint by name.
    pub fn url_of(&self, name: &str) -> Option<&str> {
        self.endpoints
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.url.as_str())
    }
}

/// On-disk shape of the endpoint file.
#[derive(Debug, Deserialize)]
struct EndpointFile {
    apis: Vec<Endpoint>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered set of endpoints, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    endpoints: Vec<Endpoint>,
}

/// Load the registry from an endpoint file on disk.
pub fn load(path: &Path) -> Result<Registry, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Registry::from_json(&content)
}

impl Registry {
    /// Parse the endpoint file contents.
    ///
    /// Rejects an empty `apis` list, empty names, and duplicate names since
    /// the name is the correlation key between request, result, and tab.
    /// Every template must be an absolute URL with a host.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: EndpointFile = serde_json::from_str(content)?;
        Self::new(file.apis)
    }

    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut seen = HashSet::new();
        for (idx, endpoint) in endpoints.iter().enumerate() {
            if endpoint.name.trim().is_empty() {
                return Err(ConfigError::EmptyName(idx));
            }
            if !seen.insert(endpoint.name.as_str()) {
                return Err(ConfigError::DuplicateName(endpoint.name.clone()));
            }
            check_template(endpoint)?;
        }

        Ok(Self { endpoints })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Endpoint names in registry order, used to lay out the tabs.
    pub fn names(&self) -> Vec<String> {
        self.endpoints.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Snapshot with every template used verbatim as the request URL.
    ///
    /// This is what the first poll cycle sees before the user has supplied
    /// any parameters.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            endpoints: self
                .endpoints
                .iter()
                .map(|e| ResolvedEndpoint {
                    name: e.name.clone(),
                    url: e.url_template.clone(),
                })
                .collect(),
        }
    }

    /// Snapshot with every URL rebuilt from its template and `params`.
    ///
    /// Total and idempotent: URLs are always derived from the stored
    /// template, never from a previously resolved URL.
    pub fn apply_parameters(&self, params: &Parameters) -> RegistrySnapshot {
        RegistrySnapshot {
            endpoints: self
                .endpoints
                .iter()
                .map(|e| ResolvedEndpoint {
                    name: e.name.clone(),
                    url: resolve_url(&e.url_template, params),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// URL derivation
// ---------------------------------------------------------------------------

/// Derive a request URL from a template and parameters.
///
/// Templates containing `{projectId}`, `{appName}` or `{pipelineName}` have
/// those placeholders substituted. Any other template keeps its origin and
/// gets `/{projectId}/{appName}/{pipelineName}` as its path, with query and
/// fragment dropped. A template that does not parse is returned unchanged
/// and fails at fetch time.
pub fn resolve_url(template: &str, params: &Parameters) -> String {
    let project = urlencoding::encode(&params.project_id);
    let app = urlencoding::encode(&params.app_name);
    let pipeline = urlencoding::encode(&params.pipeline_name);

    if has_placeholders(template) {
        return template
            .replace(PROJECT_ID, &project)
            .replace(APP_NAME, &app)
            .replace(PIPELINE_NAME, &pipeline);
    }

    let Ok(mut url) = Url::parse(template) else {
        return template.to_string();
    };
    url.set_path(&format!("/{project}/{app}/{pipeline}"));
    url.set_query(None);
    url.set_fragment(None);
    url.into()
}

fn has_placeholders(template: &str) -> bool {
    [PROJECT_ID, APP_NAME, PIPELINE_NAME]
        .iter()
        .any(|p| template.contains(p))
}

/// Placeholders are filled with a dummy value so that a template like
/// `https://{projectId}.ci.example.com` is checked as a host.
fn check_template(endpoint: &Endpoint) -> Result<(), ConfigError> {
    let candidate = endpoint
        .url_template
        .replace(PROJECT_ID, "x")
        .replace(APP_NAME, "x")
        .replace(PIPELINE_NAME, "x");

    let invalid = |reason: String| ConfigError::InvalidUrl {
        name: endpoint.name.clone(),
        url: endpoint.url_template.clone(),
        reason,
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
    if !url.has_host() || url.cannot_be_a_base() {
        return Err(invalid("not an absolute URL with a host".to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p: &str, a: &str, pipe: &str) -> Parameters {
        Parameters {
            project_id: p.to_string(),
            app_name: a.to_string(),
            pipeline_name: pipe.to_string(),
        }
    }

    #[test]
    fn from_json_preserves_order() {
        let registry = Registry::from_json(
            r#"{"apis":[{"name":"Builds","url":"http://a"},{"name":"Deploys","url":"http://b"}]}"#,
        )
        .unwrap();
        assert_eq!(registry.names(), vec!["Builds", "Deploys"]);
        assert_eq!(registry.endpoints()[1].url_template, "http://b");
    }

    #[test]
    fn from_json_rejects_missing_apis_key() {
        let err = Registry::from_json(r#"{"endpoints":[]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_json_rejects_malformed_json() {
        assert!(matches!(
            Registry::from_json("{not json").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn from_json_rejects_empty_list() {
        assert!(matches!(
            Registry::from_json(r#"{"apis":[]}"#).unwrap_err(),
            ConfigError::Empty
        ));
    }

    #[test]
    fn from_json_rejects_duplicate_names() {
        let err = Registry::from_json(
            r#"{"apis":[{"name":"A","url":"http://a"},{"name":"A","url":"http://b"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(ref n) if n == "A"));
    }

    #[test]
    fn from_json_rejects_blank_name() {
        let err = Registry::from_json(r#"{"apis":[{"name":" ","url":"http://a"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName(0)));
    }

    #[test]
    fn snapshot_uses_templates_verbatim() {
        let registry =
            Registry::from_json(r#"{"apis":[{"name":"A","url":"http://x/PID/APP/PIPE"}]}"#)
                .unwrap();
        assert_eq!(registry.snapshot().url_of("A"), Some("http://x/PID/APP/PIPE"));
    }

    #[test]
    fn apply_parameters_replaces_path_of_plain_template() {
        let registry =
            Registry::from_json(r#"{"apis":[{"name":"Pipeline","url":"http://x/PID/APP/PIPE"}]}"#)
                .unwrap();
        let snap = registry.apply_parameters(&params("p1", "web", "main"));
        assert_eq!(snap.url_of("Pipeline"), Some("http://x/p1/web/main"));
    }

    #[test]
    fn apply_parameters_substitutes_placeholders() {
        let url = resolve_url(
            "https://ci.example.com/api/{projectId}/apps/{appName}?pipeline={pipelineName}",
            &params("p1", "web", "main"),
        );
        assert_eq!(url, "https://ci.example.com/api/p1/apps/web?pipeline=main");
    }

    #[test]
    fn apply_parameters_is_idempotent() {
        let registry =
            Registry::from_json(r#"{"apis":[{"name":"A","url":"http://x:8080/a/b"}]}"#).unwrap();
        let p = params("p", "a", "c");
        assert_eq!(registry.apply_parameters(&p), registry.apply_parameters(&p));
    }

    #[test]
    fn apply_parameters_overwrites_previous_values() {
        let registry = Registry::from_json(r#"{"apis":[{"name":"A","url":"http://x/"}]}"#).unwrap();
        let _ = registry.apply_parameters(&params("first", "a", "b"));
        let snap = registry.apply_parameters(&params("second", "a", "b"));
        assert_eq!(snap.url_of("A"), Some("http://x/second/a/b"));
    }

    #[test]
    fn empty_parameters_produce_empty_segments() {
        assert_eq!(resolve_url("http://x/y", &Parameters::default()), "http://x///");
    }

    #[test]
    fn parameters_are_percent_encoded() {
        assert_eq!(
            resolve_url("http://x", &params("my project", "a/b", "c")),
            "http://x/my%20project/a%2Fb/c"
        );
    }

    #[test]
    fn plain_template_keeps_port_and_drops_query() {
        let p = params("p", "a", "c");
        assert_eq!(resolve_url("http://host:9000/path?q=1#top", &p), "http://host:9000/p/a/c");
        assert_eq!(resolve_url("http://host?q=1", &p), "http://host/p/a/c");
    }

    #[test]
    fn backslash_path_is_replaced_like_any_other() {
        assert_eq!(
            resolve_url("http://host\\api\\v1", &params("p", "a", "c")),
            "http://host/p/a/c"
        );
    }

    #[test]
    fn from_json_rejects_scheme_relative_template() {
        let err = Registry::from_json(r#"{"apis":[{"name":"A","url":"//host/api"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { ref name, .. } if name == "A"));
    }

    #[test]
    fn from_json_rejects_templates_without_host() {
        for url in ["host/path", "mailto:ops@example.com", "not a url"] {
            let text = serde_json::json!({"apis": [{"name": "A", "url": url}]}).to_string();
            assert!(
                matches!(Registry::from_json(&text), Err(ConfigError::InvalidUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn from_json_accepts_placeholder_in_host() {
        let registry = Registry::from_json(
            r#"{"apis":[{"name":"A","url":"https://{projectId}.ci.example.com/{appName}"}]}"#,
        )
        .unwrap();
        let snap = registry.apply_parameters(&params("p1", "web", ""));
        assert_eq!(snap.url_of("A"), Some("https://p1.ci.example.com/web"));
    }

    #[test]
    fn parameters_deserialize_from_camel_case() {
        let p: Parameters =
            serde_json::from_str(r#"{"projectId":"1","appName":"web","pipelineName":"ci"}"#)
                .unwrap();
        assert_eq!(p, params("1", "web", "ci"));
    }
}
