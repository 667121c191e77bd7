/// Settings for apiview.
///
/// Layered the usual way:
///
/// 1. **Built-in defaults** — [`schema::ApiviewConfig::default()`]
/// 2. **User global settings** — `~/.apiview/config.toml`
/// 3. **Project local settings** — `.apiview.toml` in the working directory
/// 4. **CLI flags** — applied by the command handlers
///
/// Later layers override earlier ones at the key level: a project file that
/// only sets `[logging] enabled` keeps the global `[server] addr`.
///
/// Settings are separate from the endpoint file (`apiConfig.json`), which is
/// loaded by [`crate::registry::load`].
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use toml::{Table, Value};

pub use schema::ApiviewConfig;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the fully resolved settings.
pub fn load() -> ApiviewConfig {
    load_layers(&[global_config_path(), project_config_path()])
}

/// Merge the given files over the defaults, later files winning.
fn load_layers(paths: &[Option<PathBuf>]) -> ApiviewConfig {
    let mut merged = Table::new();
    for path in paths {
        if let Some(layer) = load_toml_file(path.clone()) {
            merge_tables(&mut merged, layer);
        }
    }
    Value::Table(merged).try_into().unwrap_or_default()
}

/// Load a settings file as a raw table if it exists and parses. Malformed
/// files, including ones with a wrongly typed value, are ignored whole.
fn load_toml_file(path: Option<PathBuf>) -> Option<Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let table: Table = toml::from_str(&content).ok()?;
    Value::Table(table.clone()).try_into::<ApiviewConfig>().ok()?;
    Some(table)
}

/// Only keys present in `overlay` are written; nested tables merge
/// recursively.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (Some(slot), value) => *slot = value,
            (None, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".apiview").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".apiview.toml"))
}

/// Path to the global settings file, for display and `config init`.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path to the project settings file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// init / show
// ---------------------------------------------------------------------------

/// Write the annotated default settings to `~/.apiview/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default(&path, force)?;
    Ok(path)
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "settings file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(path, ApiviewConfig::default_toml()).context("failed to write settings file")?;
    Ok(())
}

/// Effective settings as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective settings")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
