//! CLI command implementations.
//!
//! - `apiview serve` — run a polling session behind the web dashboard
//! - `apiview poll` — one blocking poll cycle, printed to stdout
//! - `apiview check` — validate the endpoint file
//! - `apiview config show|init` — settings management

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::activity;
use crate::config::{self, ApiviewConfig};
use crate::poller::{HttpFetcher, Poller, RenderPayload};
use crate::registry::{self, Parameters, Registry};
use crate::session::Session;
use crate::web::{self, Dashboard, TabBoard};

/// Output format for `apiview poll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Html,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("html") => Self::Html,
            _ => Self::Table,
        }
    }
}

/// Flags shared by every command that reads the endpoint file.
#[derive(Debug, Clone, Default)]
pub struct RegistryArgs {
    pub apis: Option<PathBuf>,
}

/// Resolved settings with logging applied.
fn settings() -> ApiviewConfig {
    let cfg = config::load();
    activity::set_enabled(cfg.logging.enabled);
    cfg
}

fn registry_path(cfg: &ApiviewConfig, args: &RegistryArgs) -> PathBuf {
    args.apis
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.registry.path))
}

fn load_registry(cfg: &ApiviewConfig, args: &RegistryArgs) -> Result<Registry> {
    let path = registry_path(cfg, args);
    registry::load(&path).with_context(|| format!("cannot load endpoints from {}", path.display()))
}

// ---------------------------------------------------------------------------
// apiview serve
// ---------------------------------------------------------------------------

/// Start a session and serve the dashboard until interrupted.
pub fn run_serve(args: RegistryArgs, addr: Option<String>, no_browser: bool) -> Result<()> {
    let cfg = settings();
    let registry = load_registry(&cfg, &args)?;
    let addr = addr.unwrap_or_else(|| cfg.server.addr.clone());
    let open = cfg.server.open_browser && !no_browser;

    let (session, renders) = Session::init(registry, Arc::new(HttpFetcher::new()))?;

    let board = TabBoard::shared(session.endpoint_names().to_vec());
    let _display = web::board::spawn_display(Arc::clone(&board), renders)
        .context("failed to spawn display thread")?;

    let dashboard = Dashboard::new(board, session.commands());
    let result = web::serve(&addr, &dashboard, open);

    session.shutdown();
    result
}

// ---------------------------------------------------------------------------
// apiview poll
// ---------------------------------------------------------------------------

/// Run one poll cycle and print every payload.
pub fn run_poll(args: RegistryArgs, params: Option<Parameters>, format: OutputFormat) -> Result<()> {
    let cfg = settings();
    let registry = load_registry(&cfg, &args)?;

    let snapshot = match &params {
        Some(p) => registry.apply_parameters(p),
        None => registry.snapshot(),
    };

    let (tx, _rx) = crossbeam::channel::unbounded();
    let poller = Poller::new(Arc::new(HttpFetcher::new()), tx);
    let payloads = poller.run_poll_cycle_blocking(&snapshot);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&payloads)
                .context("failed to serialize render payloads")?;
            println!("{json}");
        }
        OutputFormat::Html => {
            for p in &payloads {
                println!("<h2>{}</h2>\n{}", p.endpoint_name, p.html);
            }
        }
        OutputFormat::Table => print_payloads_table(&payloads, |name| {
            snapshot.url_of(name).unwrap_or("").to_string()
        }),
    }

    Ok(())
}

fn print_payloads_table(payloads: &[RenderPayload], url_of: impl Fn(&str) -> String) {
    println!("{}", "apiview poll".bold().cyan());
    println!("{}", "=".repeat(60));

    for p in payloads {
        println!();
        let failed = p.html.starts_with("Error: ");
        let marker = if failed { "FAIL".red().bold() } else { "OK".green().bold() };
        println!("  {} {}  {}", marker, p.endpoint_name.bold(), url_of(&p.endpoint_name).dimmed());
        if failed {
            println!("     {}", p.html.red());
        } else {
            println!("     {} bytes of html", p.html.len());
        }
    }

    let failures = payloads.iter().filter(|p| p.html.starts_with("Error: ")).count();
    println!();
    println!(
        "  {} endpoints, {} failed",
        payloads.len(),
        if failures == 0 {
            failures.to_string().green()
        } else {
            failures.to_string().red()
        }
    );
}

// ---------------------------------------------------------------------------
// apiview check
// ---------------------------------------------------------------------------

/// Validate the endpoint file and list its endpoints.
pub fn run_check(args: RegistryArgs) -> Result<()> {
    let cfg = settings();
    let path = registry_path(&cfg, &args);

    match registry::load(&path) {
        Ok(registry) => {
            println!(
                "{} {} ({} endpoints)",
                "OK".green().bold(),
                path.display(),
                registry.len()
            );
            for endpoint in registry.endpoints() {
                println!("  {:<24} {}", endpoint.name, endpoint.url_template.dimmed());
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "INVALID".red().bold(), path.display());
            Err(e).context("endpoint file failed validation")
        }
    }
}

// ---------------------------------------------------------------------------
// apiview config
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    let toml_text = config::show_effective_config()?;

    if let Some(p) = config::global_config_file() {
        let state = if p.exists() { "found" } else { "not found" };
        println!("{} {} ({state})", "# global: ".dimmed(), p.display());
    }
    if let Some(p) = config::project_config_file() {
        let state = if p.exists() { "found" } else { "not found" };
        println!("{} {} ({state})", "# project:".dimmed(), p.display());
    }
    println!();
    print!("{toml_text}");
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}
