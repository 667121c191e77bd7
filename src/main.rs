use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use apiview::cli::{self, RegistryArgs};
use apiview::registry::Parameters;

#[derive(Debug, Parser)]
#[command(name = "apiview")]
#[command(about = "Poll JSON endpoints and show them as tables in a tabbed dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start polling and serve the tabbed dashboard
    Serve {
        /// Endpoint file (default: registry.path from settings)
        #[arg(long)]
        apis: Option<PathBuf>,
        /// Listen address (default: server.addr from settings)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open the dashboard in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Run a single poll cycle and print the results
    Poll {
        #[arg(long)]
        apis: Option<PathBuf>,
        /// Project ID substituted into every endpoint URL
        #[arg(long)]
        project_id: Option<String>,
        /// App name substituted into every endpoint URL
        #[arg(long)]
        app_name: Option<String>,
        /// Pipeline name substituted into every endpoint URL
        #[arg(long)]
        pipeline_name: Option<String>,
        /// Output format: table (default), json, html
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Validate the endpoint file
    Check {
        #[arg(long)]
        apis: Option<PathBuf>,
    },
    /// Show or initialise settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective settings as TOML
    Show,
    /// Write the default settings to ~/.apiview/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve {
            apis,
            addr,
            no_browser,
        } => cli::run_serve(RegistryArgs { apis }, addr, no_browser),
        Commands::Poll {
            apis,
            project_id,
            app_name,
            pipeline_name,
            format,
        } => {
            // Any parameter flag switches on templating; missing ones are empty.
            let params = if project_id.is_some() || app_name.is_some() || pipeline_name.is_some() {
                Some(Parameters {
                    project_id: project_id.unwrap_or_default(),
                    app_name: app_name.unwrap_or_default(),
                    pipeline_name: pipeline_name.unwrap_or_default(),
                })
            } else {
                None
            };
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_poll(RegistryArgs { apis }, params, fmt)
        }
        Commands::Check { apis } => cli::run_check(RegistryArgs { apis }),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
        },
    }
}
