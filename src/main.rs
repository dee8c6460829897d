use anyhow::Result;
use clap::{Parser, Subcommand};

use pbi_explorer_ui::ai::ArtifactKind;

mod cli;

#[derive(Debug, Parser)]
#[command(name = "pbi-explorer-ui")]
#[command(about = "Headless driver for the Power BI explorer dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ask the backend for an optimized rewrite of a measure
    Optimize {
        /// Measure name
        #[arg(long)]
        measure: String,
        /// DAX expression
        #[arg(long)]
        dax: String,
    },
    /// Ask the backend for a plain-language explanation of a measure
    Explain {
        /// Measure name
        #[arg(long)]
        measure: String,
        /// DAX expression
        #[arg(long)]
        dax: String,
    },
    /// Show or toggle the persisted theme preference
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch between dark and light
    Toggle,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.pbi-explorer/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `api.base_url`
    Set { key: String, value: String },
    /// Print config file locations
    Path,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Optimize { measure, dax } => {
            cli::run_artifact(ArtifactKind::Optimize, &measure, &dax)
        }
        Commands::Explain { measure, dax } => {
            cli::run_artifact(ArtifactKind::Explain, &measure, &dax)
        }
        Commands::Theme { action } => match action {
            ThemeAction::Show => cli::run_theme_show(),
            ThemeAction::Toggle => cli::run_theme_toggle(),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Path => cli::run_config_path(),
        },
    }
}
