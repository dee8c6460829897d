//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `pbi-explorer-ui optimize|explain --measure NAME --dax EXPR`: run a
//!   headless dashboard against the configured backend and print the panel
//! - `pbi-explorer-ui theme show|toggle`: persisted theme preference
//! - `pbi-explorer-ui config show|init|set|path`: configuration management
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use pbi_explorer_ui::ai::{ArtifactKind, Delivery, UreqTransport};
use pbi_explorer_ui::config::{self, UiConfig};
use pbi_explorer_ui::diagnostics::DiagnosticLog;
use pbi_explorer_ui::dom::Dom;
use pbi_explorer_ui::dom::page::dashboard;
use pbi_explorer_ui::runtime::{EventLoop, ThreadDispatcher};
use pbi_explorer_ui::shell::{Measure, Shell};
use pbi_explorer_ui::storage::{FileStorage, MemoryStorage};
use pbi_explorer_ui::tabs::Panel;
use pbi_explorer_ui::theme::ThemeController;

/// Extra time allowed past the API timeout before giving up.
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// optimize / explain
// ---------------------------------------------------------------------------

/// Load one AI artifact for a measure and print it.
pub fn run_artifact(kind: ArtifactKind, measure: &str, dax: &str) -> Result<()> {
    let cfg = config::load();
    let log = DiagnosticLog::from_config(&cfg.logging);
    let limit = cfg.api.timeout() + RESPONSE_GRACE;
    let base_url = cfg.api.base_url.clone();

    let (tx, rx) = mpsc::channel();
    let transport = Arc::new(UreqTransport::from_config(&cfg.api));
    let dispatcher = ThreadDispatcher::new(transport, tx);

    let mut shell = Shell::new(
        dashboard(&[]),
        cfg,
        Box::new(MemoryStorage::new()),
        Box::new(dispatcher),
        log,
    );
    shell.init();
    shell.select_measure(&Measure::new(measure, dax));

    let panel = match kind {
        ArtifactKind::Optimize => Panel::Optimized,
        ArtifactKind::Explain => Panel::Explanation,
    };
    shell.switch_tab(panel);
    if !shell.is_loading(kind) {
        bail!("nothing to {kind}: the DAX expression is empty");
    }

    println!(
        "{} {} {} via {}",
        "→".cyan().bold(),
        kind.name().bold(),
        measure,
        base_url.dimmed()
    );

    let mut event_loop = EventLoop::new(rx);
    let finished = event_loop
        .run_until(&mut shell, |s| !s.is_loading(kind), limit)
        .context("event loop stopped unexpectedly")?;
    if !finished {
        bail!("timed out after {}s waiting for {kind}", limit.as_secs());
    }

    let output = match kind {
        ArtifactKind::Optimize => shell.dom().text(kind.content_id()),
        ArtifactKind::Explain => shell.dom().html(kind.content_id()),
    }
    .unwrap_or_default();

    match shell.last_delivery(kind) {
        Some(Delivery::Rendered) => {}
        Some(Delivery::SoftFailure) => {
            println!("{} {}", "✗".red().bold(), kind.soft_failure_message());
            bail!("{kind} failed: the response had no '{}'", kind.response_field());
        }
        Some(Delivery::HardFailure(failure)) => {
            println!("{} {}", "✗".red().bold(), kind.hard_failure_message());
            bail!("{kind} failed: {failure}");
        }
        Some(Delivery::Stale(_)) | None => bail!("{kind} produced no response"),
    }

    println!("{}", "=".repeat(50));
    println!("{output}");
    Ok(())
}

// ---------------------------------------------------------------------------
// theme show | toggle
// ---------------------------------------------------------------------------

fn theme_controller(cfg: &UiConfig) -> Result<ThemeController> {
    let storage = FileStorage::default_location().context("could not determine home directory")?;
    Ok(ThemeController::new(
        Box::new(storage),
        cfg.theme.storage_key.clone(),
        cfg.theme.encoding,
        cfg.theme.default,
        DiagnosticLog::from_config(&cfg.logging),
    ))
}

/// Print the persisted theme (or the configured default).
pub fn run_theme_show() -> Result<()> {
    let cfg = config::load();
    let mut controller = theme_controller(&cfg)?;
    let theme = controller.init(&mut dashboard(&[]));
    println!("{} {}", "Theme:".bold(), theme.to_string().cyan());
    Ok(())
}

/// Flip and persist the theme preference.
pub fn run_theme_toggle() -> Result<()> {
    let cfg = config::load();
    let mut controller = theme_controller(&cfg)?;
    let mut dom = dashboard(&[]);
    let before = controller.init(&mut dom);
    let after = controller.toggle(&mut dom);
    println!(
        "{} Theme switched from {} to {}",
        "✓".green().bold(),
        before,
        after.to_string().cyan().bold()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// config show | init | set | path
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.pbi-explorer/config.toml");
    print_source(project_exists, ".pbi-explorer.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "PBI_EXPLORER_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {} {}", "·".dimmed(), name.dimmed(), "(not found)".dimmed());
    }
}

/// Write the default config file.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Print the config file locations.
pub fn run_config_path() -> Result<()> {
    let global = config::global_config_file().context("could not determine home directory")?;
    println!("{:<8} {}", "global".bold(), global.display());
    if let Some(project) = config::project_config_file() {
        println!("{:<8} {}", "project".bold(), project.display());
    }
    Ok(())
}
