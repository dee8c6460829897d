//! Configuration system for the dashboard UI layer.
//!
//! Provides a layered configuration hierarchy:
//!
//! 1. **Built-in defaults**: hardcoded in [`schema::UiConfig::default()`]
//! 2. **User global config**: `~/.pbi-explorer/config.toml`
//! 3. **Project local config**: `.pbi-explorer.toml` in the current directory
//! 4. **Environment variables**: `PBI_EXPLORER_*` overrides (highest precedence)
//!
//! Later layers override earlier ones at the key level: the TOML files are
//! merged as value trees before deserialization, so a project file that sets
//! only `[api] base_url` keeps everything else from the global file.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pbi_explorer_ui::config;
//!
//! let cfg = config::load();
//! let timeout = cfg.api.timeout();
//! ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::UiConfig;

use crate::counter::CounterStrategy;
use crate::theme::Theme;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. A malformed file is skipped on its own; the other layers still
/// apply.
pub fn load() -> UiConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_value);
    let mut config = merge_layers(layers);
    apply_env_overrides(&mut config);
    config
}

/// Merge TOML layers in order, lowest precedence first.
fn merge_layers(layers: impl IntoIterator<Item = toml::Value>) -> UiConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for layer in layers {
        merge_values(&mut merged, layer);
    }
    merged.try_into().unwrap_or_default()
}

/// Read a TOML file into a raw value tree.
///
/// Returns `None` if the path is `None`, the file doesn't exist, the content
/// is malformed, or a key has the wrong type for [`UiConfig`].
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let content = fs::read_to_string(path?).ok()?;
    parse_layer(&content)
}

fn parse_layer(content: &str) -> Option<toml::Value> {
    let value: toml::Value = toml::from_str(content).ok()?;
    value.clone().try_into::<UiConfig>().ok()?;
    Some(value)
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.pbi-explorer/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pbi-explorer").join("config.toml"))
}

/// Path to the project local config: `.pbi-explorer.toml` in the current
/// directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".pbi-explorer.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `PBI_EXPLORER_API_URL`: backend base URL
/// - `PBI_EXPLORER_API_TIMEOUT_MS`: request timeout
/// - `PBI_EXPLORER_THEME`: default theme (`dark`/`light`)
/// - `PBI_EXPLORER_COUNTER_STRATEGY`: `eased`/`stepped`
/// - `PBI_EXPLORER_LOGGING`: diagnostic log on/off
fn apply_env_overrides(config: &mut UiConfig) {
    if let Ok(val) = std::env::var("PBI_EXPLORER_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("PBI_EXPLORER_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("PBI_EXPLORER_THEME")
        && let Some(theme) = Theme::parse(&val)
    {
        config.theme.default = theme;
    }
    if let Ok(val) = std::env::var("PBI_EXPLORER_COUNTER_STRATEGY")
        && let Some(strategy) = CounterStrategy::parse(&val)
    {
        config.counters.strategy = strategy;
    }
    if let Ok(val) = std::env::var("PBI_EXPLORER_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.pbi-explorer/config.toml`.
///
/// Creates the directory if it doesn't exist. Returns an error if the file
/// already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.pbi-explorer/ directory")?;
    }

    fs::write(&path, UiConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Starts from the existing file (or the serialized defaults), updates the
/// dotted key, validates that the result still deserializes, and writes it
/// back.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&UiConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let _: UiConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The leaf must already exist (in the file or the defaults); its current
/// type decides how the raw string is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (section_path, leaf) = match key.rsplit_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    if let Some(section_path) = section_path {
        for part in section_path.split('.') {
            current = current
                .get_mut(part)
                .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
        }
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{}'", section_path.unwrap_or("")))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
