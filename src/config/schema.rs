//! Configuration schema and defaults for the dashboard UI layer.
//!
//! Defines the TOML-serializable configuration structure with all sections:
//! `[api]`, `[theme]`, `[notifications]`, `[counters]`, `[debounce]`,
//! `[shell]`, and `[logging]`.
//!
//! Every field has a sensible built-in default. Users only need to set the
//! values they want to override.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::counter::{CounterStrategy, CounterTrigger};
use crate::theme::{Theme, ThemeEncoding};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level UI configuration.
///
/// Maps directly to the `~/.pbi-explorer/config.toml` and
/// `.pbi-explorer.toml` file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub api: ApiConfig,
    pub theme: ThemeConfig,
    pub notifications: NotificationConfig,
    pub counters: CounterConfig,
    pub debounce: DebounceConfig,
    pub shell: ShellConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Backend endpoint settings for the AI artifact requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL the `/api/optimize-dax` and `/api/explain-dax` paths are
    /// appended to.
    pub base_url: String,
    /// Transport timeout per request (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 60_000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// [theme]
// ---------------------------------------------------------------------------

/// Theme persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Theme used when nothing is persisted yet.
    pub default: Theme,
    /// Storage key holding the preference.
    pub storage_key: String,
    /// How the preference is written: `boolean` (`"true"`/`"false"`, meaning
    /// dark mode) or `name` (`"dark"`/`"light"`).
    pub encoding: ThemeEncoding,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            default: Theme::Dark,
            storage_key: "darkMode".to_string(),
            encoding: ThemeEncoding::Boolean,
        }
    }
}

// ---------------------------------------------------------------------------
// [notifications]
// ---------------------------------------------------------------------------

/// Toast notification timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Default time a notification stays up before auto-dismissal.
    pub duration_ms: u64,
    /// Delay between attaching the node and marking it visible.
    pub enter_delay_ms: u64,
    /// Exit transition length before the node is detached.
    pub exit_delay_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            enter_delay_ms: 10,
            exit_delay_ms: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// [counters]
// ---------------------------------------------------------------------------

/// Metric counter animation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// `eased` (frame-synchronized, ease-out quartic) or `stepped`
    /// (fixed-interval increments).
    pub strategy: CounterStrategy,
    /// `on-visible` (first time the element is at least
    /// `visibility_threshold` visible) or `eager` (at init).
    pub trigger: CounterTrigger,
    pub duration_ms: u64,
    /// Fraction of the element that must be visible to start (0.0–1.0).
    pub visibility_threshold: f64,
    /// Frame cadence for the eased strategy.
    pub frame_interval_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            strategy: CounterStrategy::Eased,
            trigger: CounterTrigger::OnVisible,
            duration_ms: 1500,
            visibility_threshold: 0.5,
            frame_interval_ms: 16,
        }
    }
}

// ---------------------------------------------------------------------------
// [debounce]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Default wait for debounced callbacks (milliseconds).
    pub wait_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { wait_ms: 300 }
    }
}

// ---------------------------------------------------------------------------
// [shell]
// ---------------------------------------------------------------------------

/// Page chrome settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Delay before `app-loaded` is set on the document root.
    pub app_loaded_delay_ms: u64,
    /// Refresh interval of the date/time display.
    pub clock_interval_ms: u64,
    /// Page opened by the help button.
    pub help_url: String,
    /// Viewport width at or above which an open sidebar is closed after a
    /// resize settles.
    pub sidebar_breakpoint_px: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            app_loaded_delay_ms: 100,
            clock_interval_ms: 1000,
            help_url: "https://github.com/plagiagia/PowerBI_AnalysisTool".to_string(),
            sidebar_breakpoint_px: 992,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether the diagnostic log is written.
    pub enabled: bool,
    /// Log file path. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.pbi-explorer/ui-events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl UiConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `pbi-explorer-ui config init`.
    pub fn default_toml() -> String {
        r#"# pbi-explorer-ui configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (PBI_EXPLORER_*)
#   2. Project config (.pbi-explorer.toml in current directory)
#   3. User global config (~/.pbi-explorer/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:5000"
timeout_ms = 60000

[theme]
default = "dark"            # dark | light
storage_key = "darkMode"
encoding = "boolean"        # boolean ("true"/"false") | name ("dark"/"light")

[notifications]
duration_ms = 3000
enter_delay_ms = 10
exit_delay_ms = 300

[counters]
strategy = "eased"          # eased | stepped
trigger = "on-visible"      # on-visible | eager
duration_ms = 1500
visibility_threshold = 0.5
frame_interval_ms = 16

[debounce]
wait_ms = 300

[shell]
app_loaded_delay_ms = 100
clock_interval_ms = 1000
help_url = "https://github.com/plagiagia/PowerBI_AnalysisTool"
sidebar_breakpoint_px = 992

[logging]
enabled = true
path = "~/.pbi-explorer/ui-events.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
