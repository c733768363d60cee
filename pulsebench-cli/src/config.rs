//! Configuration loading from pulsebench.toml
//!
//! Engine defaults can live in a `pulsebench.toml` next to the project; the
//! file is discovered by walking up from the current directory. Command-line
//! flags override the file, the file overrides built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// PulseBench configuration file contents.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PulsebenchConfig {
    /// Engine defaults.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Output defaults.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Engine defaults for convergence and repetition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Convergence target in seconds.
    #[serde(default = "default_min_time")]
    pub min_time: f64,
    /// Repetitions of each benchmark.
    #[serde(default = "default_repetitions")]
    pub repetitions: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_time: default_min_time(),
            repetitions: default_repetitions(),
        }
    }
}

fn default_min_time() -> f64 {
    0.5
}
fn default_repetitions() -> u64 {
    1
}

/// Output defaults for the display and file reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Display reporter format: "console", "json", or "csv".
    #[serde(default = "default_format")]
    pub format: String,
    /// File reporter format.
    #[serde(default = "default_out_format")]
    pub out_format: String,
    /// File reporter path; empty disables file output.
    #[serde(default)]
    pub out: String,
    /// Console coloring: "auto", or a truthy/falsy value.
    #[serde(default = "default_color")]
    pub color: String,
    /// Print user counters as aligned columns.
    #[serde(default)]
    pub counters_tabular: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            out_format: default_out_format(),
            out: String::new(),
            color: default_color(),
            counters_tabular: false,
        }
    }
}

fn default_format() -> String {
    "console".to_string()
}
fn default_out_format() -> String {
    "json".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}

impl PulsebenchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load configuration by walking up from the current
    /// directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("pulsebench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }
}
