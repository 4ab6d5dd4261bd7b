//! Configuration loading and parsing (vmprint.toml)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vmprint::ForwarderConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub forwarder: ForwarderConfig,
    #[serde(default)]
    pub sinks: SinksConfig,
}

/// Where the print and error paths of the harness VM end up
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinksConfig {
    #[serde(default = "default_print_target")]
    pub print: SinkTarget,
    #[serde(default = "default_error_target")]
    pub error: SinkTarget,
    /// Prepend `[vm 0x..]` to every delivered line
    #[serde(default)]
    pub prefix_handle: bool,
    /// Dynamic library providing C sinks, required by the `library` target
    pub library: Option<PathBuf>,
    #[serde(default = "default_print_symbol")]
    pub print_symbol: String,
    #[serde(default = "default_error_symbol")]
    pub error_symbol: String,
}

impl Default for SinksConfig {
    fn default() -> Self {
        Self {
            print: default_print_target(),
            error: default_error_target(),
            prefix_handle: false,
            library: None,
            print_symbol: default_print_symbol(),
            error_symbol: default_error_symbol(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkTarget {
    Stdout,
    Stderr,
    Log,
    Library,
}

fn default_print_target() -> SinkTarget {
    SinkTarget::Stdout
}

fn default_error_target() -> SinkTarget {
    SinkTarget::Stderr
}

fn default_print_symbol() -> String {
    "vm_print".to_string()
}

fn default_error_symbol() -> String {
    "vm_error".to_string()
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        let wants_library =
            self.sinks.print == SinkTarget::Library || self.sinks.error == SinkTarget::Library;
        if wants_library && self.sinks.library.is_none() {
            bail!("[sinks] uses the library target but no library path is set");
        }
        if self.forwarder.max_message_len == Some(0) {
            bail!("[forwarder] max_message_len must be at least 1");
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}
