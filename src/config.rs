//! Configuration management for fiona-emu.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (`FIONA_BACKEND_MODULE`, etc.)
//! 2. Project-local config file (`./fiona-emu.toml`)
//! 3. User config file (`~/.config/fiona-emu/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # fiona-emu.toml
//!
//! # Backend module named in DOTP/MVM kernel calls
//! backend_module = "ideal_numerical"
//!
//! # Fault on unknown function codes instead of ignoring them
//! strict_opcodes = false
//!
//! # Out-of-range SHUFFLE indices: "fault" or "wrap"
//! shuffle_policy = "fault"
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::backend::IDEAL_NUMERICAL;
use crate::interpreter::core::EngineOptions;
use crate::interpreter::execute::ShufflePolicy;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Project-local config file name.
const LOCAL_CONFIG: &str = "fiona-emu.toml";

/// fiona-emu configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Backend module for kernel calls.
    pub backend_module: Option<String>,

    /// Treat unknown function codes as illegal instructions.
    pub strict_opcodes: Option<bool>,

    /// Out-of-range SHUFFLE index handling.
    pub shuffle_policy: Option<ShufflePolicy>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Unreadable or malformed files are logged and skipped.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(path) = Self::user_config_path() {
            config.merge_file(&path);
        }
        config.merge_file(Path::new(LOCAL_CONFIG));

        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Backend module, defaulting to `ideal_numerical`.
    pub fn backend_module(&self) -> String {
        self.backend_module
            .clone()
            .unwrap_or_else(|| IDEAL_NUMERICAL.to_string())
    }

    /// Strict opcode mode, default off.
    pub fn strict_opcodes(&self) -> bool {
        self.strict_opcodes.unwrap_or(false)
    }

    /// Shuffle policy, default fault.
    pub fn shuffle_policy(&self) -> ShufflePolicy {
        self.shuffle_policy.unwrap_or_default()
    }

    /// Engine options resolved from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            backend_module: self.backend_module(),
            strict_opcodes: self.strict_opcodes(),
            shuffle_policy: self.shuffle_policy(),
        }
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match Self::load_from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                self.merge(config);
            }
            Err(e) => log::warn!("{:#}", e),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    pub fn merge(&mut self, other: Self) {
        if other.backend_module.is_some() {
            self.backend_module = other.backend_module;
        }
        if other.strict_opcodes.is_some() {
            self.strict_opcodes = other.strict_opcodes;
        }
        if other.shuffle_policy.is_some() {
            self.shuffle_policy = other.shuffle_policy;
        }
    }

    /// Apply `FIONA_*` overrides from `lookup` (the process environment in
    /// [`Config::load`]). Invalid values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(module) = lookup("FIONA_BACKEND_MODULE") {
            log::info!("Using FIONA_BACKEND_MODULE from environment: {}", module);
            self.backend_module = Some(module);
        }
        if let Some(value) = lookup("FIONA_STRICT_OPCODES") {
            match parse_flag(&value) {
                Ok(flag) => self.strict_opcodes = Some(flag),
                Err(e) => log::warn!("FIONA_STRICT_OPCODES: {:#}", e),
            }
        }
        if let Some(value) = lookup("FIONA_SHUFFLE_POLICY") {
            match parse_shuffle_policy(&value) {
                Ok(policy) => self.shuffle_policy = Some(policy),
                Err(e) => log::warn!("FIONA_SHUFFLE_POLICY: {:#}", e),
            }
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("fiona-emu").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# fiona-emu configuration
# Place this file at ~/.config/fiona-emu/config.toml or ./fiona-emu.toml

# Backend module named in DOTP/MVM kernel calls
backend_module = "ideal_numerical"

# Fault on unknown function codes instead of logging and ignoring them
# strict_opcodes = true

# Out-of-range SHUFFLE indices: "fault" (illegal instruction) or "wrap"
# shuffle_policy = "wrap"
"#
        .to_string()
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        config.engine_options()
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}

fn parse_shuffle_policy(value: &str) -> Result<ShufflePolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fault" => Ok(ShufflePolicy::Fault),
        "wrap" => Ok(ShufflePolicy::Wrap),
        other => bail!("expected 'fault' or 'wrap', got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend_module(), "ideal_numerical");
        assert!(!config.strict_opcodes());
        assert_eq!(config.shuffle_policy(), ShufflePolicy::Fault);
        assert_eq!(config.engine_options(), EngineOptions::default());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config {
            backend_module: Some("base".to_string()),
            strict_opcodes: Some(true),
            shuffle_policy: None,
        };

        let overlay = Config {
            backend_module: None,
            strict_opcodes: Some(false),
            shuffle_policy: Some(ShufflePolicy::Wrap),
        };

        base.merge(overlay);

        assert_eq!(base.backend_module, Some("base".to_string()));
        assert_eq!(base.strict_opcodes, Some(false));
        assert_eq!(base.shuffle_policy, Some(ShufflePolicy::Wrap));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("FIONA_BACKEND_MODULE", "analog"),
            ("FIONA_STRICT_OPCODES", "yes"),
            ("FIONA_SHUFFLE_POLICY", "Wrap"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        let opts = EngineOptions::from(&config);
        assert_eq!(opts.backend_module, "analog");
        assert!(opts.strict_opcodes);
        assert_eq!(opts.shuffle_policy, ShufflePolicy::Wrap);
    }

    #[test]
    fn test_invalid_override_ignored() {
        let mut config = Config {
            shuffle_policy: Some(ShufflePolicy::Wrap),
            ..Default::default()
        };
        config.apply_overrides(|k| match k {
            "FIONA_SHUFFLE_POLICY" => Some("sometimes".to_string()),
            "FIONA_STRICT_OPCODES" => Some("maybe".to_string()),
            _ => None,
        });

        assert_eq!(config.shuffle_policy, Some(ShufflePolicy::Wrap));
        assert_eq!(config.strict_opcodes, None);
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = Config::sample_config();
        let config: Config = toml::from_str(&sample).expect("Sample config should parse");
        assert_eq!(config.backend_module(), "ideal_numerical");
    }

    #[test]
    fn test_file_values() {
        let config: Config =
            toml::from_str("strict_opcodes = true\nshuffle_policy = \"wrap\"\n").unwrap();
        assert!(config.strict_opcodes());
        assert_eq!(config.shuffle_policy(), ShufflePolicy::Wrap);
        assert_eq!(config.backend_module, None);
    }

    #[test]
    fn test_missing_file_is_error_with_context() {
        let err = Config::load_from_file(Path::new("/nonexistent/fiona-emu.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read"));
    }
}
