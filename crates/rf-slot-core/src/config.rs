//! Slot configuration: catalog, evaluator rules, adaptive tuning, machine setup

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::adaptive::{AdaptiveConfig, JackpotWeightConfig};
use crate::error::ConfigError;
use crate::paytable::EvaluatorConfig;
use crate::symbols::SymbolCatalog;

/// Wallet and jackpot pool setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub starting_balance: f64,
    /// Pool value at session start and after every award
    pub jackpot_seed: f64,
    /// Fraction of each total bet added to the pool
    pub jackpot_contribution: f64,
    /// Pause held by a shared spin before it returns
    pub reveal_delay_ms: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            starting_balance: 100.0,
            jackpot_seed: 1000.0,
            jackpot_contribution: 0.10,
            reveal_delay_ms: 0,
        }
    }
}

impl MachineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.starting_balance.is_finite() || self.starting_balance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "machine.starting_balance must be non-negative, got {}",
                self.starting_balance
            )));
        }
        if !self.jackpot_seed.is_finite() || self.jackpot_seed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "machine.jackpot_seed must be non-negative, got {}",
                self.jackpot_seed
            )));
        }
        if !(0.0..=1.0).contains(&self.jackpot_contribution) {
            return Err(ConfigError::Invalid(format!(
                "machine.jackpot_contribution must be in [0, 1], got {}",
                self.jackpot_contribution
            )));
        }
        Ok(())
    }
}

/// Complete slot configuration
///
/// Every section has defaults, so a file only needs the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub catalog: SymbolCatalog,
    pub evaluator: EvaluatorConfig,
    pub adaptive: AdaptiveConfig,
    pub jackpot: JackpotWeightConfig,
    pub machine: MachineConfig,
}

impl SlotConfig {
    /// Largest config file accepted by [`SlotConfig::load`] (1MB)
    const MAX_FILE_SIZE: u64 = 1024 * 1024;

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "Config file too large: {} bytes (max {} bytes)",
                metadata.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let text = std::fs::read_to_string(path)?;

        let config = match extension.as_str() {
            "json" => Self::from_json_str(&text)?,
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        log::debug!("Loaded slot config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;
        if !self.evaluator.multi_line_bonus_step.is_finite() || self.evaluator.multi_line_bonus_step < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "evaluator.multi_line_bonus_step must be non-negative, got {}",
                self.evaluator.multi_line_bonus_step
            )));
        }
        self.adaptive.validate()?;
        self.jackpot.validate()?;
        self.machine.validate()?;
        Ok(())
    }

    /// Same config with RTP tracking switched off
    pub fn without_adaptation(mut self) -> Self {
        self.adaptive.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = SlotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.machine.starting_balance, 100.0);
        assert_eq!(config.machine.jackpot_seed, 1000.0);
        assert_eq!(config.catalog.jackpot_symbol, Symbol::FuelPump);
    }

    #[test]
    fn test_partial_json_override() {
        let config = SlotConfig::from_json_str(
            r#"{ "adaptive": { "target_rtp": 0.9 }, "machine": { "starting_balance": 500 } }"#,
        )
        .unwrap();
        assert_eq!(config.adaptive.target_rtp, 0.9);
        assert_eq!(config.adaptive.ema_alpha, 0.1);
        assert_eq!(config.machine.starting_balance, 500.0);
        assert_eq!(config.catalog, SymbolCatalog::standard());
    }

    #[test]
    fn test_yaml_override() {
        let yaml = "evaluator:\n  consolation_enabled: false\njackpot:\n  max_weight: 0.2\n";
        let config = SlotConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.evaluator.consolation_enabled);
        assert_eq!(config.jackpot.max_weight, 0.2);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SlotConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(SlotConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SlotConfig::from_json_str(r#"{ "machine": { "jackpot_contribution": 2.0 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));

        let err = SlotConfig::from_json_str("{ not json");
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("slot.json");
        std::fs::write(&json_path, r#"{ "adaptive": { "enabled": false } }"#).unwrap();
        assert!(!SlotConfig::load(&json_path).unwrap().adaptive.enabled);

        let yaml_path = dir.path().join("slot.yml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        writeln!(file, "machine:\n  reveal_delay_ms: 250").unwrap();
        assert_eq!(SlotConfig::load(&yaml_path).unwrap().machine.reveal_delay_ms, 250);

        let toml_path = dir.path().join("slot.toml");
        std::fs::write(&toml_path, "").unwrap();
        assert!(matches!(
            SlotConfig::load(&toml_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            SlotConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
