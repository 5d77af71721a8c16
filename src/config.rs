use std::fs;
use std::path::Path;
use std::time::Duration;

use log::info;
use serde::Deserialize;

use crate::error::{Result, SimulationError};
use crate::model::GasPrice;

/// Environment variable consulted when no config path is passed on the command line.
pub const CONFIG_ENV_VAR: &str = "AENZ_CONFIG";

pub const DEFAULT_WALLET_ADDRESS: &str = "aenz_18f9a2b1c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8";

/// Runtime settings for the simulation. Every field has a default, so a
/// config file only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub block_interval_ms: u64,
    pub scan_interval_ms: u64,
    /// Time a scan spends "analysing" before it touches the gas price.
    pub scan_delay_ms: u64,
    pub reward_interval_ms: u64,
    pub wallet_address: String,
    pub initial_balance: f64,
    pub initial_gas_price: f64,
    pub history_limit: usize,
    pub log_limit: usize,
    pub initial_blocks: usize,
    pub staking_apy: f64,
    pub autonomous: bool,
    pub seed: Option<u64>,
    pub run_for_secs: u64,
    pub log_level: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            block_interval_ms: 5_000,
            scan_interval_ms: 7_000,
            scan_delay_ms: 1_500,
            reward_interval_ms: 3_000,
            wallet_address: DEFAULT_WALLET_ADDRESS.to_string(),
            initial_balance: 1_000.0,
            initial_gas_price: 20.0,
            history_limit: 100,
            log_limit: 50,
            initial_blocks: 5,
            staking_apy: 8.5,
            autonomous: true,
            seed: None,
            run_for_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl SimulationConfig {
    /// Load the config from `path`, or fall back to the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                info!("Loading simulation config from {}", path.display());
                let raw = fs::read_to_string(path)?;
                serde_json::from_str::<SimulationConfig>(&raw)?
            }
            None => SimulationConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config path from the first CLI argument or `AENZ_CONFIG`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok());
        Self::load(path.as_deref().map(Path::new))
    }

    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("block_interval_ms", self.block_interval_ms),
            ("scan_interval_ms", self.scan_interval_ms),
            ("reward_interval_ms", self.reward_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(SimulationError::Config(format!("{} must be greater than zero", name)));
            }
        }

        if !self.initial_balance.is_finite() || self.initial_balance < 0.0 {
            return Err(SimulationError::Config(format!(
                "initial_balance must be a non-negative number, got {}",
                self.initial_balance
            )));
        }

        if !(GasPrice::MIN..=GasPrice::MAX).contains(&self.initial_gas_price) {
            return Err(SimulationError::Config(format!(
                "initial_gas_price must be within [{}, {}], got {}",
                GasPrice::MIN,
                GasPrice::MAX,
                self.initial_gas_price
            )));
        }

        // The advisor needs two blocks to estimate throughput
        if self.history_limit < 2 {
            return Err(SimulationError::Config("history_limit must be at least 2".to_string()));
        }
        if self.log_limit == 0 {
            return Err(SimulationError::Config("log_limit must be greater than zero".to_string()));
        }

        if !self.staking_apy.is_finite() || self.staking_apy < 0.0 {
            return Err(SimulationError::Config(format!(
                "staking_apy must be a non-negative number, got {}",
                self.staking_apy
            )));
        }

        self.log_level_filter()?;
        Ok(())
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| SimulationError::Config(format!("Unknown log level: {}", self.log_level)))
    }

    pub fn block_interval(&self) -> Duration {
        Duration::from_millis(self.block_interval_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn reward_interval(&self) -> Duration {
        Duration::from_millis(self.reward_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_dashboard_timings() {
        let config = SimulationConfig::default();
        assert_eq!(config.block_interval(), Duration::from_secs(5));
        assert_eq!(config.scan_interval(), Duration::from_secs(7));
        assert_eq!(config.scan_delay(), Duration::from_millis(1_500));
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.log_limit, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "scan_delay_ms": 0, "seed": 7, "log_level": "debug" }}"#).unwrap();

        let config = SimulationConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.scan_delay_ms, 0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Debug);
        assert_eq!(config.block_interval_ms, 5_000);
    }

    #[test]
    fn rejects_gas_price_out_of_bounds() {
        let config = SimulationConfig {
            initial_gas_price: 250.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimulationError::Config(_))));
    }

    #[test]
    fn rejects_zero_interval_and_tiny_history() {
        let config = SimulationConfig {
            block_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            history_limit: 1,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            SimulationConfig::load(Some(file.path())),
            Err(SimulationError::Json(_))
        ));
    }
}
