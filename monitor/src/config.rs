//! Monitor configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC URL for Solana cluster
    pub rpc_url: String,

    /// Percolator program ID
    pub program_id: Pubkey,

    /// Market slab account
    pub slab: Pubkey,

    /// Oracle account passed to crank/liquidation instructions
    pub oracle: Pubkey,

    /// Monitor wallet keypair path
    pub keypair_path: String,

    /// Polling interval in seconds
    pub poll_interval_secs: u64,

    /// Decimals of the position-size unit, for notional math
    pub mark_decimals: u32,

    /// Submit LiquidateAtOracle for liquidatable accounts
    pub liquidation_enabled: bool,

    /// Maximum liquidations per poll cycle
    pub max_liquidations_per_cycle: usize,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("MONITOR_CONFIG")
            .unwrap_or_else(|_| "monitor-config.toml".to_string());

        let config_str = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Create default configuration. Program, slab, and oracle keys are
    /// placeholders and must be set before liquidation is enabled.
    pub fn default_devnet() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id: Pubkey::default(),
            slab: Pubkey::default(),
            oracle: Pubkey::default(),
            keypair_path: "~/.config/solana/id.json".to_string(),
            poll_interval_secs: 2,
            mark_decimals: 9,
            liquidation_enabled: false,
            max_liquidations_per_cycle: 5,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_devnet();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }
}
