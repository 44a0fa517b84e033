use std::fs;
use std::path::Path;

use lixir_core::{StrategyParams, MAX_PERFORMANCE_FEE, MAX_TICK_PARAMETER};
use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, KeeperResult};

/// Keeper configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Default loop interval in seconds
    pub default_update_interval: u64,

    /// Maximum number of vaults to rebalance per iteration
    pub max_batch_size: usize,

    /// Run a health check every this many iterations
    pub health_check_every: u64,

    /// Retry configuration
    pub retry: RetryConfig,

    /// Simulated market driving the vaults
    pub market: MarketConfig,

    /// List of vaults to monitor and rebalance
    pub vaults: Vec<VaultConfig>,
}

/// Configuration for an individual vault
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VaultConfig {
    /// Vault name for logging
    pub name: String,

    /// Pool fee tier in hundredths of a bip
    pub fee: u32,

    pub tick_spacing: i32,

    /// Pool tick when the vault is created
    pub initial_tick: i32,

    /// Performance fee in parts per million
    pub performance_fee: u32,

    /// GWAP window in seconds
    pub tick_short_duration: u32,

    pub max_tick_diff: i32,
    pub main_spread: i32,
    pub range_spread: i32,

    /// Minimum time between rebalances (seconds)
    pub min_rebalance_interval: u64,

    /// Maximum time without a rebalance before one is forced (seconds)
    pub max_staleness: u64,

    /// Distance of the tick from the main position's centre that triggers a rebalance
    pub drift_threshold_ticks: i32,

    /// Priority level (higher = served first)
    pub priority: u8,

    /// Whether this vault is enabled
    pub enabled: bool,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum number of retries for transient failures
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

/// Random order flow applied to every simulated vault between iterations.
/// Amounts are whole tokens of `decimals` decimals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarketConfig {
    pub seed: u64,
    pub decimals: u32,
    pub swaps_per_iteration: usize,
    /// Largest single swap
    pub max_swap_tokens: u64,
    /// Largest time step between swaps, seconds
    pub max_time_step: u64,
    /// Largest per-token deposit made by each simulated user at startup
    pub max_initial_deposit_tokens: u64,
}

impl KeeperConfig {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> KeeperResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            KeeperError::InvalidConfig(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> KeeperResult<Self> {
        let config: KeeperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> KeeperResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> KeeperResult<()> {
        if self.vaults.is_empty() {
            return Err(invalid("vaults", "empty", "at least one vault"));
        }
        if self.default_update_interval == 0 {
            return Err(invalid("default_update_interval", "0", "greater than 0"));
        }
        if self.max_batch_size == 0 {
            return Err(invalid("max_batch_size", "0", "greater than 0"));
        }
        if self.health_check_every == 0 {
            return Err(invalid("health_check_every", "0", "greater than 0"));
        }

        let mut names = std::collections::HashSet::new();
        for vault in &self.vaults {
            vault.validate()?;
            if !names.insert(vault.name.as_str()) {
                return Err(invalid("vault name", &vault.name, "unique"));
            }
        }

        self.retry.validate()?;
        self.market.validate()?;
        Ok(())
    }

    /// Get enabled vaults sorted by priority
    pub fn enabled_vaults(&self) -> Vec<&VaultConfig> {
        let mut vaults: Vec<_> = self.vaults.iter().filter(|v| v.enabled).collect();
        vaults.sort_by(|a, b| b.priority.cmp(&a.priority));
        vaults
    }

    pub fn vault(&self, name: &str) -> Option<&VaultConfig> {
        self.vaults.iter().find(|vault| vault.name == name)
    }
}

impl VaultConfig {
    /// Strategy parameters this vault is configured with
    pub fn strategy_params(&self) -> StrategyParams {
        StrategyParams {
            fee: self.fee,
            tick_short_duration: self.tick_short_duration,
            max_tick_diff: self.max_tick_diff,
            main_spread: self.main_spread,
            range_spread: self.range_spread,
        }
    }

    fn validate(&self) -> KeeperResult<()> {
        if self.name.is_empty() {
            return Err(invalid("vault name", "empty", "non-empty string"));
        }
        if self.tick_spacing <= 0 {
            return Err(invalid("tick_spacing", &self.tick_spacing.to_string(), "greater than 0"));
        }
        if self.performance_fee > MAX_PERFORMANCE_FEE {
            return Err(invalid(
                "performance_fee",
                &self.performance_fee.to_string(),
                &format!("at most {}", MAX_PERFORMANCE_FEE),
            ));
        }
        self.strategy_params()
            .validate()
            .map_err(|e| KeeperError::InvalidConfig(format!("vault {}: {}", self.name, e)))?;
        if self.max_staleness <= self.min_rebalance_interval {
            return Err(invalid(
                "max_staleness",
                &self.max_staleness.to_string(),
                &format!("greater than min_rebalance_interval ({})", self.min_rebalance_interval),
            ));
        }
        if !(1..=MAX_TICK_PARAMETER).contains(&self.drift_threshold_ticks) {
            return Err(invalid(
                "drift_threshold_ticks",
                &self.drift_threshold_ticks.to_string(),
                "positive",
            ));
        }
        Ok(())
    }
}

impl RetryConfig {
    fn validate(&self) -> KeeperResult<()> {
        if self.base_delay_ms == 0 {
            return Err(invalid("base_delay_ms", "0", "greater than 0"));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(invalid(
                "max_delay_ms",
                &self.max_delay_ms.to_string(),
                &format!("greater than or equal to base_delay_ms ({})", self.base_delay_ms),
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(invalid(
                "backoff_multiplier",
                &self.backoff_multiplier.to_string(),
                "at least 1.0",
            ));
        }
        Ok(())
    }

    /// Calculate delay for retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        if attempt == 0 {
            return self.base_delay_ms;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let exponential_delay = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        if exponential_delay >= self.max_delay_ms as f64 {
            return self.max_delay_ms;
        }
        exponential_delay as u64
    }
}

impl MarketConfig {
    /// `tokens` whole tokens in base units
    pub fn scale(&self, tokens: u64) -> u128 {
        u128::from(tokens) * 10u128.pow(self.decimals)
    }

    pub fn max_swap(&self) -> u128 {
        self.scale(self.max_swap_tokens)
    }

    pub fn max_initial_deposit(&self) -> u128 {
        self.scale(self.max_initial_deposit_tokens)
    }

    fn validate(&self) -> KeeperResult<()> {
        if self.decimals > 24 {
            return Err(invalid("decimals", &self.decimals.to_string(), "at most 24"));
        }
        if self.max_swap() < 1_000 {
            return Err(invalid(
                "max_swap_tokens",
                &self.max_swap_tokens.to_string(),
                "at least 1000 base units",
            ));
        }
        if self.max_time_step == 0 {
            return Err(invalid("max_time_step", "0", "greater than 0"));
        }
        if self.max_initial_deposit_tokens == 0 {
            return Err(invalid("max_initial_deposit_tokens", "0", "greater than 0"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: &str, expected: &str) -> KeeperError {
    KeeperError::InvalidConfig(format!("{} is {}, expected {}", name, value, expected))
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            default_update_interval: 30,
            max_batch_size: 10,
            health_check_every: 100,
            retry: RetryConfig::default(),
            market: MarketConfig::default(),
            vaults: vec![],
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            decimals: 18,
            swaps_per_iteration: 5,
            max_swap_tokens: 10,
            max_time_step: 30,
            max_initial_deposit_tokens: 100,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        let params = StrategyParams::default();
        Self {
            name: "Default Vault".to_string(),
            fee: params.fee,
            tick_spacing: 60,
            initial_tick: 0,
            performance_fee: 100_000, // 10%
            tick_short_duration: params.tick_short_duration,
            max_tick_diff: params.max_tick_diff,
            main_spread: params.main_spread,
            range_spread: params.range_spread,
            min_rebalance_interval: 300,
            max_staleness: 86_400,
            drift_threshold_ticks: 600,
            priority: 1,
            enabled: true,
        }
    }
}

/// Configuration with two vaults on different fee tiers
pub fn example_config() -> KeeperConfig {
    KeeperConfig {
        default_update_interval: 10,
        max_batch_size: 5,
        vaults: vec![
            VaultConfig {
                name: "TOKEN0/TOKEN1 0.3%".to_string(),
                priority: 10,
                ..VaultConfig::default()
            },
            VaultConfig {
                name: "TOKEN0/TOKEN1 0.05%".to_string(),
                fee: 500,
                tick_spacing: 10,
                initial_tick: -2_000,
                main_spread: 600,
                range_spread: 300,
                max_tick_diff: 60,
                drift_threshold_ticks: 200,
                priority: 8,
                ..VaultConfig::default()
            },
        ],
        ..KeeperConfig::default()
    }
}

/// Create example configuration file
pub fn create_example_config(path: impl AsRef<Path>) -> KeeperResult<()> {
    example_config().save(path)
}
