use std::collections::HashMap;
use std::time::Duration;

use lixir_core::RebalanceReport;
use serde::Serialize;

use crate::backend::{VaultBackend, VaultStatus};
use crate::config::{KeeperConfig, VaultConfig};
use crate::error::{KeeperError, KeeperResult};

/// Why a vault is due for a rebalance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RebalanceReason {
    /// The pool tick left the main position
    OutOfRange,
    /// The pool tick drifted this far from the main position's centre
    Drift { ticks: i64 },
    /// No rebalance for this many seconds
    Stale { seconds: u64 },
}

/// Counters over the keeper's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeeperStats {
    pub iterations: u64,
    pub rebalances: u64,
    pub dry_runs: u64,
    pub failures: u64,
    pub retries: u64,
}

/// Keeper state and every vault's status, as reported on shutdown
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub stats: KeeperStats,
    pub vaults: Vec<VaultStatus>,
}

/// Decide whether `status` warrants a rebalance.
///
/// Paused and empty vaults are never rebalanced, nor is a vault whose pool tick
/// is further from the GWAP than the strategy tolerates: that rebalance would be
/// rejected as manipulation.
pub fn rebalance_reason(
    config: &VaultConfig,
    status: &VaultStatus,
    last_rebalance: u64,
) -> Option<RebalanceReason> {
    if status.paused || status.total_supply == 0 {
        return None;
    }
    let elapsed = status.timestamp.saturating_sub(last_rebalance);
    if elapsed < config.min_rebalance_interval {
        return None;
    }
    let gwap_tick = status.gwap_tick?;
    if (i64::from(status.tick) - i64::from(gwap_tick)).abs() > i64::from(status.max_tick_diff) {
        log::debug!(
            "Vault {} tick {} is {} from GWAP {}, waiting",
            status.name,
            status.tick,
            i64::from(status.tick) - i64::from(gwap_tick),
            gwap_tick
        );
        return None;
    }

    if !status.main.contains(status.tick) {
        return Some(RebalanceReason::OutOfRange);
    }
    let centre = (i64::from(status.main.tick_lower) + i64::from(status.main.tick_upper)) / 2;
    let drift = (i64::from(status.tick) - centre).abs();
    if drift >= i64::from(config.drift_threshold_ticks) {
        return Some(RebalanceReason::Drift { ticks: drift });
    }
    if elapsed >= config.max_staleness {
        return Some(RebalanceReason::Stale { seconds: elapsed });
    }
    None
}

/// Main keeper service that watches vaults and triggers their rebalances
pub struct Keeper<B: VaultBackend> {
    config: KeeperConfig,
    backend: B,
    /// Last rebalance (or first sighting) per vault, backend clock
    last_rebalances: HashMap<String, u64>,
    stats: KeeperStats,
    dry_run: bool,
}

impl<B: VaultBackend> Keeper<B> {
    /// Create a new keeper instance. Every enabled vault must be known to `backend`.
    pub fn new(config: KeeperConfig, backend: B, dry_run: bool) -> KeeperResult<Self> {
        config.validate()?;
        let mut last_rebalances = HashMap::new();
        for vault in config.enabled_vaults() {
            let status = backend.status(&vault.name)?;
            last_rebalances.insert(vault.name.clone(), status.timestamp);
        }
        log::info!(
            "Keeper watching {} vaults{}",
            last_rebalances.len(),
            if dry_run { " (dry run)" } else { "" }
        );
        Ok(Self {
            config,
            backend,
            last_rebalances,
            stats: KeeperStats::default(),
            dry_run,
        })
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn stats(&self) -> &KeeperStats {
        &self.stats
    }

    /// Check every enabled vault once, rebalancing at most `max_batch_size` of them.
    /// Returns the number of vaults rebalanced (or that would have been, in a dry run).
    pub async fn run_iteration(&mut self) -> KeeperResult<usize> {
        self.stats.iterations += 1;
        let mut updates = 0;

        // Clone vault configs to avoid borrowing self across the awaits
        let vaults: Vec<VaultConfig> = self.config.enabled_vaults().into_iter().cloned().collect();
        for vault in &vaults {
            if updates >= self.config.max_batch_size {
                log::debug!("Batch limit {} reached", self.config.max_batch_size);
                break;
            }
            match self.update_vault(vault).await {
                Ok(true) => updates += 1,
                Ok(false) => {}
                Err(e) => {
                    self.stats.failures += 1;
                    log::error!("Failed to update vault {}: {}", vault.name, e);
                }
            }
        }
        Ok(updates)
    }

    /// Rebalance `vault` if it needs it
    pub async fn update_vault(&mut self, vault: &VaultConfig) -> KeeperResult<bool> {
        let status = self.backend.status(&vault.name)?;
        let last = self
            .last_rebalances
            .get(&vault.name)
            .copied()
            .unwrap_or(status.timestamp);
        let Some(reason) = rebalance_reason(vault, &status, last) else {
            log::debug!("Vault {} at tick {} needs no rebalance", vault.name, status.tick);
            return Ok(false);
        };

        log::info!("Rebalancing vault {}: {:?}", vault.name, reason);
        if self.dry_run {
            log::info!("DRY RUN: Would rebalance vault {}", vault.name);
            self.stats.dry_runs += 1;
            return Ok(true);
        }

        let report = self.rebalance_with_retry(&vault.name).await?;
        log::info!(
            "Rebalanced vault {}: main {} range {} fee shares {}",
            vault.name,
            report.main,
            report.range,
            report.fee_shares
        );
        let now = self.backend.status(&vault.name)?.timestamp;
        self.last_rebalances.insert(vault.name.clone(), now);
        self.stats.rebalances += 1;
        Ok(true)
    }

    /// Rebalance, retrying transient failures with exponential backoff
    async fn rebalance_with_retry(&mut self, vault: &str) -> KeeperResult<RebalanceReport> {
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0;
        loop {
            match self.backend.rebalance(vault) {
                Ok(report) => return Ok(report),
                Err(KeeperError::Vault(err)) if err.is_transient() => {
                    if attempt >= max_retries {
                        return Err(KeeperError::RetriesExhausted {
                            vault: vault.to_string(),
                            attempts: attempt + 1,
                            last: err,
                        });
                    }
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    log::warn!(
                        "Rebalance of {} failed ({}), retrying in {}ms",
                        vault,
                        err,
                        delay
                    );
                    self.stats.retries += 1;
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Health check for keeper service
    pub fn health_check(&self) -> KeeperResult<()> {
        self.backend.health()?;
        for vault in self.config.enabled_vaults() {
            let status = self.backend.status(&vault.name)?;
            if status.paused {
                return Err(KeeperError::Unhealthy(format!("vault {} is paused", vault.name)));
            }
        }
        log::debug!("Health check passed - {} failures so far", self.stats.failures);
        Ok(())
    }

    /// Current counters plus the status of every enabled vault
    pub fn status_report(&self) -> KeeperResult<StatusReport> {
        let vaults = self
            .config
            .enabled_vaults()
            .into_iter()
            .map(|vault| self.backend.status(&vault.name))
            .collect::<KeeperResult<Vec<_>>>()?;
        Ok(StatusReport {
            stats: self.stats.clone(),
            vaults,
        })
    }
}
