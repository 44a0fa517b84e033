//! Keeper loop against simulated vaults

use lixir_core::Pool;
use lixir_keeper::config::example_config;
use lixir_keeper::{Keeper, KeeperConfig, SimulatedBackend, VaultBackend, VaultConfig};

const VAULT: &str = "TOKEN0/TOKEN1 0.3%";

fn single_vault_config() -> KeeperConfig {
    KeeperConfig {
        vaults: vec![VaultConfig {
            name: VAULT.to_string(),
            min_rebalance_interval: 60,
            max_staleness: 86_400,
            ..VaultConfig::default()
        }],
        ..example_config()
    }
}

#[tokio::test]
async fn test_out_of_range_vault_is_rebalanced() {
    let config = single_vault_config();
    let backend = SimulatedBackend::new(&config).unwrap();
    let mut keeper = Keeper::new(config, backend, false).unwrap();

    // Quiet market: nothing to do
    assert_eq!(keeper.run_iteration().await.unwrap(), 0);

    let env = keeper.backend_mut().environment_mut(VAULT).unwrap();
    env.move_price_to(3_000).unwrap();
    // The GWAP still lags the move
    assert_eq!(keeper.run_iteration().await.unwrap(), 0);

    let env = keeper.backend_mut().environment_mut(VAULT).unwrap();
    env.settle_gwap();
    assert_eq!(keeper.run_iteration().await.unwrap(), 1);
    assert_eq!(keeper.stats().rebalances, 1);

    let status = keeper.backend().status(VAULT).unwrap();
    assert!(status.main.contains(status.tick));
    assert!(status.range.is_set());
}

#[tokio::test]
async fn test_dry_run_leaves_vault_untouched() {
    let config = single_vault_config();
    let backend = SimulatedBackend::new(&config).unwrap();
    let mut keeper = Keeper::new(config, backend, true).unwrap();

    let env = keeper.backend_mut().environment_mut(VAULT).unwrap();
    let main = env.vault.main_position();
    env.move_price_to(3_000).unwrap();
    env.settle_gwap();

    assert_eq!(keeper.run_iteration().await.unwrap(), 1);
    assert_eq!(keeper.stats().dry_runs, 1);
    let env = keeper.backend().environment(VAULT).unwrap();
    assert_eq!(env.vault.main_position(), main);
    assert!(env.pool.slot0().tick > main.tick_upper);
}

#[tokio::test]
async fn test_random_market_loop_produces_status_report() {
    let config = example_config();
    let backend = SimulatedBackend::new(&config).unwrap();
    let mut keeper = Keeper::new(config, backend, false).unwrap();

    for _ in 0..20 {
        keeper.backend_mut().advance_market(5).unwrap();
        keeper.run_iteration().await.unwrap();
    }
    keeper.health_check().unwrap();

    let report = keeper.status_report().unwrap();
    assert_eq!(report.stats.iterations, 20);
    assert_eq!(report.vaults.len(), 2);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"iterations\":20"));
}
