use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::time;

use lixir_keeper::config::create_example_config;
use lixir_keeper::{Keeper, KeeperConfig, SimulatedBackend};

#[derive(Parser, Debug)]
#[command(name = "lixir-keeper")]
#[command(about = "Lixir vault rebalance keeper")]
struct Args {
    /// Path to keeper configuration file
    #[arg(short, long, default_value = "keeper.toml")]
    config: PathBuf,

    /// Update interval in seconds, overriding the configuration
    #[arg(short, long)]
    interval: Option<u64>,

    /// Stop after this many iterations
    #[arg(short = 'n', long)]
    iterations: Option<u64>,

    /// Dry run mode - decide but don't submit rebalances
    #[arg(long)]
    dry_run: bool,

    /// Write an example configuration to the config path and exit
    #[arg(long)]
    init: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if args.init {
        create_example_config(&args.config)?;
        log::info!("Wrote example configuration to {}", args.config.display());
        return Ok(());
    }

    log::info!("Starting Lixir Keeper");
    let config = KeeperConfig::load(&args.config)?;
    log::info!("Loaded configuration for {} vaults", config.vaults.len());

    let interval = args.interval.unwrap_or(config.default_update_interval);
    if interval == 0 {
        anyhow::bail!("update interval must be greater than 0");
    }
    log::info!("Update interval: {}s", interval);
    if args.dry_run {
        log::warn!("Running in DRY RUN mode - no rebalances will be submitted");
    }

    let swaps_per_iteration = config.market.swaps_per_iteration;
    let health_check_every = config.health_check_every;
    let backend = SimulatedBackend::new(&config)?;
    let mut keeper = Keeper::new(config, backend, args.dry_run)?;
    log::info!("Keeper initialized successfully");

    let mut interval_timer = time::interval(Duration::from_secs(interval));
    let mut iteration = 0u64;

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, shutting down");
                break;
            }
        }
        iteration += 1;
        log::debug!("Starting keeper iteration {}", iteration);

        if let Err(e) = keeper.backend_mut().advance_market(swaps_per_iteration) {
            log::error!("Market simulation failed in iteration {}: {}", iteration, e);
        }

        match keeper.run_iteration().await {
            Ok(updates) if updates > 0 => {
                log::info!("Iteration {}: Rebalanced {} vaults", iteration, updates);
            }
            Ok(_) => log::debug!("Iteration {}: No vaults needed a rebalance", iteration),
            Err(e) => {
                // Continue running even if individual iterations fail
                log::error!("Error in keeper iteration {}: {}", iteration, e);
            }
        }

        if iteration % health_check_every == 0 {
            log::info!("Keeper health check - iteration {}", iteration);
            if let Err(e) = keeper.health_check() {
                log::warn!("Health check warning: {}", e);
            }
        }

        if args.iterations == Some(iteration) {
            break;
        }
    }

    let report = keeper.status_report()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
