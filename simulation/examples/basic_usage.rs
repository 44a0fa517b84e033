/// Basic usage example for the Lixir simulation framework
///
/// This example demonstrates:
/// - Creating a test environment with a configured vault
/// - Depositing from several users
/// - Moving the market and rebalancing
/// - Withdrawing and comparing against what was deposited
use lixir_core::Pool;
use lixir_simulation::{ScenarioConfig, ScenarioRunner, SimulationResult, TestEnvironment};

fn main() -> SimulationResult<()> {
    env_logger::init();

    println!("Lixir Vault Simulation - Basic Usage");
    println!("====================================\n");

    // Step 1: Create the environment
    println!("1. Creating test environment...");
    let mut env = TestEnvironment::with_defaults()?;
    println!("   - Vault: {}", env.vault.address());
    println!("   - Main position: {}", env.vault.main_position());
    println!("   - Pool tick: {}\n", env.pool.slot0().tick);

    // Step 2: Deposits
    println!("2. Depositing...");
    let alice = env.user(0);
    let bob = env.user(1);
    let receipt = env.deposit(alice, 10u128.pow(20), 10u128.pow(20))?;
    println!(
        "   - Alice: {} shares for ({}, {})",
        receipt.shares, receipt.amount0, receipt.amount1
    );
    let receipt = env.deposit(bob, 5 * 10u128.pow(19), 10u128.pow(20))?;
    println!(
        "   - Bob: {} shares for ({}, {})\n",
        receipt.shares, receipt.amount0, receipt.amount1
    );

    // Step 3: Move the market out of the main position and rebalance
    println!("3. Moving price to tick 3000 and rebalancing...");
    env.move_price_to(3000)?;
    env.settle_gwap();
    let report = env.rebalance()?;
    println!("   - GWAP tick: {}", report.gwap_tick);
    println!("   - Main: {} ({} liquidity)", report.main, report.main_liquidity);
    println!("   - Range: {} ({} liquidity)\n", report.range, report.range_liquidity);

    // Step 4: Random order flow
    println!("4. Running 50 random steps...");
    let mut runner = ScenarioRunner::new(env, ScenarioConfig::default());
    let summary = runner.run(50)?;
    println!("   - {:?}\n", summary);

    // Step 5: Withdraw everything
    println!("5. Withdrawing...");
    let mut env = runner.env;
    for user in [alice, bob] {
        if env.vault.balance_of(user) > 0 {
            let out = env.withdraw_all(user)?;
            println!("   - {}: ({}, {})", user, out.amount0, out.amount1);
        }
    }
    println!("\nSimulation completed successfully!");
    Ok(())
}
