//! Deposit and withdrawal flows against a fully wired environment

use lixir_core::{DepositParams, Pool, TokenCustody, VaultError, WithdrawParams};
use lixir_simulation::TestEnvironment;
use proptest::prelude::*;

const E18: u128 = 1_000_000_000_000_000_000;

fn deposit_params(
    env: &TestEnvironment,
    user: lixir_core::Address,
    amount0: u128,
    amount1: u128,
) -> DepositParams {
    DepositParams {
        amount0_desired: amount0,
        amount1_desired: amount1,
        amount0_min: 0,
        amount1_min: 0,
        recipient: user,
        deadline: env.now(),
    }
}

fn withdraw_params(
    env: &TestEnvironment,
    user: lixir_core::Address,
    shares: u128,
) -> WithdrawParams {
    WithdrawParams {
        shares,
        amount0_min: 0,
        amount1_min: 0,
        recipient: user,
        deadline: env.now(),
    }
}

#[test]
fn test_bootstrap_deposit_mints_max_amount() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let alice = env.user(0);

    let receipt = env.deposit(alice, 100 * E18, 60 * E18).unwrap();
    assert_eq!(receipt.shares, 100 * E18);
    assert_eq!((receipt.amount0, receipt.amount1), (100 * E18, 60 * E18));
    assert_eq!(env.vault.balance_of(alice), receipt.shares);
    assert!(env.vault.main_liquidity(&env.pool) > 0);

    let totals = env.vault.calculate_totals(&env.pool).unwrap();
    assert!(totals.total0 <= 100 * E18 && totals.total0 + 10 >= 100 * E18);
    assert!(totals.total1 <= 60 * E18 && totals.total1 + 10 >= 60 * E18);
}

#[test]
fn test_instant_round_trip_never_profits() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let (alice, bob) = (env.user(0), env.user(1));
    env.deposit(alice, 100 * E18, 100 * E18).unwrap();

    let amounts = [(E18, E18), (3 * E18, E18 / 7), (12_345, 67_890), (50 * E18, 50 * E18)];
    for (amount0, amount1) in amounts {
        let deposited = env.deposit(bob, amount0, amount1).unwrap();
        assert!(deposited.amount0 <= amount0 && deposited.amount1 <= amount1);

        let withdrawn = env.withdraw(bob, deposited.shares).unwrap();
        assert!(withdrawn.amount0 <= deposited.amount0);
        assert!(withdrawn.amount1 <= deposited.amount1);
        assert!(deposited.amount0 - withdrawn.amount0 <= 1_000);
        assert!(deposited.amount1 - withdrawn.amount1 <= 1_000);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_out_of_order_withdrawals_return_deposits(
        amounts in prop::collection::vec(
            (1_000_000u128..1_000 * E18, 1_000_000u128..1_000 * E18),
            5,
        ),
        order in Just(vec![0usize, 1, 2, 3, 4]).prop_shuffle(),
    ) {
        let mut env = TestEnvironment::with_defaults().unwrap();
        let mut receipts = Vec::new();
        for (index, (amount0, amount1)) in amounts.iter().enumerate() {
            let user = env.user(index);
            receipts.push((user, env.deposit(user, *amount0, *amount1).unwrap()));
        }

        for index in order {
            let (user, deposited) = receipts[index];
            let withdrawn = env.withdraw_all(user).unwrap();
            prop_assert!(
                withdrawn.amount0.abs_diff(deposited.amount0) <= 1_000,
                "user {} token0: in {} out {}",
                index,
                deposited.amount0,
                withdrawn.amount0
            );
            prop_assert!(
                withdrawn.amount1.abs_diff(deposited.amount1) <= 1_000,
                "user {} token1: in {} out {}",
                index,
                deposited.amount1,
                withdrawn.amount1
            );
        }
        prop_assert_eq!(env.vault.total_supply(), 0);
    }
}

#[test]
fn test_later_depositors_pay_proportionally() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let (alice, bob) = (env.user(0), env.user(1));
    env.deposit(alice, 100 * E18, 50 * E18).unwrap();

    // Token1 is the binding side at a 2:1 vault ratio
    let receipt = env.deposit(bob, 100 * E18, 10 * E18).unwrap();
    assert!(receipt.amount1 <= 10 * E18);
    assert!(receipt.amount0 <= 20 * E18 + 1_000);
    assert!(receipt.amount0 >= 20 * E18 - 1_000_000);
    let expected_shares = 20 * E18;
    assert!(receipt.shares.abs_diff(expected_shares) <= 1_000_000);
}

#[test]
fn test_deposit_from_spends_token_allowances() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let (alice, operator) = (env.user(0), env.user(1));
    let (token0, token1) = (env.pool.token0(), env.pool.token1());
    let params = deposit_params(&env, alice, 10 * E18, 10 * E18);

    let err = env.vault.deposit_from(&mut env.pool, operator, alice, params).unwrap_err();
    assert_eq!(err, VaultError::AllowanceExceeded);

    env.pool.approve(token0, alice, operator, 10 * E18);
    env.pool.approve(token1, alice, operator, 10 * E18);
    let before = env.pool.balance_of(token0, alice);
    let receipt = env.vault.deposit_from(&mut env.pool, operator, alice, params).unwrap();
    assert_eq!(env.pool.balance_of(token0, alice), before - receipt.amount0);
    assert_eq!(env.vault.balance_of(alice), receipt.shares);
    assert_eq!(env.vault.balance_of(operator), 0);
}

#[test]
fn test_withdraw_from_requires_share_allowance() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let (alice, bob) = (env.user(0), env.user(1));
    let shares = env.deposit(alice, 10 * E18, 10 * E18).unwrap().shares;

    let params = withdraw_params(&env, bob, shares / 2);
    let err = env.vault.withdraw_from(&mut env.pool, bob, alice, params).unwrap_err();
    assert_eq!(err, VaultError::AllowanceExceeded);
    assert_eq!(err.to_string(), "ALLOWANCE");

    env.vault.approve(alice, bob, shares);
    let token0 = env.pool.token0();
    let before = env.pool.balance_of(token0, bob);
    let receipt = env.vault.withdraw_from(&mut env.pool, bob, alice, params).unwrap();
    assert_eq!(env.pool.balance_of(token0, bob), before + receipt.amount0);
    assert_eq!(env.vault.allowance(alice, bob), shares - shares / 2);
    assert_eq!(env.vault.balance_of(alice), shares - shares / 2);
}

#[test]
fn test_deposit_slippage_leaves_state_untouched() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let (alice, bob) = (env.user(0), env.user(1));
    env.deposit(alice, 100 * E18, 100 * E18).unwrap();
    let supply = env.vault.total_supply();
    let totals = env.vault.calculate_totals(&env.pool).unwrap();
    let token0 = env.pool.token0();
    let balance = env.pool.balance_of(token0, bob);

    let mut params = deposit_params(&env, bob, 10 * E18, E18);
    params.amount0_min = 5 * E18;
    let err = env.vault.deposit(&mut env.pool, bob, params).unwrap_err();
    assert_eq!(err, VaultError::SlippageExceeded);

    assert_eq!(env.vault.total_supply(), supply);
    assert_eq!(env.vault.calculate_totals(&env.pool).unwrap(), totals);
    assert_eq!(env.pool.balance_of(token0, bob), balance);
}

#[test]
fn test_withdraw_slippage() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let alice = env.user(0);
    let shares = env.deposit(alice, 10 * E18, 10 * E18).unwrap().shares;

    let mut params = withdraw_params(&env, alice, shares);
    params.amount1_min = 11 * E18;
    let err = env.vault.withdraw(&mut env.pool, alice, params).unwrap_err();
    assert_eq!(err, VaultError::SlippageExceeded);
    assert_eq!(env.vault.balance_of(alice), shares);
    assert!(env.vault.main_liquidity(&env.pool) > 0);
}

#[test]
fn test_expired_deadline() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let alice = env.user(0);
    env.deposit(alice, E18, E18).unwrap();

    let mut params = deposit_params(&env, alice, E18, E18);
    params.deadline = env.now() - 1;
    assert!(matches!(
        env.vault.deposit(&mut env.pool, alice, params),
        Err(VaultError::DeadlineExpired { .. })
    ));

    let mut params = withdraw_params(&env, alice, 1);
    params.deadline = env.now() - 1;
    assert!(matches!(
        env.vault.withdraw(&mut env.pool, alice, params),
        Err(VaultError::DeadlineExpired { .. })
    ));
}

#[test]
fn test_withdraw_validation() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let alice = env.user(0);
    let shares = env.deposit(alice, E18, E18).unwrap().shares;

    assert_eq!(env.withdraw(alice, 0), Err(VaultError::InvalidAmount));
    assert_eq!(env.withdraw(alice, shares + 1), Err(VaultError::InsufficientShares));
    assert_eq!(env.withdraw(env.user(1), 1), Err(VaultError::InsufficientShares));
}

#[test]
fn test_max_supply_cap() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let alice = env.user(0);
    let strategist = env.accounts.strategist;

    assert!(env
        .vault
        .set_max_supply(&env.registry, alice, 10 * E18)
        .unwrap_err()
        .is_authorization());
    env.vault.set_max_supply(&env.registry, strategist, 10 * E18).unwrap();

    env.deposit(alice, 6 * E18, 6 * E18).unwrap();
    assert_eq!(env.deposit(alice, 6 * E18, 6 * E18), Err(VaultError::MaxSupplyExceeded));
    env.deposit(alice, 3 * E18, 3 * E18).unwrap();
    assert!(env.vault.total_supply() <= 10 * E18);
}

#[test]
fn test_share_transfers_carry_withdrawal_rights() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let (alice, bob) = (env.user(0), env.user(1));
    let shares = env.deposit(alice, 10 * E18, 10 * E18).unwrap().shares;

    env.vault.transfer(alice, bob, shares).unwrap();
    assert_eq!(env.withdraw(alice, 1), Err(VaultError::InsufficientShares));
    let receipt = env.withdraw_all(bob).unwrap();
    assert!(receipt.amount0 + 1_000 >= 10 * E18);
    assert_eq!(env.vault.total_supply(), 0);
}

#[test]
fn test_pause_blocks_deposits_not_withdrawals() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let alice = env.user(0);
    let pauser = env.accounts.pauser;
    let shares = env.deposit(alice, 10 * E18, 10 * E18).unwrap().shares;

    assert!(env.vault.pause(&env.registry, alice).unwrap_err().is_authorization());
    env.vault.pause(&env.registry, pauser).unwrap();
    assert_eq!(env.vault.pause(&env.registry, pauser), Err(VaultError::Paused));
    assert_eq!(env.deposit(alice, E18, E18), Err(VaultError::Paused));

    env.withdraw(alice, shares / 2).unwrap();

    env.vault.unpause(&env.registry, pauser).unwrap();
    assert_eq!(env.vault.unpause(&env.registry, pauser), Err(VaultError::NotPaused));
    env.deposit(alice, E18, E18).unwrap();
}

#[test]
fn test_deposit_with_price_outside_main_position() {
    let mut env = TestEnvironment::with_defaults().unwrap();
    let (alice, bob) = (env.user(0), env.user(1));
    env.deposit(alice, 10 * E18, 10 * E18).unwrap();
    env.move_price_to(2400).unwrap();
    assert!(env.pool.slot0().tick > 1800);

    // The main position now holds token1 only, so deposits take token1 only
    let receipt = env.deposit(bob, 5 * E18, 5 * E18).unwrap();
    assert!(receipt.shares > 0);
    let totals = env.vault.calculate_totals(&env.pool).unwrap();
    assert!(receipt.amount0 <= totals.total0);

    let withdrawn = env.withdraw_all(bob).unwrap();
    assert!(withdrawn.amount0 <= receipt.amount0);
    assert!(withdrawn.amount1 <= receipt.amount1);
}
