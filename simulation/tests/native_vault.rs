//! Vaults paired with the wrapped native token

use lixir_core::{
    NativeCurrency, NativeDepositParams, Pool, TokenCustody, VaultError, WithdrawParams,
};
use lixir_simulation::{EnvironmentConfig, TestEnvironment};

const E18: u128 = 1_000_000_000_000_000_000;

fn native_env() -> TestEnvironment {
    TestEnvironment::new(EnvironmentConfig {
        native: true,
        ..EnvironmentConfig::default()
    })
    .unwrap()
}

fn native_deposit(
    env: &TestEnvironment,
    user: lixir_core::Address,
    native: u128,
    token: u128,
) -> NativeDepositParams {
    NativeDepositParams {
        native_desired: native,
        token_desired: token,
        native_min: 0,
        token_min: 0,
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
fn test_native_side_is_token1() {
    let env = native_env();
    assert_eq!(env.vault.token1(), env.pool.wrapped_native());
    assert!(!env.vault.native_is_token0(&env.pool).unwrap());

    let plain = TestEnvironment::with_defaults().unwrap();
    assert_eq!(plain.vault.native_is_token0(&plain.pool), Err(VaultError::NativeUnsupported));
}

#[test]
fn test_deposit_native_wraps_only_what_is_used() {
    let mut env = native_env();
    let (alice, bob) = (env.user(0), env.user(1));
    env.deposit(alice, 100 * E18, 100 * E18).unwrap();

    let wrapped = env.pool.wrapped_native();
    let native_before = env.pool.native_balance(bob);
    let wrapped_before = env.pool.balance_of(wrapped, bob);

    let params = native_deposit(&env, bob, 50 * E18, 10 * E18);
    let receipt = env.vault.deposit_native(&mut env.pool, bob, params).unwrap();
    assert!(receipt.amount1 <= 10 * E18 + 1_000);
    assert!(receipt.amount1 < 50 * E18);
    assert_eq!(env.pool.native_balance(bob), native_before - receipt.amount1);
    // Wrapped balance is untouched: the native side came from native currency
    assert_eq!(env.pool.balance_of(wrapped, bob), wrapped_before);
    assert_eq!(env.vault.balance_of(bob), receipt.shares);
}

#[test]
fn test_deposit_native_requires_balance() {
    let mut env = native_env();
    let alice = env.user(0);
    let params = native_deposit(&env, alice, env.config.user_balance + 1, E18);
    assert_eq!(
        env.vault.deposit_native(&mut env.pool, alice, params),
        Err(VaultError::InsufficientBalance)
    );
}

#[test]
fn test_withdraw_native_pays_native_currency() {
    let mut env = native_env();
    let alice = env.user(0);
    let params = native_deposit(&env, alice, 20 * E18, 20 * E18);
    let deposited = env.vault.deposit_native(&mut env.pool, alice, params).unwrap();

    let wrapped = env.pool.wrapped_native();
    let token0 = env.pool.token0();
    let native_before = env.pool.native_balance(alice);
    let wrapped_before = env.pool.balance_of(wrapped, alice);
    let token0_before = env.pool.balance_of(token0, alice);

    let params = withdraw_params(&env, alice, deposited.shares);
    let receipt = env.vault.withdraw_native(&mut env.pool, alice, params).unwrap();
    assert_eq!(env.pool.native_balance(alice), native_before + receipt.amount1);
    assert_eq!(env.pool.balance_of(wrapped, alice), wrapped_before);
    assert_eq!(env.pool.balance_of(token0, alice), token0_before + receipt.amount0);
    assert!(deposited.amount1 - receipt.amount1 <= 1_000);
}

#[test]
fn test_withdraw_native_from_spends_allowance() {
    let mut env = native_env();
    let (alice, operator) = (env.user(0), env.user(1));
    let shares = env.deposit(alice, 10 * E18, 10 * E18).unwrap().shares;

    let params = withdraw_params(&env, operator, shares);
    assert_eq!(
        env.vault.withdraw_native_from(&mut env.pool, operator, alice, params),
        Err(VaultError::AllowanceExceeded)
    );

    env.vault.approve(alice, operator, u128::MAX);
    let native_before = env.pool.native_balance(operator);
    let receipt = env
        .vault
        .withdraw_native_from(&mut env.pool, operator, alice, params)
        .unwrap();
    assert_eq!(env.pool.native_balance(operator), native_before + receipt.amount1);
    assert_eq!(env.vault.balance_of(alice), 0);
    // Infinite allowances are not spent
    assert_eq!(env.vault.allowance(alice, operator), u128::MAX);
}
