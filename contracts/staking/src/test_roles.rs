extern crate std;

use common::roles::Role;
use soroban_sdk::{
    testutils::Address as _,
    token::StellarAssetClient,
    Address, Env,
};

use crate::{ContractError, RewardAsset, StakingContract, StakingContractClient, FACTOR_DENOMINATOR};

const HOUR: u64 = 60 * 60;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn setup() -> (Env, StakingContractClient<'static>, Address, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let stake_token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();
    let native_token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();

    let contract_id = env.register(StakingContract, ());
    let client = StakingContractClient::new(&env, &contract_id);

    let admin = Address::generate(&env);
    client.initialize(&admin, &stake_token, &native_token);
    client.set_lockup_factor(&admin, &HOUR, &FACTOR_DENOMINATOR);

    // One staker so instant rewards have shares to land on.
    let staker = Address::generate(&env);
    StellarAssetClient::new(&env, &stake_token).mint(&staker, &1_000);
    client.stake(&staker, &HOUR, &1_000);

    (env, client, admin, stake_token)
}

fn funded_account(env: &Env, token: &Address) -> Address {
    let account = Address::generate(env);
    StellarAssetClient::new(env, token).mint(&account, &1_000_000);
    account
}

// ── Initializer holds every role ─────────────────────────────────────────────

#[test]
fn test_admin_holds_all_roles_after_init() {
    let (env, client, admin, _) = setup();

    for role in Role::ALL {
        assert!(client.has_role(&role, &admin));
        assert_eq!(client.get_role_members(&role).len(), 1);
    }
    let outsider = Address::generate(&env);
    assert!(!client.has_role(&Role::Admin, &outsider));
}

// ── Granting ─────────────────────────────────────────────────────────────────

#[test]
fn test_granted_rewarder_can_fund() {
    let (env, client, admin, stake_token) = setup();
    let rewarder = funded_account(&env, &stake_token);

    client.grant_role(&admin, &Role::Rewarder, &rewarder);
    assert!(client.has_role(&Role::Rewarder, &rewarder));

    client.add_reward(&rewarder, &RewardAsset::Token(stake_token.clone()), &500, &0);
    assert_eq!(
        client.get_reward_reserve(&RewardAsset::Token(stake_token)),
        500
    );
}

#[test]
fn test_granted_lockup_manager_can_set_factor() {
    let (env, client, admin, _) = setup();
    let manager = Address::generate(&env);

    client.grant_role(&admin, &Role::LockupManager, &manager);
    client.set_lockup_factor(&manager, &(24 * HOUR), &(2 * FACTOR_DENOMINATOR));

    assert_eq!(client.get_lockup(&(24 * HOUR)).factor, 2 * FACTOR_DENOMINATOR);
}

#[test]
fn test_grant_twice_keeps_single_membership() {
    let (env, client, admin, _) = setup();
    let target = Address::generate(&env);

    client.grant_role(&admin, &Role::Rewarder, &target);
    client.grant_role(&admin, &Role::Rewarder, &target);

    assert_eq!(client.get_role_members(&Role::Rewarder).len(), 2);
}

#[test]
fn test_lockup_manager_cannot_fund() {
    let (env, client, admin, stake_token) = setup();
    let manager = funded_account(&env, &stake_token);

    client.grant_role(&admin, &Role::LockupManager, &manager);

    let result = client.try_add_reward(&manager, &RewardAsset::Token(stake_token), &500, &0);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
}

#[test]
fn test_non_admin_cannot_grant() {
    let (env, client, _admin, _) = setup();
    let intruder = Address::generate(&env);

    let result = client.try_grant_role(&intruder, &Role::Admin, &intruder);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
}

// ── Revoking ─────────────────────────────────────────────────────────────────

#[test]
fn test_revoked_rewarder_cannot_fund() {
    let (env, client, admin, stake_token) = setup();
    let rewarder = funded_account(&env, &stake_token);

    client.grant_role(&admin, &Role::Rewarder, &rewarder);
    client.revoke_role(&admin, &Role::Rewarder, &rewarder);
    assert!(!client.has_role(&Role::Rewarder, &rewarder));
    assert_eq!(client.get_role_members(&Role::Rewarder).len(), 1);

    let result = client.try_add_reward(&rewarder, &RewardAsset::Token(stake_token), &500, &0);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
}

#[test]
fn test_non_admin_cannot_revoke() {
    let (env, client, admin, _) = setup();
    let intruder = Address::generate(&env);

    let result = client.try_revoke_role(&intruder, &Role::Admin, &admin);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
    assert!(client.has_role(&Role::Admin, &admin));
}

// ── Renouncing ───────────────────────────────────────────────────────────────

#[test]
fn test_renounce_drops_role() {
    let (_env, client, admin, _) = setup();

    client.renounce_role(&admin, &Role::LockupManager);
    assert!(!client.has_role(&Role::LockupManager, &admin));

    let result = client.try_set_lockup_factor(&admin, &HOUR, &1);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
}

#[test]
fn test_renounced_admin_cannot_grant() {
    let (env, client, admin, _) = setup();
    let target = Address::generate(&env);

    client.renounce_role(&admin, &Role::Admin);

    let result = client.try_grant_role(&admin, &Role::Rewarder, &target);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
}
