#![allow(deprecated)] // events().publish migration tracked separately

use common::Role;
use soroban_sdk::{symbol_short, Address, Env};

use crate::accumulator::{RewardAsset, StreamDelivery};

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired once when the contract is bootstrapped.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub stake_token: Address,
    pub native_token: Address,
    pub timestamp: u64,
}

/// Fired when a lockup tier's factor is set.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LockupFactorSetEvent {
    pub duration: u64,
    pub old_factor: u32,
    pub new_factor: u32,
    pub total_shares: i128,
    pub timestamp: u64,
}

/// Fired when principal is staked into a lock.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakedEvent {
    pub staker: Address,
    pub duration: u64,
    pub amount: i128,
    pub principal: i128,
    pub total_shares: i128,
    pub timestamp: u64,
}

/// Fired when a lock starts its cooldown.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnstakedEvent {
    pub staker: Address,
    pub duration: u64,
    pub principal: i128,
    pub withdrawable_at: u64,
    pub timestamp: u64,
}

/// Fired when a lock's principal leaves custody.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub staker: Address,
    pub duration: u64,
    pub amount: i128,
    pub timestamp: u64,
}

/// Fired for every nonzero reward transfer to a staker.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardPaidEvent {
    pub staker: Address,
    pub duration: u64,
    pub asset: RewardAsset,
    pub amount: i128,
    pub timestamp: u64,
}

/// Fired when a rewarder funds a pool. `pool_id` is zero for instant funding.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAddedEvent {
    pub rewarder: Address,
    pub asset: RewardAsset,
    pub amount: i128,
    pub duration: u64,
    pub pool_id: u64,
    pub timestamp: u64,
}

/// Fired when a catch-up credits part of a streaming pool.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamedEvent {
    pub pool_id: u64,
    pub asset: RewardAsset,
    pub amount: i128,
    pub completed: bool,
    pub timestamp: u64,
}

/// Fired when an owner's custody vault is opened.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VaultOpenedEvent {
    pub owner: Address,
    pub vault_id: u64,
    pub timestamp: u64,
}

/// Fired when a role is granted or revoked.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleChangedEvent {
    pub role: Role,
    pub account: Address,
    pub sender: Address,
    pub timestamp: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_initialized(env: &Env, admin: Address, stake_token: Address, native_token: Address) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            stake_token,
            native_token,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_factor_set(
    env: &Env,
    duration: u64,
    old_factor: u32,
    new_factor: u32,
    total_shares: i128,
) {
    env.events().publish(
        (symbol_short!("FACTOR"), duration),
        LockupFactorSetEvent {
            duration,
            old_factor,
            new_factor,
            total_shares,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_staked(
    env: &Env,
    staker: Address,
    duration: u64,
    amount: i128,
    principal: i128,
    total_shares: i128,
) {
    env.events().publish(
        (symbol_short!("STAKED"), staker.clone()),
        StakedEvent {
            staker,
            duration,
            amount,
            principal,
            total_shares,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_unstaked(
    env: &Env,
    staker: Address,
    duration: u64,
    principal: i128,
    withdrawable_at: u64,
) {
    env.events().publish(
        (symbol_short!("UNSTAKED"), staker.clone()),
        UnstakedEvent {
            staker,
            duration,
            principal,
            withdrawable_at,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_withdrawn(env: &Env, staker: Address, duration: u64, amount: i128) {
    env.events().publish(
        (symbol_short!("WITHDRAWN"), staker.clone()),
        WithdrawnEvent {
            staker,
            duration,
            amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_reward_paid(
    env: &Env,
    staker: Address,
    duration: u64,
    asset: RewardAsset,
    amount: i128,
) {
    env.events().publish(
        (symbol_short!("RWD_PAID"), staker.clone()),
        RewardPaidEvent {
            staker,
            duration,
            asset,
            amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_reward_added(
    env: &Env,
    rewarder: Address,
    asset: RewardAsset,
    amount: i128,
    duration: u64,
    pool_id: u64,
) {
    env.events().publish(
        (symbol_short!("RWD_ADDED"), rewarder.clone()),
        RewardAddedEvent {
            rewarder,
            asset,
            amount,
            duration,
            pool_id,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_streamed(env: &Env, delivery: StreamDelivery) {
    env.events().publish(
        (symbol_short!("STREAMED"), delivery.pool_id),
        StreamedEvent {
            pool_id: delivery.pool_id,
            asset: delivery.asset,
            amount: delivery.amount,
            completed: delivery.completed,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_vault_opened(env: &Env, owner: Address, vault_id: u64) {
    env.events().publish(
        (symbol_short!("VAULT"), owner.clone()),
        VaultOpenedEvent {
            owner,
            vault_id,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_role_granted(env: &Env, role: Role, account: Address, sender: Address) {
    env.events().publish(
        (symbol_short!("ROLE_GRT"), account.clone()),
        RoleChangedEvent {
            role,
            account,
            sender,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_role_revoked(env: &Env, role: Role, account: Address, sender: Address) {
    env.events().publish(
        (symbol_short!("ROLE_RVK"), account.clone()),
        RoleChangedEvent {
            role,
            account,
            sender,
            timestamp: env.ledger().timestamp(),
        },
    );
}
