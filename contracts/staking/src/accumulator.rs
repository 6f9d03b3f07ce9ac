//! Per-asset reward accumulators and streaming reward pools.
//!
//! Instant funding moves an asset's accumulator immediately. Streaming
//! funding queues a pool that vests linearly; nothing runs on a timer, so
//! every entry point that reads or changes shares first calls [`catch_up`],
//! which credits whatever each pool has vested since it was last touched.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Map, Symbol, Vec};

use crate::events;
use crate::rewards;
use crate::ContractError;

const ASSETS: Symbol = symbol_short!("RWD_ASST");
const ACCUMULATORS: Symbol = symbol_short!("RPS");
const RESERVES: Symbol = symbol_short!("RWD_RSV");
const POOLS: Symbol = symbol_short!("STRM");
const POOL_CTR: Symbol = symbol_short!("STRM_CTR");

/// Identity of a reward asset.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RewardAsset {
    /// The network's native currency, resolved to the native token contract
    /// configured at initialization.
    Native,
    /// Any other SEP-41 token contract.
    Token(Address),
}

/// An amount of one reward asset, as reported by claims and previews.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAmount {
    pub asset: RewardAsset,
    pub amount: i128,
}

/// A reward released linearly over `duration` seconds from `start_time`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamingPool {
    pub id: u64,
    pub asset: RewardAsset,
    pub total_amount: i128,
    /// Portion already credited to the accumulator. Never exceeds
    /// `total_amount`; the pool is dropped once the two are equal.
    pub distributed_amount: i128,
    pub duration: u64,
    pub start_time: u64,
}

/// Amount one pool credited during a catch-up.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamDelivery {
    pub pool_id: u64,
    pub asset: RewardAsset,
    pub amount: i128,
    pub completed: bool,
}

/// Accumulator and pool state as of a given instant, not yet persisted.
pub struct CatchUp {
    pub accumulators: Map<RewardAsset, i128>,
    pub pools: Vec<StreamingPool>,
    pub deliveries: Vec<StreamDelivery>,
}

// ── Reads ───────────────────────────────────────────────────────────────────

/// Registered reward assets, in order of first funding.
pub fn assets(env: &Env) -> Vec<RewardAsset> {
    env.storage().instance().get(&ASSETS).unwrap_or(Vec::new(env))
}

/// Stored accumulators, without any pending streaming catch-up.
pub fn accumulators(env: &Env) -> Map<RewardAsset, i128> {
    env.storage()
        .instance()
        .get(&ACCUMULATORS)
        .unwrap_or(Map::new(env))
}

pub fn accumulator(env: &Env, asset: &RewardAsset) -> i128 {
    accumulators(env).get(asset.clone()).unwrap_or(0)
}

pub fn pools(env: &Env) -> Vec<StreamingPool> {
    env.storage().instance().get(&POOLS).unwrap_or(Vec::new(env))
}

/// Funded-but-unpaid balance of `asset` held for stakers.
pub fn reserve(env: &Env, asset: &RewardAsset) -> i128 {
    reserves(env).get(asset.clone()).unwrap_or(0)
}

fn reserves(env: &Env) -> Map<RewardAsset, i128> {
    env.storage()
        .instance()
        .get(&RESERVES)
        .unwrap_or(Map::new(env))
}

// ── Catch-up ────────────────────────────────────────────────────────────────

/// Compute what [`catch_up`] would do at `now` with `total_shares`
/// outstanding, without writing anything.
///
/// For each live pool:
///
/// ```text
/// deliverable = total × min(now − start, duration) / duration − distributed
/// ```
///
/// With shares outstanding the deliverable is credited and `distributed`
/// advances. With no shares it is held back: `distributed` stays put and the
/// amount is credited by the first catch-up that finds shares again. A
/// deliverable whose credit would overflow the accumulator is held back the
/// same way, so catch-up itself never fails.
pub fn project(env: &Env, now: u64, total_shares: i128) -> Result<CatchUp, ContractError> {
    let mut accumulators = accumulators(env);
    let mut remaining = Vec::new(env);
    let mut deliveries = Vec::new(env);

    for mut pool in pools(env).iter() {
        let elapsed = now.saturating_sub(pool.start_time);
        let deliverable = rewards::vested(pool.total_amount, elapsed, pool.duration)
            .and_then(|vested| vested.checked_sub(pool.distributed_amount))
            .unwrap_or(0);

        // A delivery the accumulator cannot absorb is held back like one
        // with no shares to land on.
        let credited = if total_shares > 0 && deliverable > 0 {
            let current = accumulators.get(pool.asset.clone()).unwrap_or(0);
            rewards::accrual(deliverable, total_shares)
                .and_then(|increase| current.checked_add(increase))
                .zip(pool.distributed_amount.checked_add(deliverable))
        } else {
            None
        };

        if let Some((next, distributed)) = credited {
            accumulators.set(pool.asset.clone(), next);
            pool.distributed_amount = distributed;
            deliveries.push_back(StreamDelivery {
                pool_id: pool.id,
                asset: pool.asset.clone(),
                amount: deliverable,
                completed: pool.distributed_amount == pool.total_amount,
            });
        }

        if pool.distributed_amount < pool.total_amount {
            remaining.push_back(pool);
        }
    }

    Ok(CatchUp {
        accumulators,
        pools: remaining,
        deliveries,
    })
}

/// Bring every accumulator up to the current ledger time and persist the
/// result. Returns the caught-up accumulators.
pub fn catch_up(env: &Env, total_shares: i128) -> Result<Map<RewardAsset, i128>, ContractError> {
    let projected = project(env, env.ledger().timestamp(), total_shares)?;

    if !projected.deliveries.is_empty() {
        env.storage()
            .instance()
            .set(&ACCUMULATORS, &projected.accumulators);
        env.storage().instance().set(&POOLS, &projected.pools);

        for delivery in projected.deliveries.iter() {
            events::publish_streamed(env, delivery);
        }
    }

    Ok(projected.accumulators)
}

// ── Funding ─────────────────────────────────────────────────────────────────

fn register(env: &Env, asset: &RewardAsset) {
    let mut known = assets(env);
    if !known.contains(asset) {
        known.push_back(asset.clone());
        env.storage().instance().set(&ASSETS, &known);
    }
}

fn credit_reserve(env: &Env, asset: &RewardAsset, amount: i128) -> Result<(), ContractError> {
    let mut all = reserves(env);
    let next = all
        .get(asset.clone())
        .unwrap_or(0)
        .checked_add(amount)
        .ok_or(ContractError::ArithmeticOverflow)?;
    all.set(asset.clone(), next);
    env.storage().instance().set(&RESERVES, &all);
    Ok(())
}

/// Take `amount` of `asset` out of the reward reserve for a payout.
///
/// Fails rather than paying out more than was ever funded, which keeps
/// staked principal of the same token out of reach.
pub fn draw_reserve(env: &Env, asset: &RewardAsset, amount: i128) -> Result<(), ContractError> {
    let mut all = reserves(env);
    let held = all.get(asset.clone()).unwrap_or(0);
    if amount > held {
        return Err(ContractError::InsufficientRewardReserve);
    }
    all.set(asset.clone(), held - amount);
    env.storage().instance().set(&RESERVES, &all);
    Ok(())
}

/// Distribute `amount` of `asset` across the current shares at once.
///
/// Accumulators must already be caught up. Returns the new accumulator.
pub fn fund_instant(
    env: &Env,
    asset: &RewardAsset,
    amount: i128,
    total_shares: i128,
) -> Result<i128, ContractError> {
    if amount <= 0 {
        return Err(ContractError::InvalidInput);
    }
    if total_shares <= 0 {
        return Err(ContractError::NoRewardShares);
    }

    register(env, asset);
    credit_reserve(env, asset, amount)?;

    let mut all = accumulators(env);
    let next = rewards::accrual(amount, total_shares)
        .and_then(|increase| all.get(asset.clone()).unwrap_or(0).checked_add(increase))
        .ok_or(ContractError::ArithmeticOverflow)?;
    all.set(asset.clone(), next);
    env.storage().instance().set(&ACCUMULATORS, &all);

    Ok(next)
}

/// Queue `amount` of `asset` to vest linearly over `duration` seconds.
///
/// A zero duration degenerates to [`fund_instant`] and returns `None`;
/// otherwise the new pool's id is returned.
pub fn fund_streaming(
    env: &Env,
    asset: &RewardAsset,
    amount: i128,
    duration: u64,
    total_shares: i128,
) -> Result<Option<u64>, ContractError> {
    if duration == 0 {
        fund_instant(env, asset, amount, total_shares)?;
        return Ok(None);
    }
    if amount <= 0 {
        return Err(ContractError::InvalidInput);
    }
    // Every delivery of the pool, down to one share, must fit the
    // accumulator math.
    rewards::accrual(amount, 1)
        .and(rewards::vested(amount, duration, duration))
        .ok_or(ContractError::ArithmeticOverflow)?;

    register(env, asset);
    credit_reserve(env, asset, amount)?;

    let id = next_pool_id(env);
    let mut live = pools(env);
    live.push_back(StreamingPool {
        id,
        asset: asset.clone(),
        total_amount: amount,
        distributed_amount: 0,
        duration,
        start_time: env.ledger().timestamp(),
    });
    env.storage().instance().set(&POOLS, &live);

    Ok(Some(id))
}

fn next_pool_id(env: &Env) -> u64 {
    let current: u64 = env.storage().instance().get(&POOL_CTR).unwrap_or(0);
    let next = current.saturating_add(1);
    env.storage().instance().set(&POOL_CTR, &next);
    next
}
