//! Per-(owner, duration) lock records and their reward settlement.

use common::{TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{contracttype, symbol_short, Address, Env, Map, Symbol, Vec};

use crate::accumulator::{RewardAmount, RewardAsset};
use crate::lockup::{self, LockupTier, TierCheckpoint};
use crate::rewards;
use crate::ContractError;

const LOCK: Symbol = symbol_short!("LOCK");
const OWNER_LOCKS: Symbol = symbol_short!("LOCKS");

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum LockState {
    Active = 0,
    Unstaking = 1,
}

/// One owner's position in one lockup tier.
///
/// Repeated stakes into the same tier grow the same lock. The record is
/// deleted when its principal is withdrawn.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lock {
    pub owner: Address,
    pub duration: u64,
    pub principal: i128,
    pub state: LockState,
    /// Set by `unstake`; zero while Active.
    pub unstake_timestamp: u64,
    /// Tier epoch the debt snapshot was taken in.
    pub epoch: u32,
    /// Accumulator of each reward asset at the last settlement.
    pub debt: Map<RewardAsset, i128>,
}

impl Lock {
    pub fn open(env: &Env, owner: &Address, duration: u64) -> Self {
        Self {
            owner: owner.clone(),
            duration,
            principal: 0,
            state: LockState::Active,
            unstake_timestamp: 0,
            epoch: 0,
            debt: Map::new(env),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == LockState::Active
    }

    /// Earliest timestamp at which an Unstaking lock may be withdrawn.
    pub fn withdrawable_at(&self) -> u64 {
        self.unstake_timestamp.saturating_add(self.duration)
    }

    /// Record the current accumulators as fully settled.
    pub fn snapshot(&mut self, tier: &LockupTier, accumulators: &Map<RewardAsset, i128>) {
        self.debt = accumulators.clone();
        self.epoch = tier.epoch;
    }
}

// ── Storage ─────────────────────────────────────────────────────────────────

fn lock_key(owner: &Address, duration: u64) -> (Symbol, Address, u64) {
    (LOCK, owner.clone(), duration)
}

fn owner_locks_key(owner: &Address) -> (Symbol, Address) {
    (OWNER_LOCKS, owner.clone())
}

pub fn load(env: &Env, owner: &Address, duration: u64) -> Option<Lock> {
    env.storage().persistent().get(&lock_key(owner, duration))
}

/// Durations `owner` holds a lock in, in order of first stake.
pub fn durations_of(env: &Env, owner: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&owner_locks_key(owner))
        .unwrap_or(Vec::new(env))
}

pub fn store(env: &Env, lock: &Lock) {
    let key = lock_key(&lock.owner, lock.duration);
    if !env.storage().persistent().has(&key) {
        let mut held = durations_of(env, &lock.owner);
        held.push_back(lock.duration);
        set_owner_locks(env, &lock.owner, &held);
    }
    env.storage().persistent().set(&key, lock);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn remove(env: &Env, owner: &Address, duration: u64) {
    env.storage().persistent().remove(&lock_key(owner, duration));

    let mut kept = Vec::new(env);
    for held in durations_of(env, owner).iter() {
        if held != duration {
            kept.push_back(held);
        }
    }
    set_owner_locks(env, owner, &kept);
}

fn set_owner_locks(env: &Env, owner: &Address, durations: &Vec<u64>) {
    let key = owner_locks_key(owner);
    env.storage().persistent().set(&key, durations);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

// ── Settlement ──────────────────────────────────────────────────────────────

/// Rewards `lock` has earned since its last snapshot, one entry per
/// registered asset.
///
/// The epoch the snapshot was taken in is paid at its own factor up to its
/// closing accumulator. Whole epochs closed after it are paid in one step
/// from the running weighted sums of the first and last checkpoints, so at
/// most two checkpoints are read however many reweights the lock missed.
/// The open epoch is paid at the tier's current factor up to
/// `accumulators`. Locks that are not Active earn nothing.
pub fn pending(
    env: &Env,
    lock: &Lock,
    tier: &LockupTier,
    assets: &Vec<RewardAsset>,
    accumulators: &Map<RewardAsset, i128>,
) -> Result<Vec<RewardAmount>, ContractError> {
    let mut starts: Map<RewardAsset, i128> = Map::new(env);
    let mut owed: Map<RewardAsset, i128> = Map::new(env);
    for asset in assets.iter() {
        starts.set(asset.clone(), lock.debt.get(asset.clone()).unwrap_or(0));
        owed.set(asset, 0);
    }

    if lock.is_active() && lock.principal > 0 {
        if lock.epoch < tier.epoch {
            let first = lockup::checkpoint(env, lock.duration, lock.epoch)
                .ok_or(ContractError::CheckpointMissing)?;
            let effective = rewards::weighted(lock.principal, first.factor)
                .ok_or(ContractError::ArithmeticOverflow)?;
            accrue(&mut starts, &mut owed, &first.closing, effective)?;

            let last_epoch = tier.epoch - 1;
            if last_epoch > lock.epoch {
                let last = lockup::checkpoint(env, lock.duration, last_epoch)
                    .ok_or(ContractError::CheckpointMissing)?;
                accrue_epochs(&mut starts, &mut owed, &first, &last, lock.principal)?;
            }
        }

        let effective = rewards::weighted(lock.principal, tier.factor)
            .ok_or(ContractError::ArithmeticOverflow)?;
        accrue(&mut starts, &mut owed, accumulators, effective)?;
    }

    let mut amounts = Vec::new(env);
    for asset in assets.iter() {
        let amount = owed.get(asset.clone()).unwrap_or(0);
        amounts.push_back(RewardAmount { asset, amount });
    }
    Ok(amounts)
}

/// Credit `principal` for every whole epoch after `first` up to and
/// including `last`, then advance the starts to `last`'s closing.
fn accrue_epochs(
    starts: &mut Map<RewardAsset, i128>,
    owed: &mut Map<RewardAsset, i128>,
    first: &TierCheckpoint,
    last: &TierCheckpoint,
    principal: i128,
) -> Result<(), ContractError> {
    for (asset, start) in starts.clone().iter() {
        let from = first.closing.get(asset.clone()).unwrap_or(0);
        let to = last.closing.get(asset.clone()).unwrap_or(0);
        let weighted = last
            .weighted
            .get(asset.clone())
            .unwrap_or(0)
            .checked_sub(first.weighted.get(asset.clone()).unwrap_or(0));
        let earned = weighted
            .zip(to.checked_sub(from))
            .and_then(|(weighted, raw)| rewards::owed_across_epochs(weighted, raw, principal))
            .and_then(|earned| owed.get(asset.clone()).unwrap_or(0).checked_add(earned))
            .ok_or(ContractError::ArithmeticOverflow)?;
        owed.set(asset.clone(), earned);
        starts.set(asset, to.max(start));
    }
    Ok(())
}

/// Credit `effective` shares for every asset's move from its running start
/// to `ends`, then advance the starts.
fn accrue(
    starts: &mut Map<RewardAsset, i128>,
    owed: &mut Map<RewardAsset, i128>,
    ends: &Map<RewardAsset, i128>,
    effective: i128,
) -> Result<(), ContractError> {
    for (asset, start) in starts.clone().iter() {
        let end = ends.get(asset.clone()).unwrap_or(0).max(start);
        let earned = rewards::owed(end, start, effective)
            .and_then(|earned| owed.get(asset.clone()).unwrap_or(0).checked_add(earned))
            .ok_or(ContractError::ArithmeticOverflow)?;
        owed.set(asset.clone(), earned);
        starts.set(asset, end);
    }
    Ok(())
}
