//! Lockup tiers and the global effective-share total.
//!
//! A tier is keyed by its lockup duration. Its factor weights the principal
//! staked at that duration, and the global share total is the sum of every
//! tier's weighted principal. Reweighting a tier that holds principal closes
//! a tier epoch: the old factor and the accumulator values at that instant
//! are checkpointed so locks settle pre-reweight rewards at the old weight.

use common::{TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{contracttype, symbol_short, Env, Map, Symbol, Vec};

use crate::accumulator::RewardAsset;
use crate::rewards;
use crate::ContractError;

const TIER: Symbol = symbol_short!("TIER");
const TIER_CP: Symbol = symbol_short!("TIER_CP");
const DURATIONS: Symbol = symbol_short!("DURATNS");
const TOTAL_SHARES: Symbol = symbol_short!("TOT_SHR");

/// One lockup duration bucket.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LockupTier {
    /// Lock duration in seconds; also the withdraw cooldown.
    pub duration: u64,
    /// Weighting numerator over `FACTOR_DENOMINATOR`. Zero disables staking.
    pub factor: u32,
    /// Principal of every Active lock at this duration.
    pub total_principal: i128,
    /// Number of closed reweight epochs.
    pub epoch: u32,
}

impl LockupTier {
    fn disabled(duration: u64) -> Self {
        Self {
            duration,
            factor: 0,
            total_principal: 0,
            epoch: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.factor > 0
    }

    /// This tier's contribution to the global share total.
    pub fn contribution(&self) -> Result<i128, ContractError> {
        rewards::weighted(self.total_principal, self.factor).ok_or(ContractError::ArithmeticOverflow)
    }
}

/// State of a tier at the moment one of its epochs was closed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TierCheckpoint {
    /// Factor in force during the closed epoch.
    pub factor: u32,
    /// Accumulator of every registered asset when the epoch closed.
    pub closing: Map<RewardAsset, i128>,
    /// Running sum over epochs 1..=this of `Δacc × factor / DENOMINATOR`,
    /// where `Δacc` is the epoch's move between consecutive closings. Lets a
    /// lock settle any run of whole epochs from two checkpoints.
    pub weighted: Map<RewardAsset, i128>,
}

fn tier_key(duration: u64) -> (Symbol, u64) {
    (TIER, duration)
}

pub(crate) fn checkpoint_key(duration: u64, epoch: u32) -> (Symbol, u64, u32) {
    (TIER_CP, duration, epoch)
}

// ── Reads ───────────────────────────────────────────────────────────────────

/// Load a tier; an unseen duration reads as a disabled, empty tier.
pub fn load(env: &Env, duration: u64) -> LockupTier {
    let key = tier_key(duration);
    match env.storage().persistent().get(&key) {
        Some(tier) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
            tier
        }
        None => LockupTier::disabled(duration),
    }
}

/// Every duration ever configured, in creation order.
pub fn durations(env: &Env) -> Vec<u64> {
    env.storage()
        .instance()
        .get(&DURATIONS)
        .unwrap_or(Vec::new(env))
}

pub fn total_shares(env: &Env) -> i128 {
    env.storage().instance().get(&TOTAL_SHARES).unwrap_or(0)
}

pub fn checkpoint(env: &Env, duration: u64, epoch: u32) -> Option<TierCheckpoint> {
    let key = checkpoint_key(duration, epoch);
    let checkpoint = env.storage().persistent().get(&key)?;
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    Some(checkpoint)
}

// ── Writes ──────────────────────────────────────────────────────────────────

fn store(env: &Env, tier: &LockupTier) {
    let key = tier_key(tier.duration);
    if !env.storage().persistent().has(&key) {
        let mut known = durations(env);
        known.push_back(tier.duration);
        env.storage().instance().set(&DURATIONS, &known);
    }
    env.storage().persistent().set(&key, tier);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Replace `before`'s contribution to the global total with `after`'s and
/// persist `after`. Returns the new global total.
fn commit(env: &Env, before: &LockupTier, after: &LockupTier) -> Result<i128, ContractError> {
    let total = rewards::reweigh_total(
        total_shares(env),
        before.total_principal,
        before.factor,
        after.total_principal,
        after.factor,
    )
    .ok_or(ContractError::ArithmeticOverflow)?;

    store(env, after);
    env.storage().instance().set(&TOTAL_SHARES, &total);
    Ok(total)
}

/// Set a tier's factor, creating the tier on first use.
///
/// `accumulators` must already be caught up to now: if the tier holds
/// principal, they close the current epoch at the old factor.
pub fn set_factor(
    env: &Env,
    duration: u64,
    factor: u32,
    accumulators: &Map<RewardAsset, i128>,
) -> Result<(LockupTier, i128), ContractError> {
    let before = load(env, duration);
    let mut after = before.clone();
    after.factor = factor;

    if before.total_principal > 0 && before.factor != factor {
        let weighted = match before.epoch.checked_sub(1) {
            Some(previous) => {
                let previous = checkpoint(env, duration, previous)
                    .ok_or(ContractError::CheckpointMissing)?;
                carry_weighted(&previous, accumulators, before.factor)?
            }
            None => Map::new(env),
        };
        let checkpoint = TierCheckpoint {
            factor: before.factor,
            closing: accumulators.clone(),
            weighted,
        };
        let key = checkpoint_key(duration, before.epoch);
        env.storage().persistent().set(&key, &checkpoint);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
        after.epoch = before
            .epoch
            .checked_add(1)
            .ok_or(ContractError::ArithmeticOverflow)?;
    }

    let total = commit(env, &before, &after)?;
    Ok((after, total))
}

/// Extend `previous.weighted` by the epoch closing at `closing`, run at
/// `factor`.
fn carry_weighted(
    previous: &TierCheckpoint,
    closing: &Map<RewardAsset, i128>,
    factor: u32,
) -> Result<Map<RewardAsset, i128>, ContractError> {
    let mut weighted = previous.weighted.clone();
    for (asset, end) in closing.iter() {
        let start = previous.closing.get(asset.clone()).unwrap_or(0);
        let sum = end
            .checked_sub(start)
            .and_then(|moved| rewards::weighted(moved.max(0), factor))
            .and_then(|step| weighted.get(asset.clone()).unwrap_or(0).checked_add(step))
            .ok_or(ContractError::ArithmeticOverflow)?;
        weighted.set(asset, sum);
    }
    Ok(weighted)
}

/// Add freshly staked principal to a tier. Returns the new global total.
pub fn add_principal(env: &Env, tier: &mut LockupTier, amount: i128) -> Result<i128, ContractError> {
    let before = tier.clone();
    tier.total_principal = tier
        .total_principal
        .checked_add(amount)
        .ok_or(ContractError::ArithmeticOverflow)?;
    commit(env, &before, tier)
}

/// Remove an unstaking lock's principal from a tier. Returns the new global
/// total.
pub fn remove_principal(
    env: &Env,
    tier: &mut LockupTier,
    amount: i128,
) -> Result<i128, ContractError> {
    let before = tier.clone();
    tier.total_principal = tier
        .total_principal
        .checked_sub(amount)
        .filter(|left| *left >= 0)
        .ok_or(ContractError::ArithmeticOverflow)?;
    commit(env, &before, tier)
}
