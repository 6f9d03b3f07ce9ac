#![no_std]

pub mod accumulator;
pub mod custody;
pub mod events;
pub mod ledger;
pub mod lockup;
pub mod rewards;

use common::roles::{self, Role, RoleGate, StoredRoles};
use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env, Map, Symbol, Vec};

pub use accumulator::{RewardAmount, RewardAsset, StreamingPool};
pub use custody::CustodyVault;
pub use ledger::{Lock, LockState};
pub use lockup::LockupTier;
pub use rewards::{FACTOR_DENOMINATOR, REWARD_SCALE};

// ── Storage key constants ────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const STAKE_TOKEN: Symbol = symbol_short!("STK_TOK");
const NATIVE_TOKEN: Symbol = symbol_short!("NTV_TOK");

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidInput = 4,
    LockupDisabled = 5,
    LockNotFound = 6,
    LockUnstaking = 7,
    AlreadyUnstaking = 8,
    NotUnstaking = 9,
    CooldownIncomplete = 10,
    NoRewardShares = 11,
    InsufficientRewardReserve = 12,
    ArithmeticOverflow = 13,
    PoolNotFound = 14,
    InsufficientCustody = 15,
    CheckpointMissing = 16,
}

/// Guard: revert if `caller` does not hold `role` according to `gate`.
fn require_role(gate: &impl RoleGate, caller: &Address, role: Role) -> Result<(), ContractError> {
    if !gate.has_role(role, caller) {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct StakingContract;

#[contractimpl]
impl StakingContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the contract.
    ///
    /// * `stake_token`  – SAC address of the token users lock.
    /// * `native_token` – SAC address backing [`RewardAsset::Native`].
    ///
    /// `admin` receives every role.
    pub fn initialize(
        env: Env,
        admin: Address,
        stake_token: Address,
        native_token: Address,
    ) -> Result<(), ContractError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::AlreadyInitialized);
        }

        env.storage().instance().set(&INITIALIZED, &true);
        env.storage().instance().set(&STAKE_TOKEN, &stake_token);
        env.storage().instance().set(&NATIVE_TOKEN, &native_token);

        roles::grant_all(&env, &admin);

        events::publish_initialized(&env, admin, stake_token, native_token);

        Ok(())
    }

    // ── Lockup tiers ────────────────────────────────────────────────────────

    /// Set the weighting factor of the `duration` tier, creating the tier on
    /// first use. A factor of zero closes the tier to new stakes.
    ///
    /// Streaming rewards are caught up first so everything vested before the
    /// reweight is shared at the old weights. Returns the new global share
    /// total.
    ///
    /// Requires the `LockupManager` role.
    pub fn set_lockup_factor(
        env: Env,
        caller: Address,
        duration: u64,
        factor: u32,
    ) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        require_role(&StoredRoles::new(&env), &caller, Role::LockupManager)?;

        let old_factor = lockup::load(&env, duration).factor;
        let accumulators = Self::catch_up(&env)?;
        let (_, total_shares) = lockup::set_factor(&env, duration, factor, &accumulators)?;

        events::publish_factor_set(&env, duration, old_factor, factor, total_shares);

        Ok(total_shares)
    }

    // ── Staking ─────────────────────────────────────────────────────────────

    /// Lock `amount` stake tokens in the `duration` tier.
    ///
    /// Staking again into an Active lock first pays out what the lock has
    /// earned at its current weight, then grows its principal. Returns the
    /// lock's new principal.
    pub fn stake(
        env: Env,
        staker: Address,
        duration: u64,
        amount: i128,
    ) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }
        let mut tier = lockup::load(&env, duration);
        if !tier.is_enabled() {
            return Err(ContractError::LockupDisabled);
        }

        // 1. Bring accumulators to now and settle the existing lock.
        let accumulators = Self::catch_up(&env)?;
        let mut lock = match ledger::load(&env, &staker, duration) {
            Some(lock) if !lock.is_active() => return Err(ContractError::LockUnstaking),
            Some(mut lock) => {
                Self::settle(&env, &mut lock, &tier, &accumulators)?;
                lock
            }
            None => Lock::open(&env, &staker, duration),
        };

        // 2. Grow the lock and the tier.
        lock.principal = lock
            .principal
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        let total_shares = lockup::add_principal(&env, &mut tier, amount)?;
        lock.snapshot(&tier, &accumulators);
        ledger::store(&env, &lock);

        // 3. Move the principal into the staker's vault.
        let stake_token = Self::stake_token(&env)?;
        custody::deposit(&env, &stake_token, &staker, amount)?;

        events::publish_staked(&env, staker, duration, amount, lock.principal, total_shares);

        Ok(lock.principal)
    }

    // ── Unstaking ───────────────────────────────────────────────────────────

    /// Start the cooldown of the `duration` lock.
    ///
    /// Earned rewards are paid out, then the lock stops earning and its
    /// principal leaves the tier and global totals. The principal stays in
    /// custody until `withdraw`. Returns the earliest withdraw timestamp.
    pub fn unstake(env: Env, staker: Address, duration: u64) -> Result<u64, ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        let mut lock = ledger::load(&env, &staker, duration)
            .filter(|lock| lock.principal > 0)
            .ok_or(ContractError::LockNotFound)?;
        if !lock.is_active() {
            return Err(ContractError::AlreadyUnstaking);
        }

        let mut tier = lockup::load(&env, duration);
        let accumulators = Self::catch_up(&env)?;
        Self::settle(&env, &mut lock, &tier, &accumulators)?;

        lockup::remove_principal(&env, &mut tier, lock.principal)?;
        lock.state = LockState::Unstaking;
        lock.unstake_timestamp = env.ledger().timestamp();
        ledger::store(&env, &lock);

        let withdrawable_at = lock.withdrawable_at();
        events::publish_unstaked(&env, staker, duration, lock.principal, withdrawable_at);

        Ok(withdrawable_at)
    }

    /// Release the principal of an Unstaking lock once its cooldown, equal to
    /// the tier duration, has passed. The lock is deleted.
    pub fn withdraw(env: Env, staker: Address, duration: u64) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        let lock = ledger::load(&env, &staker, duration).ok_or(ContractError::LockNotFound)?;
        if lock.is_active() {
            return Err(ContractError::NotUnstaking);
        }
        if env.ledger().timestamp() < lock.withdrawable_at() {
            return Err(ContractError::CooldownIncomplete);
        }

        // Delete the lock before moving tokens (checks-effects-interactions).
        ledger::remove(&env, &staker, duration);

        let stake_token = Self::stake_token(&env)?;
        custody::release(&env, &stake_token, &staker, lock.principal)?;

        events::publish_withdrawn(&env, staker, duration, lock.principal);

        Ok(lock.principal)
    }

    // ── Rewards ─────────────────────────────────────────────────────────────

    /// Pay out everything the `duration` lock has earned, one entry per
    /// registered reward asset. Zero entries are not transferred.
    ///
    /// Rewards are not claimable while a lock is Unstaking.
    pub fn claim(
        env: Env,
        staker: Address,
        duration: u64,
    ) -> Result<Vec<RewardAmount>, ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        let mut lock = ledger::load(&env, &staker, duration).ok_or(ContractError::LockNotFound)?;
        if !lock.is_active() {
            return Err(ContractError::LockUnstaking);
        }

        let tier = lockup::load(&env, duration);
        let accumulators = Self::catch_up(&env)?;
        let paid = Self::settle(&env, &mut lock, &tier, &accumulators)?;
        ledger::store(&env, &lock);

        Ok(paid)
    }

    /// Fund `amount` of `asset` from `rewarder`.
    ///
    /// With `duration == 0` the amount is shared across current stakers at
    /// once and requires outstanding shares. Otherwise it vests linearly over
    /// `duration` seconds and the new streaming pool's id is returned.
    ///
    /// Requires the `Rewarder` role.
    pub fn add_reward(
        env: Env,
        rewarder: Address,
        asset: RewardAsset,
        amount: i128,
        duration: u64,
    ) -> Result<Option<u64>, ContractError> {
        Self::require_initialized(&env)?;
        rewarder.require_auth();
        require_role(&StoredRoles::new(&env), &rewarder, Role::Rewarder)?;

        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }
        let reward_token = Self::asset_address(&env, &asset)?;

        Self::catch_up(&env)?;

        // Take custody of the reward before it is accrued.
        token::Client::new(&env, &reward_token).transfer(
            &rewarder,
            &env.current_contract_address(),
            &amount,
        );

        let total_shares = lockup::total_shares(&env);
        let pool_id = accumulator::fund_streaming(&env, &asset, amount, duration, total_shares)?;

        events::publish_reward_added(
            &env,
            rewarder,
            asset,
            amount,
            duration,
            pool_id.unwrap_or(0),
        );

        Ok(pool_id)
    }

    /// Credit everything streaming pools have vested up to now.
    pub fn distribute_streaming_rewards(env: Env) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        Self::catch_up(&env)?;
        Ok(())
    }

    // ── Roles ───────────────────────────────────────────────────────────────

    /// Grant `role` to `account`. Requires the `Admin` role.
    pub fn grant_role(
        env: Env,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        require_role(&StoredRoles::new(&env), &caller, Role::Admin)?;

        if roles::grant_role(&env, role, &account) {
            events::publish_role_granted(&env, role, account, caller);
        }
        Ok(())
    }

    /// Revoke `role` from `account`. Requires the `Admin` role.
    pub fn revoke_role(
        env: Env,
        caller: Address,
        role: Role,
        account: Address,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        caller.require_auth();
        require_role(&StoredRoles::new(&env), &caller, Role::Admin)?;

        if roles::revoke_role(&env, role, &account) {
            events::publish_role_revoked(&env, role, account, caller);
        }
        Ok(())
    }

    /// Give up `role`. Only the holder can renounce.
    pub fn renounce_role(env: Env, account: Address, role: Role) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        account.require_auth();

        if roles::revoke_role(&env, role, &account) {
            events::publish_role_revoked(&env, role, account.clone(), account);
        }
        Ok(())
    }

    pub fn has_role(env: Env, role: Role, account: Address) -> bool {
        roles::has_role(&env, role, &account)
    }

    /// Every account holding `role`, in grant order.
    pub fn get_role_members(env: Env, role: Role) -> Vec<Address> {
        roles::members(&env, role)
    }

    // ── View functions ───────────────────────────────────────────────────────

    /// Sum over tiers of `total_principal × factor / FACTOR_DENOMINATOR`.
    pub fn get_total_reward_shares(env: Env) -> i128 {
        lockup::total_shares(&env)
    }

    /// Stored reward-per-share accumulator of `asset`, scaled by
    /// `REWARD_SCALE`. Streaming rewards vested since the last catch-up are
    /// not included.
    pub fn get_reward_per_share(env: Env, asset: RewardAsset) -> i128 {
        accumulator::accumulator(&env, &asset)
    }

    pub fn get_reward_assets(env: Env) -> Vec<RewardAsset> {
        accumulator::assets(&env)
    }

    /// Funded-but-unpaid balance of `asset`.
    pub fn get_reward_reserve(env: Env, asset: RewardAsset) -> i128 {
        accumulator::reserve(&env, &asset)
    }

    /// Rewards `claim(owner, duration)` would pay if called now.
    ///
    /// Streaming catch-up is simulated, not persisted. Absent and Unstaking
    /// locks report zero for every asset.
    pub fn get_claimable_rewards(
        env: Env,
        owner: Address,
        duration: u64,
    ) -> Result<Vec<RewardAmount>, ContractError> {
        let lock = ledger::load(&env, &owner, duration)
            .unwrap_or_else(|| Lock::open(&env, &owner, duration));
        let tier = lockup::load(&env, duration);
        let projected = accumulator::project(
            &env,
            env.ledger().timestamp(),
            lockup::total_shares(&env),
        )?;

        ledger::pending(
            &env,
            &lock,
            &tier,
            &accumulator::assets(&env),
            &projected.accumulators,
        )
    }

    pub fn get_lock(env: Env, owner: Address, duration: u64) -> Option<Lock> {
        ledger::load(&env, &owner, duration)
    }

    /// Every lock `owner` holds, in order of first stake.
    pub fn get_locks(env: Env, owner: Address) -> Vec<Lock> {
        let mut locks = Vec::new(&env);
        for duration in ledger::durations_of(&env, &owner).iter() {
            if let Some(lock) = ledger::load(&env, &owner, duration) {
                locks.push_back(lock);
            }
        }
        locks
    }

    /// Tier at `duration`; an unseen duration reads as disabled and empty.
    pub fn get_lockup(env: Env, duration: u64) -> LockupTier {
        lockup::load(&env, duration)
    }

    /// Every tier ever configured, in creation order.
    pub fn get_lockups(env: Env) -> Vec<LockupTier> {
        let mut tiers = Vec::new(&env);
        for duration in lockup::durations(&env).iter() {
            tiers.push_back(lockup::load(&env, duration));
        }
        tiers
    }

    pub fn get_vault(env: Env, owner: Address) -> Option<CustodyVault> {
        custody::get(&env, &owner)
    }

    /// Live streaming pools, oldest first.
    pub fn get_streaming_rewards(env: Env) -> Vec<StreamingPool> {
        accumulator::pools(&env)
    }

    pub fn get_streaming_reward(env: Env, pool_id: u64) -> Result<StreamingPool, ContractError> {
        accumulator::pools(&env)
            .iter()
            .find(|pool| pool.id == pool_id)
            .ok_or(ContractError::PoolNotFound)
    }

    pub fn get_stake_token(env: Env) -> Result<Address, ContractError> {
        Self::stake_token(&env)
    }

    pub fn get_native_token(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&NATIVE_TOKEN)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }

    pub fn factor_denominator() -> u32 {
        FACTOR_DENOMINATOR
    }

    pub fn reward_scale() -> i128 {
        REWARD_SCALE
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Guard: revert if the contract is not yet initialized.
    fn require_initialized(env: &Env) -> Result<(), ContractError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::NotInitialized);
        }
        Ok(())
    }

    fn stake_token(env: &Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&STAKE_TOKEN)
            .ok_or(ContractError::NotInitialized)
    }

    /// Token contract that moves `asset`. The native token contract may only
    /// be named through [`RewardAsset::Native`].
    fn asset_address(env: &Env, asset: &RewardAsset) -> Result<Address, ContractError> {
        let native: Address = env
            .storage()
            .instance()
            .get(&NATIVE_TOKEN)
            .ok_or(ContractError::NotInitialized)?;
        match asset {
            RewardAsset::Native => Ok(native),
            RewardAsset::Token(address) if *address == native => Err(ContractError::InvalidInput),
            RewardAsset::Token(address) => Ok(address.clone()),
        }
    }

    /// Run the streaming catch-up against the current global shares.
    fn catch_up(env: &Env) -> Result<Map<RewardAsset, i128>, ContractError> {
        accumulator::catch_up(env, lockup::total_shares(env))
    }

    /// Pay `lock` everything it has earned up to `accumulators` and snapshot
    /// its debt. The caller persists the lock.
    fn settle(
        env: &Env,
        lock: &mut Lock,
        tier: &LockupTier,
        accumulators: &Map<RewardAsset, i128>,
    ) -> Result<Vec<RewardAmount>, ContractError> {
        let owed = ledger::pending(env, lock, tier, &accumulator::assets(env), accumulators)?;

        for reward in owed.iter() {
            if reward.amount <= 0 {
                continue;
            }
            accumulator::draw_reserve(env, &reward.asset, reward.amount)?;
            let reward_token = Self::asset_address(env, &reward.asset)?;
            token::Client::new(env, &reward_token).transfer(
                &env.current_contract_address(),
                &lock.owner,
                &reward.amount,
            );
            events::publish_reward_paid(
                env,
                lock.owner.clone(),
                lock.duration,
                reward.asset,
                reward.amount,
            );
        }

        lock.snapshot(tier, accumulators);
        Ok(owed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod test_roles;
