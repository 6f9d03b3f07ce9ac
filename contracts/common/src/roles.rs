use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol, Vec};

use crate::{TTL_EXTEND_TO, TTL_THRESHOLD};

// ── Storage Keys ─────────────────────────────────────────────────────────────

const ROLE_PREFIX: Symbol = symbol_short!("ROLE");
const ROLE_MEMBERS: Symbol = symbol_short!("ROLE_MBR");

// ── Role Enum ────────────────────────────────────────────────────────────────

/// Capabilities that gate privileged staking operations.
///
/// - `Admin`         – Grants and revokes every role, including its own.
/// - `LockupManager` – Creates lockup tiers and changes their weighting factor.
/// - `Rewarder`      – Funds reward pools, instant or streaming.
///
/// The initializer of a contract holds all three.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Role {
    Admin = 0,
    LockupManager = 1,
    Rewarder = 2,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::LockupManager, Role::Rewarder];
}

// ── Gate ─────────────────────────────────────────────────────────────────────

/// Answers "does `account` hold `role`?".
///
/// Contracts consult roles only through this trait, so ledger logic can be
/// exercised against any implementation.
pub trait RoleGate {
    fn has_role(&self, role: Role, account: &Address) -> bool;
}

/// [`RoleGate`] backed by the calling contract's persistent storage.
pub struct StoredRoles<'a> {
    env: &'a Env,
}

impl<'a> StoredRoles<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self { env }
    }
}

impl RoleGate for StoredRoles<'_> {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        has_role(self.env, role, account)
    }
}

// ── Storage Helpers ──────────────────────────────────────────────────────────

fn role_key(role: Role, account: &Address) -> (Symbol, Role, Address) {
    (ROLE_PREFIX, role, account.clone())
}

fn members_key(role: Role) -> (Symbol, Role) {
    (ROLE_MEMBERS, role)
}

// ── Core Functions ───────────────────────────────────────────────────────────

/// Returns true if `account` currently holds `role`.
pub fn has_role(env: &Env, role: Role, account: &Address) -> bool {
    let key = role_key(role, account);
    let held = env.storage().persistent().has(&key);
    if held {
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    held
}

/// Assigns `role` to `account`.
/// Callers must verify authorization beforehand.
///
/// Returns `false` if the account already held the role.
pub fn grant_role(env: &Env, role: Role, account: &Address) -> bool {
    if has_role(env, role, account) {
        return false;
    }
    let key = role_key(role, account);
    env.storage().persistent().set(&key, &true);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    track_member(env, role, account);
    true
}

/// Removes `role` from `account`.
///
/// Returns `false` if the account did not hold the role.
pub fn revoke_role(env: &Env, role: Role, account: &Address) -> bool {
    if !has_role(env, role, account) {
        return false;
    }
    env.storage().persistent().remove(&role_key(role, account));
    untrack_member(env, role, account);
    true
}

/// Grants every [`Role`] to `account`. Used once, at initialization.
pub fn grant_all(env: &Env, account: &Address) {
    for role in Role::ALL {
        grant_role(env, role, account);
    }
}

/// Returns every address currently holding `role`, in grant order.
pub fn members(env: &Env, role: Role) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&members_key(role))
        .unwrap_or(Vec::new(env))
}

fn track_member(env: &Env, role: Role, account: &Address) {
    let key = members_key(role);
    let mut list = members(env, role);
    if !list.contains(account) {
        list.push_back(account.clone());
        env.storage().persistent().set(&key, &list);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

fn untrack_member(env: &Env, role: Role, account: &Address) {
    let key = members_key(role);
    let list = members(env, role);

    let mut kept = Vec::new(env);
    for member in list.iter() {
        if member != *account {
            kept.push_back(member);
        }
    }
    env.storage().persistent().set(&key, &kept);
}
