//! Per-owner custody of staked principal.
//!
//! Each owner gets one vault, opened by their first stake. The staked tokens
//! themselves sit in the contract's token balance; the vault is the ledger
//! entry that fences them off from reward reserves of the same token and
//! pins who they may be released to.

use common::{TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{contracttype, symbol_short, token, Address, Env, Symbol};

use crate::events;
use crate::ContractError;

const VAULT: Symbol = symbol_short!("VAULT");
const VAULT_CTR: Symbol = symbol_short!("VAULT_CTR");

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CustodyVault {
    pub id: u64,
    pub owner: Address,
    /// Principal of every Active or Unstaking lock of `owner`.
    pub balance: i128,
    pub created_at: u64,
}

fn vault_key(owner: &Address) -> (Symbol, Address) {
    (VAULT, owner.clone())
}

fn next_vault_id(env: &Env) -> u64 {
    let current: u64 = env.storage().instance().get(&VAULT_CTR).unwrap_or(0);
    let next = current.saturating_add(1);
    env.storage().instance().set(&VAULT_CTR, &next);
    next
}

fn store(env: &Env, vault: &CustodyVault) {
    let key = vault_key(&vault.owner);
    env.storage().persistent().set(&key, vault);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn get(env: &Env, owner: &Address) -> Option<CustodyVault> {
    env.storage().persistent().get(&vault_key(owner))
}

/// Pull `amount` of `stake_token` from `owner` into their vault, opening the
/// vault if this is their first stake.
pub(crate) fn deposit(
    env: &Env,
    stake_token: &Address,
    owner: &Address,
    amount: i128,
) -> Result<CustodyVault, ContractError> {
    let mut vault = match get(env, owner) {
        Some(vault) => vault,
        None => {
            let vault = CustodyVault {
                id: next_vault_id(env),
                owner: owner.clone(),
                balance: 0,
                created_at: env.ledger().timestamp(),
            };
            events::publish_vault_opened(env, owner.clone(), vault.id);
            vault
        }
    };

    vault.balance = vault
        .balance
        .checked_add(amount)
        .ok_or(ContractError::ArithmeticOverflow)?;
    store(env, &vault);

    token::Client::new(env, stake_token).transfer(owner, &env.current_contract_address(), &amount);

    Ok(vault)
}

/// Release `amount` from `owner`'s vault back to `owner`. The destination is
/// always the vault owner.
pub(crate) fn release(
    env: &Env,
    stake_token: &Address,
    owner: &Address,
    amount: i128,
) -> Result<CustodyVault, ContractError> {
    let mut vault = get(env, owner).ok_or(ContractError::LockNotFound)?;
    if amount > vault.balance {
        return Err(ContractError::InsufficientCustody);
    }
    vault.balance -= amount;
    store(env, &vault);

    token::Client::new(env, stake_token).transfer(
        &env.current_contract_address(),
        &vault.owner,
        &amount,
    );

    Ok(vault)
}
