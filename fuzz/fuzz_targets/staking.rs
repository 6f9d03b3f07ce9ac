#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token::{Client as TokenClient, StellarAssetClient},
    Address, Env,
};
use tiered_staking::{RewardAsset, StakingContract, StakingContractClient};

const TIERS: [u64; 3] = [3_600, 86_400, 604_800];

#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Stake { tier: u8, amount: u64 },
    Unstake { tier: u8 },
    Withdraw { tier: u8 },
    Claim { tier: u8 },
    AddReward { native: bool, amount: u64, duration: u16 },
    SetFactor { tier: u8, factor: u16 },
    Advance { seconds: u32 },
    Distribute,
}

fuzz_target!(|actions: Vec<FuzzAction>| {
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
    for duration in TIERS {
        client.set_lockup_factor(&admin, &duration, &10_000);
    }

    let mut users = vec![admin.clone()];
    for _ in 0..4 {
        users.push(Address::generate(&env));
    }
    for user in users.iter() {
        StellarAssetClient::new(&env, &stake_token).mint(user, &(u64::MAX as i128));
        StellarAssetClient::new(&env, &native_token).mint(user, &(u64::MAX as i128));
    }

    // Every entry point must fail with a contract error rather than trap,
    // and the contract must never pay out principal it holds in custody.
    for (i, action) in actions.into_iter().enumerate() {
        let caller = &users[i % users.len()];
        match action {
            FuzzAction::Stake { tier, amount } => {
                let duration = TIERS[tier as usize % TIERS.len()];
                let _ = client.try_stake(caller, &duration, &(amount as i128));
            }
            FuzzAction::Unstake { tier } => {
                let _ = client.try_unstake(caller, &TIERS[tier as usize % TIERS.len()]);
            }
            FuzzAction::Withdraw { tier } => {
                let _ = client.try_withdraw(caller, &TIERS[tier as usize % TIERS.len()]);
            }
            FuzzAction::Claim { tier } => {
                let _ = client.try_claim(caller, &TIERS[tier as usize % TIERS.len()]);
            }
            FuzzAction::AddReward {
                native,
                amount,
                duration,
            } => {
                let asset = if native {
                    RewardAsset::Native
                } else {
                    RewardAsset::Token(stake_token.clone())
                };
                let _ = client.try_add_reward(&admin, &asset, &(amount as i128), &(duration as u64));
            }
            FuzzAction::SetFactor { tier, factor } => {
                let duration = TIERS[tier as usize % TIERS.len()];
                let _ = client.try_set_lockup_factor(&admin, &duration, &(factor as u32));
            }
            FuzzAction::Advance { seconds } => {
                let now = env.ledger().timestamp();
                env.ledger().set_timestamp(now.saturating_add(seconds as u64));
            }
            FuzzAction::Distribute => {
                let _ = client.try_distribute_streaming_rewards();
            }
        }

        let custody: i128 = users
            .iter()
            .filter_map(|user| client.get_vault(user))
            .map(|vault| vault.balance)
            .sum();
        let reserve = client.get_reward_reserve(&RewardAsset::Token(stake_token.clone()));
        assert_eq!(
            TokenClient::new(&env, &stake_token).balance(&contract_id),
            custody + reserve
        );
    }
});
