#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]
//! Property-based state machine tests for the StakingContract.
//!
//! Random sequences of stakes, unstakes, withdrawals, claims, fundings,
//! reweights and clock moves are replayed against a fresh contract. After
//! every step the ledger must stay internally consistent.
//!
//! Invariants tested:
//! - Global shares equal the sum of `total_principal × factor / DENOMINATOR`
//!   over all tiers
//! - A tier's principal equals the sum of its Active locks' principals
//! - A vault's balance equals the sum of its owner's lock principals
//! - The contract's balance of each token equals custody plus reward reserve,
//!   so payouts never exceed fundings or touch principal
//! - A successful claim pays exactly what the preview reported
//! - Streaming pools never distribute more than they hold

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::token::{Client as TokenClient, StellarAssetClient};
use soroban_sdk::{Address, Env};
use tiered_staking::rewards::weighted;
use tiered_staking::{RewardAsset, StakingContract, StakingContractClient, FACTOR_DENOMINATOR};

const TIERS: [u64; 3] = [3_600, 86_400, 604_800];
const FACTORS: [u32; 5] = [
    0,
    FACTOR_DENOMINATOR / 4,
    FACTOR_DENOMINATOR / 2,
    FACTOR_DENOMINATOR,
    2 * FACTOR_DENOMINATOR,
];
const USERS: usize = 4;

#[derive(Arbitrary, Clone, Debug)]
enum Op {
    Stake {
        user: u8,
        tier: u8,
        #[proptest(strategy = "10_000_000i128..=10_000_000_000i128")]
        amount: i128,
    },
    Unstake {
        user: u8,
        tier: u8,
    },
    Withdraw {
        user: u8,
        tier: u8,
    },
    Claim {
        user: u8,
        tier: u8,
    },
    Fund {
        native: bool,
        #[proptest(strategy = "1i128..=100_000_000_000i128")]
        amount: i128,
        #[proptest(strategy = "0u64..=7_200u64")]
        duration: u64,
    },
    Reweight {
        tier: u8,
        factor: u8,
    },
    Advance {
        #[proptest(strategy = "0u64..=200_000u64")]
        seconds: u64,
    },
    Distribute,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Harness {
    env: Env,
    client: StakingContractClient<'static>,
    admin: Address,
    stake_token: Address,
    native_token: Address,
    users: std::vec::Vec<Address>,
}

fn setup() -> Harness {
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
        client.set_lockup_factor(&admin, &duration, &FACTOR_DENOMINATOR);
    }

    StellarAssetClient::new(&env, &stake_token).mint(&admin, &100_000_000_000_000);
    StellarAssetClient::new(&env, &native_token).mint(&admin, &100_000_000_000_000);

    let users = (0..USERS)
        .map(|_| {
            let user = Address::generate(&env);
            StellarAssetClient::new(&env, &stake_token).mint(&user, &10_000_000_000_000);
            user
        })
        .collect();

    Harness {
        env,
        client,
        admin,
        stake_token,
        native_token,
        users,
    }
}

fn apply(h: &Harness, op: &Op) -> Result<(), TestCaseError> {
    match op {
        Op::Stake { user, tier, amount } => {
            let user = &h.users[*user as usize % USERS];
            let _ = h
                .client
                .try_stake(user, &TIERS[*tier as usize % TIERS.len()], amount);
        }
        Op::Unstake { user, tier } => {
            let user = &h.users[*user as usize % USERS];
            let _ = h
                .client
                .try_unstake(user, &TIERS[*tier as usize % TIERS.len()]);
        }
        Op::Withdraw { user, tier } => {
            let user = &h.users[*user as usize % USERS];
            let _ = h
                .client
                .try_withdraw(user, &TIERS[*tier as usize % TIERS.len()]);
        }
        Op::Claim { user, tier } => {
            let user = &h.users[*user as usize % USERS];
            let duration = TIERS[*tier as usize % TIERS.len()];
            let preview = h.client.get_claimable_rewards(user, &duration);
            if let Ok(Ok(paid)) = h.client.try_claim(user, &duration) {
                prop_assert_eq!(paid, preview);
            }
        }
        Op::Fund {
            native,
            amount,
            duration,
        } => {
            let asset = if *native {
                RewardAsset::Native
            } else {
                RewardAsset::Token(h.stake_token.clone())
            };
            let _ = h.client.try_add_reward(&h.admin, &asset, amount, duration);
        }
        Op::Reweight { tier, factor } => {
            let _ = h.client.try_set_lockup_factor(
                &h.admin,
                &TIERS[*tier as usize % TIERS.len()],
                &FACTORS[*factor as usize % FACTORS.len()],
            );
        }
        Op::Advance { seconds } => {
            let now = h.env.ledger().timestamp();
            h.env.ledger().set_timestamp(now + seconds);
        }
        Op::Distribute => {
            h.client.distribute_streaming_rewards();
        }
    }
    Ok(())
}

fn check_invariants(h: &Harness) -> Result<(), TestCaseError> {
    let client = &h.client;

    let expected_shares: i128 = client
        .get_lockups()
        .iter()
        .map(|tier| weighted(tier.total_principal, tier.factor).unwrap())
        .sum();
    prop_assert_eq!(client.get_total_reward_shares(), expected_shares);

    for duration in TIERS {
        let active: i128 = h
            .users
            .iter()
            .filter_map(|user| client.get_lock(user, &duration))
            .filter(|lock| lock.is_active())
            .map(|lock| lock.principal)
            .sum();
        prop_assert_eq!(client.get_lockup(&duration).total_principal, active);
    }

    let mut custody = 0i128;
    for user in h.users.iter() {
        let locked: i128 = client.get_locks(user).iter().map(|lock| lock.principal).sum();
        let vault = client.get_vault(user).map(|v| v.balance).unwrap_or(0);
        prop_assert_eq!(vault, locked);
        custody += vault;
    }

    let stake_reserve = client.get_reward_reserve(&RewardAsset::Token(h.stake_token.clone()));
    let native_reserve = client.get_reward_reserve(&RewardAsset::Native);
    prop_assert!(stake_reserve >= 0);
    prop_assert!(native_reserve >= 0);
    prop_assert_eq!(
        TokenClient::new(&h.env, &h.stake_token).balance(&client.address),
        custody + stake_reserve
    );
    prop_assert_eq!(
        TokenClient::new(&h.env, &h.native_token).balance(&client.address),
        native_reserve
    );

    for pool in client.get_streaming_rewards().iter() {
        prop_assert!(pool.distributed_amount >= 0);
        prop_assert!(pool.distributed_amount < pool.total_amount);
    }

    Ok(())
}

// ── proptest! blocks ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every reachable state satisfies the ledger invariants.
    #[test]
    fn prop_ledger_consistent_under_random_ops(
        ops in proptest::collection::vec(any::<Op>(), 1..40),
    ) {
        let h = setup();
        for op in ops.iter() {
            apply(&h, op)?;
            check_invariants(&h)?;
        }
    }

    /// Two stakers of the same tier are paid in proportion to their principal,
    /// whatever the funding and timing.
    #[test]
    fn prop_same_tier_paid_pro_rata(
        first in 10_000_000i128..=10_000_000_000i128,
        second in 10_000_000i128..=10_000_000_000i128,
        amount in 1_000i128..=100_000_000_000i128,
        duration in 0u64..=7_200u64,
    ) {
        let h = setup();
        let tier = TIERS[0];
        h.client.stake(&h.users[0], &tier, &first);
        h.client.stake(&h.users[1], &tier, &second);
        h.client.add_reward(&h.admin, &RewardAsset::Native, &amount, &duration);
        h.env.ledger().set_timestamp(h.env.ledger().timestamp() + duration);

        h.client.claim(&h.users[0], &tier);
        h.client.claim(&h.users[1], &tier);

        let native = TokenClient::new(&h.env, &h.native_token);
        let paid_first = native.balance(&h.users[0]);
        let paid_second = native.balance(&h.users[1]);

        prop_assert!(paid_first + paid_second <= amount);
        // Cross-multiplied shares agree up to truncation on either side.
        let skew = (paid_first * second - paid_second * first).abs();
        prop_assert!(skew <= first.max(second) * 2);
    }
}
