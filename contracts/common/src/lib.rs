//! Shared building blocks for the tiered staking contracts.
//!
//! This crate provides:
//! - [`roles`]: the role registry consulted before privileged calls, and
//!   the [`RoleGate`] trait through which contracts query it.
//! - [`TTL_THRESHOLD`] / [`TTL_EXTEND_TO`]: persistent-storage lifetimes
//!   shared by every contract in the workspace.

#![no_std]

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod roles;

pub use roles::*;

// ── Storage lifetimes ────────────────────────────────────────────────────────

/// Remaining-ledger threshold below which a persistent entry is extended.
pub const TTL_THRESHOLD: u32 = 5_184_000;

/// Ledger count a persistent entry is extended to once it crosses the threshold.
pub const TTL_EXTEND_TO: u32 = 10_368_000;
