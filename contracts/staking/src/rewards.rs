//! Fixed-point reward arithmetic.
//!
//! Every function here is pure and checked: `None` means the result does not
//! fit in an `i128`, and callers surface that as `ArithmeticOverflow`. All
//! divisions truncate toward zero, which for the non-negative operands used
//! here is floor division.

/// Fixed-point scale applied to every reward-per-share accumulator.
///
/// Accumulators store `reward × REWARD_SCALE / shares`, so a share's claim on
/// a funding is recovered as `delta × shares / REWARD_SCALE`. At 10^19 the
/// truncation loss per funding is below one base unit for any realistic
/// share count.
pub const REWARD_SCALE: i128 = 10_000_000_000_000_000_000;

/// Denominator of a tier's weighting factor. A factor equal to this value
/// weights principal 1:1.
pub const FACTOR_DENOMINATOR: u32 = 10_000;

// ── Weighting ───────────────────────────────────────────────────────────────

/// Effective shares carried by `principal` at `factor`.
///
/// ```text
/// weighted = principal × factor / FACTOR_DENOMINATOR
/// ```
///
/// Used both for a single lock's effective stake and for a tier's
/// contribution to the global share total.
pub fn weighted(principal: i128, factor: u32) -> Option<i128> {
    principal
        .checked_mul(i128::from(factor))?
        .checked_div(i128::from(FACTOR_DENOMINATOR))
}

/// New global share total after one tier's principal or factor changed.
///
/// The tier's old contribution is removed and its new one added, so the
/// global total always equals the sum of per-tier contributions exactly.
pub fn reweigh_total(
    global: i128,
    old_principal: i128,
    old_factor: u32,
    new_principal: i128,
    new_factor: u32,
) -> Option<i128> {
    let old_contribution = weighted(old_principal, old_factor)?;
    let new_contribution = weighted(new_principal, new_factor)?;
    global
        .checked_sub(old_contribution)?
        .checked_add(new_contribution)
}

// ── Accumulator ─────────────────────────────────────────────────────────────

/// Accumulator increase for distributing `amount` across `total_shares`.
///
/// ```text
/// Δacc = amount × REWARD_SCALE / total_shares
/// ```
///
/// Returns `Some(0)` when there are no shares; callers decide whether that
/// is an error (instant funding) or a reason to hold the amount back
/// (streaming).
pub fn accrual(amount: i128, total_shares: i128) -> Option<i128> {
    if total_shares <= 0 {
        return Some(0);
    }
    amount.checked_mul(REWARD_SCALE)?.checked_div(total_shares)
}

/// Reward owed to `effective` shares for an accumulator move of
/// `current − snapshot`.
///
/// ```text
/// owed = (current − snapshot) × effective / REWARD_SCALE
/// ```
pub fn owed(current: i128, snapshot: i128, effective: i128) -> Option<i128> {
    let delta = current.checked_sub(snapshot)?;
    if delta <= 0 || effective <= 0 {
        return Some(0);
    }
    delta.checked_mul(effective)?.checked_div(REWARD_SCALE)
}

/// Reward owed to `principal` across a run of whole tier epochs.
///
/// `weighted` is the summed `Δacc × factor / FACTOR_DENOMINATOR` of those
/// epochs and `raw` the summed `Δacc`:
///
/// ```text
/// owed = (principal × weighted − raw) / REWARD_SCALE
/// ```
///
/// Never more than settling at every epoch with
/// `floor(principal × factor / FACTOR_DENOMINATOR)` shares would pay.
pub fn owed_across_epochs(weighted: i128, raw: i128, principal: i128) -> Option<i128> {
    if weighted <= 0 || principal <= 0 {
        return Some(0);
    }
    let gross = principal.checked_mul(weighted)?.checked_sub(raw.max(0))?;
    Some(gross.max(0) / REWARD_SCALE)
}

// ── Streaming ───────────────────────────────────────────────────────────────

/// Cumulative amount of a linear stream vested after `elapsed` seconds.
///
/// ```text
/// vested = total × min(elapsed, duration) / duration
/// ```
///
/// A zero-duration stream is fully vested immediately.
pub fn vested(total: i128, elapsed: u64, duration: u64) -> Option<i128> {
    if duration == 0 {
        return Some(total);
    }
    let elapsed = elapsed.min(duration);
    total
        .checked_mul(i128::from(elapsed))?
        .checked_div(i128::from(duration))
}

// ── Unit tests ──────────────────────────────────────────────────────────────
// Pure-math tests with no Soroban environment dependency.
