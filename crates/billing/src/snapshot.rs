//! Billing snapshot derivation
//!
//! The heart of the engine: a pure projection of a stored account row and
//! the current instant into the canonical entitlement view. Several lock
//! conditions can hold at once, so the builder applies a fixed precedence
//! order; the stored lock reason is advisory and never copied.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use time::OffsetDateTime;

use crate::account::{BillingAccount, CreditPool, LockReason, MembershipState};
use crate::policy::{self, CREDIT_POOL_PRIORITY};

const SECONDS_PER_DAY: i64 = 86_400;

/// Credit counters for one pool
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreditWindow {
    pub limit: Decimal,
    pub used: Decimal,
    /// Always `max(0, limit - used)`, even when `used` transiently exceeds
    /// `limit`.
    pub remaining: Decimal,
}

impl CreditWindow {
    pub fn new(limit: Decimal, used: Decimal) -> Self {
        Self {
            limit,
            used,
            remaining: (limit - used).max(Decimal::ZERO),
        }
    }
}

/// Trial window status
#[derive(Debug, Clone, Serialize)]
pub struct TrialStatus {
    pub credits: CreditWindow,
    pub remaining_days: i64,
    /// Elapsed share of the trial window, 0-100. Pinned at 100 once the
    /// window has elapsed.
    pub time_progress: Decimal,
}

/// Monthly package status
#[derive(Debug, Clone, Serialize)]
pub struct PackageStatus {
    pub credits: CreditWindow,
}

/// Fully derived, point-in-time entitlement view of one account.
///
/// Deterministic given `(account, now)`: no clock reads, no hidden state.
#[derive(Debug, Clone, Serialize)]
pub struct BillingSnapshot {
    pub membership_state: MembershipState,
    /// Canonical, recomputed reason. The stored column is only a hint.
    pub lock_reason: Option<LockReason>,
    pub is_usage_allowed: bool,
    pub is_topup_allowed: bool,
    pub active_credit_pool: Option<CreditPool>,
    pub trial: TrialStatus,
    pub package: PackageStatus,
    pub topup_balance: Decimal,
}

/// Derive the snapshot for `account` as of `now`.
pub fn build_snapshot(account: &BillingAccount, now: OffsetDateTime) -> BillingSnapshot {
    let trial_credits = CreditWindow::new(account.trial_credit_limit, account.trial_credit_used);
    let package_credits = CreditWindow::new(
        account.monthly_package_credit_limit,
        account.monthly_package_credit_used,
    );
    let topup_balance = account.topup_credit_balance.max(Decimal::ZERO);

    let trial = TrialStatus {
        credits: trial_credits,
        remaining_days: trial_remaining_days(account.trial_ends_at, now),
        time_progress: trial_time_progress(
            account.trial_started_at,
            account.trial_ends_at,
            now,
        ),
    };

    let (is_usage_allowed, lock_reason, active_credit_pool) = match account.membership_state {
        MembershipState::TrialActive => {
            // Time expiry outranks any remaining trial credits. A trial
            // without a recorded end cannot be verified and counts as
            // expired.
            let time_expired = account.trial_ends_at.is_none_or(|ends| now >= ends);
            if time_expired {
                (false, Some(LockReason::TrialTimeExpired), None)
            } else if trial.credits.remaining > Decimal::ZERO {
                (true, None, Some(CreditPool::TrialPool))
            } else {
                (false, Some(LockReason::SubscriptionRequired), None)
            }
        }
        MembershipState::TrialExhausted => (false, Some(LockReason::SubscriptionRequired), None),
        MembershipState::PremiumActive => {
            let active = CREDIT_POOL_PRIORITY
                .iter()
                .copied()
                .find(|pool| pool_remaining(*pool, &package_credits, topup_balance) > Decimal::ZERO);
            match active {
                Some(pool) => (true, None, Some(pool)),
                None => (false, Some(LockReason::PackageCreditsExhausted), None),
            }
        }
        MembershipState::PastDue => (false, Some(LockReason::PastDue), None),
        MembershipState::AdminLocked => (false, Some(LockReason::AdminLocked), None),
        // The lock-reason vocabulary has no `canceled`: a canceled account
        // needs a new subscription.
        MembershipState::Canceled => (false, Some(LockReason::SubscriptionRequired), None),
    };

    // Evaluated on the package remainder computed above, so the predicate
    // cannot drift from the pool walk. True even when the account is fully
    // locked: topping up is how it gets unlocked.
    let is_topup_allowed =
        policy::is_topup_allowed(account.membership_state, package_credits.remaining);

    BillingSnapshot {
        membership_state: account.membership_state,
        lock_reason,
        is_usage_allowed,
        is_topup_allowed,
        active_credit_pool,
        trial,
        package: PackageStatus {
            credits: package_credits,
        },
        topup_balance,
    }
}

fn pool_remaining(pool: CreditPool, package: &CreditWindow, topup_balance: Decimal) -> Decimal {
    match pool {
        // The trial pool never participates in the paid drawdown order.
        CreditPool::TrialPool => Decimal::ZERO,
        CreditPool::PackagePool => package.remaining,
        CreditPool::TopupPool => topup_balance,
    }
}

/// Whole days left in the trial, rounded up, never negative.
fn trial_remaining_days(trial_ends_at: Option<OffsetDateTime>, now: OffsetDateTime) -> i64 {
    let Some(ends) = trial_ends_at else { return 0 };
    let seconds = (ends - now).whole_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds as u64).div_ceil(SECONDS_PER_DAY as u64) as i64
    }
}

/// Elapsed share of the trial window as a percentage.
fn trial_time_progress(
    trial_started_at: Option<OffsetDateTime>,
    trial_ends_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Decimal {
    let Some(ends) = trial_ends_at else {
        return Decimal::ZERO;
    };
    if now >= ends {
        return dec!(100);
    }
    let Some(started) = trial_started_at else {
        return Decimal::ZERO;
    };
    let total_seconds = (ends - started).whole_seconds();
    if total_seconds <= 0 {
        return Decimal::ZERO;
    }
    let elapsed_seconds = (now - started).whole_seconds().max(0);
    (Decimal::from(elapsed_seconds) / Decimal::from(total_seconds) * dec!(100))
        .clamp(Decimal::ZERO, dec!(100))
}
