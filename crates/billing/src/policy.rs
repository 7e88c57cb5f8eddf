//! Credit pool policy predicates
//!
//! Pure, stateless functions shared by the snapshot builder and directly
//! testable on their own. The snapshot builder applies the lock-reason
//! precedence on top of these.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::OffsetDateTime;

use crate::account::{CreditPool, MembershipState};

/// Pool drawdown order for paid accounts: the monthly package is consumed
/// before top-up balance. The precedence rule lives in this list, not in
/// scattered branches; a future pool is one more entry.
pub const CREDIT_POOL_PRIORITY: [CreditPool; 2] =
    [CreditPool::PackagePool, CreditPool::TopupPool];

/// Whether paid usage is permitted given the raw account fields.
///
/// The trial time bound is strict: at the exact expiry instant the trial is
/// already over, matching the snapshot builder's precedence rule.
pub fn is_usage_allowed(
    state: MembershipState,
    remaining_trial_credits: Decimal,
    trial_ends_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
    remaining_package_credits: Decimal,
    topup_credits: Decimal,
) -> bool {
    match state {
        MembershipState::AdminLocked
        | MembershipState::PastDue
        | MembershipState::Canceled
        | MembershipState::TrialExhausted => false,
        MembershipState::TrialActive => {
            remaining_trial_credits > Decimal::ZERO
                && trial_ends_at.is_some_and(|ends| now < ends)
        }
        MembershipState::PremiumActive => {
            remaining_package_credits > Decimal::ZERO || topup_credits > Decimal::ZERO
        }
    }
}

/// Whether a top-up purchase may be offered.
///
/// Top-ups exist only to extend an already-paying account past its monthly
/// package; they are never offered during trial or to locked states.
pub fn is_topup_allowed(state: MembershipState, remaining_package_credits: Decimal) -> bool {
    state == MembershipState::PremiumActive && remaining_package_credits <= Decimal::ZERO
}

/// Used-credit share as a percentage, clamped to [0, 100].
pub fn calculate_credit_progress(limit: Decimal, used: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (used / limit * dec!(100)).clamp(Decimal::ZERO, dec!(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_760_000_000).unwrap()
    }

    #[test]
    fn locked_states_never_allow_usage() {
        for state in [
            MembershipState::AdminLocked,
            MembershipState::PastDue,
            MembershipState::Canceled,
            MembershipState::TrialExhausted,
        ] {
            assert!(!is_usage_allowed(
                state,
                dec!(100),
                Some(now() + Duration::days(7)),
                now(),
                dec!(100),
                dec!(100),
            ));
        }
    }

    #[test]
    fn trial_needs_credits_and_time() {
        let ends = Some(now() + Duration::days(7));
        let trial = MembershipState::TrialActive;

        assert!(is_usage_allowed(trial, dec!(1), ends, now(), dec!(0), dec!(0)));
        // No credits left
        assert!(!is_usage_allowed(trial, dec!(0), ends, now(), dec!(0), dec!(0)));
        // No trial end recorded
        assert!(!is_usage_allowed(trial, dec!(1), None, now(), dec!(0), dec!(0)));
        // Exactly at expiry the trial is over
        assert!(!is_usage_allowed(trial, dec!(1), Some(now()), now(), dec!(0), dec!(0)));
    }

    #[test]
    fn premium_runs_on_package_or_topup() {
        let premium = MembershipState::PremiumActive;
        assert!(is_usage_allowed(premium, dec!(0), None, now(), dec!(5), dec!(0)));
        assert!(is_usage_allowed(premium, dec!(0), None, now(), dec!(0), dec!(7.5)));
        assert!(!is_usage_allowed(premium, dec!(0), None, now(), dec!(0), dec!(0)));
    }

    #[test]
    fn topup_only_for_premium_with_exhausted_package() {
        assert!(is_topup_allowed(MembershipState::PremiumActive, dec!(0)));
        assert!(is_topup_allowed(MembershipState::PremiumActive, dec!(-3)));
        assert!(!is_topup_allowed(MembershipState::PremiumActive, dec!(0.1)));
        assert!(!is_topup_allowed(MembershipState::TrialActive, dec!(0)));
        assert!(!is_topup_allowed(MembershipState::PastDue, dec!(0)));
        assert!(!is_topup_allowed(MembershipState::AdminLocked, dec!(0)));
    }

    #[test]
    fn credit_progress_stays_in_bounds() {
        assert_eq!(calculate_credit_progress(dec!(0), dec!(50)), dec!(0));
        assert_eq!(calculate_credit_progress(dec!(-10), dec!(50)), dec!(0));
        assert_eq!(calculate_credit_progress(dec!(100), dec!(0)), dec!(0));
        assert_eq!(calculate_credit_progress(dec!(100), dec!(25)), dec!(25));
        assert_eq!(calculate_credit_progress(dec!(100), dec!(100)), dec!(100));
        // Used beyond the limit clamps instead of exceeding 100
        assert_eq!(calculate_credit_progress(dec!(100), dec!(250)), dec!(100));
    }

    #[test]
    fn package_pool_outranks_topup_pool() {
        assert_eq!(
            CREDIT_POOL_PRIORITY,
            [CreditPool::PackagePool, CreditPool::TopupPool]
        );
    }
}
