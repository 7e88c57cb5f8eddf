//! Sidebar credit progress numbers
//!
//! Turns a snapshot into what the workspace sidebar renders: one overall
//! remaining-credit bar, a package/top-up split for the two-segment bar,
//! and the low-credit warning flag.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::account::MembershipState;
use crate::snapshot::BillingSnapshot;

/// Warn below this remaining percentage
pub const LOW_CREDIT_WARNING_THRESHOLD: Decimal = dec!(10);

/// Progress numbers for the sidebar credit bar
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SidebarProgress {
    /// Overall remaining share, 0-100
    pub percent: Decimal,
    pub package_percent: Decimal,
    pub topup_percent: Decimal,
    pub low_credit_warning: bool,
}

/// Compute the sidebar numbers for one snapshot.
pub fn sidebar_progress(snapshot: &BillingSnapshot) -> SidebarProgress {
    let percent = overall_percent(snapshot);
    let (package_percent, topup_percent) = segments(snapshot, percent);
    SidebarProgress {
        percent,
        package_percent,
        topup_percent,
        low_credit_warning: is_low_credit_warning_visible(percent, LOW_CREDIT_WARNING_THRESHOLD),
    }
}

/// Exclusive at both boundaries: exactly 0 is a lock state, not a warning,
/// and exactly the threshold does not warn either.
pub fn is_low_credit_warning_visible(percent: Decimal, threshold: Decimal) -> bool {
    percent > Decimal::ZERO && percent < threshold
}

fn overall_percent(snapshot: &BillingSnapshot) -> Decimal {
    match snapshot.membership_state {
        MembershipState::TrialActive | MembershipState::TrialExhausted => remaining_percent(
            snapshot.trial.credits.remaining,
            snapshot.trial.credits.limit,
        ),
        _ => {
            let package = &snapshot.package.credits;
            remaining_percent(
                package.remaining + snapshot.topup_balance,
                package.limit + snapshot.topup_balance,
            )
        }
    }
}

fn remaining_percent(remaining: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (remaining / total * dec!(100)).clamp(Decimal::ZERO, dec!(100))
}

/// Split the overall percent between the package and top-up remainders for
/// the two-segment bar. Trial states render a single package-only segment.
fn segments(snapshot: &BillingSnapshot, overall: Decimal) -> (Decimal, Decimal) {
    match snapshot.membership_state {
        MembershipState::TrialActive | MembershipState::TrialExhausted => {
            (overall, Decimal::ZERO)
        }
        _ => {
            let package_remaining = snapshot.package.credits.remaining.max(Decimal::ZERO);
            let topup_remaining = snapshot.topup_balance.max(Decimal::ZERO);
            let total_remaining = package_remaining + topup_remaining;
            if total_remaining <= Decimal::ZERO {
                return (Decimal::ZERO, Decimal::ZERO);
            }
            let package_percent = overall * package_remaining / total_remaining;
            (package_percent, overall - package_percent)
        }
    }
}
