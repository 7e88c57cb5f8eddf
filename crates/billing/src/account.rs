//! Billing account storage row
//!
//! One row per organization, mutated only by the external atomic credit
//! procedures or by administrative action. This crate treats it as
//! read-only input to snapshot derivation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

/// Top-level lifecycle stage of an organization's subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    TrialActive,
    TrialExhausted,
    PremiumActive,
    PastDue,
    Canceled,
    AdminLocked,
}

impl MembershipState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipState::TrialActive => "trial_active",
            MembershipState::TrialExhausted => "trial_exhausted",
            MembershipState::PremiumActive => "premium_active",
            MembershipState::PastDue => "past_due",
            MembershipState::Canceled => "canceled",
            MembershipState::AdminLocked => "admin_locked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trial_active" => Some(MembershipState::TrialActive),
            "trial_exhausted" => Some(MembershipState::TrialExhausted),
            "premium_active" => Some(MembershipState::PremiumActive),
            "past_due" => Some(MembershipState::PastDue),
            "canceled" => Some(MembershipState::Canceled),
            "admin_locked" => Some(MembershipState::AdminLocked),
            _ => None,
        }
    }
}

impl std::fmt::Display for MembershipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical explanation for why usage is currently disallowed.
///
/// The stored `lock_reason` column uses the same vocabulary plus `none`;
/// `none` and anything unrecognized parse to `None` because the column is
/// advisory and the snapshot builder recomputes the real reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    SubscriptionRequired,
    TrialTimeExpired,
    PackageCreditsExhausted,
    PastDue,
    AdminLocked,
}

impl LockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockReason::SubscriptionRequired => "subscription_required",
            LockReason::TrialTimeExpired => "trial_time_expired",
            LockReason::PackageCreditsExhausted => "package_credits_exhausted",
            LockReason::PastDue => "past_due",
            LockReason::AdminLocked => "admin_locked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "subscription_required" => Some(LockReason::SubscriptionRequired),
            "trial_time_expired" => Some(LockReason::TrialTimeExpired),
            "package_credits_exhausted" => Some(LockReason::PackageCreditsExhausted),
            "past_due" => Some(LockReason::PastDue),
            "admin_locked" => Some(LockReason::AdminLocked),
            _ => None,
        }
    }
}

impl std::fmt::Display for LockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the independent credit buckets that can fund usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPool {
    TrialPool,
    PackagePool,
    TopupPool,
}

impl CreditPool {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditPool::TrialPool => "trial_pool",
            CreditPool::PackagePool => "package_pool",
            CreditPool::TopupPool => "topup_pool",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trial_pool" => Some(CreditPool::TrialPool),
            "package_pool" => Some(CreditPool::PackagePool),
            "topup_pool" => Some(CreditPool::TopupPool),
            _ => None,
        }
    }
}

impl std::fmt::Display for CreditPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted billing account row
#[derive(Debug, Clone)]
pub struct BillingAccount {
    pub organization_id: Uuid,
    pub membership_state: MembershipState,
    /// Advisory only, written by out-of-band processes. The snapshot
    /// builder recomputes the canonical reason and never copies this.
    pub stored_lock_reason: Option<LockReason>,
    pub trial_started_at: Option<OffsetDateTime>,
    pub trial_ends_at: Option<OffsetDateTime>,
    pub trial_credit_limit: Decimal,
    pub trial_credit_used: Decimal,
    pub current_period_start: Option<OffsetDateTime>,
    pub current_period_end: Option<OffsetDateTime>,
    pub monthly_package_credit_limit: Decimal,
    pub monthly_package_credit_used: Decimal,
    pub topup_credit_balance: Decimal,
    pub premium_assigned_at: Option<OffsetDateTime>,
    pub last_manual_action_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl FromRow<'_, PgRow> for BillingAccount {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let state_raw: String = row.try_get("membership_state")?;
        // The membership state feeds a decision, not a display: an
        // unrecognized value is a decode error, which the resolver then
        // degrades permissively and logs.
        let membership_state =
            MembershipState::parse(&state_raw).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "membership_state".into(),
                source: format!("unknown membership state '{state_raw}'").into(),
            })?;

        let stored_lock_reason = row
            .try_get::<Option<String>, _>("lock_reason")
            .ok()
            .flatten()
            .as_deref()
            .and_then(LockReason::parse);

        Ok(Self {
            organization_id: row.try_get("organization_id")?,
            membership_state,
            stored_lock_reason,
            trial_started_at: instant_or_none(row, "trial_started_at"),
            trial_ends_at: instant_or_none(row, "trial_ends_at"),
            trial_credit_limit: decimal_or_zero(row, "trial_credit_limit"),
            trial_credit_used: decimal_or_zero(row, "trial_credit_used"),
            current_period_start: instant_or_none(row, "current_period_start"),
            current_period_end: instant_or_none(row, "current_period_end"),
            monthly_package_credit_limit: decimal_or_zero(row, "monthly_package_credit_limit"),
            monthly_package_credit_used: decimal_or_zero(row, "monthly_package_credit_used"),
            topup_credit_balance: decimal_or_zero(row, "topup_credit_balance"),
            premium_assigned_at: instant_or_none(row, "premium_assigned_at"),
            last_manual_action_at: instant_or_none(row, "last_manual_action_at"),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Coercing numeric read: a missing or undecodable credit quantity renders
/// as zero rather than failing the whole row.
pub(crate) fn decimal_or_zero(row: &PgRow, column: &str) -> Decimal {
    row.try_get::<Option<Decimal>, _>(column)
        .ok()
        .flatten()
        .unwrap_or(Decimal::ZERO)
}

fn instant_or_none(row: &PgRow, column: &str) -> Option<OffsetDateTime> {
    row.try_get::<Option<OffsetDateTime>, _>(column)
        .ok()
        .flatten()
}

/// Fetch the billing account row for an organization, if provisioned.
///
/// Returns the raw store error so callers can distinguish a missing
/// relation from a genuine failure.
pub async fn fetch_billing_account(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Option<BillingAccount>, sqlx::Error> {
    sqlx::query_as::<_, BillingAccount>(
        r#"
        SELECT organization_id, membership_state, lock_reason,
               trial_started_at, trial_ends_at,
               trial_credit_limit, trial_credit_used,
               current_period_start, current_period_end,
               monthly_package_credit_limit, monthly_package_credit_used,
               topup_credit_balance,
               premium_assigned_at, last_manual_action_at,
               created_at, updated_at
        FROM billing_accounts
        WHERE organization_id = $1
        "#,
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_state_round_trips() {
        for state in [
            MembershipState::TrialActive,
            MembershipState::TrialExhausted,
            MembershipState::PremiumActive,
            MembershipState::PastDue,
            MembershipState::Canceled,
            MembershipState::AdminLocked,
        ] {
            assert_eq!(MembershipState::parse(state.as_str()), Some(state));
        }
        assert_eq!(MembershipState::parse("free"), None);
    }

    #[test]
    fn stored_none_lock_reason_parses_to_none() {
        assert_eq!(LockReason::parse("none"), None);
        assert_eq!(LockReason::parse(""), None);
        assert_eq!(
            LockReason::parse("trial_time_expired"),
            Some(LockReason::TrialTimeExpired)
        );
    }

    #[test]
    fn credit_pool_round_trips() {
        for pool in [
            CreditPool::TrialPool,
            CreditPool::PackagePool,
            CreditPool::TopupPool,
        ] {
            assert_eq!(CreditPool::parse(pool.as_str()), Some(pool));
        }
        assert_eq!(CreditPool::parse("bonus_pool"), None);
    }
}
