//! Billing error types

use thiserror::Error;

use crate::account::{LockReason, MembershipState};

/// Postgres error code for `undefined_table`
const PG_UNDEFINED_TABLE: &str = "42P01";

/// Errors produced by the billing engine
#[derive(Debug, Error)]
pub enum BillingError {
    /// Usage is not permitted for this organization. Carries the canonical
    /// lock state so callers can branch without string matching.
    #[error("usage locked (reason: {lock_reason:?}, state: {membership_state:?})")]
    UsageLocked {
        lock_reason: Option<LockReason>,
        membership_state: Option<MembershipState>,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The external checkout procedure returned something outside its
    /// `{status, reason}` contract.
    #[error("malformed checkout payload: {0}")]
    MalformedCheckoutPayload(String),
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::Database(err.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;

/// True when a store error means the backing relation has not been
/// provisioned yet (boot-time or not-yet-migrated tenants). Callers degrade
/// to permissive defaults instead of surfacing a false lock.
pub fn is_missing_relation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(PG_UNDEFINED_TABLE),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_not_missing_relation() {
        assert!(!is_missing_relation(&sqlx::Error::RowNotFound));
        assert!(!is_missing_relation(&sqlx::Error::PoolTimedOut));
        assert!(!is_missing_relation(&sqlx::Error::WorkerCrashed));
    }

    #[test]
    fn usage_locked_carries_structured_state() {
        let err = BillingError::UsageLocked {
            lock_reason: Some(LockReason::PastDue),
            membership_state: Some(MembershipState::PastDue),
        };
        match err {
            BillingError::UsageLocked {
                lock_reason,
                membership_state,
            } => {
                assert_eq!(lock_reason, Some(LockReason::PastDue));
                assert_eq!(membership_state, Some(MembershipState::PastDue));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
