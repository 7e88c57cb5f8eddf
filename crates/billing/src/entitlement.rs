//! Usage entitlement resolution and the usage guard
//!
//! The single choke point in front of billable work: every credit-consuming
//! operation calls `assert_usage_allowed` before it spends anything. Store
//! problems degrade to a permissive entitlement; a billing-read failure
//! must never deny access to a paying customer.

use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::account::{fetch_billing_account, LockReason, MembershipState};
use crate::error::{is_missing_relation, BillingError, BillingResult};
use crate::snapshot::{build_snapshot, BillingSnapshot};

/// Resolved entitlement for one organization at one instant
#[derive(Debug, Clone, Serialize)]
pub struct UsageEntitlement {
    pub is_usage_allowed: bool,
    pub lock_reason: Option<LockReason>,
    pub membership_state: Option<MembershipState>,
    pub snapshot: Option<BillingSnapshot>,
}

impl UsageEntitlement {
    /// Permissive entitlement for organizations the billing store does not
    /// know yet. New tenants must never be blocked by this subsystem.
    pub fn fallback_allowed() -> Self {
        Self {
            is_usage_allowed: true,
            lock_reason: None,
            membership_state: None,
            snapshot: None,
        }
    }

    pub fn from_snapshot(snapshot: BillingSnapshot) -> Self {
        Self {
            is_usage_allowed: snapshot.is_usage_allowed,
            lock_reason: snapshot.lock_reason,
            membership_state: Some(snapshot.membership_state),
            snapshot: Some(snapshot),
        }
    }
}

/// Entitlement resolver and usage guard
pub struct EntitlementService {
    pool: PgPool,
}

impl EntitlementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the current entitlement for an organization.
    ///
    /// Three degradation branches, kept deliberately separate:
    /// - no account row: the tenant is not provisioned for billing yet;
    /// - missing relation: the store itself is not provisioned yet;
    /// - genuine store failure: logged, then permissive.
    pub async fn resolve_usage_entitlement(&self, organization_id: Uuid) -> UsageEntitlement {
        match fetch_billing_account(&self.pool, organization_id).await {
            Ok(Some(account)) => {
                UsageEntitlement::from_snapshot(build_snapshot(&account, OffsetDateTime::now_utc()))
            }
            Ok(None) => {
                tracing::debug!(
                    org_id = %organization_id,
                    "no billing account row, using permissive entitlement"
                );
                UsageEntitlement::fallback_allowed()
            }
            Err(ref err) if is_missing_relation(err) => {
                tracing::debug!(
                    org_id = %organization_id,
                    "billing_accounts relation not provisioned yet, using permissive entitlement"
                );
                UsageEntitlement::fallback_allowed()
            }
            Err(err) => {
                tracing::warn!(
                    org_id = %organization_id,
                    error = %err,
                    "billing account read failed, degrading to permissive entitlement"
                );
                UsageEntitlement::fallback_allowed()
            }
        }
    }

    /// Guard for billable work.
    ///
    /// Returns the resolved entitlement when usage is permitted, a typed
    /// lock error otherwise.
    pub async fn assert_usage_allowed(
        &self,
        organization_id: Uuid,
    ) -> BillingResult<UsageEntitlement> {
        let entitlement = self.resolve_usage_entitlement(organization_id).await;
        if entitlement.is_usage_allowed {
            Ok(entitlement)
        } else {
            tracing::info!(
                org_id = %organization_id,
                lock_reason = ?entitlement.lock_reason,
                membership_state = ?entitlement.membership_state,
                "usage denied"
            );
            Err(BillingError::UsageLocked {
                lock_reason: entitlement.lock_reason,
                membership_state: entitlement.membership_state,
            })
        }
    }
}
