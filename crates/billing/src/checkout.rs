//! Simulated-payment checkout mapping
//!
//! The balance-mutating work lives in external atomic procedures
//! (`mock_checkout_subscribe`, `mock_checkout_topup`). This service invokes
//! them by name and maps their `{status, reason}` payload onto a closed
//! outcome enum; it never computes or applies a credit delta itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};

/// Closed result vocabulary of the external checkout procedures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Success,
    Failed,
    Blocked { reason: Option<String> },
    Error { message: Option<String> },
}

#[derive(Debug, Deserialize)]
struct CheckoutPayload {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Client for the simulated subscribe/top-up procedures
pub struct CheckoutService {
    pool: PgPool,
}

impl CheckoutService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the simulated subscribe flow for an organization.
    pub async fn subscribe(&self, organization_id: Uuid) -> BillingResult<CheckoutOutcome> {
        let payload: serde_json::Value = sqlx::query_scalar("SELECT mock_checkout_subscribe($1)")
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await?;

        let outcome = map_checkout_payload(&payload)?;
        tracing::info!(
            org_id = %organization_id,
            outcome = ?outcome,
            "simulated subscribe checkout completed"
        );
        Ok(outcome)
    }

    /// Run the simulated top-up flow.
    ///
    /// `credits` must be positive; whether the account may top up at all is
    /// the procedure's decision, surfaced as a `Blocked` outcome.
    pub async fn topup(
        &self,
        organization_id: Uuid,
        credits: Decimal,
    ) -> BillingResult<CheckoutOutcome> {
        if credits <= Decimal::ZERO {
            return Err(BillingError::InvalidRequest(
                "top-up amount must be positive".to_string(),
            ));
        }

        let payload: serde_json::Value = sqlx::query_scalar("SELECT mock_checkout_topup($1, $2)")
            .bind(organization_id)
            .bind(credits)
            .fetch_one(&self.pool)
            .await?;

        let outcome = map_checkout_payload(&payload)?;
        tracing::info!(
            org_id = %organization_id,
            credits = %credits,
            outcome = ?outcome,
            "simulated top-up checkout completed"
        );
        Ok(outcome)
    }
}

/// Map the procedure's JSON payload onto the closed outcome enum.
///
/// An unrecognized status is reported as an error outcome, never invented
/// into a success or a lock.
pub fn map_checkout_payload(payload: &serde_json::Value) -> BillingResult<CheckoutOutcome> {
    let parsed: CheckoutPayload = serde_json::from_value(payload.clone())
        .map_err(|err| BillingError::MalformedCheckoutPayload(err.to_string()))?;

    Ok(match parsed.status.as_str() {
        "success" => CheckoutOutcome::Success,
        "failed" => CheckoutOutcome::Failed,
        "blocked" => CheckoutOutcome::Blocked {
            reason: parsed.reason,
        },
        "error" => CheckoutOutcome::Error {
            message: parsed.reason,
        },
        other => CheckoutOutcome::Error {
            message: Some(format!("unrecognized checkout status '{other}'")),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_the_closed_status_vocabulary() {
        assert_eq!(
            map_checkout_payload(&json!({"status": "success"})).unwrap(),
            CheckoutOutcome::Success
        );
        assert_eq!(
            map_checkout_payload(&json!({"status": "failed"})).unwrap(),
            CheckoutOutcome::Failed
        );
        assert_eq!(
            map_checkout_payload(&json!({"status": "blocked", "reason": "subscription_required"}))
                .unwrap(),
            CheckoutOutcome::Blocked {
                reason: Some("subscription_required".to_string())
            }
        );
        assert_eq!(
            map_checkout_payload(&json!({"status": "error", "reason": "ledger write failed"}))
                .unwrap(),
            CheckoutOutcome::Error {
                message: Some("ledger write failed".to_string())
            }
        );
    }

    #[test]
    fn blocked_without_reason_is_still_blocked() {
        assert_eq!(
            map_checkout_payload(&json!({"status": "blocked"})).unwrap(),
            CheckoutOutcome::Blocked { reason: None }
        );
    }

    #[test]
    fn unknown_status_becomes_an_error_outcome() {
        let outcome = map_checkout_payload(&json!({"status": "maybe"})).unwrap();
        match outcome {
            CheckoutOutcome::Error { message } => {
                assert!(message.unwrap().contains("maybe"));
            }
            other => panic!("expected error outcome, got {other:?}"),
        }
    }

    #[test]
    fn payload_outside_the_contract_is_rejected() {
        assert!(map_checkout_payload(&json!({"ok": true})).is_err());
        assert!(map_checkout_payload(&json!(42)).is_err());
    }
}
