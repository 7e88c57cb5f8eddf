//! Append-only credit ledger read path
//!
//! Ledger entries are written exclusively by the atomic credit procedures;
//! this reader only normalizes them for audit display. Reads are
//! best-effort: a missing relation or a failed query degrades to an empty
//! list instead of blocking the page.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::account::{decimal_or_zero, CreditPool};
use crate::error::is_missing_relation;

/// Default page size for ledger display
const DEFAULT_ENTRY_LIMIT: i64 = 15;
/// Hard bounds on a caller-supplied limit
const MIN_ENTRY_LIMIT: i64 = 1;
const MAX_ENTRY_LIMIT: i64 = 100;

/// Kind of ledger movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Debit,
    Credit,
    Adjustment,
}

impl LedgerEntryType {
    /// Anything unrecognized renders as an adjustment; the ledger is a
    /// display path and must show whatever the store holds.
    fn parse_lossy(s: &str) -> Self {
        match s {
            "debit" => LedgerEntryType::Debit,
            "credit" => LedgerEntryType::Credit,
            _ => LedgerEntryType::Adjustment,
        }
    }
}

/// One immutable ledger event, normalized for display
#[derive(Debug, Clone, Serialize)]
pub struct CreditLedgerEntry {
    pub id: Uuid,
    pub entry_type: LedgerEntryType,
    /// `None` when the stored pool tag is unrecognized.
    pub credit_pool: Option<CreditPool>,
    pub credits_delta: Decimal,
    /// Materialized pool total at the time the entry was written.
    pub balance_after: Decimal,
    pub reason: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: OffsetDateTime,
}

/// Reader over the append-only usage/credit ledger
pub struct LedgerReader {
    pool: PgPool,
}

impl LedgerReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest-first ledger entries for an organization.
    ///
    /// `limit` is clamped to [1, 100]; absent means 15.
    pub async fn recent_entries(
        &self,
        organization_id: Uuid,
        limit: Option<i64>,
    ) -> Vec<CreditLedgerEntry> {
        let limit = effective_limit(limit);

        let rows = sqlx::query(
            r#"
            SELECT id, entry_type, credit_pool, credits_delta, balance_after,
                   reason, metadata, created_at
            FROM credit_ledger
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        match rows {
            Ok(rows) => rows.iter().filter_map(normalize_entry).collect(),
            Err(ref err) if is_missing_relation(err) => {
                tracing::debug!(
                    org_id = %organization_id,
                    "credit ledger relation not provisioned yet, returning empty history"
                );
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(
                    org_id = %organization_id,
                    error = %err,
                    "credit ledger read failed, returning empty history"
                );
                Vec::new()
            }
        }
    }
}

/// Clamp a caller-supplied page size to the hard bounds.
pub(crate) fn effective_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_ENTRY_LIMIT)
        .clamp(MIN_ENTRY_LIMIT, MAX_ENTRY_LIMIT)
}

/// Coerce one stored row into a display entry. Numerics default to zero and
/// metadata to an empty object; a row without a usable id or timestamp is
/// dropped rather than crashing the page.
fn normalize_entry(row: &PgRow) -> Option<CreditLedgerEntry> {
    let id: Uuid = row.try_get("id").ok()?;
    let created_at: OffsetDateTime = row.try_get("created_at").ok()?;

    let entry_type = row
        .try_get::<Option<String>, _>("entry_type")
        .ok()
        .flatten()
        .map(|s| LedgerEntryType::parse_lossy(&s))
        .unwrap_or(LedgerEntryType::Adjustment);

    let credit_pool = row
        .try_get::<Option<String>, _>("credit_pool")
        .ok()
        .flatten()
        .as_deref()
        .and_then(CreditPool::parse);

    Some(CreditLedgerEntry {
        id,
        entry_type,
        credit_pool,
        credits_delta: decimal_or_zero(row, "credits_delta"),
        balance_after: decimal_or_zero(row, "balance_after"),
        reason: row.try_get::<Option<String>, _>("reason").ok().flatten(),
        metadata: row
            .try_get::<Option<serde_json::Value>, _>("metadata")
            .ok()
            .flatten()
            .unwrap_or_else(|| serde_json::json!({})),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(effective_limit(None), 15);
        assert_eq!(effective_limit(Some(1)), 1);
        assert_eq!(effective_limit(Some(100)), 100);
        assert_eq!(effective_limit(Some(0)), 1);
        assert_eq!(effective_limit(Some(-20)), 1);
        assert_eq!(effective_limit(Some(5000)), 100);
    }

    #[test]
    fn unknown_entry_types_render_as_adjustments() {
        assert_eq!(LedgerEntryType::parse_lossy("debit"), LedgerEntryType::Debit);
        assert_eq!(
            LedgerEntryType::parse_lossy("credit"),
            LedgerEntryType::Credit
        );
        assert_eq!(
            LedgerEntryType::parse_lossy("chargeback"),
            LedgerEntryType::Adjustment
        );
    }
}
