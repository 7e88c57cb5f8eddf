//! Billing routes
//!
//! Read endpoints surface the entitlement snapshot, ledger history, and
//! sidebar progress; the checkout endpoints forward to the simulated
//! payment procedures and return their mapped outcome.

use axum::extract::{Path, Query, Request, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use leadline_billing::{
    sidebar_progress, CheckoutOutcome, CreditLedgerEntry, SidebarProgress, UsageEntitlement,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::workspace::{
    access_state, default_nav_items, resolve_nav_items, NavItem, WorkspaceAccessState,
};

/// Query parameters for ledger reads
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<i64>,
}

/// Request body for a top-up checkout
#[derive(Debug, Deserialize)]
pub struct TopupRequest {
    pub credits: Decimal,
}

/// Entitlement plus access mode, as consumed by the dashboard shell
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    #[serde(flatten)]
    pub entitlement: UsageEntitlement,
    pub access: WorkspaceAccessState,
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<SnapshotResponse>> {
    let entitlement = state
        .billing
        .entitlement
        .resolve_usage_entitlement(org_id)
        .await;
    let access = access_state(Some(&entitlement));
    Ok(Json(SnapshotResponse {
        entitlement,
        access,
    }))
}

pub async fn get_ledger(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<Json<Vec<CreditLedgerEntry>>> {
    Ok(Json(
        state.billing.ledger.recent_entries(org_id, query.limit).await,
    ))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<SidebarProgress>> {
    let entitlement = state
        .billing
        .entitlement
        .resolve_usage_entitlement(org_id)
        .await;
    let snapshot = entitlement.snapshot.as_ref().ok_or_else(|| {
        ApiError::NotFound(format!("no billing account for organization {org_id}"))
    })?;
    Ok(Json(sidebar_progress(snapshot)))
}

pub async fn get_nav(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Vec<NavItem>>> {
    let entitlement = state
        .billing
        .entitlement
        .resolve_usage_entitlement(org_id)
        .await;
    let access = access_state(Some(&entitlement));
    let locale = &state.config.default_locale;
    Ok(Json(resolve_nav_items(
        default_nav_items(locale),
        access,
        locale,
    )))
}

pub async fn checkout_subscribe(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<CheckoutOutcome>> {
    Ok(Json(state.billing.checkout.subscribe(org_id).await?))
}

pub async fn checkout_topup(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(request): Json<TopupRequest>,
) -> ApiResult<Json<CheckoutOutcome>> {
    Ok(Json(
        state.billing.checkout.topup(org_id, request.credits).await?,
    ))
}

/// Response for the workspace shell stand-in
#[derive(Debug, Serialize)]
pub struct WorkspaceShellResponse {
    pub path: String,
    pub access: WorkspaceAccessState,
}

/// Stand-in for the server-rendered workspace shell.
///
/// The access gate middleware has already resolved the entitlement (and
/// redirected if the workspace is locked); this handler reuses the
/// request-scoped copy instead of fetching again.
pub async fn workspace_shell(
    Path(path): Path<String>,
    request: Request,
) -> Json<WorkspaceShellResponse> {
    let access = access_state(request.extensions().get::<UsageEntitlement>());
    Json(WorkspaceShellResponse { path, access })
}
