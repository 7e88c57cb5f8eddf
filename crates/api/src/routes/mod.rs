//! HTTP route registration

pub mod billing;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;
use crate::workspace;

pub fn create_router(state: AppState) -> Router {
    // Workspace shell routes go through the access gate; API routes do not,
    // the billing pages must stay reachable to a locked tenant.
    let workspace_routes = Router::new()
        .route("/workspace/{*path}", get(billing::workspace_shell))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            workspace::enforce_workspace_access,
        ));

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/orgs/{org_id}/billing/snapshot",
            get(billing::get_snapshot),
        )
        .route(
            "/api/orgs/{org_id}/billing/ledger",
            get(billing::get_ledger),
        )
        .route(
            "/api/orgs/{org_id}/billing/progress",
            get(billing::get_progress),
        )
        .route("/api/orgs/{org_id}/billing/nav", get(billing::get_nav))
        .route(
            "/api/orgs/{org_id}/billing/checkout/subscribe",
            post(billing::checkout_subscribe),
        )
        .route(
            "/api/orgs/{org_id}/billing/checkout/topup",
            post(billing::checkout_topup),
        )
        .merge(workspace_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
