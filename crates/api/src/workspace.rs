//! Workspace access gate
//!
//! Maps a resolved entitlement to a UI access mode and enforces the
//! billing-only redirect for locked workspaces. Path helpers tolerate a
//! leading locale segment so matching works on localized URLs.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use leadline_billing::{LockReason, UsageEntitlement};

use crate::state::AppState;

/// Paths a locked workspace may still reach: exactly the billing/plans
/// settings pages, so a locked tenant can always get to the page that lets
/// it pay.
const BILLING_ONLY_PATH_PREFIXES: [&str; 2] = ["/settings/plans", "/settings/billing"];

/// Generic settings destination, rewritten to the plans page when locked
const SETTINGS_PATH: &str = "/settings";
const PLANS_PATH: &str = "/settings/plans";

/// Header carrying the acting organization, set by the auth layer
pub const ORGANIZATION_HEADER: &str = "x-organization-id";
/// Header set during administrative impersonation; skips the lock entirely
pub const IMPERSONATION_HEADER: &str = "x-admin-impersonation";

/// UI access mode for a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Full,
    BillingOnly,
}

/// Access decision for one workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkspaceAccessState {
    pub is_locked: bool,
    pub mode: AccessMode,
}

impl WorkspaceAccessState {
    pub fn full() -> Self {
        Self {
            is_locked: false,
            mode: AccessMode::Full,
        }
    }

    pub fn billing_only() -> Self {
        Self {
            is_locked: true,
            mode: AccessMode::BillingOnly,
        }
    }
}

/// No entitlement (unprovisioned tenant) or allowed usage means full access.
pub fn access_state(entitlement: Option<&UsageEntitlement>) -> WorkspaceAccessState {
    match entitlement {
        Some(entitlement) if !entitlement.is_usage_allowed => WorkspaceAccessState::billing_only(),
        _ => WorkspaceAccessState::full(),
    }
}

/// Whether a locked workspace may still visit `path`.
pub fn is_billing_only_path(path: &str) -> bool {
    let path = strip_locale(path);
    BILLING_ONLY_PATH_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
    })
}

/// Localized plans-page URL a locked workspace is sent to.
pub fn locked_redirect_target(locale: &str, lock_reason: Option<LockReason>) -> String {
    match lock_reason {
        Some(reason) => format!("/{locale}{PLANS_PATH}?locked=1&reason={}", reason.as_str()),
        None => format!("/{locale}{PLANS_PATH}?locked=1"),
    }
}

/// Inputs for workspace access enforcement
#[derive(Debug, Clone)]
pub struct EnforceAccessParams<'a> {
    pub organization_id: Option<Uuid>,
    pub current_path: &'a str,
    /// Administrative impersonation skips the lock entirely
    pub bypass_lock: bool,
}

/// Decide whether `current_path` must be redirected.
///
/// A no-op when there is no organization, when the lock is bypassed, or
/// when the path is already whitelisted; otherwise returns the redirect
/// target for a locked workspace.
pub fn locked_redirect_for(
    params: &EnforceAccessParams<'_>,
    entitlement: Option<&UsageEntitlement>,
    locale: &str,
) -> Option<String> {
    if params.organization_id.is_none()
        || params.bypass_lock
        || is_billing_only_path(params.current_path)
    {
        return None;
    }
    if !access_state(entitlement).is_locked {
        return None;
    }
    let reason = entitlement.and_then(|entitlement| entitlement.lock_reason);
    Some(locked_redirect_target(locale, reason))
}

/// Route-layer middleware enforcing billing-only mode on workspace pages.
///
/// Resolves the entitlement at most once per request, stashes it in the
/// request extensions for downstream handlers (request-scoped by
/// construction, never a cross-request cache), and redirects locked
/// workspaces to the plans page.
pub async fn enforce_workspace_access(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let organization_id = request
        .headers()
        .get(ORGANIZATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok());
    let bypass_lock = request.headers().contains_key(IMPERSONATION_HEADER);
    let path = request.uri().path().to_string();

    let entitlement = match organization_id {
        Some(org_id) if !bypass_lock && !is_billing_only_path(&path) => {
            Some(state.billing.entitlement.resolve_usage_entitlement(org_id).await)
        }
        _ => None,
    };

    let params = EnforceAccessParams {
        organization_id,
        current_path: &path,
        bypass_lock,
    };
    if let Some(target) = locked_redirect_for(&params, entitlement.as_ref(), &state.config.default_locale)
    {
        tracing::debug!(
            org_id = ?organization_id,
            path = %path,
            target = %target,
            "workspace locked, redirecting to plans page"
        );
        return Redirect::temporary(&target).into_response();
    }

    if let Some(entitlement) = entitlement {
        request.extensions_mut().insert(entitlement);
    }
    next.run(request).await
}

/// One sidebar navigation item as rendered by the workspace shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub key: String,
    pub href: String,
    #[serde(default)]
    pub is_locked: bool,
}

/// Built-in workspace navigation, pre-resolution.
pub fn default_nav_items(locale: &str) -> Vec<NavItem> {
    [
        ("inbox", "/inbox"),
        ("contacts", "/contacts"),
        ("campaigns", "/campaigns"),
        ("settings", "/settings"),
    ]
    .into_iter()
    .map(|(key, path)| NavItem {
        key: key.to_string(),
        href: format!("/{locale}{path}"),
        is_locked: false,
    })
    .collect()
}

/// Resolve nav items against the workspace access state.
///
/// A locked workspace keeps its deep links: a disabled item's href is left
/// unchanged so it works again the moment the workspace unlocks. The
/// generic settings destination is rewritten to the plans page so the only
/// enabled door leads to payment.
pub fn resolve_nav_items(
    items: Vec<NavItem>,
    access: WorkspaceAccessState,
    locale: &str,
) -> Vec<NavItem> {
    if !access.is_locked {
        return items;
    }
    items
        .into_iter()
        .map(|mut item| {
            if is_billing_only_path(&item.href) {
                item.is_locked = false;
            } else if strip_locale(&item.href) == SETTINGS_PATH {
                item.href = format!("/{locale}{PLANS_PATH}");
                item.is_locked = false;
            } else {
                item.is_locked = true;
            }
            item
        })
        .collect()
}

/// Strip a leading locale segment (`/en/inbox` -> `/inbox`). Locales are
/// short alpha segments like `en` or `pt-BR`; anything else is left alone.
fn strip_locale(path: &str) -> &str {
    let Some(rest) = path.strip_prefix('/') else {
        return path;
    };
    let first = rest.split('/').next().unwrap_or(rest);
    if is_locale_segment(first) {
        let stripped = &path[1 + first.len()..];
        if stripped.is_empty() {
            "/"
        } else {
            stripped
        }
    } else {
        path
    }
}

fn is_locale_segment(segment: &str) -> bool {
    match segment.split_once('-') {
        None => segment.len() == 2 && segment.chars().all(|c| c.is_ascii_alphabetic()),
        Some((language, region)) => {
            language.len() == 2
                && region.len() == 2
                && language.chars().all(|c| c.is_ascii_alphabetic())
                && region.chars().all(|c| c.is_ascii_alphabetic())
        }
    }
}
