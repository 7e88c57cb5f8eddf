// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Leadline Billing Entitlement & Credit Ledger Engine
//!
//! Decides, for any organization at any instant, whether paid usage is
//! permitted, which credit pool funds it, what a unit of AI usage costs in
//! credits, and when a workspace must degrade to billing-only mode.
//!
//! ## Components
//!
//! - **Cost estimation**: token usage to credit cost, rounded up to tenths
//! - **Pool policy**: pure allow/deny predicates over account fields
//! - **Snapshot builder**: canonical entitlement view derived from a stored
//!   account row and the current instant
//! - **Ledger reader**: best-effort read path over the append-only ledger
//! - **Entitlement resolver & guard**: the choke point before billable work
//! - **Checkout mapping**: result mapping over the external simulated
//!   payment procedures
//! - **Sidebar progress**: percentages and the low-credit warning
//!
//! Everything except the resolver, ledger reader, and checkout client is a
//! stateless, synchronous computation over already-fetched data; nothing in
//! this crate writes to the store.

pub mod account;
pub mod checkout;
pub mod cost;
pub mod entitlement;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod progress;
pub mod snapshot;


// Account
pub use account::{BillingAccount, CreditPool, LockReason, MembershipState};

// Checkout
pub use checkout::{map_checkout_payload, CheckoutOutcome, CheckoutService};

// Cost
pub use cost::{period_usage_cost, total_tokens_credit_cost, usage_credit_cost, TokenUsage};

// Entitlement
pub use entitlement::{EntitlementService, UsageEntitlement};

// Error
pub use error::{is_missing_relation, BillingError, BillingResult};

// Ledger
pub use ledger::{CreditLedgerEntry, LedgerEntryType, LedgerReader};

// Policy
pub use policy::{
    calculate_credit_progress, is_topup_allowed, is_usage_allowed, CREDIT_POOL_PRIORITY,
};

// Progress
pub use progress::{
    is_low_credit_warning_visible, sidebar_progress, SidebarProgress,
    LOW_CREDIT_WARNING_THRESHOLD,
};

// Snapshot
pub use snapshot::{build_snapshot, BillingSnapshot, CreditWindow, PackageStatus, TrialStatus};

use sqlx::PgPool;

/// Main billing service combining the engine's read paths and the
/// simulated-checkout mapping
pub struct BillingService {
    pub entitlement: EntitlementService,
    pub ledger: LedgerReader,
    pub checkout: CheckoutService,
}

impl BillingService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            entitlement: EntitlementService::new(pool.clone()),
            ledger: LedgerReader::new(pool.clone()),
            checkout: CheckoutService::new(pool),
        }
    }
}
