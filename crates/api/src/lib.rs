// Test code patterns:
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Leadline API Library
//!
//! HTTP surface for the billing entitlement engine: snapshot, ledger,
//! sidebar progress, simulated checkout, and the workspace access gate.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod workspace;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
pub use workspace::{AccessMode, WorkspaceAccessState};
