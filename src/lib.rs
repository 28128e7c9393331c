//! Smart predictive maintenance dashboard service.
//!
//! Simulated temperature and vibration telemetry for a handful of machines,
//! a heuristic failure-risk score, derived alerts, and the session-scoped
//! acknowledge / schedule / repair / approve workflow of three personas
//! (Operator, Maintenance, Supervisor), served as JSON and CSV over HTTP.
//!
//! This crate follows the Explicit Module Boundary Pattern (EMBP): routes
//! only know about what this gateway re-exports, not about sibling modules.

pub mod config;
pub mod dashboard;
pub mod export;
pub mod models;
pub mod risk;
pub mod routes;
pub mod session;
pub mod simulator;
pub mod tickets;

pub use config::Config;

// Re-exported for routes/*.rs so they only depend on the crate root.
pub use dashboard::{Dashboard, Snapshot};
pub use models::Role;
pub use session::{Action, ActionContext, DashboardError, Outcome, SessionStore};
