//! Hosting: per-visitor wizard sessions and the HTTP surface over them.

pub mod registry;
pub mod routes;

pub use registry::{FlowSummary, SessionInfo, SessionRegistry, spawn_sweep_task};
pub use routes::wizard_routes;
