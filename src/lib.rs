//! Intake wizard: multi-step registration forms with per-section
//! validation and a single submission to an intake endpoint.

pub mod config;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod notify;
pub mod render;
pub mod session;
pub mod wizard;
