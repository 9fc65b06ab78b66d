//! fraudserve Server
//!
//! HTTP shell around the model service: configuration, routes, logging
//! and Prometheus metrics.

pub mod config;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::{Cli, LogFormat, ServerConfig};
pub use routes::create_router;
pub use state::AppState;
