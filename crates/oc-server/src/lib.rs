//! # oc-server
//!
//! HTTP surface: the middleware pipeline (version gate → authenticator →
//! logger), the route handlers, and the process wiring (config, logging,
//! graceful shutdown) that ties the rest of the workspace's crates into one
//! running service.

#![deny(unsafe_code)]

pub mod caches;
pub mod config;
pub mod identity;
pub mod logging;
pub mod middleware;
pub mod paths;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod token_source;

pub use config::AppConfig;
pub use server::{build_router, listen};
pub use state::AppState;
