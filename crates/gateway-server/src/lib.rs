//! # Gateway Server
//!
//! HTTP surface and invocation pipeline for the prompt gateway.
//!
//! This crate provides:
//! - [`GatewayHandler`], which validates, routes, invokes, logs and responds
//! - Axum routes: `POST /prompt`, `GET /health`, `GET /live`, `GET /metrics`
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export main types
pub use gateway::GatewayHandler;
pub use routes::create_router;
pub use server::{Server, ServerConfig, ServerError};
pub use state::AppState;
