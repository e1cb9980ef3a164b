//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use crate::gateway::GatewayHandler;

/// Default maximum request body size (1 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// State shared by all request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Invocation pipeline
    pub gateway: Arc<GatewayHandler>,
    /// Maximum accepted request body size
    pub body_limit: usize,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    /// Create state around `gateway`
    pub fn new(gateway: GatewayHandler) -> Self {
        Self {
            gateway: Arc::new(gateway),
            body_limit: DEFAULT_BODY_LIMIT,
            started_at: Instant::now(),
        }
    }

    /// Set the request body limit
    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}
