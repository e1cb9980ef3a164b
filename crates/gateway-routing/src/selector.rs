//! Provider selection.

use gateway_core::Provider;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;
use tracing::debug;

/// Providers eligible when the caller does not name one.
///
/// Gemini is deliberately absent: it is only used when requested explicitly.
pub const DEFAULT_CANDIDATES: [Provider; 2] = [Provider::OpenAI, Provider::Anthropic];

/// Resolves an optional requested provider into a concrete one
pub struct ProviderSelector {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl ProviderSelector {
    /// Selector drawing from OS entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Selector with a reproducible sequence of draws
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Selector drawing from the given random source
    #[must_use]
    pub fn with_rng<R>(rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Resolve the provider for one request.
    ///
    /// An explicit provider is returned unchanged. Otherwise one unit float is
    /// drawn: below 0.5 selects OpenAI, anything else Anthropic.
    pub fn select(&self, requested: Option<Provider>) -> Provider {
        if let Some(provider) = requested {
            return provider;
        }

        let draw: f64 = self.rng.lock().gen();
        let provider = if draw < 0.5 {
            DEFAULT_CANDIDATES[0]
        } else {
            DEFAULT_CANDIDATES[1]
        };

        debug!(provider = %provider, draw, "Selected default provider");
        provider
    }
}

impl Default for ProviderSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for ProviderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSelector")
            .field("candidates", &DEFAULT_CANDIDATES)
            .finish_non_exhaustive()
    }
}
