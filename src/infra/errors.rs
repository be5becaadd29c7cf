// src/infra/errors.rs — Error types for Atelier

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AtelierError {
    // Caller errors (surfaced verbatim, never retried internally)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Version conflict on spec {spec_id}: expected {expected}, current is {actual}")]
    VersionConflict {
        spec_id: Uuid,
        expected: u32,
        actual: u32,
    },

    #[error("No object matched target '{query}'")]
    ObjectNotFound { query: String },

    #[error("Spec {id} not found")]
    SpecNotFound { id: Uuid },

    // Internal defect: the tier table is open-ended at the top, so this
    // should be unreachable.
    #[error("Budget tier table could not resolve a footprint")]
    BudgetTierUnresolved,

    // Provider errors (recovered internally via the fallback chain)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Provider '{provider}' timed out after {timeout_ms}ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },

    #[error("Provider '{provider}' returned an invalid draft: {reason}")]
    DraftRejected { provider: String, reason: String },

    // Gateway transport errors (never surfaced; resolved to a mock response)
    #[error("Service '{service}' unavailable: {message}")]
    ServiceUnavailable { service: String, message: String },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AtelierError {
    /// Whether the provider chain should move on to the next candidate.
    /// Generation-side failures are recoverable by design; caller errors
    /// (validation, conflicts, missing objects) are terminal.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            AtelierError::Provider {
                retriable: true,
                ..
            } | AtelierError::ProviderTimeout { .. }
                | AtelierError::DraftRejected { .. }
        )
    }
}
