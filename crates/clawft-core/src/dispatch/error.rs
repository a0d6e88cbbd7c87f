//! Error kinds shared across the dispatch engine.

use thiserror::Error;

/// Top-level error returned by the dispatch engine's public entry points.
///
/// Tool and workflow-node failures are recovered locally (turned into
/// fallback text or an `errors` entry) and do not surface as this type;
/// `DispatchError` is reserved for failures the caller must react to.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The caller passed an empty or otherwise invalid request.
    #[error("validation error: {0}")]
    Validation(String),

    /// A named resource (tool, session) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An operation did not complete within its allotted time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The caller's cancellation token fired before completion.
    #[error("cancelled")]
    Cancelled,

    /// An external call failed after exhausting its retry policy.
    #[error("tool failed: {0}")]
    ToolFailed(String),

    /// The tool class is gated off by `ErrorRecovery`.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Any other internal failure (bubbled up from session storage, the
    /// LLM provider, etc).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<clawft_types::error::ClawftError> for DispatchError {
    fn from(e: clawft_types::error::ClawftError) -> Self {
        DispatchError::Internal(e.to_string())
    }
}

impl From<clawft_llm::ProviderError> for DispatchError {
    fn from(e: clawft_llm::ProviderError) -> Self {
        match e {
            clawft_llm::ProviderError::Timeout => DispatchError::Timeout(e.to_string()),
            other => DispatchError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
