//! Provider failover: try the next provider when all retries are exhausted.
//!
//! [`FailoverChain`] takes a list of providers (each typically wrapped in
//! [`RetryPolicy`](crate::retry::RetryPolicy)) and calls them in order.
//! If one provider fails with a retryable error after exhausting its retries,
//! the chain moves to the next provider. Non-retryable errors (auth failure,
//! model not found) are returned immediately.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{ProviderError, Result};
use crate::provider::Provider;
use crate::retry::is_retryable;
use crate::types::{ChatRequest, ChatResponse, StreamChunk};

/// A chain of providers that fails over to the next on transient errors.
///
/// # Example
///
/// ```rust,ignore
/// use clawft_llm::failover::FailoverChain;
/// use clawft_llm::retry::{RetryPolicy, RetryConfig};
/// use clawft_llm::OpenAiCompatProvider;
///
/// let providers: Vec<Box<dyn Provider>> = vec![
///     Box::new(RetryPolicy::new(primary, RetryConfig::default())),
///     Box::new(RetryPolicy::new(fallback, RetryConfig::default())),
/// ];
/// let chain = FailoverChain::new(providers);
/// let response = chain.complete(&request).await?;
/// ```
pub struct FailoverChain {
    providers: Vec<Box<dyn Provider>>,
}

impl FailoverChain {
    /// Create a failover chain from an ordered list of providers.
    ///
    /// The first provider is the primary; subsequent providers are fallbacks.
    /// Returns `None` if the list is empty.
    pub fn new(providers: Vec<Box<dyn Provider>>) -> Option<Self> {
        if providers.is_empty() {
            return None;
        }
        Some(Self { providers })
    }

    /// Returns the number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns the names of all providers in the chain, in order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl Provider for FailoverChain {
    fn name(&self) -> &str {
        // Report the primary provider's name
        self.providers
            .first()
            .map(|p| p.name())
            .unwrap_or("failover-chain")
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut errors: Vec<(String, ProviderError)> = Vec::new();

        for (idx, provider) in self.providers.iter().enumerate() {
            match provider.complete(request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    let provider_name = provider.name().to_owned();

                    // If the error is not retryable, don't try fallback providers
                    // for certain error classes
                    if !is_retryable(&err) && !is_failover_eligible(&err) {
                        return Err(err);
                    }

                    warn!(
                        provider = %provider_name,
                        provider_index = idx,
                        total_providers = self.providers.len(),
                        error = %err,
                        "provider failed, trying next in failover chain"
                    );

                    errors.push((provider_name, err));
                }
            }
        }

        // All providers exhausted
        let summary: Vec<String> = errors
            .iter()
            .map(|(name, err)| format!("{name}: {err}"))
            .collect();

        Err(ProviderError::AllProvidersExhausted { attempts: summary })
    }

    async fn complete_stream(
        &self,
        request: &ChatRequest,
        tx: mpsc::Sender<StreamChunk>,
    ) -> Result<()> {
        let mut errors: Vec<(String, ProviderError)> = Vec::new();

        for (idx, provider) in self.providers.iter().enumerate() {
            // Buffer chunks per attempt to prevent partial output concatenation.
            // Only forward buffered chunks to the real sender on success.
            let (attempt_tx, mut attempt_rx) = mpsc::channel::<StreamChunk>(256);

            match provider.complete_stream(request, attempt_tx).await {
                Ok(()) => {
                    // Success: forward all buffered chunks to the real sender.
                    while let Some(chunk) = attempt_rx.recv().await {
                        if tx.send(chunk).await.is_err() {
                            break;
                        }
                    }
                    return Ok(());
                }
                Err(err) => {
                    let provider_name = provider.name().to_owned();

                    // Discard buffered chunks from this failed attempt by
                    // dropping attempt_rx (already moved out of scope).

                    if !is_retryable(&err) && !is_failover_eligible(&err) {
                        return Err(err);
                    }

                    warn!(
                        provider = %provider_name,
                        provider_index = idx,
                        total_providers = self.providers.len(),
                        error = %err,
                        "provider streaming failed, trying next in failover chain"
                    );

                    errors.push((provider_name, err));
                }
            }
        }

        let summary: Vec<String> = errors
            .iter()
            .map(|(name, err)| format!("{name}: {err}"))
            .collect();

        Err(ProviderError::AllProvidersExhausted { attempts: summary })
    }
}

/// Determines whether a non-retryable error should still trigger failover
/// to the next provider (as opposed to immediately returning the error).
///
/// For example, if provider A is not configured but provider B is, we should
/// try provider B.
fn is_failover_eligible(err: &ProviderError) -> bool {
    matches!(
        err,
        ProviderError::NotConfigured(_) | ProviderError::ModelNotFound(_)
    )
}

impl std::fmt::Debug for FailoverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverChain")
            .field("providers", &self.provider_names())
            .finish()
    }
}
