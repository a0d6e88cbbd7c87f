//! SecOps query-dispatch engine: classifies inbound chat messages, runs a
//! bounded LLM-plus-tools loop or a fixed investigation workflow, and
//! manages the chat-facing lifecycle around it.
//!
//! Layered on top of [`crate::session`], [`crate::tools::registry`], and
//! `clawft-llm`'s provider contract rather than the heavier
//! [`crate::pipeline`] (6-stage classifier/router/assembler/scorer
//! pipeline), which is disproportionate to this engine's single bounded
//! invoke-with-tools contract.

pub mod chat_adapter;
pub mod dispatcher;
pub mod error;
pub mod llm_client;
pub mod recovery;
pub mod retriever;
pub mod router;
pub mod signals;
pub mod tool_loop;
pub mod workflows;

pub use chat_adapter::{AdapterOutcome, ChatAdapter};
pub use dispatcher::{AskResult, DispatchConfig, Dispatcher};
pub use error::{DispatchError, Result};
pub use llm_client::{LlmClient, LlmInvocation, Metrics};
pub use recovery::{ErrorRecovery, HealthStatus, RecoveryPolicy};
pub use retriever::{Retriever, RetrievedPassage, RetrieverError};
pub use router::{Router, RouteDecision, WorkflowKind};
pub use tool_loop::{ToolLoop, ToolLoopResult};
