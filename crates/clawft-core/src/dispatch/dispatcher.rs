//! Top-level entry point: `Dispatcher::ask` wires the router, session
//! store, tool loop, and workflows into one bounded turn.
//!
//! Grounded on `agent/loop_core.rs::process_message`'s overall shape
//! (session lookup -> context -> dispatch -> session append), adapted to
//! the router's fast-path/workflow/free-form branches instead of a single
//! always-on-tool-loop path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use clawft_llm::types::ChatMessage;
use clawft_platform::Platform;

use crate::session::SessionManager;
use crate::tools::registry::ToolRegistry;

use super::error::{DispatchError, Result};
use super::llm_client::Metrics;
use super::recovery::ErrorRecovery;
use super::router::{Router, RouteDecision, WorkflowKind};
use super::tool_loop::ToolLoop;
use super::workflows::incident_response::IncidentResponseWorkflow;
use super::workflows::ioc_investigation::IocInvestigationWorkflow;
use super::workflows::WorkflowContext;

/// Log a warning (but do not abort) if a single `ask` call runs this long.
const SLOW_ASK_WARNING: Duration = Duration::from_secs(25);

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of prior turns kept per session.
    pub max_messages: usize,
    /// Sessions idle longer than this are swept on the next `ask`.
    pub session_ttl: ChronoDuration,
    /// Character budget for the context assembled from session history.
    pub max_context_chars: usize,
    /// Names the router strips from inbound text before classifying.
    pub bot_aliases: Vec<String>,
    /// Maximum accepted length of one inbound message.
    pub max_message_chars: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_messages: 30,
            session_ttl: ChronoDuration::hours(24),
            max_context_chars: 4_000,
            bot_aliases: Vec::new(),
            max_message_chars: 8_000,
        }
    }
}

/// Final outcome of one `ask` call.
#[derive(Debug, Clone)]
pub struct AskResult {
    pub content: String,
    pub metrics: Option<Metrics>,
}

impl AskResult {
    fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), metrics: None }
    }
}

pub struct Dispatcher<P: Platform> {
    router: Router,
    sessions: Arc<SessionManager<P>>,
    tool_loop: Arc<ToolLoop>,
    workflows: WorkflowContext,
    config: DispatchConfig,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(
        sessions: Arc<SessionManager<P>>,
        tools: Arc<ToolRegistry>,
        tool_loop: Arc<ToolLoop>,
        recovery: Arc<ErrorRecovery>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            router: Router::new(config.bot_aliases.clone()),
            sessions,
            tool_loop,
            workflows: WorkflowContext::new(tools, recovery),
            config,
        }
    }

    /// Handle one inbound turn end to end: validate, route, dispatch to
    /// the matching path, and persist the turn. Logs (does not abort) if
    /// the whole call takes longer than [`SLOW_ASK_WARNING`].
    pub async fn ask(
        &self,
        user_id: &str,
        room_id: &str,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<AskResult> {
        let started = std::time::Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DispatchError::Cancelled),
            result = self.ask_inner(user_id, room_id, text) => result,
        };
        if started.elapsed() > SLOW_ASK_WARNING {
            warn!(user_id, room_id, elapsed_ms = started.elapsed().as_millis() as u64, "ask exceeded 25s");
        }
        result
    }

    async fn ask_inner(&self, user_id: &str, room_id: &str, text: &str) -> Result<AskResult> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DispatchError::Validation("message is empty".into()));
        }
        if trimmed.chars().count() > self.config.max_message_chars {
            return Err(DispatchError::Validation(format!(
                "message exceeds {} characters",
                self.config.max_message_chars
            )));
        }

        let key = format!("{user_id}_{room_id}");

        if let Err(e) = self.sessions.sweep_expired(Utc::now(), self.config.session_ttl).await {
            warn!(error = %e, "session sweep failed, continuing with stale sessions");
        }

        match self.router.classify(trimmed) {
            RouteDecision::SessionClear => {
                self.sessions.delete_session_if_exists(&key).await?;
                Ok(AskResult::text("Session cleared."))
            }
            RouteDecision::Greeting => Ok(AskResult::text("System online and ready")),
            RouteDecision::Help => Ok(AskResult::text(HELP_TEXT)),
            RouteDecision::WorkflowHelp => Ok(AskResult::text(WORKFLOW_HELP_TEXT)),
            RouteDecision::Tipper(id) => {
                let args = serde_json::json!({ "id": id });
                let text = self.workflows.call_tool("tipper_lookup", "default", args).await;
                Ok(AskResult::text(text))
            }
            RouteDecision::Rules(query) => {
                let args = serde_json::json!({ "query": query });
                let text = self.workflows.call_tool("rules_search", "docsearch", args).await;
                Ok(AskResult::text(text))
            }
            RouteDecision::Falcon(command) => {
                let args = serde_json::json!({ "command": command });
                let text = self.workflows.call_tool("falcon_command", "edr", args).await;
                Ok(AskResult::text(text))
            }
            RouteDecision::Workflow { kind, payload } => self.run_workflow(&key, kind, payload, trimmed).await,
            RouteDecision::FreeForm(message) => self.run_free_form(&key, &message).await,
        }
    }

    async fn run_workflow(
        &self,
        key: &str,
        kind: WorkflowKind,
        payload: String,
        raw_text: &str,
    ) -> Result<AskResult> {
        let report = match kind {
            WorkflowKind::IocInvestigation => {
                let ioc_type = super::signals::extract_ioc(&payload, &[])
                    .map(|(_, kind)| kind)
                    .unwrap_or(super::signals::IocType::Domain);
                let workflow = IocInvestigationWorkflow::new(self.workflows.clone());
                workflow.run(&payload, ioc_type).await.final_report
            }
            WorkflowKind::IncidentResponse => {
                let workflow = IncidentResponseWorkflow::new(self.workflows.clone(), raw_text.to_string());
                workflow.run(&payload).await.final_report
            }
        };

        self.sessions.append_turn_bounded(key, "user", raw_text, self.config.max_messages).await?;
        self.sessions.append_turn_bounded(key, "assistant", &report, self.config.max_messages).await?;

        Ok(AskResult::text(report))
    }

    async fn run_free_form(&self, key: &str, message: &str) -> Result<AskResult> {
        let context = self.sessions.context(key, self.config.max_context_chars).await?;
        let mut messages = Vec::new();
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        if !context.is_empty() {
            messages.push(ChatMessage::system(format!("Conversation so far:\n{context}")));
        }
        messages.push(ChatMessage::user(message));

        let outcome = self.tool_loop.run(messages).await?;

        self.sessions.append_turn_bounded(key, "user", message, self.config.max_messages).await?;
        self.sessions
            .append_turn_bounded(key, "assistant", &outcome.content, self.config.max_messages)
            .await?;

        Ok(AskResult { content: outcome.content, metrics: Some(outcome.metrics) })
    }
}

const SYSTEM_PROMPT: &str = "You are a SecOps assistant. Use the available tools to investigate \
indicators of compromise, look up EDR and ticket data, and answer security questions. Be concise.";

const HELP_TEXT: &str = "I can look up IOCs, tickets, and EDR data, or just chat. \
Try \"workflow help\" to see the guided investigations, or ask me anything directly.";

const WORKFLOW_HELP_TEXT: &str = "Workflows: \"workflow investigate <ip|domain|hash|url>\" runs an \
IOC investigation; \"workflow incident response for ticket <id>\" runs an incident response \
workflow against that ticket.";
