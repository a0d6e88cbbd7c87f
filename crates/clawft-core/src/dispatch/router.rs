//! Message classification: the first decision point for every inbound turn.
//!
//! [`Router::classify`] is a pure function over the raw text (plus the set
//! of bot-name aliases to strip); it never touches sessions, tools, or the
//! LLM. The teacher's `pipeline/router.rs` `StaticRouter` decides which
//! *model* to use for an already-classified request -- a different job --
//! so only its "pure function returning a decision enum" shape is reused
//! here, not its code.

use super::signals::{self, IocType};

const HELP_PHRASES: &[&str] = &[
    "help",
    "help me",
    "how do i use",
    "what can you do",
    "usage",
    "instructions",
];

const FRESH_START_PHRASES: &[&str] = &[
    "start fresh",
    "start a new session",
    "new conversation",
    "begin again",
];

const CLEAR_ACTION_WORDS: &[&str] = &["clear", "reset", "delete", "forget", "erase", "remove"];
const CLEAR_TARGET_WORDS: &[&str] =
    &["conversation", "chat", "history", "session", "context", "messages", "memory", "talked"];

const GREETING_PHRASES: &[&str] = &["hi", "status", "health", "are you working"];

const RULES_RESERVED: &[&str] = &["sync", "stats"];

/// The kind of workflow a `"workflow ..."` command resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    IocInvestigation,
    IncidentResponse,
}

/// Result of classifying one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// `workflow help`, or a `workflow ...` command that matched neither a
    /// ticket nor an IOC.
    WorkflowHelp,
    /// `workflow investigate <ioc>` / `workflow incident response for
    /// ticket <n>`.
    Workflow { kind: WorkflowKind, payload: String },
    Help,
    /// `tipper <id>` / `tipper #<id>` / `analyze tipper <id>`.
    Tipper(String),
    /// `rules <query>` / `rule <query>`.
    Rules(String),
    /// `falcon ...` / `crowdstrike ...` / `cs ...` (room allow-listing is
    /// the adapter's job, not the router's).
    Falcon(String),
    SessionClear,
    /// Canned `"System online and ready"` fast path.
    Greeting,
    FreeForm(String),
}

pub struct Router {
    bot_aliases: Vec<String>,
}

impl Router {
    pub fn new(bot_aliases: Vec<String>) -> Self {
        Self { bot_aliases }
    }

    /// Classify raw inbound text. The first matching rule wins.
    pub fn classify(&self, raw_text: &str) -> RouteDecision {
        let text = self.preprocess(raw_text);
        let trimmed = text.trim();
        let lower = trimmed.to_lowercase();

        if let Some(remainder) = lower.strip_prefix("workflow ") {
            return self.classify_workflow(&text["workflow ".len()..], remainder.trim());
        }

        if is_help_phrase(&lower) {
            return RouteDecision::Help;
        }

        if let Some(id) = match_tipper(&lower) {
            return RouteDecision::Tipper(id);
        }

        if let Some(query) = match_rules(trimmed, &lower) {
            return RouteDecision::Rules(query);
        }

        if let Some(rest) = match_falcon(trimmed, &lower) {
            return RouteDecision::Falcon(rest.to_string());
        }

        if is_session_clear(&lower) {
            return RouteDecision::SessionClear;
        }

        if GREETING_PHRASES.contains(&lower.as_str()) {
            return RouteDecision::Greeting;
        }

        RouteDecision::FreeForm(text)
    }

    /// Strip bot-name aliases (case-insensitively), then collapse
    /// whitespace and leading/trailing commas. The caller still logs the
    /// original text.
    fn preprocess(&self, raw_text: &str) -> String {
        let mut text = raw_text.to_string();
        for alias in &self.bot_aliases {
            let lower_alias = alias.to_lowercase();
            loop {
                let lower_text = text.to_lowercase();
                let Some(pos) = lower_text.find(&lower_alias) else {
                    break;
                };
                text.replace_range(pos..pos + alias.len(), "");
            }
        }
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim_matches(',').trim().to_string()
    }

    fn classify_workflow(&self, original_remainder: &str, lower_remainder: &str) -> RouteDecision {
        if lower_remainder.is_empty() || lower_remainder == "help" {
            return RouteDecision::WorkflowHelp;
        }
        if let Some(ticket) = signals::extract_ticket_id(original_remainder) {
            return RouteDecision::Workflow {
                kind: WorkflowKind::IncidentResponse,
                payload: ticket,
            };
        }
        if let Some((ioc, _kind)) = signals::extract_ioc(original_remainder, &[]) {
            return RouteDecision::Workflow {
                kind: WorkflowKind::IocInvestigation,
                payload: ioc,
            };
        }
        RouteDecision::WorkflowHelp
    }
}

fn is_help_phrase(lower: &str) -> bool {
    HELP_PHRASES.iter().any(|p| {
        lower == *p || lower.starts_with(&format!("{p} ")) || lower.ends_with(&format!(" {p}"))
    })
}

fn match_tipper(lower: &str) -> Option<String> {
    let rest = lower.strip_prefix("analyze ").unwrap_or(lower);
    let rest = rest.strip_prefix("tipper")?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('#').unwrap_or(rest);
    if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
        Some(rest.to_string())
    } else {
        None
    }
}

fn match_rules(original: &str, lower: &str) -> Option<String> {
    let rest = lower.strip_prefix("rules ").or_else(|| lower.strip_prefix("rule "))?;
    let offset = original.len() - rest.len();
    let rest_original = original[offset..].trim_start();
    let rest_original = rest_original
        .strip_prefix("search ")
        .unwrap_or(rest_original)
        .trim();
    if rest_original.is_empty() || RULES_RESERVED.contains(&rest_original.to_lowercase().as_str()) {
        return None;
    }
    Some(rest_original.to_string())
}

fn match_falcon<'a>(original: &'a str, lower: &str) -> Option<&'a str> {
    for prefix in ["falcon ", "crowdstrike ", "cs "] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            let offset = original.len() - rest.len();
            return Some(original[offset..].trim());
        }
    }
    None
}

fn is_session_clear(lower: &str) -> bool {
    if FRESH_START_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    let has_action = CLEAR_ACTION_WORDS.iter().any(|w| lower.contains(w));
    let has_target = CLEAR_TARGET_WORDS.iter().any(|w| lower.contains(w));
    has_action && has_target
}
