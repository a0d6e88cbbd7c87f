//! Token budget assembler (Level 0 implementation).
//!
//! Truncates conversation history to fit within a token budget.
//! Uses a simple `chars / 4` heuristic for token estimation.
//!
//! The assembler always preserves the first (system) message and
//! the most recent messages, dropping older messages from the middle
//! when the budget is exceeded.

use async_trait::async_trait;

use super::traits::{
    AssembledContext, ChatRequest, ContextAssembler, LlmMessage, TaskProfile,
};

/// Level 0 token-budget context assembler.
///
/// Estimates token count as `character_count / 4` and truncates
/// messages from the beginning of the conversation (keeping the
/// first system message and most recent messages) to fit within
/// the configured budget.
pub struct TokenBudgetAssembler {
    max_tokens: usize,
}

impl TokenBudgetAssembler {
    /// Create a new assembler with the given token budget.
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// Returns the configured maximum token budget.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}

#[async_trait]
impl ContextAssembler for TokenBudgetAssembler {
    async fn assemble(&self, request: &ChatRequest, _profile: &TaskProfile) -> AssembledContext {
        let messages = &request.messages;

        if messages.is_empty() {
            return AssembledContext {
                messages: vec![],
                token_estimate: 0,
                truncated: false,
            };
        }

        let total_tokens = estimate_tokens_for_messages(messages);

        // If everything fits, return as-is.
        if total_tokens <= self.max_tokens {
            return AssembledContext {
                messages: messages.clone(),
                token_estimate: total_tokens,
                truncated: false,
            };
        }

        // Truncation strategy:
        //   1. Always keep the first message (typically a system prompt).
        //   2. Add messages from the end until we hit the budget.
        //   3. Drop messages from the middle.
        let first = &messages[0];
        let first_tokens = estimate_tokens(first);

        if messages.len() == 1 {
            // Single message that exceeds budget -- include it anyway.
            return AssembledContext {
                messages: vec![first.clone()],
                token_estimate: first_tokens,
                truncated: true,
            };
        }

        let mut remaining_budget = self.max_tokens.saturating_sub(first_tokens);
        let mut tail_messages: Vec<LlmMessage> = Vec::new();

        // Walk backwards from the end, adding messages until budget is exhausted.
        for msg in messages[1..].iter().rev() {
            let msg_tokens = estimate_tokens(msg);
            if msg_tokens > remaining_budget {
                break;
            }
            remaining_budget -= msg_tokens;
            tail_messages.push(msg.clone());
        }

        // Reverse so messages are in chronological order.
        tail_messages.reverse();

        let mut result = Vec::with_capacity(1 + tail_messages.len());
        result.push(first.clone());
        result.extend(tail_messages);

        let final_tokens = estimate_tokens_for_messages(&result);
        let truncated = result.len() < messages.len();

        AssembledContext {
            messages: result,
            token_estimate: final_tokens,
            truncated,
        }
    }
}

/// Estimate token count for a single message (chars / 4 heuristic).
///
/// Also accounts for the role field and a small overhead per message
/// (the role name + structural tokens like `<|im_start|>` / JSON keys).
fn estimate_tokens(msg: &LlmMessage) -> usize {
    let content_tokens = msg.content.len() / 4;
    let role_overhead = 4; // ~4 tokens for role + message structure
    content_tokens + role_overhead
}

/// Estimate total token count for a slice of messages.
fn estimate_tokens_for_messages(messages: &[LlmMessage]) -> usize {
    messages.iter().map(estimate_tokens).sum()
}
