//! Graph workflows: fixed node sequences over an accumulating state.
//!
//! A workflow node is a plain async function `State -> StateDelta`; the
//! executor (here, each workflow's own `run` method, since the teacher ships
//! no general graph-execution crate) merges deltas by concatenating
//! accumulating fields (`risk_factors`, `errors`) and overwriting everything
//! else. Nodes run strictly sequentially -- parallel nodes are forbidden to
//! keep merges unambiguous.

pub mod incident_response;
pub mod ioc_investigation;

use std::sync::Arc;

use crate::tools::registry::ToolRegistry;

use super::recovery::ErrorRecovery;

/// Shared dependencies every workflow node needs: tools to call through
/// `ErrorRecovery`, and the recovery manager itself.
#[derive(Clone)]
pub struct WorkflowContext {
    pub tools: Arc<ToolRegistry>,
    pub recovery: Arc<ErrorRecovery>,
}

impl WorkflowContext {
    pub fn new(tools: Arc<ToolRegistry>, recovery: Arc<ErrorRecovery>) -> Self {
        Self { tools, recovery }
    }

    /// Call a tool by name through `ErrorRecovery`, returning the tool's
    /// JSON result rendered as text, or the class's fallback message on
    /// terminal failure. Never returns `Err`: workflow nodes record
    /// failures into `errors` rather than aborting.
    pub async fn call_tool(&self, tool_name: &str, class: &str, args: serde_json::Value) -> String {
        let Some(tool) = self.tools.get(tool_name) else {
            return format!("Tool {tool_name} not found");
        };
        let result = self
            .recovery
            .run(class, || {
                let tool = tool.clone();
                let args = args.clone();
                async move { tool.execute(args).await }
            })
            .await;
        match result {
            Ok(value) => render_tool_text(&value),
            Err(_) => self.recovery.fallback(class, None),
        }
    }
}

fn render_tool_text(value: &serde_json::Value) -> String {
    match value.get("text").and_then(|v| v.as_str()) {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}
