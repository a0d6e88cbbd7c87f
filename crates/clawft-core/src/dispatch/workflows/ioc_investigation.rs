//! IOC investigation workflow.
//!
//! Node sequence: `detect_type -> lookup_virustotal -> lookup_abuseipdb ->
//! lookup_shodan -> lookup_recorded_future -> synthesize_risk ->
//! {search_qradar | skip_qradar} -> generate_report`.
//!
//! Grounded on `original_source/my_bot/workflows/ioc_investigation.py`
//! (node sequence, scoring factors) and `state_schemas.py`'s
//! `IOCInvestigationState` (`risk_factors`/`errors` are the accumulating
//! fields); the exact additive weights and thresholds follow SPEC_FULL.md
//! §4.7.1, which takes precedence over the Python source where the two
//! differ.

use std::collections::HashMap;

use crate::dispatch::signals::{self, IocType};

use super::WorkflowContext;

const HIGH_RISK_THRESHOLD: i64 = 50;
const MEDIUM_RISK_THRESHOLD: i64 = 25;

/// Running state of one IOC investigation.
#[derive(Debug, Clone, Default)]
pub struct IocInvestigationState {
    pub ioc_value: String,
    pub ioc_type: Option<IocType>,
    pub per_source_result: HashMap<String, String>,
    pub risk_factors: Vec<String>,
    pub risk_score: i64,
    pub recommended_actions: Vec<String>,
    pub errors: Vec<String>,
    pub final_report: String,
}

/// A node's output: only the fields it changed. `risk_factors` and
/// `errors` are accumulating (concatenated by [`merge`]); everything else
/// is last-write-wins.
#[derive(Debug, Default)]
struct Delta {
    ioc_type: Option<IocType>,
    per_source_result: Option<(String, String)>,
    risk_factors: Vec<String>,
    risk_score: Option<i64>,
    recommended_actions: Option<Vec<String>>,
    errors: Vec<String>,
    final_report: Option<String>,
}

fn merge(state: &mut IocInvestigationState, delta: Delta) {
    if let Some(t) = delta.ioc_type {
        state.ioc_type = Some(t);
    }
    if let Some((source, text)) = delta.per_source_result {
        state.per_source_result.insert(source, text);
    }
    state.risk_factors.extend(delta.risk_factors);
    if let Some(score) = delta.risk_score {
        state.risk_score = score;
    }
    if let Some(actions) = delta.recommended_actions {
        state.recommended_actions = actions;
    }
    state.errors.extend(delta.errors);
    if let Some(report) = delta.final_report {
        state.final_report = report;
    }
}

pub struct IocInvestigationWorkflow {
    ctx: WorkflowContext,
}

impl IocInvestigationWorkflow {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    /// Run the full node sequence for `ioc_value` (as pre-classified by the
    /// router) to completion.
    pub async fn run(&self, ioc_value: &str, ioc_type: IocType) -> IocInvestigationState {
        let mut state = IocInvestigationState {
            ioc_value: ioc_value.to_string(),
            ioc_type: Some(ioc_type),
            ..Default::default()
        };

        let delta = self.detect_type(&state).await;
        merge(&mut state, delta);
        let delta = self.lookup_virustotal(&state).await;
        merge(&mut state, delta);
        let delta = self.lookup_abuseipdb(&state).await;
        merge(&mut state, delta);
        let delta = self.lookup_shodan(&state).await;
        merge(&mut state, delta);
        let delta = self.lookup_recorded_future(&state).await;
        merge(&mut state, delta);
        let delta = self.synthesize_risk(&state).await;
        merge(&mut state, delta);

        let delta = if state.risk_score >= HIGH_RISK_THRESHOLD {
            self.search_qradar(&state).await
        } else {
            self.skip_qradar(&state).await
        };
        merge(&mut state, delta);

        let delta = self.generate_report(&state).await;
        merge(&mut state, delta);

        state
    }

    async fn detect_type(&self, state: &IocInvestigationState) -> Delta {
        let ioc_type = signals::extract_ioc(&state.ioc_value, &[])
            .map(|(_, kind)| kind)
            .or(state.ioc_type);
        Delta { ioc_type, ..Default::default() }
    }

    async fn lookup_virustotal(&self, state: &IocInvestigationState) -> Delta {
        let args = serde_json::json!({
            "ioc_type": state.ioc_type.map(|t| t.as_str()).unwrap_or("unknown"),
            "value": state.ioc_value,
        });
        let text = self.ctx.call_tool("virustotal_lookup", "default", args).await;
        let mut factors = Vec::new();
        if signals::has_high_marker(&text) {
            factors.push("VirusTotal: high-confidence malicious indicator".to_string());
        } else if signals::has_medium_marker(&text) {
            factors.push("VirusTotal: suspicious indicator".to_string());
        }
        Delta {
            per_source_result: Some(("virustotal".into(), text)),
            risk_factors: factors,
            ..Default::default()
        }
    }

    async fn lookup_abuseipdb(&self, state: &IocInvestigationState) -> Delta {
        if state.ioc_type != Some(IocType::Ip) {
            return Delta {
                per_source_result: Some((
                    "abuseipdb".into(),
                    "N/A - AbuseIPDB only supports IP addresses".to_string(),
                )),
                ..Default::default()
            };
        }
        let args = serde_json::json!({ "ip": state.ioc_value });
        let text = self.ctx.call_tool("abuseipdb_lookup", "default", args).await;
        let mut factors = Vec::new();
        if signals::has_high_marker(&text) {
            factors.push("AbuseIPDB: high abuse confidence score".to_string());
        } else if signals::has_medium_marker(&text) {
            factors.push("AbuseIPDB: moderate abuse confidence score".to_string());
        }
        Delta {
            per_source_result: Some(("abuseipdb".into(), text)),
            risk_factors: factors,
            ..Default::default()
        }
    }

    async fn lookup_shodan(&self, state: &IocInvestigationState) -> Delta {
        if !matches!(state.ioc_type, Some(IocType::Ip) | Some(IocType::Domain)) {
            return Delta {
                per_source_result: Some((
                    "shodan".into(),
                    "N/A - Shodan only supports IP addresses and domains".to_string(),
                )),
                ..Default::default()
            };
        }
        let args = serde_json::json!({ "target": state.ioc_value });
        let text = self.ctx.call_tool("shodan_lookup", "default", args).await;
        let mut factors = Vec::new();
        if signals::has_vuln_marker(&text) {
            factors.push("Shodan: known vulnerabilities exposed".to_string());
        }
        if signals::has_high_marker(&text) {
            factors.push("Shodan: high-risk exposure".to_string());
        }
        Delta {
            per_source_result: Some(("shodan".into(), text)),
            risk_factors: factors,
            ..Default::default()
        }
    }

    async fn lookup_recorded_future(&self, state: &IocInvestigationState) -> Delta {
        let args = serde_json::json!({ "value": state.ioc_value });
        let text = self.ctx.call_tool("recorded_future_lookup", "default", args).await;
        let mut factors = Vec::new();
        if let Some(score) = signals::parse_risk_score(&text) {
            if score >= 65 {
                factors.push(format!("Recorded Future: risk score {score}/99"));
            }
        }
        Delta {
            per_source_result: Some(("recorded_future".into(), text)),
            risk_factors: factors,
            ..Default::default()
        }
    }

    async fn synthesize_risk(&self, state: &IocInvestigationState) -> Delta {
        let mut score: i64 = 0;

        if let Some(text) = state.per_source_result.get("virustotal") {
            if signals::has_high_marker(text) {
                score += 30;
            } else if signals::has_medium_marker(text) {
                score += 15;
            }
        }
        if let Some(text) = state.per_source_result.get("abuseipdb") {
            if !text.starts_with("N/A") {
                if signals::has_high_marker(text) {
                    score += 25;
                } else if signals::has_medium_marker(text) {
                    score += 12;
                }
            }
        }
        if let Some(text) = state.per_source_result.get("shodan") {
            if signals::has_vuln_marker(text) {
                score += 15;
            }
            if signals::has_high_marker(text) {
                score += 10;
            }
        }
        if let Some(text) = state.per_source_result.get("recorded_future") {
            if let Some(parsed) = signals::parse_risk_score(text) {
                score += (parsed as i64 / 3).min(30);
            }
        }
        score = score.clamp(0, 100);

        let actions = if score >= HIGH_RISK_THRESHOLD {
            vec![
                "IMMEDIATE: Block IOC at perimeter".to_string(),
                "Escalate to incident response team".to_string(),
                "Search SIEM for related activity".to_string(),
            ]
        } else if score >= MEDIUM_RISK_THRESHOLD {
            vec!["Add IOC to watchlist".to_string(), "Monitor for recurrence".to_string()]
        } else {
            vec!["No immediate action required".to_string()]
        };

        Delta { risk_score: Some(score), recommended_actions: Some(actions), ..Default::default() }
    }

    async fn search_qradar(&self, state: &IocInvestigationState) -> Delta {
        let args = serde_json::json!({ "value": state.ioc_value });
        let text = self.ctx.call_tool("qradar_search", "default", args).await;
        Delta { per_source_result: Some(("qradar".into(), text)), ..Default::default() }
    }

    async fn skip_qradar(&self, _state: &IocInvestigationState) -> Delta {
        Delta {
            per_source_result: Some((
                "qradar".into(),
                "Skipped (risk score below threshold)".to_string(),
            )),
            ..Default::default()
        }
    }

    async fn generate_report(&self, state: &IocInvestigationState) -> Delta {
        let band = if state.risk_score >= HIGH_RISK_THRESHOLD {
            "HIGH"
        } else if state.risk_score >= MEDIUM_RISK_THRESHOLD {
            "MEDIUM"
        } else {
            "LOW"
        };

        let mut dedup_factors = Vec::new();
        for factor in &state.risk_factors {
            if !dedup_factors.contains(factor) {
                dedup_factors.push(factor.clone());
            }
        }
        let mut dedup_errors = Vec::new();
        for error in &state.errors {
            if !dedup_errors.contains(error) {
                dedup_errors.push(error.clone());
            }
        }

        let mut report = String::new();
        report.push_str(&format!("# IOC Investigation: {}\n\n", state.ioc_value));
        report.push_str(&format!("**Risk Score:** {} ({})\n\n", state.risk_score, band));
        for source in ["virustotal", "abuseipdb", "shodan", "recorded_future", "qradar"] {
            if let Some(text) = state.per_source_result.get(source) {
                report.push_str(&format!("## {source}\n{text}\n\n"));
            }
        }
        if !dedup_factors.is_empty() {
            report.push_str("## Risk Factors\n");
            for factor in &dedup_factors {
                report.push_str(&format!("- {factor}\n"));
            }
            report.push('\n');
        }
        report.push_str("## Recommended Actions\n");
        for action in &state.recommended_actions {
            report.push_str(&format!("- {action}\n"));
        }
        if !dedup_errors.is_empty() {
            report.push_str("\n## Investigation Errors\n");
            for error in &dedup_errors {
                report.push_str(&format!("- {error}\n"));
            }
        }

        Delta { final_report: Some(report), ..Default::default() }
    }
}
