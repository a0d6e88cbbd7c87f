//! Incident response workflow.
//!
//! Node sequence: `fetch_ticket -> extract_iocs -> check_edr_containment ->
//! check_edr_detections -> search_siem -> enrich_iocs ->
//! synthesize_findings -> generate_summary -> optional_post_back`.
//!
//! Grounded on `original_source/my_bot/workflows/incident_response.py`
//! (node sequence, severity derivation, enrichment cap) and
//! `state_schemas.py`'s `IncidentResponseState`; exact thresholds and the
//! "skip N/A sections" report rule follow SPEC_FULL.md §4.7.2.

use crate::dispatch::signals::{self, IocType};

use super::WorkflowContext;

/// Maximum number of external IOCs enriched via VirusTotal per ticket.
const MAX_ENRICHED_IOCS: usize = 5;

/// Whether `text` explicitly reports zero detections, as opposed to merely
/// lacking a HIGH/MEDIUM severity marker.
fn indicates_no_detections(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper.contains("NO DETECTIONS") || upper.contains("NO EDR")
}

/// Whether `text` reports at least one correlated SIEM event.
fn indicates_siem_events(text: &str) -> bool {
    text.contains("Total Events:") && !text.contains("No events")
}

#[derive(Debug, Clone, Default)]
pub struct IncidentResponseState {
    pub ticket_id: String,
    pub ticket_text: String,
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub device_id: Option<String>,
    pub iocs: Vec<(String, IocType)>,
    pub edr_containment: Option<String>,
    pub edr_detections: Option<String>,
    pub siem_results: Option<String>,
    pub enrichment: Vec<(String, String)>,
    pub severity: String,
    pub findings: Vec<String>,
    pub skipped_steps: Vec<String>,
    pub errors: Vec<String>,
    pub final_report: String,
    pub post_back: Option<String>,
}

#[derive(Debug, Default)]
struct Delta {
    ticket_text: Option<String>,
    hostname: Option<Option<String>>,
    username: Option<Option<String>>,
    device_id: Option<Option<String>>,
    iocs: Option<Vec<(String, IocType)>>,
    edr_containment: Option<Option<String>>,
    edr_detections: Option<Option<String>>,
    siem_results: Option<Option<String>>,
    enrichment: Option<Vec<(String, String)>>,
    severity: Option<String>,
    findings: Vec<String>,
    skipped_steps: Vec<String>,
    errors: Vec<String>,
    final_report: Option<String>,
    post_back: Option<Option<String>>,
}

fn merge(state: &mut IncidentResponseState, delta: Delta) {
    if let Some(v) = delta.ticket_text {
        state.ticket_text = v;
    }
    if let Some(v) = delta.hostname {
        state.hostname = v;
    }
    if let Some(v) = delta.username {
        state.username = v;
    }
    if let Some(v) = delta.device_id {
        state.device_id = v;
    }
    if let Some(v) = delta.iocs {
        state.iocs = v;
    }
    if let Some(v) = delta.edr_containment {
        state.edr_containment = v;
    }
    if let Some(v) = delta.edr_detections {
        state.edr_detections = v;
    }
    if let Some(v) = delta.siem_results {
        state.siem_results = v;
    }
    if let Some(v) = delta.enrichment {
        state.enrichment = v;
    }
    if let Some(v) = delta.severity {
        state.severity = v;
    }
    state.findings.extend(delta.findings);
    state.skipped_steps.extend(delta.skipped_steps);
    state.errors.extend(delta.errors);
    if let Some(v) = delta.final_report {
        state.final_report = v;
    }
    if let Some(v) = delta.post_back {
        state.post_back = v;
    }
}

/// `"N/A"` (case-insensitive, trimmed) marks a field the ticket system
/// reports as unset. Treated the same as an absent field throughout.
fn present(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub struct IncidentResponseWorkflow {
    ctx: WorkflowContext,
    query: String,
}

impl IncidentResponseWorkflow {
    pub fn new(ctx: WorkflowContext, query: String) -> Self {
        Self { ctx, query }
    }

    pub async fn run(&self, ticket_id: &str) -> IncidentResponseState {
        let mut state = IncidentResponseState { ticket_id: ticket_id.to_string(), ..Default::default() };

        let delta = self.fetch_ticket(&state).await;
        merge(&mut state, delta);
        let delta = self.extract_iocs(&state).await;
        merge(&mut state, delta);
        let delta = self.check_edr_containment(&state).await;
        merge(&mut state, delta);
        let delta = self.check_edr_detections(&state).await;
        merge(&mut state, delta);
        let delta = self.search_siem(&state).await;
        merge(&mut state, delta);
        let delta = self.enrich_iocs(&state).await;
        merge(&mut state, delta);
        let delta = self.synthesize_findings(&state).await;
        merge(&mut state, delta);
        let delta = self.generate_summary(&state).await;
        merge(&mut state, delta);
        let delta = self.optional_post_back(&state).await;
        merge(&mut state, delta);

        state
    }

    async fn fetch_ticket(&self, state: &IncidentResponseState) -> Delta {
        let args = serde_json::json!({ "ticket_id": state.ticket_id });
        let text = self.ctx.call_tool("ticket_lookup", "default", args).await;

        let hostname = find_field(&text, &["Hostname", "Host"]).and_then(|v| present(&v));
        let username = find_field(&text, &["Username", "User"]).and_then(|v| present(&v));
        let device_id = find_field(&text, &["Device ID", "DeviceID"]).and_then(|v| present(&v));

        Delta {
            ticket_text: Some(text),
            hostname: Some(hostname),
            username: Some(username),
            device_id: Some(device_id),
            ..Default::default()
        }
    }

    async fn extract_iocs(&self, state: &IncidentResponseState) -> Delta {
        let internal_domains = ["corp.local", "internal"];
        let mut found = Vec::new();
        let mut remaining = state.ticket_text.clone();
        loop {
            let Some((value, kind)) = signals::extract_ioc(&remaining, &[]) else { break };
            if kind == IocType::Domain && internal_domains.iter().any(|d| value.ends_with(d)) {
                remaining = remaining.replacen(&value, "", 1);
                continue;
            }
            found.push((value.clone(), kind));
            remaining = remaining.replacen(&value, "", 1);
            if found.len() >= 10 {
                break;
            }
        }
        Delta { iocs: Some(found), ..Default::default() }
    }

    async fn check_edr_containment(&self, state: &IncidentResponseState) -> Delta {
        let Some(hostname) = &state.hostname else {
            return Delta {
                edr_containment: Some(None),
                skipped_steps: vec!["EDR containment check (no hostname)".to_string()],
                ..Default::default()
            };
        };
        let args = serde_json::json!({ "hostname": hostname });
        let text = self.ctx.call_tool("edr_containment_status", "edr", args).await;
        Delta { edr_containment: Some(Some(text)), ..Default::default() }
    }

    async fn check_edr_detections(&self, state: &IncidentResponseState) -> Delta {
        let Some(hostname) = &state.hostname else {
            return Delta {
                edr_detections: Some(None),
                skipped_steps: vec!["EDR detection history (no hostname)".to_string()],
                ..Default::default()
            };
        };
        let args = serde_json::json!({ "hostname": hostname });
        let text = self.ctx.call_tool("edr_detections", "edr", args).await;
        Delta { edr_detections: Some(Some(text)), ..Default::default() }
    }

    async fn search_siem(&self, state: &IncidentResponseState) -> Delta {
        let target = state.hostname.clone().or_else(|| state.username.clone());
        let Some(target) = target else {
            return Delta {
                siem_results: Some(None),
                skipped_steps: vec!["SIEM search (no hostname or username)".to_string()],
                ..Default::default()
            };
        };
        let args = serde_json::json!({ "query": target });
        let text = self.ctx.call_tool("siem_search", "default", args).await;
        Delta { siem_results: Some(Some(text)), ..Default::default() }
    }

    async fn enrich_iocs(&self, state: &IncidentResponseState) -> Delta {
        // `extract_ioc` already excludes private/loopback IPs and internal
        // domains at extraction time, so every entry here is external.
        let external: Vec<&(String, IocType)> = state.iocs.iter().take(MAX_ENRICHED_IOCS).collect();

        let mut enrichment = Vec::new();
        let mut errors = Vec::new();
        for (value, kind) in external {
            let args = serde_json::json!({ "ioc_type": kind.as_str(), "value": value });
            let text = self.ctx.call_tool("virustotal_lookup", "default", args).await;
            if text.starts_with("Tool ") && text.ends_with("not found") {
                errors.push(format!("Could not enrich {value}: lookup tool unavailable"));
                continue;
            }
            enrichment.push((value.clone(), text));
        }

        let skipped = if state.iocs.len() > MAX_ENRICHED_IOCS {
            vec![format!(
                "IOC enrichment capped at {MAX_ENRICHED_IOCS} of {} extracted indicators",
                state.iocs.len()
            )]
        } else {
            Vec::new()
        };

        Delta { enrichment: Some(enrichment), skipped_steps: skipped, errors, ..Default::default() }
    }

    async fn synthesize_findings(&self, state: &IncidentResponseState) -> Delta {
        let mut findings = Vec::new();
        let mut high = false;
        let mut medium = false;

        if let Some(text) = &state.edr_containment {
            if signals::has_high_marker(text) {
                findings.push("Host is NOT contained by EDR".to_string());
                high = true;
            } else {
                findings.push("Host containment confirmed".to_string());
            }
        }
        if let Some(text) = &state.edr_detections {
            if signals::has_high_marker(text) {
                findings.push("EDR reports high-severity detections on host".to_string());
                high = true;
            } else if signals::has_medium_marker(text) {
                findings.push("EDR reports medium-severity detections on host".to_string());
                medium = true;
            } else if !indicates_no_detections(text) {
                findings.push("EDR reports detections on host".to_string());
                medium = true;
            }
        }
        for (value, text) in &state.enrichment {
            if signals::has_high_marker(text) {
                findings.push(format!("{value} flagged malicious by VirusTotal"));
                high = true;
            } else if signals::has_medium_marker(text) {
                findings.push(format!("{value} flagged suspicious by VirusTotal"));
                medium = true;
            }
        }
        if let Some(text) = &state.siem_results {
            if signals::has_high_marker(text) {
                findings.push("SIEM correlates related high-severity activity".to_string());
                high = true;
            } else if indicates_siem_events(text) {
                findings.push("SIEM events correlated to this incident".to_string());
                medium = true;
            }
        }

        let severity = if high {
            "HIGH"
        } else if medium {
            "MEDIUM"
        } else {
            "LOW"
        };

        Delta { findings, severity: Some(severity.to_string()), ..Default::default() }
    }

    async fn generate_summary(&self, state: &IncidentResponseState) -> Delta {
        let mut report = String::new();
        report.push_str(&format!("# Incident Response Summary: {}\n\n", state.ticket_id));
        report.push_str(&format!("**Severity:** {}\n\n", state.severity));

        if let Some(hostname) = &state.hostname {
            report.push_str(&format!("**Hostname:** {hostname}\n"));
        }
        if let Some(username) = &state.username {
            report.push_str(&format!("**Username:** {username}\n"));
        }
        if let Some(device_id) = &state.device_id {
            report.push_str(&format!("**Device ID:** {device_id}\n"));
        }
        report.push('\n');

        if let Some(text) = &state.edr_containment {
            report.push_str(&format!("## EDR Containment\n{text}\n\n"));
        }
        if let Some(text) = &state.edr_detections {
            report.push_str(&format!("## EDR Detections\n{text}\n\n"));
        }
        if let Some(text) = &state.siem_results {
            report.push_str(&format!("## SIEM Activity\n{text}\n\n"));
        }
        if !state.enrichment.is_empty() {
            report.push_str("## IOC Enrichment\n");
            for (value, text) in &state.enrichment {
                report.push_str(&format!("- **{value}**: {text}\n"));
            }
            report.push('\n');
        }
        if !state.findings.is_empty() {
            report.push_str("## Findings\n");
            for finding in &state.findings {
                report.push_str(&format!("- {finding}\n"));
            }
            report.push('\n');
        }
        if !state.skipped_steps.is_empty() {
            report.push_str("## Skipped Steps\n");
            for step in &state.skipped_steps {
                report.push_str(&format!("- {step}\n"));
            }
        }

        Delta { final_report: Some(report), ..Default::default() }
    }

    async fn optional_post_back(&self, state: &IncidentResponseState) -> Delta {
        let lower = self.query.to_lowercase();
        if !(lower.contains("post") || lower.contains("write") || lower.contains("update")) {
            return Delta { post_back: Some(None), ..Default::default() };
        }
        let args = serde_json::json!({
            "ticket_id": state.ticket_id,
            "comment": state.final_report,
        });
        let text = self.ctx.call_tool("ticket_comment", "default", args).await;
        Delta { post_back: Some(Some(text)), ..Default::default() }
    }
}

fn find_field(text: &str, labels: &[&str]) -> Option<String> {
    for label in labels {
        let prefix = format!("{label}:");
        if let Some(idx) = text.find(&prefix) {
            let rest = &text[idx + prefix.len()..];
            let value = rest.lines().next().unwrap_or("").trim();
            return Some(value.to_string());
        }
    }
    None
}
