//! Pattern definitions for 50+ security audit checks across 10 categories.

use super::{AuditCategory, AuditCheck, AuditSeverity};
use regex::Regex;

/// Build all audit checks. Returns 50+ checks across 10 categories.
pub fn all_checks() -> Vec<AuditCheck> {
    let mut checks = Vec::new();
    checks.extend(prompt_injection_checks());
    checks.extend(exfiltration_url_checks());
    checks.extend(credential_literal_checks());
    checks.extend(permission_escalation_checks());
    checks.extend(unsafe_shell_checks());
    checks.extend(supply_chain_risk_checks());
    checks.extend(denial_of_service_checks());
    checks.extend(indirect_prompt_injection_checks());
    checks.extend(information_disclosure_checks());
    checks.extend(cross_agent_access_checks());
    checks
}

fn check(
    id: &str,
    name: &str,
    category: AuditCategory,
    severity: AuditSeverity,
    pattern: &str,
    remediation: &str,
) -> AuditCheck {
    AuditCheck {
        id: id.to_string(),
        name: name.to_string(),
        category,
        severity,
        pattern: Regex::new(pattern).unwrap(),
        remediation: remediation.to_string(),
    }
}

// ---- Category 1: Prompt Injection (8+ checks) ----

fn prompt_injection_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "PI-001", "Ignore instructions override",
            AuditCategory::PromptInjection, AuditSeverity::Critical,
            r"(?i)ignore\s+(all\s+)?(previous|prior|above)\s+(instructions|prompts|rules)",
            "Remove prompt injection attempt. Do not allow overriding system instructions.",
        ),
        check(
            "PI-002", "System tag injection",
            AuditCategory::PromptInjection, AuditSeverity::Critical,
            r"(?i)<\|?(system|im_start|im_end|im_sep|endoftext)\|?>",
            "Strip special model tokens from user content.",
        ),
        check(
            "PI-003", "Role impersonation",
            AuditCategory::PromptInjection, AuditSeverity::High,
            r"(?i)(you\s+are\s+now|act\s+as|pretend\s+to\s+be|your\s+new\s+role\s+is)",
            "Do not allow role reassignment via user input.",
        ),
        check(
            "PI-004", "Instruction delimiter bypass",
            AuditCategory::PromptInjection, AuditSeverity::High,
            r"(?i)(\[INST\]|\[/INST\]|<<SYS>>|<</SYS>>)",
            "Strip model-specific delimiters from user content.",
        ),
        check(
            "PI-005", "DAN jailbreak pattern",
            AuditCategory::PromptInjection, AuditSeverity::Critical,
            r"(?i)(do\s+anything\s+now|DAN\s+mode|jailbreak|bypass\s+(safety|filter|guard))",
            "Block jailbreak attempts that try to disable safety guardrails.",
        ),
        check(
            "PI-006", "Prompt leak request",
            AuditCategory::PromptInjection, AuditSeverity::High,
            r"(?i)(show|reveal|print|output|repeat)\s+(your|the|system)\s+(prompt|instructions|rules)",
            "Do not expose system prompts to users.",
        ),
        check(
            "PI-007", "Base64 encoded injection",
            AuditCategory::PromptInjection, AuditSeverity::Medium,
            r"(?i)(decode|eval|execute)\s+(this\s+)?base64\s*[:=]?\s*[A-Za-z0-9+/]{20,}",
            "Do not decode and execute arbitrary base64 content.",
        ),
        check(
            "PI-008", "Multi-turn manipulation",
            AuditCategory::PromptInjection, AuditSeverity::High,
            r"(?i)(forget|disregard|override)\s+(everything|all|what)\s+(you|i)\s+(said|told|know)",
            "Do not allow context manipulation via conversation history.",
        ),
    ]
}

// ---- Category 2: Exfiltration URL Detection (5+ checks) ----

fn exfiltration_url_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "EX-001", "ngrok tunnel URL",
            AuditCategory::ExfiltrationUrl, AuditSeverity::Critical,
            r"https?://[a-z0-9-]+\.ngrok\.(io|app|dev)",
            "Block ngrok tunnel URLs which may be used for data exfiltration.",
        ),
        check(
            "EX-002", "RequestBin/webhook.site URL",
            AuditCategory::ExfiltrationUrl, AuditSeverity::Critical,
            r"https?://(requestbin|webhook\.site|hookbin|pipedream)",
            "Block known data collection services.",
        ),
        check(
            "EX-003", "Pastebin/hastebin URL",
            AuditCategory::ExfiltrationUrl, AuditSeverity::High,
            r"https?://(pastebin|hastebin|paste\.ee|dpaste|bpa\.st)",
            "Block paste services that may be used for data exfiltration.",
        ),
        check(
            "EX-004", "Burp Collaborator URL",
            AuditCategory::ExfiltrationUrl, AuditSeverity::Critical,
            r"https?://[a-z0-9]+\.burpcollaborator\.net",
            "Block Burp Collaborator URLs used for security testing/exfiltration.",
        ),
        check(
            "EX-005", "Dynamic DNS data exfil",
            AuditCategory::ExfiltrationUrl, AuditSeverity::High,
            r"https?://[a-z0-9-]+\.(duckdns\.org|no-ip\.(com|org)|dynu\.com)",
            "Block dynamic DNS services commonly used for data exfiltration.",
        ),
        check(
            "EX-006", "IP literal URL",
            AuditCategory::ExfiltrationUrl, AuditSeverity::Medium,
            r"https?://\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}[:/]",
            "URLs with IP addresses instead of hostnames may indicate exfiltration.",
        ),
    ]
}

// ---- Category 3: Credential Literal Detection (5+ checks) ----

fn credential_literal_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "CL-001", "OpenAI API key literal",
            AuditCategory::CredentialLiteral, AuditSeverity::Critical,
            r"sk-proj-[A-Za-z0-9_-]{20,}",
            "Never hardcode API keys. Use environment variables or secret managers.",
        ),
        check(
            "CL-002", "AWS secret access key",
            AuditCategory::CredentialLiteral, AuditSeverity::Critical,
            r"(?i)(aws_secret_access_key|aws_secret)\s*[=:]\s*[A-Za-z0-9/+=]{30,}",
            "Store AWS credentials in environment variables, not in code.",
        ),
        check(
            "CL-003", "Generic API key assignment",
            AuditCategory::CredentialLiteral, AuditSeverity::High,
            r#"(?i)(api_key|apikey|api_secret|auth_token)\s*[=:]\s*['"][A-Za-z0-9_-]{16,}['"]"#,
            "Never hardcode API keys or tokens in source code.",
        ),
        check(
            "CL-004", "Private key block",
            AuditCategory::CredentialLiteral, AuditSeverity::Critical,
            r"-----BEGIN\s+(RSA\s+)?PRIVATE\s+KEY-----",
            "Never embed private keys in source code. Use key management services.",
        ),
        check(
            "CL-005", "GitHub personal access token",
            AuditCategory::CredentialLiteral, AuditSeverity::Critical,
            r"gh[ps]_[A-Za-z0-9_]{30,}",
            "Do not hardcode GitHub tokens. Use GITHUB_TOKEN or secrets.",
        ),
        check(
            "CL-006", "Password literal in assignment",
            AuditCategory::CredentialLiteral, AuditSeverity::High,
            r#"(?i)(password|passwd|pwd)\s*[=:]\s*['"][^'"]{6,}['"]"#,
            "Never hardcode passwords. Use environment variables or secret managers.",
        ),
    ]
}

// ---- Category 4: Permission Escalation (5+ checks) ----

fn permission_escalation_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "PE-001", "sudo usage",
            AuditCategory::PermissionEscalation, AuditSeverity::High,
            r"(?i)\bsudo\s+",
            "Avoid sudo in automated scripts. Use proper permission configuration.",
        ),
        check(
            "PE-002", "chmod 777",
            AuditCategory::PermissionEscalation, AuditSeverity::High,
            r"chmod\s+7[0-7][0-7]",
            "Avoid overly permissive file modes. Use minimal permissions.",
        ),
        check(
            "PE-003", "chown root",
            AuditCategory::PermissionEscalation, AuditSeverity::High,
            r"chown\s+(root|0)[:\s]",
            "Avoid changing file ownership to root in automated scripts.",
        ),
        check(
            "PE-004", "setuid/setgid modification",
            AuditCategory::PermissionEscalation, AuditSeverity::Critical,
            r"chmod\s+[2467][0-7]{3}|chmod\s+[ugo]\+s",
            "Do not set setuid/setgid bits. This is a privilege escalation risk.",
        ),
        check(
            "PE-005", "Docker privileged mode",
            AuditCategory::PermissionEscalation, AuditSeverity::Critical,
            r"(?i)(--privileged|privileged:\s*true|security_opt:\s*.*apparmor:unconfined)",
            "Never run containers in privileged mode.",
        ),
        check(
            "PE-006", "Capability add all",
            AuditCategory::PermissionEscalation, AuditSeverity::Critical,
            r"(?i)(cap_add|--cap-add)\s*[=:]\s*\[?\s*ALL",
            "Do not add all capabilities. Use minimal required capabilities.",
        ),
    ]
}

// ---- Category 5: Unsafe Shell Commands (5+ checks) ----

fn unsafe_shell_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "US-001", "Destructive rm command",
            AuditCategory::UnsafeShell, AuditSeverity::Critical,
            r"rm\s+-[a-zA-Z]*r[a-zA-Z]*f|rm\s+-[a-zA-Z]*f[a-zA-Z]*r",
            "Avoid recursive force delete. Use targeted deletions with confirmation.",
        ),
        check(
            "US-002", "eval/exec of variable",
            AuditCategory::UnsafeShell, AuditSeverity::High,
            r"(?i)(eval|exec)\s*\(\s*[\$@%]",
            "Never eval/exec untrusted input. Use parameterized commands.",
        ),
        check(
            "US-003", "curl piped to shell",
            AuditCategory::UnsafeShell, AuditSeverity::High,
            r"curl\s+.*\|\s*(ba)?sh|wget\s+.*\|\s*(ba)?sh",
            "Do not pipe remote content directly to shell. Verify before executing.",
        ),
        check(
            "US-004", "mkfs/dd destructive command",
            AuditCategory::UnsafeShell, AuditSeverity::Critical,
            r"(?i)(mkfs|dd\s+if=.*of=/dev/)",
            "Block filesystem destruction commands.",
        ),
        check(
            "US-005", "Fork bomb pattern",
            AuditCategory::UnsafeShell, AuditSeverity::Critical,
            r":\(\)\s*\{\s*:\|:\s*&\s*\}\s*;|fork\s*\(\s*\)\s*;?\s*fork\s*\(",
            "Block fork bomb patterns.",
        ),
        check(
            "US-006", "Unquoted variable expansion",
            AuditCategory::UnsafeShell, AuditSeverity::Medium,
            r#"\$\{?\w+\}?\s+[|;&]"#,
            "Quote shell variable expansions to prevent injection.",
        ),
    ]
}

// ---- Category 6: Supply Chain Risk (5+ checks) ----

fn supply_chain_risk_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "SC-001", "Typosquatting package names",
            AuditCategory::SupplyChainRisk, AuditSeverity::High,
            r"(?i)(requets|reqeusts|requestss|crypt0|crytpo|lodahs|axois|exprss)",
            "Verify package names for typosquatting. Use exact, verified names.",
        ),
        check(
            "SC-002", "Preinstall/postinstall scripts",
            AuditCategory::SupplyChainRisk, AuditSeverity::Medium,
            r#"(?i)"(preinstall|postinstall|preuninstall)"\s*:"#,
            "Review install scripts for malicious behavior before running.",
        ),
        check(
            "SC-003", "Wildcard dependency version",
            AuditCategory::SupplyChainRisk, AuditSeverity::Medium,
            r#"(?i)"[^"]+"\s*:\s*"\*""#,
            "Pin dependency versions. Wildcard versions allow arbitrary updates.",
        ),
        check(
            "SC-004", "Git URL dependency",
            AuditCategory::SupplyChainRisk, AuditSeverity::Medium,
            r"(?i)(git\+https?://|git://|ssh://git@)",
            "Prefer published package versions over git dependencies.",
        ),
        check(
            "SC-005", "Unsigned/unverified download",
            AuditCategory::SupplyChainRisk, AuditSeverity::High,
            r"(?i)(--no-check-certificate|--insecure|-k\s+https?://)",
            "Always verify TLS certificates for downloads.",
        ),
        check(
            "SC-006", "Dynamic code loading from URL",
            AuditCategory::SupplyChainRisk, AuditSeverity::High,
            r#"(?i)(import|require|load|source)\s*\(?\s*['"]https?://"#,
            "Do not dynamically load code from remote URLs.",
        ),
    ]
}

// ---- Category 7: Denial of Service (5+ checks) ----

fn denial_of_service_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "DS-001", "Infinite loop pattern",
            AuditCategory::DenialOfService, AuditSeverity::High,
            r"(?i)(while\s*\(\s*true\s*\)|while\s+true\b|loop\s*\{|for\s*\(\s*;\s*;\s*\))",
            "Avoid unbounded loops. Add termination conditions.",
        ),
        check(
            "DS-002", "Fork bomb",
            AuditCategory::DenialOfService, AuditSeverity::Critical,
            r"(?i)(fork\s*\(\s*\)|:\(\)\s*\{)",
            "Block process fork bombs.",
        ),
        check(
            "DS-003", "Excessive allocation",
            AuditCategory::DenialOfService, AuditSeverity::Medium,
            r"(?i)(vec!\[0;\s*\d{9,}\]|new\s+Array\s*\(\s*\d{9,}\s*\)|malloc\s*\(\s*\d{9,}\s*\))",
            "Avoid allocating excessively large buffers.",
        ),
        check(
            "DS-004", "Regex catastrophic backtracking",
            AuditCategory::DenialOfService, AuditSeverity::Medium,
            r"\([^)]*\+\)\+|\([^)]*\*\)\*|\([^)]*\+\)\*|\([^)]*\*\)\+",
            "Avoid nested quantifiers in regex that cause exponential backtracking.",
        ),
        check(
            "DS-005", "Unbounded recursion hint",
            AuditCategory::DenialOfService, AuditSeverity::Medium,
            r"(?i)(recursive|recurse|self_call|call_self)\b",
            "Add recursion depth limits to prevent stack overflow.",
        ),
        check(
            "DS-006", "Sleep zero / busy wait",
            AuditCategory::DenialOfService, AuditSeverity::Medium,
            r"(?i)(sleep\s*\(\s*0\s*\)|thread::yield_now\s*\(\s*\)\s*;?\s*\})",
            "Avoid busy-wait patterns. Use proper async or blocking primitives.",
        ),
    ]
}

// ---- Category 8: Indirect Prompt Injection (5+ checks) ----

fn indirect_prompt_injection_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "IP-001", "Hidden text injection (HTML comment)",
            AuditCategory::IndirectPromptInjection, AuditSeverity::High,
            r"<!--\s*(?i)(ignore|system|instruction|override)",
            "Strip HTML comments that contain instruction-like content.",
        ),
        check(
            "IP-002", "Zero-width character injection",
            AuditCategory::IndirectPromptInjection, AuditSeverity::High,
            r"[\u{200B}\u{200C}\u{200D}\u{FEFF}]{3,}",
            "Strip zero-width characters that may hide injected content.",
        ),
        check(
            "IP-003", "Markdown image with instruction payload",
            AuditCategory::IndirectPromptInjection, AuditSeverity::Medium,
            r"!\[(?i)(ignore|system|instruction)[^\]]*\]\([^)]+\)",
            "Sanitize markdown images that carry instruction payloads.",
        ),
        check(
            "IP-004", "Data URI with embedded instructions",
            AuditCategory::IndirectPromptInjection, AuditSeverity::High,
            r"data:[^,]+;base64,[A-Za-z0-9+/=]{50,}",
            "Block large data URIs that may contain hidden instructions.",
        ),
        check(
            "IP-005", "Unicode direction override",
            AuditCategory::IndirectPromptInjection, AuditSeverity::Medium,
            r"[\u{202A}\u{202B}\u{202C}\u{202D}\u{202E}\u{2066}\u{2067}\u{2068}\u{2069}]",
            "Strip Unicode directional override characters.",
        ),
    ]
}

// ---- Category 9: Information Disclosure (3+ checks) ----

fn information_disclosure_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "ID-001", "Stack trace / internal path exposure",
            AuditCategory::InformationDisclosure, AuditSeverity::Medium,
            r"(?i)(at\s+\S+\.rs:\d+|traceback|stack\s*trace|panicked\s+at)",
            "Do not expose internal stack traces or file paths to users.",
        ),
        check(
            "ID-002", "Internal IP/hostname disclosure",
            AuditCategory::InformationDisclosure, AuditSeverity::Medium,
            r"(?i)(10\.\d{1,3}\.\d{1,3}\.\d{1,3}|172\.(1[6-9]|2\d|3[01])\.\d{1,3}\.\d{1,3}|192\.168\.\d{1,3}\.\d{1,3})\b",
            "Do not expose internal network addresses.",
        ),
        check(
            "ID-003", "Database connection string",
            AuditCategory::InformationDisclosure, AuditSeverity::High,
            r"(?i)(postgres|mysql|mongodb|redis)://\S+:\S+@\S+",
            "Do not expose database connection strings with credentials.",
        ),
        check(
            "ID-004", "Verbose error with user data",
            AuditCategory::InformationDisclosure, AuditSeverity::Medium,
            r"(?i)error.*:.*email|error.*:.*user(name)?|exception.*password",
            "Avoid exposing user data in error messages.",
        ),
    ]
}

// ---- Category 10: Cross-Agent Access Violations (3+ checks) ----

fn cross_agent_access_checks() -> Vec<AuditCheck> {
    vec![
        check(
            "CA-001", "Agent workspace escape",
            AuditCategory::CrossAgentAccess, AuditSeverity::High,
            r"(?i)\.\./\.\./|/home/\w+/\.clawft/agents/\w+",
            "Do not access other agents' workspaces.",
        ),
        check(
            "CA-002", "Agent config file access",
            AuditCategory::CrossAgentAccess, AuditSeverity::High,
            r"(?i)\.clawft/agents/[^/]+/config\.(toml|json|yaml)",
            "Do not read other agents' configuration files.",
        ),
        check(
            "CA-003", "Agent session file access",
            AuditCategory::CrossAgentAccess, AuditSeverity::High,
            r"(?i)\.clawft/sessions/[^/]+/(memory|history|state)",
            "Do not access other agents' session data.",
        ),
        check(
            "CA-004", "Inter-agent message tampering",
            AuditCategory::CrossAgentAccess, AuditSeverity::Critical,
            r"(?i)(forge|spoof|impersonate)\s+(agent|message|identity)",
            "Do not forge messages between agents.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_checks_compile() {
        let checks = all_checks();
        assert!(checks.len() >= 50, "got {} checks", checks.len());
    }

    #[test]
    fn all_patterns_are_valid_regex() {
        let checks = all_checks();
        for check in &checks {
            // If the regex was invalid, the constructor would have panicked.
            assert!(!check.id.is_empty(), "check ID should not be empty");
            assert!(!check.name.is_empty(), "check name should not be empty");
        }
    }

    #[test]
    fn check_ids_are_unique() {
        let checks = all_checks();
        let mut ids = std::collections::HashSet::new();
        for check in &checks {
            assert!(ids.insert(&check.id), "duplicate check ID: {}", check.id);
        }
    }

    #[test]
    fn pi001_detects_ignore_instructions() {
        let checks = all_checks();
        let pi001 = checks.iter().find(|c| c.id == "PI-001").unwrap();
        assert!(pi001.pattern.is_match("ignore previous instructions"));
        assert!(pi001.pattern.is_match("IGNORE ALL PRIOR RULES"));
    }

    #[test]
    fn cl001_detects_openai_key() {
        let checks = all_checks();
        let cl001 = checks.iter().find(|c| c.id == "CL-001").unwrap();
        assert!(cl001.pattern.is_match("sk-proj-abcdef1234567890abcdef"));
    }

    #[test]
    fn ex001_detects_ngrok() {
        let checks = all_checks();
        let ex001 = checks.iter().find(|c| c.id == "EX-001").unwrap();
        assert!(ex001.pattern.is_match("https://abc123.ngrok.io/data"));
    }

    #[test]
    fn us001_detects_rm_rf() {
        let checks = all_checks();
        let us001 = checks.iter().find(|c| c.id == "US-001").unwrap();
        assert!(us001.pattern.is_match("rm -rf /"));
        assert!(us001.pattern.is_match("rm -fr /tmp"));
    }

    #[test]
    fn ds001_detects_infinite_loop() {
        let checks = all_checks();
        let ds001 = checks.iter().find(|c| c.id == "DS-001").unwrap();
        assert!(ds001.pattern.is_match("while(true) { }"));
        assert!(ds001.pattern.is_match("loop {"));
    }
}
