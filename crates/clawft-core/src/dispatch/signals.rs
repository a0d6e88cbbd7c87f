//! Text-parsed signal extraction: IOC detection, ticket IDs, and the risk
//! markers workflows scan tool output for.
//!
//! These heuristics are isolated here (rather than inlined in the router or
//! a workflow node) so they can be replaced without touching call sites, per
//! the single shared extractor used by both [`super::router`] and
//! [`super::workflows`].

/// Indicator-of-compromise type, in extraction precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IocType {
    Url,
    Hash,
    Ip,
    Domain,
}

impl IocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IocType::Url => "url",
            IocType::Hash => "hash",
            IocType::Ip => "ip",
            IocType::Domain => "domain",
        }
    }
}

const ALLOWED_TLDS: &[&str] = &["com", "net", "org", "io", "co", "info", "biz", "xyz"];
const EXCLUDED_DOMAINS: &[&str] = &["example.com", "test.com"];

/// Extract the first indicator of compromise found in free text.
///
/// Precedence: URL, then hash (64/40/32 hex chars), then IPv4 (private and
/// loopback ranges excluded), then domain (TLD allow-listed, excluded
/// domains and extra `excluded_domains` filtered out).
pub fn extract_ioc(text: &str, excluded_domains: &[String]) -> Option<(String, IocType)> {
    if let Some(url) = extract_url(text) {
        return Some((url, IocType::Url));
    }
    if let Some(hash) = extract_hash(text) {
        return Some((hash, IocType::Hash));
    }
    if let Some(ip) = extract_ip(text) {
        return Some((ip, IocType::Ip));
    }
    if let Some(domain) = extract_domain(text, excluded_domains) {
        return Some((domain, IocType::Domain));
    }
    None
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace()).filter(|w| !w.is_empty())
}

fn trim_punct(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.' && c != ':' && c != '/')
}

fn extract_url(text: &str) -> Option<String> {
    tokens(text)
        .find(|w| w.starts_with("http://") || w.starts_with("https://"))
        .map(|w| trim_punct(w).to_string())
}

fn extract_hash(text: &str) -> Option<String> {
    let is_hex = |w: &str| !w.is_empty() && w.bytes().all(|b| b.is_ascii_hexdigit());
    let mut best: Option<String> = None;
    let mut best_len = 0usize;
    for word in tokens(text) {
        let word = trim_punct(word);
        if !is_hex(word) {
            continue;
        }
        let len = word.len();
        if (len == 64 || len == 40 || len == 32) && len > best_len {
            best_len = len;
            best = Some(word.to_string());
        }
    }
    best
}

fn parse_ipv4(word: &str) -> Option<[u8; 4]> {
    let parts: Vec<&str> = word.split('.').collect();
    if parts.len() != 4 {
        return None;
    }
    let mut octets = [0u8; 4];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || (part.len() > 1 && part.starts_with('0')) {
            return None;
        }
        octets[i] = part.parse::<u16>().ok().filter(|v| *v <= 255)? as u8;
    }
    Some(octets)
}

fn is_private_or_loopback(octets: [u8; 4]) -> bool {
    match octets {
        [10, ..] => true,
        [172, b, ..] if (16..=31).contains(&b) => true,
        [192, 168, ..] => true,
        [127, ..] => true,
        _ => false,
    }
}

fn extract_ip(text: &str) -> Option<String> {
    for word in tokens(text) {
        let word = trim_punct(word);
        if let Some(octets) = parse_ipv4(word) {
            if !is_private_or_loopback(octets) {
                return Some(word.to_string());
            }
        }
    }
    None
}

fn extract_domain(text: &str, excluded_domains: &[String]) -> Option<String> {
    for word in tokens(text) {
        let word = trim_punct(word).to_lowercase();
        if !word.contains('.') || word.contains('/') || word.contains(':') {
            continue;
        }
        if parse_ipv4(&word).is_some() {
            continue;
        }
        let Some(tld) = word.rsplit('.').next() else {
            continue;
        };
        if !ALLOWED_TLDS.contains(&tld) {
            continue;
        }
        if EXCLUDED_DOMAINS.contains(&word.as_str())
            || excluded_domains.iter().any(|d| d.eq_ignore_ascii_case(&word))
        {
            continue;
        }
        return Some(word);
    }
    None
}

/// Extract a ticket/case/incident identifier from free text.
///
/// Matches `(?:ticket|case|incident)\s*#?\s*(\d+)` first, falling back to a
/// bare `#(\d{6,})` reference with no keyword.
pub fn extract_ticket_id(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for keyword in ["ticket", "case", "incident"] {
        if let Some(pos) = lower.find(keyword) {
            let rest = &text[pos + keyword.len()..];
            if let Some(digits) = leading_digits_after_punct(rest) {
                return Some(digits);
            }
        }
    }
    // Bare `#123456` (six or more digits) with no keyword.
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' {
            let digits = leading_digits(&text[i + 1..]);
            if digits.len() >= 6 {
                return Some(digits);
            }
        }
    }
    None
}

/// Skip whitespace and an optional `#`, then read leading digits.
fn leading_digits_after_punct(rest: &str) -> Option<String> {
    let mut chars = rest.chars().peekable();
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
    if matches!(chars.peek(), Some('#')) {
        chars.next();
    }
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
    let digits: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

fn leading_digits(rest: &str) -> String {
    rest.chars().take_while(|c| c.is_ascii_digit()).collect()
}

/// Whether `text` contains an explicit "HIGH"/"MALICIOUS" marker, the kind
/// tool output uses to flag high-severity findings.
pub fn has_high_marker(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper.contains("HIGH") || upper.contains("MALICIOUS")
}

/// Whether `text` contains a "MEDIUM"/"SUSPICIOUS" marker.
pub fn has_medium_marker(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper.contains("MEDIUM") || upper.contains("SUSPICIOUS")
}

/// Whether `text` mentions a CVE identifier or the word "vuln"/"vulnerability".
pub fn has_vuln_marker(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper.contains("CVE-") || upper.contains("VULN")
}

/// Parse a `"Risk Score: N/99"`-style marker out of Recorded Future text.
pub fn parse_risk_score(text: &str) -> Option<u32> {
    let marker = "Risk Score:";
    let pos = text.find(marker)?;
    let rest = &text[pos + marker.len()..];
    let digits = leading_digits(rest.trim_start());
    digits.parse().ok()
}
