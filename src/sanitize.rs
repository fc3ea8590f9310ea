use regex::Regex;

/// Replacement for every redacted match. Must never itself match a rule,
/// otherwise sanitization would not be idempotent.
pub const REDACTION_TOKEN: &str = "[redacted]";

/// Appended when content is cut; counted inside the length limit.
pub const TRUNCATION_MARKER: char = '…';

pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 500;

/// Redacts PII-looking substrings, truncates, and normalizes whitespace.
/// Deterministic and idempotent; the rule list is data, not logic.
///
/// The separator classes in the default rules deliberately exclude
/// whitespace: normalization runs last and collapses whitespace runs, and a
/// rule that matched across whitespace could gain new matches on a second
/// pass.
#[derive(Debug, Clone)]
pub struct ContentSanitizer {
    rules: Vec<Regex>,
    max_len: usize,
}

impl Default for ContentSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_LENGTH)
    }
}

impl ContentSanitizer {
    pub fn new(max_len: usize) -> Self {
        Self::with_rules(default_rules(), max_len)
    }

    pub fn with_rules(rules: Vec<Regex>, max_len: usize) -> Self {
        Self { rules, max_len }
    }

    /// Redact, then truncate (char-based), then normalize whitespace.
    /// Never fails; empty input yields empty output.
    pub fn sanitize(&self, content: &str) -> String {
        if content.is_empty() {
            return String::new();
        }

        let mut text = content.to_string();
        for rule in &self.rules {
            text = rule.replace_all(&text, REDACTION_TOKEN).into_owned();
        }

        let text = truncate_chars(&text, self.max_len);
        normalize_whitespace(&text)
    }
}

fn truncate_chars(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut kept: String = text.chars().take(max_len.saturating_sub(1)).collect();
    kept.push(TRUNCATION_MARKER);
    kept
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn default_rules() -> Vec<Regex> {
    [
        // Korean resident registration number, before the phone rules so a
        // full RRN is never half-eaten as a phone number.
        r"\d{6}[-.]?[1-4]\d{6}",
        // Mobile phone.
        r"01[016789][-.]?\d{3,4}[-.]?\d{4}",
        // Landline / any dash-separated phone shape.
        r"\d{2,3}[-.]\d{3,4}[-.]\d{4}",
        // Email.
        r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("redaction pattern is a valid regex"))
    .collect()
}
