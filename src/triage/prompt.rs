//! Triage prompt template and placeholder substitution.
//!
//! Templates use `{placeholder}` positions filled from the profile and the
//! inbound message, with `{{` / `}}` escaping literal braces. Substitution
//! fails when a template references a placeholder with no corresponding
//! field — a profile with a bad custom template is rejected at load time.

use std::collections::HashMap;

use crate::error::ConfigError;

/// The built-in triage template. `custom_triage_prompt` replaces it wholesale.
pub const DEFAULT_TRIAGE_PROMPT: &str = "\
You are {full_name}'s executive assistant. Help {name} manage emails efficiently.

{background}

YOUR ROLE:
You must determine how to handle each email by classifying it as:
- IGNORE (respond 'no'): Promotional content, newsletters, mass emails, irrelevant updates
- RESPOND (respond 'email'): Messages requiring a direct response
- NOTIFY (respond 'notify'): Important information {name} should know but doesn't need to respond to
- ASK (respond 'question'): You need input from {name} before this email can be handled

SMART TRIAGE GUIDELINES:
- Career advancement is the highest priority (respond or notify)
- Meeting invitations for interviews, reviews, or professional development are critical
- Academic communications from professors or about coursework require responses
- Personal communications from friends and family should receive responses
- Mass emails, newsletters, marketing, and promotional content should be ignored
- If you are unsure whether {name} needs to see an email, respond 'notify' — never 'no'.
  Uncertainty must not suppress a potentially important message.
- Judge senders by their full email address, never by display name alone. Two senders
  sharing a first name are different people unless their addresses match.

IGNORE THESE (examples):
{triage_no}

RESPOND TO THESE (examples):
{triage_email}

NOTIFY ABOUT THESE (examples):
{triage_notify}

{fewshotexamples}

Analyze the following email and use your judgment about what would be most helpful for {name}:
From: {author}
To: {to}
Subject: {subject}
{email_thread}

Respond with JSON: {{ \"logic\": \"your reasoning here\", \"response\": \"no\" | \"email\" | \"notify\" | \"question\" }}";

/// Every placeholder a template may reference: the persisted profile
/// fields plus the per-invocation message fields.
const KNOWN_PLACEHOLDERS: [&str; 17] = [
    "email",
    "full_name",
    "name",
    "background",
    "schedule_preferences",
    "background_preferences",
    "response_preferences",
    "rewrite_preferences",
    "timezone",
    "triage_no",
    "triage_notify",
    "triage_email",
    "fewshotexamples",
    "author",
    "to",
    "subject",
    "email_thread",
];

/// Substitute `{placeholder}` positions from `values`.
pub fn render(template: &str, values: &HashMap<&str, String>) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(template.len() + 256);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(inner) => name.push(inner),
                        None => {
                            return Err(ConfigError::ParseError(format!(
                                "unclosed placeholder '{{{name}'"
                            )));
                        }
                    }
                }
                match values.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => return Err(ConfigError::UnknownPlaceholder { name }),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Check a template against the known placeholder set without rendering.
pub fn validate_template(template: &str) -> Result<(), ConfigError> {
    let dummy: HashMap<&str, String> = KNOWN_PLACEHOLDERS
        .iter()
        .map(|name| (*name, String::new()))
        .collect();
    render(template, &dummy).map(|_| ())
}
