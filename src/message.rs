//! Inbound message types — one transient value per triage invocation.

use chrono::{DateTime, Utc};
use mail_parser::MessageParser;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound email, reduced to the fields triage needs.
///
/// Not persisted by this subsystem. Sender and recipients are full mailbox
/// addresses — identity disambiguation (same display name, different
/// mailbox) is delegated to the reasoning step, which is instructed to
/// compare addresses, never names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Unique ID (provider-native or generated).
    pub id: String,
    /// Sender mailbox address.
    pub sender: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Thread body text, quote-stripped.
    pub body: String,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    /// Build a message from already-extracted fields.
    pub fn new(
        sender: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: sender.into(),
            to,
            subject: subject.into(),
            body: body.into(),
            received_at: Utc::now(),
        }
    }

    /// Parse a raw RFC822 message.
    ///
    /// Returns `None` when the bytes aren't parseable as mail or carry no
    /// sender address — such input never reaches triage.
    pub fn from_rfc822(raw: &[u8]) -> Option<Self> {
        let parsed = MessageParser::new().parse(raw)?;

        let sender = extract_addresses(parsed.from()).into_iter().next()?;
        let to = extract_addresses(parsed.to());
        let subject = parsed.subject().unwrap_or_default().to_string();
        let body = strip_quoted_text(parsed.body_text(0).unwrap_or_default().as_ref());

        Some(Self {
            id: parsed
                .message_id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            sender,
            to,
            subject,
            body,
            received_at: Utc::now(),
        })
    }

    /// Recipients as a single comma-joined string for prompt substitution.
    pub fn to_line(&self) -> String {
        self.to.join(", ")
    }
}

/// Syntactic mailbox address check. Identity resolution is out of scope.
pub fn is_valid_address(addr: &str) -> bool {
    let Some((local, domain)) = addr.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !addr.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

/// Strip quoted text from an email body.
///
/// Removes `>`-prefixed reply lines and everything below an
/// "On ... wrote:" attribution or "--- Original Message ---" separator.
/// Pure string parsing, no LLM involved.
pub fn strip_quoted_text(body: &str) -> String {
    let mut result = Vec::new();
    let mut skip_rest = false;

    for line in body.lines() {
        if skip_rest {
            break;
        }

        let trimmed = line.trim();

        if trimmed.starts_with('>') {
            continue;
        }

        if trimmed.starts_with("On ") && trimmed.ends_with("wrote:") {
            skip_rest = true;
            continue;
        }

        if trimmed.starts_with("---") && trimmed.contains("Original Message") {
            skip_rest = true;
            continue;
        }

        result.push(line);
    }

    while result.last().is_some_and(|l| l.trim().is_empty()) {
        result.pop();
    }

    result.join("\n")
}

/// Extract email addresses from an optional mail_parser Address field.
fn extract_addresses(addr: Option<&mail_parser::Address>) -> Vec<String> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    match addr {
        mail_parser::Address::List(addrs) => addrs
            .iter()
            .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            .collect(),
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| {
                g.addresses
                    .iter()
                    .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            })
            .collect(),
    }
}
