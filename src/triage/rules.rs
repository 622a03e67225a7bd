//! Pre-model fast path for unmistakable promotional mail.
//!
//! Runs before the reasoning call to short-circuit only the most obvious
//! noise — noreply senders, newsletter digests, unsubscribe footers. An
//! important-pattern guard (interviews, offers, meeting invites) always
//! defers to the model, so anything ambiguous still gets the full triage
//! prompt with its prefer-notify instruction.

use regex::Regex;
use tracing::debug;

use crate::message::InboundMessage;
use crate::triage::types::{TriageResponse, TriageResult};

/// Which message field a rule matches against.
#[derive(Debug, Clone, Copy)]
pub enum RuleField {
    Sender,
    Subject,
    Body,
}

/// A single short-circuit rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub regex: Regex,
    pub field: RuleField,
    /// Why this rule triggers; becomes the decision's justification.
    pub reason: String,
}

/// Conservative promotional-mail filter.
pub struct RulesEngine {
    ignore_rules: Vec<IgnoreRule>,
    /// Subject/body patterns that must never be short-circuited.
    guard_patterns: Vec<Regex>,
}

impl RulesEngine {
    /// The default rule set.
    pub fn default_rules() -> Self {
        let ignore_rules = vec![
            IgnoreRule {
                regex: Regex::new(r"(?i)^no[\-_.]?reply@").unwrap(),
                field: RuleField::Sender,
                reason: "noreply sender".into(),
            },
            IgnoreRule {
                regex: Regex::new(r"(?i)^(mailer[\-_]?daemon|postmaster)@").unwrap(),
                field: RuleField::Sender,
                reason: "automated mail system".into(),
            },
            IgnoreRule {
                regex: Regex::new(r"(?i)@(marketing|newsletter|promo|campaign)\b").unwrap(),
                field: RuleField::Sender,
                reason: "marketing/newsletter sender".into(),
            },
            IgnoreRule {
                regex: Regex::new(r"(?i)\b(weekly|daily) digest\b").unwrap(),
                field: RuleField::Subject,
                reason: "digest mailing".into(),
            },
            IgnoreRule {
                regex: Regex::new(r"(?i)personalized .*for you").unwrap(),
                field: RuleField::Subject,
                reason: "personalized promotional content".into(),
            },
            IgnoreRule {
                regex: Regex::new(
                    r"(?i)(click here to unsubscribe|manage your subscription|email preferences|opt[- ]?out)",
                )
                .unwrap(),
                field: RuleField::Body,
                reason: "bulk mail (unsubscribe footer)".into(),
            },
        ];

        // Career and meeting mail is never filtered, whatever else matches.
        let guard_patterns = vec![
            Regex::new(r"(?i)\bassignment review\b").unwrap(),
            Regex::new(r"(?i)\binterview\b").unwrap(),
            Regex::new(r"(?i)\bjob offer\b").unwrap(),
            Regex::new(r"(?i)\bmeeting invitation\b").unwrap(),
            Regex::new(r"(?i)\bcalendar invite\b").unwrap(),
        ];

        Self {
            ignore_rules,
            guard_patterns,
        }
    }

    /// An engine with no rules — every message goes to the model.
    pub fn empty() -> Self {
        Self {
            ignore_rules: Vec::new(),
            guard_patterns: Vec::new(),
        }
    }

    /// Add a custom ignore rule.
    pub fn add_ignore(&mut self, rule: IgnoreRule) {
        self.ignore_rules.push(rule);
    }

    /// Short-circuit decision, or `None` to defer to the model.
    ///
    /// Matches on the full sender address and subject/body text — never on
    /// a display name.
    pub fn evaluate(&self, message: &InboundMessage) -> Option<TriageResult> {
        if self
            .guard_patterns
            .iter()
            .any(|p| p.is_match(&message.subject) || p.is_match(&message.body))
        {
            return None;
        }

        for rule in &self.ignore_rules {
            let haystack = match rule.field {
                RuleField::Sender => &message.sender,
                RuleField::Subject => &message.subject,
                RuleField::Body => &message.body,
            };
            if rule.regex.is_match(haystack) {
                debug!(
                    id = %message.id,
                    sender = %message.sender,
                    reason = %rule.reason,
                    "Fast-path rule matched"
                );
                return Some(TriageResult {
                    logic: format!("Clearly promotional content: {}", rule.reason),
                    response: TriageResponse::No,
                });
            }
        }

        None
    }
}
