//! Memory store collaborator — prior triage decisions fed back as
//! few-shot guidance.
//!
//! The read path fills the `{fewshotexamples}` slot of the triage prompt;
//! the write path records each `(message, result)` pair after a decision.
//! Both are gated by the profile's `memory` flag. Consistency across
//! concurrent invocations is the store's concern, not the decider's.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::MemoryError;
use crate::message::InboundMessage;
use crate::triage::types::TriageResult;

/// Max characters of body text kept per example.
const EXAMPLE_BODY_CHARS: usize = 200;

/// A prior labeled decision.
#[derive(Debug, Clone)]
pub struct TriageExample {
    pub author: String,
    pub subject: String,
    pub body_preview: String,
    pub result: TriageResult,
}

impl TriageExample {
    fn from_decision(message: &InboundMessage, result: &TriageResult) -> Self {
        Self {
            author: message.sender.clone(),
            subject: message.subject.clone(),
            body_preview: message.body.chars().take(EXAMPLE_BODY_CHARS).collect(),
            result: result.clone(),
        }
    }
}

/// Storage for prior decisions. Read path fills the few-shot block.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Examples relevant to this message, oldest first.
    async fn examples_for(
        &self,
        message: &InboundMessage,
    ) -> Result<Vec<TriageExample>, MemoryError>;

    /// Record one decision.
    async fn record(
        &self,
        message: &InboundMessage,
        result: &TriageResult,
    ) -> Result<(), MemoryError>;
}

/// Render examples in the prompt's few-shot block format.
///
/// Empty input renders to an empty string so the template slot collapses.
pub fn format_few_shot(examples: &[TriageExample]) -> String {
    if examples.is_empty() {
        return String::new();
    }

    let mut block = String::from("PRIOR EXAMPLES:\n");
    for example in examples {
        block.push_str(&format!(
            "\nEmail From: {}\nEmail Subject: {}\nEmail Content:\n{}\n> Triage Result: {}\n",
            example.author,
            example.subject,
            example.body_preview,
            example.result.response.label(),
        ));
    }
    block
}

/// Bounded, non-persistent store — the in-memory execution mode.
pub struct InMemoryStore {
    entries: RwLock<VecDeque<TriageExample>>,
    capacity: usize,
    max_examples: usize,
}

impl InMemoryStore {
    /// `capacity` bounds retained decisions; `max_examples` bounds how many
    /// feed a single prompt.
    pub fn new(capacity: usize, max_examples: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            max_examples,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(100, 5)
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn examples_for(
        &self,
        _message: &InboundMessage,
    ) -> Result<Vec<TriageExample>, MemoryError> {
        let entries = self.entries.read().await;
        let skip = entries.len().saturating_sub(self.max_examples);
        Ok(entries.iter().skip(skip).cloned().collect())
    }

    async fn record(
        &self,
        message: &InboundMessage,
        result: &TriageResult,
    ) -> Result<(), MemoryError> {
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(TriageExample::from_decision(message, result));
        Ok(())
    }
}

/// No-op store for runs with memory disabled.
pub struct NullMemoryStore;

#[async_trait]
impl MemoryStore for NullMemoryStore {
    async fn examples_for(
        &self,
        _message: &InboundMessage,
    ) -> Result<Vec<TriageExample>, MemoryError> {
        Ok(Vec::new())
    }

    async fn record(
        &self,
        _message: &InboundMessage,
        _result: &TriageResult,
    ) -> Result<(), MemoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::types::TriageResponse;

    fn msg(subject: &str) -> InboundMessage {
        InboundMessage::new(
            "priya@lab.org",
            vec!["aryan@university.edu".into()],
            subject,
            "body text",
        )
    }

    fn result(response: TriageResponse) -> TriageResult {
        TriageResult {
            logic: "because".into(),
            response,
        }
    }

    #[tokio::test]
    async fn records_and_returns_recent_examples() {
        let store = InMemoryStore::new(10, 2);
        for i in 0..3 {
            store
                .record(&msg(&format!("subject {i}")), &result(TriageResponse::Email))
                .await
                .unwrap();
        }
        let examples = store.examples_for(&msg("query")).await.unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].subject, "subject 1");
        assert_eq!(examples[1].subject, "subject 2");
    }

    #[tokio::test]
    async fn capacity_evicts_oldest() {
        let store = InMemoryStore::new(2, 10);
        for i in 0..3 {
            store
                .record(&msg(&format!("subject {i}")), &result(TriageResponse::No))
                .await
                .unwrap();
        }
        let examples = store.examples_for(&msg("query")).await.unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].subject, "subject 1");
    }

    #[test]
    fn few_shot_block_format() {
        let examples = vec![TriageExample {
            author: "news@promo.com".into(),
            subject: "Weekly digest".into(),
            body_preview: "Top stories...".into(),
            result: result(TriageResponse::No),
        }];
        let block = format_few_shot(&examples);
        assert!(block.starts_with("PRIOR EXAMPLES:"));
        assert!(block.contains("Email From: news@promo.com"));
        assert!(block.contains("> Triage Result: no"));
    }

    #[test]
    fn empty_examples_render_empty() {
        assert_eq!(format_few_shot(&[]), "");
    }
}
