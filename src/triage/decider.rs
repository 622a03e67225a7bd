//! The triage decision interface.
//!
//! One call per inbound message: assemble the prompt from the profile and
//! message, invoke the reasoning runtime, strict-parse the decision.
//! Stateless across calls — the profile is read-only for the duration of
//! an invocation, so any number of decisions may run concurrently.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{ConfigError, TriageError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::memory::{MemoryStore, format_few_shot};
use crate::message::{InboundMessage, is_valid_address};
use crate::profile::Profile;
use crate::triage::prompt::{self, DEFAULT_TRIAGE_PROMPT};
use crate::triage::rules::RulesEngine;
use crate::triage::types::{TriageResponse, TriageResult};

/// Max tokens for the triage call (kept tight — runs on every message).
const TRIAGE_MAX_TOKENS: u64 = 512;

/// Temperature for triage (deterministic-ish).
const TRIAGE_TEMPERATURE: f64 = 0.0;

/// Produces a [`TriageResult`] for each `(Profile, InboundMessage)` pair.
pub struct TriageDecider {
    llm: Arc<dyn LlmProvider>,
    memory: Arc<dyn MemoryStore>,
    rules: RulesEngine,
}

impl TriageDecider {
    pub fn new(llm: Arc<dyn LlmProvider>, memory: Arc<dyn MemoryStore>) -> Self {
        Self {
            llm,
            memory,
            rules: RulesEngine::default_rules(),
        }
    }

    /// Replace the fast-path rules engine.
    pub fn with_rules(mut self, rules: RulesEngine) -> Self {
        self.rules = rules;
        self
    }

    /// Triage one message.
    ///
    /// Never converts a failure into a `no` classification: a bad decision
    /// from the runtime is [`TriageError::MalformedDecision`], an
    /// unreachable runtime is [`TriageError::UpstreamUnavailable`]. Retry
    /// and timeout policy belong to the caller.
    pub async fn decide(
        &self,
        profile: &Arc<Profile>,
        message: &InboundMessage,
    ) -> Result<TriageResult, TriageError> {
        if !is_valid_address(&message.sender) {
            return Err(TriageError::InvalidSender(message.sender.clone()));
        }

        info!(
            id = %message.id,
            sender = %message.sender,
            subject = %message.subject,
            "Triaging message"
        );

        if let Some(result) = self.rules.evaluate(message) {
            debug!(
                id = %message.id,
                response = result.response.label(),
                "Fast-path rule decided — skipping reasoning call"
            );
            return Ok(result);
        }

        let fewshot = if profile.memory {
            match self.memory.examples_for(message).await {
                Ok(examples) => format_few_shot(&examples),
                Err(e) => {
                    warn!(error = %e, "Memory lookup failed, triaging without examples");
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let prompt_text = self.assemble_prompt(profile, message, &fewshot)?;

        let request = CompletionRequest::new(vec![ChatMessage::user(prompt_text)])
            .with_temperature(TRIAGE_TEMPERATURE)
            .with_max_tokens(TRIAGE_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let result = parse_decision(&response.content)?;

        if profile.memory {
            if let Err(e) = self.memory.record(message, &result).await {
                warn!(error = %e, id = %message.id, "Failed to record decision in memory");
            }
        }

        info!(
            id = %message.id,
            response = result.response.label(),
            "Triage decision"
        );
        Ok(result)
    }

    /// Fill the template from profile and message fields.
    ///
    /// Fails with [`ConfigError::UnknownPlaceholder`] when the profile's
    /// custom template references a field that doesn't exist.
    pub fn assemble_prompt(
        &self,
        profile: &Profile,
        message: &InboundMessage,
        fewshot: &str,
    ) -> Result<String, ConfigError> {
        let mut values = profile.placeholder_values();
        values.insert("author", message.sender.clone());
        values.insert("to", message.to_line());
        values.insert("subject", message.subject.clone());
        values.insert("email_thread", message.body.clone());
        values.insert("fewshotexamples", fewshot.to_string());

        let template = profile
            .custom_triage_prompt
            .as_deref()
            .unwrap_or(DEFAULT_TRIAGE_PROMPT);
        prompt::render(template, &values)
    }
}

// ── Decision parsing ────────────────────────────────────────────────

/// Strict parse of the runtime's decision.
///
/// The output must be a JSON object with a `logic` string and a `response`
/// matching one of the four allowed values. Anything else fails — a
/// silent default here could suppress a response-worthy email.
fn parse_decision(raw: &str) -> Result<TriageResult, TriageError> {
    let json_str = extract_json_object(raw);
    let value: serde_json::Value =
        serde_json::from_str(&json_str).map_err(|e| TriageError::MalformedDecision {
            reason: format!("not a JSON object: {e}"),
            raw: raw.to_string(),
        })?;

    let logic = value
        .get("logic")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TriageError::MalformedDecision {
            reason: "missing 'logic' string field".into(),
            raw: raw.to_string(),
        })?;

    let response_value = value
        .get("response")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TriageError::MalformedDecision {
            reason: "missing 'response' string field".into(),
            raw: raw.to_string(),
        })?;

    let response =
        TriageResponse::from_wire(response_value).ok_or_else(|| TriageError::MalformedDecision {
            reason: format!("'{response_value}' is not one of no/email/notify/question"),
            raw: raw.to_string(),
        })?;

    Ok(TriageResult {
        logic: logic.to_string(),
        response,
    })
}

/// Extract a JSON object from runtime output (handles markdown wrapping).
pub(crate) fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NullMemoryStore;
    use crate::profile::{Identity, TriageRules};

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::LlmError;
    use crate::llm::{CompletionResponse, LlmProvider};

    /// Scripted provider: returns a fixed reply, captures assembled prompts.
    struct ScriptedProvider {
        reply: String,
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ScriptedProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                reply: String::new(),
                prompts: Mutex::new(Vec::new()),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            if self.fail {
                return Err(LlmError::RequestFailed {
                    provider: "scripted".into(),
                    reason: "connection refused".into(),
                });
            }
            let prompt = request
                .messages
                .iter()
                .map(|m| m.content.clone())
                .collect::<Vec<_>>()
                .join("\n");
            self.prompts.lock().unwrap().push(prompt);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "scripted".into(),
            })
        }
    }

    fn profile() -> Arc<Profile> {
        Arc::new(Profile {
            identity: Identity {
                email: "aryan@university.edu".into(),
                full_name: "Aryan Sharma".into(),
                name: "Aryan".into(),
                background: "Final-year CS student.".into(),
            },
            schedule_preferences: String::new(),
            background_preferences: String::new(),
            response_preferences: String::new(),
            rewrite_preferences: String::new(),
            timezone: "UTC".into(),
            triage_rules: TriageRules {
                no: "College library notices".into(),
                notify: "Grade postings".into(),
                email: "Interview scheduling requests".into(),
            },
            memory: false,
            custom_triage_prompt: None,
        })
    }

    fn message(sender: &str, subject: &str) -> InboundMessage {
        InboundMessage::new(
            sender,
            vec!["aryan@university.edu".into()],
            subject,
            "Hello Aryan, please see above.",
        )
    }

    fn decider(llm: Arc<dyn LlmProvider>) -> TriageDecider {
        TriageDecider::new(llm, Arc::new(NullMemoryStore)).with_rules(RulesEngine::empty())
    }

    #[tokio::test]
    async fn decision_parses_valid_reply() {
        let llm =
            ScriptedProvider::replying(r#"{"logic": "direct question", "response": "email"}"#);
        let result = decider(llm)
            .decide(&profile(), &message("priya@lab.org", "Thursday?"))
            .await
            .unwrap();
        assert_eq!(result.response, TriageResponse::Email);
        assert_eq!(result.logic, "direct question");
    }

    #[tokio::test]
    async fn markdown_fenced_reply_parses() {
        let llm = ScriptedProvider::replying(
            "```json\n{\"logic\": \"noise\", \"response\": \"no\"}\n```",
        );
        let result = decider(llm)
            .decide(&profile(), &message("x@y.com", "hi"))
            .await
            .unwrap();
        assert_eq!(result.response, TriageResponse::No);
    }

    #[tokio::test]
    async fn out_of_enum_response_is_malformed() {
        let llm = ScriptedProvider::replying(r#"{"logic": "hmm", "response": "maybe"}"#);
        let err = decider(llm)
            .decide(&profile(), &message("x@y.com", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::MalformedDecision { .. }));
    }

    #[tokio::test]
    async fn missing_field_is_malformed() {
        let llm = ScriptedProvider::replying(r#"{"response": "no"}"#);
        let err = decider(llm)
            .decide(&profile(), &message("x@y.com", "hi"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, TriageError::MalformedDecision { ref reason, .. } if reason.contains("logic"))
        );
    }

    #[tokio::test]
    async fn non_json_reply_is_malformed() {
        let llm = ScriptedProvider::replying("I think you should ignore this one.");
        let err = decider(llm)
            .decide(&profile(), &message("x@y.com", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::MalformedDecision { .. }));
    }

    #[tokio::test]
    async fn unreachable_runtime_surfaces_upstream_error() {
        let llm = ScriptedProvider::unreachable();
        let err = decider(llm)
            .decide(&profile(), &message("x@y.com", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn invalid_sender_rejected_before_any_call() {
        let llm = ScriptedProvider::replying(r#"{"logic": "x", "response": "no"}"#);
        let err = decider(llm.clone())
            .decide(&profile(), &message("not-an-address", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidSender(_)));
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_rules_and_full_addresses() {
        let llm = ScriptedProvider::replying(r#"{"logic": "x", "response": "notify"}"#);
        decider(llm.clone())
            .decide(
                &profile(),
                &message("library-system@lib.university.edu", "Library Due Date Reminder"),
            )
            .await
            .unwrap();

        let prompts = llm.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("College library notices"));
        assert!(prompt.contains("From: library-system@lib.university.edu"));
        assert!(prompt.contains("To: aryan@university.edu"));
        assert!(prompt.contains("Subject: Library Due Date Reminder"));
        assert!(prompt.contains("Aryan Sharma"));
    }

    #[tokio::test]
    async fn custom_template_is_used() {
        let mut custom = (*profile()).clone();
        custom.custom_triage_prompt =
            Some("Classify for {name}: {subject} from {author}\n{fewshotexamples}".into());
        let custom = Arc::new(custom);

        let llm = ScriptedProvider::replying(r#"{"logic": "x", "response": "no"}"#);
        decider(llm.clone())
            .decide(&custom, &message("a@b.org", "Ping"))
            .await
            .unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts[0], "Classify for Aryan: Ping from a@b.org\n");
    }

    #[test]
    fn extract_json_variants() {
        let obj = r#"{"logic": "x", "response": "no"}"#;
        assert_eq!(extract_json_object(obj), obj);
        assert_eq!(extract_json_object(&format!("```json\n{obj}\n```")), obj);
        assert_eq!(extract_json_object(&format!("```\n{obj}\n```")), obj);
        assert_eq!(extract_json_object(&format!("Here you go: {obj} done")), obj);
    }
}
