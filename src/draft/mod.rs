//! Response drafting and tone rewrite.
//!
//! Drafting writes as the user, never as an assistant — the prompts carry
//! the hard constraint that automated help is never revealed. When critical
//! details are missing the drafter asks the user instead of guessing.
//! The rewrite pass adjusts tone and formatting only, using the profile's
//! rewrite preferences.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, DraftError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::message::InboundMessage;
use crate::profile::Profile;
use crate::triage::decider::extract_json_object;
use crate::triage::prompt::render;

const DRAFT_MAX_TOKENS: u64 = 1024;
const DRAFT_TEMPERATURE: f64 = 0.2;

const DRAFT_PROMPT: &str = "\
You are {full_name}'s executive assistant, drafting email responses in {name}'s voice.

{background}

This email has been determined to require {name}'s response.

Always write as if you are {name} directly. Never identify yourself as an assistant or a
third party, and never reveal that any part of this correspondence is automated.

If critical details are missing (availability, interest level, current commitments,
relationship with the sender), ask {name} instead of guessing — never include placeholders
or assumptions in a draft. If someone requests {name}'s attendance, participation, or
commitment to anything, do not confirm unless {name} has explicitly approved.

{response_preferences}

{schedule_preferences}

Draft a response to the following email:
From: {author}
To: {to}
Subject: {subject}
{email_thread}

Respond with JSON: {{ \"action\": \"draft\" | \"question\" | \"ignore\", \"content\": \"the draft text, or the question for {name}\" }}";

const REWRITE_PROMPT: &str = "\
Your job is to rewrite an email draft to sound more like {name}.

{name}'s assistant just drafted an email. It is factually correct, but it may not sound
like {name}. Rewrite it keeping the information the same (do not add anything that is
made up!) while adjusting the tone and format to match {name}'s authentic voice.

{rewrite_preferences}

Here is the current draft:

{draft}

Respond with JSON: {{ \"rewritten\": \"the rewritten email\" }}";

/// What the drafting step decided to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DraftOutcome {
    /// A response draft, ready for the rewrite pass.
    Draft { content: String },
    /// The drafter needs input from the user first.
    Question { content: String },
    /// On closer look, no response is warranted.
    Ignore,
}

/// Drafts and rewrites responses through the reasoning runtime.
pub struct Drafter {
    llm: Arc<dyn LlmProvider>,
}

impl Drafter {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Draft a reply to a message already triaged as response-worthy.
    pub async fn draft_reply(
        &self,
        profile: &Arc<Profile>,
        message: &InboundMessage,
    ) -> Result<DraftOutcome, DraftError> {
        let prompt_text = assemble_draft_prompt(profile, message)?;
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt_text)])
            .with_temperature(DRAFT_TEMPERATURE)
            .with_max_tokens(DRAFT_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let outcome = parse_draft(&response.content)?;

        info!(
            id = %message.id,
            outcome = outcome.label(),
            "Draft step complete"
        );
        Ok(outcome)
    }

    /// Rewrite a draft into the user's voice. Tone and format only.
    pub async fn rewrite(
        &self,
        profile: &Arc<Profile>,
        draft: &str,
    ) -> Result<String, DraftError> {
        let mut values = profile.placeholder_values();
        values.insert("draft", draft.to_string());
        let prompt_text = render(REWRITE_PROMPT, &values)?;

        let request = CompletionRequest::new(vec![ChatMessage::user(prompt_text)])
            .with_temperature(DRAFT_TEMPERATURE)
            .with_max_tokens(DRAFT_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        parse_rewrite(&response.content)
    }
}

impl DraftOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft { .. } => "draft",
            Self::Question { .. } => "question",
            Self::Ignore => "ignore",
        }
    }
}

fn assemble_draft_prompt(
    profile: &Profile,
    message: &InboundMessage,
) -> Result<String, ConfigError> {
    let mut values = profile.placeholder_values();
    values.insert("author", message.sender.clone());
    values.insert("to", message.to_line());
    values.insert("subject", message.subject.clone());
    values.insert("email_thread", message.body.clone());
    render(DRAFT_PROMPT, &values)
}

fn parse_draft(raw: &str) -> Result<DraftOutcome, DraftError> {
    let json_str = extract_json_object(raw);
    let value: serde_json::Value =
        serde_json::from_str(&json_str).map_err(|e| DraftError::MalformedDraft {
            reason: format!("not a JSON object: {e}"),
            raw: raw.to_string(),
        })?;

    let action = value
        .get("action")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DraftError::MalformedDraft {
            reason: "missing 'action' string field".into(),
            raw: raw.to_string(),
        })?;

    let content = || {
        value
            .get("content")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| DraftError::MalformedDraft {
                reason: format!("action '{action}' requires a 'content' string"),
                raw: raw.to_string(),
            })
    };

    match action {
        "draft" => Ok(DraftOutcome::Draft { content: content()? }),
        "question" => Ok(DraftOutcome::Question { content: content()? }),
        "ignore" => Ok(DraftOutcome::Ignore),
        other => Err(DraftError::MalformedDraft {
            reason: format!("'{other}' is not one of draft/question/ignore"),
            raw: raw.to_string(),
        }),
    }
}

fn parse_rewrite(raw: &str) -> Result<String, DraftError> {
    let json_str = extract_json_object(raw);
    let value: serde_json::Value =
        serde_json::from_str(&json_str).map_err(|e| DraftError::MalformedDraft {
            reason: format!("not a JSON object: {e}"),
            raw: raw.to_string(),
        })?;

    value
        .get("rewritten")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| DraftError::MalformedDraft {
            reason: "missing 'rewritten' string field".into(),
            raw: raw.to_string(),
        })
}
