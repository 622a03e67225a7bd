//! User profile — identity, preferences, and triage rules.
//!
//! A `Profile` is loaded once from a YAML file, validated, and treated as
//! immutable for its lifetime. Updates go through [`store::ProfileStore`],
//! which swaps the whole profile atomically — triage calls already in
//! flight keep the `Arc` they started with.

pub mod store;

use std::collections::HashMap;

pub use store::ProfileStore;

use crate::error::ConfigError;
use crate::message::is_valid_address;

/// Who the assistant works for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The user's own mailbox address.
    pub email: String,
    /// Full name, as it appears in signatures.
    pub full_name: String,
    /// Short name used when talking about the user in prompts.
    pub name: String,
    /// Free-text background narrative (role, projects, relationships).
    pub background: String,
}

/// The three advisory triage rule lists.
///
/// Each is an ordered block of free-text pattern descriptions, used as
/// guidance in the triage prompt — not executable predicates. The lists
/// may overlap; ambiguity is resolved by the prompt's instruction to
/// prefer `notify` over `no`, never by an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageRules {
    /// Mail to ignore entirely.
    pub no: String,
    /// Mail the user should see but not answer.
    pub notify: String,
    /// Mail that needs a response.
    pub email: String,
}

/// One user's configuration profile. Immutable during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub identity: Identity,
    /// Scheduling guidance (default durations, blackout windows, prep time).
    /// Opaque text — interpreted by the reasoning runtime, not here.
    pub schedule_preferences: String,
    /// Extra background facts (addresses, frequent contacts, etc).
    pub background_preferences: String,
    /// Tone guidance keyed conceptually by recipient category.
    pub response_preferences: String,
    /// Formatting/signature rules for the rewrite pass.
    pub rewrite_preferences: String,
    /// IANA-style timezone identifier.
    pub timezone: String,
    pub triage_rules: TriageRules,
    /// Whether prior decisions feed back into future prompts.
    pub memory: bool,
    /// Replacement for the built-in triage template, if set.
    pub custom_triage_prompt: Option<String>,
}

impl Profile {
    /// Every profile-side template placeholder, by its persisted name.
    ///
    /// Message-side values (`author`, `to`, `subject`, `email_thread`,
    /// `fewshotexamples`) are added per invocation by the decider.
    pub fn placeholder_values(&self) -> HashMap<&'static str, String> {
        HashMap::from([
            ("email", self.identity.email.clone()),
            ("full_name", self.identity.full_name.clone()),
            ("name", self.identity.name.clone()),
            ("background", self.identity.background.clone()),
            ("schedule_preferences", self.schedule_preferences.clone()),
            ("background_preferences", self.background_preferences.clone()),
            ("response_preferences", self.response_preferences.clone()),
            ("rewrite_preferences", self.rewrite_preferences.clone()),
            ("timezone", self.timezone.clone()),
            ("triage_no", self.triage_rules.no.clone()),
            ("triage_notify", self.triage_rules.notify.clone()),
            ("triage_email", self.triage_rules.email.clone()),
        ])
    }

    /// Validate field presence and shape. Called by the loader; exposed
    /// for profiles constructed in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("email", &self.identity.email),
            ("full_name", &self.identity.full_name),
            ("name", &self.identity.name),
            ("background", &self.identity.background),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    key: key.to_string(),
                    hint: format!("Set `{key}:` in the profile file."),
                });
            }
        }
        if !is_valid_address(&self.identity.email) {
            return Err(ConfigError::InvalidValue {
                key: "email".to_string(),
                message: format!("'{}' is not a mailbox address", self.identity.email),
            });
        }
        if let Some(template) = &self.custom_triage_prompt {
            crate::triage::prompt::validate_template(template)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        Profile {
            identity: Identity {
                email: "aryan@university.edu".into(),
                full_name: "Aryan Sharma".into(),
                name: "Aryan".into(),
                background: "Aryan is a final-year computer science student.".into(),
            },
            schedule_preferences: "Default meetings to 30 minutes.".into(),
            background_preferences: String::new(),
            response_preferences: "Professors: formal. Peers: casual.".into(),
            rewrite_preferences: "Sign off with '- Aryan'.".into(),
            timezone: "America/New_York".into(),
            triage_rules: TriageRules {
                no: "College library notices\nNewsletter digests".into(),
                notify: "Grade postings".into(),
                email: "Direct questions from professors".into(),
            },
            memory: false,
            custom_triage_prompt: None,
        }
    }

    #[test]
    fn valid_profile_passes() {
        assert!(sample_profile().validate().is_ok());
    }

    #[test]
    fn empty_identity_field_is_missing() {
        let mut profile = sample_profile();
        profile.identity.full_name = "  ".into();
        let err = profile.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "full_name"));
    }

    #[test]
    fn bad_contact_address_rejected() {
        let mut profile = sample_profile();
        profile.identity.email = "not-an-address".into();
        let err = profile.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "email"));
    }

    #[test]
    fn custom_template_with_unknown_placeholder_rejected() {
        let mut profile = sample_profile();
        profile.custom_triage_prompt = Some("Hello {nonexistent}".into());
        let err = profile.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::UnknownPlaceholder { ref name } if name == "nonexistent")
        );
    }

    #[test]
    fn placeholder_values_cover_persisted_fields() {
        let values = sample_profile().placeholder_values();
        for key in [
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
        ] {
            assert!(values.contains_key(key), "missing {key}");
        }
    }
}
