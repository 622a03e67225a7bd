//! Profile loading and atomic replacement.
//!
//! The persisted layout is a flat YAML mapping using the same field names
//! the assistant's prompts reference: `email`, `full_name`, `name`,
//! `background`, `schedule_preferences`, `background_preferences`,
//! `response_preferences`, `rewrite_preferences`, `timezone`, `triage_no`,
//! `triage_notify`, `triage_email`, `memory`, `custom_triage_prompt`.
//!
//! Rule lists may be written either as a multi-line string or as a YAML
//! sequence of strings; anything else fails the load.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::ConfigError;
use crate::profile::{Identity, Profile, TriageRules};

/// Raw persisted form, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileFile {
    email: Option<String>,
    full_name: Option<String>,
    name: Option<String>,
    background: Option<String>,
    schedule_preferences: Option<String>,
    background_preferences: Option<String>,
    response_preferences: Option<String>,
    rewrite_preferences: Option<String>,
    timezone: Option<String>,
    triage_no: Option<serde_yaml::Value>,
    triage_notify: Option<serde_yaml::Value>,
    triage_email: Option<serde_yaml::Value>,
    memory: bool,
    custom_triage_prompt: Option<String>,
}

/// Parse and validate a profile from YAML text.
pub fn parse_profile(yaml: &str) -> Result<Profile, ConfigError> {
    let raw: ProfileFile =
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let profile = Profile {
        identity: Identity {
            email: required_field("email", raw.email)?,
            full_name: required_field("full_name", raw.full_name)?,
            name: required_field("name", raw.name)?,
            background: required_field("background", raw.background)?,
        },
        schedule_preferences: raw.schedule_preferences.unwrap_or_default(),
        background_preferences: raw.background_preferences.unwrap_or_default(),
        response_preferences: raw.response_preferences.unwrap_or_default(),
        rewrite_preferences: raw.rewrite_preferences.unwrap_or_default(),
        timezone: raw.timezone.unwrap_or_else(|| "UTC".to_string()),
        triage_rules: TriageRules {
            no: rule_text("triage_no", raw.triage_no)?,
            notify: rule_text("triage_notify", raw.triage_notify)?,
            email: rule_text("triage_email", raw.triage_email)?,
        },
        memory: raw.memory,
        custom_triage_prompt: raw.custom_triage_prompt,
    };

    profile.validate()?;
    Ok(profile)
}

fn required_field(key: &str, value: Option<String>) -> Result<String, ConfigError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ConfigError::MissingRequired {
            key: key.to_string(),
            hint: format!("Set `{key}:` in the profile file."),
        }
    })
}

/// Coerce a rule list to a newline-joined text block, preserving order.
fn rule_text(key: &str, value: Option<serde_yaml::Value>) -> Result<String, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingRequired {
        key: key.to_string(),
        hint: format!("Set `{key}:` to a string or a list of rule lines."),
    })?;

    match value {
        serde_yaml::Value::String(text) => Ok(text),
        serde_yaml::Value::Sequence(items) => {
            let mut lines = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    serde_yaml::Value::String(line) => lines.push(line),
                    other => {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: format!(
                                "rule list entries must be text, got {}",
                                yaml_kind(&other)
                            ),
                        });
                    }
                }
            }
            Ok(lines.join("\n"))
        }
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected text or a list of text, got {}", yaml_kind(&other)),
        }),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "text",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Holds the current profile and replaces it wholesale on reload.
///
/// Readers take an `Arc<Profile>` clone; a reload swaps the inner `Arc`
/// under the write lock, so no caller ever observes a partial update.
pub struct ProfileStore {
    inner: RwLock<Arc<Profile>>,
}

impl ProfileStore {
    /// Load the initial profile from a YAML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let profile = parse_profile(&text)?;
        info!(user = %profile.identity.name, path = %path.display(), "Loaded profile");
        Ok(Self {
            inner: RwLock::new(Arc::new(profile)),
        })
    }

    /// Wrap an already-validated profile (used by tests and embedders).
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            inner: RwLock::new(Arc::new(profile)),
        }
    }

    /// The profile as of now. Callers keep the returned `Arc` for the
    /// duration of one triage invocation.
    pub async fn current(&self) -> Arc<Profile> {
        self.inner.read().await.clone()
    }

    /// Re-read the profile file and swap it in atomically.
    ///
    /// The new profile is parsed and validated *before* the lock is taken;
    /// a failed reload leaves the previous profile in place.
    pub async fn reload(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let profile = parse_profile(&text)?;
        let mut guard = self.inner.write().await;
        *guard = Arc::new(profile);
        info!(path = %path.display(), "Reloaded profile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL_PROFILE: &str = r#"
email: aryan@university.edu
full_name: Aryan Sharma
name: Aryan
background: Final-year CS student focused on ML research.
triage_no:
  - College library notices
  - Marketing newsletters
triage_notify: Grade postings
triage_email: |
  Direct questions from professors
  Interview scheduling requests
"#;

    #[test]
    fn parses_minimal_profile() {
        let profile = parse_profile(MINIMAL_PROFILE).unwrap();
        assert_eq!(profile.identity.name, "Aryan");
        assert_eq!(profile.timezone, "UTC");
        assert!(!profile.memory);
        assert_eq!(
            profile.triage_rules.no,
            "College library notices\nMarketing newsletters"
        );
        assert!(profile.triage_rules.email.contains("Interview scheduling"));
    }

    #[test]
    fn missing_rule_list_fails() {
        let yaml = r#"
email: a@b.edu
full_name: A B
name: A
background: text
triage_no: x
triage_notify: y
"#;
        let err = parse_profile(yaml).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "triage_email")
        );
    }

    #[test]
    fn non_text_rule_list_fails() {
        let yaml = r#"
email: a@b.edu
full_name: A B
name: A
background: text
triage_no:
  - ok line
  - 42
triage_notify: y
triage_email: z
"#;
        let err = parse_profile(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "triage_no"));
    }

    #[test]
    fn mapping_rule_value_fails() {
        let yaml = r#"
email: a@b.edu
full_name: A B
name: A
background: text
triage_no: {nested: true}
triage_notify: y
triage_email: z
"#;
        let err = parse_profile(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "triage_no"));
    }

    #[tokio::test]
    async fn load_and_reload_swap() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL_PROFILE.as_bytes()).unwrap();
        file.flush().unwrap();

        let store = ProfileStore::load(file.path()).await.unwrap();
        let before = store.current().await;
        assert_eq!(before.identity.name, "Aryan");

        let updated = MINIMAL_PROFILE.replace("\nname: Aryan\n", "\nname: Ary\n");
        std::fs::write(file.path(), updated).unwrap();
        store.reload(file.path()).await.unwrap();

        // The Arc taken before the reload still sees the old profile.
        assert_eq!(before.identity.name, "Aryan");
        assert_eq!(store.current().await.identity.name, "Ary");
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL_PROFILE.as_bytes()).unwrap();
        file.flush().unwrap();

        let store = ProfileStore::load(file.path()).await.unwrap();
        std::fs::write(file.path(), "email: [broken").unwrap();
        assert!(store.reload(file.path()).await.is_err());
        assert_eq!(store.current().await.identity.name, "Aryan");
    }
}
