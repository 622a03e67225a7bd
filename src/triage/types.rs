//! Triage decision types.

use serde::{Deserialize, Serialize};

/// The four-way triage outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageResponse {
    /// Ignore — promotional content, mass mail, noise.
    No,
    /// Needs a direct response.
    Email,
    /// The user should see it but need not answer.
    Notify,
    /// The assistant needs input from the user before acting.
    Question,
}

impl TriageResponse {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Email => "email",
            Self::Notify => "notify",
            Self::Question => "question",
        }
    }

    /// Parse one of the four allowed wire values. Anything else is `None`
    /// — the caller turns that into a malformed-decision error, never a
    /// default.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "no" => Some(Self::No),
            "email" => Some(Self::Email),
            "notify" => Some(Self::Notify),
            "question" => Some(Self::Question),
            _ => None,
        }
    }
}

/// Outcome of one triage invocation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    /// Free-text justification from the reasoning step.
    pub logic: String,
    /// The classification.
    pub response: TriageResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_round_trip() {
        for (value, expected) in [
            ("no", TriageResponse::No),
            ("email", TriageResponse::Email),
            ("notify", TriageResponse::Notify),
            ("question", TriageResponse::Question),
        ] {
            assert_eq!(TriageResponse::from_wire(value), Some(expected));
            assert_eq!(expected.label(), value);
            assert_eq!(serde_json::to_value(expected).unwrap(), value);
        }
    }

    #[test]
    fn unknown_wire_value_is_none() {
        assert_eq!(TriageResponse::from_wire("maybe"), None);
        assert_eq!(TriageResponse::from_wire("NO"), None);
        assert_eq!(TriageResponse::from_wire(""), None);
    }

    #[test]
    fn result_serializes_with_lowercase_response() {
        let result = TriageResult {
            logic: "newsletter".into(),
            response: TriageResponse::No,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["response"], "no");
        assert_eq!(json["logic"], "newsletter");
    }
}
