//! Error types for Inbox Assist.

/// Top-level error type for the assistant core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Triage error: {0}")]
    Triage(#[from] TriageError),

    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Launcher error: {0}")]
    Launcher(#[from] LauncherError),
}

/// Profile configuration errors.
///
/// Fatal to the load that produced them, never to the process — a reload
/// may retry with a fixed profile file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required profile field: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid profile value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse profile: {0}")]
    ParseError(String),

    #[error("Template references unknown placeholder: {{{name}}}")]
    UnknownPlaceholder { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasoning runtime transport errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Triage decision errors.
///
/// None of these may be collapsed into a `no` classification — a failed
/// decision surfaces as an error, full stop.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Sender is not a valid address: {0}")]
    InvalidSender(String),

    #[error("Malformed triage decision ({reason}): {raw}")]
    MalformedDecision { reason: String, raw: String },

    #[error("Reasoning runtime unavailable: {0}")]
    UpstreamUnavailable(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Drafting/rewrite errors.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Malformed draft output ({reason}): {raw}")]
    MalformedDraft { reason: String, raw: String },

    #[error("Reasoning runtime unavailable: {0}")]
    UpstreamUnavailable(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Memory store errors.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Memory store failed: {0}")]
    Store(String),
}

/// Runtime launcher errors.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error("No runtime command configured")]
    MissingProgram,

    #[error("Failed to spawn runtime: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type alias for the assistant core.
pub type Result<T> = std::result::Result<T, Error>;
