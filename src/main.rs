use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;

use inbox_assist::launcher::{LauncherConfig, RuntimeLauncher};
use inbox_assist::llm::{LlmBackend, LlmConfig, create_provider};
use inbox_assist::memory::{InMemoryStore, MemoryStore, NullMemoryStore};
use inbox_assist::message::InboundMessage;
use inbox_assist::profile::ProfileStore;
use inbox_assist::triage::TriageDecider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let profile_path =
        std::env::var("INBOX_ASSIST_PROFILE").unwrap_or_else(|_| "./profile.yaml".to_string());

    let store = ProfileStore::load(&profile_path)
        .await
        .with_context(|| format!("failed to load profile from {profile_path}"))?;
    let profile = store.current().await;

    // Bring up the external reasoning runtime if one is configured.
    // The child is killed when the handle drops.
    let _runtime = match LauncherConfig::from_env() {
        Some(config) => Some(RuntimeLauncher::new(config).spawn()?),
        None => None,
    };

    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: ANTHROPIC_API_KEY not set");
        eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
        std::process::exit(1);
    });

    let model = std::env::var("INBOX_ASSIST_MODEL")
        .unwrap_or_else(|_| "claude-3-5-sonnet-latest".to_string());

    eprintln!("📬 Inbox Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Profile: {} ({})", profile.identity.name, profile_path);
    eprintln!("   Model: {}", model);
    eprintln!("   Reading one message from stdin (raw email or JSON)...\n");

    let llm = create_provider(&LlmConfig {
        backend: LlmBackend::Anthropic,
        api_key: secrecy::SecretString::from(api_key),
        model,
    })?;

    let memory: Arc<dyn MemoryStore> = if profile.memory {
        Arc::new(InMemoryStore::default())
    } else {
        Arc::new(NullMemoryStore)
    };
    let decider = TriageDecider::new(llm, memory);

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("failed to read message from stdin")?;

    let message: InboundMessage = if input.trim_start().starts_with('{') {
        serde_json::from_str(&input).context("invalid message JSON")?
    } else {
        InboundMessage::from_rfc822(input.as_bytes())
            .context("input is not a parseable email with a sender")?
    };

    let result = decider.decide(&profile, &message).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
