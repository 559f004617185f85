//! Startup helpers for the Justice AI chat.

use std::process::ExitCode;

use crate::chat::{self, ChatConfig, ChatResult, QueryDispatcher};
use crate::terminal::{self, Renderer};

/// Run the interactive chat (used by the `justice_ai` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` when the session ends normally, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    tracing::info!("Starting Justice AI v{}", env!("CARGO_PKG_VERSION"));

    let (dispatcher, renderer) = match initialize() {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("Failed to start chat: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(terminal::run(dispatcher, renderer)) {
        tracing::error!("Terminal error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Load configuration from the environment and build the chat components.
///
/// # Errors
/// Returns an error if the configuration is invalid or a component cannot be built.
pub fn initialize() -> ChatResult<(QueryDispatcher, Renderer)> {
    let config = ChatConfig::from_env()?;
    tracing::info!(runtime = %config.target, "Loaded configuration");

    let dispatcher = chat::connect(&config)?;
    let renderer = Renderer::new()?;
    Ok((dispatcher, renderer))
}
