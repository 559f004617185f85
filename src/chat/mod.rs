//! Message-exchange and response-formatting pipeline.
//!
//! This module provides:
//! - The conversation store rendered by the front end
//! - The query dispatcher and its classifier client
//! - The reply template and line formatter for bot messages
//! - Configuration and error types

pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod reply;
pub mod store;
pub mod types;

pub use classifier::{HttpClassifier, LegalClassifier};
pub use config::{ChatConfig, RuntimeTarget};
pub use dispatcher::{PendingQuery, QueryDispatcher, QueryOutcome};
pub use error::{ChatError, ChatResult};
pub use formatter::{ResponseFormatter, Segment, SegmentKind};
pub use store::{ConversationStore, StoreEvent};
pub use types::{Message, MessageId, RemoteReply, Sender};

use std::sync::Arc;

/// Wire a store seeded with the welcome message to an HTTP classifier.
///
/// # Errors
/// Returns an error if the configuration is invalid or the HTTP client cannot be built.
pub fn connect(config: &ChatConfig) -> ChatResult<QueryDispatcher> {
    let classifier = HttpClassifier::new(config)?;
    tracing::info!("Classifier endpoint: {}", classifier.endpoint());
    Ok(QueryDispatcher::new(
        ConversationStore::with_welcome(),
        Arc::new(classifier),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_connect_seeds_welcome() {
        let dispatcher = connect(&ChatConfig::default());
        assert!(dispatcher.is_ok());
        let len = dispatcher.map(|d| d.store().len()).unwrap_or_default();
        assert_eq!(len, 1);
    }

    #[tokio::test]
    async fn test_rejected_incident_text_lands_in_placeholder() {
        let app = Router::new().route(
            "/predict",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid request" })),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await;
        assert!(listener.is_ok());
        let Ok(listener) = listener else { return };
        let addr = listener.local_addr().ok();
        assert!(addr.is_some());
        let Some(addr) = addr else { return };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let config = ChatConfig::new()
            .with_endpoint(format!("http://{addr}/predict"))
            .with_timeout(std::time::Duration::from_secs(5));
        let dispatcher = connect(&config);
        assert!(dispatcher.is_ok());
        let Ok(dispatcher) = dispatcher else { return };

        let outcome = dispatcher.submit("My boss didn't pay me").await;
        assert!(outcome.as_ref().is_some_and(|o| !o.is_answered()));

        let messages = dispatcher.store().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(outcome.map(|o| o.placeholder()), Some(messages[2].id));
        assert_eq!(messages[2].text, "Network error: invalid request");
        assert!(!messages[2].pending);
    }
}
