//! Query dispatcher: turns a submitted query into conversation state.
//!
//! A submission happens in two phases:
//! - [`QueryDispatcher::begin`] runs synchronously. It appends the user
//!   message and a pending placeholder, and clears the draft.
//! - [`PendingQuery::settle`] awaits the classifier and resolves the
//!   placeholder with the answer or an error.
//!
//! Several queries may be in flight at once. Each one only ever touches its
//! own placeholder, so replies land in the right bubble whatever order they
//! settle in.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::classifier::LegalClassifier;
use super::reply::{build_reply, error_text};
use super::store::ConversationStore;
use super::types::{Message, MessageId, MessageIdGenerator};

/// How a query ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryOutcome {
    /// The placeholder now holds the formatted answer.
    Answered(MessageId),
    /// The placeholder now holds an error message.
    Failed {
        /// Placeholder that was resolved.
        placeholder: MessageId,
        /// Error description shown after the prefix.
        reason: String,
    },
}

impl QueryOutcome {
    /// Placeholder the outcome was written to.
    #[must_use]
    pub const fn placeholder(&self) -> MessageId {
        match self {
            Self::Answered(id) | Self::Failed { placeholder: id, .. } => *id,
        }
    }

    /// Whether the classifier produced an answer.
    #[must_use]
    pub const fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

/// Sends queries to a classifier and records the exchange in a store.
#[derive(Clone)]
pub struct QueryDispatcher {
    store: ConversationStore,
    classifier: Arc<dyn LegalClassifier>,
    ids: Arc<MessageIdGenerator>,
    draft: Arc<Mutex<String>>,
}

impl QueryDispatcher {
    /// Create a dispatcher writing to `store`.
    #[must_use]
    pub fn new(store: ConversationStore, classifier: Arc<dyn LegalClassifier>) -> Self {
        Self {
            store,
            classifier,
            ids: Arc::new(MessageIdGenerator::new()),
            draft: Arc::new(Mutex::new(String::new())),
        }
    }

    /// Conversation this dispatcher writes to.
    #[must_use]
    pub const fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Text the user is currently composing.
    #[must_use]
    pub fn draft(&self) -> String {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the draft.
    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock().unwrap_or_else(PoisonError::into_inner) = text.into();
    }

    /// Record a query and its placeholder without waiting for the network.
    ///
    /// Returns `None`, touching nothing, when the input is blank.
    #[must_use]
    pub fn begin(&self, raw_input: &str) -> Option<PendingQuery> {
        if raw_input.trim().is_empty() {
            return None;
        }

        self.store.append(Message::user(self.ids.next_id(), raw_input));
        self.set_draft(String::new());

        let placeholder = self.ids.next_id();
        self.store.append(Message::placeholder(placeholder));
        debug!(%placeholder, "Query recorded");

        Some(PendingQuery {
            placeholder,
            incident: raw_input.to_string(),
            store: self.store.clone(),
            classifier: Arc::clone(&self.classifier),
        })
    }

    /// Submit a query and wait until its placeholder is resolved.
    pub async fn submit(&self, raw_input: &str) -> Option<QueryOutcome> {
        let pending = self.begin(raw_input)?;
        Some(pending.settle().await)
    }

    /// Submit the current draft.
    pub async fn submit_draft(&self) -> Option<QueryOutcome> {
        let draft = self.draft();
        self.submit(&draft).await
    }

    /// Submit a query and resolve it on a task owned by `tasks`.
    ///
    /// Returns the placeholder id, or `None` for blank input.
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, raw_input: &str, tasks: &mut JoinSet<QueryOutcome>) -> Option<MessageId> {
        let pending = self.begin(raw_input)?;
        let placeholder = pending.placeholder();
        tasks.spawn(pending.settle());
        Some(placeholder)
    }
}

/// A recorded query whose placeholder is still pending.
#[must_use = "the placeholder stays pending until the query is settled"]
pub struct PendingQuery {
    placeholder: MessageId,
    incident: String,
    store: ConversationStore,
    classifier: Arc<dyn LegalClassifier>,
}

impl PendingQuery {
    /// Placeholder that will receive the answer.
    #[must_use]
    pub const fn placeholder(&self) -> MessageId {
        self.placeholder
    }

    /// Raw text sent as the incident.
    #[must_use]
    pub fn incident(&self) -> &str {
        &self.incident
    }

    /// Ask the classifier and resolve the placeholder. Never leaves it pending.
    pub async fn settle(self) -> QueryOutcome {
        let result = self.classifier.classify(&self.incident).await;

        match result {
            Ok(reply) => {
                if !self.store.replace(self.placeholder, build_reply(&reply)) {
                    warn!(placeholder = %self.placeholder, "Placeholder missing from store");
                }
                debug!(placeholder = %self.placeholder, section = %reply.section, "Query answered");
                QueryOutcome::Answered(self.placeholder)
            }
            Err(err) => {
                if err.is_remote() {
                    info!(placeholder = %self.placeholder, "Classifier declined: {err}");
                } else {
                    warn!(placeholder = %self.placeholder, "Query failed: {err}");
                }
                if !self.store.replace(self.placeholder, error_text(&err)) {
                    warn!(placeholder = %self.placeholder, "Placeholder missing from store");
                }
                QueryOutcome::Failed {
                    placeholder: self.placeholder,
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;
    use crate::chat::classifier::ClassifierFuture;
    use crate::chat::error::{ChatError, ChatResult};
    use crate::chat::types::{RemoteReply, Sender, PLACEHOLDER_TEXT};

    fn reply(section: &str) -> RemoteReply {
        RemoteReply {
            section: section.to_string(),
            offense: "Criminal breach of trust".to_string(),
            description: "**Entrusted** property misused".to_string(),
            punishment: "Up to 3 years".to_string(),
            more_details: "* withheld wages".to_string(),
        }
    }

    /// Answers every incident with a fixed section, counting calls.
    struct FixedClassifier {
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl FixedClassifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LegalClassifier for FixedClassifier {
        fn classify<'a>(&'a self, incident: &'a str) -> ClassifierFuture<'a, ChatResult<RemoteReply>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.seen
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(incident.to_string());
                Ok(reply("Section 406"))
            })
        }
    }

    /// Fails every incident with a server-side error.
    struct FailingClassifier(&'static str);

    impl LegalClassifier for FailingClassifier {
        fn classify<'a>(&'a self, _incident: &'a str) -> ClassifierFuture<'a, ChatResult<RemoteReply>> {
            Box::pin(async move { Err(ChatError::Remote(self.0.to_string())) })
        }
    }

    /// Holds "slow" incidents until released; answers others immediately.
    struct GatedClassifier {
        gate: Notify,
    }

    impl LegalClassifier for GatedClassifier {
        fn classify<'a>(&'a self, incident: &'a str) -> ClassifierFuture<'a, ChatResult<RemoteReply>> {
            Box::pin(async move {
                if incident.starts_with("slow") {
                    self.gate.notified().await;
                }
                Ok(reply(incident))
            })
        }
    }

    fn dispatcher_with(classifier: Arc<dyn LegalClassifier>) -> QueryDispatcher {
        QueryDispatcher::new(ConversationStore::with_welcome(), classifier)
    }

    #[test]
    fn test_begin_appends_user_then_placeholder() {
        let dispatcher = dispatcher_with(Arc::new(FixedClassifier::new()));
        let pending = dispatcher.begin("My boss didn't pay me");
        assert!(pending.is_some());

        let messages = dispatcher.store().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[1].text, "My boss didn't pay me");
        assert_eq!(messages[2].sender, Sender::Bot);
        assert_eq!(messages[2].text, PLACEHOLDER_TEXT);
        assert!(messages[2].pending);
        assert!(messages[1].id < messages[2].id);
        assert_eq!(pending.map(|p| p.placeholder()), Some(messages[2].id));
    }

    #[test]
    fn test_blank_input_is_noop() {
        let classifier = Arc::new(FixedClassifier::new());
        let dispatcher = dispatcher_with(classifier.clone());
        dispatcher.set_draft("   ");

        for input in ["", "   ", "\n\t "] {
            assert!(dispatcher.begin(input).is_none());
        }

        assert_eq!(dispatcher.store().len(), 1);
        assert_eq!(dispatcher.draft(), "   ");
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_begin_clears_draft() {
        let dispatcher = dispatcher_with(Arc::new(FixedClassifier::new()));
        dispatcher.set_draft("hello");
        let _pending = dispatcher.begin("hello");
        assert!(dispatcher.draft().is_empty());
    }

    #[tokio::test]
    async fn test_success_replaces_placeholder() {
        let classifier = Arc::new(FixedClassifier::new());
        let dispatcher = dispatcher_with(classifier.clone());

        let outcome = dispatcher.submit("  My boss didn't pay me ").await;
        assert!(outcome.as_ref().is_some_and(QueryOutcome::is_answered));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            classifier.seen.lock().unwrap_or_else(PoisonError::into_inner).as_slice(),
            ["  My boss didn't pay me "]
        );

        let placeholder = outcome.map(|o| o.placeholder());
        let text = placeholder
            .and_then(|id| dispatcher.store().get(id))
            .map(|m| m.text)
            .unwrap_or_default();
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines[1], "Section: Section 406");
        assert!(!text.contains('*'));
        assert_eq!(dispatcher.store().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_replaces_placeholder_with_error() {
        let dispatcher = dispatcher_with(Arc::new(FailingClassifier("invalid request")));

        let outcome = dispatcher.submit("anything").await;
        assert_eq!(
            outcome,
            Some(QueryOutcome::Failed {
                placeholder: dispatcher.store().messages()[2].id,
                reason: "invalid request".to_string(),
            })
        );
        assert_eq!(
            dispatcher.store().messages()[2].text,
            "Network error: invalid request"
        );

        // Errors are not fatal: the next query goes through the same path.
        assert!(dispatcher.submit("again").await.is_some());
        assert_eq!(dispatcher.store().len(), 5);
    }

    #[tokio::test]
    async fn test_submit_draft() {
        let dispatcher = dispatcher_with(Arc::new(FixedClassifier::new()));
        assert!(dispatcher.submit_draft().await.is_none());

        dispatcher.set_draft("Someone is harassing me online");
        let outcome = dispatcher.submit_draft().await;
        assert!(outcome.is_some_and(|o| o.is_answered()));
        assert!(dispatcher.draft().is_empty());
        assert_eq!(dispatcher.store().messages()[1].text, "Someone is harassing me online");
    }

    #[tokio::test]
    async fn test_overlapping_queries_resolve_their_own_placeholder() {
        let classifier = Arc::new(GatedClassifier { gate: Notify::new() });
        let dispatcher = dispatcher_with(classifier.clone());
        let mut tasks = JoinSet::new();

        let slow = dispatcher.spawn("slow one", &mut tasks);
        let fast = dispatcher.spawn("fast two", &mut tasks);
        assert!(dispatcher.spawn("  ", &mut tasks).is_none());
        assert_eq!(tasks.len(), 2);
        assert_eq!(dispatcher.store().len(), 5);
        assert_eq!(dispatcher.store().pending_count(), 2);

        let first = tasks.join_next().await.and_then(Result::ok);
        assert_eq!(first.map(|o| o.placeholder()), fast);
        assert_eq!(dispatcher.store().pending_count(), 1);

        classifier.gate.notify_one();
        let second = tokio::time::timeout(Duration::from_secs(5), tasks.join_next())
            .await
            .ok()
            .flatten()
            .and_then(Result::ok);
        assert_eq!(second.map(|o| o.placeholder()), slow);

        let messages = dispatcher.store().messages();
        assert!(messages[2].text.contains("Section: slow one"));
        assert!(messages[4].text.contains("Section: fast two"));
        assert_eq!(dispatcher.store().pending_count(), 0);
    }
}
