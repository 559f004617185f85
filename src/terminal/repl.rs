//! Interactive chat loop on stdin/stdout.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::chat::dispatcher::{QueryDispatcher, QueryOutcome};
use crate::chat::store::{ConversationStore, StoreEvent};

use super::render::Renderer;

/// A line typed at the prompt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Leave the chat.
    Quit,
    /// Re-render the whole conversation.
    History,
    /// Anything else is a query.
    Query(String),
}

impl Command {
    /// Interpret one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/history" => Self::History,
            _ => Self::Query(line.to_string()),
        }
    }
}

/// Run the chat until `/quit` or end of input on stdin, rendering to stdout.
///
/// # Errors
/// Returns an error if reading stdin or writing stdout fails.
pub async fn run(dispatcher: QueryDispatcher, renderer: Renderer) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with(dispatcher, renderer, stdin, std::io::stdout).await
}

/// Run the chat over arbitrary input and output.
///
/// `output` is called for every write so the render task and the prompt
/// loop can both reach the terminal.
///
/// # Errors
/// Returns an error if reading input or writing output fails.
pub async fn run_with<R, W, F>(
    dispatcher: QueryDispatcher,
    renderer: Renderer,
    input: R,
    output: F,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
    F: Fn() -> W + Clone + Send + 'static,
{
    {
        let mut out = output();
        renderer.render_header(&mut out)?;
        renderer.render_conversation(&mut out, &dispatcher.store().messages())?;
    }

    let (stop, stopped) = oneshot::channel();
    let render_task = spawn_render_task(
        dispatcher.store().clone(),
        renderer.clone(),
        output.clone(),
        stopped,
    );
    let mut in_flight: JoinSet<QueryOutcome> = JoinSet::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::History => {
                renderer.render_conversation(&mut output(), &dispatcher.store().messages())?;
            }
            Command::Query(text) => {
                dispatcher.set_draft(text.as_str());
                if let Some(placeholder) = dispatcher.spawn(&text, &mut in_flight) {
                    debug!(%placeholder, "Query sent");
                }
            }
        }
        while let Some(done) = in_flight.try_join_next() {
            log_outcome(done);
        }
    }

    // Let replies already in flight reach the screen before leaving.
    while let Some(done) = in_flight.join_next().await {
        log_outcome(done);
    }
    let _ = stop.send(());
    if let Err(err) = render_task.await {
        warn!(?err, "Render task failed");
    }

    renderer.render_footer(&mut output())
}

fn log_outcome(done: Result<QueryOutcome, tokio::task::JoinError>) {
    match done {
        Ok(outcome) => debug!(?outcome, "Query settled"),
        Err(err) => warn!(?err, "Query task failed"),
    }
}

/// Render each message as soon as it is appended or resolved.
///
/// On `stop`, events already published are drawn before the task exits.
fn spawn_render_task<W, F>(
    store: ConversationStore,
    renderer: Renderer,
    output: F,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    W: Write + Send + 'static,
    F: Fn() -> W + Send + 'static,
{
    let mut events = store.subscribe();
    tokio::spawn(async move {
        let view = View {
            store,
            renderer,
            output,
        };
        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(event) => view.draw(event),
                    Err(RecvError::Lagged(skipped)) => view.redraw(skipped),
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stop => {
                    loop {
                        match events.try_recv() {
                            Ok(event) => view.draw(event),
                            Err(TryRecvError::Lagged(skipped)) => view.redraw(skipped),
                            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                        }
                    }
                    break;
                }
            }
        }
    })
}

/// What the render task draws with.
struct View<F> {
    store: ConversationStore,
    renderer: Renderer,
    output: F,
}

impl<W, F> View<F>
where
    W: Write,
    F: Fn() -> W,
{
    fn draw(&self, event: StoreEvent) {
        let Some(message) = self.store.get(event.id()) else {
            return;
        };
        // An already-resolved placeholder is drawn by its own `Replaced` event.
        if matches!(event, StoreEvent::Appended(_)) && message.is_bot() && !message.pending {
            return;
        }
        if let Err(err) = self.renderer.render_message(&mut (self.output)(), &message) {
            warn!(?err, "Failed to render message");
        }
    }

    fn redraw(&self, skipped: u64) {
        warn!(skipped, "Render task lagged, redrawing conversation");
        if let Err(err) = self
            .renderer
            .render_conversation(&mut (self.output)(), &self.store.messages())
        {
            warn!(?err, "Failed to render conversation");
        }
    }
}
