//! Text of the bot's answer to a classified query.

use super::error::ChatError;
use super::formatter::strip_asterisks;
use super::types::{RemoteReply, ERROR_PREFIX};

/// Closing disclaimer appended to every answer.
pub const DISCLAIMER: &str = "\u{1f4a1} Remember: This is for educational awareness. Consult a professional for serious legal matters.";

/// Assemble the answer text and strip markdown emphasis markers.
#[must_use]
pub fn build_reply(reply: &RemoteReply) -> String {
    let text = format!(
        "\u{2696}\u{fe0f} Justice AI - Legal Rights Assistant

Section: {section}

Offense: {offense}

\u{1f4dd} Description:
{description}

\u{1f694} Punishment:
{punishment}

\u{1f4da} More Details:
{more_details}

{DISCLAIMER}",
        section = reply.section,
        offense = reply.offense,
        description = reply.description,
        punishment = reply.punishment,
        more_details = reply.more_details,
    );
    strip_asterisks(&text)
}

/// Text that replaces the placeholder when a query fails.
#[must_use]
pub fn error_text(error: &ChatError) -> String {
    format!("{ERROR_PREFIX}{error}")
}
