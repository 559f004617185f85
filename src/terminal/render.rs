//! Terminal rendering of chat bubbles.

use std::io::{self, Write};

use colored::{ColoredString, Colorize};

use crate::chat::error::ChatResult;
use crate::chat::formatter::{ResponseFormatter, Segment, SegmentKind};
use crate::chat::types::{Message, Sender};

/// Brand navy.
const NAVY: (u8, u8, u8) = (28, 43, 77);
/// Note blue.
const NOTE_BLUE: (u8, u8, u8) = (13, 110, 253);

/// Footer shown under the conversation.
pub const FOOTER_TEXT: &str =
    "\u{26a0}\u{fe0f} This is an informational tool — not a substitute for professional legal advice.";

/// Indentation of bot lines under the bot label.
const BOT_INDENT: &str = "    ";
/// Extra indentation for numbered items.
const NUMBERED_INDENT: &str = "  ";

/// Writes messages to a terminal, styling bot segments by kind.
#[derive(Clone, Debug)]
pub struct Renderer {
    formatter: ResponseFormatter,
}

impl Renderer {
    /// Create a renderer.
    ///
    /// # Errors
    /// Returns an error if the formatter cannot be compiled.
    pub fn new() -> ChatResult<Self> {
        Ok(Self {
            formatter: ResponseFormatter::new()?,
        })
    }

    /// Header with the app name.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn render_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", "Justice AI".bold().truecolor(NAVY.0, NAVY.1, NAVY.2))?;
        writeln!(out, "{}", "Legal Rights Assistant for India".dimmed())?;
        writeln!(out)
    }

    /// Disclaimer footer.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn render_footer<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", FOOTER_TEXT.dimmed())
    }

    /// Render every message in order.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn render_conversation<W: Write>(&self, out: &mut W, messages: &[Message]) -> io::Result<()> {
        for message in messages {
            self.render_message(out, message)?;
        }
        out.flush()
    }

    /// Render one bubble followed by a blank line.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn render_message<W: Write>(&self, out: &mut W, message: &Message) -> io::Result<()> {
        match message.sender {
            Sender::User => {
                let label = " You ".white().on_truecolor(NAVY.0, NAVY.1, NAVY.2);
                writeln!(out, "{label} {}", message.text)?;
            }
            Sender::Bot if message.pending => {
                writeln!(out, "{}", bot_label())?;
                writeln!(out, "{BOT_INDENT}{}", format!("\u{23f3} {}", message.text).italic().dimmed())?;
            }
            Sender::Bot => {
                writeln!(out, "{}", bot_label())?;
                for segment in self.formatter.format(&message.text) {
                    writeln!(out, "{BOT_INDENT}{}", style_segment(&segment))?;
                }
            }
        }
        writeln!(out)
    }
}

fn bot_label() -> ColoredString {
    "\u{2696} Justice AI".bold().truecolor(NAVY.0, NAVY.1, NAVY.2)
}

/// Map a segment kind to its terminal style.
fn style_segment(segment: &Segment) -> ColoredString {
    let text = segment.content.as_str();
    match segment.kind {
        SegmentKind::Title => text.bold().underline().truecolor(NAVY.0, NAVY.1, NAVY.2),
        SegmentKind::Heading => text.bold().truecolor(NAVY.0, NAVY.1, NAVY.2),
        SegmentKind::Numbered => format!("{NUMBERED_INDENT}{text}")
            .bold()
            .truecolor(NAVY.0, NAVY.1, NAVY.2),
        SegmentKind::Note => text.italic().truecolor(NOTE_BLUE.0, NOTE_BLUE.1, NOTE_BLUE.2),
        SegmentKind::Paragraph => text.normal(),
    }
}
