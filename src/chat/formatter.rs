//! Markdown-like line classifier for bot messages.
//!
//! Each line of a bot message becomes one [`Segment`] whose kind is decided
//! by its leading glyph. The front end maps kinds to visual styles.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Balance scale, marks the message title.
pub const TITLE_GLYPH: &str = "\u{2696}\u{fe0f}";
/// Light bulb, marks a closing note.
pub const NOTE_GLYPH: &str = "\u{1f4a1}";

/// Glyphs that open a heading line.
pub const HEADING_GLYPHS: [&str; 5] = [
    "\u{2705}",         // check mark
    TITLE_GLYPH,        // scales
    "\u{1f4dd}",        // memo
    "\u{1f694}",        // police car light
    "\u{1f4da}",        // books
];

/// ASCII digits followed by the keycap sequence (VS16 + combining enclosing keycap).
const NUMBERED_PATTERN: &str = "^[0-9]+\u{fe0f}\u{20e3}";

/// Visual role of a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Message title.
    Title,
    /// Section heading.
    Heading,
    /// Numbered item.
    Numbered,
    /// Closing note.
    Note,
    /// Plain text.
    Paragraph,
}

/// One classified line.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// How to style the line.
    pub kind: SegmentKind,
    /// Trimmed line text.
    pub content: String,
}

/// Remove every `*`.
#[must_use]
pub fn strip_asterisks(text: &str) -> String {
    text.replace('*', "")
}

/// Line classifier for bot messages. Holds no state besides its compiled pattern.
#[derive(Clone, Debug)]
pub struct ResponseFormatter {
    numbered: Regex,
}

impl ResponseFormatter {
    /// Compile the formatter.
    ///
    /// # Errors
    /// Returns an error if the numbered-item pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            numbered: Regex::new(NUMBERED_PATTERN)?,
        })
    }

    /// Classify one already-trimmed line. Title is checked before heading.
    #[must_use]
    pub fn classify_line(&self, line: &str) -> SegmentKind {
        if line.starts_with(TITLE_GLYPH) {
            SegmentKind::Title
        } else if HEADING_GLYPHS.iter().any(|glyph| line.starts_with(glyph)) {
            SegmentKind::Heading
        } else if self.numbered.is_match(line) {
            SegmentKind::Numbered
        } else if line.starts_with(NOTE_GLYPH) {
            SegmentKind::Note
        } else {
            SegmentKind::Paragraph
        }
    }

    /// Split `text` into one segment per line.
    ///
    /// Blank lines inside the block are kept as empty paragraphs.
    #[must_use]
    pub fn format(&self, text: &str) -> Vec<Segment> {
        let cleaned = strip_asterisks(text);
        let body = cleaned.trim();
        if body.is_empty() {
            return vec![Segment {
                kind: SegmentKind::Paragraph,
                content: String::new(),
            }];
        }

        body.lines()
            .map(|line| {
                let content = line.trim();
                Segment {
                    kind: self.classify_line(content),
                    content: content.to_string(),
                }
            })
            .collect()
    }
}
