//! Conversion-note side channel.
//!
//! Information the target language cannot represent natively travels as
//! tagged lines embedded in description text:
//!
//! ```text
//! !Conversion note: <statement> <argument>!
//! ```
//!
//! The encoder appends one line per note; the decoder extracts
//! `(statement, argument)` pairs and strips the lines before reconstituting
//! a human-readable description. Statements are matched against a fixed
//! table, longest first; unrecognized statements are preserved verbatim
//! under [`Tag::Other`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const NOTE_PREFIX: &str = "!Conversion note: ";

/// Recognized note / extension tags, plus a verbatim fallback.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Status,
    When,
    Must,
    Presence,
    Key,
    OrderedBy,
    AugmentedBy,
    /// Original base-type name that the target model cannot keep
    OriginalType,
    Pattern,
    PatternInvertMatch,
    Reference,
    Organization,
    Contact,
    Revision,
    Feature,
    IfFeature,
    Nullable,
    Observable,
    Readable,
    /// `Bit at position N` marker on the boolean stand-in for one bit
    BitPosition,
    /// Marks a key leaf synthesized during reverse translation
    ArtificialKey,
    /// Action input/output that was implicitly empty in the source
    ImplicitEmpty,
    /// Grouping that had to be inlined because the use site refined it
    InlinedGrouping,
    Other(String),
}

/// `(tag, statement)` table. Order matters for decoding: longer statements
/// come before their prefixes (`pattern-invert-match` before `pattern`).
static STATEMENTS: Lazy<Vec<(Tag, &'static str)>> = Lazy::new(|| {
    vec![
        (Tag::PatternInvertMatch, "pattern-invert-match"),
        (Tag::Pattern, "pattern"),
        (Tag::Status, "status"),
        (Tag::When, "when"),
        (Tag::Must, "must"),
        (Tag::Presence, "presence"),
        (Tag::Key, "key"),
        (Tag::OrderedBy, "ordered-by"),
        (Tag::AugmentedBy, "augmented-by"),
        (Tag::OriginalType, "type"),
        (Tag::Reference, "reference"),
        (Tag::Organization, "organization"),
        (Tag::Contact, "contact"),
        (Tag::Revision, "revision"),
        (Tag::Feature, "feature"),
        (Tag::IfFeature, "if-feature"),
        (Tag::Nullable, "nullable"),
        (Tag::Observable, "observable"),
        (Tag::Readable, "readable"),
        (Tag::BitPosition, "Bit at position"),
        (Tag::ArtificialKey, "artificial-key"),
        (Tag::ImplicitEmpty, "implicit-empty"),
        (Tag::InlinedGrouping, "inlined-grouping"),
    ]
});

impl Tag {
    pub fn statement(&self) -> &str {
        match self {
            Tag::Other(s) => s.as_str(),
            _ => STATEMENTS
                .iter()
                .find(|(t, _)| t == self)
                .map(|(_, s)| *s)
                .unwrap_or(""),
        }
    }
}

/// One decoded conversion note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub tag: Tag,
    pub argument: String,
}

impl Note {
    pub fn new(tag: Tag, argument: impl Into<String>) -> Self {
        Self {
            tag,
            argument: argument.into(),
        }
    }
}

/// Render a note as its wire line (without a trailing newline).
pub fn format_note(note: &Note) -> String {
    if note.argument.is_empty() {
        format!("{}{}!", NOTE_PREFIX, note.tag.statement())
    } else {
        format!("{}{} {}!", NOTE_PREFIX, note.tag.statement(), note.argument)
    }
}

/// Append a note line to a description, creating the description if absent.
pub fn append_note(description: &mut Option<String>, tag: Tag, argument: &str) {
    let line = format_note(&Note::new(tag, argument));
    match description {
        Some(text) => {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&line);
        }
        None => *description = Some(line),
    }
}

/// Split a description into its human-readable text and its notes.
///
/// Note lines are stripped; whatever remains (trimmed) is the clean
/// description, `None` when nothing remains.
pub fn extract_notes(description: &str) -> (Option<String>, Vec<Note>) {
    let mut clean = Vec::new();
    let mut notes = Vec::new();

    for line in description.lines() {
        let trimmed = line.trim();
        match decode_line(trimmed) {
            Some(note) => notes.push(note),
            None => clean.push(line),
        }
    }

    let text = clean.join("\n").trim().to_string();
    let text = if text.is_empty() { None } else { Some(text) };
    (text, notes)
}

/// Find the first note with the given tag.
pub fn find_note<'a>(notes: &'a [Note], tag: &Tag) -> Option<&'a Note> {
    notes.iter().find(|n| &n.tag == tag)
}

/// Collect the arguments of every note with the given tag, in order.
pub fn note_args(notes: &[Note], tag: &Tag) -> Vec<String> {
    notes
        .iter()
        .filter(|n| &n.tag == tag)
        .map(|n| n.argument.clone())
        .collect()
}

/// Decode one line; `None` when the line is not a note.
fn decode_line(line: &str) -> Option<Note> {
    let rest = line.strip_prefix(NOTE_PREFIX)?;
    // The argument may itself contain '!'; the closing bang is the last one.
    let end = rest.rfind('!')?;
    let body = &rest[..end];

    for (tag, statement) in STATEMENTS.iter() {
        if let Some(arg) = body.strip_prefix(statement) {
            if arg.is_empty() {
                return Some(Note::new(tag.clone(), ""));
            }
            if let Some(arg) = arg.strip_prefix(' ') {
                return Some(Note::new(tag.clone(), arg));
            }
        }
    }

    // Unrecognized statement: first word is the statement, rest the argument.
    match body.split_once(' ') {
        Some((stmt, arg)) => Some(Note::new(Tag::Other(stmt.to_string()), arg)),
        None => Some(Note::new(Tag::Other(body.to_string()), "")),
    }
}
