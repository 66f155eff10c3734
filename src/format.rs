//! Content formatting: raw hook text to renderable segments
//!
//! Formatting is total. Unknown or degenerate input always produces a
//! defined segment list (at worst a single placeholder).

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::settings::PostFormat;
use crate::style::Color;

/// Shown in place of empty content
pub const PLACEHOLDER_TEXT: &str = "Your content will appear here...";

/// A run of text sharing one style. `highlight` overrides the text color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub highlight: Option<Color>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        TextRun {
            text: text.into(),
            highlight: None,
        }
    }
}

/// One renderable block of the body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Segment {
    /// Content passed through unchanged
    Plain { runs: Vec<TextRun> },
    /// A numbered list entry, rendered as `"{number}. {text}"`
    ListItem { number: usize, runs: Vec<TextRun> },
    /// Text led by the thread glyph drawn to its left
    ThreadLeader { runs: Vec<TextRun> },
    /// Empty content stand-in; rendered dimmed and italic
    Placeholder { text: String },
}

impl Segment {
    pub fn runs(&self) -> Option<&[TextRun]> {
        match self {
            Segment::Plain { runs } | Segment::ListItem { runs, .. } | Segment::ThreadLeader { runs } => {
                Some(runs)
            }
            Segment::Placeholder { .. } => None,
        }
    }

    /// Concatenated display text of the segment, without list markers
    pub fn text(&self) -> String {
        match self {
            Segment::Placeholder { text } => text.clone(),
            other => other
                .runs()
                .unwrap_or_default()
                .iter()
                .map(|r| r.text.as_str())
                .collect(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Segment::Placeholder { .. })
    }
}

/// A substring to recolor wherever it appears, ignoring case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub text: String,
    pub color: Color,
}

impl Highlight {
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Highlight {
            text: text.into(),
            color,
        }
    }

    pub fn none() -> Self {
        Highlight::new("", Color::WHITE)
    }

    fn matcher(&self) -> Option<Regex> {
        if self.text.is_empty() {
            return None;
        }
        RegexBuilder::new(&regex::escape(&self.text))
            .case_insensitive(true)
            .build()
            .ok()
    }
}

/// Split `text` into runs, coloring every case-insensitive literal match.
///
/// Matching is a single non-overlapping left-to-right scan. Empty or absent
/// highlight text leaves the input as one plain run.
pub fn apply_highlight(text: &str, highlight: &Highlight) -> Vec<TextRun> {
    let Some(re) = highlight.matcher() else {
        return vec![TextRun::plain(text)];
    };

    let mut runs = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            runs.push(TextRun::plain(&text[last..m.start()]));
        }
        runs.push(TextRun {
            text: m.as_str().to_string(),
            highlight: Some(highlight.color),
        });
        last = m.end();
    }
    if last < text.len() || runs.is_empty() {
        runs.push(TextRun::plain(&text[last..]));
    }
    runs
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+[.)]\s").expect("static list marker pattern"))
}

fn leading_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+[.)]\s*").expect("static leading marker pattern"))
}

/// Break list-drop content into item texts with their markers removed.
///
/// Items are separated by newlines and also right before any `"<digits>. "`
/// or `"<digits>) "` marker, so `"1. A 2. B"` typed on one line yields two
/// items. Blank lines are dropped.
pub fn split_list_items(content: &str) -> Vec<String> {
    let mut items = Vec::new();
    for line in content.split('\n') {
        let mut cuts: Vec<usize> = list_marker_re()
            .find_iter(line)
            .map(|m| m.start())
            .filter(|&start| start > 0)
            .collect();
        cuts.push(line.len());

        let mut from = 0;
        for cut in cuts {
            let piece = &line[from..cut];
            from = cut;
            if piece.trim().is_empty() {
                continue;
            }
            let stripped = leading_marker_re().replace(piece.trim_start(), "");
            items.push(stripped.trim().to_string());
        }
    }
    items
}

/// Transform content for `format`, applying `highlight` to every text run.
pub fn format_content(content: &str, format: PostFormat, highlight: &Highlight) -> Vec<Segment> {
    if content.trim().is_empty() {
        return vec![Segment::Placeholder {
            text: PLACEHOLDER_TEXT.to_string(),
        }];
    }

    match format {
        PostFormat::ListDrop => {
            let items: Vec<Segment> = split_list_items(content)
                .into_iter()
                .enumerate()
                .map(|(i, text)| Segment::ListItem {
                    number: i + 1,
                    runs: apply_highlight(&text, highlight),
                })
                .collect();
            if items.is_empty() {
                vec![Segment::Placeholder {
                    text: PLACEHOLDER_TEXT.to_string(),
                }]
            } else {
                items
            }
        }
        PostFormat::ThreadStarter => vec![Segment::ThreadLeader {
            runs: apply_highlight(content, highlight),
        }],
        _ => vec![Segment::Plain {
            runs: apply_highlight(content, highlight),
        }],
    }
}
