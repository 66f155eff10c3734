/// Text measurement and word wrapping
///
/// Widths come from a [`TextMeasure`]. [`Estimated`] uses a per-character
/// advance table scaled by the family's average advance and gives the same
/// answer on every machine; a `FontBook` measures with the faces the
/// rasterizer will actually draw. The rasterizer draws each placed fragment
/// at the position computed here.
use crate::format::TextRun;
use crate::style::{Color, FontFamily, FontWeight};

/// Advance of `ch` as a fraction of the font size, for a 0.55-em family
fn base_advance(ch: char) -> f32 {
    match ch {
        ' ' | '\u{a0}' => 0.28,
        'i' | 'l' | 'j' | 't' | 'f' | 'I' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | '(' | ')' | '[' | ']' => 0.3,
        'm' | 'w' | 'M' | 'W' => 0.85,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.56,
        'a'..='z' => 0.53,
        c if c.is_ascii() => 0.45,
        c if (c as u32) < 0x2000 => 0.55,
        _ => 1.0,
    }
}

/// Estimated horizontal advance of one character in pixels
pub fn char_advance(ch: char, size: f32, family: FontFamily, weight: FontWeight) -> f32 {
    let em = if family.is_monospace() && (ch as u32) < 0x2000 {
        0.6
    } else {
        base_advance(ch) * family.descriptor().advance_factor / 0.55
    };
    let heavy = if weight.is_heavy() { 1.04 } else { 1.0 };
    em * size * heavy
}

/// Estimated width of `text` in pixels
pub fn text_width(text: &str, size: f32, family: FontFamily, weight: FontWeight) -> f32 {
    text.chars().map(|c| char_advance(c, size, family, weight)).sum()
}

/// Font parameters shared by every fragment of one wrapped block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub family: FontFamily,
    pub weight: FontWeight,
}

/// Horizontal measurement used by wrapping and header fitting
pub trait TextMeasure: Send + Sync {
    /// Advance width of `text` set in `style`, in pixels
    fn width(&self, text: &str, style: TextStyle) -> f32;
}

/// Font-independent advance-table measurement
#[derive(Debug, Clone, Copy, Default)]
pub struct Estimated;

impl TextMeasure for Estimated {
    fn width(&self, text: &str, style: TextStyle) -> f32 {
        text_width(text, style.size, style.family, style.weight)
    }
}

/// A piece of text placed on a line, relative to the line's left edge
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFragment {
    pub text: String,
    pub x: f32,
    pub width: f32,
    pub highlight: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WrappedLine {
    pub fragments: Vec<PlacedFragment>,
    pub width: f32,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect::<Vec<_>>().join("")
    }
}

#[derive(Debug, Clone)]
enum Token {
    Word(Vec<(String, Option<Color>)>),
    Space,
    Break,
}

/// Split styled runs into words, collapsing whitespace and keeping newlines.
fn tokenize(runs: &[TextRun]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word: Vec<(String, Option<Color>)> = Vec::new();

    fn flush(word: &mut Vec<(String, Option<Color>)>, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    }

    for run in runs {
        for ch in run.text.chars() {
            if ch == '\n' {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Break);
            } else if ch.is_whitespace() {
                flush(&mut word, &mut tokens);
                if !matches!(tokens.last(), Some(Token::Space) | Some(Token::Break) | None) {
                    tokens.push(Token::Space);
                }
            } else {
                match word.last_mut() {
                    Some((text, color)) if *color == run.highlight => text.push(ch),
                    _ => word.push((ch.to_string(), run.highlight)),
                }
            }
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

struct LineBuilder {
    lines: Vec<WrappedLine>,
    current: WrappedLine,
}

impl LineBuilder {
    fn push(&mut self, text: String, width: f32, highlight: Option<Color>) {
        let x = self.current.width;
        match self.current.fragments.last_mut() {
            Some(last) if last.highlight == highlight && (last.x + last.width - x).abs() < 1e-3 => {
                last.text.push_str(&text);
                last.width += width;
            }
            _ => self.current.fragments.push(PlacedFragment {
                text,
                x,
                width,
                highlight,
            }),
        }
        self.current.width += width;
    }

    fn newline(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }
}

/// Greedy word wrap of `runs` into lines no wider than `max_width`.
///
/// Explicit newlines always break. A single word wider than the line is
/// broken between characters. Empty input yields no lines.
pub fn wrap_runs(runs: &[TextRun], max_width: f32, style: TextStyle, measure: &dyn TextMeasure) -> Vec<WrappedLine> {
    let max_width = max_width.max(style.size);
    let width = |text: &str| measure.width(text, style);
    let space = width(" ");
    let mut b = LineBuilder {
        lines: Vec::new(),
        current: WrappedLine::default(),
    };
    let mut pending_space = false;

    let tokens = tokenize(runs);
    if tokens.is_empty() {
        return Vec::new();
    }

    for token in tokens {
        match token {
            Token::Break => {
                b.newline();
                pending_space = false;
            }
            Token::Space => pending_space = true,
            Token::Word(parts) => {
                let word_width: f32 = parts.iter().map(|(t, _)| width(t)).sum();
                let lead = if pending_space && !b.current.fragments.is_empty() { space } else { 0.0 };
                pending_space = false;

                if b.current.width + lead + word_width <= max_width {
                    if lead > 0.0 {
                        let color = parts.first().and_then(|(_, c)| *c);
                        let prev = b.current.fragments.last().and_then(|f| f.highlight);
                        b.push(" ".to_string(), lead, if prev == color { color } else { None });
                    }
                    for (text, color) in parts {
                        let w = width(&text);
                        b.push(text, w, color);
                    }
                    continue;
                }

                if !b.current.fragments.is_empty() {
                    b.newline();
                }
                if word_width <= max_width {
                    for (text, color) in parts {
                        let w = width(&text);
                        b.push(text, w, color);
                    }
                    continue;
                }

                // Hard-break an over-long word between characters.
                for (text, color) in parts {
                    for ch in text.chars() {
                        let w = width(ch.encode_utf8(&mut [0; 4]));
                        if b.current.width + w > max_width && !b.current.fragments.is_empty() {
                            b.newline();
                        }
                        b.push(ch.to_string(), w, color);
                    }
                }
            }
        }
    }
    b.newline();
    b.lines
}

/// Single-line text cut to `max_width` with a trailing ellipsis
pub fn truncate_to_width(text: &str, max_width: f32, style: TextStyle, measure: &dyn TextMeasure) -> String {
    let width = |t: &str| measure.width(t, style);
    if width(text) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let budget = max_width - width(ellipsis);
    let mut out = String::new();
    let mut used = 0.0;
    for ch in text.chars() {
        let w = width(ch.encode_utf8(&mut [0; 4]));
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.truncate(out.trim_end().len());
    out.push_str(ellipsis);
    out
}
