//! Marker vocabulary of the encoded verse text.
//!
//! A verse is either plain text, or *formatted* text that starts with the
//! escape pair `@@`. Inside formatted text every `@` is followed by a single
//! marker character:
//!
//! | marker | meaning |
//! |--------|---------|
//! | `@0`..`@4` | paragraph with indent level 0..4 |
//! | `@^` | start of a new paragraph |
//! | `@6` / `@5` | red text start / end |
//! | `@9` / `@7` | italic start / end |
//! | `@8` | forced line break |
//! | `@<` | special tag open |
//! | `@>` | special tag content end |
//! | `@/` | special tag close |

pub const ESCAPE: char = '@';

const ESCAPE_PAIR: &str = "@@";

/// Indentation kind opened by a paragraph marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParagraphKind {
    Level0,
    Level1,
    Level2,
    Level3,
    Level4,
    /// `@^`: first line indented, the rest at the paragraph margin.
    NewParagraph,
}

impl ParagraphKind {
    /// Indent level for `@1`..`@4`, `None` for level 0 and new paragraphs.
    pub fn level(self) -> Option<usize> {
        match self {
            ParagraphKind::Level1 => Some(1),
            ParagraphKind::Level2 => Some(2),
            ParagraphKind::Level3 => Some(3),
            ParagraphKind::Level4 => Some(4),
            ParagraphKind::Level0 | ParagraphKind::NewParagraph => None,
        }
    }

    /// Whether a verse opening with this marker places its verse number
    /// through the paragraph layout instead of an inline prefix.
    pub fn suppresses_verse_number(self) -> bool {
        !matches!(self, ParagraphKind::Level0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    Paragraph(ParagraphKind),
    RedStart,
    RedEnd,
    ItalicStart,
    ItalicEnd,
    LineBreak,
    TagOpen,
    TagContentEnd,
    TagClose,
}

impl Marker {
    /// Decodes the character following an escape. Unknown followers yield
    /// `None` and are skipped by the scanner.
    pub fn decode(ch: char) -> Option<Self> {
        let marker = match ch {
            '0' => Marker::Paragraph(ParagraphKind::Level0),
            '1' => Marker::Paragraph(ParagraphKind::Level1),
            '2' => Marker::Paragraph(ParagraphKind::Level2),
            '3' => Marker::Paragraph(ParagraphKind::Level3),
            '4' => Marker::Paragraph(ParagraphKind::Level4),
            '^' => Marker::Paragraph(ParagraphKind::NewParagraph),
            '6' => Marker::RedStart,
            '5' => Marker::RedEnd,
            '9' => Marker::ItalicStart,
            '7' => Marker::ItalicEnd,
            '8' => Marker::LineBreak,
            '<' => Marker::TagOpen,
            '>' => Marker::TagContentEnd,
            '/' => Marker::TagClose,
            _ => return None,
        };
        Some(marker)
    }

    pub fn encode(self) -> char {
        match self {
            Marker::Paragraph(ParagraphKind::Level0) => '0',
            Marker::Paragraph(ParagraphKind::Level1) => '1',
            Marker::Paragraph(ParagraphKind::Level2) => '2',
            Marker::Paragraph(ParagraphKind::Level3) => '3',
            Marker::Paragraph(ParagraphKind::Level4) => '4',
            Marker::Paragraph(ParagraphKind::NewParagraph) => '^',
            Marker::RedStart => '6',
            Marker::RedEnd => '5',
            Marker::ItalicStart => '9',
            Marker::ItalicEnd => '7',
            Marker::LineBreak => '8',
            Marker::TagOpen => '<',
            Marker::TagContentEnd => '>',
            Marker::TagClose => '/',
        }
    }
}

/// Returns `true` when `text` carries structured markup.
pub fn is_formatted(text: &str) -> bool {
    text.starts_with(ESCAPE_PAIR)
}

/// Returns the paragraph kind a formatted verse opens with, if any.
pub fn leading_paragraph(text: &str) -> Option<ParagraphKind> {
    let rest = text.strip_prefix(ESCAPE_PAIR)?;
    let mut chars = rest.chars();
    if chars.next()? != ESCAPE {
        return None;
    }
    match Marker::decode(chars.next()?)? {
        Marker::Paragraph(kind) => Some(kind),
        _ => None,
    }
}

/// One step of the scan over formatted text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Literal run ending at an escape.
    Text(&'a str),
    /// Literal run reaching the end of the input.
    Tail(&'a str),
    Marker(Marker),
}

/// Splits the body of a formatted verse (after `@@`) into literal runs and
/// markers. Unknown markers and a trailing lone escape are dropped.
///
/// The final run is reported as [`Token::Tail`]: it is always output text,
/// even inside an unclosed special tag.
pub(crate) struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(body: &'a str) -> Self {
        Self { rest: body }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            match self.rest.find(ESCAPE) {
                None => {
                    let text = self.rest;
                    self.rest = "";
                    return Some(Token::Tail(text));
                }
                Some(0) => {
                    let mut chars = self.rest[1..].chars();
                    let Some(follower) = chars.next() else {
                        self.rest = "";
                        return None;
                    };
                    self.rest = chars.as_str();
                    if let Some(marker) = Marker::decode(follower) {
                        return Some(Token::Marker(marker));
                    }
                }
                Some(idx) => {
                    let text = &self.rest[..idx];
                    self.rest = &self.rest[idx..];
                    return Some(Token::Text(text));
                }
            }
        }
    }
}

/// Strips all markup from `text`, keeping literal text in source order.
///
/// Tag contents are dropped and line markers are not expanded, so the result
/// is suitable for search and comparison rather than display.
pub fn plain_text(text: &str) -> String {
    let Some(body) = text.strip_prefix(ESCAPE_PAIR) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(body.len());
    let mut in_tag = false;
    for token in Tokens::new(body) {
        match token {
            Token::Text(run) if !in_tag => out.push_str(run),
            Token::Text(_) => {}
            Token::Tail(run) => out.push_str(run),
            Token::Marker(Marker::TagOpen) => in_tag = true,
            Token::Marker(Marker::TagContentEnd | Marker::TagClose) => in_tag = false,
            Token::Marker(_) => {}
        }
    }
    out
}
