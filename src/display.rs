use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::{
    buffer::{LeadingMargin, StyledBuffer, StylePayload},
    render::{TextSurface, VerseNumberSurface},
    settings::Settings,
};

/// Lays out a styled verse as terminal lines no wider than `width`.
///
/// Every hard line (text between `\n`s) starts with the `first` indent of
/// the margin covering it. Its wrapped continuation lines use `rest`. A
/// trailing `\n` yields a final empty line.
pub fn verse_lines(buffer: &StyledBuffer, width: usize, settings: &Settings) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut fragments = Vec::new();

    let mut chars = buffer.as_str().chars().enumerate();
    loop {
        fragments.clear();
        let mut builder: Option<TokenBuilder> = None;
        let mut next_start = None;

        for (idx, ch) in chars.by_ref() {
            if ch == '\n' {
                next_start = Some(idx + 1);
                break;
            }
            if ch == '\r' {
                continue;
            }
            let style = char_style(buffer.annotations_at(idx), settings);
            let expanded = if ch == '\t' { 4 } else { 1 };
            let actual = if ch == '\t' { ' ' } else { ch };
            for _ in 0..expanded {
                push_char(&mut builder, &mut fragments, actual, style);
            }
        }
        if let Some(token) = builder.take() {
            fragments.push(token.finish());
        }

        let margin = margin_at(buffer, line_start);
        let first_prefix = " ".repeat(margin.first as usize);
        let continuation_prefix = " ".repeat(margin.rest as usize);
        lines.extend(wrap_fragments(
            &fragments,
            &first_prefix,
            &continuation_prefix,
            width,
        ));

        match next_start {
            Some(start) => line_start = start,
            None => break,
        }
    }
    lines
}

/// Terminal style for a character carrying `payloads`, applied in order.
pub fn char_style<'p>(payloads: impl Iterator<Item = &'p StylePayload>, settings: &Settings) -> Style {
    payloads.fold(Style::default(), |style, payload| match payload {
        StylePayload::VerseNumber { color } => {
            let style = style.add_modifier(Modifier::BOLD);
            match color {
                Some(color) => style.fg(*color),
                None => style,
            }
        }
        StylePayload::LeadingMargin(_) => style,
        StylePayload::Foreground(color) => style.fg(*color),
        StylePayload::Italic => style.add_modifier(Modifier::ITALIC),
        StylePayload::Link(_) => style
            .patch(settings.link_style())
            .add_modifier(Modifier::UNDERLINED),
        StylePayload::Background(argb) => style.bg(blend_argb(*argb, settings.highlight_backdrop)),
    })
}

/// Flattens a translucent `0xAARRGGBB` color over an opaque backdrop.
pub fn blend_argb(argb: u32, backdrop: (u8, u8, u8)) -> Color {
    let alpha = (argb >> 24) & 0xff;
    let mix = |channel: u32, base: u8| -> u8 {
        ((channel * alpha + base as u32 * (255 - alpha)) / 255) as u8
    };
    Color::Rgb(
        mix((argb >> 16) & 0xff, backdrop.0),
        mix((argb >> 8) & 0xff, backdrop.1),
        mix(argb & 0xff, backdrop.2),
    )
}

fn margin_at(buffer: &StyledBuffer, index: usize) -> LeadingMargin {
    buffer
        .annotations_at(index)
        .filter_map(|payload| match payload {
            StylePayload::LeadingMargin(margin) => Some(*margin),
            _ => None,
        })
        .last()
        .unwrap_or_default()
}

fn push_char(
    builder: &mut Option<TokenBuilder>,
    fragments: &mut Vec<Fragment>,
    ch: char,
    style: Style,
) {
    let is_whitespace = ch.is_whitespace();
    if let Some(current) = builder
        .as_mut()
        .filter(|existing| existing.kind_matches(is_whitespace))
    {
        current.push_char(ch, style);
        return;
    }
    if let Some(existing) = builder.take() {
        fragments.push(existing.finish());
    }
    let mut new_builder = TokenBuilder::new(is_whitespace);
    new_builder.push_char(ch, style);
    *builder = Some(new_builder);
}

/// Receives rendered verses for the terminal view.
#[derive(Debug, Default)]
pub struct VerseLines {
    text: Option<StyledBuffer>,
}

impl VerseLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&StyledBuffer> {
        self.text.as_ref()
    }

    pub fn lines(&self, width: usize, settings: &Settings) -> Vec<Line<'static>> {
        match &self.text {
            Some(text) => verse_lines(text, width, settings),
            None => vec![Line::from("")],
        }
    }
}

impl TextSurface for VerseLines {
    fn set_text(&mut self, text: &StyledBuffer) {
        self.text = Some(text.clone());
    }
}

/// Verse-number column shown left of a verse whose text does not carry its
/// own number.
#[derive(Debug, Default)]
pub struct NumberGutter {
    label: Option<String>,
}

impl NumberGutter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Gutter cell for the first line of the verse, right-aligned to `width`.
    pub fn span(&self, width: usize, settings: &Settings) -> Span<'static> {
        match &self.label {
            Some(label) => Span::styled(
                format!("{label:>width$} "),
                settings.verse_number_style().add_modifier(Modifier::BOLD),
            ),
            None => Span::raw(" ".repeat(width + 1)),
        }
    }
}

impl VerseNumberSurface for NumberGutter {
    fn show(&mut self, label: &str) {
        self.label = Some(label.to_string());
    }

    fn hide(&mut self) {
        self.label = None;
    }
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

#[derive(Clone)]
struct Fragment {
    pieces: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
}

#[derive(Clone, Copy)]
enum FragmentKind {
    Word,
    Whitespace,
}

/// Builds one word or whitespace run. A word may change style midway, as
/// with a footnote glyph glued to the preceding word.
struct TokenBuilder {
    pieces: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
}

impl TokenBuilder {
    fn new(is_whitespace: bool) -> Self {
        Self {
            pieces: Vec::new(),
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn push_char(&mut self, ch: char, style: Style) {
        match self.pieces.last_mut() {
            Some(piece) if piece.style == style => piece.text.push(ch),
            _ => self.pieces.push(LineSegment {
                text: ch.to_string(),
                style,
            }),
        }
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            pieces: self.pieces,
            kind: self.kind,
            width: self.width,
        }
    }
}

fn wrap_fragments(
    fragments: &[Fragment],
    first_prefix: &str,
    continuation_prefix: &str,
    width: usize,
) -> Vec<Line<'static>> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(first_prefix);
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment.kind {
            FragmentKind::Whitespace => pending_whitespace.push(fragment.clone()),
            FragmentKind::Word => {
                let whitespace_width: usize =
                    pending_whitespace.iter().map(|item| item.width).sum();
                if builder.current_width() > builder.prefix_width
                    && builder.current_width() + whitespace_width + fragment.width > width
                {
                    // Whitespace at a wrap point is dropped.
                    pending_whitespace.clear();
                    outputs.push(builder.build_line());
                    builder = LineBuilder::new(continuation_prefix);
                }
                builder.append_with_pending(fragment.clone(), &mut pending_whitespace);
            }
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    width: usize,
    prefix_width: usize,
}

impl LineBuilder {
    fn new(prefix: &str) -> Self {
        let prefix_width = visible_width(prefix);
        let mut segments = Vec::new();
        if !prefix.is_empty() {
            segments.push(LineSegment {
                text: prefix.to_string(),
                style: Style::default(),
            });
        }
        Self {
            segments,
            width: prefix_width,
            prefix_width,
        }
    }

    fn current_width(&self) -> usize {
        self.width
    }

    fn append_with_pending(&mut self, token: Fragment, pending_whitespace: &mut Vec<Fragment>) {
        self.consume_pending(pending_whitespace);
        self.append_token(token);
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        self.width += fragment.width;
        self.segments.extend(fragment.pieces);
    }

    fn build_line(mut self) -> Line<'static> {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        Line::from(
            self.segments
                .into_iter()
                .map(|segment| Span::styled(segment.text, segment.style))
                .collect::<Vec<_>>(),
        )
    }
}

pub fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

pub fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| visible_width(span.content.as_ref()))
        .sum()
}
