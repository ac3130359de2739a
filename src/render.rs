use log::debug;
use thiserror::Error;

use crate::{
    buffer::{LeadingMargin, StyledBuffer, StylePayload},
    highlight::{HighlightRange, apply_highlight, overlay_range},
    markup::{self, ESCAPE, Marker, ParagraphKind, Token, Tokens},
    notice::InvalidTagReporter,
    paragraph::apply_paragraph_style,
    reference::{Ari, Arif, ReferenceFactory, ReferenceKind, XREF_MARK, superscript_digits},
    scratch::with_scratch,
    settings::Settings,
};

/// Separator between the verse number and the verse body.
const VERSE_NUMBER_GAP: &str = "  ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("verse number label is empty")]
    EmptyLabel,

    #[error("verse number label {0:?} contains markup or a line break")]
    InvalidLabel(String),
}

/// Receives the styled verse text.
pub trait TextSurface {
    fn set_text(&mut self, text: &StyledBuffer);
}

/// Separate verse-number display next to the verse text.
pub trait VerseNumberSurface {
    fn show(&mut self, label: &str);

    /// Hides the surface and clears its label.
    fn hide(&mut self);
}

/// Outcome of rendering one verse.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedVerse<'l> {
    buffer: StyledBuffer,
    leading_offset: usize,
    label: &'l str,
}

impl<'l> RenderedVerse<'l> {
    pub fn buffer(&self) -> &StyledBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> StyledBuffer {
        self.buffer
    }

    /// Number of characters before the verse body. Non-zero when the verse
    /// number was written into the text.
    pub fn leading_offset(&self) -> usize {
        self.leading_offset
    }

    pub fn verse_number_embedded(&self) -> bool {
        self.leading_offset > 0
    }

    pub fn label(&self) -> &'l str {
        self.label
    }

    /// Verse text without the verse number.
    pub fn body(&self) -> &str {
        self.buffer.tail(self.leading_offset)
    }

    /// Styled verse text without the verse number.
    pub fn body_buffer(&self) -> StyledBuffer {
        self.buffer.split_off_copy(self.leading_offset)
    }

    /// Pushes the result into display surfaces. When the number is part of
    /// the text the number surface is hidden, otherwise it shows the label.
    pub fn apply_to(
        &self,
        text: Option<&mut dyn TextSurface>,
        number: Option<&mut dyn VerseNumberSurface>,
    ) {
        if let Some(text) = text {
            text.set_text(&self.buffer);
        }
        if let Some(number) = number {
            if self.verse_number_embedded() {
                number.hide();
            } else {
                number.show(self.label);
            }
        }
    }
}

/// Formats encoded verse text into a [`StyledBuffer`].
///
/// A renderer is a bundle of borrowed collaborators and is cheap to copy, so
/// per-verse options like the highlight are set on a copy:
///
/// ```ignore
/// let verse = renderer.with_highlight(lookup(ari)).render(ari, text, &label)?;
/// ```
#[derive(Clone, Copy)]
pub struct VerseRenderer<'a> {
    settings: &'a Settings,
    checked: bool,
    highlight: Option<&'a dyn HighlightRange>,
    links: Option<&'a dyn ReferenceFactory>,
    reporter: Option<&'a dyn InvalidTagReporter>,
}

impl<'a> VerseRenderer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            checked: false,
            highlight: None,
            links: None,
            reporter: None,
        }
    }

    /// Checked (selection) mode drops the verse-number and red-text colors.
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_highlight(mut self, highlight: Option<&'a dyn HighlightRange>) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn with_links(mut self, links: Option<&'a dyn ReferenceFactory>) -> Self {
        self.links = links;
        self
    }

    pub fn with_reporter(mut self, reporter: Option<&'a dyn InvalidTagReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Renders `text` for verse `ari`, labelled with `label`.
    ///
    /// Text without the `@@` prefix goes through [`render_simple`](Self::render_simple).
    pub fn render<'l>(
        &self,
        ari: Ari,
        text: &str,
        label: &'l str,
    ) -> Result<RenderedVerse<'l>, RenderError> {
        validate_label(label)?;
        if !markup::is_formatted(text) {
            return Ok(self.simple(text, label));
        }

        let (buffer, leading_offset) = with_scratch(|scratch| {
            Scanner::new(self, ari, label, &mut scratch.tag).run(text)
        });
        Ok(RenderedVerse {
            buffer,
            leading_offset,
            label,
        })
    }

    /// Renders text that carries no markup: verse number, two spaces, the
    /// literal text.
    pub fn render_simple<'l>(
        &self,
        text: &str,
        label: &'l str,
    ) -> Result<RenderedVerse<'l>, RenderError> {
        validate_label(label)?;
        Ok(self.simple(text, label))
    }

    fn simple<'l>(&self, text: &str, label: &'l str) -> RenderedVerse<'l> {
        let mut buffer =
            StyledBuffer::with_capacity(label.len() + VERSE_NUMBER_GAP.len() + text.len());
        buffer.push_str(label);
        buffer.annotate(0..buffer.len(), self.verse_number_style());
        buffer.push_str(VERSE_NUMBER_GAP);
        let leading_offset = buffer.len();

        buffer.push_str(text);
        let len = buffer.len();
        let margin = LeadingMargin::new(0, self.settings.indent_paragraph_rest);
        buffer.annotate(0..len, StylePayload::LeadingMargin(margin));

        apply_highlight(&mut buffer, leading_offset, text, self.highlight);

        RenderedVerse {
            buffer,
            leading_offset,
            label,
        }
    }

    fn verse_number_style(&self) -> StylePayload {
        StylePayload::VerseNumber {
            color: (!self.checked).then_some(self.settings.verse_number_color),
        }
    }
}

fn validate_label(label: &str) -> Result<(), RenderError> {
    if label.is_empty() {
        return Err(RenderError::EmptyLabel);
    }
    if label.contains([ESCAPE, '\n', '\r']) {
        return Err(RenderError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

/// Result of interpreting the content of a special tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpecialTag {
    Reference(ReferenceKind, u8),
    Invalid(ReferenceKind),
    Ignored,
}

fn parse_special_tag(tag: &str) -> SpecialTag {
    let mut chars = tag.chars();
    let kind = match chars.next() {
        Some('f') => ReferenceKind::Footnote,
        Some('x') => ReferenceKind::CrossReference,
        _ => return SpecialTag::Ignored,
    };
    let field = chars.as_str();
    if field.is_empty() {
        return SpecialTag::Ignored;
    }
    match field.parse::<u32>() {
        Ok(n @ 1..=255) => SpecialTag::Reference(kind, n as u8),
        _ => SpecialTag::Invalid(kind),
    }
}

/// State of one pass over a formatted verse.
struct Scanner<'a> {
    renderer: &'a VerseRenderer<'a>,
    ari: Ari,
    label: &'a str,
    buffer: StyledBuffer,
    leading_offset: usize,
    para_kind: Option<ParagraphKind>,
    start_para: usize,
    start_red: Option<usize>,
    start_italic: Option<usize>,
    in_special_tag: bool,
    tag: &'a mut String,
}

impl<'a> Scanner<'a> {
    fn new(
        renderer: &'a VerseRenderer<'a>,
        ari: Ari,
        label: &'a str,
        tag: &'a mut String,
    ) -> Self {
        Self {
            renderer,
            ari,
            label,
            buffer: StyledBuffer::with_capacity(label.len() + 64),
            leading_offset: 0,
            para_kind: None,
            start_para: 0,
            start_red: None,
            start_italic: None,
            in_special_tag: false,
            tag,
        }
    }

    fn run(mut self, text: &str) -> (StyledBuffer, usize) {
        self.write_verse_number(text);

        let body = &text[2..];
        for token in Tokens::new(body) {
            match token {
                Token::Text(run) if self.in_special_tag => {
                    self.tag.clear();
                    self.tag.push_str(run);
                }
                Token::Text(run) | Token::Tail(run) => self.buffer.push_str(run),
                Token::Marker(marker) => self.apply_marker(marker),
            }
        }

        self.close_paragraph();
        if self.start_red.is_some() || self.start_italic.is_some() {
            debug!("unterminated style region in verse {}", self.ari);
        }
        self.apply_highlight();

        (self.buffer, self.leading_offset)
    }

    /// A verse opening with `@^` or `@1`..`@4` gets its number from the
    /// paragraph layout; everything else starts with an inline number.
    fn write_verse_number(&mut self, text: &str) {
        if markup::leading_paragraph(text).is_some_and(ParagraphKind::suppresses_verse_number) {
            debug!("verse {} opens with a paragraph, number not inlined", self.ari);
            self.leading_offset = 0;
            return;
        }
        self.buffer.push_str(self.label);
        self.buffer
            .annotate(0..self.buffer.len(), self.renderer.verse_number_style());
        self.buffer.push_str(VERSE_NUMBER_GAP);
        self.leading_offset = self.buffer.len();
    }

    fn apply_marker(&mut self, marker: Marker) {
        match marker {
            Marker::Paragraph(kind) => {
                self.close_paragraph();
                if self.buffer.len() > self.leading_offset {
                    self.buffer.push('\n');
                }
                self.para_kind = Some(kind);
                self.start_para = self.buffer.len();
            }
            Marker::RedStart => self.start_red = Some(self.buffer.len()),
            Marker::RedEnd => {
                // Red text is a color override, so checked mode drops it.
                // Italics are structural and stay.
                if let Some(start) = self.start_red.take() {
                    if !self.renderer.checked {
                        let color = self.renderer.settings.red_text_color;
                        self.buffer
                            .annotate(start..self.buffer.len(), StylePayload::Foreground(color));
                    }
                }
            }
            Marker::ItalicStart => self.start_italic = Some(self.buffer.len()),
            Marker::ItalicEnd => {
                if let Some(start) = self.start_italic.take() {
                    self.buffer
                        .annotate(start..self.buffer.len(), StylePayload::Italic);
                }
            }
            Marker::LineBreak => self.buffer.push('\n'),
            Marker::TagOpen => {
                self.in_special_tag = true;
                self.tag.clear();
            }
            Marker::TagContentEnd => self.in_special_tag = false,
            Marker::TagClose => {
                self.close_special_tag();
                self.in_special_tag = false;
                self.tag.clear();
            }
        }
    }

    fn close_paragraph(&mut self) {
        apply_paragraph_style(
            &mut self.buffer,
            self.para_kind,
            self.start_para,
            self.label,
            self.leading_offset > 0,
            self.renderer.settings,
        );
    }

    fn close_special_tag(&mut self) {
        let (kind, field) = match parse_special_tag(self.tag.as_str()) {
            SpecialTag::Reference(kind, field) => (kind, field),
            SpecialTag::Ignored => return,
            SpecialTag::Invalid(kind) => {
                self.report_invalid_tag(kind);
                return;
            }
        };

        let start = self.buffer.len();
        match kind {
            ReferenceKind::Footnote => {
                for glyph in superscript_digits(field as u32) {
                    self.buffer.push(glyph);
                }
            }
            ReferenceKind::CrossReference => self.buffer.push(XREF_MARK),
        }

        if let Some(links) = self.renderer.links {
            let link = links.create(kind, Arif::new(self.ari, field));
            self.buffer
                .annotate(start..self.buffer.len(), StylePayload::Link(link));
        }
    }

    fn report_invalid_tag(&self, kind: ReferenceKind) {
        let what = match kind {
            ReferenceKind::Footnote => "footnote",
            ReferenceKind::CrossReference => "xref",
        };
        let message = format!("Invalid {what} tag at ari {}: {}", self.ari, self.tag);
        match self.renderer.reporter {
            Some(reporter) => reporter.report(message),
            None => debug!("{message}"),
        }
    }

    fn apply_highlight(&mut self) {
        let Some(highlight) = self.renderer.highlight else {
            return;
        };
        let overlay = overlay_range(
            self.buffer.len(),
            self.leading_offset,
            self.buffer.tail(self.leading_offset),
            highlight,
        );
        if let Some((range, color)) = overlay {
            self.buffer.annotate(range, StylePayload::Background(color));
        }
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
