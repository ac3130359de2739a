use std::ops::Range;

use ratatui::style::Color;

use crate::reference::InlineLink;

/// Indentation of a paragraph, in terminal cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LeadingMargin {
    pub first: u16,
    pub rest: u16,
}

impl LeadingMargin {
    pub const fn new(first: u16, rest: u16) -> Self {
        Self { first, rest }
    }

    /// Same indent for the first and the following lines.
    pub const fn uniform(all: u16) -> Self {
        Self::new(all, all)
    }
}

/// Style attached to a range of a [`StyledBuffer`].
///
/// Payloads are plain values; display adapters translate them into whatever
/// their rendering stack understands.
#[derive(Clone, Debug, PartialEq)]
pub enum StylePayload {
    /// Smaller, raised verse number. `color` is `None` in checked mode.
    VerseNumber { color: Option<Color> },
    LeadingMargin(LeadingMargin),
    Foreground(Color),
    Italic,
    Link(InlineLink),
    /// Highlight background as `0xAARRGGBB`.
    Background(u32),
}

impl StylePayload {
    fn same_kind(&self, other: &StylePayload) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub range: Range<usize>,
    pub payload: StylePayload,
}

/// Text plus range-tagged styles.
///
/// Offsets count `char`s, not bytes, so callers can address the text the way
/// highlight ranges and verse layout do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyledBuffer {
    text: String,
    char_len: usize,
    annotations: Vec<Annotation>,
}

impl StyledBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            text: String::with_capacity(bytes),
            char_len: 0,
            annotations: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in `char`s.
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
        self.char_len += 1;
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
        self.char_len += text.chars().count();
    }

    /// Attaches `payload` to `range`. The range is clamped to the text and
    /// empty results are dropped, so annotations always stay in bounds.
    pub fn annotate(&mut self, range: Range<usize>, payload: StylePayload) {
        if let Some(range) = self.clamp(range) {
            self.annotations.push(Annotation { range, payload });
        }
    }

    /// Like [`annotate`](Self::annotate), but replaces an existing annotation
    /// of the same kind over the exact same range instead of stacking.
    pub fn annotate_unique(&mut self, range: Range<usize>, payload: StylePayload) {
        let Some(range) = self.clamp(range) else {
            return;
        };
        if let Some(existing) = self
            .annotations
            .iter_mut()
            .find(|a| a.range == range && a.payload.same_kind(&payload))
        {
            existing.payload = payload;
            return;
        }
        self.annotations.push(Annotation { range, payload });
    }

    fn clamp(&self, range: Range<usize>) -> Option<Range<usize>> {
        let end = range.end.min(self.char_len);
        let start = range.start.min(end);
        if start == end {
            None
        } else {
            Some(start..end)
        }
    }

    /// Annotations in the order they were applied.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotations_at(&self, index: usize) -> impl Iterator<Item = &StylePayload> {
        self.annotations
            .iter()
            .filter(move |a| a.range.contains(&index))
            .map(|a| &a.payload)
    }

    /// Text of a `char` range.
    pub fn slice(&self, range: Range<usize>) -> &str {
        let start = self.byte_offset(range.start);
        let end = self.byte_offset(range.end.max(range.start));
        &self.text[start..end]
    }

    /// Text from `offset` to the end.
    pub fn tail(&self, offset: usize) -> &str {
        &self.text[self.byte_offset(offset)..]
    }

    /// Copy of the buffer from `offset` on, with annotations re-based and
    /// clipped to the remaining text.
    pub fn split_off_copy(&self, offset: usize) -> StyledBuffer {
        let offset = offset.min(self.char_len);
        let mut out = StyledBuffer::with_capacity(self.text.len());
        out.push_str(self.tail(offset));
        for annotation in &self.annotations {
            if annotation.range.end <= offset {
                continue;
            }
            let start = annotation.range.start.saturating_sub(offset);
            let end = annotation.range.end - offset;
            out.annotate(start..end, annotation.payload.clone());
        }
        out
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        if char_offset >= self.char_len {
            return self.text.len();
        }
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}
