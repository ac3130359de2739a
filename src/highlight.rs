use std::ops::Range;

use log::debug;

use crate::buffer::{StyledBuffer, StylePayload};

/// Alpha applied to every highlight color.
const HIGHLIGHT_ALPHA: u32 = 0xa000_0000;

/// Partial highlight offsets, relative to the verse body. The end may come
/// before the start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartialRange {
    pub start_offset: usize,
    pub end_offset: usize,
}

/// A highlight looked up for one verse.
pub trait HighlightRange {
    /// Base color as `0xRRGGBB`.
    fn color_rgb(&self) -> u32;

    fn partial(&self) -> Option<PartialRange>;

    /// Whether the highlight should cover only [`partial`](Self::partial) of
    /// `body`, or the whole verse.
    fn should_render_as_partial(&self, body: &str) -> bool;
}

/// Mixes the fixed highlight alpha into an RGB color.
pub fn alpha_mix(color_rgb: u32) -> u32 {
    HIGHLIGHT_ALPHA | (color_rgb & 0x00ff_ffff)
}

/// Stable hash of a verse body, used to detect partial highlights whose
/// verse text changed since they were made.
pub fn verse_text_hash(body: &str) -> i32 {
    body.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StoredPartial {
    range: PartialRange,
    text_hash: i32,
}

/// Highlight record as stored alongside the verse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlightInfo {
    color_rgb: u32,
    partial: Option<StoredPartial>,
}

impl HighlightInfo {
    pub fn whole(color_rgb: u32) -> Self {
        Self {
            color_rgb,
            partial: None,
        }
    }

    /// Partial highlight made against `body`.
    pub fn partial(color_rgb: u32, start_offset: usize, end_offset: usize, body: &str) -> Self {
        Self::partial_with_hash(color_rgb, start_offset, end_offset, verse_text_hash(body))
    }

    pub fn partial_with_hash(
        color_rgb: u32,
        start_offset: usize,
        end_offset: usize,
        text_hash: i32,
    ) -> Self {
        Self {
            color_rgb,
            partial: Some(StoredPartial {
                range: PartialRange {
                    start_offset,
                    end_offset,
                },
                text_hash,
            }),
        }
    }
}

impl HighlightRange for HighlightInfo {
    fn color_rgb(&self) -> u32 {
        self.color_rgb
    }

    fn partial(&self) -> Option<PartialRange> {
        self.partial.map(|stored| stored.range)
    }

    fn should_render_as_partial(&self, body: &str) -> bool {
        self.partial
            .is_some_and(|stored| stored.text_hash == verse_text_hash(body))
    }
}

/// Overlays `highlight` onto `buffer`, whose body starts at `leading_offset`.
pub fn apply_highlight(
    buffer: &mut StyledBuffer,
    leading_offset: usize,
    body: &str,
    highlight: Option<&dyn HighlightRange>,
) {
    let Some(highlight) = highlight else {
        return;
    };
    if let Some((range, color)) = overlay_range(buffer.len(), leading_offset, body, highlight) {
        buffer.annotate(range, StylePayload::Background(color));
    }
}

/// Buffer range and color a highlight covers, or `None` for an empty
/// partial range.
pub(crate) fn overlay_range(
    buffer_len: usize,
    leading_offset: usize,
    body: &str,
    highlight: &dyn HighlightRange,
) -> Option<(Range<usize>, u32)> {
    let color = alpha_mix(highlight.color_rgb());
    let partial = highlight
        .partial()
        .filter(|_| highlight.should_render_as_partial(body));

    let Some(range) = partial else {
        return Some((leading_offset..buffer_len, color));
    };
    let start = leading_offset.saturating_add(range.start_offset);
    let end = leading_offset.saturating_add(range.end_offset);
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    if start == end {
        debug!("skipping empty partial highlight at {start}");
        return None;
    }
    Some((start..end, color))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_buffer(prefix: &str, body: &str) -> StyledBuffer {
        let mut buffer = StyledBuffer::new();
        buffer.push_str(prefix);
        buffer.push_str(body);
        buffer
    }

    fn backgrounds(buffer: &StyledBuffer) -> Vec<Range<usize>> {
        buffer
            .annotations()
            .iter()
            .filter(|a| matches!(a.payload, StylePayload::Background(_)))
            .map(|a| a.range.clone())
            .collect()
    }

    #[test]
    fn alpha_mix_sets_alpha() {
        assert_eq!(alpha_mix(0xffff00), 0xa0ffff00);
        assert_eq!(alpha_mix(0xff123456), 0xa0123456);
    }

    #[test]
    fn hash_matches_java_string_hash() {
        assert_eq!(verse_text_hash(""), 0);
        assert_eq!(verse_text_hash("a"), 97);
        assert_eq!(verse_text_hash("abc"), 96354);
    }

    #[test]
    fn absent_highlight_is_noop() {
        let mut buffer = body_buffer("1  ", "abc");
        apply_highlight(&mut buffer, 3, "abc", None);
        assert!(buffer.annotations().is_empty());
    }

    #[test]
    fn whole_verse_covers_body() {
        let mut buffer = body_buffer("12  ", "abcdef");
        let info = HighlightInfo::whole(0x00ff00);
        apply_highlight(&mut buffer, 4, "abcdef", Some(&info));
        assert_eq!(backgrounds(&buffer), vec![4..10]);
        assert_eq!(
            buffer.annotations()[0].payload,
            StylePayload::Background(0xa000ff00)
        );
    }

    #[test]
    fn partial_maps_body_offsets() {
        let mut buffer = body_buffer("12  ", "abcdef");
        let info = HighlightInfo::partial(0xff0000, 1, 3, "abcdef");
        apply_highlight(&mut buffer, 4, "abcdef", Some(&info));
        assert_eq!(backgrounds(&buffer), vec![5..7]);
    }

    #[test]
    fn reversed_partial_is_normalized() {
        let mut buffer = body_buffer("12  ", "abcdef");
        let info = HighlightInfo::partial(0xff0000, 5, 2, "abcdef");
        apply_highlight(&mut buffer, 4, "abcdef", Some(&info));
        assert_eq!(backgrounds(&buffer), vec![6..9]);
    }

    #[test]
    fn empty_partial_emits_nothing() {
        let mut buffer = body_buffer("", "abcdef");
        let info = HighlightInfo::partial(0xff0000, 2, 2, "abcdef");
        apply_highlight(&mut buffer, 0, "abcdef", Some(&info));
        assert!(backgrounds(&buffer).is_empty());
    }

    #[test]
    fn offsets_past_usize_range_saturate() {
        let mut buffer = body_buffer("1  ", "abc");
        let info = HighlightInfo::partial_with_hash(
            0xff0000,
            usize::MAX,
            usize::MAX - 1,
            verse_text_hash("abc"),
        );
        apply_highlight(&mut buffer, 3, "abc", Some(&info));
        assert!(backgrounds(&buffer).is_empty());
    }

    #[test]
    fn stale_partial_falls_back_to_whole_verse() {
        let mut buffer = body_buffer("3  ", "changed text");
        let info = HighlightInfo::partial(0xff0000, 0, 2, "original text");
        apply_highlight(&mut buffer, 3, "changed text", Some(&info));
        assert_eq!(backgrounds(&buffer), vec![3..15]);
    }
}
