use crate::{
    buffer::{LeadingMargin, StyledBuffer, StylePayload},
    markup::ParagraphKind,
    settings::Settings,
};

/// Indentation for a paragraph segment.
///
/// `kind` is `None` before the first paragraph marker, which lays out like
/// `@0` on a line that starts with the verse number. Deeper levels move right
/// by `indent_spacing_extra` for every label character beyond the second, so
/// wide labels such as `100` stay aligned.
pub fn resolve_margin(
    kind: Option<ParagraphKind>,
    label_len: usize,
    first_line_has_verse_number: bool,
    settings: &Settings,
) -> LeadingMargin {
    let rest = settings.indent_paragraph_rest;
    let Some(kind) = kind else {
        return LeadingMargin::new(0, rest);
    };

    match kind {
        ParagraphKind::Level0 if first_line_has_verse_number => LeadingMargin::new(0, rest),
        ParagraphKind::Level0 => LeadingMargin::uniform(rest),
        ParagraphKind::NewParagraph => {
            LeadingMargin::new(settings.indent_paragraph_first, rest)
        }
        ParagraphKind::Level1
        | ParagraphKind::Level2
        | ParagraphKind::Level3
        | ParagraphKind::Level4 => {
            let level = kind.level().unwrap_or(0);
            let extra_units = label_len.saturating_sub(2) as u16;
            let indent = settings
                .level_indent(level)
                .saturating_add(extra_units.saturating_mul(settings.indent_spacing_extra));
            LeadingMargin::uniform(indent)
        }
    }
}

/// Applies the margin of a finished paragraph segment `[start, len)`.
///
/// Empty segments are left alone. Re-applying over the same bounds replaces
/// the previous margin instead of stacking another one.
pub fn apply_paragraph_style(
    buffer: &mut StyledBuffer,
    kind: Option<ParagraphKind>,
    start: usize,
    label: &str,
    first_line_has_verse_number: bool,
    settings: &Settings,
) {
    let len = buffer.len();
    if start >= len {
        return;
    }

    let margin = resolve_margin(
        kind,
        label.chars().count(),
        first_line_has_verse_number,
        settings,
    );
    buffer.annotate_unique(start..len, StylePayload::LeadingMargin(margin));
}
