use ratatui::style::{Color, Style};

/// Applied layout and color settings for verse rendering.
///
/// Widths are in terminal cells. The renderer only reads a settings value,
/// callers own it and pass it in on every call.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// First-line indent of a `@^` paragraph
    pub indent_paragraph_first: u16,

    /// Indent of the remaining lines of a paragraph
    pub indent_paragraph_rest: u16,

    /// Indents of the `@1`..`@4` levels
    pub indent_levels: [u16; 4],

    /// Extra indent per verse-number label character beyond the second
    pub indent_spacing_extra: u16,

    /// Color for verse numbers
    pub verse_number_color: Color,

    /// Color for red-letter text
    pub red_text_color: Color,

    /// Color for footnote and cross-reference glyphs
    pub link_color: Color,

    /// Backdrop used when flattening translucent highlight colors
    pub highlight_backdrop: (u8, u8, u8),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            indent_paragraph_first: 4,
            indent_paragraph_rest: 2,
            indent_levels: [4, 6, 8, 10],
            indent_spacing_extra: 1,
            verse_number_color: Color::DarkGray,
            red_text_color: Color::Red,
            link_color: Color::Blue,
            highlight_backdrop: (0, 0, 0),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configured indent of level `1..=4`; other levels have no extra indent.
    pub fn level_indent(&self, level: usize) -> u16 {
        level
            .checked_sub(1)
            .and_then(|idx| self.indent_levels.get(idx))
            .copied()
            .unwrap_or(0)
    }

    /// Get the style for verse numbers
    pub fn verse_number_style(&self) -> Style {
        Style::default().fg(self.verse_number_color)
    }

    /// Get the style for links
    pub fn link_style(&self) -> Style {
        Style::default().fg(self.link_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_indent_maps_levels() {
        let settings = Settings::default();
        assert_eq!(settings.level_indent(1), 4);
        assert_eq!(settings.level_indent(4), 10);
        assert_eq!(settings.level_indent(0), 0);
        assert_eq!(settings.level_indent(5), 0);
    }
}
