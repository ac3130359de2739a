use std::fmt;

/// Superscript glyphs for `0`..`9`.
const SUPERSCRIPT_DIGITS: [char; 10] = [
    '\u{2070}', '\u{00b9}', '\u{00b2}', '\u{00b3}', '\u{2074}', '\u{2075}', '\u{2076}', '\u{2077}',
    '\u{2078}', '\u{2079}',
];

/// Glyph shown in place of a cross-reference tag.
pub const XREF_MARK: char = '\u{203b}';

/// Verse identifier: `book << 16 | chapter << 8 | verse`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ari(u32);

impl Ari {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn encode(book: u8, chapter: u8, verse: u8) -> Self {
        Self((book as u32) << 16 | (chapter as u32) << 8 | verse as u32)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn book(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn chapter(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn verse(self) -> u8 {
        self.0 as u8
    }

    /// Default verse-number label for this verse.
    pub fn verse_label(self) -> String {
        self.verse().to_string()
    }
}

impl fmt::Display for Ari {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Key of an inline reference: the verse identifier shifted left by 8 with
/// the tag field in the low byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arif(u32);

impl Arif {
    pub const fn new(ari: Ari, field: u8) -> Self {
        Self(ari.0 << 8 | field as u32)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn ari(self) -> Ari {
        Ari(self.0 >> 8)
    }

    pub const fn field(self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

impl fmt::Display for Arif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Footnote,
    CrossReference,
}

/// Clickable inline reference attached to a footnote or cross-reference glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InlineLink {
    pub kind: ReferenceKind,
    pub arif: Arif,
    /// Which list produced the link, so a click can be resolved against the
    /// right version (for example the main or the split pane).
    pub source: u32,
}

/// Creates the annotation attached to a resolved special tag.
///
/// Without a factory the glyph is still rendered, just not clickable.
pub trait ReferenceFactory {
    fn create(&self, kind: ReferenceKind, arif: Arif) -> InlineLink;
}

/// Factory stamping every link with a fixed source id.
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceLinkFactory {
    source: u32,
}

impl SourceLinkFactory {
    pub fn new(source: u32) -> Self {
        Self { source }
    }
}

impl ReferenceFactory for SourceLinkFactory {
    fn create(&self, kind: ReferenceKind, arif: Arif) -> InlineLink {
        InlineLink {
            kind,
            arif,
            source: self.source,
        }
    }
}

/// Digits of `n` as superscript glyphs, most significant first.
pub fn superscript_digits(n: u32) -> impl Iterator<Item = char> {
    let mut divisor = 1;
    while n / divisor >= 10 {
        divisor *= 10;
    }
    std::iter::successors(Some(divisor), |d| (*d >= 10).then(|| d / 10))
        .map(move |d| SUPERSCRIPT_DIGITS[(n / d % 10) as usize])
}

/// `n` rendered with superscript digits, e.g. as the lead-in of a footnote
/// popup.
pub fn superscript_number(n: u32) -> String {
    superscript_digits(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ari_components() {
        let ari = Ari::encode(42, 3, 16);
        assert_eq!(ari.raw(), 0x2a0310);
        assert_eq!(ari.book(), 42);
        assert_eq!(ari.chapter(), 3);
        assert_eq!(ari.verse(), 16);
        assert_eq!(ari.verse_label(), "16");
        assert_eq!(ari.to_string(), "0x2a0310");
    }

    #[test]
    fn arif_round_trips_every_field() {
        let ari = Ari::from_raw(0x1020);
        for field in 1..=255u8 {
            let arif = Arif::new(ari, field);
            assert_eq!(arif.raw(), 0x1020 << 8 | field as u32);
            assert_eq!(arif.raw() & 0xff, field as u32);
            assert_eq!(arif.field(), field);
            assert_eq!(arif.ari(), ari);
        }
        assert_eq!(Arif::new(ari, 7).raw(), 0x102007);
        assert_eq!(Arif::new(ari, 7).to_string(), "0x00102007");
    }

    #[test]
    fn superscript_rendering() {
        assert_eq!(superscript_number(0), "⁰");
        assert_eq!(superscript_number(7), "⁷");
        assert_eq!(superscript_number(10), "¹⁰");
        assert_eq!(superscript_number(255), "²⁵⁵");
        assert_eq!(superscript_number(1009), "¹⁰⁰⁹");
    }

    #[test]
    fn source_factory_stamps_source() {
        let link = SourceLinkFactory::new(1).create(ReferenceKind::CrossReference, Arif::from_raw(5));
        assert_eq!(link.source, 1);
        assert_eq!(link.kind, ReferenceKind::CrossReference);
        assert_eq!(link.arif.raw(), 5);
    }
}
