//! Formatting of encoded verse text into styled, annotated text buffers.
//!
//! [`VerseRenderer`] turns one verse (plain or `@@`-formatted) plus its
//! verse-number label into a [`StyledBuffer`]. The [`display`] module lays
//! such buffers out as `ratatui` lines.

pub mod buffer;
pub mod display;
pub mod highlight;
pub mod logger;
pub mod markup;
pub mod notice;
pub mod paragraph;
pub mod reference;
pub mod render;
pub mod settings;

mod scratch;

pub use buffer::{Annotation, LeadingMargin, StyledBuffer, StylePayload};
pub use highlight::{HighlightInfo, HighlightRange, PartialRange};
pub use notice::{InvalidTagReporter, LogReporter, Notice, NoticeReceiver, NoticeSender, notice_channel};
pub use reference::{Ari, Arif, InlineLink, ReferenceFactory, ReferenceKind, SourceLinkFactory};
pub use render::{RenderError, RenderedVerse, TextSurface, VerseNumberSurface, VerseRenderer};
pub use settings::Settings;
