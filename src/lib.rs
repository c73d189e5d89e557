//! `scribe-layout`: a core text layout engine.
//!
//! Turns a styled, appended UTF-16 character stream into a laid-out
//! geometric model (positioned glyphs, line boxes, and caret/hit-test
//! queries) ready for a paint layer to consume. Shaping, font
//! matching, the bidi algorithm, and UAX #14 line-break classification
//! are all modeled as traits ([`shaping::Shaper`],
//! [`shaping::FontMatcher`], [`shaping::BidiProvider`],
//! [`shaping::LineBreakProvider`]) rather than bundled implementations:
//! this crate never links against a concrete font backend unless the
//! `native_shaping` feature is enabled.
//!
//! The pipeline, leaves first:
//!
//! ```text
//! CodepointBuffer + StyleRunTable
//!     -> FontRunBuilder   (shaping, one style run at a time)
//!     -> LineBuilder      (word wrap, bidi reorder, ellipsis)
//!     -> TextBlock        (owns everything, answers queries)
//! ```
//!
//! ```
//! use std::sync::Arc;
//! use scribe_layout::{
//!     line_builder::TextAlignment,
//!     shaping::testing::{MockBidiProvider, MockFontMatcher, MockLineBreakProvider, MockShaper},
//!     style::StyleDescriptorBuilder,
//!     text_block::{LayoutParamsBuilder, TextBlock},
//!     pool::FontRunPool,
//! };
//!
//! let mut block: TextBlock<scribe_layout::shaping::testing::MockTypeface> = TextBlock::new();
//! let style = StyleDescriptorBuilder::new("Georgia", 16.0).seal();
//! block.append_styled_text(&"hello world".encode_utf16().collect::<Vec<u16>>(), style);
//!
//! let params = LayoutParamsBuilder::new()
//!     .max_width(Some(60.0))
//!     .text_alignment(TextAlignment::Left)
//!     .seal();
//!
//! let mut pool = FontRunPool::new();
//! block
//!     .layout(
//!         &params,
//!         &MockFontMatcher::new("regular"),
//!         &MockShaper::new(8.0),
//!         &MockBidiProvider,
//!         &MockLineBreakProvider,
//!         &mut pool,
//!     )
//!     .unwrap();
//!
//! assert!(block.lines().len() >= 1);
//! ```

pub mod bidi;
pub mod codepoint_buffer;
pub mod error;
pub mod font_run;
pub mod font_run_builder;
pub mod line;
pub mod line_break;
pub mod line_builder;
pub mod pool;
pub mod shaping;
pub mod style;
pub mod style_run;
pub mod text_block;

#[cfg(feature = "native_shaping")]
pub mod native;

#[cfg(feature = "hyphenation")]
pub mod hyphenate;

pub use bidi::UnicodeBidiProvider;
pub use codepoint_buffer::CodepointBuffer;
pub use error::LayoutError;
pub use font_run::{FontMetrics, FontRun, FontRunKind};
pub use line::Line;
pub use line_break::UaxLineBreakProvider;
pub use pool::FontRunPool;
pub use style::{StyleDescriptor, StyleDescriptorBuilder};
pub use style_run::{StyleRun, StyleRunTable};
pub use text_block::{LayoutParams, LayoutParamsBuilder, TextBlock};
