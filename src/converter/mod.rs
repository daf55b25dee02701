//! Markup converters: turn one single-page PDF into Markdown.
//!
//! The driver only knows the [`MarkupConverter`] contract: given an
//! [`ExtractedPage`], return a Markdown string (possibly empty) or a
//! [`PageError`]. Two implementations ship with the crate:
//!
//! | Converter | Needs | Good for |
//! |-----------|-------|----------|
//! | [`TextLayerConverter`] | nothing (default) | born-digital PDFs with a text layer |
//! | [`VisionConverter`] | an LLM API key | scans, complex layouts, tables, formulae |

pub mod text_layer;
pub mod vision;

pub use text_layer::TextLayerConverter;
pub use vision::VisionConverter;

use crate::config::{ConverterKind, SplitConfig};
use crate::error::{PageError, SplitError};
use crate::pipeline::extract::ExtractedPage;
use pdfium_render::prelude::Pdfium;

/// Converts an isolated single-page document to Markdown.
pub trait MarkupConverter {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Produce Markdown for `page`.
    ///
    /// Called once per page, in page order, from a single thread.
    fn to_markup(&self, page: &ExtractedPage) -> Result<String, PageError>;
}

impl<C: MarkupConverter + ?Sized> MarkupConverter for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn to_markup(&self, page: &ExtractedPage) -> Result<String, PageError> {
        (**self).to_markup(page)
    }
}

/// Construct the converter selected by `kind`.
///
/// The vision converter resolves its LLM provider here, so a missing API key
/// fails the run before any page is touched.
pub fn build_converter<'a>(
    kind: ConverterKind,
    pdfium: &'a Pdfium,
    config: &SplitConfig,
) -> Result<Box<dyn MarkupConverter + 'a>, SplitError> {
    match kind {
        ConverterKind::TextLayer => Ok(Box::new(TextLayerConverter::new(pdfium))),
        ConverterKind::Vision => Ok(Box::new(VisionConverter::new(pdfium, &config.vision)?)),
    }
}
