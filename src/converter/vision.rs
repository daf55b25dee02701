//! Vision converter: rasterise the page and let a VLM transcribe it.
//!
//! ```text
//! single-page PDF ──▶ render ──▶ encode ──▶ llm ──▶ postprocess
//!                     (pdfium)   (base64)   (VLM)   (cleanup)
//! ```
//!
//! The driver is synchronous, so the converter owns a current-thread tokio
//! runtime and blocks on each LLM call. Pages are never sent concurrently.

use crate::config::VisionOptions;
use crate::converter::MarkupConverter;
use crate::error::{PageError, SplitError};
use crate::pipeline::extract::ExtractedPage;
use crate::pipeline::{encode, llm, postprocess, render};
use edgequake_llm::LLMProvider;
use pdfium_render::prelude::Pdfium;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Converts a page by sending its rendered image to a vision LLM.
pub struct VisionConverter<'a> {
    pdfium: &'a Pdfium,
    provider: Arc<dyn LLMProvider>,
    runtime: Runtime,
    options: VisionOptions,
}

impl<'a> VisionConverter<'a> {
    /// Resolve the provider and build the runtime.
    ///
    /// Fails with [`SplitError::ProviderNotConfigured`] when no provider can
    /// be found, before any page is processed.
    pub fn new(pdfium: &'a Pdfium, options: &VisionOptions) -> Result<Self, SplitError> {
        let provider = llm::resolve_provider(options)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SplitError::Internal(format!("Failed to create tokio runtime: {e}")))?;

        Ok(Self {
            pdfium,
            provider,
            runtime,
            options: options.clone(),
        })
    }
}

impl MarkupConverter for VisionConverter<'_> {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn to_markup(&self, page: &ExtractedPage) -> Result<String, PageError> {
        let page_num = page.page_num();
        let image = render::render_single_page(self.pdfium, page.path(), page_num, &self.options)?;
        let image_data = encode::encode_page(&image, page_num)?;

        let raw = self.runtime.block_on(llm::transcribe_page(
            &self.provider,
            page_num,
            image_data,
            &self.options,
        ))?;

        Ok(postprocess::clean_markdown(&raw))
    }
}
