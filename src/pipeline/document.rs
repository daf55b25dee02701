//! Document loading and the [`PageSource`] seam the driver iterates over.
//!
//! [`SourceDocument`] wraps an open pdfium document. It is opened once per
//! run, only ever read from, and closed when it is dropped at the end of
//! the run.

use crate::error::{PageError, SplitError};
use crate::pipeline::extract::{self, ExtractedPage};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Anything the driver can split into single-page documents.
///
/// [`SourceDocument`] is the production implementation; tests substitute
/// in-memory sources so the driver can be exercised without pdfium.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Copy page `index` (0-based) into an isolated single-page document.
    ///
    /// The returned [`ExtractedPage`] owns its backing file; dropping it
    /// deletes the file.
    fn extract_page(&self, index: usize) -> Result<ExtractedPage, PageError>;
}

/// A PDF opened for splitting.
pub struct SourceDocument<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl<'a> SourceDocument<'a> {
    /// Open `path` with the given pdfium bindings.
    ///
    /// Any failure here is fatal for the run: there is no partial document
    /// to iterate.
    pub fn open(
        pdfium: &'a Pdfium,
        path: impl AsRef<Path>,
        password: Option<&'a str>,
    ) -> Result<Self, SplitError> {
        let path = path.as_ref();
        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| classify_open_error(path, password.is_some(), &e))?;

        info!(
            "Opened PDF {} ({} pages)",
            path.display(),
            document.pages().len()
        );

        Ok(Self { pdfium, document })
    }
}

impl PageSource for SourceDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn extract_page(&self, index: usize) -> Result<ExtractedPage, PageError> {
        let total = self.page_count();
        if index >= total {
            return Err(PageError::OutOfRange {
                page: index + 1,
                total,
            });
        }

        let single = extract::copy_single_page(self.pdfium, &self.document, index).map_err(|e| {
            PageError::ExtractFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let bytes = single.save_to_bytes().map_err(|e| PageError::ExtractFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

        let page = ExtractedPage::from_bytes(index + 1, &bytes).map_err(|e| {
            PageError::ExtractFailed {
                page: index + 1,
                detail: format!("temp file: {e}"),
            }
        })?;

        debug!(
            "Extracted page {} → {} ({} bytes)",
            index + 1,
            page.path().display(),
            bytes.len()
        );
        Ok(page)
    }
}

/// Map a pdfium load error onto the fatal error taxonomy.
pub(crate) fn classify_open_error(path: &Path, had_password: bool, e: &PdfiumError) -> SplitError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            SplitError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            SplitError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        SplitError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}
