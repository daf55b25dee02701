//! Page extraction: copy one page into a standalone single-page document.
//!
//! Converters receive the page as a standalone PDF on disk. The bytes live in
//! a [`NamedTempFile`] owned by [`ExtractedPage`]; the file is removed when
//! the page goes out of scope, including on error and panic paths.

use crate::error::SplitError;
use crate::pipeline::document::classify_open_error;
use crate::pipeline::input;
use pdfium_render::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, trace};

/// A transient single-page PDF backed by a temporary file.
#[derive(Debug)]
pub struct ExtractedPage {
    page_num: usize,
    file: NamedTempFile,
}

impl ExtractedPage {
    /// Write `bytes` to a fresh temp file and wrap it.
    ///
    /// `page_num` is the 1-based number of the page in the source document.
    pub fn from_bytes(page_num: usize, bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("pdfsplit2md-page-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { page_num, file })
    }

    /// 1-based page number in the source document.
    pub fn page_num(&self) -> usize {
        self.page_num
    }

    /// Location of the single-page PDF.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for ExtractedPage {
    fn drop(&mut self) {
        trace!(
            "Discarding page {} temp file {}",
            self.page_num,
            self.file.path().display()
        );
    }
}

/// Build a new document holding only page `index` of `source`.
///
/// `source` is not modified.
pub(crate) fn copy_single_page<'a>(
    pdfium: &'a Pdfium,
    source: &PdfDocument,
    index: usize,
) -> Result<PdfDocument<'a>, PdfiumError> {
    let page_index = PdfPageIndex::try_from(index).map_err(|_| PdfiumError::PageIndexOutOfBounds)?;
    let mut single = pdfium.create_new_pdf()?;
    single
        .pages_mut()
        .copy_page_from_document(source, page_index, 0)?;
    Ok(single)
}

/// Write page `index` (0-based) of `input` to `output` as a standalone PDF.
///
/// Opens its own handle on `input`, independent of any running split.
pub fn extract_page_to_file(
    pdfium: &Pdfium,
    input_path: impl AsRef<Path>,
    index: usize,
    output_path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<PathBuf, SplitError> {
    let input_path = input::validate_input(input_path)?;
    let output_path = output_path.as_ref().to_path_buf();

    let source = pdfium
        .load_pdf_from_file(&input_path, password)
        .map_err(|e| classify_open_error(&input_path, password.is_some(), &e))?;

    let total = source.pages().len() as usize;
    if index >= total {
        return Err(SplitError::PageOutOfRange {
            page: index + 1,
            total,
        });
    }

    let single = copy_single_page(pdfium, &source, index).map_err(|e| SplitError::CorruptPdf {
        path: input_path.clone(),
        detail: format!("page {} could not be copied: {:?}", index + 1, e),
    })?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SplitError::OutputWriteFailed {
            path: output_path.clone(),
            source,
        })?;
    }

    single
        .save_to_file(&output_path)
        .map_err(|e| SplitError::OutputWriteFailed {
            path: output_path.clone(),
            source: std::io::Error::other(format!("{:?}", e)),
        })?;

    info!(
        "Wrote page {} of {} to {}",
        index + 1,
        input_path.display(),
        output_path.display()
    );
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_is_removed_on_drop() {
        let page = ExtractedPage::from_bytes(4, b"%PDF-1.7 fake").unwrap();
        let path = page.path().to_path_buf();
        assert_eq!(page.page_num(), 4);
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 fake");

        drop(page);
        assert!(!path.exists(), "temp file should be deleted on drop");
    }

    #[test]
    fn temp_file_is_removed_when_scope_unwinds() {
        let mut seen = None;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let page = ExtractedPage::from_bytes(1, b"%PDF").unwrap();
            seen = Some(page.path().to_path_buf());
            panic!("converter blew up");
        }));
        assert!(result.is_err());
        let path = seen.expect("path recorded before panic");
        assert!(!path.exists());
    }
}
