//! Error types for the pdfsplit2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SplitError`]: **Fatal**: the run cannot proceed at all (missing
//!   input, unwritable output directory, corrupt PDF, no pdfium library).
//!   Returned as `Err(SplitError)` from [`crate::split::split_document`] and
//!   [`crate::split::split_and_convert`].
//!
//! * [`PageError`]: **Non-fatal**: a single page could not be extracted or
//!   converted. Recorded in [`crate::output::SplitReport::failures`]; the
//!   driver moves on to the next page and that page simply gets no file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfsplit2md library.
#[derive(Debug, Error)]
pub enum SplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file does not exist: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The path exists but is a directory, socket, etc.
    #[error("Input path is not a regular file: '{path}'")]
    NotAFile { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Output directory errors ───────────────────────────────────────────
    /// Something other than a directory already occupies the output path.
    #[error("Output path exists and is not a directory: '{path}'")]
    OutputDirNotDirectory { path: PathBuf },

    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A requested page number exceeds the document's page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The vision converter's LLM provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a page's Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory).\n\
  • Place libpdfium next to the pdfsplit2md executable.\n\
  • Install pdfium into a system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Page numbers are 1-based, matching the numbering of the output files.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PageError {
    /// The driver asked for a page the document does not have.
    #[error("Page {page}: out of range (document has {total} pages)")]
    OutOfRange { page: usize, total: usize },

    /// Copying the page into a standalone document failed.
    #[error("Page {page}: extraction failed: {detail}")]
    ExtractFailed { page: usize, detail: String },

    /// The converter could not produce Markdown for the page.
    #[error("Page {page}: conversion failed: {detail}")]
    ConversionFailed { page: usize, detail: String },

    /// Page rasterisation failed (vision converter).
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// LLM call failed after retries (vision converter).
    #[error("Page {page}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        page: usize,
        retries: u8,
        detail: String,
    },

    /// LLM call timed out (vision converter).
    #[error("Page {page}: LLM call timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },

    /// Writing the Markdown file failed and the policy is to skip.
    #[error("Page {page}: failed to write '{path}': {detail}")]
    WriteFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },
}

impl PageError {
    /// The 1-based page number this error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::OutOfRange { page, .. }
            | PageError::ExtractFailed { page, .. }
            | PageError::ConversionFailed { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::LlmFailed { page, .. }
            | PageError::Timeout { page, .. }
            | PageError::WriteFailed { page, .. } => *page,
        }
    }

    /// The message without its `Page N: ` prefix.
    pub fn reason(&self) -> String {
        let full = self.to_string();
        let prefix = format!("Page {}: ", self.page());
        match full.strip_prefix(&prefix) {
            Some(rest) => rest.to_string(),
            None => full.clone(),
        }
    }
}
