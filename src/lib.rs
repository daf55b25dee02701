//! # pdfsplit2md
//!
//! Split a multi-page PDF into single-page documents and convert each one
//! to Markdown, writing `page_001.md`, `page_002.md`, … into an output
//! directory.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate the file, create the output directory
//!  ├─ 2. Open     bind pdfium and open the document (optional password)
//!  ├─ 3. Extract  copy page i into a temporary single-page PDF
//!  ├─ 4. Convert  text layer (default) or vision LLM → Markdown
//!  └─ 5. Write    output_dir/page_{i:03}.md, temp file removed
//! ```
//!
//! Pages are handled strictly one at a time. A page that fails to extract,
//! convert or (optionally) write is logged and skipped; the run continues.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfsplit2md::{split_and_convert, ConverterKind, SplitConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = split_and_convert(
//!         "document.pdf",
//!         "out",
//!         ConverterKind::TextLayer,
//!         &SplitConfig::default(),
//!     )?;
//!     for failure in &report.failures {
//!         eprintln!("{failure}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfsplit2md` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfsplit2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod converter;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod split;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConverterKind, SplitConfig, SplitConfigBuilder, VisionOptions, WriteFailurePolicy,
};
pub use converter::{build_converter, MarkupConverter, TextLayerConverter, VisionConverter};
pub use error::{PageError, SplitError};
pub use output::{SplitReport, WrittenPage};
pub use pipeline::document::{PageSource, SourceDocument};
pub use pipeline::engine::bind_pdfium;
pub use pipeline::extract::{extract_page_to_file, ExtractedPage};
pub use pipeline::write::page_file_name;
pub use progress::{NoopProgressCallback, ProgressCallback, SplitProgressCallback};
pub use split::{split_and_convert, split_document};
