//! The split-and-convert driver.
//!
//! Pages are processed one at a time, in ascending order. Each iteration
//! owns exactly one transient single-page document, and that document is
//! dropped (its temp file deleted) before the next page starts. A failing
//! page is reported through the progress callback and skipped; only fatal
//! errors stop the run.

use crate::config::{ConverterKind, SplitConfig, WriteFailurePolicy};
use crate::converter::{build_converter, MarkupConverter};
use crate::error::{PageError, SplitError};
use crate::output::{SplitReport, WrittenPage};
use crate::pipeline::document::{PageSource, SourceDocument};
use crate::pipeline::{engine, input, write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Split `input` and convert every page into `output_dir/page_NNN.md`.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(SplitError)` only for fatal errors:
/// - input missing, not a regular file, or not a PDF
/// - output directory cannot be created
/// - pdfium cannot be bound or the document cannot be opened
/// - the vision converter has no provider
/// - a write failed and the policy is [`WriteFailurePolicy::Abort`]
///
/// Per-page failures are reported in [`SplitReport::failures`].
///
/// # Example
/// ```rust,no_run
/// use pdfsplit2md::{split_and_convert, ConverterKind, SplitConfig};
///
/// let report = split_and_convert("report.pdf", "out", ConverterKind::TextLayer, &SplitConfig::default())?;
/// println!("{} of {} pages written", report.success_count(), report.total_pages);
/// # Ok::<(), pdfsplit2md::SplitError>(())
/// ```
pub fn split_and_convert(
    input_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    kind: ConverterKind,
    config: &SplitConfig,
) -> Result<SplitReport, SplitError> {
    let input_path = input::validate_input(input_path)?;

    let pdfium = engine::bind_pdfium()?;
    let converter = build_converter(kind, &pdfium, config)?;

    let output_dir = input::prepare_output_dir(output_dir)?;
    let source = SourceDocument::open(&pdfium, &input_path, config.password.as_deref())?;

    split_document(&source, &converter, &output_dir, config)
}

/// Drive `converter` over every page of `source`.
///
/// `output_dir` must already exist.
pub fn split_document<S, C>(
    source: &S,
    converter: &C,
    output_dir: &Path,
    config: &SplitConfig,
) -> Result<SplitReport, SplitError>
where
    S: PageSource + ?Sized,
    C: MarkupConverter + ?Sized,
{
    let start = Instant::now();
    let total_pages = source.page_count();
    let callback = config.progress_callback.as_deref();

    info!(
        "Processing PDF with {} pages ({} converter)",
        total_pages,
        converter.name()
    );
    if let Some(cb) = callback {
        cb.on_split_start(total_pages);
    }

    let mut report = SplitReport {
        output_dir: output_dir.to_path_buf(),
        total_pages,
        ..Default::default()
    };

    for index in 0..total_pages {
        let page_num = index + 1;
        debug!("Processing page {}/{}", page_num, total_pages);
        if let Some(cb) = callback {
            cb.on_page_start(page_num, total_pages);
        }

        match process_page(source, converter, output_dir, index, config.on_write_error)? {
            Ok(written) => {
                if let Some(cb) = callback {
                    cb.on_page_complete(page_num, total_pages, written.bytes);
                }
                report.written.push(written);
            }
            Err(page_error) => {
                debug!("Skipping page {}: {}", page_num, page_error);
                if let Some(cb) = callback {
                    cb.on_page_error(page_num, total_pages, &page_error.reason());
                }
                report.failures.push(page_error);
            }
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "All pages processed: {}/{} written to {} in {}ms",
        report.success_count(),
        total_pages,
        output_dir.display(),
        report.duration_ms
    );
    if let Some(cb) = callback {
        cb.on_split_complete(output_dir, total_pages, report.success_count());
    }

    Ok(report)
}

/// Extract, convert and write one page.
///
/// The outer `Result` carries fatal errors, the inner one per-page failures.
fn process_page<S, C>(
    source: &S,
    converter: &C,
    output_dir: &Path,
    index: usize,
    on_write_error: WriteFailurePolicy,
) -> Result<Result<WrittenPage, PageError>, SplitError>
where
    S: PageSource + ?Sized,
    C: MarkupConverter + ?Sized,
{
    let page_num = index + 1;

    let markdown = {
        let page = match source.extract_page(index) {
            Ok(page) => page,
            Err(e) => return Ok(Err(e)),
        };
        match converter.to_markup(&page) {
            Ok(markdown) => markdown,
            Err(e) => return Ok(Err(e)),
        }
        // `page` dropped here: temp file removed before writing.
    };

    match write::write_page(output_dir, page_num, &markdown) {
        Ok(path) => Ok(Ok(WrittenPage {
            page_num,
            path,
            bytes: markdown.len(),
        })),
        Err(SplitError::OutputWriteFailed { path, source: io_err })
            if on_write_error == WriteFailurePolicy::Skip =>
        {
            Ok(Err(PageError::WriteFailed {
                page: page_num,
                path,
                detail: io_err.to_string(),
            }))
        }
        Err(e) => Err(e),
    }
}
