//! Result types describing what a run produced.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of a completed split-and-convert run.
///
/// A run that returns `Ok(SplitReport)` may still have failed pages; check
/// [`SplitReport::failures`]. Pages are listed in ascending order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitReport {
    /// Directory the Markdown files were written to.
    pub output_dir: PathBuf,
    /// Page count of the source document.
    pub total_pages: usize,
    /// Pages that produced a file.
    pub written: Vec<WrittenPage>,
    /// Pages that produced no file, with the reason.
    pub failures: Vec<PageError>,
    /// Wall-clock time of the driver loop.
    pub duration_ms: u64,
}

impl SplitReport {
    pub fn success_count(&self) -> usize {
        self.written.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// True when every page of the document produced a file.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.written.len() == self.total_pages
    }
}

/// One Markdown file written by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenPage {
    /// 1-based page number.
    pub page_num: usize,
    /// Full path of the written file.
    pub path: PathBuf,
    /// Byte length of the Markdown.
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_report_is_complete() {
        let report = SplitReport::default();
        assert_eq!(report.success_count(), 0);
        assert!(report.is_complete());
    }

    #[test]
    fn report_with_gap_is_not_complete() {
        let report = SplitReport {
            output_dir: PathBuf::from("out"),
            total_pages: 2,
            written: vec![WrittenPage {
                page_num: 1,
                path: PathBuf::from("out/page_001.md"),
                bytes: 12,
            }],
            failures: vec![PageError::ConversionFailed {
                page: 2,
                detail: "boom".into(),
            }],
            duration_ms: 5,
        };
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_complete());

        let json = serde_json::to_string(&report).expect("serialise");
        assert!(json.contains("page_001.md"));
    }
}
