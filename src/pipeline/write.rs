//! Output: persist one page's Markdown under a deterministic name.

use crate::error::SplitError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name for a 1-based page number: `page_001.md`, `page_042.md`, …
///
/// Numbers are zero-padded to three digits; pages past 999 simply get wider
/// names (`page_1000.md`).
pub fn page_file_name(page_num: usize) -> String {
    format!("page_{page_num:03}.md")
}

/// Write `markdown` as UTF-8 to `output_dir/page_{NNN}.md`.
///
/// Any existing file at that path is truncated and replaced.
pub fn write_page(output_dir: &Path, page_num: usize, markdown: &str) -> Result<PathBuf, SplitError> {
    let path = output_dir.join(page_file_name(page_num));
    std::fs::write(&path, markdown.as_bytes()).map_err(|source| SplitError::OutputWriteFailed {
        path: path.clone(),
        source,
    })?;
    debug!("Wrote {} ({} bytes)", path.display(), markdown.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(page_file_name(1), "page_001.md");
        assert_eq!(page_file_name(42), "page_042.md");
        assert_eq!(page_file_name(999), "page_999.md");
        assert_eq!(page_file_name(1000), "page_1000.md");
    }

    #[test]
    fn write_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let first = write_page(dir.path(), 3, "old content that is longer").unwrap();
        let second = write_page(dir.path(), 3, "# new ünïcode").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "# new ünïcode");
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = write_page(&dir.path().join("gone"), 1, "x").unwrap_err();
        assert!(matches!(err, SplitError::OutputWriteFailed { .. }), "got: {err:?}");
    }
}
