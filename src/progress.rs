//! Progress-callback trait for per-page split events.
//!
//! Inject an [`Arc<dyn SplitProgressCallback>`] via
//! [`crate::config::SplitConfigBuilder::progress_callback`] to receive events
//! as the driver walks the document. The library itself never prints; the
//! binary turns these events into console lines or a progress bar.
//!
//! # Example
//!
//! ```rust
//! use pdfsplit2md::{SplitConfig, SplitProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl SplitProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} written ({} bytes)", page_num, total_pages, markdown_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = SplitConfig::builder()
//!     .progress_callback(counter as Arc<dyn SplitProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the driver as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in page order from a single thread.
pub trait SplitProgressCallback: Send + Sync {
    /// Called once after the document is opened, before any page.
    ///
    /// # Arguments
    /// * `total_pages`: number of pages in the source document
    fn on_split_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is extracted.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page's Markdown file has been written.
    ///
    /// # Arguments
    /// * `page_num`    : 1-indexed page number
    /// * `total_pages` : total pages
    /// * `markdown_len`: byte length of the written Markdown
    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        let _ = (page_num, total_pages, markdown_len);
    }

    /// Called when a page produced no file.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: total pages
    /// * `error`      : human-readable error description
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    ///
    /// # Arguments
    /// * `output_dir`   : directory the Markdown files were written to
    /// * `total_pages`  : total pages in the document
    /// * `success_count`: pages that produced a file
    fn on_split_complete(&self, output_dir: &Path, total_pages: usize, success_count: usize) {
        let _ = (output_dir, total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SplitProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SplitConfig`].
pub type ProgressCallback = Arc<dyn SplitProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps a log of event names.
    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl SplitProgressCallback for EventLog {
        fn on_split_start(&self, total_pages: usize) {
            self.0.lock().unwrap().push(format!("start:{total_pages}"));
        }

        fn on_page_error(&self, page_num: usize, _total_pages: usize, error: &str) {
            self.0.lock().unwrap().push(format!("error:{page_num}:{error}"));
        }

        fn on_split_complete(&self, output_dir: &Path, _total_pages: usize, success_count: usize) {
            self.0
                .lock()
                .unwrap()
                .push(format!("done:{}:{success_count}", output_dir.display()));
        }
    }

    #[test]
    fn unimplemented_events_fall_through_to_defaults() {
        let log = EventLog::default();
        let cb: &dyn SplitProgressCallback = &log;

        cb.on_split_start(2);
        cb.on_page_start(1, 2);
        cb.on_page_complete(1, 2, 10);
        cb.on_page_start(2, 2);
        cb.on_page_error(2, 2, "no text layer");
        cb.on_split_complete(Path::new("out"), 2, 1);

        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["start:2", "error:2:no text layer", "done:out:1"]
        );
    }

    #[test]
    fn noop_is_usable_as_shared_callback() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_split_start(0);
        cb.on_split_complete(Path::new("out"), 0, 0);
    }
}
