//! Pdfium binding: locate the pdfium shared library and load it.
//!
//! Search order (first library that binds wins):
//!
//! 1. `PDFIUM_LIB_PATH`: a library file, or a directory containing one
//! 2. the current working directory
//! 3. the directory of the running executable
//! 4. the system library search path

use crate::error::SplitError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an existing pdfium library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library, trying each candidate location in turn.
pub fn bind_pdfium() -> Result<Pdfium, SplitError> {
    let env_value = std::env::var(PDFIUM_LIB_PATH_ENV).ok();
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));

    let mut failures = Vec::new();

    for candidate in candidate_paths(env_value.as_deref(), exe_dir.as_deref()) {
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => failures.push(format!("{}: {:?}", candidate.display(), e)),
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            debug!("Bound pdfium from the system library path");
            Ok(Pdfium::new(bindings))
        }
        Err(e) => {
            failures.push(format!("system library: {:?}", e));
            Err(SplitError::PdfiumBindingFailed(failures.join("; ")))
        }
    }
}

/// Candidate library paths, in search order, excluding the system path.
fn candidate_paths(env_value: Option<&str>, exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        let p = PathBuf::from(value);
        if p.is_dir() {
            candidates.push(library_in(&p));
        } else {
            candidates.push(p);
        }
    }

    candidates.push(library_in(Path::new("./")));

    if let Some(dir) = exe_dir {
        let lib = library_in(dir);
        if !candidates.contains(&lib) {
            candidates.push(lib);
        }
    }

    candidates
}

fn library_in(dir: &Path) -> PathBuf {
    PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_comes_first() {
        let c = candidate_paths(Some("/opt/pdfium/libpdfium.so"), None);
        assert_eq!(c[0], PathBuf::from("/opt/pdfium/libpdfium.so"));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn env_directory_is_expanded_to_library_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = candidate_paths(dir.path().to_str(), None);
        assert!(c[0].starts_with(dir.path()));
        assert!(c[0].to_string_lossy().contains("pdfium"));
    }

    #[test]
    fn blank_env_is_ignored() {
        let c = candidate_paths(Some("  "), Some(Path::new("/usr/local/bin")));
        assert_eq!(c.len(), 2);
        assert!(c[1].starts_with("/usr/local/bin"));
    }
}
