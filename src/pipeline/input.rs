//! Input validation: check the source PDF and prepare the output directory.
//!
//! The input is always checked before the output directory is created, so a
//! bad input path never leaves an empty directory behind. Files that do not
//! start with `%PDF` are rejected here, before pdfium sees them.

use crate::error::SplitError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` is an existing, readable, regular PDF file.
pub fn validate_input(path: impl AsRef<Path>) -> Result<PathBuf, SplitError> {
    let path = path.as_ref().to_path_buf();

    let meta = match std::fs::metadata(&path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SplitError::PermissionDenied { path });
        }
        Err(_) => return Err(SplitError::FileNotFound { path }),
    };

    if !meta.is_file() {
        return Err(SplitError::NotAFile { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(SplitError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SplitError::PermissionDenied { path });
        }
        Err(_) => return Err(SplitError::FileNotFound { path }),
    }

    debug!("Validated input PDF: {}", path.display());
    Ok(path)
}

/// Create the output directory if needed.
///
/// An existing directory is reused as-is; files already in it are
/// overwritten page by page but never deleted.
pub fn prepare_output_dir(path: impl AsRef<Path>) -> Result<PathBuf, SplitError> {
    let path = path.as_ref().to_path_buf();

    if path.exists() {
        if !path.is_dir() {
            return Err(SplitError::OutputDirNotDirectory { path });
        }
        debug!("Reusing output directory: {}", path.display());
        return Ok(path);
    }

    std::fs::create_dir_all(&path).map_err(|source| SplitError::OutputDirCreateFailed {
        path: path.clone(),
        source,
    })?;

    debug!("Created output directory: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_input_is_file_not_found() {
        let dir = TempDir::new().unwrap();
        let err = validate_input(dir.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, SplitError::FileNotFound { .. }), "got: {err:?}");
    }

    #[test]
    fn directory_input_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = validate_input(dir.path()).unwrap_err();
        assert!(matches!(err, SplitError::NotAFile { .. }), "got: {err:?}");
    }

    #[test]
    fn non_pdf_input_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello world").unwrap();
        match validate_input(&path).unwrap_err() {
            SplitError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%%EOF\n").unwrap();
        assert_eq!(validate_input(&path).unwrap(), path);
    }

    #[test]
    fn output_dir_is_created_with_parents() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("a/b/out");
        assert_eq!(prepare_output_dir(&out).unwrap(), out);
        assert!(out.is_dir());
        // Second call on an existing directory is fine.
        assert!(prepare_output_dir(&out).is_ok());
    }

    #[test]
    fn output_path_occupied_by_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, b"").unwrap();
        let err = prepare_output_dir(&out).unwrap_err();
        assert!(matches!(err, SplitError::OutputDirNotDirectory { .. }), "got: {err:?}");
    }
}
