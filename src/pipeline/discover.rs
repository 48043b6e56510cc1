//! Input discovery: list the PDFs of the input directory in processing order.
//!
//! The scan is non-recursive. Entries are sorted by file name before
//! filtering so the processing order (and therefore every log line and
//! output file) is stable across runs and platforms.

use crate::error::Pdf2XlsxError;
use std::path::{Path, PathBuf};

/// `true` if `name` ends in `.pdf`, ignoring ASCII case.
pub fn is_pdf_name(name: &str) -> bool {
    name.len() >= 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".pdf")
}

/// List regular files in `dir` whose name ends in `.pdf` (any case), sorted
/// by file name.
pub async fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, Pdf2XlsxError> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Err(Pdf2XlsxError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let unreadable = |source| Pdf2XlsxError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    let mut names: Vec<(String, PathBuf)> = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let file_type = entry.file_type().await.map_err(unreadable)?;
        let path = entry.path();
        // Follow symlinks so a linked PDF is treated like a regular one.
        let is_file = file_type.is_file()
            || (file_type.is_symlink() && tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()));
        if !is_file {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        names.push((name, path));
    }

    names.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(names
        .into_iter()
        .filter(|(name, _)| is_pdf_name(name))
        .map(|(_, path)| path)
        .collect())
}
