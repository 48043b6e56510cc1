//! Spreadsheet output: output naming and `.xlsx` writing.
//!
//! One workbook per input PDF, one worksheet, a bold header row with
//! exactly the three [`COLUMNS`], then one line per [`Row`]. A file with no
//! rows still gets the header.
//!
//! Writes are atomic: the workbook is written to `<name>.xlsx.tmp` and then
//! renamed over the target, so an interrupted run never leaves a truncated
//! spreadsheet behind. An existing file of the same name is replaced.

use crate::error::Pdf2XlsxError;
use crate::output::{Row, COLUMNS};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output file extension.
pub const EXTENSION: &str = "xlsx";

/// Derive the output base name from an input PDF file name.
///
/// Strips a trailing `.pdf` (any case), then replaces `+` with `_`, removes
/// `,`, and replaces spaces with `_`.
///
/// ```
/// use pdf2xlsx::pipeline::sheet::sanitize_stem;
/// assert_eq!(sanitize_stem("Club+Report, Final.pdf"), "Club_Report_Final");
/// ```
pub fn sanitize_stem(file_name: &str) -> String {
    let stem = if super::discover::is_pdf_name(file_name) {
        &file_name[..file_name.len() - 4]
    } else {
        file_name
    };
    stem.replace('+', "_").replace(',', "").replace(' ', "_")
}

/// Path of the spreadsheet written for `pdf_path` inside `output_dir`.
pub fn output_path_for(pdf_path: &Path, output_dir: &Path) -> PathBuf {
    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}.{}", sanitize_stem(&file_name), EXTENSION))
}

/// Build the workbook for `rows` and return the encoded `.xlsx` bytes.
pub fn workbook_bytes(rows: &[Row]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let line = (i + 1) as u32;
        for (col, value) in row.fields().into_iter().enumerate() {
            worksheet.write_string(line, col as u16, value)?;
        }
    }

    worksheet.autofit();
    workbook.save_to_buffer()
}

/// Write `rows` to `path` atomically, replacing any existing file.
pub async fn write_workbook(path: &Path, rows: &[Row]) -> Result<(), Pdf2XlsxError> {
    let write_failed = |detail: String| Pdf2XlsxError::WorkbookWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let bytes = workbook_bytes(rows).map_err(|e| write_failed(e.to_string()))?;

    let tmp_path = path.with_extension(format!("{EXTENSION}.tmp"));
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| write_failed(e.to_string()))?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| write_failed(e.to_string()))?;

    debug!("Wrote {} rows ({} bytes) to {}", rows.len(), bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    fn read_back(bytes: Vec<u8>) -> Vec<Vec<String>> {
        let mut wb: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = wb.worksheet_range_at(0).unwrap().unwrap();
        range
            .rows()
            .map(|r| {
                r.iter()
                    .map(|c| match c {
                        Data::Empty => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn sanitize_examples() {
        assert_eq!(sanitize_stem("Club+Report, Final.pdf"), "Club_Report_Final");
        assert_eq!(sanitize_stem("UPPER.PDF"), "UPPER");
        assert_eq!(sanitize_stem("Mixed.Pdf"), "Mixed");
        assert_eq!(sanitize_stem("a b+c,d.pdf"), "a_b_cd");
        assert_eq!(sanitize_stem("no-extension"), "no-extension");
    }

    #[test]
    fn only_the_suffix_is_stripped() {
        assert_eq!(sanitize_stem("report.pdf.backup.pdf"), "report.pdf.backup");
    }

    #[test]
    fn output_path_uses_sanitized_name() {
        let p = output_path_for(Path::new("PDFs/Club+Report, Final.pdf"), Path::new("out"));
        assert_eq!(p, PathBuf::from("out/Club_Report_Final.xlsx"));
    }

    #[test]
    fn header_only_for_no_rows() {
        let cells = read_back(workbook_bytes(&[]).unwrap());
        assert_eq!(cells, vec![vec!["Name", "business ID", "personnel"]]);
    }

    #[test]
    fn rows_follow_header_in_order() {
        let rows = vec![
            Row::new("Acme Sports", "123-456", "NA"),
            Row::from_fields(["Short Club"]),
            Row::new("Beta Club", "NA", "42"),
        ];
        let cells = read_back(workbook_bytes(&rows).unwrap());
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], vec!["Name", "business ID", "personnel"]);
        assert_eq!(cells[1], vec!["Acme Sports", "123-456", "NA"]);
        assert_eq!(cells[2], vec!["Short Club", "", ""]);
        assert_eq!(cells[3], vec!["Beta Club", "NA", "42"]);
    }

    #[tokio::test]
    async fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("club.xlsx");
        std::fs::write(&path, b"stale").unwrap();

        write_workbook(&path, &[Row::new("A", "NA", "1")]).await.unwrap();

        let cells = read_back(std::fs::read(&path).unwrap());
        assert_eq!(cells[1], vec!["A", "NA", "1"]);
        assert!(!dir.path().join("club.xlsx.tmp").exists());
    }
}
