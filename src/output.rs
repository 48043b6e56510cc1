//! Result types: rows, per-file reports, and the batch summary.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Spreadsheet column headers, in output order.
pub const COLUMNS: [&str; 3] = ["Name", "business ID", "personnel"];

/// One spreadsheet line: name, business ID, personnel count.
///
/// A reply line with fewer than three fields yields a short row: the missing
/// trailing fields are `None` and their cells are left empty. Nothing is
/// padded with placeholder text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub name: String,
    pub business_id: Option<String>,
    pub personnel: Option<String>,
}

impl Row {
    /// Build a full three-field row.
    pub fn new(
        name: impl Into<String>,
        business_id: impl Into<String>,
        personnel: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            business_id: Some(business_id.into()),
            personnel: Some(personnel.into()),
        }
    }

    /// Build a row from up to three fields. Fields past the third are ignored.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut it = fields.into_iter().map(Into::into);
        Self {
            name: it.next().unwrap_or_default(),
            business_id: it.next(),
            personnel: it.next(),
        }
    }

    /// The fields that are present, in column order.
    pub fn fields(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.business_id.as_deref())
            .chain(self.personnel.as_deref())
            .collect()
    }
}

/// Outcome of converting one PDF into one spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Input PDF.
    pub source: PathBuf,
    /// Spreadsheet written for it.
    pub output: PathBuf,
    pub page_count: usize,
    /// Accumulated rows, in page order then reply-line order.
    pub rows: Vec<Row>,
    /// Reply lines whose field count was not exactly three.
    pub irregular_lines: usize,
    /// Pages whose completion call failed; they contributed no rows.
    pub failed_pages: Vec<PageError>,
}

impl FileReport {
    pub fn has_failures(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

/// One PDF a run would process, as listed by
/// [`crate::convert::inspect_directory`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectEntry {
    pub source: PathBuf,
    pub page_count: usize,
    /// Spreadsheet the run would write for it.
    pub output: PathBuf,
}

/// Summary of a whole batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// One entry per processed PDF, in processing (sorted file name) order.
    pub files: Vec<FileReport>,
    pub total_rows: usize,
    pub total_failed_pages: usize,
    pub duration_ms: u64,
}

impl BatchReport {
    pub(crate) fn push(&mut self, report: FileReport) {
        self.total_rows += report.rows.len();
        self.total_failed_pages += report.failed_pages.len();
        self.files.push(report);
    }
}
