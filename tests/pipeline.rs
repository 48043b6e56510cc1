//! Orchestrator tests with a stub text source and a scripted completion
//! service. No pdfium library and no network access needed.
//!
//! Run with:
//!   cargo test --test pipeline

use calamine::{open_workbook, Data, Reader, Xlsx};
use pdf2xlsx::{
    convert_directory_with, inspect_directory_with, CompletionError, CompletionService,
    ExtractionConfig, PageError, PageTextSource, Pdf2XlsxError, Row,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Pages per file name; records every `page_text` call.
#[derive(Default)]
struct StubSource {
    docs: HashMap<String, Vec<String>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StubSource {
    fn with(mut self, file: &str, pages: &[&str]) -> Self {
        self.docs
            .insert(file.to_string(), pages.iter().map(|p| p.to_string()).collect());
        self
    }

    fn pages_of(&self, path: &Path) -> Result<&Vec<String>, Pdf2XlsxError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.docs.get(&name).ok_or_else(|| Pdf2XlsxError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "stub has no such document".into(),
        })
    }

    fn calls_for(&self, file: &str) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(f, _)| f == file)
            .map(|(_, i)| *i)
            .collect()
    }
}

impl PageTextSource for StubSource {
    fn page_count(&self, path: &Path) -> Result<usize, Pdf2XlsxError> {
        Ok(self.pages_of(path)?.len())
    }

    fn page_text(&self, path: &Path, index: usize) -> Result<String, Pdf2XlsxError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.calls.lock().unwrap().push((name, index));
        let pages = self.pages_of(path)?;
        pages
            .get(index)
            .cloned()
            .ok_or(Pdf2XlsxError::PageOutOfRange {
                path: path.to_path_buf(),
                index,
                total: pages.len(),
            })
    }
}

/// Replies keyed by the exact page text found in the task prompt.
/// Unknown page text gets an empty reply.
#[derive(Default)]
struct ScriptedCompletion {
    replies: HashMap<String, Result<String, String>>,
    /// Per-page artificial latency, to shuffle completion order.
    delays_ms: HashMap<String, u64>,
}

impl ScriptedCompletion {
    fn reply(mut self, page_text: &str, reply: &str) -> Self {
        self.replies
            .insert(page_text.to_string(), Ok(reply.to_string()));
        self
    }

    fn fail(mut self, page_text: &str, error: &str) -> Self {
        self.replies
            .insert(page_text.to_string(), Err(error.to_string()));
        self
    }

    fn delay(mut self, page_text: &str, ms: u64) -> Self {
        self.delays_ms.insert(page_text.to_string(), ms);
        self
    }
}

fn page_text_in(prompt: &str) -> &str {
    let start = prompt.find("Text:\n").expect("prompt has a Text: section") + "Text:\n".len();
    let end = prompt
        .find("\n\nPresent your findings")
        .expect("prompt has the format instructions");
    &prompt[start..end]
}

impl CompletionService for ScriptedCompletion {
    async fn complete(
        &self,
        _system: &str,
        user: &str,
        _max_tokens: usize,
    ) -> Result<String, CompletionError> {
        let text = page_text_in(user);
        if let Some(ms) = self.delays_ms.get(text) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        match self.replies.get(text) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(e)) => Err(CompletionError::new(e.clone())),
            None => Ok(String::new()),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Workspace {
    _root: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl Workspace {
    /// Input directory containing empty files with the given names; the
    /// output directory does not exist yet.
    fn new(files: &[&str]) -> Self {
        init_logs();
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("PDFs");
        let output = root.path().join("ExcelFiles");
        std::fs::create_dir(&input).unwrap();
        for f in files {
            std::fs::write(input.join(f), b"%PDF-1.4").unwrap();
        }
        Self {
            _root: root,
            input,
            output,
        }
    }

    fn config(&self) -> ExtractionConfig {
        ExtractionConfig::builder()
            .input_dir(&self.input)
            .output_dir(&self.output)
            .build()
            .unwrap()
    }

    fn sheet(&self, name: &str) -> Vec<Vec<String>> {
        read_sheet(&self.output.join(name))
    }
}

/// Route library logs to the test harness (`RUST_LOG=debug` to see them).
fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn read_sheet(path: &Path) -> Vec<Vec<String>> {
    let mut wb: Xlsx<_> = open_workbook(path).unwrap();
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

fn header() -> Vec<String> {
    vec!["Name".into(), "business ID".into(), "personnel".into()]
}

fn line(cells: [&str; 3]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn writes_one_sheet_per_pdf_with_rows_in_page_order() {
    let ws = Workspace::new(&["Club+Report, Final.pdf", "another.PDF", "notes.txt"]);
    let source = Arc::new(
        StubSource::default()
            .with("Club+Report, Final.pdf", &["page one", "page two"])
            .with("another.PDF", &["only page"]),
    );
    let service = ScriptedCompletion::default()
        .reply("page one", "Acme Sports, 123-456, NA\nBeta Club, NA, 42")
        .reply("page two", "Gamma Seura, 7654321-0, 150")
        .reply("only page", "Delta, NA, NA");

    let report = convert_directory_with(&source, &service, &ws.config())
        .await
        .unwrap();

    // Sorted by file name: "Club+…" (C) sorts before "another.PDF" (a).
    let outputs: Vec<_> = report
        .files
        .iter()
        .map(|f| f.output.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(outputs, vec!["Club_Report_Final.xlsx", "another.xlsx"]);
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.total_failed_pages, 0);

    assert_eq!(
        ws.sheet("Club_Report_Final.xlsx"),
        vec![
            header(),
            line(["Acme Sports", "123-456", "NA"]),
            line(["Beta Club", "NA", "42"]),
            line(["Gamma Seura", "7654321-0", "150"]),
        ]
    );
    assert_eq!(
        ws.sheet("another.xlsx"),
        vec![header(), line(["Delta", "NA", "NA"])]
    );
    assert!(!ws.output.join("notes.xlsx").exists());
}

#[tokio::test]
async fn extractor_called_once_per_page_in_increasing_order() {
    let ws = Workspace::new(&["five.pdf"]);
    let source = Arc::new(StubSource::default().with("five.pdf", &["p0", "p1", "p2", "p3", "p4"]));
    let service = ScriptedCompletion::default();

    let report = convert_directory_with(&source, &service, &ws.config())
        .await
        .unwrap();

    assert_eq!(source.calls_for("five.pdf"), vec![0, 1, 2, 3, 4]);
    assert_eq!(report.files[0].page_count, 5);
}

#[tokio::test]
async fn file_without_rows_gets_header_only_sheet() {
    let ws = Workspace::new(&["empty.pdf"]);
    let source = Arc::new(StubSource::default().with("empty.pdf", &["nothing useful", "blank"]));
    let service = ScriptedCompletion::default().reply("blank", "\n\n");

    let report = convert_directory_with(&source, &service, &ws.config())
        .await
        .unwrap();

    assert!(report.files[0].rows.is_empty());
    assert!(!report.files[0].has_failures());
    assert_eq!(ws.sheet("empty.xlsx"), vec![header()]);
}

#[tokio::test]
async fn failed_completion_skips_page_and_is_reported() {
    let ws = Workspace::new(&["mixed.pdf"]);
    let source = Arc::new(StubSource::default().with("mixed.pdf", &["good", "bad", "also good"]));
    let service = ScriptedCompletion::default()
        .reply("good", "First, NA, 1")
        .fail("bad", "529 overloaded_error")
        .reply("also good", "Third, NA, 3");

    let report = convert_directory_with(&source, &service, &ws.config())
        .await
        .unwrap();

    let file = &report.files[0];
    assert_eq!(
        file.failed_pages,
        vec![PageError::CompletionFailed {
            page: 2,
            detail: "529 overloaded_error".into(),
        }]
    );
    assert_eq!(
        file.rows,
        vec![Row::new("First", "NA", "1"), Row::new("Third", "NA", "3")]
    );
    // The error text never reaches the spreadsheet.
    let cells = ws.sheet("mixed.xlsx");
    assert_eq!(cells.len(), 3);
    assert!(cells.iter().flatten().all(|c| !c.contains("overloaded")));
}

#[tokio::test]
async fn malformed_lines_are_kept_and_counted() {
    let ws = Workspace::new(&["odd.pdf"]);
    let source = Arc::new(StubSource::default().with("odd.pdf", &["p"]));
    let service = ScriptedCompletion::default()
        .reply("p", "Short Club\nWide, 1, 2, 3, 4\nFine, NA, 9");

    let report = convert_directory_with(&source, &service, &ws.config())
        .await
        .unwrap();

    assert_eq!(report.files[0].irregular_lines, 2);
    assert_eq!(
        ws.sheet("odd.xlsx"),
        vec![
            header(),
            line(["Short Club", "", ""]),
            line(["Wide", "1", "2"]),
            line(["Fine", "NA", "9"]),
        ]
    );
}

#[tokio::test]
async fn rerun_produces_identical_tables() {
    let ws = Workspace::new(&["a.pdf", "b.pdf"]);
    let source = Arc::new(
        StubSource::default()
            .with("a.pdf", &["a1", "a2"])
            .with("b.pdf", &["b1"]),
    );
    let service = ScriptedCompletion::default()
        .reply("a1", "Alpha, 1111111-1, 10")
        .reply("a2", "Alpha Two, NA, 20")
        .reply("b1", "Bravo, NA, NA");
    let config = ws.config();

    let first = convert_directory_with(&source, &service, &config).await.unwrap();
    let first_tables = (ws.sheet("a.xlsx"), ws.sheet("b.xlsx"));

    let second = convert_directory_with(&source, &service, &config).await.unwrap();
    let second_tables = (ws.sheet("a.xlsx"), ws.sheet("b.xlsx"));

    assert_eq!(first_tables, second_tables);
    for (x, y) in first.files.iter().zip(&second.files) {
        assert_eq!(x.rows, y.rows);
    }
}

#[tokio::test]
async fn concurrency_keeps_row_order() {
    let ws = Workspace::new(&["big.pdf"]);
    let pages = ["p0", "p1", "p2", "p3", "p4", "p5"];
    let source = Arc::new(StubSource::default().with("big.pdf", &pages));
    let mut service = ScriptedCompletion::default();
    for (i, p) in pages.iter().enumerate() {
        // Later pages answer first.
        service = service
            .reply(p, &format!("Club {i}, NA, {i}"))
            .delay(p, (pages.len() - i) as u64 * 15);
    }
    let config = ExtractionConfig::builder()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .concurrency(4)
        .build()
        .unwrap();

    let report = convert_directory_with(&source, &service, &config).await.unwrap();

    let names: Vec<_> = report.files[0].rows.iter().map(|r| r.name.clone()).collect();
    assert_eq!(
        names,
        vec!["Club 0", "Club 1", "Club 2", "Club 3", "Club 4", "Club 5"]
    );
}

#[tokio::test]
async fn extraction_error_aborts_remaining_files() {
    let ws = Workspace::new(&["1-ok.pdf", "2-broken.pdf", "3-never.pdf"]);
    // "2-broken.pdf" is unknown to the stub, so opening it fails.
    let source = Arc::new(
        StubSource::default()
            .with("1-ok.pdf", &["ok"])
            .with("3-never.pdf", &["never"]),
    );
    let service = ScriptedCompletion::default().reply("ok", "Ok Club, NA, 1");

    let err = convert_directory_with(&source, &service, &ws.config())
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2XlsxError::CorruptPdf { .. }), "got: {err}");
    assert!(ws.output.join("1-ok.xlsx").exists());
    assert!(!ws.output.join("3-never.xlsx").exists());
    assert!(source.calls_for("3-never.pdf").is_empty());
}

#[tokio::test]
async fn existing_output_is_overwritten() {
    let ws = Workspace::new(&["club.pdf"]);
    std::fs::create_dir_all(&ws.output).unwrap();
    std::fs::write(ws.output.join("club.xlsx"), b"not a workbook").unwrap();
    let source = Arc::new(StubSource::default().with("club.pdf", &["p"]));
    let service = ScriptedCompletion::default().reply("p", "Fresh, NA, 5");

    convert_directory_with(&source, &service, &ws.config())
        .await
        .unwrap();

    assert_eq!(ws.sheet("club.xlsx"), vec![header(), line(["Fresh", "NA", "5"])]);
}

#[tokio::test]
async fn missing_input_directory_is_fatal() {
    let ws = Workspace::new(&[]);
    let config = ExtractionConfig::builder()
        .input_dir(ws.input.join("missing"))
        .output_dir(&ws.output)
        .build()
        .unwrap();
    let source = Arc::new(StubSource::default());

    let err = convert_directory_with(&source, &ScriptedCompletion::default(), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2XlsxError::InputDirNotFound { .. }));
}

#[tokio::test]
async fn inspect_lists_without_writing() {
    let ws = Workspace::new(&["b report.pdf", "a.pdf"]);
    let source = Arc::new(
        StubSource::default()
            .with("a.pdf", &["1", "2", "3"])
            .with("b report.pdf", &["1"]),
    );

    let entries = inspect_directory_with(&source, &ws.config()).await.unwrap();

    let listed: Vec<_> = entries
        .iter()
        .map(|e| {
            (
                e.source.file_name().unwrap().to_string_lossy().into_owned(),
                e.page_count,
                e.output.file_name().unwrap().to_string_lossy().into_owned(),
            )
        })
        .collect();
    assert_eq!(
        listed,
        vec![
            ("a.pdf".to_string(), 3, "a.xlsx".to_string()),
            ("b report.pdf".to_string(), 1, "b_report.xlsx".to_string()),
        ]
    );
    assert!(source.calls.lock().unwrap().is_empty());
    assert!(!ws.output.exists());
}

/// Log sink shared between the subscriber and the assertion.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn discovery_is_logged_once_per_run() {
    let ws = Workspace::new(&["a.pdf", "b.pdf"]);
    let source = Arc::new(StubSource::default().with("a.pdf", &["p"]).with("b.pdf", &["p"]));
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    convert_directory_with(&source, &ScriptedCompletion::default(), &ws.config())
        .await
        .unwrap();

    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert_eq!(text.matches("Found 2 PDF files").count(), 1, "logs:\n{text}");
}
