//! Pipeline stages for PDF-to-spreadsheet extraction.
//!
//! Each submodule implements exactly one step, so each is testable alone
//! and the two external dependencies (pdfium, the LLM) sit behind traits.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ extract ──▶ llm ──▶ parse ──▶ sheet
//! (sorted      (pdfium     (reply  (rows)    (.xlsx per
//!  *.pdf)       page text)  text)             input PDF)
//! ```
//!
//! 1. [`discover`] — list `*.pdf` in the input directory, sorted by name
//! 2. [`extract`]  — plain text of one page; blocking, run on tokio's
//!    blocking pool by the orchestrator
//! 3. [`llm`]      — one completion call per page; the only stage with
//!    network I/O
//! 4. [`parse`]    — split the reply into lines and comma fields
//! 5. [`sheet`]    — name and atomically write the workbook

pub mod discover;
pub mod extract;
pub mod llm;
pub mod parse;
pub mod sheet;
