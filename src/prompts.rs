//! Prompts sent to the completion service for each page.
//!
//! Every prompt lives here so it can be inspected by unit tests and changed
//! in one place. [`crate::config::ExtractionConfig::system_prompt`] overrides
//! [`SYSTEM_PROMPT`]; the task prompt is always built by [`task_prompt`].

/// System instruction that frames every request.
pub const SYSTEM_PROMPT: &str = "You are an AI assistant helping to organize data from a PDF file.";

/// Literal marker the model is told to use for a missing field.
pub const MISSING_MARKER: &str = "NA";

/// Build the task instruction around one page's extracted text.
///
/// The model is asked for comma-separated lines of exactly three columns:
/// name, business ID, personnel count.
pub fn task_prompt(page_text: &str) -> String {
    format!(
        r#"Analyze the following text from a PDF report and extract the name, business ID, and personnel count.

Text:
{page_text}

Present your findings in a structured format with each entry separated by commas. Each entry should list the name, business ID, and personnel count, in that order.
Format your response as: Name, business ID, personnel
There is no need for additional information other than the columns. When encountering more than one personnel count, use the number that focuses on the sport, not the whole organization.
On personnel count information, those that are licence holders and sport practitioners, should be the priority numbers, i.e. "lisenssit".

If there is no information on business ID, then mark it as "{MISSING_MARKER}". Full names of clubs are prioritized over i.e., acronyms.
If the data is missing business ID or the personnel count, mark them as {MISSING_MARKER}.
The order should be the same as the original text.
The format MUST HAVE the three columns and ONLY the three columns."#
    )
}
