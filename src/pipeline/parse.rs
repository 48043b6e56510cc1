//! Reply parsing: model reply text → rows.
//!
//! A mechanical line/comma splitter. The reply is trimmed as a whole, then
//! each non-empty line becomes exactly one [`Row`]: fields are split on `,`,
//! trimmed, and cut to the first three. Lines with fewer than three fields
//! become short rows; nothing is padded. A whitespace-only line is not
//! empty: it yields a one-field row with an empty name.
//!
//! The model is asked for exactly three columns, so any other field count
//! is counted as *irregular* and logged. The row is kept either way; the
//! count only flags the line for a human reader of the log.

use crate::output::{Row, COLUMNS};
use tracing::warn;

/// Counts from one [`append_rows`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Rows appended (one per non-empty line).
    pub appended: usize,
    /// Of those, lines whose field count was not exactly three.
    pub irregular: usize,
}

/// Parse `reply` and append one row per non-empty line to `rows`.
pub fn append_rows(reply: &str, rows: &mut Vec<Row>) -> ParseStats {
    let mut stats = ParseStats::default();

    for (line_no, line) in reply.trim().lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != COLUMNS.len() {
            stats.irregular += 1;
            warn!(
                "Reply line {} has {} fields, expected {}: {:?}",
                line_no + 1,
                fields.len(),
                COLUMNS.len(),
                line
            );
        }

        rows.push(Row::from_fields(fields.into_iter().take(COLUMNS.len())));
        stats.appended += 1;
    }

    stats
}

/// Parse `reply` into a fresh row list.
pub fn parse_reply(reply: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    append_rows(reply, &mut rows);
    rows
}
