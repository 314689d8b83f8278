//! Row sampling for tabular documents (CSV, spreadsheets).
//!
//! Units are non-blank rows, each rendered as its cells joined by a space.
//! Unlike pages and paragraphs, rows vary wildly in size, so the budget is
//! counted in characters: a table whose rows fit in `max_chars` is kept
//! whole; otherwise rows are taken from the top and from the bottom until
//! each side has spent half the budget.

/// Character budget for one tabular document.
pub const TABLE_MAX_CHARS: usize = 30_000;

/// Line inserted where rows were skipped.
pub const TABLE_OMISSION_MARKER: &str = "...";

/// Render one row: non-empty cells joined by a single space.
///
/// Returns `None` for rows without any text.
pub fn row_line<I, S>(cells: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = cells
        .into_iter()
        .filter_map(|cell| {
            let cell = cell.as_ref().trim();
            (!cell.is_empty()).then(|| cell.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ");

    (!line.is_empty()).then_some(line)
}

/// Join rows, sampling head and tail when the table exceeds `max_chars`.
pub fn sample_rows(rows: &[String], max_chars: usize) -> String {
    let full_len: usize =
        rows.iter().map(|r| r.chars().count()).sum::<usize>() + rows.len().saturating_sub(1);
    if full_len <= max_chars {
        return rows.join("\n");
    }

    let half = max_chars / 2;
    let head = take_within(rows.iter(), half);
    let tail_len = take_within(rows.iter().rev(), half);
    // Never repeat a row that the head already holds.
    let tail_start = rows.len().saturating_sub(tail_len).max(head);

    tracing::debug!(
        "Sampling {} of {} rows ({} character budget)",
        head + (rows.len() - tail_start),
        rows.len(),
        max_chars
    );

    let mut lines: Vec<&str> = rows[..head].iter().map(String::as_str).collect();
    lines.push(TABLE_OMISSION_MARKER);
    lines.extend(rows[tail_start..].iter().map(String::as_str));
    lines.join("\n")
}

/// Number of leading rows whose combined length stays within `budget`.
fn take_within<'a>(rows: impl Iterator<Item = &'a String>, budget: usize) -> usize {
    let mut spent = 0;
    let mut taken = 0;
    for row in rows {
        let len = row.chars().count();
        if spent + len > budget {
            break;
        }
        spent += len;
        taken += 1;
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("row{:03}", i)).collect()
    }

    #[test]
    fn test_row_line_skips_blank_cells() {
        assert_eq!(
            row_line(["Name", "", "  Value "]),
            Some("Name Value".to_string())
        );
        assert_eq!(row_line(["", "  "]), None);
        assert_eq!(row_line(Vec::<String>::new()), None);
    }

    #[test]
    fn test_small_table_kept_whole() {
        let rows = rows(5);
        let text = sample_rows(&rows, 100);
        assert_eq!(text, "row001\nrow002\nrow003\nrow004\nrow005");
        assert!(!text.contains(TABLE_OMISSION_MARKER));
    }

    #[test]
    fn test_large_table_samples_head_and_tail() {
        // 100 rows of 6 characters, 60 character budget: 5 rows per side
        let rows = rows(100);
        let text = sample_rows(&rows, 60);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "row001", "row002", "row003", "row004", "row005", "...", "row096", "row097",
                "row098", "row099", "row100"
            ]
        );
    }

    #[test]
    fn test_oversized_single_row() {
        let rows = vec!["x".repeat(50)];
        let text = sample_rows(&rows, 10);
        assert_eq!(text, TABLE_OMISSION_MARKER);
    }

    #[test]
    fn test_head_and_tail_never_overlap() {
        // Budget fits everything per side but not the total with separators.
        let rows = vec!["aaaa".to_string(), "bbbb".to_string(), "cccc".to_string()];
        let text = sample_rows(&rows, 13);
        assert_eq!(text.matches("aaaa").count(), 1);
        assert_eq!(text.matches("cccc").count(), 1);
    }
}
