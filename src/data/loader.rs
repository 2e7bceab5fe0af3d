use crate::{Error, Result};

use super::model::{Record, RecordSet};

const SEPARATOR: char = ',';
const QUOTE: char = '"';

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse comma-separated text into records.
///
/// Layout:
/// * first line is the header, split on `,` without quote handling
/// * every following non-blank line is a row, split by [`split_row`]
/// * missing trailing values become `""`, surplus values are dropped
/// * duplicate header names: the later column wins
///
/// Fails only when there is no header line at all.
pub fn parse_records(text: &str) -> Result<RecordSet> {
    if text.trim().is_empty() {
        return Err(Error::Parse("input has no header line".into()));
    }

    let mut lines = text.split('\n');
    let header_line = lines.next().unwrap_or_default();
    let column_names: Vec<String> = header_line
        .split(SEPARATOR)
        .map(|h| h.trim().to_string())
        .collect();

    let records = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let values = split_row(line);
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = values.get(i).map(|v| v.trim()).unwrap_or("");
                    (name.clone(), value.to_string())
                })
                .collect::<Record>()
        })
        .collect();

    Ok(RecordSet {
        column_names,
        records,
    })
}

/// Split one row on commas outside quoted spans.
///
/// Every `"` flips the in-quotes state and is dropped from the output;
/// there is no `""` escape.
pub fn split_row(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            QUOTE => in_quotes = !in_quotes,
            SEPARATOR if !in_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    values.push(current);

    values
}
