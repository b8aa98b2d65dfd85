//! Subject hierarchy recovery.
//!
//! Statement sheets encode their accounting-subject hierarchy in one of three
//! ways: explicit level columns, a single delimited column, or indentation
//! depth. `parse_subjects` tries them in that order and always produces a
//! 3-level label tuple plus a `>`-joined path for every row.

use crate::error::{AnalysisError, Result};
use crate::schema::RawTable;
use log::debug;

/// Delimiters checked in priority order; the first one present in a value wins.
pub const PATH_DELIMITERS: [char; 4] = ['>', '/', '-', '\\'];

const L1_COLUMNS: [&str; 3] = ["subject_l1", "一级科目", "一级"];
const L2_COLUMNS: [&str; 3] = ["subject_l2", "二级科目", "二级"];
const L3_COLUMNS: [&str; 3] = ["subject_l3", "三级科目", "三级"];
const SUBJECT_COLUMNS: [&str; 4] = ["subject_path", "subject", "科目", "项目"];

/// Per-row hierarchy labels, as parallel vectors over the table's rows.
#[derive(Debug, Clone, Default)]
pub struct SubjectParseResult {
    pub subject_path: Vec<String>,
    pub subject_l1: Vec<String>,
    pub subject_l2: Vec<String>,
    pub subject_l3: Vec<String>,
    pub warnings: Vec<String>,
}

fn split_by_delimiter(value: &str) -> Vec<String> {
    for delimiter in PATH_DELIMITERS {
        if value.contains(delimiter) {
            return value
                .split(delimiter)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
    vec![value.trim().to_string()]
}

fn leading_spaces(value: &str) -> usize {
    value.chars().take_while(|c| *c == ' ').count()
}

/// "Last value wins per level" reducer for indentation-encoded hierarchies.
/// Each step records the row's label at its inferred level, clears deeper
/// levels, and emits a snapshot of the cumulative path.
#[derive(Debug, Default)]
struct IndentState {
    levels: [String; 3],
}

impl IndentState {
    fn step(&mut self, level: usize, label: &str) -> Vec<String> {
        if (1..=3).contains(&level) {
            self.levels[level - 1] = label.trim().to_string();
            for deeper in level..3 {
                self.levels[deeper].clear();
            }
        }
        // Depth beyond 3 keeps the carried state and sets no label.
        self.levels.to_vec()
    }
}

fn parse_by_indent(values: &[&str]) -> Result<Vec<Vec<String>>> {
    let indents: Vec<usize> = values.iter().map(|v| leading_spaces(v)).collect();
    let mut unique_indents: Vec<usize> = indents.clone();
    unique_indents.sort_unstable();
    unique_indents.dedup();

    if unique_indents.len() <= 1 {
        return Err(AnalysisError::ParseError(
            "Unable to infer subject hierarchy from indentation.".to_string(),
        ));
    }

    let level_of = |indent: usize| -> usize {
        unique_indents
            .iter()
            .position(|i| *i == indent)
            .map(|idx| idx + 1)
            .unwrap_or(1)
    };

    let mut state = IndentState::default();
    let parsed = values
        .iter()
        .zip(indents.iter())
        .map(|(value, indent)| state.step(level_of(*indent), value))
        .collect();
    Ok(parsed)
}

/// Recover (level1, level2, level3) labels and a joined subject path for
/// every row of a raw statement table.
pub fn parse_subjects(table: &RawTable) -> Result<SubjectParseResult> {
    let row_count = table.rows.len();

    let l1_col = table.find_column(&L1_COLUMNS);
    let l2_col = table.find_column(&L2_COLUMNS);
    let l3_col = table.find_column(&L3_COLUMNS);

    if let Some(l1) = l1_col {
        let column_values = |col: Option<usize>| -> Vec<String> {
            match col {
                Some(idx) => (0..row_count)
                    .map(|row| table.cell(row, idx).trim().to_string())
                    .collect(),
                None => vec![String::new(); row_count],
            }
        };

        let subject_l1 = column_values(Some(l1));
        let subject_l2 = column_values(l2_col);
        let subject_l3 = column_values(l3_col);

        let subject_path = subject_l1
            .iter()
            .zip(subject_l2.iter())
            .zip(subject_l3.iter())
            .map(|((a, b), c)| join_path(&[a.clone(), b.clone(), c.clone()]))
            .collect();

        return Ok(SubjectParseResult {
            subject_path,
            subject_l1,
            subject_l2,
            subject_l3,
            warnings: Vec::new(),
        });
    }

    let subject_col = table.find_column(&SUBJECT_COLUMNS).unwrap_or(0);
    let values: Vec<&str> = (0..row_count).map(|row| table.cell(row, subject_col)).collect();

    let mut warnings = Vec::new();
    let has_delimiter = values
        .iter()
        .any(|value| PATH_DELIMITERS.iter().any(|d| value.contains(*d)));

    let parsed: Vec<Vec<String>> = if has_delimiter {
        values.iter().map(|v| split_by_delimiter(v)).collect()
    } else {
        match parse_by_indent(&values) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("Indentation inference failed, falling back to flat paths: {}", err);
                warnings.push(
                    "Indentation inference failed; subjects treated as single-level paths."
                        .to_string(),
                );
                values.iter().map(|v| split_by_delimiter(v)).collect()
            }
        }
    };

    let mut result = SubjectParseResult {
        warnings,
        ..Default::default()
    };

    for parts in parsed {
        let compacted: Vec<String> = parts.into_iter().filter(|p| !p.is_empty()).collect();
        let mut padded = compacted;
        padded.resize(3, String::new());
        padded.truncate(3);

        result.subject_path.push(join_path(&padded));
        result.subject_l1.push(padded[0].clone());
        result.subject_l2.push(padded[1].clone());
        result.subject_l3.push(padded[2].clone());
    }

    Ok(result)
}

fn join_path(segments: &[String]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(">")
}
