//! Statement normalization.
//!
//! Reshapes a raw statement sheet into canonical fact rows: one row per
//! (company, statement_type, subject_path, year) with a numeric amount.
//! Two year encodings are supported: "tall" sheets with explicit year/amount
//! columns and "wide" sheets with one digit-named column per year.

use crate::error::{AnalysisError, Result};
use crate::schema::{Fact, RawTable, StatementType};
use crate::subject::{parse_subjects, SubjectParseResult};
use log::debug;

const YEAR_COLUMNS: [&str; 2] = ["year", "年份"];
const AMOUNT_COLUMNS: [&str; 2] = ["amount", "金额"];

#[derive(Debug, Clone)]
pub struct NormalizeResult {
    pub facts: Vec<Fact>,
    pub warnings: Vec<String>,
}

fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("nan")
}

fn parse_amount(cell: &str, year: i32) -> Result<f64> {
    let amount: f64 = cell
        .trim()
        .parse()
        .map_err(|_| AnalysisError::InvalidAmount {
            year,
            value: cell.trim().to_string(),
        })?;
    if !amount.is_finite() {
        return Err(AnalysisError::InvalidAmount {
            year,
            value: cell.trim().to_string(),
        });
    }
    Ok(amount)
}

fn make_fact(
    company_name: &str,
    statement_type: StatementType,
    subjects: &SubjectParseResult,
    row: usize,
    year: i32,
    amount: f64,
) -> Fact {
    Fact {
        company_name: company_name.to_string(),
        statement_type,
        category: subjects.subject_l1[row].clone(),
        subject_path: subjects.subject_path[row].clone(),
        subject_l1: subjects.subject_l1[row].clone(),
        subject_l2: subjects.subject_l2[row].clone(),
        subject_l3: subjects.subject_l3[row].clone(),
        year,
        amount,
    }
}

/// Normalize one statement sheet into fact rows.
///
/// Fail-fast: a single non-castable amount aborts the whole sheet, since one
/// unparseable value usually means the shape detection itself went wrong.
pub fn normalize_statement(
    company_name: &str,
    statement_type: StatementType,
    table: &RawTable,
) -> Result<NormalizeResult> {
    let table = table.without_blank_rows();
    let subjects = parse_subjects(&table)?;
    let warnings = subjects.warnings.clone();

    let year_col = table.find_column(&YEAR_COLUMNS);
    let amount_col = table.find_column(&AMOUNT_COLUMNS);

    // Tall shape: one row per (year, amount) pair already.
    if let (Some(year_col), Some(amount_col)) = (year_col, amount_col) {
        let mut facts = Vec::with_capacity(table.rows.len());
        for row in 0..table.rows.len() {
            let year_cell = table.cell(row, year_col);
            let year: i32 = year_cell.trim().parse().map_err(|_| {
                AnalysisError::ParseError(format!("Invalid year value '{}'", year_cell.trim()))
            })?;
            let amount = parse_amount(table.cell(row, amount_col), year)?;
            facts.push(make_fact(
                company_name,
                statement_type,
                &subjects,
                row,
                year,
                amount,
            ));
        }
        debug!(
            "Normalized tall-shape {} sheet for {}: {} facts",
            statement_type,
            company_name,
            facts.len()
        );
        return Ok(NormalizeResult { facts, warnings });
    }

    // Wide shape: every digit-named column is a year.
    let year_columns: Vec<(usize, i32)> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            let trimmed = header.trim();
            if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
                trimmed.parse().ok().map(|year| (idx, year))
            } else {
                None
            }
        })
        .collect();

    if year_columns.is_empty() {
        return Err(AnalysisError::ParseError(format!(
            "No year columns detected in statement sheet (columns: {})",
            table
                .headers
                .iter()
                .map(|h| h.trim())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mut facts = Vec::new();
    for row in 0..table.rows.len() {
        for (col, year) in &year_columns {
            let cell = table.cell(row, *col);
            if is_missing(cell) {
                continue;
            }
            let amount = parse_amount(cell, *year)?;
            facts.push(make_fact(
                company_name,
                statement_type,
                &subjects,
                row,
                *year,
                amount,
            ));
        }
    }

    debug!(
        "Normalized wide-shape {} sheet for {}: {} facts over {} year columns",
        statement_type,
        company_name,
        facts.len(),
        year_columns.len()
    );
    Ok(NormalizeResult { facts, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_table() -> RawTable {
        RawTable::new(
            vec![
                "subject_l1".to_string(),
                "subject_l2".to_string(),
                "2022".to_string(),
                "2023".to_string(),
            ],
            vec![
                vec![
                    "资产".to_string(),
                    "流动资产".to_string(),
                    "NA".to_string(),
                    "5000".to_string(),
                ],
                vec![
                    "负债".to_string(),
                    "流动负债".to_string(),
                    "1800".to_string(),
                    "2000".to_string(),
                ],
            ],
        )
    }

    #[test]
    fn test_wide_shape_one_fact_per_non_missing_cell() {
        let result =
            normalize_statement("Alpha", StatementType::BalanceSheet, &wide_table()).unwrap();
        assert_eq!(result.facts.len(), 3);

        let assets_2023 = result
            .facts
            .iter()
            .find(|f| f.subject_path == "资产>流动资产" && f.year == 2023)
            .unwrap();
        assert_eq!(assets_2023.amount, 5000.0);
        assert_eq!(assets_2023.category, "资产");
        assert!(!result
            .facts
            .iter()
            .any(|f| f.subject_path == "资产>流动资产" && f.year == 2022));
    }

    #[test]
    fn test_tall_shape() {
        let table = RawTable::new(
            vec!["subject".to_string(), "year".to_string(), "amount".to_string()],
            vec![
                vec!["收入>营业收入".to_string(), "2023".to_string(), "10000".to_string()],
                vec!["利润>净利润".to_string(), "2022".to_string(), "1500.5".to_string()],
            ],
        );

        let result =
            normalize_statement("Alpha", StatementType::IncomeStatement, &table).unwrap();
        assert_eq!(result.facts.len(), 2);
        assert_eq!(result.facts[0].year, 2023);
        assert_eq!(result.facts[1].amount, 1500.5);
        assert_eq!(result.facts[0].statement_type, StatementType::IncomeStatement);
    }

    #[test]
    fn test_tall_shape_localized_columns() {
        let table = RawTable::new(
            vec!["科目".to_string(), "年份".to_string(), "金额".to_string()],
            vec![vec!["利润>净利润".to_string(), "2023".to_string(), "2000".to_string()]],
        );

        let result =
            normalize_statement("Alpha", StatementType::IncomeStatement, &table).unwrap();
        assert_eq!(result.facts[0].subject_path, "利润>净利润");
        assert_eq!(result.facts[0].year, 2023);
    }

    #[test]
    fn test_invalid_amount_aborts_sheet() {
        let table = RawTable::new(
            vec!["subject".to_string(), "2023".to_string()],
            vec![
                vec!["资产".to_string(), "100".to_string()],
                vec!["负债".to_string(), "abc".to_string()],
            ],
        );

        let err = normalize_statement("Alpha", StatementType::BalanceSheet, &table).unwrap_err();
        match err {
            AnalysisError::InvalidAmount { year, value } => {
                assert_eq!(year, 2023);
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidAmount, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        let table = RawTable::new(
            vec!["subject".to_string(), "2023".to_string()],
            vec![vec!["资产".to_string(), "inf".to_string()]],
        );

        let err = normalize_statement("Alpha", StatementType::BalanceSheet, &table).unwrap_err();
        assert_eq!(err.code(), 1103);
    }

    #[test]
    fn test_unrecognized_shape_names_columns() {
        let table = RawTable::new(
            vec!["subject".to_string(), "note".to_string()],
            vec![vec!["资产".to_string(), "x".to_string()]],
        );

        let err = normalize_statement("Alpha", StatementType::BalanceSheet, &table).unwrap_err();
        assert_eq!(err.code(), 1004);
        assert!(err.to_string().contains("note"));
    }

    #[test]
    fn test_blank_rows_dropped_before_parsing() {
        let table = RawTable::new(
            vec!["subject".to_string(), "2023".to_string()],
            vec![
                vec!["资产>流动资产".to_string(), "100".to_string()],
                vec!["".to_string(), "".to_string()],
            ],
        );

        let result =
            normalize_statement("Alpha", StatementType::BalanceSheet, &table).unwrap();
        assert_eq!(result.facts.len(), 1);
    }

    #[test]
    fn test_fallback_warning_propagates() {
        let table = RawTable::new(
            vec!["subject".to_string(), "2023".to_string()],
            vec![
                vec!["资产总计".to_string(), "100".to_string()],
                vec!["负债总计".to_string(), "60".to_string()],
            ],
        );

        let result =
            normalize_statement("Alpha", StatementType::BalanceSheet, &table).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.facts.len(), 2);
    }
}
