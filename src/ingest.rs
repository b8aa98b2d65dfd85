//! CSV ingestion.
//!
//! A company is a directory holding one CSV per statement; file stems match
//! the statement aliases (English or Chinese), e.g. `balance_sheet.csv` or
//! `资产负债表.csv`. Cells are read verbatim — leading whitespace must
//! survive for indentation-based hierarchy inference.

use crate::error::{AnalysisError, Result};
use crate::schema::{RawTable, StatementType};
use log::info;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Read one statement sheet from CSV into a raw table.
pub fn read_statement_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|err| AnalysisError::ParseError(format!("Failed to read CSV header: {}", err)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record
            .map_err(|err| AnalysisError::ParseError(format!("Failed to read CSV row: {}", err)))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable::new(headers, rows))
}

/// Read all three statement sheets for one company directory.
pub fn read_company_dir(dir: &Path) -> Result<BTreeMap<StatementType, RawTable>> {
    if !dir.is_dir() {
        return Err(AnalysisError::InvalidRequest(format!(
            "Company directory not found: {}",
            dir.display()
        )));
    }

    let mut sheets = BTreeMap::new();
    for statement_type in StatementType::ALL {
        let file = statement_type
            .aliases()
            .iter()
            .map(|alias| dir.join(format!("{}.csv", alias)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                AnalysisError::ValidationError(format!(
                    "Missing required statement file for {} in {}",
                    statement_type,
                    dir.display()
                ))
            })?;

        let table = read_statement_csv(std::fs::File::open(&file)?)?;
        sheets.insert(statement_type, table);
    }
    Ok(sheets)
}

/// Read every company subdirectory under `input_dir`, sorted by name.
/// The directory name is the company name.
pub fn read_input_dir(input_dir: &Path) -> Result<Vec<(String, BTreeMap<StatementType, RawTable>)>> {
    if !input_dir.is_dir() {
        return Err(AnalysisError::InvalidRequest(format!(
            "Input directory not found: {}",
            input_dir.display()
        )));
    }

    let mut company_dirs: Vec<_> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    company_dirs.sort();

    let mut companies = Vec::new();
    for dir in company_dirs {
        let company_name = dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let sheets = read_company_dir(&dir)?;
        info!("Read {} statement sheets for {}", sheets.len(), company_name);
        companies.push((company_name, sheets));
    }
    Ok(companies)
}
