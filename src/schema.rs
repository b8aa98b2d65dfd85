use crate::error::{AnalysisError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    #[schemars(description = "Point-in-time statement of assets, liabilities and equity")]
    BalanceSheet,

    #[schemars(description = "Period statement of revenue, costs and profit")]
    IncomeStatement,

    #[schemars(description = "Period statement of operating, investing and financing cash flows")]
    CashFlow,
}

impl StatementType {
    pub const ALL: [StatementType; 3] = [
        StatementType::BalanceSheet,
        StatementType::IncomeStatement,
        StatementType::CashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "balance_sheet",
            StatementType::IncomeStatement => "income_statement",
            StatementType::CashFlow => "cash_flow",
        }
    }

    /// Accepted sheet/file names for this statement, English and Chinese.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            StatementType::BalanceSheet => &["资产负债表", "balance_sheet"],
            StatementType::IncomeStatement => &["利润表", "income_statement"],
            StatementType::CashFlow => &["现金流量表", "cash_flow"],
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        for statement_type in StatementType::ALL {
            if statement_type.aliases().contains(&trimmed) {
                return Ok(statement_type);
            }
        }
        Err(AnalysisError::InvalidRequest(format!(
            "Unknown statement type: {}",
            s
        )))
    }
}

/// A raw tabular statement sheet: header labels plus string cells, exactly as
/// read from the source file. Leading whitespace in cells is preserved since
/// the hierarchy parser may need it for indentation inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawTable {
    #[schemars(description = "Column header labels, possibly non-ASCII")]
    pub headers: Vec<String>,

    #[schemars(description = "Data rows; each row has one cell per header")]
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of the first header matching any of `options`, after trimming.
    pub fn find_column(&self, options: &[&str]) -> Option<usize> {
        options
            .iter()
            .find_map(|option| self.headers.iter().position(|h| h.trim() == *option))
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Drops rows whose cells are all blank, mirroring a dropna(how="all").
    pub fn without_blank_rows(&self) -> RawTable {
        let rows = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .cloned()
            .collect();
        RawTable {
            headers: self.headers.clone(),
            rows,
        }
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(RawTable);
        serde_json::to_string_pretty(&schema)
    }
}

/// One normalized statement line item: (company, statement, subject, year) -> amount.
///
/// Uniqueness is not enforced; duplicate subject paths for the same year may
/// coexist and are summed on demand by the indicator calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub company_name: String,
    pub statement_type: StatementType,
    pub category: String,
    pub subject_path: String,
    pub subject_l1: String,
    pub subject_l2: String,
    pub subject_l3: String,
    pub year: i32,
    pub amount: f64,
}

/// How the indicator calculator reacts to a missing denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Record a warning and leave the indicator value undefined.
    Warn,
    /// Abort the whole scoring run.
    Error,
}

impl Default for MissingValuePolicy {
    fn default() -> Self {
        Self::Warn
    }
}

impl FromStr for MissingValuePolicy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(AnalysisError::InvalidRequest(format!(
                "Unknown missing-value policy: {}",
                other
            ))),
        }
    }
}

/// Audit payload recorded alongside every indicator value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDetails {
    pub numerator: f64,
    pub denominator: f64,
    pub label: String,
}

/// A computed indicator for one (company, year). `indicator_value` is None
/// when the denominator was missing; serializes as JSON null, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorMetric {
    pub company_name: String,
    pub year: i32,
    pub indicator_name: String,
    pub indicator_value: Option<f64>,
    pub details: MetricDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "unknown" => Ok(Self::Unknown),
            other => Err(AnalysisError::InvalidRequest(format!(
                "Unknown risk level: {}",
                other
            ))),
        }
    }
}

/// An indicator metric with its threshold-rule classification attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMetric {
    pub company_name: String,
    pub year: i32,
    pub indicator_name: String,
    pub indicator_value: Option<f64>,
    pub details: MetricDetails,
    pub risk_level: RiskLevel,
    pub risk_score: Option<f64>,
}

/// Weighted mean of available per-indicator risk scores for one (company, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallRisk {
    pub company_name: String,
    pub year: i32,
    pub overall_risk_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_type_aliases() {
        assert_eq!(
            "balance_sheet".parse::<StatementType>().unwrap(),
            StatementType::BalanceSheet
        );
        assert_eq!(
            "利润表".parse::<StatementType>().unwrap(),
            StatementType::IncomeStatement
        );
        assert!("ledger".parse::<StatementType>().is_err());
    }

    #[test]
    fn test_missing_value_serializes_as_null() {
        let metric = IndicatorMetric {
            company_name: "Alpha".to_string(),
            year: 2023,
            indicator_name: "roe".to_string(),
            indicator_value: None,
            details: MetricDetails {
                numerator: 2000.0,
                denominator: 0.0,
                label: "ROE".to_string(),
            },
        };
        let json = serde_json::to_string(&metric).unwrap();
        assert!(json.contains("\"indicator_value\":null"));
    }

    #[test]
    fn test_without_blank_rows() {
        let table = RawTable::new(
            vec!["subject".to_string(), "2023".to_string()],
            vec![
                vec!["资产".to_string(), "100".to_string()],
                vec!["   ".to_string(), "".to_string()],
                vec!["负债".to_string(), "50".to_string()],
            ],
        );
        assert_eq!(table.without_blank_rows().rows.len(), 2);
    }

    #[test]
    fn test_raw_table_schema_generation() {
        let schema_json = RawTable::schema_as_json().unwrap();
        assert!(schema_json.contains("headers"));
        assert!(schema_json.contains("rows"));
    }

    #[test]
    fn test_risk_level_round_trip() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Unknown] {
            assert_eq!(level.as_str().parse::<RiskLevel>().unwrap(), level);
        }
    }
}
