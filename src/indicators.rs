//! Indicator computation.
//!
//! For every (company, year) present in the fact set, three ratios are
//! derived by keyword-matching subject paths and summing the matched
//! amounts. The keyword tables live in an explicit [`IndicatorConfig`]
//! passed into the calculator, so runs can override them independently.

use crate::error::{AnalysisError, Result};
use crate::schema::{Fact, IndicatorMetric, MetricDetails, MissingValuePolicy, StatementType};
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NET_PROFIT_MARGIN: &str = "net_profit_margin";
pub const CURRENT_RATIO: &str = "current_ratio";
pub const ROE: &str = "roe";

/// Keyword sets used to locate the statement line items each indicator is
/// built from. Keywords are OR-joined into a regex and matched against
/// `subject_path`; an unmatched set simply sums to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub net_profit: Vec<String>,
    pub revenue: Vec<String>,
    pub current_assets: Vec<String>,
    pub current_liabilities: Vec<String>,
    pub equity: Vec<String>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        let set = |keywords: &[&str]| keywords.iter().map(|k| k.to_string()).collect();
        Self {
            net_profit: set(&["净利润"]),
            revenue: set(&["营业收入"]),
            current_assets: set(&["流动资产"]),
            current_liabilities: set(&["流动负债"]),
            equity: set(&["所有者权益", "股东权益"]),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorResult {
    pub metrics: Vec<IndicatorMetric>,
    pub warnings: Vec<String>,
}

struct SubjectMatchers {
    net_profit: Regex,
    revenue: Regex,
    current_assets: Regex,
    current_liabilities: Regex,
    equity: Regex,
}

impl SubjectMatchers {
    fn compile(config: &IndicatorConfig) -> Result<Self> {
        Ok(Self {
            net_profit: keyword_pattern(&config.net_profit)?,
            revenue: keyword_pattern(&config.revenue)?,
            current_assets: keyword_pattern(&config.current_assets)?,
            current_liabilities: keyword_pattern(&config.current_liabilities)?,
            equity: keyword_pattern(&config.equity)?,
        })
    }
}

fn keyword_pattern(keywords: &[String]) -> Result<Regex> {
    let pattern = keywords.join("|");
    Regex::new(&pattern).map_err(|err| {
        AnalysisError::ValidationError(format!("Invalid indicator keyword pattern: {}", err))
    })
}

fn sum_matching(
    facts: &[Fact],
    company: &str,
    year: i32,
    statement_type: StatementType,
    matcher: &Regex,
) -> f64 {
    facts
        .iter()
        .filter(|fact| {
            fact.company_name == company
                && fact.year == year
                && fact.statement_type == statement_type
                && matcher.is_match(&fact.subject_path)
        })
        .map(|fact| fact.amount)
        .sum()
}

/// (company, year) pairs in first-appearance order, companies outermost.
fn company_years(facts: &[Fact]) -> Vec<(String, Vec<i32>)> {
    let mut companies: Vec<String> = Vec::new();
    for fact in facts {
        if !companies.contains(&fact.company_name) {
            companies.push(fact.company_name.clone());
        }
    }

    companies
        .into_iter()
        .map(|company| {
            let mut years = Vec::new();
            for fact in facts.iter().filter(|f| f.company_name == company) {
                if !years.contains(&fact.year) {
                    years.push(fact.year);
                }
            }
            (company, years)
        })
        .collect()
}

/// Compute net_profit_margin, current_ratio and roe for every (company, year)
/// in the fact set.
///
/// A zero denominator either aborts the run (`MissingValuePolicy::Error`) or
/// leaves the indicator value undefined and records a warning.
pub fn calculate_indicators(
    facts: &[Fact],
    config: &IndicatorConfig,
    policy: MissingValuePolicy,
) -> Result<IndicatorResult> {
    let matchers = SubjectMatchers::compile(config)?;
    let mut result = IndicatorResult::default();

    for (company, years) in company_years(facts) {
        for year in years {
            let net_profit = sum_matching(
                facts,
                &company,
                year,
                StatementType::IncomeStatement,
                &matchers.net_profit,
            );
            let revenue = sum_matching(
                facts,
                &company,
                year,
                StatementType::IncomeStatement,
                &matchers.revenue,
            );
            let current_assets = sum_matching(
                facts,
                &company,
                year,
                StatementType::BalanceSheet,
                &matchers.current_assets,
            );
            let current_liabilities = sum_matching(
                facts,
                &company,
                year,
                StatementType::BalanceSheet,
                &matchers.current_liabilities,
            );
            let equity = sum_matching(
                facts,
                &company,
                year,
                StatementType::BalanceSheet,
                &matchers.equity,
            );

            let indicator_inputs = [
                (NET_PROFIT_MARGIN, net_profit, revenue, "净利润率"),
                (CURRENT_RATIO, current_assets, current_liabilities, "流动比率"),
                (ROE, net_profit, equity, "ROE"),
            ];

            for (indicator_name, numerator, denominator, label) in indicator_inputs {
                let indicator_value = if denominator == 0.0 {
                    if policy == MissingValuePolicy::Error {
                        return Err(AnalysisError::MissingRequiredSubject(format!(
                            "Missing denominator for {}",
                            indicator_name
                        )));
                    }
                    let warning = format!("{}-{}:{} denominator missing", company, year, label);
                    warn!("{}", warning);
                    result.warnings.push(warning);
                    None
                } else {
                    Some(numerator / denominator)
                };

                result.metrics.push(IndicatorMetric {
                    company_name: company.clone(),
                    year,
                    indicator_name: indicator_name.to_string(),
                    indicator_value,
                    details: MetricDetails {
                        numerator,
                        denominator,
                        label: label.to_string(),
                    },
                });
            }
        }
    }

    info!(
        "Calculated {} indicator rows ({} warnings)",
        result.metrics.len(),
        result.warnings.len()
    );
    Ok(result)
}
