//! Read-only ranking and drilldown over the fact and metric tables.

use crate::schema::{Fact, ScoredMetric, StatementType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Desc,
    Asc,
}

impl Default for RankOrder {
    fn default() -> Self {
        Self::Desc
    }
}

/// The top `n` companies by indicator value for one year. Rows without a
/// value are dropped; the sort is stable so ties keep their input order.
pub fn top_n_companies(
    metrics: &[ScoredMetric],
    indicator: &str,
    year: i32,
    n: usize,
    order: RankOrder,
) -> Vec<ScoredMetric> {
    let mut subset: Vec<ScoredMetric> = metrics
        .iter()
        .filter(|m| m.indicator_name == indicator && m.year == year && m.indicator_value.is_some())
        .cloned()
        .collect();

    subset.sort_by(|a, b| {
        let (a, b) = (a.indicator_value.unwrap(), b.indicator_value.unwrap());
        match order {
            RankOrder::Asc => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
            RankOrder::Desc => b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal),
        }
    });
    subset.truncate(n);
    subset
}

/// Facts under one subject-path prefix for a (company, year, statement).
pub fn drilldown_facts(
    facts: &[Fact],
    company: &str,
    year: i32,
    statement_type: StatementType,
    subject_prefix: &str,
) -> Vec<Fact> {
    facts
        .iter()
        .filter(|f| {
            f.company_name == company
                && f.year == year
                && f.statement_type == statement_type
                && f.subject_path.starts_with(subject_prefix)
        })
        .cloned()
        .collect()
}
