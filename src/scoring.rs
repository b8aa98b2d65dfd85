//! Risk scoring.
//!
//! Each indicator value is classified against an ordered threshold-rule
//! table (most favorable threshold first), then the per-indicator scores
//! are aggregated into one weighted overall risk score per (company, year).

use crate::indicators::{CURRENT_RATIO, NET_PROFIT_MARGIN, ROE};
use crate::schema::{IndicatorMetric, OverallRisk, RiskLevel, ScoredMetric};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catch-all floor so the last rule of each table matches any finite value.
const CATCH_ALL_MIN: f64 = -1e9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskRule {
    pub min: f64,
    pub level: RiskLevel,
    pub score: f64,
}

/// Ordered rule tables keyed by indicator name. Rules must be listed from
/// highest threshold to lowest; the first rule the value meets wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRules {
    rules: BTreeMap<String, Vec<RiskRule>>,
}

impl RiskRules {
    pub fn new(rules: BTreeMap<String, Vec<RiskRule>>) -> Self {
        Self { rules }
    }

    pub fn for_indicator(&self, indicator_name: &str) -> &[RiskRule] {
        self.rules
            .get(indicator_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for RiskRules {
    fn default() -> Self {
        let rule = |min: f64, level: RiskLevel, score: f64| RiskRule { min, level, score };
        let mut rules = BTreeMap::new();
        rules.insert(
            NET_PROFIT_MARGIN.to_string(),
            vec![
                rule(0.2, RiskLevel::Low, 10.0),
                rule(0.1, RiskLevel::Medium, 50.0),
                rule(CATCH_ALL_MIN, RiskLevel::High, 80.0),
            ],
        );
        rules.insert(
            CURRENT_RATIO.to_string(),
            vec![
                rule(1.5, RiskLevel::Low, 15.0),
                rule(1.0, RiskLevel::Medium, 50.0),
                rule(CATCH_ALL_MIN, RiskLevel::High, 80.0),
            ],
        );
        rules.insert(
            ROE.to_string(),
            vec![
                rule(0.15, RiskLevel::Low, 10.0),
                rule(0.08, RiskLevel::Medium, 55.0),
                rule(CATCH_ALL_MIN, RiskLevel::High, 85.0),
            ],
        );
        Self { rules }
    }
}

/// Classify one indicator value. Undefined values and indicators without a
/// configured rule table both come back as (unknown, None).
pub fn score_indicator(
    rules: &RiskRules,
    indicator_name: &str,
    value: Option<f64>,
) -> (RiskLevel, Option<f64>) {
    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => return (RiskLevel::Unknown, None),
    };

    for rule in rules.for_indicator(indicator_name) {
        if value >= rule.min {
            return (rule.level, Some(rule.score));
        }
    }
    (RiskLevel::Unknown, None)
}

/// Attach a risk level and score to every metric row. Purely row-wise and
/// order-preserving.
pub fn apply_scoring(metrics: Vec<IndicatorMetric>, rules: &RiskRules) -> Vec<ScoredMetric> {
    metrics
        .into_iter()
        .map(|metric| {
            let (risk_level, risk_score) =
                score_indicator(rules, &metric.indicator_name, metric.indicator_value);
            ScoredMetric {
                company_name: metric.company_name,
                year: metric.year,
                indicator_name: metric.indicator_name,
                indicator_value: metric.indicator_value,
                details: metric.details,
                risk_level,
                risk_score,
            }
        })
        .collect()
}

/// Weighted mean of available risk scores per (company, year), ordered by
/// company then year. Indicators with weight <= 0 or a missing score are
/// excluded from both numerator and denominator; no usable indicator leaves
/// the overall score undefined.
pub fn calculate_overall_risk(
    metrics: &[ScoredMetric],
    weights: &BTreeMap<String, f64>,
) -> Vec<OverallRisk> {
    let mut groups: BTreeMap<(String, i32), Vec<&ScoredMetric>> = BTreeMap::new();
    for metric in metrics {
        groups
            .entry((metric.company_name.clone(), metric.year))
            .or_default()
            .push(metric);
    }

    groups
        .into_iter()
        .map(|((company_name, year), group)| {
            let mut weight_sum = 0.0;
            let mut weighted_scores = 0.0;
            for metric in &group {
                let score = match metric.risk_score {
                    Some(score) => score,
                    None => continue,
                };
                let weight = weights.get(&metric.indicator_name).copied().unwrap_or(0.0);
                if weight <= 0.0 {
                    continue;
                }
                weight_sum += weight;
                weighted_scores += weight * score;
            }

            let overall_risk_score = if weight_sum > 0.0 {
                Some(weighted_scores / weight_sum)
            } else {
                None
            };
            debug!(
                "Overall risk for {}-{}: {:?} (weight sum {})",
                company_name, year, overall_risk_score, weight_sum
            );

            OverallRisk {
                company_name,
                year,
                overall_risk_score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MetricDetails;

    fn metric(indicator_name: &str, value: Option<f64>) -> IndicatorMetric {
        IndicatorMetric {
            company_name: "Alpha".to_string(),
            year: 2023,
            indicator_name: indicator_name.to_string(),
            indicator_value: value,
            details: MetricDetails {
                numerator: 0.0,
                denominator: 1.0,
                label: String::new(),
            },
        }
    }

    #[test]
    fn test_score_indicator_buckets() {
        let rules = RiskRules::default();
        assert_eq!(
            score_indicator(&rules, NET_PROFIT_MARGIN, Some(0.25)),
            (RiskLevel::Low, Some(10.0))
        );
        assert_eq!(
            score_indicator(&rules, NET_PROFIT_MARGIN, Some(0.15)),
            (RiskLevel::Medium, Some(50.0))
        );
        assert_eq!(
            score_indicator(&rules, NET_PROFIT_MARGIN, Some(-0.5)),
            (RiskLevel::High, Some(80.0))
        );
    }

    #[test]
    fn test_score_indicator_boundary_is_inclusive() {
        let rules = RiskRules::default();
        assert_eq!(
            score_indicator(&rules, CURRENT_RATIO, Some(1.5)),
            (RiskLevel::Low, Some(15.0))
        );
        assert_eq!(
            score_indicator(&rules, ROE, Some(0.08)),
            (RiskLevel::Medium, Some(55.0))
        );
    }

    #[test]
    fn test_score_indicator_missing_value() {
        let rules = RiskRules::default();
        assert_eq!(
            score_indicator(&rules, NET_PROFIT_MARGIN, None),
            (RiskLevel::Unknown, None)
        );
        assert_eq!(
            score_indicator(&rules, NET_PROFIT_MARGIN, Some(f64::NAN)),
            (RiskLevel::Unknown, None)
        );
    }

    #[test]
    fn test_score_indicator_without_rules() {
        let rules = RiskRules::default();
        assert_eq!(
            score_indicator(&rules, "debt_ratio", Some(0.5)),
            (RiskLevel::Unknown, None)
        );
    }

    #[test]
    fn test_apply_scoring_preserves_order() {
        let rules = RiskRules::default();
        let scored = apply_scoring(
            vec![
                metric(ROE, Some(0.1)),
                metric(NET_PROFIT_MARGIN, Some(0.25)),
                metric(CURRENT_RATIO, None),
            ],
            &rules,
        );
        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].indicator_name, ROE);
        assert_eq!(scored[0].risk_level, RiskLevel::Medium);
        assert_eq!(scored[1].risk_score, Some(10.0));
        assert_eq!(scored[2].risk_level, RiskLevel::Unknown);
        assert_eq!(scored[2].risk_score, None);
    }

    fn scored(indicator_name: &str, score: Option<f64>) -> ScoredMetric {
        ScoredMetric {
            company_name: "Alpha".to_string(),
            year: 2023,
            indicator_name: indicator_name.to_string(),
            indicator_value: Some(0.0),
            details: MetricDetails {
                numerator: 0.0,
                denominator: 1.0,
                label: String::new(),
            },
            risk_level: RiskLevel::Low,
            risk_score: score,
        }
    }

    #[test]
    fn test_overall_risk_excludes_missing_scores() {
        let weights = BTreeMap::from([
            (NET_PROFIT_MARGIN.to_string(), 0.4),
            (CURRENT_RATIO.to_string(), 0.3),
            (ROE.to_string(), 0.3),
        ]);
        let metrics = vec![
            scored(NET_PROFIT_MARGIN, Some(10.0)),
            scored(CURRENT_RATIO, Some(50.0)),
            scored(ROE, None),
        ];

        let overall = calculate_overall_risk(&metrics, &weights);
        assert_eq!(overall.len(), 1);
        let expected = (10.0 * 0.4 + 50.0 * 0.3) / (0.4 + 0.3);
        assert!((overall[0].overall_risk_score.unwrap() - expected).abs() < 1e-9);
        assert!((overall[0].overall_risk_score.unwrap() - 25.714285).abs() < 1e-5);
    }

    #[test]
    fn test_overall_risk_no_usable_indicators() {
        let weights = BTreeMap::from([(NET_PROFIT_MARGIN.to_string(), 0.4)]);
        let metrics = vec![scored(NET_PROFIT_MARGIN, None), scored(ROE, Some(85.0))];

        let overall = calculate_overall_risk(&metrics, &weights);
        // roe has a score but no positive weight, npm has weight but no score.
        assert_eq!(overall[0].overall_risk_score, None);
    }

    #[test]
    fn test_overall_risk_groups_sorted() {
        let weights = BTreeMap::from([(NET_PROFIT_MARGIN.to_string(), 1.0)]);
        let mut beta = scored(NET_PROFIT_MARGIN, Some(80.0));
        beta.company_name = "Beta".to_string();
        let mut alpha_2022 = scored(NET_PROFIT_MARGIN, Some(10.0));
        alpha_2022.year = 2022;
        let metrics = vec![beta, scored(NET_PROFIT_MARGIN, Some(50.0)), alpha_2022];

        let overall = calculate_overall_risk(&metrics, &weights);
        assert_eq!(overall[0].company_name, "Alpha");
        assert_eq!(overall[0].year, 2022);
        assert_eq!(overall[1].year, 2023);
        assert_eq!(overall[2].company_name, "Beta");
    }
}
