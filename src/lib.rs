//! # Statement Risk Analyzer
//!
//! Ingests spreadsheet financial statements for a set of companies,
//! normalizes heterogeneous subject/category layouts into flat facts,
//! computes a small set of financial indicators, and scores them against
//! fixed risk thresholds.
//!
//! ## Pipeline
//!
//! raw statement tables → subject parser → normalizer → fact table →
//! indicator calculator → metric table → risk scorer → scored metrics +
//! overall risk. Ranking and drilldown operate read-only on the results.
//!
//! ## Example
//!
//! ```rust,ignore
//! use statement_risk_analyzer::*;
//!
//! let store = FactStore::open("data/finance.db")?;
//! let mut analyzer = RiskAnalyzer::new(store);
//! analyzer.ingest_directory("data/input".as_ref())?;
//!
//! let settings = AnalyzerSettings::from_env();
//! let outcome = analyzer.run_scoring(
//!     settings.missing_value_policy,
//!     &settings.indicator_weights,
//! )?;
//! println!("{} metric rows, {} warnings", outcome.metric_rows, outcome.warnings.len());
//! ```

pub mod config;
pub mod demo_data;
pub mod error;
pub mod indicators;
pub mod ingest;
pub mod normalizer;
pub mod ranking;
pub mod schema;
pub mod scoring;
pub mod store;
pub mod subject;

pub use config::AnalyzerSettings;
pub use error::{AnalysisError, Result};
pub use indicators::{calculate_indicators, IndicatorConfig, IndicatorResult};
pub use ingest::{read_company_dir, read_input_dir, read_statement_csv};
pub use normalizer::{normalize_statement, NormalizeResult};
pub use ranking::{drilldown_facts, top_n_companies, RankOrder};
pub use schema::*;
pub use scoring::{apply_scoring, calculate_overall_risk, score_indicator, RiskRule, RiskRules};
pub use store::{FactFilter, FactStore, MetricFilter};
pub use subject::{parse_subjects, SubjectParseResult};

use log::info;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub ingested_rows: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    pub metric_rows: usize,
    pub warnings: Vec<String>,
}

/// Pipeline facade: ingestion commits facts, scoring fully replaces the
/// derived tables. The two steps commit independently, so a scoring failure
/// never disturbs already-ingested facts.
pub struct RiskAnalyzer {
    store: FactStore,
    indicator_config: IndicatorConfig,
    risk_rules: RiskRules,
}

impl RiskAnalyzer {
    pub fn new(store: FactStore) -> Self {
        Self {
            store,
            indicator_config: IndicatorConfig::default(),
            risk_rules: RiskRules::default(),
        }
    }

    /// Override the keyword and threshold tables for this analyzer instance.
    pub fn with_rules(
        store: FactStore,
        indicator_config: IndicatorConfig,
        risk_rules: RiskRules,
    ) -> Self {
        Self {
            store,
            indicator_config,
            risk_rules,
        }
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Normalize and persist the statement sheets of one company.
    pub fn ingest_sheets(
        &mut self,
        company_name: &str,
        sheets: &BTreeMap<StatementType, RawTable>,
    ) -> Result<IngestOutcome> {
        let mut outcome = IngestOutcome::default();
        let mut facts = Vec::new();
        for (statement_type, table) in sheets {
            let normalized = normalize_statement(company_name, *statement_type, table)?;
            facts.extend(normalized.facts);
            outcome.warnings.extend(normalized.warnings);
        }
        outcome.ingested_rows = self.store.ingest_facts(&facts)?;
        Ok(outcome)
    }

    /// Ingest every company subdirectory under `input_dir`.
    pub fn ingest_directory(&mut self, input_dir: &Path) -> Result<IngestOutcome> {
        let companies = read_input_dir(input_dir)?;
        if companies.is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "No company directories found for ingestion.".to_string(),
            ));
        }

        let mut outcome = IngestOutcome::default();
        for (company_name, sheets) in &companies {
            let company_outcome = self.ingest_sheets(company_name, sheets)?;
            outcome.ingested_rows += company_outcome.ingested_rows;
            outcome.warnings.extend(company_outcome.warnings);
        }
        info!(
            "Ingested {} fact rows from {} companies",
            outcome.ingested_rows,
            companies.len()
        );
        Ok(outcome)
    }

    /// Recompute all indicators, score them, derive overall risk, and swap
    /// the derived tables. Nothing is persisted if any step fails.
    pub fn run_scoring(
        &mut self,
        policy: MissingValuePolicy,
        weights: &BTreeMap<String, f64>,
    ) -> Result<ScoringOutcome> {
        let facts = self.store.fetch_facts(&FactFilter::default())?;
        if facts.is_empty() {
            return Err(AnalysisError::ValidationError(
                "No facts found. Run ingest first.".to_string(),
            ));
        }

        let indicator_result = calculate_indicators(&facts, &self.indicator_config, policy)?;
        let scored = apply_scoring(indicator_result.metrics, &self.risk_rules);
        let overall = calculate_overall_risk(&scored, weights);
        self.store.replace_metrics(&scored, &overall)?;

        Ok(ScoringOutcome {
            metric_rows: scored.len(),
            warnings: indicator_result.warnings,
        })
    }

    /// Top-n ranking over the persisted metric table.
    pub fn rank(
        &self,
        indicator: &str,
        year: i32,
        n: usize,
        order: RankOrder,
    ) -> Result<Vec<ScoredMetric>> {
        let metrics = self.store.query_metrics(&MetricFilter::default())?;
        if metrics.is_empty() {
            return Err(AnalysisError::ValidationError(
                "No metrics found. Run scoring first.".to_string(),
            ));
        }
        Ok(top_n_companies(&metrics, indicator, year, n, order))
    }

    /// Drilldown into persisted facts under a subject-path prefix.
    pub fn drilldown(
        &self,
        company: &str,
        year: i32,
        statement_type: StatementType,
        subject_prefix: &str,
    ) -> Result<Vec<Fact>> {
        let facts = self.store.fetch_facts(&FactFilter::default())?;
        Ok(drilldown_facts(
            &facts,
            company,
            year,
            statement_type,
            subject_prefix,
        ))
    }
}
