//! Runs the pipeline in memory and prints a ranking plus a drilldown.
//!
//! Run with: `cargo run --example rank_report`

use anyhow::Result;
use statement_risk_analyzer::demo_data::demo_companies;
use statement_risk_analyzer::indicators::NET_PROFIT_MARGIN;
use statement_risk_analyzer::{
    AnalyzerSettings, FactStore, MissingValuePolicy, RankOrder, RiskAnalyzer, StatementType,
};

fn main() -> Result<()> {
    env_logger::init();

    let mut analyzer = RiskAnalyzer::new(FactStore::in_memory()?);
    for (company, sheets) in demo_companies() {
        analyzer.ingest_sheets(&company, &sheets)?;
    }

    let settings = AnalyzerSettings::default();
    analyzer.run_scoring(MissingValuePolicy::Warn, &settings.indicator_weights)?;

    println!("Top companies by net profit margin, 2023:");
    for (rank, metric) in analyzer
        .rank(NET_PROFIT_MARGIN, 2023, 5, RankOrder::Desc)?
        .iter()
        .enumerate()
    {
        println!(
            "  {}. {} = {:.4} ({})",
            rank + 1,
            metric.company_name,
            metric.indicator_value.unwrap_or(f64::NAN),
            metric.risk_level,
        );
    }

    let company = &analyzer.store().fetch_companies()?[0];
    println!("\nBalance sheet assets for {}, 2023:", company);
    for fact in analyzer.drilldown(company, 2023, StatementType::BalanceSheet, "资产")? {
        println!("  {} = {:.2}", fact.subject_path, fact.amount);
    }

    Ok(())
}
