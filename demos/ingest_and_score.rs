//! Writes the demo data set to CSV files, ingests it from disk, and runs the
//! full indicator + risk scoring pipeline.
//!
//! Run with: `cargo run --example ingest_and_score`

use anyhow::Result;
use statement_risk_analyzer::demo_data::demo_companies;
use statement_risk_analyzer::{
    AnalyzerSettings, FactStore, MetricFilter, MissingValuePolicy, RiskAnalyzer,
};
use std::path::Path;

fn write_demo_csvs(input_dir: &Path) -> Result<()> {
    for (company, sheets) in demo_companies() {
        let company_dir = input_dir.join(&company);
        std::fs::create_dir_all(&company_dir)?;
        for (statement_type, table) in sheets {
            let path = company_dir.join(format!("{}.csv", statement_type));
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let settings = AnalyzerSettings::from_env();

    let input_dir = Path::new(&settings.input_dir);
    write_demo_csvs(input_dir)?;
    println!("Demo statements written to {}", input_dir.display());

    let store = FactStore::open(&settings.db_path)?;
    let mut analyzer = RiskAnalyzer::new(store);

    let ingest = analyzer.ingest_directory(input_dir)?;
    println!("Ingested {} fact rows", ingest.ingested_rows);

    let scoring =
        analyzer.run_scoring(MissingValuePolicy::Warn, &settings.indicator_weights)?;
    println!(
        "Computed {} metric rows ({} warnings)",
        scoring.metric_rows,
        scoring.warnings.len()
    );

    for metric in analyzer.store().query_metrics(&MetricFilter::default())? {
        println!(
            "{} {} {} = {:?} [{} / {:?}]",
            metric.company_name,
            metric.year,
            metric.indicator_name,
            metric.indicator_value,
            metric.risk_level,
            metric.risk_score,
        );
    }

    for overall in analyzer.store().fetch_overall(None)? {
        println!(
            "overall {} {} = {:?}",
            overall.company_name, overall.year, overall.overall_risk_score
        );
    }

    Ok(())
}
