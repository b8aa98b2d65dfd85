//! SQLite persistence for facts, metrics and overall risk.
//!
//! Only this module talks to the database. Facts are append-only; the two
//! derived tables are replaced wholesale inside a single transaction on
//! every scoring run, never partially patched.

use crate::error::Result;
use crate::schema::{Fact, OverallRisk, RiskLevel, ScoredMetric, StatementType};
use log::info;
use rusqlite::{params, params_from_iter, Connection, ToSql};
use std::path::Path;
use std::str::FromStr;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS financial_facts (
    company_name   TEXT NOT NULL,
    statement_type TEXT NOT NULL,
    category       TEXT,
    subject_path   TEXT NOT NULL,
    subject_l1     TEXT,
    subject_l2     TEXT,
    subject_l3     TEXT,
    year           INTEGER NOT NULL,
    amount         REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS metrics_table (
    company_name    TEXT NOT NULL,
    year            INTEGER NOT NULL,
    indicator_name  TEXT NOT NULL,
    indicator_value REAL,
    risk_level      TEXT,
    risk_score      REAL,
    details         TEXT
);
CREATE TABLE IF NOT EXISTS overall_risk (
    company_name       TEXT NOT NULL,
    year               INTEGER NOT NULL,
    overall_risk_score REAL
);
";

/// Equality filters for fact queries, plus a prefix match on subject_path.
#[derive(Debug, Clone, Default)]
pub struct FactFilter {
    pub company: Option<String>,
    pub year: Option<i32>,
    pub statement_type: Option<StatementType>,
    pub subject_prefix: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MetricFilter {
    pub company: Option<String>,
    pub year: Option<i32>,
    pub indicator: Option<String>,
}

pub struct FactStore {
    conn: Connection,
}

impl FactStore {
    /// Open (or create) the analysis database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Append fact rows and return how many were written.
    pub fn ingest_facts(&mut self, facts: &[Fact]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO financial_facts
                 (company_name, statement_type, category, subject_path,
                  subject_l1, subject_l2, subject_l3, year, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for fact in facts {
                stmt.execute(params![
                    fact.company_name,
                    fact.statement_type.as_str(),
                    fact.category,
                    fact.subject_path,
                    fact.subject_l1,
                    fact.subject_l2,
                    fact.subject_l3,
                    fact.year,
                    fact.amount,
                ])?;
            }
        }
        tx.commit()?;
        info!("Ingested {} fact rows", facts.len());
        Ok(facts.len())
    }

    /// Replace both derived tables atomically: delete everything, insert the
    /// new rows, commit once. Concurrent writers must still serialize runs.
    pub fn replace_metrics(
        &mut self,
        metrics: &[ScoredMetric],
        overall: &[OverallRisk],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM metrics_table", [])?;
        tx.execute("DELETE FROM overall_risk", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO metrics_table
                 (company_name, year, indicator_name, indicator_value,
                  risk_level, risk_score, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for metric in metrics {
                stmt.execute(params![
                    metric.company_name,
                    metric.year,
                    metric.indicator_name,
                    metric.indicator_value,
                    metric.risk_level.as_str(),
                    metric.risk_score,
                    serde_json::to_string(&metric.details)?,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO overall_risk (company_name, year, overall_risk_score)
                 VALUES (?1, ?2, ?3)",
            )?;
            for row in overall {
                stmt.execute(params![row.company_name, row.year, row.overall_risk_score])?;
            }
        }
        tx.commit()?;
        info!(
            "Replaced derived tables: {} metric rows, {} overall rows",
            metrics.len(),
            overall.len()
        );
        Ok(())
    }

    pub fn fetch_facts(&self, filter: &FactFilter) -> Result<Vec<Fact>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(company) = &filter.company {
            clauses.push("company_name = ?");
            values.push(Box::new(company.clone()));
        }
        if let Some(year) = filter.year {
            clauses.push("year = ?");
            values.push(Box::new(year));
        }
        if let Some(statement_type) = filter.statement_type {
            clauses.push("statement_type = ?");
            values.push(Box::new(statement_type.as_str()));
        }
        if let Some(prefix) = &filter.subject_prefix {
            clauses.push("subject_path LIKE ?");
            values.push(Box::new(format!("{}%", prefix)));
        }

        let query = format!(
            "SELECT company_name, statement_type, category, subject_path,
                    subject_l1, subject_l2, subject_l3, year, amount
             FROM financial_facts {} ORDER BY subject_path",
            where_clause(&clauses)
        );

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(values.iter().map(|v| v.as_ref())), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, i32>(7)?,
                row.get::<_, f64>(8)?,
            ))
        })?;

        let mut facts = Vec::new();
        for row in rows {
            let (company_name, statement_type, category, subject_path, l1, l2, l3, year, amount) =
                row?;
            facts.push(Fact {
                company_name,
                statement_type: StatementType::from_str(&statement_type)?,
                category: category.unwrap_or_default(),
                subject_path,
                subject_l1: l1.unwrap_or_default(),
                subject_l2: l2.unwrap_or_default(),
                subject_l3: l3.unwrap_or_default(),
                year,
                amount,
            });
        }
        Ok(facts)
    }

    pub fn query_metrics(&self, filter: &MetricFilter) -> Result<Vec<ScoredMetric>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(company) = &filter.company {
            clauses.push("company_name = ?");
            values.push(Box::new(company.clone()));
        }
        if let Some(year) = filter.year {
            clauses.push("year = ?");
            values.push(Box::new(year));
        }
        if let Some(indicator) = &filter.indicator {
            clauses.push("indicator_name = ?");
            values.push(Box::new(indicator.clone()));
        }

        let query = format!(
            "SELECT company_name, year, indicator_name, indicator_value,
                    risk_level, risk_score, details
             FROM metrics_table {} ORDER BY company_name, year",
            where_clause(&clauses)
        );

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(values.iter().map(|v| v.as_ref())), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut metrics = Vec::new();
        for row in rows {
            let (company_name, year, indicator_name, indicator_value, level, risk_score, details) =
                row?;
            metrics.push(ScoredMetric {
                company_name,
                year,
                indicator_name,
                indicator_value,
                details: serde_json::from_str(&details)?,
                risk_level: RiskLevel::from_str(&level)?,
                risk_score,
            });
        }
        Ok(metrics)
    }

    pub fn fetch_overall(&self, company: Option<&str>) -> Result<Vec<OverallRisk>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(company) = company {
            clauses.push("company_name = ?");
            values.push(Box::new(company.to_string()));
        }

        let query = format!(
            "SELECT company_name, year, overall_risk_score
             FROM overall_risk {} ORDER BY company_name, year",
            where_clause(&clauses)
        );

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(values.iter().map(|v| v.as_ref())), |row| {
            Ok(OverallRisk {
                company_name: row.get(0)?,
                year: row.get(1)?,
                overall_risk_score: row.get(2)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn fetch_companies(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT company_name FROM financial_facts ORDER BY company_name")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn fetch_years(&self) -> Result<Vec<i32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT year FROM financial_facts ORDER BY year")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}

fn where_clause(clauses: &[&str]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}
