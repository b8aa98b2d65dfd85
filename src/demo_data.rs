//! Synthetic statement data for demos and integration tests.
//!
//! Mirrors the layout real statement uploads arrive in: wide-shape tables
//! with explicit level columns, three companies across three years, with a
//! little gaussian noise so ranking output is not degenerate.

use crate::schema::{RawTable, StatementType};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;

pub const DEMO_COMPANIES: [&str; 3] = ["星河科技", "海岭能源", "远航制造"];
pub const DEMO_YEARS: [i32; 3] = [2021, 2022, 2023];

fn wide_table(
    levels: &[(&str, &str, &str)],
    amounts: impl Fn(usize, i32) -> f64,
) -> RawTable {
    let mut headers = vec![
        "subject_l1".to_string(),
        "subject_l2".to_string(),
        "subject_l3".to_string(),
    ];
    headers.extend(DEMO_YEARS.iter().map(|year| year.to_string()));

    let rows = levels
        .iter()
        .enumerate()
        .map(|(idx, (l1, l2, l3))| {
            let mut row = vec![l1.to_string(), l2.to_string(), l3.to_string()];
            row.extend(
                DEMO_YEARS
                    .iter()
                    .map(|year| format!("{:.2}", amounts(idx, *year))),
            );
            row
        })
        .collect();

    RawTable::new(headers, rows)
}

fn noise(rng: &mut StdRng, spread: f64) -> f64 {
    // Zero-mean jitter; spread stays small relative to the base amounts.
    Normal::new(0.0, spread)
        .map(|normal| normal.sample(rng))
        .unwrap_or(0.0)
}

fn build_balance_sheet(seed: u64) -> RawTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let bases = [5000.0, 12000.0, 4000.0, 5000.0, 8000.0];
    let growth = [100.0, 200.0, 80.0, 120.0, 150.0];
    let per_company = [200.0, 300.0, 150.0, 180.0, 220.0];
    let jitter: Vec<f64> = (0..bases.len()).map(|_| noise(&mut rng, 50.0)).collect();

    wide_table(
        &[
            ("资产", "流动资产", "货币资金"),
            ("资产", "非流动资产", "固定资产"),
            ("负债", "流动负债", "短期借款"),
            ("负债", "非流动负债", "长期借款"),
            ("所有者权益", "", ""),
        ],
        move |idx, year| {
            bases[idx]
                + per_company[idx] * seed as f64
                + growth[idx] * (year - DEMO_YEARS[0]) as f64
                + jitter[idx]
        },
    )
}

fn build_income_statement(seed: u64) -> RawTable {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let jitter: Vec<f64> = (0..3).map(|_| noise(&mut rng, 80.0)).collect();

    wide_table(
        &[
            ("收入", "营业收入", ""),
            ("成本", "营业成本", ""),
            ("费用", "销售费用", ""),
            ("利润", "净利润", ""),
        ],
        move |idx, year| {
            let step = (year - DEMO_YEARS[0]) as f64;
            let revenue = 20000.0 + seed as f64 * 500.0 + step * 600.0 + jitter[0];
            let cost = 12000.0 + seed as f64 * 300.0 + step * 400.0 + jitter[1];
            let expense = 2000.0 + seed as f64 * 100.0 + step * 80.0 + jitter[2];
            match idx {
                0 => revenue,
                1 => cost,
                2 => expense,
                _ => revenue - cost - expense,
            }
        },
    )
}

fn build_cash_flow(seed: u64) -> RawTable {
    wide_table(
        &[
            ("经营活动", "经营现金流", ""),
            ("投资活动", "投资现金流", ""),
            ("筹资活动", "筹资现金流", ""),
        ],
        move |idx, year| {
            let step = (year - DEMO_YEARS[0]) as f64;
            match idx {
                0 => 3000.0 + seed as f64 * 120.0 + step * 90.0,
                1 => -1500.0 - seed as f64 * 80.0 - step * 50.0,
                _ => 800.0 + seed as f64 * 60.0 + step * 30.0,
            }
        },
    )
}

/// All three statement sheets for the demo company at `seed` (1-based).
pub fn demo_company_sheets(seed: u64) -> BTreeMap<StatementType, RawTable> {
    BTreeMap::from([
        (StatementType::BalanceSheet, build_balance_sheet(seed)),
        (StatementType::IncomeStatement, build_income_statement(seed)),
        (StatementType::CashFlow, build_cash_flow(seed)),
    ])
}

/// (company, sheets) pairs for the whole demo data set.
pub fn demo_companies() -> Vec<(String, BTreeMap<StatementType, RawTable>)> {
    DEMO_COMPANIES
        .iter()
        .enumerate()
        .map(|(idx, company)| (company.to_string(), demo_company_sheets(idx as u64 + 1)))
        .collect()
}
