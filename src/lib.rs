//! # Sales Analytics
//!
//! A library for turning a flat table of retail sales transactions into a
//! fixed catalogue of aggregate reports: time-bucketed revenue trends
//! (weekly/monthly/yearly, overall and per branch), per-product average
//! price, product popularity ranking by volume, and a binned distribution of
//! transaction totals.
//!
//! ## Core Concepts
//!
//! - **SalesStore**: owns the in-memory table of transactions; loaded once
//!   from CSV (or an in-memory collection), optionally appended to and saved
//!   back. A failed load degrades to an empty store so every analysis still
//!   runs and returns an empty report.
//! - **PeriodKey**: a calendar-aligned grouping key (ISO week, month, year)
//!   derived from a transaction date, never persisted.
//! - **Analyzer**: a pure aggregation operation over the store producing a
//!   [`ResultTable`]; all analyzers are registered by name and dispatched
//!   through [`run_analysis`].
//! - **ResultTable**: the uniform output shape — named columns plus rows in
//!   an order that is part of each analyzer's contract.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_analytics::{run_analysis, AnalysisParams, SalesStore};
//!
//! let store = SalesStore::load_or_empty("sales_data.csv");
//!
//! let report = run_analysis(
//!     &store,
//!     "monthly_sales",
//!     &AnalysisParams::for_branch("BranchA"),
//! )?;
//! println!("{}", report);
//! ```

pub mod analysis;
pub mod error;
pub mod period;
pub mod report;
pub mod schema;
pub mod store;

pub use analysis::{
    registry, AnalysisParams, Analyzer, MonthlySales, PriceAnalysis, ProductPreference,
    SalesDistribution, SummaryStatistics, WeeklySales, YearlySales, DEFAULT_BINS,
};
pub use error::{Result, SalesAnalyticsError};
pub use period::{bucket, Granularity, PeriodKey};
pub use report::{render, Cell, ResultTable};
pub use schema::SalesRecord;
pub use store::SalesStore;

use log::{debug, info};

/// Runs the named analysis over the store and renders its result table.
///
/// This is the entry point external collaborators (menus, CLIs) call with
/// already-parsed parameters; the engine never reads interactive input.
/// Unknown names fail with [`SalesAnalyticsError::UnknownAnalysis`].
pub fn run_analysis(store: &SalesStore, kind: &str, params: &AnalysisParams) -> Result<String> {
    let analyzers = registry();
    let analyzer = analyzers
        .get(kind)
        .ok_or_else(|| SalesAnalyticsError::UnknownAnalysis(kind.to_string()))?;

    info!("running {} over {} records", kind, store.len());
    let table = analyzer.analyze(store, params)?;
    debug!("{} produced {} rows", kind, table.len());

    Ok(render(&table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_store() -> SalesStore {
        let records = vec![
            SalesRecord::new(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                "BranchA",
                "Widget",
                2,
                dec!(10),
                dec!(20),
            )
            .unwrap(),
            SalesRecord::new(
                NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                "BranchA",
                "Widget",
                1,
                dec!(10),
                dec!(10),
            )
            .unwrap(),
        ];
        SalesStore::from_records(records).unwrap()
    }

    #[test]
    fn test_run_analysis_monthly_scenario() {
        let store = sample_store();
        let text = run_analysis(
            &store,
            "monthly_sales",
            &AnalysisParams::for_branch("BranchA"),
        )
        .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[2].contains("2024-01") && lines[2].contains("20"));
        assert!(lines[3].contains("2024-02") && lines[3].contains("10"));
    }

    #[test]
    fn test_run_analysis_unknown_kind() {
        let store = sample_store();
        let result = run_analysis(&store, "quarterly_sales", &AnalysisParams::default());
        match result {
            Err(SalesAnalyticsError::UnknownAnalysis(kind)) => {
                assert_eq!(kind, "quarterly_sales")
            }
            other => panic!("expected UnknownAnalysis, got {:?}", other),
        }
    }

    #[test]
    fn test_run_analysis_on_empty_store_renders_empty_report() {
        let store = SalesStore::new();
        let text = run_analysis(&store, "weekly_sales", &AnalysisParams::default()).unwrap();
        assert!(text.contains("(no rows)"));
    }
}
