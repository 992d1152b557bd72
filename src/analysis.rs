use crate::error::{Result, SalesAnalyticsError};
use crate::period::{bucket, Granularity, PeriodKey};
use crate::report::{Cell, ResultTable};
use crate::store::SalesStore;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

pub const DEFAULT_BINS: u32 = 10;

/// Parameters supplied by the caller, already parsed. Analyzers ignore the
/// fields they do not use.
#[derive(Debug, Clone, Default)]
pub struct AnalysisParams {
    /// Exact-match branch filter (monthly sales).
    pub branch: Option<String>,
    /// Exact-match product name (required by price analysis).
    pub product: Option<String>,
    /// Bin count for the sales distribution, defaults to [`DEFAULT_BINS`].
    pub bins: Option<u32>,
}

impl AnalysisParams {
    pub fn for_branch(branch: impl Into<String>) -> Self {
        Self {
            branch: Some(branch.into()),
            ..Self::default()
        }
    }

    pub fn for_product(product: impl Into<String>) -> Self {
        Self {
            product: Some(product.into()),
            ..Self::default()
        }
    }

    pub fn with_bins(bins: u32) -> Self {
        Self {
            bins: Some(bins),
            ..Self::default()
        }
    }
}

/// A pure aggregation operation over the store.
///
/// Analyzers never mutate the store; every implementation is total over a
/// validated store, returning an empty table (never an error) for empty
/// input. Parameter errors are raised before any aggregation work.
pub trait Analyzer {
    fn name(&self) -> &'static str;
    fn analyze(&self, store: &SalesStore, params: &AnalysisParams) -> Result<ResultTable>;
}

/// All analyzers keyed by name, for lookup-by-kind dispatch.
pub fn registry() -> BTreeMap<&'static str, Box<dyn Analyzer>> {
    let analyzers: Vec<Box<dyn Analyzer>> = vec![
        Box::new(MonthlySales),
        Box::new(WeeklySales),
        Box::new(YearlySales),
        Box::new(PriceAnalysis),
        Box::new(ProductPreference),
        Box::new(SalesDistribution),
        Box::new(SummaryStatistics),
    ];
    analyzers.into_iter().map(|a| (a.name(), a)).collect()
}

/// Sums transaction totals per period, network-wide. BTreeMap iteration
/// yields the ascending period order the output contract requires.
fn period_totals<'a>(
    records: impl Iterator<Item = &'a crate::schema::SalesRecord>,
    granularity: Granularity,
) -> BTreeMap<PeriodKey, Decimal> {
    let mut totals: BTreeMap<PeriodKey, Decimal> = BTreeMap::new();
    for record in records {
        *totals.entry(bucket(record.date, granularity)).or_default() += record.total_amount;
    }
    totals
}

/// Sums transaction totals per (period, branch), ordered ascending by
/// period then branch.
fn period_branch_totals(
    store: &SalesStore,
    granularity: Granularity,
) -> BTreeMap<(PeriodKey, String), Decimal> {
    let mut totals: BTreeMap<(PeriodKey, String), Decimal> = BTreeMap::new();
    for record in store.records() {
        *totals
            .entry((bucket(record.date, granularity), record.branch.clone()))
            .or_default() += record.total_amount;
    }
    totals
}

fn period_branch_table(totals: BTreeMap<(PeriodKey, String), Decimal>) -> ResultTable {
    let mut table = ResultTable::new(vec!["period", "branch", "total"]);
    for ((period, branch), total) in totals {
        table.push_row(vec![
            Cell::Text(period.to_string()),
            Cell::Text(branch),
            Cell::Amount(total),
        ]);
    }
    table
}

/// Revenue per calendar month. Grouped by (month, branch), or by month only
/// when an exact-match branch filter is supplied.
pub struct MonthlySales;

impl Analyzer for MonthlySales {
    fn name(&self) -> &'static str {
        "monthly_sales"
    }

    fn analyze(&self, store: &SalesStore, params: &AnalysisParams) -> Result<ResultTable> {
        match params.branch.as_deref() {
            Some(branch) => {
                let totals = period_totals(
                    store.records().iter().filter(|r| r.branch == branch),
                    Granularity::Month,
                );
                let mut table = ResultTable::new(vec!["period", "total"]);
                for (period, total) in totals {
                    table.push_row(vec![Cell::Text(period.to_string()), Cell::Amount(total)]);
                }
                Ok(table)
            }
            None => Ok(period_branch_table(period_branch_totals(
                store,
                Granularity::Month,
            ))),
        }
    }
}

/// Revenue per ISO week across the whole network.
pub struct WeeklySales;

impl Analyzer for WeeklySales {
    fn name(&self) -> &'static str {
        "weekly_sales"
    }

    fn analyze(&self, store: &SalesStore, _params: &AnalysisParams) -> Result<ResultTable> {
        let totals = period_totals(store.records().iter(), Granularity::Week);
        let mut table = ResultTable::new(vec!["period", "total"]);
        for (period, total) in totals {
            table.push_row(vec![Cell::Text(period.to_string()), Cell::Amount(total)]);
        }
        Ok(table)
    }
}

/// Revenue per calendar year and branch.
pub struct YearlySales;

impl Analyzer for YearlySales {
    fn name(&self) -> &'static str {
        "yearly_sales"
    }

    fn analyze(&self, store: &SalesStore, _params: &AnalysisParams) -> Result<ResultTable> {
        Ok(period_branch_table(period_branch_totals(
            store,
            Granularity::Year,
        )))
    }
}

/// Mean unit price for one product. A product with zero matching rows yields
/// an empty table, never a zero-valued placeholder row.
pub struct PriceAnalysis;

impl Analyzer for PriceAnalysis {
    fn name(&self) -> &'static str {
        "price_analysis"
    }

    fn analyze(&self, store: &SalesStore, params: &AnalysisParams) -> Result<ResultTable> {
        let product =
            params
                .product
                .as_deref()
                .ok_or_else(|| SalesAnalyticsError::InvalidParameter {
                    param: "product",
                    details: "price analysis requires a product name".to_string(),
                })?;

        let mut count = 0u64;
        let mut sum = Decimal::ZERO;
        for record in store.records().iter().filter(|r| r.product == product) {
            count += 1;
            sum += record.price;
        }

        let mut table = ResultTable::new(vec!["product", "average_price"]);
        if count > 0 {
            table.push_row(vec![
                Cell::Text(product.to_string()),
                Cell::Amount(sum / Decimal::from(count)),
            ]);
        }
        Ok(table)
    }
}

/// Products ranked by total quantity sold, descending; ties broken by
/// product name ascending.
pub struct ProductPreference;

impl Analyzer for ProductPreference {
    fn name(&self) -> &'static str {
        "product_preference"
    }

    fn analyze(&self, store: &SalesStore, _params: &AnalysisParams) -> Result<ResultTable> {
        let mut quantities: BTreeMap<String, u64> = BTreeMap::new();
        for record in store.records() {
            *quantities.entry(record.product.clone()).or_default() += record.quantity;
        }

        let mut ranked: Vec<(String, u64)> = quantities.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut table = ResultTable::new(vec!["product", "quantity"]);
        for (product, quantity) in ranked {
            table.push_row(vec![Cell::Text(product), Cell::Count(quantity)]);
        }
        Ok(table)
    }
}

/// Histogram of transaction totals over equal-width bins spanning the
/// observed min/max. Membership is half-open `[lo, hi)` except the last bin,
/// which is closed so the maximum is always counted.
pub struct SalesDistribution;

impl Analyzer for SalesDistribution {
    fn name(&self) -> &'static str {
        "sales_distribution"
    }

    fn analyze(&self, store: &SalesStore, params: &AnalysisParams) -> Result<ResultTable> {
        let bins = params.bins.unwrap_or(DEFAULT_BINS);
        if bins == 0 {
            return Err(SalesAnalyticsError::InvalidParameter {
                param: "bins",
                details: "bin count must be a positive integer".to_string(),
            });
        }

        let mut table = ResultTable::new(vec!["range_start", "range_end", "count"]);
        let records = store.records();
        if records.is_empty() {
            return Ok(table);
        }

        let min = records.iter().map(|r| r.total_amount).min().unwrap();
        let max = records.iter().map(|r| r.total_amount).max().unwrap();
        let width = (max - min) / Decimal::from(bins);

        let bin_count = bins as usize;
        let mut counts = vec![0u64; bin_count];
        for record in records {
            // Degenerate range (all totals equal) collapses into the first bin.
            let idx = if width.is_zero() {
                0
            } else {
                ((record.total_amount - min) / width)
                    .floor()
                    .to_usize()
                    .unwrap_or(0)
                    .min(bin_count - 1)
            };
            counts[idx] += 1;
        }

        for (i, count) in counts.iter().enumerate() {
            let lo = min + width * Decimal::from(i as u32);
            let hi = if i == bin_count - 1 {
                max
            } else {
                min + width * Decimal::from(i as u32 + 1)
            };
            table.push_row(vec![
                Cell::Amount(lo),
                Cell::Amount(hi),
                Cell::Count(*count),
            ]);
        }
        Ok(table)
    }
}

/// Descriptive statistics over transaction totals: count, mean, std, min,
/// quartiles, max. The std row is omitted when fewer than two transactions
/// exist (a sample deviation is undefined there).
pub struct SummaryStatistics;

impl Analyzer for SummaryStatistics {
    fn name(&self) -> &'static str {
        "summary_statistics"
    }

    fn analyze(&self, store: &SalesStore, _params: &AnalysisParams) -> Result<ResultTable> {
        let mut table = ResultTable::new(vec!["statistic", "value"]);
        if store.is_empty() {
            return Ok(table);
        }

        let mut totals: Vec<Decimal> = store.records().iter().map(|r| r.total_amount).collect();
        totals.sort();
        let n = totals.len();
        let sum: Decimal = totals.iter().copied().sum();
        let mean = sum / Decimal::from(n as u64);

        table.push_row(vec![
            Cell::Text("count".to_string()),
            Cell::Count(n as u64),
        ]);
        table.push_row(vec![Cell::Text("mean".to_string()), Cell::Amount(mean)]);

        if n >= 2 {
            let mean_f = mean.to_f64().unwrap_or(0.0);
            let variance = totals
                .iter()
                .map(|t| {
                    let d = t.to_f64().unwrap_or(0.0) - mean_f;
                    d * d
                })
                .sum::<f64>()
                / (n as f64 - 1.0);
            let std = Decimal::from_f64(variance.sqrt())
                .unwrap_or_default()
                .round_dp(4);
            table.push_row(vec![Cell::Text("std".to_string()), Cell::Amount(std)]);
        }

        table.push_row(vec![
            Cell::Text("min".to_string()),
            Cell::Amount(totals[0]),
        ]);
        for (label, q) in [("25%", dec!(0.25)), ("50%", dec!(0.5)), ("75%", dec!(0.75))] {
            table.push_row(vec![
                Cell::Text(label.to_string()),
                Cell::Amount(quantile(&totals, q)),
            ]);
        }
        table.push_row(vec![
            Cell::Text("max".to_string()),
            Cell::Amount(totals[n - 1]),
        ]);
        Ok(table)
    }
}

/// Linear interpolation between closest ranks over a sorted slice.
fn quantile(sorted: &[Decimal], q: Decimal) -> Decimal {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = Decimal::from(n as u64 - 1) * q;
    let lower = pos.floor();
    let idx = lower.to_usize().unwrap_or(0);
    let frac = pos - lower;
    if frac.is_zero() || idx + 1 >= n {
        sorted[idx]
    } else {
        sorted[idx] + (sorted[idx + 1] - sorted[idx]) * frac
    }
}
