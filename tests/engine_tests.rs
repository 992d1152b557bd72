use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sales_analytics::{
    run_analysis, AnalysisParams, Analyzer, Cell, MonthlySales, ProductPreference, SalesDistribution,
    SalesRecord, SalesStore, WeeklySales, YearlySales,
};
use std::io::Cursor;

const NETWORK_CSV: &str = "\
Date,Branch,Product,Quantity,Price,Total_Amount
2024-01-05,Colombo,Rice,10,2.50,25.00
2024-01-06,Colombo,Flour,4,1.75,7.00
2024-01-08,Kandy,Rice,6,2.50,15.00
2024-01-29,Kandy,Sugar,3,3.00,9.00
2024-02-02,Colombo,Rice,8,2.60,20.80
2024-02-14,Galle,Tea,12,4.00,48.00
2024-03-01,Galle,Rice,5,2.40,12.00
2024-12-30,Colombo,Tea,2,4.00,8.00
2025-01-02,Kandy,Flour,7,1.80,12.60
";

fn network_store() -> SalesStore {
    SalesStore::from_reader(Cursor::new(NETWORK_CSV)).expect("fixture CSV should load")
}

fn amount(cell: &Cell) -> Decimal {
    match cell {
        Cell::Amount(d) => *d,
        other => panic!("expected amount cell, got {:?}", other),
    }
}

fn count(cell: &Cell) -> u64 {
    match cell {
        Cell::Count(n) => *n,
        other => panic!("expected count cell, got {:?}", other),
    }
}

fn text(cell: &Cell) -> &str {
    match cell {
        Cell::Text(s) => s,
        other => panic!("expected text cell, got {:?}", other),
    }
}

#[test]
fn monthly_weekly_and_yearly_totals_reconcile() -> Result<()> {
    let store = network_store();
    let grand: Decimal = store.records().iter().map(|r| r.total_amount).sum();

    let params = AnalysisParams::default();
    let monthly = MonthlySales.analyze(&store, &params)?;
    let weekly = WeeklySales.analyze(&store, &params)?;
    let yearly = YearlySales.analyze(&store, &params)?;

    let monthly_sum: Decimal = monthly.rows().iter().map(|r| amount(&r[2])).sum();
    let weekly_sum: Decimal = weekly.rows().iter().map(|r| amount(&r[1])).sum();
    let yearly_sum: Decimal = yearly.rows().iter().map(|r| amount(&r[2])).sum();

    assert_eq!(monthly_sum, grand);
    assert_eq!(weekly_sum, grand);
    assert_eq!(yearly_sum, grand);
    Ok(())
}

#[test]
fn weekly_buckets_cross_year_boundary_consistently() -> Result<()> {
    // 2024-12-30 and 2025-01-02 fall in the same ISO week (2025-W01), so the
    // weekly report must merge them into a single row.
    let store = network_store();
    let weekly = WeeklySales.analyze(&store, &AnalysisParams::default())?;
    let row = weekly
        .rows()
        .iter()
        .find(|r| text(&r[0]) == "2025-W01")
        .expect("cross-boundary week should be present");
    assert_eq!(amount(&row[1]), dec!(20.60));
    Ok(())
}

#[test]
fn product_preference_is_sorted_with_ties_by_name() -> Result<()> {
    let store = network_store();
    let table = ProductPreference.analyze(&store, &AnalysisParams::default())?;

    let rows: Vec<(String, u64)> = table
        .rows()
        .iter()
        .map(|r| (text(&r[0]).to_string(), count(&r[1])))
        .collect();
    for pair in rows.windows(2) {
        assert!(
            pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0),
            "rows out of order: {:?} then {:?}",
            pair[0],
            pair[1]
        );
    }
    // Rice: 10 + 6 + 8 + 5 = 29 units, the clear network favourite.
    assert_eq!(rows[0], ("Rice".to_string(), 29));
    Ok(())
}

#[test]
fn distribution_counts_cover_every_transaction() -> Result<()> {
    let store = network_store();
    for bins in [1, 2, 5, 10] {
        let table = SalesDistribution.analyze(&store, &AnalysisParams::with_bins(bins))?;
        assert_eq!(table.len(), bins as usize);
        let counted: u64 = table.rows().iter().map(|r| count(&r[2])).sum();
        assert_eq!(counted, store.len() as u64, "bins={}", bins);
    }
    Ok(())
}

#[test]
fn save_and_reload_preserves_the_record_set() -> Result<()> {
    let mut store = network_store();
    store.append(SalesRecord::new(
        chrono::NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        "Colombo",
        "Sugar",
        2,
        dec!(3.10),
        dec!(6.20),
    )?)?;

    let mut buffer = Vec::new();
    store.write_to(&mut buffer)?;
    let reloaded = SalesStore::from_reader(Cursor::new(buffer))?;

    let key = |r: &SalesRecord| {
        (
            r.date,
            r.branch.clone(),
            r.product.clone(),
            r.quantity,
            r.price,
            r.total_amount,
        )
    };
    let mut original: Vec<_> = store.records().iter().map(key).collect();
    let mut round_tripped: Vec<_> = reloaded.records().iter().map(key).collect();
    original.sort();
    round_tripped.sort();
    assert_eq!(original, round_tripped);
    Ok(())
}

#[test]
fn rendered_report_lists_every_row_once_in_table_order() -> Result<()> {
    let store = network_store();
    let table = MonthlySales.analyze(&store, &AnalysisParams::default())?;
    let rendered = run_analysis(&store, "monthly_sales", &AnalysisParams::default())?;

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 2 + table.len());
    for (row, line) in table.rows().iter().zip(&lines[2..]) {
        assert!(
            line.starts_with(text(&row[0])),
            "row {:?} not rendered in order on line '{}'",
            row,
            line
        );
    }
    Ok(())
}

#[test]
fn failed_load_degrades_to_empty_reports() -> Result<()> {
    let store = SalesStore::load_or_empty("no/such/file.csv");
    assert!(store.is_empty());

    for kind in [
        "monthly_sales",
        "weekly_sales",
        "yearly_sales",
        "product_preference",
        "sales_distribution",
        "summary_statistics",
    ] {
        let rendered = run_analysis(&store, kind, &AnalysisParams::default())?;
        assert!(rendered.contains("(no rows)"), "kind={}", kind);
    }
    Ok(())
}

#[test]
fn branch_filtered_monthly_report_matches_expected_series() -> Result<()> {
    let store = network_store();
    let table = MonthlySales.analyze(&store, &AnalysisParams::for_branch("Colombo"))?;

    let rows: Vec<(String, Decimal)> = table
        .rows()
        .iter()
        .map(|r| (text(&r[0]).to_string(), amount(&r[1])))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2024-01".to_string(), dec!(32.00)),
            ("2024-02".to_string(), dec!(20.80)),
            ("2024-12".to_string(), dec!(8.00)),
        ]
    );
    Ok(())
}
