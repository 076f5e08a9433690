//! Plain-text tables for the dashboard views

use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use dalal_market::engine::{
    CapitalStructure, ComparisonView, FinancialsReport, IndexOverview, PeriodChange, PriceReport,
    PriceView, SymbolView,
};
use dalal_market::models::quote::format_number;
use dalal_market::{FetchFailure, FinancialStatement, PortfolioSelection};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn number(value: Option<f64>) -> Cell {
    Cell::new(value.map(format_number).unwrap_or_else(|| "—".to_string()))
        .set_alignment(CellAlignment::Right)
}

fn signed_percent(value: Option<f64>) -> Cell {
    Cell::new(value.map_or_else(|| "—".to_string(), |v| format!("{v:+.2}%")))
        .set_alignment(CellAlignment::Right)
}

pub fn selection_notes(selection: &PortfolioSelection) {
    for error in &selection.unresolved {
        eprintln!("error: {error}");
    }
    if let Some(notice) = &selection.truncated {
        eprintln!("warning: {notice}");
    }
}

fn failures(failures: &[FetchFailure]) {
    for failure in failures {
        eprintln!("error: {failure}");
    }
    if !failures.is_empty() {
        eprintln!("hint: rerun with --retry-failed to fetch failed requests again");
    }
}

pub fn price_report(report: &PriceReport, rows: usize) {
    match &report.view {
        Some(PriceView::Single(view)) => single_view(view, rows),
        Some(PriceView::Comparison(view)) => comparison_view(view, rows),
        None => {}
    }
    failures(&report.failures);
}

fn single_view(view: &SymbolView, rows: usize) {
    let info = &view.info;
    println!("Security: {} ({})", view.name(), view.symbol);
    println!(
        "Current price: {} {}  change {} ({})",
        info.price().map_or_else(|| "—".to_string(), format_number),
        info.currency_or_default(),
        info.regular_market_change
            .map_or_else(|| "—".to_string(), |v| format!("{v:+.2}")),
        info.change_percent()
            .map_or_else(|| "—".to_string(), |v| format!("{v:+.2}%")),
    );

    let mut details = table();
    details.set_header(vec!["Feature", "Value"]);
    for (label, value) in info.to_table() {
        details.add_row(vec![label.to_string(), value]);
    }
    println!("{details}");

    let series = &view.series;
    let mut header = vec![
        "Date".to_string(),
        "Open".to_string(),
        "High".to_string(),
        "Low".to_string(),
        "Close".to_string(),
        "Volume".to_string(),
    ];
    header.extend(series.columns().iter().map(|column| column.name.clone()));

    let mut data = table();
    data.set_header(header);
    let start = series.len().saturating_sub(rows);
    for (idx, bar) in series.bars().iter().enumerate().skip(start) {
        let mut row = vec![
            Cell::new(bar.timestamp.format("%Y-%m-%d %H:%M")),
            number(Some(bar.open)),
            number(Some(bar.high)),
            number(Some(bar.low)),
            number(Some(bar.close)),
            number(bar.volume),
        ];
        row.extend(
            series
                .columns()
                .iter()
                .map(|column| number(column.values.get(idx).copied().flatten())),
        );
        data.add_row(row);
    }
    println!("{data}");

    summary_table(&[(view.symbol.to_string(), view.summary.as_slice())]);
}

fn comparison_view(view: &ComparisonView, rows: usize) {
    println!("Comparative view");

    let mut details = table();
    let mut header = vec!["Feature".to_string()];
    header.extend(view.infos.iter().map(|(symbol, _)| symbol.to_string()));
    details.set_header(header);
    for label in ["Name", "Price", "Change %", "Market cap", "Sector"] {
        let mut row = vec![Cell::new(label)];
        for (_, info) in &view.infos {
            let value = info
                .to_table()
                .into_iter()
                .find(|(feature, _)| *feature == label)
                .map_or_else(|| "—".to_string(), |(_, value)| value);
            row.push(Cell::new(value));
        }
        details.add_row(row);
    }
    println!("{details}");

    let table_data = &view.table;
    let mut normalized = table();
    let mut header = vec!["Date".to_string()];
    header.extend(table_data.columns.iter().map(|column| format!("{} %", column.name)));
    normalized.set_header(header);
    let start = table_data.timestamps.len().saturating_sub(rows);
    for (idx, timestamp) in table_data.timestamps.iter().enumerate().skip(start) {
        let mut row = vec![Cell::new(timestamp.format("%Y-%m-%d %H:%M"))];
        row.extend(
            table_data
                .columns
                .iter()
                .map(|column| signed_percent(column.values.get(idx).copied().flatten())),
        );
        normalized.add_row(row);
    }
    println!("{normalized}");

    let summaries: Vec<(String, &[PeriodChange])> = view
        .summaries
        .iter()
        .map(|(symbol, summary)| (symbol.to_string(), summary.as_slice()))
        .collect();
    summary_table(&summaries);
}

fn summary_table(summaries: &[(String, &[PeriodChange])]) {
    let Some((_, first)) = summaries.iter().find(|(_, summary)| !summary.is_empty()) else {
        return;
    };

    let mut performance = table();
    let mut header = vec!["Symbol".to_string()];
    header.extend(first.iter().map(|change| change.label.clone()));
    performance.set_header(header);
    for (symbol, summary) in summaries {
        let mut row = vec![Cell::new(symbol)];
        row.extend(
            first
                .iter()
                .map(|column| {
                    summary
                        .iter()
                        .find(|change| change.fraction == column.fraction)
                        .map(|change| change.change_percent)
                })
                .map(signed_percent),
        );
        performance.add_row(row);
    }
    println!("{performance}");
}

pub fn index_overview(overview: &IndexOverview) {
    println!("Indian indices overview");
    let mut levels = table();
    levels.set_header(vec!["Index", "Code", "Level", "Change"]);
    for snapshot in &overview.snapshots {
        levels.add_row(vec![
            Cell::new(&snapshot.name),
            Cell::new(&snapshot.code),
            number(snapshot.price),
            signed_percent(snapshot.change_percent),
        ]);
    }
    println!("{levels}");

    let mut trends = table();
    trends.set_header(vec!["Code", "From", "To", "First close", "Last close", "Change"]);
    for series in &overview.trends {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            continue;
        };
        let change = (first.close != 0.0).then(|| (last.close / first.close - 1.0) * 100.0);
        trends.add_row(vec![
            Cell::new(series.symbol()),
            Cell::new(first.timestamp.format("%Y-%m-%d")),
            Cell::new(last.timestamp.format("%Y-%m-%d")),
            number(Some(first.close)),
            number(Some(last.close)),
            signed_percent(change),
        ]);
    }
    println!("{trends}");

    failures(&overview.failures);
}

pub fn financials(report: &FinancialsReport) {
    println!(
        "{} ({}) {} figures in {}",
        report.name, report.symbol, report.frequency, report.currency
    );

    if !report.capital_structure.is_empty() {
        capital_structure(&report.capital_structure);
    }
    for statement in report.statements() {
        statement_table(statement);
    }

    failures(&report.failures);
}

fn capital_structure(rows: &[CapitalStructure]) {
    println!("Capital structure");
    let mut capital = table();
    capital.set_header(vec!["Period", "Total debt", "Equity", "Total capital", "Debt/Equity"]);
    for row in rows {
        capital.add_row(vec![
            Cell::new(row.period),
            number(row.total_debt),
            number(row.equity),
            number(row.total_capital),
            number(row.debt_to_equity),
        ]);
    }
    println!("{capital}");
}

fn period_header(periods: &[NaiveDate]) -> Vec<String> {
    std::iter::once("Item".to_string())
        .chain(periods.iter().rev().map(ToString::to_string))
        .collect()
}

/// Most recent period first, like a filed statement
fn statement_table(statement: &FinancialStatement) {
    println!("{}", capitalize(statement.kind.label()));
    let mut rows = table();
    rows.set_header(period_header(&statement.periods));
    for item in &statement.items {
        let mut row = vec![Cell::new(&item.name)];
        row.extend(item.values.iter().rev().map(|value| number(*value)));
        rows.add_row(row);
    }
    println!("{rows}");
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
