//! HTML rendering for the dashboard page and the error page.

use crate::dashboard::Dashboard;
use crate::error::{Error, ErrorType, IntoResult};
use crate::render::charts::{self, Palette, CHART_SIZE};
use crate::render::format::stat;
use crate::stats::ColumnStats;
use crate::Result;
use anyhow::Context;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fmt::Display;

const CSS: &str = r#"
body { margin: 0; background: #f7f9fc; color: #2a3f5f; font-family: sans-serif; }
main { max-width: 1340px; margin: 0 auto; padding: 24px; }
header h1 { margin: 0 0 6px 0; }
header .meta { margin: 0; color: #5b6b7f; }
header .meta span + span::before { content: " · "; }
.kpis { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; margin: 24px 0; }
.kpi { background: #fff; border: 1px solid #e5ecf6; border-radius: 8px; padding: 16px; }
.kpi .label { font-size: 0.9em; color: #5b6b7f; }
.kpi .value { font-size: 1.8em; font-weight: bold; margin-top: 4px; }
.kpi .note { font-size: 0.8em; color: #9aa5b1; }
details { background: #fff; border: 1px solid #e5ecf6; border-radius: 8px; padding: 12px 16px; }
summary { cursor: pointer; font-weight: bold; }
.table-wrap { overflow-x: auto; }
table { border-collapse: collapse; margin: 8px 0 16px 0; font-size: 0.9em; }
th, td { border-bottom: 1px solid #e5ecf6; padding: 4px 10px; text-align: left; white-space: nowrap; }
td.num { text-align: right; }
.charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(640px, 1fr)); gap: 16px; margin-top: 24px; }
.chart { background: #fff; border: 1px solid #e5ecf6; border-radius: 8px; padding: 8px; }
.chart svg { max-width: 100%; height: auto; }
.legend span { margin-right: 14px; white-space: nowrap; }
.legend .swatch { display: inline-block; width: 12px; height: 12px; border-radius: 2px; margin-right: 4px; vertical-align: middle; }
.error { background: #fff; border: 1px solid #ef553b; border-left-width: 6px; border-radius: 8px; padding: 16px; margin-top: 24px; }
.error h2 { margin-top: 0; color: #ef553b; }
.error .hint { color: #5b6b7f; }
"#;

/// Renders the full dashboard.
///
/// # Errors
/// `ErrorType::Render` if a chart cannot be drawn.
pub fn dashboard_page(dashboard: &Dashboard) -> Result<String> {
    let palette = Palette::new(&dashboard.options);
    let aggregates = &dashboard.aggregates;
    let sales = charts::sales_by_item(&aggregates.sales_by_item, &palette)
        .context("Unable to draw the sales by item chart")
        .pub_result(ErrorType::Render)?;
    let quantity = charts::quantity_by_item(&aggregates.quantity_by_item, &palette)
        .context("Unable to draw the quantity by item chart")
        .pub_result(ErrorType::Render)?;
    let daily = charts::daily_sales(&aggregates.daily_sales, &palette)
        .context("Unable to draw the daily sales chart")
        .pub_result(ErrorType::Render)?;

    let kpis = &aggregates.kpis;
    let body = html! {
        (header(dashboard))
        section.kpis {
            (kpi("Total Revenue", kpis.total_revenue, None))
            (kpi("Total Items Sold", kpis.total_items_sold, None))
            (kpi("Avg. Transaction", kpis.avg_transaction, (!kpis.has_data()).then_some("no data")))
            (kpi("Total Transactions", kpis.total_transactions, None))
        }
        details {
            summary { "Data preview and statistics" }
            h3 { "First " (dashboard.preview.len()) " rows" }
            (preview_table(&dashboard.headers, &dashboard.preview))
            h3 { "Summary statistics" }
            (stats_table(&dashboard.stats))
        }
        section.charts {
            (chart(&sales))
            (chart(&quantity))
            (chart(&daily))
        }
        (legend(&dashboard.options.items, &palette))
    };
    Ok(page(&dashboard.title, body).into_string())
}

/// Renders the page that replaces the dashboard when a render cycle fails.
pub fn error_page(title: &str, error: &Error) -> String {
    let body = html! {
        header {
            h1 { (title) }
        }
        div.error role="alert" {
            h2 { "The dashboard could not be built" }
            p.message { (error) }
            p.hint { (error.hint()) }
        }
    };
    page(title, body).into_string()
}

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                main { (body) }
            }
        }
    }
}

fn header(dashboard: &Dashboard) -> Markup {
    html! {
        header {
            h1 { (dashboard.title) }
            p.meta { "Sales trends and item performance from the transaction data." }
            p.meta {
                span { "Source: " (dashboard.source) }
                span { "Dates: " (dashboard.date_label()) }
                span { "Items: " (dashboard.items_label()) }
                span {
                    (dashboard.aggregates.kpis.total_transactions) " of "
                    (dashboard.total_rows) " transactions"
                }
            }
        }
    }
}

fn kpi(label: &str, value: impl Display, note: Option<&str>) -> Markup {
    html! {
        div.kpi {
            div.label { (label) }
            div.value { (value) }
            @if let Some(note) = note {
                div.note { (note) }
            }
        }
    }
}

fn preview_table(headers: &[String], rows: &[Vec<String>]) -> Markup {
    html! {
        div.table-wrap {
            table {
                thead {
                    tr {
                        @for h in headers {
                            th { (h) }
                        }
                    }
                }
                tbody {
                    @for row in rows {
                        tr {
                            @for cell in row {
                                td { (cell) }
                            }
                        }
                    }
                    @if rows.is_empty() {
                        tr {
                            td colspan=(headers.len().max(1)) {
                                "No rows match the current filters."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn stats_table(stats: &[ColumnStats]) -> Markup {
    html! {
        div.table-wrap {
            table {
                thead {
                    tr {
                        th {}
                        th { "count" }
                        th { "mean" }
                        th { "std" }
                        th { "min" }
                        th { "25%" }
                        th { "50%" }
                        th { "75%" }
                        th { "max" }
                    }
                }
                tbody {
                    @for s in stats {
                        tr {
                            th { (s.column) }
                            td.num { (s.count) }
                            td.num { (stat(s.mean)) }
                            td.num { (stat(s.std)) }
                            td.num { (stat(s.min)) }
                            td.num { (stat(s.q25)) }
                            td.num { (stat(s.median)) }
                            td.num { (stat(s.q75)) }
                            td.num { (stat(s.max)) }
                        }
                    }
                }
            }
        }
    }
}

fn legend(items: &[String], palette: &Palette) -> Markup {
    html! {
        p.legend {
            @for item in items {
                span {
                    span.swatch style=(format!("background: {};", palette.css(item))) {}
                    (item)
                }
            }
        }
    }
}

fn chart(svg: &str) -> Markup {
    let (width, height) = CHART_SIZE;
    html! {
        figure.chart style=(format!("min-width: {width}px; min-height: {height}px;")) {
            (PreEscaped(svg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::build;
    use crate::filter::{FilterSelection, ItemSelection};
    use crate::loader::{Source, SourceCache};
    use crate::test::TestEnv;
    use anyhow::anyhow;

    #[tokio::test]
    async fn test_dashboard_page() {
        let env = TestEnv::new();
        let config = env.config();
        let mut cache = SourceCache::new();
        let source = Source::path(config.default_source());
        let dashboard = build(&config, &mut cache, &source, &FilterSelection::default())
            .await
            .unwrap();
        let html = dashboard_page(&dashboard).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Business Sales Dashboard"));
        assert!(html.contains("Total Revenue"));
        assert!(html.contains("$19.50"));
        assert!(html.contains("$3.90"));
        assert!(html.contains("<details>"));
        assert!(html.contains("TXN_1"));
        assert!(html.contains("Price Per Unit"));
        assert!(html.contains("All dates"));
        assert!(html.contains("background: #636efa;"));
        assert_eq!(html.matches("<svg").count(), 3);
        assert!(!html.contains("no data"));
    }

    #[tokio::test]
    async fn test_dashboard_page_empty_selection() {
        let env = TestEnv::new();
        let config = env.config();
        let mut cache = SourceCache::new();
        let source = Source::path(config.default_source());
        let selection = FilterSelection {
            items: ItemSelection::none(),
            ..FilterSelection::default()
        };
        let dashboard = build(&config, &mut cache, &source, &selection)
            .await
            .unwrap();
        let html = dashboard_page(&dashboard).unwrap();
        assert!(html.contains("$0.00"));
        assert!(html.contains("no data"));
        assert_eq!(html.matches("No data").count(), 3);
        assert!(html.contains("No rows match"));
    }

    #[test]
    fn test_error_page() {
        let err = Error::new(ErrorType::Load, anyhow!("Unable to load 'archive/dataset.csv'"));
        let html = error_page("Sales", &err);
        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("load error"));
        assert!(html.contains("archive/dataset.csv"));
        assert!(html.contains("upload a file (--file)"));
        assert!(!html.contains("Total Revenue"));
    }
}
