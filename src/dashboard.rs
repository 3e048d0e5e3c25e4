//! One render cycle: load → filter → aggregate → render.
//!
//! [`build`] runs the data half of the pipeline and [`run_cycle`] adds the presentation half. Any
//! error along the way is caught once in `run_cycle` and turned into the error page, so a cycle
//! produces either the whole dashboard or only the error panel.

use crate::aggregate::Aggregates;
use crate::error::{Error, ErrorType, IntoResult};
use crate::filter::{filter, FilterOptions, FilterSelection};
use crate::loader::{Source, SourceCache};
use crate::stats::{describe, preview, ColumnStats};
use crate::{render, utils, Config, Result};
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::{error, info};

/// Everything the page shows, computed for one source and one selection.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    /// The display name of the active source.
    pub source: String,
    pub options: FilterOptions,
    pub selection: FilterSelection,
    /// The date interval that was applied, `None` when dates were not filtered.
    pub interval: Option<(NaiveDate, NaiveDate)>,
    /// The number of rows in the unfiltered table.
    pub total_rows: usize,
    pub aggregates: Aggregates,
    pub headers: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub stats: Vec<ColumnStats>,
}

impl Dashboard {
    /// The effective date filter, e.g. `2024-01-01 to 2024-01-31` or `All dates`.
    pub fn date_label(&self) -> String {
        match self.interval {
            Some((start, end)) => format!("{start} to {end}"),
            None => "All dates".to_string(),
        }
    }

    /// How many of the table's items are selected, e.g. `3 of 5 items`.
    pub fn items_label(&self) -> String {
        format!(
            "{} of {} items",
            self.selection.items.count(&self.options),
            self.options.items.len()
        )
    }
}

/// Loads (or reuses) the table for `source`, applies `selection` and computes everything the page
/// needs.
///
/// # Errors
/// - `ErrorType::Load` or `ErrorType::Parse` if the source cannot be loaded.
/// - `ErrorType::Filter` if the selection is invalid.
pub async fn build(
    config: &Config,
    cache: &mut SourceCache,
    source: &Source,
    selection: &FilterSelection,
) -> Result<Dashboard> {
    let table = cache.get_or_load(source).await?;
    let options = FilterOptions::from_table(&table);
    let view = filter(&table, selection)?;
    Ok(Dashboard {
        title: config.title().to_string(),
        source: source.name(),
        options,
        selection: selection.clone(),
        interval: view.interval(),
        total_rows: table.len(),
        aggregates: Aggregates::compute(&view),
        headers: table.headers().to_vec(),
        preview: preview(&view, config.preview_rows()),
        stats: describe(&view),
    })
}

/// The outcome of one render cycle: the HTML to show and the dashboard or the error behind it.
#[derive(Debug)]
pub struct Cycle {
    html: String,
    outcome: Result<Dashboard>,
}

impl Cycle {
    /// A cycle that failed before the pipeline could run.
    pub fn failed(config: &Config, error: Error) -> Self {
        error!("{error}");
        Self {
            html: render::error_page(config.title(), &error),
            outcome: Err(error),
        }
    }

    /// The dashboard page, or the error page if the cycle failed.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_result(self) -> Result<Dashboard> {
        self.outcome
    }

    /// Writes the page to `path`.
    ///
    /// # Errors
    /// `ErrorType::Render` if the file cannot be written.
    pub async fn write(&self, path: &Path) -> Result<()> {
        utils::write(path, &self.html)
            .await
            .context("Unable to write the dashboard")
            .pub_result(ErrorType::Render)?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Runs the full pipeline for `source` and `selection`. This never fails: errors become the error
/// page.
pub async fn run_cycle(
    config: &Config,
    cache: &mut SourceCache,
    source: &Source,
    selection: &FilterSelection,
) -> Cycle {
    let rendered = match build(config, cache, source, selection).await {
        Ok(dashboard) => render::dashboard_page(&dashboard).map(|html| (dashboard, html)),
        Err(e) => Err(e),
    };
    match rendered {
        Ok((dashboard, html)) => {
            let kpis = &dashboard.aggregates.kpis;
            info!(
                "Revenue {}, items sold {}, average {}, transactions {}",
                kpis.total_revenue,
                kpis.total_items_sold,
                kpis.avg_transaction,
                kpis.total_transactions
            );
            Cycle {
                html,
                outcome: Ok(dashboard),
            }
        }
        Err(e) => Cycle::failed(config, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DateSelection, ItemSelection};
    use crate::test::TestEnv;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_build_labels() {
        let env = TestEnv::new();
        let config = env.config();
        let mut cache = SourceCache::new();
        let source = Source::path(config.default_source());
        let selection = FilterSelection::new(
            DateSelection::between(date(2024, 1, 2), date(2024, 1, 3)),
            ItemSelection::only(["Tea", "Cake"]),
        );
        let dashboard = build(&config, &mut cache, &source, &selection)
            .await
            .unwrap();
        assert_eq!(dashboard.date_label(), "2024-01-02 to 2024-01-03");
        assert_eq!(dashboard.items_label(), "2 of 3 items");
        assert_eq!(dashboard.total_rows, 6);
        assert_eq!(dashboard.aggregates.kpis.total_transactions, 2);
        assert_eq!(dashboard.preview.len(), 2);
    }

    #[tokio::test]
    async fn test_cycle_missing_source_is_error_page() {
        let env = TestEnv::new();
        let config = env.config();
        let mut cache = SourceCache::new();
        let source = Source::path(env.dir().join("missing.csv"));
        let cycle = run_cycle(&config, &mut cache, &source, &FilterSelection::default()).await;
        assert!(!cycle.is_ok());
        assert_eq!(cycle.error().unwrap().error_type(), ErrorType::Load);
        assert!(cycle.html().contains("missing.csv"));
        assert!(cycle.html().contains("upload a file"));
        assert!(!cycle.html().contains("Total Revenue"));
    }

    #[tokio::test]
    async fn test_cycle_unsummable_totals_is_error_page() {
        let env = TestEnv::new();
        let config = env.config();
        let mut cache = SourceCache::new();
        let huge = "79228162514264337593543950335";
        let csv = format!(
            "Transaction Date,Item,Quantity,Total Spent\n\
             2024-01-01,Tea,1,{huge}\n\
             2024-01-02,Tea,1,{huge}\n"
        );
        let source = Source::upload("huge.csv", csv.into_bytes());
        let cycle = run_cycle(&config, &mut cache, &source, &FilterSelection::default()).await;
        assert_eq!(cycle.error().unwrap().error_type(), ErrorType::Parse);
        assert!(cycle.html().contains("role=\"alert\""));
        assert!(cycle.html().contains("Total Spent"));
    }

    #[tokio::test]
    async fn test_cycle_inverted_dates_is_error_page() {
        let env = TestEnv::new();
        let config = env.config();
        let mut cache = SourceCache::new();
        let source = Source::path(config.default_source());
        let selection = FilterSelection::new(
            DateSelection::between(date(2024, 1, 3), date(2024, 1, 1)),
            ItemSelection::All,
        );
        let cycle = run_cycle(&config, &mut cache, &source, &selection).await;
        assert_eq!(cycle.error().unwrap().error_type(), ErrorType::Filter);
    }

    #[tokio::test]
    async fn test_cycle_writes_page() {
        let env = TestEnv::new();
        let config = env.config();
        let mut cache = SourceCache::new();
        let source = Source::path(config.default_source());
        let cycle = run_cycle(&config, &mut cache, &source, &FilterSelection::default()).await;
        assert!(cycle.is_ok());
        cycle.write(config.output()).await.unwrap();
        let written = std::fs::read_to_string(config.output()).unwrap();
        assert_eq!(written, cycle.html());
        assert_eq!(cycle.into_result().unwrap().aggregates.kpis.total_transactions, 6);
    }
}
