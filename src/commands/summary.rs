use crate::aggregate::Aggregates;
use crate::args::SummaryArgs;
use crate::commands::Out;
use crate::dashboard::build;
use crate::loader::SourceCache;
use crate::model::Amount;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// The numbers behind the dashboard, without the page.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub source: String,
    pub dates: String,
    pub items: String,
    pub total_rows: usize,
    #[serde(flatten)]
    pub aggregates: Aggregates,
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kpis = &self.aggregates.kpis;
        writeln!(f, "Source:             {}", self.source)?;
        writeln!(f, "Dates:              {}", self.dates)?;
        writeln!(f, "Items:              {}", self.items)?;
        writeln!(f, "Total Revenue:      {}", kpis.total_revenue)?;
        writeln!(f, "Total Items Sold:   {}", kpis.total_items_sold)?;
        writeln!(f, "Avg. Transaction:   {}", kpis.avg_transaction)?;
        write!(f, "Total Transactions: {}", kpis.total_transactions)?;
        if !self.aggregates.sales_by_item.is_empty() {
            write!(f, "\n\nSales by item:")?;
            for t in &self.aggregates.sales_by_item {
                write!(f, "\n  {:<24} {}", t.item, Amount::new(t.total))?;
            }
        }
        if !self.aggregates.quantity_by_item.is_empty() {
            write!(f, "\n\nQuantity by item:")?;
            for t in &self.aggregates.quantity_by_item {
                write!(f, "\n  {:<24} {}", t.item, t.total.normalize())?;
            }
        }
        if !self.aggregates.daily_sales.is_empty() {
            write!(f, "\n\nDaily sales:")?;
            for d in &self.aggregates.daily_sales {
                write!(f, "\n  {}               {}", d.date, d.total)?;
            }
        }
        Ok(())
    }
}

/// Computes the KPIs and grouped totals for the source and filters in `args`.
///
/// # Errors
/// - `ErrorType::Load` or `ErrorType::Parse` if the source cannot be loaded.
/// - `ErrorType::Filter` if the selection is invalid.
pub async fn summary(config: Config, args: &SummaryArgs) -> Result<Out<Summary>> {
    let source = args.source().source(&config).await?;
    let mut cache = SourceCache::new();
    let dashboard = build(&config, &mut cache, &source, &args.selection().selection()).await?;
    let summary = Summary {
        source: dashboard.source.clone(),
        dates: dashboard.date_label(),
        items: dashboard.items_label(),
        total_rows: dashboard.total_rows,
        aggregates: dashboard.aggregates,
    };
    Ok(Out::new(
        format!(
            "{} of {} transactions selected from {}",
            summary.aggregates.kpis.total_transactions, summary.total_rows, summary.source
        ),
        summary,
    ))
}
