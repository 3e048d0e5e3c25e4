//! These structs provide the CLI interface for the sales-dashboard CLI.

use crate::filter::{DateSelection, FilterSelection, ItemSelection};
use crate::loader::Source;
use crate::model::parse_date_time;
use crate::{Config, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// sales-dashboard: KPIs and charts for a sales transaction CSV.
///
/// The program loads a CSV of sales transactions (by default `archive/dataset.csv`, or a file you
/// pass with --file), filters it by a date range and a selection of items, and writes a
/// self-contained HTML dashboard with four KPIs, a data preview, summary statistics and three
/// charts.
///
/// The CSV needs at least the columns `Transaction Date`, `Item`, `Quantity` and `Total Spent`.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write the dashboard as an HTML file.
    ///
    /// If the data cannot be loaded or the filters are invalid, an error page is written instead
    /// and the program exits with a non-zero status.
    Render(RenderArgs),
    /// Print the KPIs and grouped totals for the current filters.
    Summary(SummaryArgs),
    /// Print the date range and the items that can be filtered on.
    Options(OptionsArgs),
    /// Read actions from stdin and re-render the dashboard after each one.
    ///
    /// Type `help` in the session for a list of actions.
    Session(SessionArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// A JSON configuration file. Defaults to `sales-dashboard/config.json` in your config
    /// directory, and to built-in settings when that does not exist.
    #[arg(long, env = "SALES_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,
}

impl Common {
    pub fn new(log_level: LevelFilter, config: Option<PathBuf>) -> Self {
        Self { log_level, config }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// Where the data comes from.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SourceArgs {
    /// A CSV file to use instead of the default dataset.
    #[arg(long)]
    file: Option<PathBuf>,
}

impl SourceArgs {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// The uploaded file if `--file` was given, the configured default dataset otherwise.
    pub async fn source(&self, config: &Config) -> Result<Source> {
        match &self.file {
            Some(path) => Source::upload_file(path).await,
            None => Ok(Source::path(config.default_source())),
        }
    }
}

/// The filters to apply.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SelectionArgs {
    /// The first date to include. Only used together with --end.
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// The last date to include. Only used together with --start.
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// An item to include. Repeat to include several. All items are included by default.
    #[arg(long = "item")]
    items: Vec<String>,

    /// Include no items at all.
    #[arg(long, conflicts_with = "items")]
    no_items: bool,
}

impl SelectionArgs {
    pub fn new(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        items: Vec<String>,
        no_items: bool,
    ) -> Self {
        Self {
            start,
            end,
            items,
            no_items,
        }
    }

    pub fn selection(&self) -> FilterSelection {
        let items = if self.no_items {
            ItemSelection::none()
        } else if self.items.is_empty() {
            ItemSelection::All
        } else {
            ItemSelection::only(self.items.iter().cloned())
        };
        FilterSelection::new(DateSelection::new(self.start, self.end), items)
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date_time(s)
        .map(|dt| dt.date())
        .map_err(|e| format!("{e:#}"))
}

/// How structured output is printed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Pretty printed JSON on stdout.
    #[default]
    Json,
    /// Human readable lines on stdout.
    Text,
}

serde_plain::derive_display_from_serialize!(Format);
serde_plain::derive_fromstr_from_deserialize!(Format);

/// (Not shown): Args for the `render` command.
#[derive(Debug, Parser, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Where to write the HTML page. Defaults to the configured output, `dashboard.html`.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl RenderArgs {
    pub fn new(source: SourceArgs, selection: SelectionArgs, output: Option<PathBuf>) -> Self {
        Self {
            source,
            selection,
            output,
        }
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }

    pub fn selection(&self) -> &SelectionArgs {
        &self.selection
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// (Not shown): Args for the `summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// The output format: json or text.
    #[arg(long, default_value_t = Format::Json)]
    format: Format,
}

impl SummaryArgs {
    pub fn new(source: SourceArgs, selection: SelectionArgs, format: Format) -> Self {
        Self {
            source,
            selection,
            format,
        }
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }

    pub fn selection(&self) -> &SelectionArgs {
        &self.selection
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// (Not shown): Args for the `options` command.
#[derive(Debug, Parser, Clone)]
pub struct OptionsArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// The output format: json or text.
    #[arg(long, default_value_t = Format::Json)]
    format: Format,
}

impl OptionsArgs {
    pub fn new(source: SourceArgs, format: Format) -> Self {
        Self { source, format }
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// (Not shown): Args for the `session` command.
#[derive(Debug, Parser, Clone)]
pub struct SessionArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Where to write the HTML page after each action. Defaults to the configured output.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl SessionArgs {
    pub fn new(source: SourceArgs, output: Option<PathBuf>) -> Self {
        Self { source, output }
    }

    pub fn source(&self) -> &SourceArgs {
        &self.source
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}
