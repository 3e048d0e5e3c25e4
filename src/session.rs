//! The interactive session: every input line is one user action, and every action that changes the
//! source or the selection runs one full render cycle with the current selection.

use crate::dashboard::{run_cycle, Cycle};
use crate::error::{ErrorType, IntoResult};
use crate::filter::{DateSelection, FilterSelection, ItemSelection};
use crate::loader::{Source, SourceCache};
use crate::model::parse_date_time;
use crate::{Config, Result};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info, warn};

pub const HELP: &str = "\
Actions:
  file <path>        load <path> as an uploaded file
  default            go back to the default dataset
  start <date>       set the start of the date range
  end <date>         set the end of the date range
  dates clear        remove the date range
  items all          select every item
  items none         select no items
  items <a>, <b>     select only the listed items
  show               print the current source and selection
  help               print this message
  quit               end the session";

/// One user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Upload(PathBuf),
    Default,
    Start(NaiveDate),
    End(NaiveDate),
    ClearDates,
    Items(ItemSelection),
    Show,
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = match s.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (s, ""),
        };
        let action = match (verb.to_lowercase().as_str(), rest) {
            ("file" | "upload", "") => bail!("'{verb}' needs a path"),
            ("file" | "upload", path) => Action::Upload(PathBuf::from(path)),
            ("default", "") => Action::Default,
            ("start", date) => Action::Start(parse_date(date)?),
            ("end", date) => Action::End(parse_date(date)?),
            ("dates", "clear") => Action::ClearDates,
            ("items", "all") => Action::Items(ItemSelection::All),
            ("items", "none") => Action::Items(ItemSelection::none()),
            ("items", "") => bail!("'items' needs 'all', 'none' or a list of items"),
            ("items", list) => Action::Items(ItemSelection::only(
                list.split(',').map(str::trim).filter(|i| !i.is_empty()),
            )),
            ("show", "") => Action::Show,
            ("help" | "?", "") => Action::Help,
            ("quit" | "exit", "") => Action::Quit,
            _ => bail!("Unknown action '{s}', type 'help' for a list of actions"),
        };
        Ok(action)
    }
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    if s.is_empty() {
        bail!("A date is required");
    }
    parse_date_time(s)
        .map(|dt| dt.date())
        .with_context(|| format!("Invalid date '{s}'"))
}

/// What the session is currently showing.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub source: String,
    pub selection: FilterSelection,
    pub output: PathBuf,
    pub cached_tables: usize,
}

/// The result of applying one action.
#[derive(Debug)]
pub enum Step {
    Rendered(Cycle),
    Status(Status),
    Help,
    Quit,
}

/// Owns the loader cache, the active source and the current selection.
#[derive(Debug)]
pub struct Session {
    config: Config,
    cache: SourceCache,
    source: Source,
    selection: FilterSelection,
    output: PathBuf,
}

impl Session {
    /// A session on the configured default dataset, writing to the configured output.
    pub fn new(config: Config) -> Self {
        let source = Source::path(config.default_source());
        let output = config.output().to_path_buf();
        Self {
            config,
            cache: SourceCache::new(),
            source,
            selection: FilterSelection::default(),
            output,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn status(&self) -> Status {
        Status {
            source: self.source.name(),
            selection: self.selection.clone(),
            output: self.output.clone(),
            cached_tables: self.cache.len(),
        }
    }

    /// Applies `action` and, if it changes the dashboard, runs a render cycle and writes the page.
    ///
    /// # Errors
    /// `ErrorType::Render` if the page cannot be written. Failures inside the cycle are not errors
    /// here; they are part of the returned `Cycle`.
    pub async fn apply(&mut self, action: Action) -> Result<Step> {
        debug!("Applying {action:?}");
        match action {
            Action::Upload(path) => match Source::upload_file(&path).await {
                Ok(source) => self.set_source(source),
                Err(e) => {
                    let cycle = Cycle::failed(&self.config, e);
                    cycle.write(&self.output).await?;
                    return Ok(Step::Rendered(cycle));
                }
            },
            Action::Default => {
                let source = Source::path(self.config.default_source());
                self.set_source(source);
            }
            Action::Start(date) => self.selection.dates.start = Some(date),
            Action::End(date) => self.selection.dates.end = Some(date),
            Action::ClearDates => self.selection.dates = DateSelection::default(),
            Action::Items(items) => self.selection.items = items,
            Action::Show => return Ok(Step::Status(self.status())),
            Action::Help => return Ok(Step::Help),
            Action::Quit => return Ok(Step::Quit),
        }
        self.render().await.map(Step::Rendered)
    }

    /// Runs one render cycle for the current source and selection and writes the page.
    pub async fn render(&mut self) -> Result<Cycle> {
        let cycle = run_cycle(&self.config, &mut self.cache, &self.source, &self.selection).await;
        cycle.write(&self.output).await?;
        Ok(cycle)
    }

    /// Switches the active source. The previous source's table is dropped from the cache and the
    /// selection is reset to its defaults.
    fn set_source(&mut self, source: Source) {
        let previous = self.source.key();
        if source.key() == previous {
            debug!("Source {} is already active", source.name());
            return;
        }
        self.cache.invalidate(&previous);
        info!("Switched source to {}", source.name());
        self.source = source;
        self.selection = FilterSelection::default();
    }

    /// Renders once, then applies one action per line of `input` until `quit` or the end of the
    /// input. Malformed lines and failed cycles are reported and the session continues.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let first = self.render().await;
        self.report(first);
        info!("Type 'help' for a list of actions");
        let mut lines = input.lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Unable to read input")
            .pub_result(ErrorType::Io)?
        {
            if line.trim().is_empty() {
                continue;
            }
            let action = match line.parse::<Action>() {
                Ok(action) => action,
                Err(e) => {
                    warn!("{e:#}");
                    continue;
                }
            };
            match self.apply(action).await {
                Ok(Step::Rendered(cycle)) => self.report(Ok(cycle)),
                Ok(Step::Status(status)) => match serde_json::to_string_pretty(&status) {
                    Ok(json) => info!("{json}"),
                    Err(e) => warn!("Unable to show the status: {e}"),
                },
                Ok(Step::Help) => info!("{HELP}"),
                Ok(Step::Quit) => break,
                Err(e) => error!("{e}"),
            }
        }
        info!("Session ended");
        Ok(())
    }

    fn report(&self, cycle: Result<Cycle>) {
        match cycle {
            Ok(cycle) if cycle.is_ok() => info!("Dashboard written to {}", self.output.display()),
            Ok(_) => warn!("Error page written to {}", self.output.display()),
            Err(e) => error!("{e}"),
        }
    }
}

/// Reads actions from standard input.
pub async fn run_stdin(session: &mut Session) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{TestEnv, SAMPLE_CSV};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rendered(step: Step) -> Cycle {
        match step {
            Step::Rendered(cycle) => cycle,
            other => panic!("expected a render, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            "file data/cafe.csv".parse::<Action>().unwrap(),
            Action::Upload(PathBuf::from("data/cafe.csv"))
        );
        assert_eq!("default".parse::<Action>().unwrap(), Action::Default);
        assert_eq!(
            "start 2024-01-02".parse::<Action>().unwrap(),
            Action::Start(date(2024, 1, 2))
        );
        assert_eq!(
            "END 01/31/2024".parse::<Action>().unwrap(),
            Action::End(date(2024, 1, 31))
        );
        assert_eq!("dates clear".parse::<Action>().unwrap(), Action::ClearDates);
        assert_eq!(
            "items Coffee, Iced Tea".parse::<Action>().unwrap(),
            Action::Items(ItemSelection::only(["Coffee", "Iced Tea"]))
        );
        assert_eq!(
            "items none".parse::<Action>().unwrap(),
            Action::Items(ItemSelection::none())
        );
        assert_eq!("  quit ".parse::<Action>().unwrap(), Action::Quit);
    }

    #[test]
    fn test_parse_malformed_actions() {
        assert!("file".parse::<Action>().is_err());
        assert!("start".parse::<Action>().is_err());
        assert!("start tomorrow".parse::<Action>().is_err());
        assert!("items".parse::<Action>().is_err());
        assert!("dance".parse::<Action>().is_err());
    }

    #[tokio::test]
    async fn test_actions_update_selection_and_rerender() {
        let env = TestEnv::new();
        let mut session = Session::new(env.config());

        let cycle = rendered(
            session
                .apply(Action::Items(ItemSelection::only(["Tea"])))
                .await
                .unwrap(),
        );
        let kpis = cycle.dashboard().unwrap().aggregates.kpis;
        assert_eq!(kpis.total_transactions, 2);

        session.apply(Action::Start(date(2024, 1, 3))).await.unwrap();
        let cycle = rendered(session.apply(Action::End(date(2024, 1, 3))).await.unwrap());
        assert_eq!(cycle.dashboard().unwrap().aggregates.kpis.total_transactions, 1);
        assert!(session.output().is_file());

        let cycle = rendered(session.apply(Action::ClearDates).await.unwrap());
        assert_eq!(cycle.dashboard().unwrap().aggregates.kpis.total_transactions, 2);
        // The default dataset was parsed once for all of these cycles.
        assert_eq!(session.cache().loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_session_alive() {
        let env = TestEnv::new();
        let mut session = Session::new(env.config());
        session.apply(Action::Start(date(2024, 1, 3))).await.unwrap();
        let cycle = rendered(session.apply(Action::End(date(2024, 1, 1))).await.unwrap());
        assert_eq!(cycle.error().unwrap().error_type(), ErrorType::Filter);
        let page = std::fs::read_to_string(session.output()).unwrap();
        assert!(page.contains("role=\"alert\""));

        let cycle = rendered(session.apply(Action::ClearDates).await.unwrap());
        assert!(cycle.is_ok());
    }

    #[tokio::test]
    async fn test_upload_switches_source_and_invalidates() {
        let env = TestEnv::new();
        let mut session = Session::new(env.config());
        session.render().await.unwrap();
        let default_key = session.source().key();
        assert!(session.cache().contains(&default_key));

        let upload = env.write(
            "upload.csv",
            "Transaction Date,Item,Quantity,Total Spent\n2024-02-01,Juice,1,4.00\n",
        );
        session
            .apply(Action::Items(ItemSelection::only(["Tea"])))
            .await
            .unwrap();
        let cycle = rendered(session.apply(Action::Upload(upload)).await.unwrap());
        assert_eq!(session.source().name(), "upload.csv");
        assert!(!session.cache().contains(&default_key));
        assert_eq!(session.selection(), &FilterSelection::default());
        let dashboard = cycle.dashboard().unwrap();
        assert_eq!(dashboard.options.items, vec!["Juice"]);
        assert_eq!(dashboard.aggregates.kpis.total_revenue.to_string(), "$4.00");

        let cycle = rendered(session.apply(Action::Default).await.unwrap());
        assert_eq!(cycle.dashboard().unwrap().total_rows, 6);
    }

    #[tokio::test]
    async fn test_upload_of_missing_file_shows_error_page() {
        let env = TestEnv::new();
        let mut session = Session::new(env.config());
        let cycle = rendered(
            session
                .apply(Action::Upload(env.dir().join("nope.csv")))
                .await
                .unwrap(),
        );
        assert_eq!(cycle.error().unwrap().error_type(), ErrorType::Load);
        // The previous source stays active.
        assert_eq!(session.source(), &Source::path(env.config().default_source()));
    }

    #[tokio::test]
    async fn test_run_reads_actions_until_quit() {
        let env = TestEnv::new();
        let upload = env.write("same.csv", SAMPLE_CSV);
        let input = format!(
            "items Coffee\nnonsense\n\nfile {}\nshow\nhelp\nitems Cake\nquit\nitems Tea\n",
            upload.display()
        );
        let mut session = Session::new(env.config());
        session.run(input.as_bytes()).await.unwrap();
        assert_eq!(session.source().name(), "same.csv");
        // The line after quit is never applied.
        assert_eq!(session.selection().items, ItemSelection::only(["Cake"]));
        let page = std::fs::read_to_string(session.output()).unwrap();
        assert!(page.contains("1 of 3 items"));
    }
}
