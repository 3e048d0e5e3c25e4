use crate::args::OptionsArgs;
use crate::commands::Out;
use crate::filter::FilterOptions;
use crate::{loader, Config, Result};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// What can be filtered on in a source.
#[derive(Debug, Clone, Serialize)]
pub struct Options {
    pub source: String,
    pub rows: usize,
    #[serde(flatten)]
    pub options: FilterOptions,
}

impl Display for Options {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Source: {} ({} rows)", self.source, self.rows)?;
        match (self.options.min_date, self.options.max_date) {
            (Some(min), Some(max)) => writeln!(f, "Dates:  {min} to {max}")?,
            _ => writeln!(f, "Dates:  none")?,
        }
        write!(f, "Items:  {}", self.options.items.join(", "))
    }
}

/// Loads the source in `args` and reports its date bounds and distinct items.
///
/// # Errors
/// `ErrorType::Load` or `ErrorType::Parse` if the source cannot be loaded.
pub async fn options(config: Config, args: &OptionsArgs) -> Result<Out<Options>> {
    let source = args.source().source(&config).await?;
    let table = loader::load(&source).await?;
    let options = Options {
        source: source.name(),
        rows: table.len(),
        options: FilterOptions::from_table(&table),
    };
    Ok(Out::new(
        format!(
            "{} items in {} rows of {}",
            options.options.items.len(),
            options.rows,
            options.source
        ),
        options,
    ))
}
