//! Command handlers for the sales-dashboard CLI. Each one builds on `dashboard::build` or
//! `dashboard::run_cycle` and returns an `Out` for `main` to print.

mod options;
mod render;
mod session;
mod summary;

use crate::args::Format;
use crate::error::{ErrorType, IntoResult};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fmt::{Debug, Display};
use tracing::{debug, info};

pub use options::{options, Options};
pub use render::render;
pub use session::session;
pub use summary::{summary, Summary};

/// What a command hands back to `main`: a one-line message for the log and the data behind it.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug + Display,
{
    /// Print the message to `info!` and the structured data to stdout in the requested format.
    pub fn print_as(&self, format: Format) -> Result<()> {
        info!("{}", self.message);
        let Some(structure) = self.structure() else {
            return Ok(());
        };
        match format {
            Format::Json => {
                let json = serde_json::to_string_pretty(structure)
                    .context("Unable to serialize the command output")
                    .pub_result(ErrorType::Internal)?;
                println!("{json}");
            }
            Format::Text => println!("{structure}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out() {
        let out = Out::new("2 rows", vec![1, 2]);
        assert_eq!(out.message(), "2 rows");
        assert_eq!(out.structure(), Some(&vec![1, 2]));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["structure"][1], 2);
    }
}
