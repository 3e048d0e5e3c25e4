//! Load a sales transaction CSV, filter it by date range and items, and render KPIs, a data
//! preview, summary statistics and three charts as a self-contained HTML dashboard.
//!
//! The pipeline is `loader` → `filter` → `aggregate`/`stats` → `render`, run once per user action
//! by `dashboard::run_cycle`. The `session` module drives it from a stream of actions.

pub mod aggregate;
pub mod args;
pub mod commands;
mod config;
pub mod dashboard;
mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod render;
pub mod session;
pub mod stats;
mod utils;


pub use config::Config;
pub use error::{Error, ErrorType, IntoResult, Result};
