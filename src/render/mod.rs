//! The presentation layer: charts as inline SVG and the HTML page around them.

mod charts;
pub mod format;
mod page;

pub use charts::Palette;
pub use page::{dashboard_page, error_page};
