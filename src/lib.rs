pub mod app;
pub mod args;
pub mod client;
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod filter;
pub mod prompt;
pub mod render;
pub mod report;
pub mod status;
pub mod terminal;
pub mod utils;
pub mod view;

pub use args::Args;
pub use client::{ReportSource, SummaryClient};
pub use error::{AuthError, ClientError};
pub use filter::{read_filter_from_location, write_filter_to_location, FilterState, Format, Period};
pub use report::{percent_format, ReportRecord, SummaryReport};
pub use view::SummaryView;
