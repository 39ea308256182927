use tracing::info;
use url::Url;

use crate::client::ReportSource;
use crate::document::{Block, Document, Field, FieldValue};
use crate::filter::{read_filter_from_location, write_filter_to_location, FilterState};
use crate::prompt::{run_prompt, PromptError, PromptUi};
use crate::report::{ReportRecord, SummaryReport};
use crate::status::{terminal_indicator, IndicatorFactory, WaitStatus};
use crate::utils::display_error;

const NONE: &str = "none";
const INLINE_DOMAINS: usize = 3;
const TEXT_SEPARATOR: &str = "==========\n";

/// The summary page: options panel plus the reports for the current filter.
pub struct SummaryView<'a, S: ReportSource + ?Sized> {
    source: &'a S,
    location: Url,
    filter: Option<FilterState>,
    domains_expanded: bool,
    indicator: IndicatorFactory,
}

impl<'a, S: ReportSource + ?Sized> SummaryView<'a, S> {
    pub fn new(source: &'a S, location: Url) -> Self {
        let filter = read_filter_from_location(&location);
        Self {
            source,
            location,
            filter,
            domains_expanded: false,
            indicator: terminal_indicator(),
        }
    }

    pub fn with_indicator(mut self, indicator: IndicatorFactory) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn filter(&self) -> Option<&FilterState> {
        self.filter.as_ref()
    }

    /// Show every selected domain instead of the first few.
    pub fn expand_domains(&mut self) {
        self.domains_expanded = true;
    }

    pub fn options_panel(&self) -> Block {
        let (period, format) = match &self.filter {
            Some(f) => (f.period.to_string(), f.format.token().to_string()),
            None => (NONE.to_string(), NONE.to_string()),
        };
        let domains = match &self.filter {
            Some(f) if !f.domains.is_empty() => f.domains.clone(),
            _ => vec![NONE.to_string()],
        };

        let domains_value = if domains.len() > INLINE_DOMAINS && !self.domains_expanded {
            FieldValue::Truncated {
                shown: domains[..INLINE_DOMAINS].join(", "),
                more: format!("and {} more", domains.len() - INLINE_DOMAINS),
                full: domains.join(", "),
            }
        } else {
            FieldValue::Plain(domains.join(", "))
        };

        Block::section(
            "options-block",
            vec![
                Block::heading(2, "Report options:"),
                Block::Fields(vec![
                    Field::new("period", period),
                    Field::new("format", format),
                    Field {
                        title: "domains".to_string(),
                        value: domains_value,
                        mark: None,
                    },
                ]),
            ],
        )
    }

    /// Let the user pick new options. On apply the location is rewritten and
    /// the filter re-read from it; returns whether that happened.
    pub fn change_options<U: PromptUi + ?Sized>(&mut self, ui: &mut U) -> Result<bool, PromptError> {
        let Some(filter) = run_prompt(self.filter.clone(), self.source, ui, &self.indicator)? else {
            return Ok(false);
        };
        write_filter_to_location(&mut self.location, &filter);
        self.filter = read_filter_from_location(&self.location);
        self.domains_expanded = false;
        info!(action = "update", component = "summary_view", location = %self.location, "Report options changed");
        Ok(true)
    }

    /// Fetch reports for the current filter and lay them out.
    pub fn fetch_and_render(&self) -> Block {
        let Some(filter) = &self.filter else {
            return Block::section(
                "summary-report",
                vec![Block::Paragraph("Report options are not selected".to_string())],
            );
        };

        let fetched = {
            let _wait = WaitStatus::start((self.indicator)(), "Loading report");
            self.source.fetch_reports(filter)
        };
        let blocks = match fetched {
            Ok(reports) => report_blocks(reports),
            Err(e) => {
                display_error(&e);
                vec![Block::Error(format!("Error: {}", e))]
            }
        };
        Block::section("summary-report", blocks)
    }

    pub fn render(&self) -> Document {
        Document::new(vec![Block::section(
            "panel-container",
            vec![self.options_panel(), Block::Rule, self.fetch_and_render()],
        )])
    }
}

fn separator(structured: bool) -> Block {
    if structured {
        Block::Rule
    } else {
        Block::Preformatted(TEXT_SEPARATOR.to_string())
    }
}

fn no_data() -> Block {
    Block::Paragraph("No data".to_string())
}

/// Lay out fetched reports. Every report after the first is preceded by a
/// separator matching how that report itself renders.
pub fn report_blocks(reports: Vec<ReportRecord>) -> Vec<Block> {
    if reports.is_empty() {
        return vec![no_data()];
    }

    let mut blocks = Vec::new();
    for (index, record) in reports.into_iter().enumerate() {
        let report = SummaryReport::new(record);
        let text = report.as_text();
        if index > 0 {
            blocks.push(separator(text.is_none()));
        }
        match text {
            Some(text) => blocks.push(Block::Preformatted(text)),
            None => match report.as_structured() {
                Some(structured) => blocks.extend(structured),
                None => blocks.push(no_data()),
            },
        }
    }
    blocks
}
