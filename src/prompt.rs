//! Report options prompt.
//!
//! [`OptionsPrompt`] holds the dialog state and enforces its rules; a
//! [`PromptUi`] supplies the user's answers. [`run_prompt`] wires the two
//! together.

use tracing::{info, warn};

use crate::client::ReportSource;
use crate::domain::normalize_domain;
use crate::error::ClientError;
use crate::filter::{parse_days, FilterState, Format, Period, PeriodKind};
use crate::status::{IndicatorFactory, WaitStatus};

const DEFAULT_DAYS: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    /// Waiting for the domain catalog; all controls are disabled.
    Loading,
    Ready,
    /// The catalog could not be fetched; controls stay disabled.
    Failed,
    Closed,
}

/// The day-count input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaysField {
    pub enabled: bool,
    /// What the field currently shows.
    pub value: String,
    /// Value restored when last-N-days is picked again.
    pub remembered: Option<String>,
}

impl DaysField {
    fn seed(days: Option<u32>) -> Self {
        let value = days.map(|d| d.to_string());
        Self {
            enabled: true,
            value: value.clone().unwrap_or_default(),
            remembered: value,
        }
    }
}

/// Field transition for a period change.
///
/// Last-N-days enables the field and shows the remembered value (or "1").
/// Any other period disables it, clears what it shows and remembers the value
/// it showed while enabled.
pub fn on_period_change(new_period: PeriodKind, days: &DaysField) -> DaysField {
    match new_period {
        PeriodKind::LastNDays => DaysField {
            enabled: true,
            value: days
                .remembered
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DAYS.to_string()),
            remembered: days.remembered.clone(),
        },
        _ => {
            let remembered = if days.enabled && !days.value.is_empty() {
                days.value.clone()
            } else {
                days.remembered
                    .clone()
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_DAYS.to_string())
            };
            DaysField {
                enabled: false,
                value: String::new(),
                remembered: Some(remembered),
            }
        }
    }
}

/// State of one options dialog.
#[derive(Debug, Clone)]
pub struct OptionsPrompt {
    initial: Option<FilterState>,
    state: PromptState,
    catalog: Option<Vec<String>>,
    selected: Vec<String>,
    period: PeriodKind,
    days: DaysField,
    format: Format,
    result: Option<FilterState>,
}

impl OptionsPrompt {
    /// Open the dialog pre-filled from `initial`. The catalog still has to be
    /// loaded before anything can be edited.
    pub fn open(initial: Option<FilterState>) -> Self {
        let mut prompt = Self {
            initial,
            state: PromptState::Loading,
            catalog: None,
            selected: Vec::new(),
            period: PeriodKind::LastWeek,
            days: DaysField::seed(None),
            format: Format::Text,
            result: None,
        };
        prompt.restore_fields();
        prompt
    }

    fn restore_fields(&mut self) {
        let period = self
            .initial
            .as_ref()
            .map(|f| f.period)
            .unwrap_or(Period::LastWeek);
        self.period = period.kind();
        self.days = on_period_change(self.period, &DaysField::seed(period.days()));
        self.format = self.initial.as_ref().map(|f| f.format).unwrap_or_default();
    }

    /// Initial domains the catalog knows about, in catalog order.
    fn preselected(&self) -> Vec<String> {
        let wanted: Vec<String> = self
            .initial
            .as_ref()
            .map(|f| f.domains.iter().map(|d| normalize_domain(d)).collect())
            .unwrap_or_default();
        let catalog = self.catalog.as_deref().unwrap_or_default();
        for missing in wanted
            .iter()
            .filter(|w| !catalog.iter().any(|c| normalize_domain(c) == **w))
        {
            warn!(action = "preselect", component = "options_prompt", domain = %missing, "Domain not in catalog");
        }
        catalog
            .iter()
            .filter(|c| wanted.contains(&normalize_domain(c)))
            .cloned()
            .collect()
    }

    /// Fetch the domain catalog. Only the first call talks to `source`.
    pub fn load_catalog<S: ReportSource + ?Sized>(&mut self, source: &S) -> Result<(), ClientError> {
        if self.catalog.is_some() || self.state == PromptState::Closed {
            return Ok(());
        }
        self.state = PromptState::Loading;
        match source.fetch_domains() {
            Ok(domains) => {
                info!(action = "loaded", component = "options_prompt", domain_count = domains.len(), "Domain catalog ready");
                self.catalog = Some(domains);
                self.selected = self.preselected();
                self.state = PromptState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = PromptState::Failed;
                Err(e)
            }
        }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    pub fn controls_enabled(&self) -> bool {
        self.state == PromptState::Ready
    }

    pub fn catalog(&self) -> &[String] {
        self.catalog.as_deref().unwrap_or_default()
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Replace the selection; names outside the catalog are ignored.
    pub fn set_selected(&mut self, domains: &[String]) {
        if !self.controls_enabled() {
            return;
        }
        let wanted: Vec<String> = domains.iter().map(|d| normalize_domain(d)).collect();
        self.selected = self
            .catalog()
            .iter()
            .filter(|c| wanted.contains(&normalize_domain(c)))
            .cloned()
            .collect();
    }

    pub fn period(&self) -> PeriodKind {
        self.period
    }

    /// Picking the period that is already selected changes nothing.
    pub fn set_period(&mut self, period: PeriodKind) {
        if !self.controls_enabled() || period == self.period {
            return;
        }
        self.period = period;
        self.days = on_period_change(period, &self.days);
    }

    pub fn days(&self) -> &DaysField {
        &self.days
    }

    pub fn set_days(&mut self, raw: &str) {
        if self.controls_enabled() && self.days.enabled {
            self.days.value = raw.trim().to_string();
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        if self.controls_enabled() {
            self.format = format;
        }
    }

    /// Apply is only offered with at least one domain selected.
    pub fn can_apply(&self) -> bool {
        self.controls_enabled() && !self.selected.is_empty()
    }

    /// Close the dialog with the edited filter, or `None` when apply is
    /// currently blocked.
    pub fn submit(&mut self) -> Option<FilterState> {
        if !self.can_apply() {
            return None;
        }
        let period = match self.period {
            PeriodKind::LastWeek => Period::LastWeek,
            PeriodKind::LastMonth => Period::LastMonth,
            PeriodKind::LastNDays => Period::LastNDays(parse_days(&self.days.value)),
        };
        let filter = FilterState {
            domains: self.selected.clone(),
            period,
            format: self.format,
        };
        self.result = Some(filter.clone());
        self.state = PromptState::Closed;
        Some(filter)
    }

    /// Put every field back to how the dialog was opened.
    pub fn reset(&mut self) {
        if !self.controls_enabled() {
            return;
        }
        self.selected = self.preselected();
        self.restore_fields();
    }

    pub fn cancel(&mut self) {
        self.result = None;
        self.state = PromptState::Closed;
    }

    pub fn result(&self) -> Option<&FilterState> {
        self.result.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Apply,
    Edit,
    Reset,
    Cancel,
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Prompt failed: {0}")]
    Terminal(#[from] dialoguer::Error),
}

/// Answers the prompt's questions.
pub trait PromptUi {
    fn pick_domains(&mut self, catalog: &[String], selected: &[String]) -> Result<Vec<String>, PromptError>;
    fn pick_period(&mut self, current: PeriodKind) -> Result<PeriodKind, PromptError>;
    fn enter_days(&mut self, current: &str) -> Result<String, PromptError>;
    fn pick_format(&mut self, current: Format) -> Result<Format, PromptError>;
    fn pick_action(&mut self, can_apply: bool) -> Result<PromptAction, PromptError>;

    fn report_error(&mut self, err: &ClientError) {
        crate::utils::display_error(err);
    }
}

/// Run one dialog to completion. A catalog failure is reported through the
/// UI and closes the dialog without a result.
pub fn run_prompt<S, U>(
    initial: Option<FilterState>,
    source: &S,
    ui: &mut U,
    indicator: &IndicatorFactory,
) -> Result<Option<FilterState>, PromptError>
where
    S: ReportSource + ?Sized,
    U: PromptUi + ?Sized,
{
    let mut prompt = OptionsPrompt::open(initial);
    let loaded = {
        let _wait = WaitStatus::start(indicator(), "Loading report options");
        prompt.load_catalog(source)
    };
    if let Err(e) = loaded {
        ui.report_error(&e);
        prompt.cancel();
        return Ok(None);
    }

    loop {
        let domains = ui.pick_domains(prompt.catalog(), prompt.selected())?;
        prompt.set_selected(&domains);

        let period = ui.pick_period(prompt.period())?;
        prompt.set_period(period);
        if prompt.days().enabled {
            let raw = ui.enter_days(&prompt.days().value)?;
            prompt.set_days(&raw);
        }

        let format = ui.pick_format(prompt.format())?;
        prompt.set_format(format);

        match ui.pick_action(prompt.can_apply())? {
            PromptAction::Apply => {
                if let Some(filter) = prompt.submit() {
                    return Ok(Some(filter));
                }
            }
            PromptAction::Edit => {}
            PromptAction::Reset => prompt.reset(),
            PromptAction::Cancel => {
                prompt.cancel();
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::report::ReportRecord;
    use crate::status::hidden_indicator;
    use std::cell::Cell;
    use std::collections::VecDeque;

    pub(crate) struct FakeSource {
        pub domains: Result<Vec<String>, u16>,
        pub reports: Result<Vec<ReportRecord>, u16>,
        pub domain_calls: Cell<usize>,
        pub report_calls: Cell<usize>,
    }

    impl FakeSource {
        pub fn with_domains(domains: &[&str]) -> Self {
            Self {
                domains: Ok(domains.iter().map(|d| d.to_string()).collect()),
                reports: Ok(Vec::new()),
                domain_calls: Cell::new(0),
                report_calls: Cell::new(0),
            }
        }
    }

    impl ReportSource for FakeSource {
        fn fetch_domains(&self) -> Result<Vec<String>, ClientError> {
            self.domain_calls.set(self.domain_calls.get() + 1);
            self.domains.clone().map_err(|status| ClientError::Status {
                what: "Failed to fetch the report options list",
                status,
            })
        }

        fn fetch_reports(&self, _filter: &FilterState) -> Result<Vec<ReportRecord>, ClientError> {
            self.report_calls.set(self.report_calls.get() + 1);
            self.reports.clone().map_err(|status| ClientError::Status {
                what: "Failed to fetch the report",
                status,
            })
        }
    }

    fn initial() -> FilterState {
        FilterState {
            domains: vec!["b.com".into(), "zzz.org".into()],
            period: Period::LastNDays(14),
            format: Format::Html,
        }
    }

    fn ready(initial: Option<FilterState>) -> OptionsPrompt {
        let mut prompt = OptionsPrompt::open(initial);
        prompt
            .load_catalog(&FakeSource::with_domains(&["a.com", "b.com", "c.com"]))
            .unwrap();
        prompt
    }

    #[test]
    fn period_change_transitions() {
        let field = DaysField {
            enabled: true,
            value: "5".into(),
            remembered: None,
        };
        let off = on_period_change(PeriodKind::LastWeek, &field);
        assert!(!off.enabled);
        assert_eq!(off.value, "");
        assert_eq!(off.remembered.as_deref(), Some("5"));

        let still_off = on_period_change(PeriodKind::LastMonth, &off);
        assert_eq!(still_off.remembered.as_deref(), Some("5"));

        let on = on_period_change(PeriodKind::LastNDays, &still_off);
        assert!(on.enabled);
        assert_eq!(on.value, "5");
    }

    #[test]
    fn period_change_defaults_to_one() {
        let fresh = DaysField::seed(None);
        let on = on_period_change(PeriodKind::LastNDays, &fresh);
        assert_eq!(on.value, "1");
        let off = on_period_change(PeriodKind::LastWeek, &fresh);
        assert_eq!(off.remembered.as_deref(), Some("1"));
    }

    #[test]
    fn controls_disabled_until_catalog_loads() {
        let mut prompt = OptionsPrompt::open(Some(initial()));
        assert_eq!(prompt.state(), PromptState::Loading);
        assert!(!prompt.controls_enabled());
        prompt.set_format(Format::Text);
        assert_eq!(prompt.format(), Format::Html);
        assert!(prompt.submit().is_none());
    }

    #[test]
    fn catalog_fetched_once_and_preselects() {
        let source = FakeSource::with_domains(&["a.com", "b.com"]);
        let mut prompt = OptionsPrompt::open(Some(initial()));
        prompt.load_catalog(&source).unwrap();
        prompt.load_catalog(&source).unwrap();
        assert_eq!(source.domain_calls.get(), 1);
        assert_eq!(prompt.state(), PromptState::Ready);
        assert_eq!(prompt.selected(), ["b.com".to_string()]);
        assert_eq!(prompt.period(), PeriodKind::LastNDays);
        assert_eq!(prompt.days().value, "14");
        assert!(prompt.days().enabled);
    }

    #[test]
    fn catalog_failure_keeps_controls_disabled() {
        let source = FakeSource {
            domains: Err(500),
            ..FakeSource::with_domains(&[])
        };
        let mut prompt = OptionsPrompt::open(None);
        assert!(prompt.load_catalog(&source).is_err());
        assert_eq!(prompt.state(), PromptState::Failed);
        assert!(!prompt.controls_enabled());
        assert!(!prompt.can_apply());
    }

    #[test]
    fn apply_requires_a_domain() {
        let mut prompt = ready(None);
        assert!(!prompt.can_apply());
        assert!(prompt.submit().is_none());
        assert_eq!(prompt.state(), PromptState::Ready);

        prompt.set_selected(&["c.com".to_string(), "unknown.net".to_string()]);
        assert_eq!(prompt.selected(), ["c.com".to_string()]);
        assert!(prompt.can_apply());
    }

    #[test]
    fn submit_builds_filter() {
        let mut prompt = ready(None);
        prompt.set_selected(&["c.com".to_string(), "a.com".to_string()]);
        prompt.set_period(PeriodKind::LastNDays);
        prompt.set_days("-3");
        prompt.set_format(Format::Html);

        let filter = prompt.submit().unwrap();
        assert_eq!(filter.domains, vec!["a.com", "c.com"]);
        assert_eq!(filter.period, Period::LastNDays(1));
        assert_eq!(filter.format, Format::Html);
        assert_eq!(prompt.state(), PromptState::Closed);
        assert_eq!(prompt.result(), Some(&filter));
    }

    #[test]
    fn days_ignored_for_other_periods() {
        let mut prompt = ready(None);
        prompt.set_selected(&["a.com".to_string()]);
        prompt.set_days("9");
        assert_eq!(prompt.days().value, "");
        assert_eq!(prompt.submit().unwrap().period, Period::LastWeek);
    }

    #[test]
    fn reset_restores_initial_fields() {
        let mut prompt = ready(Some(initial()));
        prompt.set_selected(&["a.com".to_string(), "c.com".to_string()]);
        prompt.set_period(PeriodKind::LastMonth);
        prompt.set_format(Format::Text);

        prompt.reset();
        assert_eq!(prompt.selected(), ["b.com".to_string()]);
        assert_eq!(prompt.period(), PeriodKind::LastNDays);
        assert_eq!(prompt.days().value, "14");
        assert_eq!(prompt.format(), Format::Html);
        assert_eq!(prompt.state(), PromptState::Ready);
    }

    #[test]
    fn cancel_yields_nothing() {
        let mut prompt = ready(Some(initial()));
        prompt.cancel();
        assert_eq!(prompt.state(), PromptState::Closed);
        assert!(prompt.result().is_none());
    }

    /// Replays canned answers.
    pub(crate) struct ScriptedUi {
        pub domains: VecDeque<Vec<String>>,
        pub periods: VecDeque<PeriodKind>,
        pub days: VecDeque<String>,
        pub formats: VecDeque<Format>,
        pub actions: VecDeque<PromptAction>,
        pub errors: Vec<String>,
        pub offered_apply: Vec<bool>,
    }

    impl ScriptedUi {
        pub fn new() -> Self {
            Self {
                domains: VecDeque::new(),
                periods: VecDeque::new(),
                days: VecDeque::new(),
                formats: VecDeque::new(),
                actions: VecDeque::new(),
                errors: Vec::new(),
                offered_apply: Vec::new(),
            }
        }
    }

    impl PromptUi for ScriptedUi {
        fn pick_domains(&mut self, _catalog: &[String], selected: &[String]) -> Result<Vec<String>, PromptError> {
            Ok(self.domains.pop_front().unwrap_or_else(|| selected.to_vec()))
        }

        fn pick_period(&mut self, current: PeriodKind) -> Result<PeriodKind, PromptError> {
            Ok(self.periods.pop_front().unwrap_or(current))
        }

        fn enter_days(&mut self, current: &str) -> Result<String, PromptError> {
            Ok(self.days.pop_front().unwrap_or_else(|| current.to_string()))
        }

        fn pick_format(&mut self, current: Format) -> Result<Format, PromptError> {
            Ok(self.formats.pop_front().unwrap_or(current))
        }

        fn pick_action(&mut self, can_apply: bool) -> Result<PromptAction, PromptError> {
            self.offered_apply.push(can_apply);
            Ok(self.actions.pop_front().unwrap_or(PromptAction::Cancel))
        }

        fn report_error(&mut self, err: &ClientError) {
            self.errors.push(err.to_string());
        }
    }

    #[test]
    fn run_prompt_edits_until_apply() {
        let source = FakeSource::with_domains(&["a.com", "b.com"]);
        let mut ui = ScriptedUi::new();
        ui.domains.extend([vec![], vec!["b.com".to_string()]]);
        ui.periods.extend([PeriodKind::LastWeek, PeriodKind::LastNDays]);
        ui.days.push_back("30".into());
        ui.actions.extend([PromptAction::Apply, PromptAction::Apply]);

        let result = run_prompt(None, &source, &mut ui, &hidden_indicator()).unwrap();
        assert_eq!(ui.offered_apply, vec![false, true]);
        assert_eq!(
            result,
            Some(FilterState {
                domains: vec!["b.com".into()],
                period: Period::LastNDays(30),
                format: Format::Text,
            })
        );
    }

    #[test]
    fn reselecting_period_keeps_typed_days() {
        let source = FakeSource::with_domains(&["a.com"]);
        let mut ui = ScriptedUi::new();
        ui.domains.push_back(vec!["a.com".to_string()]);
        ui.periods.extend([PeriodKind::LastNDays, PeriodKind::LastNDays]);
        ui.days.push_back("30".into());
        ui.actions.extend([PromptAction::Edit, PromptAction::Apply]);

        let result = run_prompt(None, &source, &mut ui, &hidden_indicator()).unwrap();
        assert_eq!(result.map(|f| f.period), Some(Period::LastNDays(30)));
    }

    #[test]
    fn same_period_is_not_a_change() {
        let mut prompt = ready(Some(initial()));
        prompt.set_days("21");
        prompt.set_period(PeriodKind::LastNDays);
        assert_eq!(prompt.days().value, "21");

        prompt.set_period(PeriodKind::LastWeek);
        prompt.set_period(PeriodKind::LastNDays);
        assert_eq!(prompt.days().value, "21");
    }

    #[test]
    fn run_prompt_reports_catalog_failure() {
        let source = FakeSource {
            domains: Err(503),
            ..FakeSource::with_domains(&[])
        };
        let mut ui = ScriptedUi::new();
        let result = run_prompt(Some(initial()), &source, &mut ui, &hidden_indicator()).unwrap();
        assert!(result.is_none());
        assert_eq!(ui.errors, vec!["Failed to fetch the report options list"]);
        assert!(ui.offered_apply.is_empty());
    }

    #[test]
    fn run_prompt_cancel() {
        let source = FakeSource::with_domains(&["a.com"]);
        let mut ui = ScriptedUi::new();
        ui.actions.push_back(PromptAction::Cancel);
        let result = run_prompt(Some(initial()), &source, &mut ui, &hidden_indicator()).unwrap();
        assert!(result.is_none());
    }
}
