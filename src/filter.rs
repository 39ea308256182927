use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::domain::{join_domain_list, split_domain_list};

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 9999;

/// Which kind of period the user picked, without the day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    LastWeek,
    LastMonth,
    LastNDays,
}

impl PeriodKind {
    pub const ALL: [PeriodKind; 3] = [
        PeriodKind::LastWeek,
        PeriodKind::LastMonth,
        PeriodKind::LastNDays,
    ];

    pub fn token(self) -> &'static str {
        match self {
            PeriodKind::LastWeek => "lastweek",
            PeriodKind::LastMonth => "lastmonth",
            PeriodKind::LastNDays => "lastndays",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PeriodKind::LastWeek => "Last week",
            PeriodKind::LastMonth => "Last month",
            PeriodKind::LastNDays => "Last N days",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        PeriodKind::ALL.into_iter().find(|k| k.token() == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    LastWeek,
    LastMonth,
    LastNDays(u32),
}

impl Period {
    pub fn kind(self) -> PeriodKind {
        match self {
            Period::LastWeek => PeriodKind::LastWeek,
            Period::LastMonth => PeriodKind::LastMonth,
            Period::LastNDays(_) => PeriodKind::LastNDays,
        }
    }

    pub fn days(self) -> Option<u32> {
        match self {
            Period::LastNDays(n) => Some(n),
            _ => None,
        }
    }
}

/// Parse a user-entered day count: anything unparsable or below one becomes 1.
pub fn parse_days(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= MIN_DAYS as i64 => n.min(MAX_DAYS as i64) as u32,
        _ => MIN_DAYS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodParseError(String);

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown period '{}'", self.0)
    }
}

impl std::error::Error for PeriodParseError {}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, days) = match s.split_once(':') {
            Some((token, days)) => (token, Some(days)),
            None => (s, None),
        };
        match PeriodKind::from_token(token) {
            Some(PeriodKind::LastWeek) => Ok(Period::LastWeek),
            Some(PeriodKind::LastMonth) => Ok(Period::LastMonth),
            Some(PeriodKind::LastNDays) => Ok(Period::LastNDays(parse_days(days.unwrap_or("")))),
            None => Err(PeriodParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::LastNDays(n) => write!(f, "{}:{}", PeriodKind::LastNDays.token(), n),
            other => f.write_str(other.kind().token()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Html,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Text, Format::Html];

    /// Lenient parse: only "html" selects HTML.
    pub fn from_param(value: &str) -> Self {
        if value == "html" {
            Format::Html
        } else {
            Format::Text
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Html => "html",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Format::Text => "Plain text",
            Format::Html => "HTML",
        }
    }

    /// Value the report endpoint expects in its `format` parameter.
    pub fn transport(self) -> &'static str {
        match self {
            Format::Html => "raw",
            Format::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The report selection carried in the page location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub domains: Vec<String>,
    pub period: Period,
    pub format: Format,
}

impl FilterState {
    pub fn domain_param(&self) -> String {
        join_domain_list(&self.domains)
    }
}

/// Read the filter from `domain`, `period` and `format` query parameters.
///
/// Both `domain` and `period` have to be present and usable, otherwise no
/// filter is selected.
pub fn read_filter_from_location(location: &Url) -> Option<FilterState> {
    let mut domain = None;
    let mut period = None;
    let mut format = None;
    for (key, value) in location.query_pairs() {
        match key.as_ref() {
            "domain" if domain.is_none() => domain = Some(value.into_owned()),
            "period" if period.is_none() => period = Some(value.into_owned()),
            "format" if format.is_none() => format = Some(value.into_owned()),
            _ => {}
        }
    }

    let domains = split_domain_list(&domain?);
    if domains.is_empty() {
        return None;
    }
    let period = match period?.parse::<Period>() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(action = "parse", component = "location", error = %e, "Ignoring report options");
            return None;
        }
    };
    let format = format
        .filter(|f| !f.is_empty())
        .map(|f| Format::from_param(&f))
        .unwrap_or_default();

    Some(FilterState {
        domains,
        period,
        format,
    })
}

/// Replace the filter parameters in `location`, keeping any others intact.
pub fn write_filter_to_location(location: &mut Url, filter: &FilterState) {
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(k, _)| !matches!(k.as_ref(), "domain" | "period" | "format"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut pairs = location.query_pairs_mut();
    pairs.clear();
    for (k, v) in &kept {
        pairs.append_pair(k, v);
    }
    pairs.append_pair("domain", &filter.domain_param());
    pairs.append_pair("period", &filter.period.to_string());
    pairs.append_pair("format", filter.format.token());
}
