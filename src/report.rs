use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::document::{Block, Cell, Field, Mark, Table};
use crate::utils::{format_address, format_number};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One element of the `reports` array returned by the report endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportRecord {
    pub domain: String,
    /// Server-rendered text, present when plain text was requested.
    #[serde(default)]
    pub text: Option<Vec<String>>,
    #[serde(default)]
    pub data: Option<ReportData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportData {
    pub date_range: DateRange,
    pub summary: Summary,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<SourceStats>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub organizations: Vec<OrganizationStats>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DateRange {
    pub begin: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Summary {
    pub emails: EmailCounts,
    pub organizations: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmailCounts {
    pub total: u64,
    pub dkim_spf_aligned: u64,
    pub dkim_aligned: u64,
    pub spf_aligned: u64,
}

impl EmailCounts {
    /// Messages aligned by DKIM, SPF or both.
    pub fn aligned(&self) -> u64 {
        self.dkim_spf_aligned
            .saturating_add(self.dkim_aligned)
            .saturating_add(self.spf_aligned)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceStats {
    pub ip: String,
    pub emails: u64,
    pub spf_aligned: u64,
    pub dkim_aligned: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganizationStats {
    pub name: String,
    pub emails: u64,
    pub reports: u64,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Round half up.
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

fn ratio_percent(part: u64, whole: u64) -> i64 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0)
}

/// `"0"` for zero, otherwise `"<rounded percent>% (<per>)"`.
pub fn percent_format(per: u64, cent: u64) -> String {
    if per == 0 {
        return "0".to_string();
    }
    format!("{}% ({})", ratio_percent(per, cent), per)
}

/// Renders a single summary report.
pub struct SummaryReport {
    record: ReportRecord,
}

impl SummaryReport {
    pub fn new(record: ReportRecord) -> Self {
        if let Some(data) = &record.data {
            for source in &data.sources {
                if source.spf_aligned > source.emails || source.dkim_aligned > source.emails {
                    warn!(
                        action = "validate",
                        component = "report",
                        domain = %record.domain,
                        ip = %source.ip,
                        emails = source.emails,
                        spf_aligned = source.spf_aligned,
                        dkim_aligned = source.dkim_aligned,
                        "Aligned count exceeds email count"
                    );
                }
            }
        }
        Self { record }
    }

    pub fn record(&self) -> &ReportRecord {
        &self.record
    }

    /// The precomputed text joined with newlines, if the server sent any.
    pub fn as_text(&self) -> Option<String> {
        match &self.record.text {
            Some(lines) if !lines.is_empty() => Some(lines.join("\n")),
            _ => None,
        }
    }

    /// Structured rendition; `None` when the record carries no data.
    pub fn as_structured(&self) -> Option<Vec<Block>> {
        let data = self.record.data.as_ref()?;
        let mut blocks = vec![
            Block::heading(2, format!("Domain: {}", self.record.domain)),
            Block::Paragraph(format!(
                "Range: {} - {}",
                data.date_range.begin.format(DATE_FORMAT),
                data.date_range.end.format(DATE_FORMAT)
            )),
            Block::heading(3, "Summary"),
            Block::Fields(summary_fields(&data.summary)),
        ];

        if !data.sources.is_empty() {
            blocks.push(Block::heading(3, "Sources"));
            blocks.push(Block::Table(sources_table(&data.sources)));
        }
        if !data.organizations.is_empty() {
            blocks.push(Block::heading(3, "Organizations"));
            blocks.push(Block::Table(organizations_table(&data.organizations)));
        }
        Some(blocks)
    }
}

fn summary_fields(summary: &Summary) -> Vec<Field> {
    let total = summary.emails.total;
    let aligned = summary.emails.aligned();
    let not_aligned = total.saturating_sub(aligned);
    vec![
        Field::new("Total", total.to_string()),
        Field::new("DKIM or SPF aligned", percent_format(aligned, total))
            .marked(Mark::Pass.when_nonzero(aligned)),
        Field::new("Not aligned", percent_format(not_aligned, total))
            .marked(Mark::Fail.when_nonzero(not_aligned)),
        Field::new("Organizations", summary.organizations.to_string()),
    ]
}

fn sources_table(sources: &[SourceStats]) -> Table {
    let head = vec![
        vec![
            Cell::new("IP address").span(1, 2),
            Cell::new("Email volume").span(1, 2),
            Cell::new("SPF").span(3, 1),
            Cell::new("DKIM").span(3, 1),
        ],
        ["pass", "fail", "rate", "pass", "fail", "rate"]
            .into_iter()
            .map(Cell::new)
            .collect(),
    ];

    let body = sources
        .iter()
        .map(|source| {
            let mut row = vec![
                Cell::new(format_address(&source.ip)),
                Cell::new(format_number(source.emails)),
            ];
            for aligned in [source.spf_aligned, source.dkim_aligned] {
                let failed = source.emails.saturating_sub(aligned);
                row.push(Cell::new(format_number(aligned)).marked(Mark::Pass.when_nonzero(aligned)));
                row.push(Cell::new(format_number(failed)).marked(Mark::Fail.when_nonzero(failed)));
                row.push(Cell::new(format!("{}%", ratio_percent(aligned, source.emails))));
            }
            row
        })
        .collect();

    Table {
        caption: Some(format!("Total records: {}", sources.len())),
        head,
        body,
    }
}

fn organizations_table(organizations: &[OrganizationStats]) -> Table {
    Table {
        caption: Some(format!("Total records: {}", organizations.len())),
        head: vec![["Name", "Emails", "Reports"].into_iter().map(Cell::new).collect()],
        body: organizations
            .iter()
            .map(|org| {
                vec![
                    Cell::new(org.name.clone()),
                    Cell::new(format_number(org.emails)),
                    Cell::new(format_number(org.reports)),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> ReportRecord {
        serde_json::from_value(value).unwrap()
    }

    fn full_record() -> ReportRecord {
        record(json!({
            "domain": "example.com",
            "data": {
                "date_range": {
                    "begin": "2024-03-01T00:00:00+00:00",
                    "end": "2024-03-07T23:59:59+00:00"
                },
                "summary": {
                    "emails": { "total": 1500, "dkim_spf_aligned": 1000, "dkim_aligned": 100, "spf_aligned": 50 },
                    "organizations": 2
                },
                "sources": [
                    { "ip": "192.0.2.1", "emails": 1200, "spf_aligned": 1200, "dkim_aligned": 899 },
                    { "ip": "2001:db8::5", "emails": 3, "spf_aligned": 0, "dkim_aligned": 2 }
                ],
                "organizations": [
                    { "name": "google.com", "emails": 1400, "reports": 7 },
                    { "name": "Mail.Ru", "emails": 100, "reports": 1 }
                ]
            }
        }))
    }

    #[test]
    fn percent_format_rules() {
        assert_eq!(percent_format(0, 0), "0");
        assert_eq!(percent_format(0, 17), "0");
        assert_eq!(percent_format(1, 3), "33% (1)");
        assert_eq!(percent_format(1, 8), "13% (1)");
        assert_eq!(percent_format(1, 4), "25% (1)");
        assert_eq!(percent_format(5, 5), "100% (5)");
        assert_eq!(percent_format(5, 0), "0% (5)");
    }

    #[test]
    fn aligned_total_saturates() {
        let counts = EmailCounts {
            total: u64::MAX,
            dkim_spf_aligned: u64::MAX,
            dkim_aligned: 2,
            spf_aligned: 3,
        };
        assert_eq!(counts.aligned(), u64::MAX);
    }

    #[test]
    fn text_lines_are_joined() {
        let report = SummaryReport::new(record(json!({
            "domain": "example.com",
            "text": ["line one", "line two"]
        })));
        assert_eq!(report.as_text().as_deref(), Some("line one\nline two"));
        assert!(report.as_structured().is_none());
    }

    #[test]
    fn empty_or_null_text_falls_back() {
        let empty = SummaryReport::new(record(json!({ "domain": "a.com", "text": [] })));
        let null = SummaryReport::new(record(json!({ "domain": "a.com", "text": null })));
        assert!(empty.as_text().is_none());
        assert!(null.as_text().is_none());
    }

    #[test]
    fn structured_summary() {
        let blocks = SummaryReport::new(full_record()).as_structured().unwrap();
        assert_eq!(blocks[0], Block::heading(2, "Domain: example.com"));
        assert_eq!(blocks[1], Block::Paragraph("Range: 2024-03-01 - 2024-03-07".into()));
        assert_eq!(blocks[2], Block::heading(3, "Summary"));
        let Block::Fields(fields) = &blocks[3] else {
            panic!("expected summary fields");
        };
        assert_eq!(fields[0].display_value(), "1500");
        assert_eq!(fields[1].display_value(), "77% (1150)");
        assert_eq!(fields[1].mark, Some(Mark::Pass));
        assert_eq!(fields[2].display_value(), "23% (350)");
        assert_eq!(fields[2].mark, Some(Mark::Fail));
        assert_eq!(fields[3].display_value(), "2");
    }

    #[test]
    fn sources_table_rows() {
        let blocks = SummaryReport::new(full_record()).as_structured().unwrap();
        assert_eq!(blocks[4], Block::heading(3, "Sources"));
        let Block::Table(table) = &blocks[5] else {
            panic!("expected sources table");
        };
        assert_eq!(table.caption.as_deref(), Some("Total records: 2"));
        assert_eq!(table.head[0][2].colspan, 3);
        assert_eq!(table.head[0][0].rowspan, 2);

        let texts: Vec<&str> = table.body[0].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["192.0.2.1", "1,200", "1,200", "0", "100%", "899", "301", "75%"]);
        assert_eq!(table.body[0][2].mark, Some(Mark::Pass));
        assert_eq!(table.body[0][3].mark, None);
        assert_eq!(table.body[0][6].mark, Some(Mark::Fail));

        let texts: Vec<&str> = table.body[1].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["2001:db8::5", "3", "0", "3", "0%", "2", "1", "67%"]);
        assert_eq!(table.body[1][2].mark, None);
    }

    #[test]
    fn organizations_table_rows() {
        let blocks = SummaryReport::new(full_record()).as_structured().unwrap();
        assert_eq!(blocks[6], Block::heading(3, "Organizations"));
        let Block::Table(table) = &blocks[7] else {
            panic!("expected organizations table");
        };
        let texts: Vec<&str> = table.body[0].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["google.com", "1,400", "7"]);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let report = SummaryReport::new(record(json!({
            "domain": "quiet.org",
            "text": null,
            "data": {
                "date_range": { "begin": "2024-03-01T00:00:00Z", "end": "2024-03-02T00:00:00Z" },
                "summary": {
                    "emails": { "total": 0, "dkim_spf_aligned": 0, "dkim_aligned": 0, "spf_aligned": 0 },
                    "organizations": 0
                },
                "sources": null,
                "organizations": []
            }
        })));
        let blocks = report.as_structured().unwrap();
        assert_eq!(blocks.len(), 4);
        let Block::Fields(fields) = &blocks[3] else {
            panic!("expected summary fields");
        };
        assert_eq!(fields[1].display_value(), "0");
        assert_eq!(fields[1].mark, None);
        assert_eq!(fields[2].mark, None);
    }
}
