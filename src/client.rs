use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AuthError, ClientError, AUTH_REQUIRED_CODE};
use crate::filter::FilterState;
use crate::report::ReportRecord;

const REPORT_FAILED: &str = "Failed to fetch the report";
const OPTIONS_FAILED: &str = "Failed to fetch the report options list";
const DEFAULT_AUTH_TYPE: &str = "base";
const HTTP_AUTH_TYPE: &str = "http";

/// Where report options and reports come from.
pub trait ReportSource {
    /// Domains the server has reports for.
    fn fetch_domains(&self) -> Result<Vec<String>, ClientError>;

    fn fetch_reports(&self, filter: &FilterState) -> Result<Vec<ReportRecord>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct OptionsPayload {
    domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReportsPayload {
    reports: Vec<ReportRecord>,
}

/// Reject the server's error envelope, passing any other payload through.
///
/// An envelope is an object with a non-zero `error_code`. Envelopes carrying
/// an `auth_type`, or the "authentication needed" code, become [`AuthError`]s.
pub fn check_result(payload: Value) -> Result<Value, ClientError> {
    let code = payload
        .get("error_code")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if code == 0 {
        return Ok(payload);
    }

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("Unknown error")
        .to_string();
    let auth_type = payload.get("auth_type").and_then(Value::as_str);

    match auth_type {
        Some(auth_type) => Err(AuthError::new(message)
            .with_code(code)
            .with_auth_type(auth_type)
            .into()),
        None if code == AUTH_REQUIRED_CODE => Err(AuthError::new(message)
            .with_code(code)
            .with_auth_type(DEFAULT_AUTH_TYPE)
            .into()),
        None => Err(ClientError::Envelope { code, message }),
    }
}

/// Query for the report mode of the summary endpoint.
pub fn report_query(filter: &FilterState) -> [(&'static str, String); 4] {
    [
        ("mode", "report".to_string()),
        ("domain", filter.domain_param()),
        ("period", filter.period.to_string()),
        ("format", filter.format.transport().to_string()),
    ]
}

/// Blocking client for `summary.php`.
pub struct SummaryClient {
    client: Client,
    endpoint: Url,
}

impl SummaryClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.base_url)?.join(&config.endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::InvalidHeader(name.as_str().to_string()))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        info!(action = "configure", component = "client", endpoint = %endpoint, "Summary client ready");
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn options_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().clear().append_pair("mode", "options");
        url
    }

    pub fn report_url(&self, filter: &FilterState) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(report_query(filter).iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    fn get_json(&self, url: Url, what: &'static str) -> Result<Value, ClientError> {
        let start_time = Instant::now();
        info!(action = "start", component = "http", url = %url, "Sending request");

        let response = self.client.get(url).send()?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(unauthorized(response));
        }
        if !status.is_success() {
            warn!(action = "complete", component = "http", status = status.as_u16(), "Request failed");
            return Err(ClientError::Status {
                what,
                status: status.as_u16(),
            });
        }

        let payload: Value = response
            .json()
            .map_err(|e| ClientError::Payload(e.to_string()))?;
        info!(
            action = "complete",
            component = "http",
            status = status.as_u16(),
            duration_ms = start_time.elapsed().as_millis(),
            "Request completed"
        );
        check_result(payload)
    }
}

/// Prefer the server's own auth envelope when a 401 carries one.
fn unauthorized(response: reqwest::blocking::Response) -> ClientError {
    let fallback = || {
        ClientError::Auth(
            AuthError::new("Authentication needed")
                .with_code(AUTH_REQUIRED_CODE)
                .with_auth_type(HTTP_AUTH_TYPE),
        )
    };
    match response.json::<Value>().map(check_result) {
        Ok(Err(err @ ClientError::Auth(_))) => err,
        _ => fallback(),
    }
}

impl ReportSource for SummaryClient {
    fn fetch_domains(&self) -> Result<Vec<String>, ClientError> {
        let payload = self.get_json(self.options_url(), OPTIONS_FAILED)?;
        let options: OptionsPayload = serde_json::from_value(payload)?;
        info!(action = "loaded", component = "options", domain_count = options.domains.len(), "Loaded domain list");
        Ok(options.domains)
    }

    fn fetch_reports(&self, filter: &FilterState) -> Result<Vec<ReportRecord>, ClientError> {
        let payload = self.get_json(self.report_url(filter), REPORT_FAILED)?;
        let reports: ReportsPayload = serde_json::from_value(payload)?;
        info!(action = "loaded", component = "report", report_count = reports.reports.len(), "Loaded reports");
        Ok(reports.reports)
    }
}
