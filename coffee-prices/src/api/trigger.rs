//! The update-coffee-prices trigger
//!
//! `OPTIONS` answers the CORS preflight, `POST` runs one ingestion, anything
//! else is rejected. Every response carries the CORS headers.

use std::future::Future;
use std::time::Instant;

use log::{error, info, warn};
use reqwest::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::Environment;
use crate::ingest::{IngestError, IngestReport, PriceRecord};

pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Which origin the trigger answers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origin: String,
}

impl CorsPolicy {
    /// `*` in development, `production_origin` in production
    pub fn for_environment(environment: Environment, production_origin: &str) -> Self {
        let allow_origin = match environment {
            Environment::Production => production_origin.to_string(),
            Environment::Development => "*".to_string(),
        };
        Self { allow_origin }
    }

    pub fn allow_origin(&self) -> &str {
        &self.allow_origin
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            (ACCESS_CONTROL_ALLOW_ORIGIN.to_string(), self.allow_origin.clone()),
            (ACCESS_CONTROL_ALLOW_HEADERS.to_string(), ALLOWED_HEADERS.to_string()),
            (ACCESS_CONTROL_ALLOW_METHODS.to_string(), ALLOWED_METHODS.to_string()),
        ]
    }
}

/// Status, headers and body handed back to the hosting runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TriggerResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    fn text(status: StatusCode, cors: &CorsPolicy, body: &str) -> Self {
        Self {
            status,
            headers: cors.headers(),
            body: body.to_string(),
        }
    }

    fn json<T: Serialize>(status: StatusCode, cors: &CorsPolicy, body: &T) -> Self {
        let body = serde_json::to_string(body)
            .unwrap_or_else(|e| format!(r#"{{"error":"failed to encode response: {}"}}"#, e));
        let mut headers = cors.headers();
        headers.push((CONTENT_TYPE.to_string(), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub success: bool,
    pub latest_price: Option<PriceRecord>,
    pub summary: SummaryBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody {
    pub total_records: usize,
    pub new_records_inserted: usize,
    pub existing_records_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&IngestReport> for SuccessBody {
    fn from(report: &IngestReport) -> Self {
        let summary = &report.summary;
        Self {
            success: true,
            latest_price: summary.latest_record,
            summary: SummaryBody {
                total_records: summary.total_records(),
                new_records_inserted: summary.new_records_inserted,
                existing_records_skipped: summary.existing_records_skipped,
            },
        }
    }
}

/// Dispatch one inbound request
///
/// `ingest` is only invoked for `POST`.
pub async fn handle<F, Fut>(method: &str, cors: &CorsPolicy, ingest: F) -> TriggerResponse
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<IngestReport, IngestError>>,
{
    let parsed = method.trim().to_ascii_uppercase().parse::<Method>().ok();

    if parsed == Some(Method::OPTIONS) {
        return TriggerResponse::text(StatusCode::OK, cors, "ok");
    }

    if parsed != Some(Method::POST) {
        warn!("Rejected {} request", method);
        return TriggerResponse::json(
            StatusCode::METHOD_NOT_ALLOWED,
            cors,
            &ErrorBody {
                error: "Method not allowed".to_string(),
            },
        );
    }

    let started = Instant::now();
    info!("{}", start_message(method));
    let result = ingest().await;
    let elapsed_ms = started.elapsed().as_millis();

    match &result {
        Ok(report) => info!(
            "Coffee price update finished in {}ms: {} new, {} skipped",
            elapsed_ms,
            report.summary.new_records_inserted,
            report.summary.existing_records_skipped
        ),
        Err(e) => error!("Coffee price update failed after {}ms: {}", elapsed_ms, e),
    }

    respond(result, cors)
}

fn start_message(method: &str) -> String {
    format!(
        "{} update-coffee-prices: starting coffee price update",
        method.trim().to_ascii_uppercase()
    )
}

/// Map a finished run onto the response payload
pub fn respond(result: Result<IngestReport, IngestError>, cors: &CorsPolicy) -> TriggerResponse {
    match result {
        Ok(report) => TriggerResponse::json(StatusCode::OK, cors, &SuccessBody::from(&report)),
        Err(e) => TriggerResponse::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            cors,
            &ErrorBody {
                error: e.to_string(),
            },
        ),
    }
}
