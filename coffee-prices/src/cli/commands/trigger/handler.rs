//! Trigger command handler
//!
//! Prints the response the way a hosting runtime would send it: status
//! line, headers, blank line, body.

use std::process::ExitCode;

use anyhow::Result;

use super::TriggerArgs;
use crate::api::trigger::{self, CorsPolicy, TriggerResponse};
use crate::cli::open_store;
use crate::config::Config;
use crate::ingest::{self, IngestError};

pub async fn handle_trigger_command(args: TriggerArgs, config: Config) -> Result<ExitCode> {
    let response = dispatch(&args.method, &config).await;
    print!("{}", render(&response));

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Answer one request; the database is only opened for a run
async fn dispatch(method: &str, config: &Config) -> TriggerResponse {
    let cors = CorsPolicy::for_environment(config.environment, &config.allowed_origin);
    let ingest_config = config.ingest_config();
    let ingest_config = &ingest_config;

    trigger::handle(method, &cors, move || async move {
        let store = open_store(config)
            .await
            .map_err(|e| IngestError::Store(format!("{:#}", e)))?;
        ingest::run(ingest_config, &store).await
    })
    .await
}

fn render(response: &TriggerResponse) -> String {
    let mut out = format!("{}\n", response.status);
    for (name, value) in &response.headers {
        out.push_str(&format!("{}: {}\n", name, value));
    }
    out.push('\n');
    out.push_str(&response.body);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use reqwest::StatusCode;

    fn unreachable_database() -> Config {
        Config {
            database_url: "sqlite:///nonexistent-coffee-prices-dir/nested/prices.db".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_render_preflight() {
        let cors = CorsPolicy::for_environment(Environment::Development, "");
        let response = trigger::handle("OPTIONS", &cors, || async {
            Err(IngestError::Decode("unused".to_string()))
        })
        .await;

        let rendered = render(&response);
        assert!(rendered.starts_with("200 OK\n"));
        assert!(rendered.contains("access-control-allow-origin: *\n"));
        assert!(rendered.ends_with("\n\nok\n"));
    }

    #[tokio::test]
    async fn test_preflight_does_not_touch_the_database() {
        let response = dispatch("OPTIONS", &unreachable_database()).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn test_rejected_method_does_not_touch_the_database() {
        let response = dispatch("DELETE", &unreachable_database()).await;
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_post_reports_database_failure_as_500() {
        let response = dispatch("POST", &unreachable_database()).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body.contains("error"));
    }
}
