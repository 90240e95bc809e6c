//! Upstream engagement reporting.
//!
//! [`HttpReporter`] POSTs each [`EngagementReport`] as JSON to a configured
//! endpoint. There is no retry: a lost report is logged and forgotten.

use std::time::Duration;

use async_trait::async_trait;
use chapel_core::engagement::EngagementReport;

use crate::error::NotifyError;

/// HTTP request timeout for a single report.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait EngagementReporter: Send + Sync {
    async fn report(&self, report: &EngagementReport) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// HttpReporter
// ---------------------------------------------------------------------------

pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EngagementReporter for HttpReporter {
    async fn report(&self, report: &EngagementReport) -> Result<(), NotifyError> {
        let response = self.client.post(&self.endpoint).json(report).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogReporter
// ---------------------------------------------------------------------------

/// Writes reports to the log. Used when no endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

#[async_trait]
impl EngagementReporter for LogReporter {
    async fn report(&self, report: &EngagementReport) -> Result<(), NotifyError> {
        tracing::info!(
            action = %report.action,
            notification_id = %report.notification_id,
            notification_type = report.notification_type.as_str(),
            "Notification engagement"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapel_core::notification::NotificationCategory;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn report() -> EngagementReport {
        EngagementReport {
            action: "pray".into(),
            notification_id: "p-1".into(),
            notification_type: NotificationCategory::Prayer,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn posts_camel_case_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notifications/engagement"))
            .and(body_partial_json(serde_json::json!({
                "action": "pray",
                "notificationId": "p-1",
                "notificationType": "prayer",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let reporter =
            HttpReporter::new(format!("{}/api/notifications/engagement", server.uri())).unwrap();
        reporter.report(&report()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let reporter = HttpReporter::new(server.uri()).unwrap();
        let err = reporter.report(&report()).await.unwrap_err();
        assert!(matches!(err, NotifyError::HttpStatus(503)));
    }

    #[tokio::test]
    async fn log_reporter_never_fails() {
        assert!(LogReporter.report(&report()).await.is_ok());
    }
}
