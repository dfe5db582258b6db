use crate::domain::payment::{PaymentRequest, ProcessorName};
use crate::error::ProcessorError;
use crate::processors::{ProcessorCall, ProcessorPayload, ProcessorResponse};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub struct HttpPaymentProcessor {
    pub name: ProcessorName,
    pub base_url: String,
    pub timeout: Duration,
    pub client: reqwest::Client,
}

impl HttpPaymentProcessor {
    pub fn new(
        name: ProcessorName,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(50)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> ProcessorError {
        if e.is_timeout() {
            ProcessorError::Timeout {
                processor: self.name.to_string(),
            }
        } else {
            ProcessorError::Transport {
                processor: self.name.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait::async_trait]
impl ProcessorCall for HttpPaymentProcessor {
    fn name(&self) -> ProcessorName {
        self.name
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
        processed_at: DateTime<Utc>,
    ) -> Result<ProcessorResponse, ProcessorError> {
        let url = format!("{}/payments", self.base_url);
        let body = ProcessorPayload::new(request, processed_at);

        let resp = self
            .client
            .post(url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProcessorError::Http {
                processor: self.name.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let v: serde_json::Value = resp.json().await.unwrap_or_default();
        Ok(ProcessorResponse {
            processor: self.name,
            message: v.get("message").and_then(|m| m.as_str()).map(ToString::to_string),
        })
    }
}
