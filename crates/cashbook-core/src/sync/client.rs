//! Client for the server's "create transaction" endpoint.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::util::{error_message_from_body, normalize_http_base_url, normalize_text_option};

/// Path of the transaction creation route, relative to the API base URL
pub const CREATE_TRANSACTION_PATH: &str = "/api/transactions";

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid submitter configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Transaction HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server rejected transaction: {message} ({status})")]
    Rejected { status: u16, message: String },
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;

/// Forwards one queued payload to the server.
///
/// `Ok(())` means the server confirmed the write (HTTP 2xx); anything else
/// leaves the record queued for the next run.
pub trait TransactionSubmitter: Send + Sync {
    fn submit(&self, payload: &Value) -> impl Future<Output = SubmissionResult<()>> + Send;
}

/// `TransactionSubmitter` over HTTP with a JSON body
#[derive(Clone)]
pub struct HttpTransactionSubmitter {
    base_url: String,
    endpoint: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl fmt::Debug for HttpTransactionSubmitter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpTransactionSubmitter")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl HttpTransactionSubmitter {
    /// Build a submitter for `{api_base_url}/api/transactions`.
    pub fn new(
        api_base_url: impl Into<String>,
        auth_token: Option<String>,
        request_timeout: Duration,
    ) -> SubmissionResult<Self> {
        let base = normalize_base_url(api_base_url.into())?;
        Ok(Self {
            endpoint: format!("{base}{CREATE_TRANSACTION_PATH}"),
            base_url: base,
            auth_token: normalize_text_option(auth_token),
            client: reqwest::Client::builder().timeout(request_timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl TransactionSubmitter for HttpTransactionSubmitter {
    async fn submit(&self, payload: &Value) -> SubmissionResult<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(payload);
        if let Some(token) = self.auth_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SubmissionError::Rejected {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    error_message_from_body(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string)
    })
}

fn normalize_base_url(raw: String) -> SubmissionResult<String> {
    let base = normalize_text_option(Some(raw)).ok_or_else(|| {
        SubmissionError::InvalidConfiguration("API base URL must not be empty".to_string())
    })?;
    normalize_http_base_url(&base).ok_or_else(|| {
        SubmissionError::InvalidConfiguration(
            "API base URL must include http:// or https://".to_string(),
        )
    })
}
