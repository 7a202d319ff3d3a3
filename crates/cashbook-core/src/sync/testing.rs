//! Scripted submitter shared by the sync tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use super::client::{SubmissionError, SubmissionResult, TransactionSubmitter};

#[derive(Clone, Default)]
pub struct FakeSubmitter {
    received: Arc<Mutex<Vec<Value>>>,
    rejected_amounts: Arc<Mutex<HashSet<i64>>>,
    delay: Option<Duration>,
}

impl FakeSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond 503 to every payload whose `amount` equals one of these
    pub fn rejecting(amounts: &[i64]) -> Self {
        let submitter = Self::new();
        submitter
            .rejected_amounts
            .lock()
            .unwrap()
            .extend(amounts.iter().copied());
        submitter
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Stop rejecting anything
    pub fn recover(&self) {
        self.rejected_amounts.lock().unwrap().clear();
    }

    /// Payloads the server accepted, in submission order
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_amounts(&self) -> Vec<i64> {
        self.received()
            .iter()
            .filter_map(|payload| payload.get("amount").and_then(Value::as_i64))
            .collect()
    }
}

impl TransactionSubmitter for FakeSubmitter {
    async fn submit(&self, payload: &Value) -> SubmissionResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let amount = payload.get("amount").and_then(Value::as_i64);
        let rejected = amount.is_some_and(|amount| {
            self.rejected_amounts.lock().unwrap().contains(&amount)
        });
        if rejected {
            return Err(SubmissionError::Rejected {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }

        self.received.lock().unwrap().push(payload.clone());
        Ok(())
    }
}
