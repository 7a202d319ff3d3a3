//! Transaction draft model
//!
//! The fields a user fills in when recording a cash movement. Drafts are
//! validated here and then handed to the queue as an opaque JSON payload.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Direction of a cash movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    CashIn,
    CashOut,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CashIn => write!(f, "cash_in"),
            Self::CashOut => write!(f, "cash_out"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cash_in" | "in" => Ok(Self::CashIn),
            "cash_out" | "out" => Ok(Self::CashOut),
            other => Err(Error::InvalidInput(format!(
                "unknown transaction type '{other}' (expected cash_in or cash_out)"
            ))),
        }
    }
}

/// A transaction as collected offline, before the server assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
}

impl TransactionDraft {
    /// Create a draft with only the required fields
    #[must_use]
    pub const fn new(kind: TransactionKind, amount: f64) -> Self {
        Self {
            kind,
            amount,
            transaction_date: None,
            description: None,
            category_id: None,
            party_name: None,
        }
    }

    #[must_use]
    pub fn with_date(mut self, date: Option<String>) -> Self {
        self.transaction_date = date;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category_id: Option<String>) -> Self {
        self.category_id = category_id;
        self
    }

    #[must_use]
    pub fn with_party(mut self, party_name: Option<String>) -> Self {
        self.party_name = party_name;
        self
    }

    /// Trim optional text, drop empty values and check amount and date.
    pub fn validate(self) -> Result<Self> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidInput(
                "amount must be a positive number".to_string(),
            ));
        }

        let transaction_date = normalize_text_option(self.transaction_date);
        if let Some(date) = transaction_date.as_deref() {
            NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                Error::InvalidInput(format!("transaction date '{date}' must be YYYY-MM-DD"))
            })?;
        }

        Ok(Self {
            kind: self.kind,
            amount: self.amount,
            transaction_date,
            description: normalize_text_option(self.description),
            category_id: normalize_text_option(self.category_id),
            party_name: normalize_text_option(self.party_name),
        })
    }

    /// Render the payload the "create transaction" endpoint accepts
    pub fn to_payload(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
