//! Dealer succession models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::accounts::Account;
use crate::contacts::Contact;
use crate::errors::{Error, Result, ValidationError};
use crate::utils::serde_utils::flexible_datetime;

/// How a retired dealer's customers are served afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferType {
    /// Customers become direct-service accounts.
    #[default]
    Direct,
    /// Customers move to another active dealer.
    SuccessorDealer,
}

/// Caller's request to deactivate a dealer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeactivationRequest {
    pub reason: String,
    #[serde(default)]
    pub transfer_type: TransferType,
    #[serde(default)]
    pub successor_account_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DeactivationRequest {
    pub fn direct(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Default::default()
        }
    }

    pub fn to_successor(reason: impl Into<String>, successor_account_id: i64) -> Self {
        Self {
            reason: reason.into(),
            transfer_type: TransferType::SuccessorDealer,
            successor_account_id: Some(successor_account_id),
            notes: None,
        }
    }

    /// Checks the fields that need no remote lookup.
    ///
    /// The successor itself is verified against the remote by the service.
    pub fn validate_shape(&self) -> Result<()> {
        if self.reason.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "reason".to_string(),
            )));
        }
        match (self.transfer_type, self.successor_account_id) {
            (TransferType::SuccessorDealer, None) => Err(Error::Validation(
                ValidationError::MissingField("successor_account_id".to_string()),
            )),
            (TransferType::Direct, Some(_)) => {
                Err(Error::Validation(ValidationError::InvalidInput(
                    "successor_account_id is only allowed with SUCCESSOR_DEALER".to_string(),
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Resolved destination for a retired dealer's customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "successor_account_id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferTarget {
    /// Sentinel for direct service by the manufacturer.
    DirectService,
    Successor(i64),
}

impl TransferTarget {
    pub fn successor_id(&self) -> Option<i64> {
        match self {
            TransferTarget::DirectService => None,
            TransferTarget::Successor(id) => Some(*id),
        }
    }
}

/// Validated command handed to the remote once every check has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerDeactivationCommand {
    pub reason: String,
    pub transfer: TransferTarget,
    pub notes: Option<String>,
}

/// What the remote reports after deactivating a dealer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationOutcome {
    #[serde(default)]
    pub transferred_accounts: u32,
}

/// Result of the whole succession workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerDeactivation {
    pub account_id: i64,
    pub transfer: TransferTarget,
    pub transferred_accounts: u32,
    /// The dealer's contacts after the cascade; all INACTIVE.
    pub contacts: Vec<Contact>,
}

/// One customer moved away from a dealer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: i64,
    pub account_id: i64,
    #[serde(default)]
    pub account_name: Option<String>,
    pub from_dealer_id: i64,
    #[serde(default)]
    pub to_dealer_id: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub transfer_type: TransferType,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub transferred_at: NaiveDateTime,
}

/// Candidate successors for a dealer being retired.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuccessorOptions {
    pub dealers: Vec<Account>,
}

impl SuccessorOptions {
    /// The SUCCESSOR_DEALER option is offered only when a candidate exists.
    pub fn successor_available(&self) -> bool {
        !self.dealers.is_empty()
    }
}
