//! Account domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contacts::{ContactStatus, NewContact};
use crate::errors::{Error, Result, ValidationError};
use crate::utils::serde_utils::{flexible_bool, flexible_datetime, flexible_datetime_opt};

/// Kind of business account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Dealer,
    Organization,
    Individual,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Dealer => "DEALER",
            AccountType::Organization => "ORGANIZATION",
            AccountType::Individual => "INDIVIDUAL",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service level agreed with the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceTier {
    #[default]
    Standard,
    Vip,
    Vvip,
    Blacklist,
}

/// Lifecycle state derived from an account's flags.
///
/// `Purged` is never observed on a fetched account: purged records no
/// longer exist remotely and are tracked by the deletion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountLifecycle {
    Active,
    Inactive,
    Deleted,
    Purged,
}

/// Domain model representing a business account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    #[serde(default)]
    pub account_number: Option<String>,
    pub name: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub service_tier: ServiceTier,
    #[serde(default)]
    pub credit_limit: Decimal,
    /// Dealer code, only meaningful for dealers.
    #[serde(default)]
    pub dealer_code: Option<String>,
    /// Dealer serving this customer, if any. `None` means direct service.
    #[serde(default)]
    pub parent_dealer_id: Option<i64>,
    #[serde(default)]
    pub primary_contact_name: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "flexible_datetime_opt")]
    pub deleted_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub created_at: NaiveDateTime,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub updated_at: NaiveDateTime,
}

impl Account {
    pub fn is_dealer(&self) -> bool {
        self.account_type == AccountType::Dealer
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn lifecycle(&self) -> AccountLifecycle {
        if self.is_deleted() {
            AccountLifecycle::Deleted
        } else if self.is_active {
            AccountLifecycle::Active
        } else {
            AccountLifecycle::Inactive
        }
    }

    /// Name shown as the reporter when the account is picked without a contact.
    pub fn reporter_name(&self) -> &str {
        self.primary_contact_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

fn non_negative_credit(credit_limit: Decimal) -> Result<()> {
    if credit_limit.is_sign_negative() {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "credit_limit must not be negative, got {}",
            credit_limit
        ))));
    }
    Ok(())
}

/// Input model for creating an account, optionally with its primary contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default)]
    pub service_tier: ServiceTier,
    #[serde(default)]
    pub credit_limit: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_dealer_id: Option<i64>,
    /// Created together with the account, always as its PRIMARY contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact: Option<NewContact>,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            email: None,
            phone: None,
            country: None,
            city: None,
            service_tier: ServiceTier::default(),
            credit_limit: Decimal::ZERO,
            dealer_code: None,
            parent_dealer_id: None,
            primary_contact: None,
        }
    }

    pub fn with_primary_contact(mut self, contact: NewContact) -> Self {
        self.primary_contact = Some(contact);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        non_negative_credit(self.credit_limit)?;
        if self.account_type == AccountType::Dealer && self.parent_dealer_id.is_some() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "A dealer cannot be served by another dealer".to_string(),
            )));
        }
        if let Some(contact) = &self.primary_contact {
            contact.validate()?;
        }
        Ok(())
    }

    /// Copy with surrounding whitespace trimmed from the name and the
    /// primary contact forced to PRIMARY.
    pub fn normalized(&self) -> NewAccount {
        NewAccount {
            name: self.name.trim().to_string(),
            primary_contact: self.primary_contact.as_ref().map(|c| NewContact {
                status: Some(ContactStatus::Primary),
                is_primary: true,
                ..c.clone()
            }),
            ..self.clone()
        }
    }
}

/// Partial update of an account's descriptive fields.
///
/// Lifecycle flags are not part of it; they change only through the
/// deletion engine and the dealer workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<ServiceTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_code: Option<String>,
    /// Dealer that serves the account from now on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_dealer_id: Option<i64>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        *self == AccountUpdate::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "No fields to update".to_string(),
            )));
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if let Some(credit_limit) = self.credit_limit {
            non_negative_credit(credit_limit)?;
        }
        Ok(())
    }
}

/// Filter for account listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFilter {
    pub account_type: Option<AccountType>,
    pub is_active: Option<bool>,
}

impl AccountFilter {
    pub fn active_dealers() -> Self {
        Self {
            account_type: Some(AccountType::Dealer),
            is_active: Some(true),
        }
    }

    /// Client-side check, applied on top of whatever the remote filtered.
    pub fn matches(&self, account: &Account) -> bool {
        self.account_type.map_or(true, |t| account.account_type == t)
            && self.is_active.map_or(true, |a| account.is_active == a)
    }
}

/// Counts of historical records attached to an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentCounts {
    /// Sum of the three ticket categories.
    #[serde(default)]
    pub tickets: u32,
    #[serde(default)]
    pub inquiry_tickets: u32,
    #[serde(default)]
    pub rma_tickets: u32,
    #[serde(default)]
    pub dealer_repairs: u32,
    #[serde(default)]
    pub devices: u32,
}

impl DependentCounts {
    pub fn new(inquiry_tickets: u32, rma_tickets: u32, dealer_repairs: u32, devices: u32) -> Self {
        Self {
            tickets: inquiry_tickets + rma_tickets + dealer_repairs,
            inquiry_tickets,
            rma_tickets,
            dealer_repairs,
            devices,
        }
    }

    pub fn has_related_data(&self) -> bool {
        self.tickets > 0
            || self.inquiry_tickets > 0
            || self.rma_tickets > 0
            || self.dealer_repairs > 0
            || self.devices > 0
    }
}
