//! Contact domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::utils::serde_utils::{flexible_bool, flexible_datetime};

/// Status of a contact within its account.
///
/// At most one contact per account is `Primary`. `Inactive` is terminal:
/// contacts are never deleted, only deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    Primary,
    #[default]
    Active,
    Inactive,
}

impl ContactStatus {
    /// Display rank: primary first, inactive last.
    pub fn rank(&self) -> u8 {
        match self {
            ContactStatus::Primary => 0,
            ContactStatus::Active => 1,
            ContactStatus::Inactive => 2,
        }
    }
}

/// Domain model representing a person reachable at an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    /// Owning account; never changes after creation.
    pub account_id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub wechat: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_primary: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub created_at: NaiveDateTime,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub updated_at: NaiveDateTime,
}

impl Contact {
    pub fn is_primary(&self) -> bool {
        self.status == ContactStatus::Primary
    }

    pub fn is_inactive(&self) -> bool {
        self.status == ContactStatus::Inactive
    }

    /// Sets the status and keeps `is_primary` in step with it.
    pub fn set_status(&mut self, status: ContactStatus) {
        self.status = status;
        self.is_primary = status == ContactStatus::Primary;
    }

    /// True when the flag and the status disagree (legacy rows).
    pub fn has_inconsistent_flag(&self) -> bool {
        self.is_primary != (self.status == ContactStatus::Primary)
    }
}

/// Input model for creating a new contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub wechat: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<ContactStatus>,
    #[serde(default)]
    pub is_primary: bool,
}

impl NewContact {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if self.status == Some(ContactStatus::Inactive) {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "A new contact cannot start out inactive".to_string(),
            )));
        }
        Ok(())
    }

    pub fn wants_primary(&self) -> bool {
        self.is_primary || self.status == Some(ContactStatus::Primary)
    }

    /// Status the new contact is persisted with.
    pub fn resolved_status(&self) -> ContactStatus {
        if self.wants_primary() {
            ContactStatus::Primary
        } else {
            ContactStatus::Active
        }
    }

    /// Copy with `status` and `is_primary` normalized to agree.
    pub fn normalized(&self) -> NewContact {
        let status = self.resolved_status();
        NewContact {
            status: Some(status),
            is_primary: status == ContactStatus::Primary,
            ..self.clone()
        }
    }
}

/// Partial update of a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wechat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
}

impl ContactUpdate {
    /// Patch that only sets the status (and its matching flag).
    pub fn status(status: ContactStatus) -> Self {
        Self {
            status: Some(status),
            is_primary: Some(status == ContactStatus::Primary),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Contact name cannot be empty".to_string(),
                )));
            }
        }
        match (self.status, self.is_primary) {
            (Some(ContactStatus::Primary), Some(false))
            | (Some(ContactStatus::Active), Some(true))
            | (Some(ContactStatus::Inactive), Some(true)) => {
                Err(Error::Validation(ValidationError::InvalidInput(
                    "status and is_primary disagree".to_string(),
                )))
            }
            _ => Ok(()),
        }
    }

    /// Status this patch asks for, given the contact's current status.
    ///
    /// Returns `None` when the patch does not touch the status.
    pub fn requested_status(&self, current: ContactStatus) -> Option<ContactStatus> {
        match (self.status, self.is_primary) {
            (Some(status), _) => Some(status),
            (None, Some(true)) => Some(ContactStatus::Primary),
            (None, Some(false)) if current == ContactStatus::Primary => {
                Some(ContactStatus::Active)
            }
            _ => None,
        }
    }

    /// Copy of this patch without any status fields.
    pub fn without_status(&self) -> ContactUpdate {
        ContactUpdate {
            status: None,
            is_primary: None,
            ..self.clone()
        }
    }

    pub fn has_field_changes(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.wechat.is_some()
            || self.job_title.is_some()
            || self.department.is_some()
            || self.notes.is_some()
    }
}
