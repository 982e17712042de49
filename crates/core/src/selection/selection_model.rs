//! Selection state models.

use serde::{Deserialize, Serialize};

use crate::accounts::Account;
use crate::contacts::Contact;

/// Progress of the account search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Results,
    NoResults,
}

/// How far the account -> contact cascade has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionStage {
    NoAccountSelected,
    AccountSelected,
    ContactSelected,
}

/// Everything a selector widget needs to render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionState {
    pub query: String,
    pub phase: SearchPhase,
    pub candidate_accounts: Vec<Account>,
    pub selected_account: Option<Account>,
    /// Active contacts of the selected account, sorted for display.
    pub contacts: Vec<Contact>,
    pub selected_contact: Option<Contact>,
}

impl SelectionState {
    pub fn stage(&self) -> SelectionStage {
        match (&self.selected_account, &self.selected_contact) {
            (None, _) => SelectionStage::NoAccountSelected,
            (Some(_), None) => SelectionStage::AccountSelected,
            (Some(_), Some(_)) => SelectionStage::ContactSelected,
        }
    }

    /// A selected contact always belongs to the selected account.
    pub fn is_consistent(&self) -> bool {
        match (&self.selected_account, &self.selected_contact) {
            (Some(account), Some(contact)) => contact.account_id == account.id,
            (None, Some(_)) => false,
            _ => true,
        }
    }

    pub fn value(&self) -> SelectionValue {
        let reporter_name = match (&self.selected_contact, &self.selected_account) {
            (Some(contact), _) => Some(contact.name.clone()),
            (None, Some(account)) => Some(account.reporter_name().to_string()),
            (None, None) => None,
        };
        SelectionValue {
            account_id: self.selected_account.as_ref().map(|a| a.id),
            contact_id: self.selected_contact.as_ref().map(|c| c.id),
            reporter_name,
        }
    }
}

/// Selection exchanged with the host form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionValue {
    pub account_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub reporter_name: Option<String>,
}

impl SelectionValue {
    pub fn new(account_id: i64, contact_id: Option<i64>) -> Self {
        Self {
            account_id: Some(account_id),
            contact_id,
            reporter_name: None,
        }
    }
}
