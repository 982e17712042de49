//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::accounts::AccountType;
use crate::dealers::TransferTarget;

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about account and contact changes. Host
/// adapters translate them into platform-specific actions (list refresh,
/// notifications, audit trails, etc.).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Contacts of an account were created, updated, or deactivated.
    ContactsChanged {
        account_id: i64,
        contact_ids: Vec<i64>,
    },

    AccountCreated {
        account_id: i64,
        account_type: AccountType,
    },

    /// Descriptive fields of an account changed.
    AccountUpdated { account_id: i64 },

    /// A non-dealer account was deactivated instead of deleted.
    AccountDeactivated { account_id: i64 },

    /// An account was moved to the deleted list.
    AccountSoftDeleted { account_id: i64 },

    /// A soft-deleted account was brought back.
    AccountRestored { account_id: i64 },

    /// An account and its contacts were removed permanently.
    AccountPurged { account_id: i64 },

    /// A dealer was retired and its customers handed over.
    DealerDeactivated {
        account_id: i64,
        transfer: TransferTarget,
        transferred_accounts: u32,
    },

    DealerReactivated { account_id: i64 },

    AccountTypeConverted {
        account_id: i64,
        old_type: AccountType,
        new_type: AccountType,
    },
}

impl DomainEvent {
    pub fn contacts_changed(account_id: i64, contact_ids: Vec<i64>) -> Self {
        Self::ContactsChanged {
            account_id,
            contact_ids,
        }
    }

    pub fn dealer_deactivated(
        account_id: i64,
        transfer: TransferTarget,
        transferred_accounts: u32,
    ) -> Self {
        Self::DealerDeactivated {
            account_id,
            transfer,
            transferred_accounts,
        }
    }

    /// Account the event is about.
    pub fn account_id(&self) -> i64 {
        match self {
            DomainEvent::ContactsChanged { account_id, .. }
            | DomainEvent::AccountCreated { account_id, .. }
            | DomainEvent::AccountUpdated { account_id }
            | DomainEvent::AccountDeactivated { account_id }
            | DomainEvent::AccountSoftDeleted { account_id }
            | DomainEvent::AccountRestored { account_id }
            | DomainEvent::AccountPurged { account_id }
            | DomainEvent::DealerDeactivated { account_id, .. }
            | DomainEvent::DealerReactivated { account_id }
            | DomainEvent::AccountTypeConverted { account_id, .. } => *account_id,
        }
    }
}
