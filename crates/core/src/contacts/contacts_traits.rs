//! Contact remote and service traits.

use async_trait::async_trait;

use super::contacts_model::{Contact, ContactUpdate, NewContact};
use crate::errors::Result;

/// Contact operations exposed by the remote data service.
///
/// Implementations map transport failures to `Error::Unavailable`.
#[async_trait]
pub trait ContactRemoteTrait: Send + Sync {
    /// Lists the contacts of an account. Inactive ones only when asked.
    async fn list_contacts(&self, account_id: i64, include_inactive: bool) -> Result<Vec<Contact>>;

    async fn get_contact(&self, contact_id: i64) -> Result<Contact>;

    /// Persists a new contact exactly as given; no demotion happens remotely.
    async fn create_contact(&self, account_id: i64, new_contact: NewContact) -> Result<Contact>;

    async fn update_contact(&self, contact_id: i64, patch: ContactUpdate) -> Result<Contact>;

    /// Sets the contact INACTIVE and clears its primary flag.
    async fn deactivate_contact(&self, contact_id: i64) -> Result<Contact>;
}

/// Contact status engine operations.
///
/// Every mutation returns the account's full contact collection after the
/// change, sorted for display.
#[async_trait]
pub trait ContactServiceTrait: Send + Sync {
    async fn list_contacts(&self, account_id: i64, include_inactive: bool) -> Result<Vec<Contact>>;

    async fn set_primary(&self, account_id: i64, contact_id: i64) -> Result<Vec<Contact>>;

    async fn create(&self, account_id: i64, new_contact: NewContact) -> Result<Vec<Contact>>;

    async fn update(&self, contact_id: i64, patch: ContactUpdate) -> Result<Vec<Contact>>;

    async fn deactivate(&self, contact_id: i64) -> Result<Vec<Contact>>;

    /// Deactivates every contact of the account that is not already inactive.
    async fn deactivate_all(&self, account_id: i64) -> Result<Vec<Contact>>;
}
