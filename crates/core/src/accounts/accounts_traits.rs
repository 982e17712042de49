//! Account remote and service traits.
//!
//! These traits define the contract for account operations without any
//! transport-specific types, allowing for different remote implementations.

use async_trait::async_trait;

use super::accounts_model::{
    Account, AccountFilter, AccountType, AccountUpdate, DependentCounts, NewAccount,
};
use crate::dealers::{DeactivationOutcome, DealerDeactivationCommand, TransferRecord};
use crate::errors::Result;

/// Trait defining the account operations of the remote data service.
///
/// The remote owns all authoritative state and is expected to make each
/// call atomic. Transport failures surface as `Error::Unavailable`.
#[async_trait]
pub trait AccountRemoteTrait: Send + Sync {
    /// Searches accounts by name, email or phone.
    async fn search_accounts(&self, query: &str, page_size: u32) -> Result<Vec<Account>>;

    async fn get_account(&self, account_id: i64) -> Result<Account>;

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;

    /// Creates the account and, if given, its PRIMARY contact in one write.
    async fn create_account(&self, new_account: &NewAccount) -> Result<Account>;

    async fn update_account(&self, account_id: i64, patch: &AccountUpdate) -> Result<Account>;

    /// Counts tickets (by category) and devices attached to the account.
    async fn dependent_counts(&self, account_id: i64) -> Result<DependentCounts>;

    /// Marks a non-dealer account inactive.
    async fn deactivate_account(&self, account_id: i64) -> Result<Account>;

    /// Marks a dealer inactive, reassigns its customers and sets its
    /// contacts INACTIVE in one transaction.
    ///
    /// The remote leaves `is_primary` set on the former primary; the
    /// engine's `deactivate_all` afterwards clears such leftover flags.
    async fn deactivate_dealer(
        &self,
        account_id: i64,
        command: &DealerDeactivationCommand,
    ) -> Result<DeactivationOutcome>;

    async fn reactivate_dealer(&self, account_id: i64, reason: &str) -> Result<Account>;

    async fn transfer_history(&self, account_id: i64) -> Result<Vec<TransferRecord>>;

    /// Marks the account deleted. The backend also clears `is_active`.
    async fn soft_delete_account(&self, account_id: i64) -> Result<()>;

    /// Clears the deleted mark and sets `is_active` in the same write.
    async fn restore_account(&self, account_id: i64, is_active: bool) -> Result<Account>;

    /// Permanently removes the account and its contacts.
    async fn purge_account(&self, account_id: i64) -> Result<()>;

    async fn convert_account_type(
        &self,
        account_id: i64,
        new_type: AccountType,
        reason: &str,
    ) -> Result<Account>;
}

/// Trait defining the contract for account read and conversion operations.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    /// Retrieves an account, served from the read cache when possible.
    async fn get_account(&self, account_id: i64) -> Result<Account>;

    async fn search_accounts(&self, query: &str) -> Result<Vec<Account>>;

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;

    /// Creates an account, optionally with its primary contact.
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;

    /// Updates descriptive fields of a live account.
    async fn update_account(&self, account_id: i64, patch: AccountUpdate) -> Result<Account>;

    /// Converts an INDIVIDUAL account into an ORGANIZATION.
    async fn convert_to_organization(&self, account_id: i64, reason: &str) -> Result<Account>;
}
