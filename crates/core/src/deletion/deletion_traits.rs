use async_trait::async_trait;

use super::deletion_model::{Deactivation, DeletionEligibility};
use crate::accounts::Account;
use crate::dealers::DeactivationRequest;
use crate::errors::Result;

/// Account deletion eligibility engine.
///
/// Lifecycle: `ACTIVE -> INACTIVE` (deactivate), `ACTIVE|INACTIVE -> DELETED`
/// (soft delete), `DELETED -> previous` (restore), `-> PURGED` (purge,
/// terminal).
#[async_trait]
pub trait DeletionServiceTrait: Send + Sync {
    /// Queries dependent-record counts. Always fresh, never cached.
    ///
    /// An eligible result opens the soft-delete confirmation window.
    async fn check_eligibility(&self, account_id: i64) -> Result<DeletionEligibility>;

    /// Soft-deletes an account without related data once the deliberation
    /// delay has elapsed since the eligibility check or the first request.
    async fn request_delete(&self, account_id: i64) -> Result<()>;

    /// Drops any pending deliberation windows for the account.
    fn cancel_delete(&self, account_id: i64);

    /// Permanently removes an eligible account and its contacts.
    async fn purge(&self, account_id: i64) -> Result<()>;

    /// Brings a soft-deleted account back as active or inactive, whichever
    /// it was when deleted.
    async fn restore(&self, account_id: i64) -> Result<Account>;

    /// The only action left for accounts with related data. Dealers are
    /// handed to the succession workflow and need a request.
    async fn deactivate(
        &self,
        account_id: i64,
        request: Option<DeactivationRequest>,
    ) -> Result<Deactivation>;
}
