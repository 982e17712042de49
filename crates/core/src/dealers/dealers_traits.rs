use async_trait::async_trait;

use super::dealers_model::{DeactivationRequest, DealerDeactivation, SuccessorOptions, TransferRecord};
use crate::accounts::Account;
use crate::errors::Result;

/// Dealer succession workflow.
#[async_trait]
pub trait DealerServiceTrait: Send + Sync {
    /// Active dealers other than `excluding_id`.
    async fn list_active_dealers(&self, excluding_id: i64) -> Result<Vec<Account>>;

    async fn successor_options(&self, dealer_id: i64) -> Result<SuccessorOptions>;

    /// Retires a dealer, hands its customers over and deactivates its contacts.
    async fn deactivate_dealer(
        &self,
        account_id: i64,
        request: DeactivationRequest,
    ) -> Result<DealerDeactivation>;

    /// Brings an inactive dealer back. Its contacts stay inactive.
    async fn reactivate_dealer(&self, account_id: i64, reason: &str) -> Result<Account>;

    async fn transfer_history(&self, account_id: i64) -> Result<Vec<TransferRecord>>;
}
