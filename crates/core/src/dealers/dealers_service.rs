use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;

use super::dealers_model::{
    DeactivationRequest, DealerDeactivation, DealerDeactivationCommand, SuccessorOptions,
    TransferRecord, TransferTarget, TransferType,
};
use super::dealers_traits::DealerServiceTrait;
use crate::accounts::{Account, AccountFilter, AccountRemoteTrait};
use crate::cache::ReadCache;
use crate::contacts::ContactServiceTrait;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};

/// Service for retiring dealers and handing over their customers.
///
/// Every check runs before the first mutating call. Once the remote has
/// deactivated the dealer, a failure while deactivating its contacts is
/// reported to the caller as a failed operation; nothing is compensated.
pub struct DealerService {
    remote: Arc<dyn AccountRemoteTrait>,
    contacts: Arc<dyn ContactServiceTrait>,
    cache: Arc<ReadCache>,
    events: Arc<dyn DomainEventSink>,
}

impl DealerService {
    pub fn new(
        remote: Arc<dyn AccountRemoteTrait>,
        contacts: Arc<dyn ContactServiceTrait>,
        cache: Arc<ReadCache>,
        events: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            remote,
            contacts,
            cache,
            events,
        }
    }

    async fn load_dealer(&self, account_id: i64) -> Result<Account> {
        let account = self.remote.get_account(account_id).await?;
        if !account.is_dealer() {
            return Err(Error::NotFound(format!("Dealer {}", account_id)));
        }
        if account.is_deleted() {
            return Err(Error::InvalidState(format!(
                "Dealer {} is deleted",
                account_id
            )));
        }
        Ok(account)
    }

    /// Resolves the transfer target, checking the successor against the remote.
    async fn resolve_transfer(
        &self,
        account_id: i64,
        request: &DeactivationRequest,
    ) -> Result<TransferTarget> {
        let successor_id = match (request.transfer_type, request.successor_account_id) {
            (TransferType::Direct, _) => return Ok(TransferTarget::DirectService),
            (TransferType::SuccessorDealer, Some(id)) => id,
            (TransferType::SuccessorDealer, None) => {
                return Err(Error::Validation(ValidationError::MissingField(
                    "successor_account_id".to_string(),
                )))
            }
        };

        if successor_id == account_id {
            return Err(invalid_successor("a dealer cannot succeed itself"));
        }

        let successor = match self.remote.get_account(successor_id).await {
            Ok(account) => account,
            Err(Error::NotFound(_)) => {
                return Err(invalid_successor(&format!(
                    "account {} does not exist",
                    successor_id
                )))
            }
            Err(e) => return Err(e),
        };

        if !successor.is_dealer() {
            return Err(invalid_successor(&format!(
                "account {} is not a dealer",
                successor_id
            )));
        }
        if !successor.is_active || successor.is_deleted() {
            return Err(invalid_successor(&format!(
                "dealer {} is not active",
                successor_id
            )));
        }

        Ok(TransferTarget::Successor(successor_id))
    }
}

fn invalid_successor(detail: &str) -> Error {
    Error::Validation(ValidationError::InvalidInput(format!(
        "Invalid successor dealer: {}",
        detail
    )))
}

#[async_trait]
impl DealerServiceTrait for DealerService {
    async fn list_active_dealers(&self, excluding_id: i64) -> Result<Vec<Account>> {
        let filter = AccountFilter::active_dealers();
        let dealers = self.remote.list_accounts(&filter).await?;
        Ok(dealers
            .into_iter()
            .filter(|a| filter.matches(a) && !a.is_deleted() && a.id != excluding_id)
            .collect())
    }

    async fn successor_options(&self, dealer_id: i64) -> Result<SuccessorOptions> {
        let dealers = self.list_active_dealers(dealer_id).await?;
        if dealers.is_empty() {
            warn!(
                "No active dealer can take over the customers of dealer {}",
                dealer_id
            );
        }
        Ok(SuccessorOptions { dealers })
    }

    async fn deactivate_dealer(
        &self,
        account_id: i64,
        request: DeactivationRequest,
    ) -> Result<DealerDeactivation> {
        request.validate_shape()?;

        let dealer = self.load_dealer(account_id).await?;
        if !dealer.is_active {
            return Err(Error::InvalidState(format!(
                "Dealer {} is already inactive",
                account_id
            )));
        }

        let transfer = self.resolve_transfer(account_id, &request).await?;
        let command = DealerDeactivationCommand {
            reason: request.reason.trim().to_string(),
            transfer,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        };

        let outcome = self.remote.deactivate_dealer(account_id, &command).await?;
        info!(
            "Deactivated dealer {} ({:?}), {} customer accounts transferred",
            account_id, transfer, outcome.transferred_accounts
        );
        self.cache.invalidate_account(account_id);
        if let Some(successor_id) = transfer.successor_id() {
            self.cache.invalidate_account(successor_id);
        }

        let contacts = self
            .contacts
            .deactivate_all(account_id)
            .await
            .inspect_err(|e| {
                error!(
                    "Dealer {} is inactive but its contacts were not all deactivated: {}",
                    account_id, e
                )
            })?;

        self.events.emit(DomainEvent::dealer_deactivated(
            account_id,
            transfer,
            outcome.transferred_accounts,
        ));

        Ok(DealerDeactivation {
            account_id,
            transfer,
            transferred_accounts: outcome.transferred_accounts,
            contacts,
        })
    }

    async fn reactivate_dealer(&self, account_id: i64, reason: &str) -> Result<Account> {
        let dealer = self.load_dealer(account_id).await?;
        if dealer.is_active {
            return Err(Error::InvalidState(format!(
                "Dealer {} is already active",
                account_id
            )));
        }

        let account = self.remote.reactivate_dealer(account_id, reason.trim()).await?;
        info!("Reactivated dealer {}", account_id);
        self.cache.invalidate_account(account_id);
        self.events
            .emit(DomainEvent::DealerReactivated { account_id });
        Ok(account)
    }

    async fn transfer_history(&self, account_id: i64) -> Result<Vec<TransferRecord>> {
        let mut records = self.remote.transfer_history(account_id).await?;
        records.sort_by(|a, b| b.transferred_at.cmp(&a.transferred_at));
        Ok(records)
    }
}
