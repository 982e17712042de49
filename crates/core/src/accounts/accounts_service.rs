use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::accounts_model::{Account, AccountFilter, AccountType, AccountUpdate, NewAccount};
use super::accounts_traits::{AccountRemoteTrait, AccountServiceTrait};
use crate::cache::ReadCache;
use crate::config::EngineConfig;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};

/// Service for creating, reading, updating and converting accounts
pub struct AccountService {
    remote: Arc<dyn AccountRemoteTrait>,
    cache: Arc<ReadCache>,
    events: Arc<dyn DomainEventSink>,
    config: EngineConfig,
}

impl AccountService {
    /// Creates a new AccountService instance
    pub fn new(
        remote: Arc<dyn AccountRemoteTrait>,
        cache: Arc<ReadCache>,
        events: Arc<dyn DomainEventSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            remote,
            cache,
            events,
            config,
        }
    }

    /// A customer can only be assigned to an active dealer.
    async fn require_serving_dealer(&self, dealer_id: i64) -> Result<()> {
        let dealer = match self.remote.get_account(dealer_id).await {
            Ok(dealer) => dealer,
            Err(Error::NotFound(_)) => {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "Dealer {} does not exist",
                    dealer_id
                ))))
            }
            Err(e) => return Err(e),
        };
        if !dealer.is_dealer() || !dealer.is_active || dealer.is_deleted() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Account {} is not an active dealer",
                dealer_id
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    /// Retrieves an account by its ID
    async fn get_account(&self, account_id: i64) -> Result<Account> {
        if let Some(account) = self.cache.account(account_id) {
            debug!("Serving account {} from cache", account_id);
            return Ok(account);
        }
        let account = self.remote.get_account(account_id).await?;
        self.cache.put_account(account.clone());
        Ok(account)
    }

    /// Searches accounts; blank queries return nothing
    async fn search_accounts(&self, query: &str) -> Result<Vec<Account>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.remote
            .search_accounts(query, self.config.search_page_size)
            .await
    }

    /// Lists accounts matching the filter
    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let accounts = self.remote.list_accounts(filter).await?;
        Ok(accounts.into_iter().filter(|a| filter.matches(a)).collect())
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;
        let new_account = new_account.normalized();
        if let Some(dealer_id) = new_account.parent_dealer_id {
            self.require_serving_dealer(dealer_id).await?;
        }

        let account = self.remote.create_account(&new_account).await?;
        info!(
            "Created {} account {} ({}){}",
            account.account_type,
            account.id,
            account.name,
            if new_account.primary_contact.is_some() {
                " with a primary contact"
            } else {
                ""
            }
        );

        self.cache.put_account(account.clone());
        self.events.emit(DomainEvent::AccountCreated {
            account_id: account.id,
            account_type: account.account_type,
        });
        Ok(account)
    }

    async fn update_account(&self, account_id: i64, patch: AccountUpdate) -> Result<Account> {
        patch.validate()?;
        let account = self.remote.get_account(account_id).await?;
        if account.is_deleted() {
            return Err(Error::InvalidState(format!(
                "Account {} is deleted",
                account_id
            )));
        }
        if let Some(dealer_id) = patch.parent_dealer_id {
            if dealer_id == account_id {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "An account cannot be its own dealer".to_string(),
                )));
            }
            if account.is_dealer() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "A dealer cannot be served by another dealer".to_string(),
                )));
            }
            self.require_serving_dealer(dealer_id).await?;
        }

        let patch = AccountUpdate {
            name: patch.name.map(|n| n.trim().to_string()),
            ..patch
        };
        let updated = self.remote.update_account(account_id, &patch).await?;
        debug!("Updated account {}", account_id);

        self.cache.invalidate_account(account_id);
        self.events
            .emit(DomainEvent::AccountUpdated { account_id });
        Ok(updated)
    }

    /// Converts an individual customer into an organization
    async fn convert_to_organization(&self, account_id: i64, reason: &str) -> Result<Account> {
        if reason.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "reason".to_string(),
            )));
        }

        let account = self.remote.get_account(account_id).await?;
        if account.account_type != AccountType::Individual {
            return Err(Error::InvalidState(format!(
                "Only INDIVIDUAL accounts can be converted, account {} is {}",
                account_id, account.account_type
            )));
        }
        if account.is_deleted() {
            return Err(Error::InvalidState(format!(
                "Account {} is deleted",
                account_id
            )));
        }

        let converted = self
            .remote
            .convert_account_type(account_id, AccountType::Organization, reason.trim())
            .await?;
        info!(
            "Converted account {} from {} to {}",
            account_id, account.account_type, converted.account_type
        );

        self.cache.invalidate_account(account_id);
        self.events.emit(DomainEvent::AccountTypeConverted {
            account_id,
            old_type: account.account_type,
            new_type: converted.account_type,
        });
        Ok(converted)
    }
}
