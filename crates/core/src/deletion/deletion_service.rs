use async_trait::async_trait;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

use super::deletion_model::{Deactivation, DeletionEligibility, DestructiveAction};
use super::deletion_traits::DeletionServiceTrait;
use crate::accounts::{Account, AccountRemoteTrait};
use crate::cache::ReadCache;
use crate::config::EngineConfig;
use crate::dealers::{DeactivationRequest, DealerServiceTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};

/// Pending-intent bookkeeping for destructive actions.
#[derive(Default)]
struct Deliberation {
    /// When each (account, action) confirmation window was opened.
    opened: HashMap<(i64, DestructiveAction), Instant>,
    /// `is_active` of accounts at the moment they were soft-deleted.
    active_before_delete: HashMap<i64, bool>,
    /// Accounts purged through this engine.
    purged: HashSet<i64>,
}

pub struct DeletionService {
    remote: Arc<dyn AccountRemoteTrait>,
    dealers: Arc<dyn DealerServiceTrait>,
    cache: Arc<ReadCache>,
    events: Arc<dyn DomainEventSink>,
    config: EngineConfig,
    state: Mutex<Deliberation>,
}

impl DeletionService {
    pub fn new(
        remote: Arc<dyn AccountRemoteTrait>,
        dealers: Arc<dyn DealerServiceTrait>,
        cache: Arc<ReadCache>,
        events: Arc<dyn DomainEventSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            remote,
            dealers,
            cache,
            events,
            config,
            state: Mutex::new(Deliberation::default()),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, Deliberation>> {
        self.state
            .lock()
            .map_err(|_| Error::Unexpected("deletion bookkeeping lock poisoned".to_string()))
    }

    fn ensure_not_purged(&self, account_id: i64) -> Result<()> {
        if self.state()?.purged.contains(&account_id) {
            return Err(Error::Conflict(format!(
                "Account {} has been purged",
                account_id
            )));
        }
        Ok(())
    }

    fn open_window(&self, account_id: i64, action: DestructiveAction) -> Result<()> {
        self.state()?
            .opened
            .entry((account_id, action))
            .or_insert_with(Instant::now);
        Ok(())
    }

    /// Opens the window unless already open; fails with `TooEarly` until
    /// the configured delay has passed since it was opened.
    fn deliberate(&self, account_id: i64, action: DestructiveAction) -> Result<()> {
        let delay = self.config.deliberation_delay();
        if delay.is_zero() {
            return Ok(());
        }

        let now = Instant::now();
        let mut state = self.state()?;
        let opened = *state.opened.entry((account_id, action)).or_insert(now);
        let elapsed = now.saturating_duration_since(opened);
        if elapsed < delay {
            debug!(
                "{:?} of account {} requested {}ms into a {}ms deliberation window",
                action,
                account_id,
                elapsed.as_millis(),
                delay.as_millis()
            );
            return Err(Error::TooEarly {
                remaining: delay - elapsed,
            });
        }
        Ok(())
    }

    fn close_windows(&self, account_id: i64) -> Result<()> {
        self.state()?
            .opened
            .retain(|(id, _), _| *id != account_id);
        Ok(())
    }

    async fn eligibility(&self, account_id: i64) -> Result<DeletionEligibility> {
        self.ensure_not_purged(account_id)?;
        let counts = self.remote.dependent_counts(account_id).await?;
        Ok(DeletionEligibility::from_counts(account_id, counts))
    }

    /// Fresh eligibility; related data closes any pending window.
    async fn require_eligible(&self, account_id: i64) -> Result<DeletionEligibility> {
        let eligibility = self.eligibility(account_id).await?;
        if eligibility.has_related_data {
            self.close_windows(account_id)?;
            return Err(Error::Ineligible {
                counts: eligibility.counts,
            });
        }
        Ok(eligibility)
    }
}

#[async_trait]
impl DeletionServiceTrait for DeletionService {
    async fn check_eligibility(&self, account_id: i64) -> Result<DeletionEligibility> {
        let eligibility = self.eligibility(account_id).await?;
        if eligibility.has_related_data {
            self.close_windows(account_id)?;
        } else {
            // The confirmation prompt is shown from here on.
            self.open_window(account_id, DestructiveAction::SoftDelete)?;
        }
        Ok(eligibility)
    }

    async fn request_delete(&self, account_id: i64) -> Result<()> {
        self.ensure_not_purged(account_id)?;
        let account = self.remote.get_account(account_id).await?;
        if account.is_deleted() {
            return Err(Error::InvalidState(format!(
                "Account {} is already deleted",
                account_id
            )));
        }

        self.require_eligible(account_id).await?;
        self.deliberate(account_id, DestructiveAction::SoftDelete)?;

        self.remote.soft_delete_account(account_id).await?;
        info!("Soft-deleted account {} ({})", account_id, account.name);

        {
            let mut state = self.state()?;
            state
                .active_before_delete
                .insert(account_id, account.is_active);
            state.opened.retain(|(id, _), _| *id != account_id);
        }
        self.cache.invalidate_account(account_id);
        self.events
            .emit(DomainEvent::AccountSoftDeleted { account_id });
        Ok(())
    }

    fn cancel_delete(&self, account_id: i64) {
        if let Ok(mut state) = self.state.lock() {
            state.opened.retain(|(id, _), _| *id != account_id);
        }
    }

    async fn purge(&self, account_id: i64) -> Result<()> {
        self.ensure_not_purged(account_id)?;
        // Existence check; a soft-deleted account is still returned.
        self.remote.get_account(account_id).await?;

        // Related records may have appeared since the account was deleted.
        self.require_eligible(account_id).await?;
        self.deliberate(account_id, DestructiveAction::Purge)?;

        self.remote.purge_account(account_id).await?;
        info!("Purged account {} and its contacts", account_id);

        {
            let mut state = self.state()?;
            state.purged.insert(account_id);
            state.active_before_delete.remove(&account_id);
            state.opened.retain(|(id, _), _| *id != account_id);
        }
        self.cache.invalidate_account(account_id);
        self.events.emit(DomainEvent::AccountPurged { account_id });
        Ok(())
    }

    async fn restore(&self, account_id: i64) -> Result<Account> {
        self.ensure_not_purged(account_id)?;
        let account = self.remote.get_account(account_id).await?;
        if !account.is_deleted() {
            return Err(Error::InvalidState(format!(
                "Account {} is not deleted",
                account_id
            )));
        }

        // Accounts deleted outside this engine come back active.
        let was_active = self
            .state()?
            .active_before_delete
            .get(&account_id)
            .copied()
            .unwrap_or(true);
        let restored = self.remote.restore_account(account_id, was_active).await?;
        info!(
            "Restored account {} as {:?}",
            account_id,
            restored.lifecycle()
        );

        {
            let mut state = self.state()?;
            state.active_before_delete.remove(&account_id);
            state.opened.retain(|(id, _), _| *id != account_id);
        }
        self.cache.invalidate_account(account_id);
        self.events.emit(DomainEvent::AccountRestored { account_id });
        Ok(restored)
    }

    async fn deactivate(
        &self,
        account_id: i64,
        request: Option<DeactivationRequest>,
    ) -> Result<Deactivation> {
        self.ensure_not_purged(account_id)?;
        let account = self.remote.get_account(account_id).await?;
        if account.is_deleted() {
            return Err(Error::InvalidState(format!(
                "Account {} is deleted",
                account_id
            )));
        }

        if account.is_dealer() {
            let request = request.ok_or_else(|| {
                Error::Validation(ValidationError::MissingField(
                    "deactivation request".to_string(),
                ))
            })?;
            let outcome = self.dealers.deactivate_dealer(account_id, request).await?;
            self.close_windows(account_id)?;
            return Ok(Deactivation::Dealer { outcome });
        }

        if !account.is_active {
            return Err(Error::InvalidState(format!(
                "Account {} is already inactive",
                account_id
            )));
        }

        let account = self.remote.deactivate_account(account_id).await?;
        info!("Deactivated account {}", account_id);

        self.close_windows(account_id)?;
        self.cache.invalidate_account(account_id);
        self.events
            .emit(DomainEvent::AccountDeactivated { account_id });
        Ok(Deactivation::Account { account })
    }
}
