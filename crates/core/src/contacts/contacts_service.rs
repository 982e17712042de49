use async_trait::async_trait;
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::Arc;

use super::contact_status;
use super::contacts_model::{Contact, ContactStatus, ContactUpdate, NewContact};
use super::contacts_traits::{ContactRemoteTrait, ContactServiceTrait};
use crate::accounts::AccountRemoteTrait;
use crate::cache::ReadCache;
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};

/// Contact status engine backed by the remote data service.
///
/// Cascades are computed on the account's full contact set (see
/// [`contact_status`]) and then issued remotely, demotions before the
/// promotion, so an interrupted cascade can leave an account without a
/// primary contact but never with two.
pub struct ContactService {
    remote: Arc<dyn ContactRemoteTrait>,
    accounts: Arc<dyn AccountRemoteTrait>,
    cache: Arc<ReadCache>,
    events: Arc<dyn DomainEventSink>,
}

impl ContactService {
    pub fn new(
        remote: Arc<dyn ContactRemoteTrait>,
        accounts: Arc<dyn AccountRemoteTrait>,
        cache: Arc<ReadCache>,
        events: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            remote,
            accounts,
            cache,
            events,
        }
    }

    /// Authoritative contact set for a mutation; never served from cache.
    async fn fresh_contacts(&self, account_id: i64) -> Result<Vec<Contact>> {
        self.remote.list_contacts(account_id, true).await
    }

    /// Issues the remote calls for `changed`, demotions first.
    async fn apply_transitions(&self, account_id: i64, changed: Vec<Contact>) -> Result<Vec<Contact>> {
        let (promotions, demotions): (Vec<Contact>, Vec<Contact>) =
            changed.into_iter().partition(|c| c.is_primary());

        let total = promotions.len() + demotions.len();
        let mut applied = Vec::with_capacity(total);
        for contact in demotions.into_iter().chain(promotions) {
            let result = if contact.is_inactive() {
                self.remote.deactivate_contact(contact.id).await
            } else {
                self.remote
                    .update_contact(contact.id, ContactUpdate::status(contact.status))
                    .await
            };

            match result {
                Ok(updated) => applied.push(updated),
                Err(e) => {
                    error!(
                        "Contact cascade for account {} stopped after {}/{} updates: {}",
                        account_id,
                        applied.len(),
                        total,
                        e
                    );
                    self.cache.invalidate_contacts(account_id);
                    return Err(e);
                }
            }
        }
        Ok(applied)
    }

    /// Merges the records returned by the remote into `next`, drops the
    /// cached list and announces the change.
    fn finish(&self, account_id: i64, next: Vec<Contact>, applied: Vec<Contact>) -> Vec<Contact> {
        let changed_ids: Vec<i64> = applied.iter().map(|c| c.id).collect();
        let mut by_id: HashMap<i64, Contact> = next.into_iter().map(|c| (c.id, c)).collect();
        for contact in applied {
            by_id.insert(contact.id, contact);
        }

        self.cache.invalidate_contacts(account_id);
        if !changed_ids.is_empty() {
            self.events
                .emit(DomainEvent::contacts_changed(account_id, changed_ids));
        }
        contact_status::sorted(by_id.into_values().collect())
    }
}

fn visible(contacts: Vec<Contact>, include_inactive: bool) -> Vec<Contact> {
    let contacts = if include_inactive {
        contacts
    } else {
        contacts.into_iter().filter(|c| !c.is_inactive()).collect()
    };
    contact_status::sorted(contacts)
}

#[async_trait]
impl ContactServiceTrait for ContactService {
    async fn list_contacts(&self, account_id: i64, include_inactive: bool) -> Result<Vec<Contact>> {
        if let Some(cached) = self.cache.contacts(account_id) {
            debug!("Serving contacts of account {} from cache", account_id);
            return Ok(visible(cached, include_inactive));
        }
        let contacts = self.remote.list_contacts(account_id, true).await?;
        self.cache.put_contacts(account_id, contacts.clone());
        Ok(visible(contacts, include_inactive))
    }

    async fn set_primary(&self, account_id: i64, contact_id: i64) -> Result<Vec<Contact>> {
        let before = self.fresh_contacts(account_id).await?;
        let next = contact_status::promote(&before, account_id, contact_id)?;
        let changed = contact_status::changed_between(&before, &next);

        info!(
            "Setting contact {} as primary for account {} ({} updates)",
            contact_id,
            account_id,
            changed.len()
        );
        let applied = self.apply_transitions(account_id, changed).await?;
        Ok(self.finish(account_id, next, applied))
    }

    async fn create(&self, account_id: i64, new_contact: NewContact) -> Result<Vec<Contact>> {
        new_contact.validate()?;
        let account = self.accounts.get_account(account_id).await?;
        if account.is_deleted() {
            return Err(Error::InvalidState(format!(
                "Account {} is deleted; contacts cannot be added",
                account_id
            )));
        }

        let new_contact = new_contact.normalized();
        let before = self.fresh_contacts(account_id).await?;
        let (base, mut applied) = if new_contact.wants_primary() {
            let demoted = contact_status::demote_all(&before, None);
            let changed = contact_status::changed_between(&before, &demoted);
            let applied = self.apply_transitions(account_id, changed).await?;
            (demoted, applied)
        } else {
            (before, Vec::new())
        };

        let created = match self.remote.create_contact(account_id, new_contact).await {
            Ok(created) => created,
            Err(e) => {
                if !applied.is_empty() {
                    error!(
                        "Contact creation for account {} failed after demoting {} contacts: {}",
                        account_id,
                        applied.len(),
                        e
                    );
                }
                self.cache.invalidate_contacts(account_id);
                return Err(e);
            }
        };
        info!(
            "Created contact {} ({:?}) for account {}",
            created.id, created.status, account_id
        );

        let next = contact_status::insert(&base, created.clone());
        applied.push(created);
        Ok(self.finish(account_id, next, applied))
    }

    async fn update(&self, contact_id: i64, patch: ContactUpdate) -> Result<Vec<Contact>> {
        patch.validate()?;
        let existing = self.remote.get_contact(contact_id).await?;
        let account_id = existing.account_id;
        let requested = patch.requested_status(existing.status);

        if existing.is_inactive()
            && matches!(
                requested,
                Some(ContactStatus::Primary) | Some(ContactStatus::Active)
            )
        {
            return Err(Error::InvalidState(format!(
                "Contact {} is inactive and cannot be reinstated",
                contact_id
            )));
        }

        let before = self.fresh_contacts(account_id).await?;
        let next = match requested {
            Some(ContactStatus::Primary) => contact_status::promote(&before, account_id, contact_id)?,
            Some(ContactStatus::Inactive) => contact_status::deactivate(&before, contact_id)?,
            Some(ContactStatus::Active) => before
                .iter()
                .cloned()
                .map(|mut c| {
                    if c.id == contact_id {
                        c.set_status(ContactStatus::Active);
                    }
                    c
                })
                .collect(),
            None => before.clone(),
        };

        let changed = contact_status::changed_between(&before, &next);
        let mut applied = self.apply_transitions(account_id, changed).await?;

        if patch.has_field_changes() {
            let updated = self
                .remote
                .update_contact(contact_id, patch.without_status())
                .await
                .inspect_err(|_| self.cache.invalidate_contacts(account_id))?;
            applied.push(updated);
        }

        Ok(self.finish(account_id, next, applied))
    }

    async fn deactivate(&self, contact_id: i64) -> Result<Vec<Contact>> {
        let existing = self.remote.get_contact(contact_id).await?;
        let account_id = existing.account_id;
        let before = self.fresh_contacts(account_id).await?;
        let next = contact_status::deactivate(&before, contact_id)?;
        let changed = contact_status::changed_between(&before, &next);

        info!("Deactivating contact {} of account {}", contact_id, account_id);
        let applied = self.apply_transitions(account_id, changed).await?;
        Ok(self.finish(account_id, next, applied))
    }

    async fn deactivate_all(&self, account_id: i64) -> Result<Vec<Contact>> {
        let before = self.fresh_contacts(account_id).await?;
        let mut next = before.clone();
        for contact in before.iter().filter(|c| !c.is_inactive() || c.is_primary) {
            next = contact_status::deactivate(&next, contact.id)?;
        }
        let changed = contact_status::changed_between(&before, &next);

        info!(
            "Deactivating {} contacts of account {}",
            changed.len(),
            account_id
        );
        let applied = self.apply_transitions(account_id, changed).await?;
        Ok(self.finish(account_id, next, applied))
    }
}
