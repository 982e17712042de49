//! In-memory remote used by the service tests.
//!
//! Each call is recorded as `op:id` (or `op:query`). Failures are injected
//! per op name or per `op:id` key, delays per the same keys.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::accounts::{
    Account, AccountFilter, AccountRemoteTrait, AccountType, AccountUpdate, DependentCounts,
    NewAccount, ServiceTier,
};
use crate::cache::ReadCache;
use crate::contacts::{Contact, ContactRemoteTrait, ContactStatus, ContactUpdate, NewContact};
use crate::dealers::{
    DeactivationOutcome, DealerDeactivationCommand, TransferRecord, TransferTarget, TransferType,
};
use crate::errors::{Error, Result};
use crate::events::MockDomainEventSink;

pub fn account(id: i64, name: &str, account_type: AccountType) -> Account {
    Account {
        id,
        account_number: Some(format!("ACC-{:04}", id)),
        name: name.to_string(),
        account_type,
        email: None,
        phone: None,
        country: None,
        city: None,
        service_tier: ServiceTier::Standard,
        credit_limit: Default::default(),
        dealer_code: None,
        parent_dealer_id: None,
        primary_contact_name: None,
        is_active: true,
        deleted_at: None,
        created_at: NaiveDateTime::default(),
        updated_at: NaiveDateTime::default(),
    }
}

pub fn contact(id: i64, account_id: i64, name: &str, status: ContactStatus) -> Contact {
    Contact {
        id,
        account_id,
        name: name.to_string(),
        email: None,
        phone: None,
        wechat: None,
        job_title: None,
        department: None,
        status,
        is_primary: status == ContactStatus::Primary,
        notes: None,
        created_at: NaiveDateTime::default(),
        updated_at: NaiveDateTime::default(),
    }
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[derive(Default)]
struct RemoteState {
    accounts: BTreeMap<i64, Account>,
    contacts: BTreeMap<i64, Contact>,
    counts: HashMap<i64, DependentCounts>,
    transfers: Vec<TransferRecord>,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct InMemoryRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().unwrap().accounts.insert(account.id, account);
    }

    pub fn add_contact(&self, contact: Contact) {
        self.state.lock().unwrap().contacts.insert(contact.id, contact);
    }

    pub fn set_counts(&self, account_id: i64, counts: DependentCounts) {
        self.state.lock().unwrap().counts.insert(account_id, counts);
    }

    pub fn add_transfer(&self, record: TransferRecord) {
        self.state.lock().unwrap().transfers.push(record);
    }

    /// Delays calls matching `key` (`op` or `op:arg`).
    pub fn delay(&self, key: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(key.to_string(), delay);
    }

    /// Fails calls matching `key` (`op` or `op:arg`) with `Unavailable`.
    pub fn fail_on(&self, key: &str) {
        self.state.lock().unwrap().failures.insert(key.to_string());
    }

    pub fn stored_account(&self, id: i64) -> Option<Account> {
        self.state.lock().unwrap().accounts.get(&id).cloned()
    }

    pub fn stored_contact(&self, id: i64) -> Option<Contact> {
        self.state.lock().unwrap().contacts.get(&id).cloned()
    }

    pub fn stored_contacts(&self, account_id: i64) -> Vec<Contact> {
        self.state
            .lock()
            .unwrap()
            .contacts
            .values()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded calls whose op is one of the mutating remote operations.
    pub fn mutations(&self) -> Vec<String> {
        const MUTATING: [&str; 12] = [
            "create_account",
            "update_account",
            "deactivate_account",
            "deactivate_dealer",
            "reactivate_dealer",
            "soft_delete_account",
            "restore_account",
            "purge_account",
            "convert_account_type",
            "create_contact",
            "update_contact",
            "deactivate_contact",
        ];
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.iter().any(|op| c.split(':').next() == Some(*op)))
            .collect()
    }

    pub fn count_calls(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    /// Records the call, sleeps for any configured delay, then applies failure injection.
    async fn enter(&self, op: &str, arg: impl ToString) -> Result<()> {
        let key = format!("{}:{}", op, arg.to_string());
        let (delay, fail) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(key.clone());
            let delay = state
                .delays
                .get(&key)
                .or_else(|| state.delays.get(op))
                .copied();
            let fail = state.failures.contains(&key) || state.failures.contains(op);
            (delay, fail)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(Error::Unavailable(format!("{} failed", key)));
        }
        Ok(())
    }

    fn with_account<T>(&self, id: i64, f: impl FnOnce(&mut Account) -> T) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        state
            .accounts
            .get_mut(&id)
            .map(f)
            .ok_or_else(|| Error::NotFound(format!("Account {}", id)))
    }

    fn with_contact<T>(&self, id: i64, f: impl FnOnce(&mut Contact) -> T) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        state
            .contacts
            .get_mut(&id)
            .map(f)
            .ok_or_else(|| Error::NotFound(format!("Contact {}", id)))
    }
}

#[async_trait]
impl AccountRemoteTrait for InMemoryRemote {
    async fn search_accounts(&self, query: &str, page_size: u32) -> Result<Vec<Account>> {
        self.enter("search", query).await?;
        let needle = query.to_lowercase();
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .values()
            .filter(|a| !a.is_deleted() && a.name.to_lowercase().contains(&needle))
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn get_account(&self, account_id: i64) -> Result<Account> {
        self.enter("get_account", account_id).await?;
        self.with_account(account_id, |a| a.clone())
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        self.enter("list_accounts", "").await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .values()
            .filter(|a| !a.is_deleted() && filter.matches(a))
            .cloned()
            .collect())
    }

    async fn create_account(&self, new_account: &NewAccount) -> Result<Account> {
        self.enter("create_account", &new_account.name).await?;
        let mut state = self.state.lock().unwrap();
        let id = state.accounts.keys().next_back().copied().unwrap_or(0) + 1;
        let mut created = account(id, &new_account.name, new_account.account_type);
        created.email = new_account.email.clone();
        created.phone = new_account.phone.clone();
        created.country = new_account.country.clone();
        created.city = new_account.city.clone();
        created.service_tier = new_account.service_tier;
        created.credit_limit = new_account.credit_limit;
        created.dealer_code = new_account.dealer_code.clone();
        created.parent_dealer_id = new_account.parent_dealer_id;

        if let Some(primary) = &new_account.primary_contact {
            let contact_id = state.contacts.keys().next_back().copied().unwrap_or(0) + 1;
            let mut row = contact(contact_id, id, &primary.name, ContactStatus::Primary);
            // Like the backend: the account's email and phone fill in missing ones.
            row.email = primary.email.clone().or_else(|| new_account.email.clone());
            row.phone = primary.phone.clone().or_else(|| new_account.phone.clone());
            row.job_title = primary.job_title.clone();
            created.primary_contact_name = Some(row.name.clone());
            state.contacts.insert(contact_id, row);
        }

        state.accounts.insert(id, created.clone());
        Ok(created)
    }

    async fn update_account(&self, account_id: i64, patch: &AccountUpdate) -> Result<Account> {
        self.enter("update_account", account_id).await?;
        let patch = patch.clone();
        self.with_account(account_id, |a| {
            if let Some(name) = patch.name {
                a.name = name;
            }
            if let Some(email) = patch.email {
                a.email = Some(email);
            }
            if let Some(phone) = patch.phone {
                a.phone = Some(phone);
            }
            if let Some(country) = patch.country {
                a.country = Some(country);
            }
            if let Some(city) = patch.city {
                a.city = Some(city);
            }
            if let Some(tier) = patch.service_tier {
                a.service_tier = tier;
            }
            if let Some(credit_limit) = patch.credit_limit {
                a.credit_limit = credit_limit;
            }
            if let Some(code) = patch.dealer_code {
                a.dealer_code = Some(code);
            }
            if let Some(dealer_id) = patch.parent_dealer_id {
                a.parent_dealer_id = Some(dealer_id);
            }
            a.clone()
        })
    }

    async fn dependent_counts(&self, account_id: i64) -> Result<DependentCounts> {
        self.enter("dependent_counts", account_id).await?;
        let state = self.state.lock().unwrap();
        if !state.accounts.contains_key(&account_id) {
            return Err(Error::NotFound(format!("Account {}", account_id)));
        }
        Ok(state.counts.get(&account_id).copied().unwrap_or_default())
    }

    async fn deactivate_account(&self, account_id: i64) -> Result<Account> {
        self.enter("deactivate_account", account_id).await?;
        self.with_account(account_id, |a| {
            a.is_active = false;
            a.clone()
        })
    }

    async fn deactivate_dealer(
        &self,
        account_id: i64,
        command: &DealerDeactivationCommand,
    ) -> Result<DeactivationOutcome> {
        self.enter("deactivate_dealer", account_id).await?;
        self.with_account(account_id, |a| a.is_active = false)?;

        let successor = command.transfer.successor_id();
        let mut state = self.state.lock().unwrap();
        // Like the backend: status only, `is_primary` is left as it was.
        for contact in state
            .contacts
            .values_mut()
            .filter(|c| c.account_id == account_id)
        {
            contact.status = ContactStatus::Inactive;
        }

        let mut moved = Vec::new();
        for customer in state
            .accounts
            .values_mut()
            .filter(|a| a.parent_dealer_id == Some(account_id))
        {
            customer.parent_dealer_id = successor;
            moved.push((customer.id, customer.name.clone()));
        }

        let transfer_type = match command.transfer {
            TransferTarget::DirectService => TransferType::Direct,
            TransferTarget::Successor(_) => TransferType::SuccessorDealer,
        };
        for (customer_id, name) in &moved {
            let id = state.transfers.len() as i64 + 1;
            state.transfers.push(TransferRecord {
                id,
                account_id: *customer_id,
                account_name: Some(name.clone()),
                from_dealer_id: account_id,
                to_dealer_id: successor,
                reason: Some(command.reason.clone()),
                transfer_type,
                transferred_at: now(),
            });
        }
        Ok(DeactivationOutcome {
            transferred_accounts: moved.len() as u32,
        })
    }

    async fn reactivate_dealer(&self, account_id: i64, _reason: &str) -> Result<Account> {
        self.enter("reactivate_dealer", account_id).await?;
        self.with_account(account_id, |a| {
            a.is_active = true;
            a.clone()
        })
    }

    async fn transfer_history(&self, account_id: i64) -> Result<Vec<TransferRecord>> {
        self.enter("transfer_history", account_id).await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .transfers
            .iter()
            .filter(|t| t.from_dealer_id == account_id || t.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn soft_delete_account(&self, account_id: i64) -> Result<()> {
        self.enter("soft_delete_account", account_id).await?;
        self.with_account(account_id, |a| {
            a.deleted_at = Some(now());
            a.is_active = false;
        })
    }

    async fn restore_account(&self, account_id: i64, is_active: bool) -> Result<Account> {
        self.enter("restore_account", account_id).await?;
        self.with_account(account_id, |a| {
            a.deleted_at = None;
            a.is_active = is_active;
            a.clone()
        })
    }

    async fn purge_account(&self, account_id: i64) -> Result<()> {
        self.enter("purge_account", account_id).await?;
        let mut state = self.state.lock().unwrap();
        if state.accounts.remove(&account_id).is_none() {
            return Err(Error::NotFound(format!("Account {}", account_id)));
        }
        state.contacts.retain(|_, c| c.account_id != account_id);
        Ok(())
    }

    async fn convert_account_type(
        &self,
        account_id: i64,
        new_type: AccountType,
        _reason: &str,
    ) -> Result<Account> {
        self.enter("convert_account_type", account_id).await?;
        self.with_account(account_id, |a| {
            a.account_type = new_type;
            a.clone()
        })
    }
}

#[async_trait]
impl ContactRemoteTrait for InMemoryRemote {
    async fn list_contacts(&self, account_id: i64, include_inactive: bool) -> Result<Vec<Contact>> {
        self.enter("contacts", account_id).await?;
        Ok(self
            .stored_contacts(account_id)
            .into_iter()
            .filter(|c| include_inactive || !c.is_inactive())
            .collect())
    }

    async fn get_contact(&self, contact_id: i64) -> Result<Contact> {
        self.enter("get_contact", contact_id).await?;
        self.with_contact(contact_id, |c| c.clone())
    }

    async fn create_contact(&self, account_id: i64, new_contact: NewContact) -> Result<Contact> {
        self.enter("create_contact", account_id).await?;
        let mut state = self.state.lock().unwrap();
        let id = state.contacts.keys().next_back().copied().unwrap_or(0) + 1;
        let mut created = contact(
            id,
            account_id,
            &new_contact.name,
            new_contact.status.unwrap_or_default(),
        );
        created.is_primary = new_contact.is_primary;
        created.email = new_contact.email;
        created.phone = new_contact.phone;
        created.job_title = new_contact.job_title;
        created.notes = new_contact.notes;
        state.contacts.insert(id, created.clone());
        Ok(created)
    }

    async fn update_contact(&self, contact_id: i64, patch: ContactUpdate) -> Result<Contact> {
        self.enter("update_contact", contact_id).await?;
        self.with_contact(contact_id, |c| {
            if let Some(name) = patch.name {
                c.name = name;
            }
            if let Some(email) = patch.email {
                c.email = Some(email);
            }
            if let Some(phone) = patch.phone {
                c.phone = Some(phone);
            }
            if let Some(job_title) = patch.job_title {
                c.job_title = Some(job_title);
            }
            if let Some(notes) = patch.notes {
                c.notes = Some(notes);
            }
            if let Some(status) = patch.status {
                c.status = status;
            }
            if let Some(is_primary) = patch.is_primary {
                c.is_primary = is_primary;
            }
            c.clone()
        })
    }

    async fn deactivate_contact(&self, contact_id: i64) -> Result<Contact> {
        self.enter("deactivate_contact", contact_id).await?;
        self.with_contact(contact_id, |c| {
            c.set_status(ContactStatus::Inactive);
            c.clone()
        })
    }
}

/// Remote plus the shared collaborators most services need.
pub struct Fixture {
    pub remote: Arc<InMemoryRemote>,
    pub cache: Arc<ReadCache>,
    pub events: Arc<MockDomainEventSink>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            remote: Arc::new(InMemoryRemote::new()),
            cache: Arc::new(ReadCache::new()),
            events: Arc::new(MockDomainEventSink::new()),
        }
    }
}
