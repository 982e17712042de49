//! Read cache for accounts and contact lists.
//!
//! The engine never owns authoritative state. Entries here are only a
//! display cache and are dropped after every successful mutation that
//! touches the account.

use dashmap::DashMap;
use log::debug;

use crate::accounts::Account;
use crate::contacts::Contact;

#[derive(Default)]
pub struct ReadCache {
    accounts: DashMap<i64, Account>,
    contacts: DashMap<i64, Vec<Contact>>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, account_id: i64) -> Option<Account> {
        self.accounts.get(&account_id).map(|a| a.value().clone())
    }

    pub fn put_account(&self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    /// Cached contact list, including inactive contacts.
    pub fn contacts(&self, account_id: i64) -> Option<Vec<Contact>> {
        self.contacts.get(&account_id).map(|c| c.value().clone())
    }

    pub fn put_contacts(&self, account_id: i64, contacts: Vec<Contact>) {
        self.contacts.insert(account_id, contacts);
    }

    pub fn invalidate_account(&self, account_id: i64) {
        debug!("Invalidating cached account {}", account_id);
        self.accounts.remove(&account_id);
        self.contacts.remove(&account_id);
    }

    pub fn invalidate_contacts(&self, account_id: i64) {
        debug!("Invalidating cached contacts of account {}", account_id);
        self.contacts.remove(&account_id);
    }

    pub fn clear(&self) {
        self.accounts.clear();
        self.contacts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.contacts.is_empty()
    }
}
