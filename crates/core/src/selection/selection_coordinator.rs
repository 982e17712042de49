//! Account -> contact selection with debounced search.
//!
//! Responses may complete in any order. Every request is tagged with the
//! sequence number current when it was issued (plus the query or account
//! it was issued for) and its result is applied only if both still match
//! the coordinator's state. Nothing is cancelled explicitly except the
//! debounce timer.

use futures::future::OptionFuture;
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use super::selection_model::{SearchPhase, SelectionState, SelectionValue};
use super::selection_sink::SelectionSink;
use crate::accounts::{Account, AccountRemoteTrait};
use crate::config::EngineConfig;
use crate::contacts::{contact_status, Contact, ContactRemoteTrait};
use crate::errors::{Error, Result};

#[derive(Default)]
struct Inner {
    state: SelectionState,
    /// Bumped for every search issued and whenever search results must be dropped.
    search_seq: u64,
    /// Bumped whenever the selected account changes.
    selection_seq: u64,
    /// The single armed debounce timer, if any.
    debounce: Option<JoinHandle<()>>,
}

impl Inner {
    fn disarm_debounce(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }
}

struct Shared {
    accounts: Arc<dyn AccountRemoteTrait>,
    contacts: Arc<dyn ContactRemoteTrait>,
    sink: Arc<dyn SelectionSink>,
    config: EngineConfig,
    inner: Mutex<Inner>,
}

/// Drives the cascading account/contact picker.
///
/// Cheap to clone; clones share state. Must be used from within a tokio
/// runtime because query changes arm a timer task.
#[derive(Clone)]
pub struct SelectionCoordinator {
    shared: Arc<Shared>,
}

impl SelectionCoordinator {
    pub fn new(
        accounts: Arc<dyn AccountRemoteTrait>,
        contacts: Arc<dyn ContactRemoteTrait>,
        sink: Arc<dyn SelectionSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                accounts,
                contacts,
                sink,
                config,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State stays usable after a panicking holder; every write is a whole-field assignment.
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SelectionState {
        self.lock().state.clone()
    }

    /// Records a keystroke and re-arms the debounce timer.
    ///
    /// Only the search scheduled by the latest keystroke runs. A search that
    /// already started is left alone; its result is dropped by the staleness
    /// check if the query has moved on.
    pub fn on_query_change(&self, text: impl Into<String>) {
        let text = text.into();
        let mut inner = self.lock();
        inner.disarm_debounce();
        inner.state.query = text.clone();
        inner.search_seq += 1;

        if text.trim().is_empty() {
            inner.state.phase = SearchPhase::Idle;
            inner.state.candidate_accounts.clear();
            return;
        }

        let coordinator = self.clone();
        let delay = self.shared.config.search_debounce();
        inner.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach so that re-arming the timer cannot cancel a started search.
            tokio::spawn(async move {
                if let Err(e) = coordinator.search(&text).await {
                    warn!("Account search for '{}' failed: {}", text, e);
                }
            });
        }));
    }

    /// Looks up accounts for `text` and applies them if `text` is still the
    /// current query and no newer search was issued meanwhile.
    ///
    /// Text other than the current query is ignored without a lookup so
    /// that it cannot supersede the search for the current query.
    pub async fn search(&self, text: &str) -> Result<()> {
        let seq = {
            let mut inner = self.lock();
            if inner.state.query != text {
                debug!("Ignoring search for '{}', query is now '{}'", text, inner.state.query);
                return Ok(());
            }
            inner.search_seq += 1;
            inner.state.phase = SearchPhase::Searching;
            inner.search_seq
        };

        let result = self
            .shared
            .accounts
            .search_accounts(text.trim(), self.shared.config.search_page_size)
            .await;

        let mut inner = self.lock();
        if inner.search_seq != seq || inner.state.query != text {
            debug!("Discarding stale account search results for '{}'", text);
            return Ok(());
        }

        match result {
            Ok(accounts) => {
                inner.state.phase = if accounts.is_empty() {
                    SearchPhase::NoResults
                } else {
                    SearchPhase::Results
                };
                inner.state.candidate_accounts = accounts;
                Ok(())
            }
            Err(e) => {
                inner.state.phase = SearchPhase::Idle;
                Err(e)
            }
        }
    }

    /// Selects an account, clears the contact and loads the account's contacts.
    pub async fn select_account(&self, account: Account) -> Result<()> {
        let account_id = account.id;
        let value = SelectionValue {
            account_id: Some(account_id),
            contact_id: None,
            reporter_name: Some(account.reporter_name().to_string()),
        };

        let seq = {
            let mut inner = self.lock();
            inner.disarm_debounce();
            inner.search_seq += 1;
            inner.selection_seq += 1;

            let state = &mut inner.state;
            state.selected_account = Some(account);
            state.selected_contact = None;
            state.contacts.clear();
            state.candidate_accounts.clear();
            state.query.clear();
            state.phase = SearchPhase::Idle;
            inner.selection_seq
        };
        self.shared.sink.on_change(value);

        let result = self.shared.contacts.list_contacts(account_id, false).await;
        self.apply_contacts(account_id, seq, result)
    }

    fn apply_contacts(
        &self,
        account_id: i64,
        seq: u64,
        result: Result<Vec<Contact>>,
    ) -> Result<()> {
        let mut inner = self.lock();
        let still_selected = inner.selection_seq == seq
            && inner.state.selected_account.as_ref().map(|a| a.id) == Some(account_id);
        if !still_selected {
            debug!("Discarding stale contact list for account {}", account_id);
            return Ok(());
        }

        let contacts = result?;
        inner.state.contacts = contact_status::sorted(
            contacts
                .into_iter()
                .filter(|c| c.account_id == account_id && !c.is_inactive())
                .collect(),
        );
        Ok(())
    }

    /// Selects a contact of the currently selected account.
    pub fn select_contact(&self, contact: Contact) -> Result<()> {
        let value = {
            let mut inner = self.lock();
            let account_id = match &inner.state.selected_account {
                Some(account) => account.id,
                None => {
                    return Err(Error::InvalidState(
                        "Select an account before choosing a contact".to_string(),
                    ))
                }
            };
            if contact.account_id != account_id {
                return Err(Error::InvalidState(format!(
                    "Contact {} belongs to account {}, not {}",
                    contact.id, contact.account_id, account_id
                )));
            }
            inner.state.selected_contact = Some(contact);
            inner.state.value()
        };
        self.shared.sink.on_change(value);
        Ok(())
    }

    /// Resets everything. Responses still in flight are dropped on arrival.
    pub fn clear(&self) {
        {
            let mut inner = self.lock();
            inner.disarm_debounce();
            inner.search_seq += 1;
            inner.selection_seq += 1;
            inner.state = SelectionState::default();
        }
        self.shared.sink.on_change(SelectionValue::default());
    }

    /// Restores a selection supplied by the host, e.g. when editing a ticket.
    ///
    /// The account and contact are fetched independently. A contact that
    /// belongs to another account is ignored and only the account is shown.
    /// The host is not notified; the value came from it.
    pub async fn initialize(&self, value: SelectionValue) -> Result<()> {
        let Some(account_id) = value.account_id else {
            let mut inner = self.lock();
            inner.selection_seq += 1;
            inner.state.selected_account = None;
            inner.state.selected_contact = None;
            inner.state.contacts.clear();
            return Ok(());
        };

        let seq = {
            let mut inner = self.lock();
            inner.selection_seq += 1;
            inner.selection_seq
        };

        let contact_lookup: OptionFuture<_> = value
            .contact_id
            .map(|id| self.shared.contacts.get_contact(id))
            .into();
        let (account, contact) = futures::join!(
            self.shared.accounts.get_account(account_id),
            contact_lookup
        );
        let account = account?;

        let contact = match contact {
            Some(Ok(contact)) if contact.account_id == account.id => Some(contact),
            Some(Ok(contact)) => {
                warn!(
                    "Contact {} belongs to account {}, not {}; showing the account only",
                    contact.id, contact.account_id, account.id
                );
                None
            }
            Some(Err(e)) => {
                warn!(
                    "Could not load contact {:?} for account {}: {}",
                    value.contact_id, account.id, e
                );
                None
            }
            None => None,
        };

        {
            let mut inner = self.lock();
            if inner.selection_seq != seq {
                debug!("Discarding stale initialization for account {}", account_id);
                return Ok(());
            }
            inner.state.selected_account = Some(account);
            inner.state.selected_contact = contact;
            inner.state.contacts.clear();
        }

        let result = self.shared.contacts.list_contacts(account_id, false).await;
        self.apply_contacts(account_id, seq, result)
    }
}
