//! Single-primary contact rules.
//!
//! Every function takes the full contact set of one account and returns the
//! full next set. Callers diff the two with [`changed_between`] to decide
//! which remote updates to issue, so the invariant is checked on whole sets
//! rather than on individually applied patches.

use std::collections::HashMap;

use super::contacts_model::{Contact, ContactStatus};
use crate::errors::{Error, Result};

/// Orders contacts for display: PRIMARY, then ACTIVE, then INACTIVE.
///
/// Ids are allocated monotonically by the backend, so ties are broken by id
/// to keep insertion order.
pub fn sort_for_display(contacts: &mut [Contact]) {
    contacts.sort_by(|a, b| {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub fn sorted(mut contacts: Vec<Contact>) -> Vec<Contact> {
    sort_for_display(&mut contacts);
    contacts
}

pub fn primary_count(contacts: &[Contact]) -> usize {
    contacts.iter().filter(|c| c.is_primary()).count()
}

/// True when at most one contact is primary and every flag matches its status.
pub fn holds_invariant(contacts: &[Contact]) -> bool {
    primary_count(contacts) <= 1 && contacts.iter().all(|c| !c.has_inconsistent_flag())
}

/// Demotes every primary (or primary-flagged) contact except `keep` to ACTIVE.
///
/// Inactive contacts keep their status; a stale `is_primary` flag on them is
/// cleared.
pub fn demote_all(contacts: &[Contact], keep: Option<i64>) -> Vec<Contact> {
    contacts
        .iter()
        .cloned()
        .map(|mut c| {
            if Some(c.id) == keep {
                return c;
            }
            if c.is_inactive() {
                c.is_primary = false;
            } else if c.is_primary() || c.is_primary {
                c.set_status(ContactStatus::Active);
            }
            c
        })
        .collect()
}

/// Makes `contact_id` the primary contact of `account_id`.
pub fn promote(contacts: &[Contact], account_id: i64, contact_id: i64) -> Result<Vec<Contact>> {
    let target = contacts
        .iter()
        .find(|c| c.id == contact_id && c.account_id == account_id)
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Contact {} does not belong to account {}",
                contact_id, account_id
            ))
        })?;

    if target.is_inactive() {
        return Err(Error::InvalidState(format!(
            "Contact {} is inactive and cannot become primary",
            contact_id
        )));
    }

    let mut next = demote_all(contacts, Some(contact_id));
    if let Some(c) = next.iter_mut().find(|c| c.id == contact_id) {
        c.set_status(ContactStatus::Primary);
    }
    Ok(next)
}

/// Adds a newly created contact, demoting the others first if it is primary.
pub fn insert(contacts: &[Contact], new_contact: Contact) -> Vec<Contact> {
    let mut next = if new_contact.is_primary() || new_contact.is_primary {
        demote_all(contacts, None)
    } else {
        contacts.to_vec()
    };
    next.retain(|c| c.id != new_contact.id);
    next.push(new_contact);
    next
}

/// Marks a contact INACTIVE regardless of its previous status.
pub fn deactivate(contacts: &[Contact], contact_id: i64) -> Result<Vec<Contact>> {
    if !contacts.iter().any(|c| c.id == contact_id) {
        return Err(Error::NotFound(format!("Contact {}", contact_id)));
    }
    Ok(contacts
        .iter()
        .cloned()
        .map(|mut c| {
            if c.id == contact_id {
                c.set_status(ContactStatus::Inactive);
            }
            c
        })
        .collect())
}

/// Contacts in `after` whose status or flag differs from `before`.
pub fn changed_between(before: &[Contact], after: &[Contact]) -> Vec<Contact> {
    let previous: HashMap<i64, (ContactStatus, bool)> = before
        .iter()
        .map(|c| (c.id, (c.status, c.is_primary)))
        .collect();

    after
        .iter()
        .filter(|c| previous.get(&c.id) != Some(&(c.status, c.is_primary)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn contact(id: i64, status: ContactStatus) -> Contact {
        Contact {
            id,
            account_id: 7,
            name: format!("Contact {}", id),
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

    fn ids(contacts: &[Contact]) -> Vec<i64> {
        contacts.iter().map(|c| c.id).collect()
    }

    fn status_of(contacts: &[Contact], id: i64) -> ContactStatus {
        contacts.iter().find(|c| c.id == id).unwrap().status
    }

    #[test]
    fn test_display_order() {
        let mut contacts = vec![
            contact(4, ContactStatus::Inactive),
            contact(2, ContactStatus::Active),
            contact(3, ContactStatus::Primary),
            contact(1, ContactStatus::Active),
        ];
        sort_for_display(&mut contacts);
        assert_eq!(ids(&contacts), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_promote_demotes_previous_primary_to_active() {
        let contacts = vec![
            contact(1, ContactStatus::Primary),
            contact(2, ContactStatus::Active),
            contact(3, ContactStatus::Inactive),
        ];
        let next = promote(&contacts, 7, 2).unwrap();
        assert_eq!(status_of(&next, 1), ContactStatus::Active);
        assert_eq!(status_of(&next, 2), ContactStatus::Primary);
        assert_eq!(status_of(&next, 3), ContactStatus::Inactive);
        assert!(holds_invariant(&next));
    }

    #[test]
    fn test_promote_twice() {
        let contacts = vec![
            contact(1, ContactStatus::Active),
            contact(2, ContactStatus::Active),
        ];
        let next = promote(&contacts, 7, 1).unwrap();
        let next = promote(&next, 7, 2).unwrap();
        assert_eq!(status_of(&next, 1), ContactStatus::Active);
        assert_eq!(status_of(&next, 2), ContactStatus::Primary);
    }

    #[test]
    fn test_promote_rejects_foreign_contact() {
        let contacts = vec![contact(1, ContactStatus::Active)];
        assert!(matches!(promote(&contacts, 8, 1), Err(Error::NotFound(_))));
        assert!(matches!(promote(&contacts, 7, 99), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_promote_rejects_inactive_contact() {
        let contacts = vec![contact(1, ContactStatus::Inactive)];
        assert!(matches!(
            promote(&contacts, 7, 1),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_insert_primary_demotes_existing() {
        let contacts = vec![
            contact(1, ContactStatus::Primary),
            contact(2, ContactStatus::Active),
        ];
        let next = sorted(insert(&contacts, contact(3, ContactStatus::Primary)));
        assert_eq!(ids(&next), vec![3, 1, 2]);
        assert_eq!(status_of(&next, 1), ContactStatus::Active);
        assert!(holds_invariant(&next));
    }

    #[test]
    fn test_demote_clears_stale_flags() {
        let mut legacy = contact(1, ContactStatus::Active);
        legacy.is_primary = true;
        let mut inactive = contact(2, ContactStatus::Inactive);
        inactive.is_primary = true;

        let next = demote_all(&[legacy, inactive], None);
        assert!(holds_invariant(&next));
        assert_eq!(status_of(&next, 2), ContactStatus::Inactive);
    }

    #[test]
    fn test_deactivate_primary() {
        let contacts = vec![contact(1, ContactStatus::Primary)];
        let next = deactivate(&contacts, 1).unwrap();
        assert_eq!(status_of(&next, 1), ContactStatus::Inactive);
        assert!(!next[0].is_primary);
        assert_eq!(primary_count(&next), 0);
    }

    #[test]
    fn test_changed_between_reports_only_transitions() {
        let before = vec![
            contact(1, ContactStatus::Primary),
            contact(2, ContactStatus::Active),
            contact(3, ContactStatus::Active),
        ];
        let after = promote(&before, 7, 2).unwrap();
        let changed = changed_between(&before, &after);
        assert_eq!(ids(&changed), vec![1, 2]);
    }
}
