//! Deletion eligibility models.

use serde::{Deserialize, Serialize};

use crate::accounts::{Account, DependentCounts};
use crate::dealers::DealerDeactivation;

/// Destructive actions guarded by the deliberation delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DestructiveAction {
    SoftDelete,
    Purge,
}

/// What the caller should offer for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestedAction {
    Delete,
    Deactivate,
}

/// Derived from dependent-record counts; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionEligibility {
    pub account_id: i64,
    pub has_related_data: bool,
    pub counts: DependentCounts,
}

impl DeletionEligibility {
    pub fn from_counts(account_id: i64, counts: DependentCounts) -> Self {
        Self {
            account_id,
            has_related_data: counts.has_related_data(),
            counts,
        }
    }

    pub fn eligible_for_hard_delete(&self) -> bool {
        !self.has_related_data
    }

    pub fn suggested_action(&self) -> SuggestedAction {
        if self.has_related_data {
            SuggestedAction::Deactivate
        } else {
            SuggestedAction::Delete
        }
    }
}

/// Result of the non-destructive alternative to deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deactivation {
    Account { account: Account },
    Dealer { outcome: DealerDeactivation },
}
