//! Deletion module - eligibility checks and guarded destructive actions.

mod deletion_model;
mod deletion_service;
mod deletion_traits;


pub use deletion_model::{Deactivation, DeletionEligibility, DestructiveAction, SuggestedAction};
pub use deletion_service::DeletionService;
pub use deletion_traits::DeletionServiceTrait;
