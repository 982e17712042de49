//! Dealers module - succession workflow for retiring dealer accounts.

mod dealers_model;
mod dealers_service;
mod dealers_traits;


pub use dealers_model::{
    DeactivationOutcome, DeactivationRequest, DealerDeactivation, DealerDeactivationCommand,
    SuccessorOptions, TransferRecord, TransferTarget, TransferType,
};
pub use dealers_service::DealerService;
pub use dealers_traits::DealerServiceTrait;
