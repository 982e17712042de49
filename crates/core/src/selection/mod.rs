//! Selection module - the account/contact picker workflow.

mod selection_coordinator;
mod selection_model;
mod selection_sink;


pub use selection_coordinator::SelectionCoordinator;
pub use selection_model::{SearchPhase, SelectionStage, SelectionState, SelectionValue};
pub use selection_sink::{NoOpSelectionSink, RecordingSelectionSink, SelectionSink};
