use std::sync::{Arc, Mutex};

use super::selection_model::SelectionValue;

/// Receives the selection whenever the user changes it.
///
/// Called synchronously from the coordinator; implementations must not block.
pub trait SelectionSink: Send + Sync {
    fn on_change(&self, value: SelectionValue);
}

#[derive(Clone, Default)]
pub struct NoOpSelectionSink;

impl SelectionSink for NoOpSelectionSink {
    fn on_change(&self, _value: SelectionValue) {}
}

/// Collecting sink, mostly for tests.
#[derive(Clone, Default)]
pub struct RecordingSelectionSink {
    values: Arc<Mutex<Vec<SelectionValue>>>,
}

impl RecordingSelectionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<SelectionValue> {
        self.values
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<SelectionValue> {
        self.values().pop()
    }
}

impl SelectionSink for RecordingSelectionSink {
    fn on_change(&self, value: SelectionValue) {
        if let Ok(mut values) = self.values.lock() {
            values.push(value);
        }
    }
}
