//! Recording event bus for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::EventBus;
use crate::error::BusError;
use crate::event::BusEntry;

/// Keeps every accepted batch in publish order.
///
/// Can be told to fail a given call (1-based) to exercise error paths.
#[derive(Debug, Default)]
pub struct RecordingBus {
    batches: Mutex<Vec<Vec<BusEntry>>>,
    calls: Mutex<usize>,
    fail_on_call: Option<usize>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose `call`-th publish fails.
    pub fn failing_on_call(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    /// Batches accepted so far.
    pub fn batches(&self) -> Vec<Vec<BusEntry>> {
        self.batches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Publish calls attempted so far, failed ones included.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn put_entries(&self, entries: &[BusEntry]) -> Result<(), BusError> {
        let call = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            *calls += 1;
            *calls
        };

        if self.fail_on_call == Some(call) {
            return Err(BusError::Publish(format!("scripted failure on call {}", call)));
        }

        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entries.to_vec());
        Ok(())
    }
}
