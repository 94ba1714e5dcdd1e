//! Event sink that keeps everything it receives

use crate::events::BridgeEvent;
use crate::ports::EventSink;
use parking_lot::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct RecordingEventSink {
    events: RwLock<Vec<BridgeEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.read().clone()
    }

    /// Number of recorded events with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.events.read().iter().filter(|e| e.name() == name).count()
    }

    /// Drains the recorded events.
    pub fn take(&self) -> Vec<BridgeEvent> {
        std::mem::take(&mut *self.events.write())
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: BridgeEvent) {
        debug!(event = event.name(), hyperion_id = event.hyperion_id(), "[hyperion] event");
        self.events.write().push(event);
    }
}
