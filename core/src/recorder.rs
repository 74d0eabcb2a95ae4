use crate::error::SnapshotError;
use crate::snapshot::{MachineId, MessageEvent, TraceSnapshot};

/// Accumulates handled messages into the snapshot wire format.
///
/// The recorder is the producer side of the pipeline: a driver calls
/// [`TraceRecorder::record`] each time a recipient machine handles a
/// message, then seals the finished trace for the diagram core. Messages
/// still in flight when the run ends are never recorded; only handled
/// messages become events.
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    machines: Vec<MachineId>,
    events: Vec<MessageEvent>,
}

impl TraceRecorder {
    pub fn new(machines: Vec<MachineId>) -> Self {
        Self {
            machines,
            events: Vec::new(),
        }
    }

    /// Record one handled message.
    pub fn record(&mut self, event: MessageEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[MessageEvent] {
        &self.events
    }

    /// Seal the recording into a validated snapshot.
    pub fn into_snapshot(self) -> Result<TraceSnapshot, SnapshotError> {
        TraceSnapshot::new(self.machines, self.events)
    }
}
