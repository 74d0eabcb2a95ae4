use crate::error::SimError;
use crate::recorder::TraceRecorder;
use crate::snapshot::{MachineId, MessageEvent, TraceSnapshot};
use serde_json::Value;
use std::collections::HashMap;

/// A message in flight between two machines.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: MachineId,
    pub to: MachineId,
    pub message_type: String,
    pub payload: Value,
}

impl Envelope {
    pub fn new(
        from: MachineId,
        to: MachineId,
        message_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            from,
            to,
            message_type: message_type.into(),
            payload,
        }
    }
}

/// Behavior of one simulated machine.
///
/// Implementations hold their own protocol state; the simulation owns the
/// clock, the in-flight messages, and the trace.
pub trait Machine {
    /// Messages the machine sends when the simulation starts it.
    fn initialize(&mut self) -> Vec<Envelope>;

    /// Handle one delivered message, returning any messages to send.
    fn handle(&mut self, envelope: &Envelope) -> Vec<Envelope>;
}

#[derive(Debug, Clone)]
struct InFlight {
    envelope: Envelope,
    sent_at: u64,
}

/// Deterministic message-passing simulator with a single global logical
/// clock.
///
/// The schedule is explicit: the driver decides which machine handles which
/// message type next, so a run is reproducible and every interleaving of
/// interest can be forced. Each delivery advances the clock by one and
/// records a trace event; sends are stamped with the clock at send time,
/// so initialization messages go out at clock zero.
pub struct Simulation<M: Machine> {
    machines: Vec<(MachineId, M)>,
    pending: HashMap<MachineId, Vec<InFlight>>,
    clock: u64,
    recorder: TraceRecorder,
}

impl<M: Machine> Simulation<M> {
    pub fn new(machines: Vec<(MachineId, M)>) -> Self {
        let ids: Vec<MachineId> = machines.iter().map(|(id, _)| id.clone()).collect();

        Self {
            pending: ids.iter().cloned().map(|id| (id, Vec::new())).collect(),
            recorder: TraceRecorder::new(ids),
            machines,
            clock: 0,
        }
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn machine(&self, id: &MachineId) -> Option<&M> {
        self.machines
            .iter()
            .find(|(machine_id, _)| machine_id == id)
            .map(|(_, machine)| machine)
    }

    /// Start one machine: whatever it sends is stamped with the current
    /// clock. Does not advance the clock.
    pub fn initialize(&mut self, id: &MachineId) -> Result<(), SimError> {
        let outgoing = self.machine_mut(id)?.initialize();
        self.send_all(outgoing)
    }

    /// Deliver the oldest pending message of `message_type` addressed to
    /// `id`: advance the clock, record the trace event, dispatch the
    /// machine's handler and send whatever it returns.
    pub fn deliver(&mut self, id: &MachineId, message_type: &str) -> Result<(), SimError> {
        let queue = self
            .pending
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownMachine {
                machine: id.to_string(),
            })?;
        let position = queue
            .iter()
            .position(|in_flight| in_flight.envelope.message_type == message_type)
            .ok_or_else(|| SimError::NoPendingMessage {
                machine: id.to_string(),
                message_type: message_type.to_string(),
            })?;
        let in_flight = queue.remove(position);

        self.clock += 1;
        self.recorder.record(MessageEvent {
            src: in_flight.envelope.from.clone(),
            src_clock: in_flight.sent_at,
            message_type: in_flight.envelope.message_type.clone(),
            dst: id.clone(),
            dst_handler: handler_name(message_type),
            dst_clock: self.clock,
        });

        tracing::debug!(
            machine = %id,
            message_type,
            clock = self.clock,
            "delivered message"
        );

        let outgoing = self.machine_mut(id)?.handle(&in_flight.envelope);
        self.send_all(outgoing)
    }

    /// Finish the run and seal the recorded causal trace.
    pub fn into_snapshot(self) -> Result<TraceSnapshot, SimError> {
        Ok(self.recorder.into_snapshot()?)
    }

    fn machine_mut(&mut self, id: &MachineId) -> Result<&mut M, SimError> {
        self.machines
            .iter_mut()
            .find(|(machine_id, _)| machine_id == id)
            .map(|(_, machine)| machine)
            .ok_or_else(|| SimError::UnknownMachine {
                machine: id.to_string(),
            })
    }

    fn send_all(&mut self, outgoing: Vec<Envelope>) -> Result<(), SimError> {
        for envelope in outgoing {
            let queue =
                self.pending
                    .get_mut(&envelope.to)
                    .ok_or_else(|| SimError::UnknownMachine {
                        machine: envelope.to.to_string(),
                    })?;
            queue.push(InFlight {
                sent_at: self.clock,
                envelope,
            });
        }
        Ok(())
    }
}

/// Recording convention: a `Petition` is handled by `handle_petition`.
fn handler_name(message_type: &str) -> String {
    format!("handle_{}", message_type.to_lowercase())
}
