use thiserror::Error;

/// Failures while parsing or validating a trace snapshot.
///
/// All of these are fatal to the transformation: a snapshot that fails
/// validation produces no graph at all.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not well-formed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("event references machine {machine} which is not in the machine list")]
    UnknownMachine { machine: String },

    #[error("negative clock {clock} for machine {machine}")]
    NegativeClock { machine: String, clock: i64 },
}

/// Failures while assembling the space-time graph from a valid snapshot.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("message endpoint {machine} at clock {clock} does not match any event node")]
    DanglingReference { machine: String, clock: u64 },

    #[error("two messages share the edge identity {id}")]
    DuplicateMessageEdge { id: String },
}

/// Failures raised by the simulation engine.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown machine {machine}")]
    UnknownMachine { machine: String },

    #[error("no pending {message_type} message for machine {machine}")]
    NoPendingMessage {
        machine: String,
        message_type: String,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
