use crate::error::SnapshotError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque identifier naming a participating machine.
///
/// Recorders disagree on whether machine ids are JSON numbers or strings
/// (the machine list is commonly numeric while event endpoints are strings),
/// so both forms deserialize to the same string id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MachineId(String);

impl MachineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MachineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for MachineId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => MachineId(n.to_string()),
            Raw::Text(s) => MachineId(s),
        })
    }
}

/// One causal transition: a message sent by `src` at `src_clock` and handled
/// by `dst_handler` on `dst` at `dst_clock`.
///
/// Clocks are per-machine logical times, not wall-clock timestamps. Each
/// clock value is unique within its owning machine's event sequence and
/// doubles as the node identity in the assembled diagram. A source clock of
/// zero marks the sender's initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEvent {
    pub src: MachineId,
    pub src_clock: u64,
    pub message_type: String,
    pub dst: MachineId,
    pub dst_handler: String,
    pub dst_clock: u64,
}

#[derive(Deserialize)]
struct RawEvent {
    src: MachineId,
    src_clock: i64,
    message_type: String,
    dst: MachineId,
    dst_handler: String,
    dst_clock: i64,
}

#[derive(Deserialize)]
struct RawSnapshot {
    nodes: Vec<MachineId>,
    edges: Vec<RawEvent>,
}

/// The parsed, validated in-memory representation of a causal trace.
///
/// The machine list is ordered: a machine's position in it is its vertical
/// index, which fixes both layout stacking and message-edge side resolution.
/// Once constructed the snapshot is immutable; layouts are recomputed from
/// it in full, never patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSnapshot {
    #[serde(rename = "nodes")]
    machines: Vec<MachineId>,
    #[serde(rename = "edges")]
    events: Vec<MessageEvent>,
}

impl TraceSnapshot {
    /// Build a snapshot from already-decoded parts, enforcing the machine
    /// list invariant.
    pub fn new(
        machines: Vec<MachineId>,
        events: Vec<MessageEvent>,
    ) -> Result<Self, SnapshotError> {
        let declared: HashSet<&MachineId> = machines.iter().collect();
        for event in &events {
            for machine in [&event.src, &event.dst] {
                if !declared.contains(machine) {
                    return Err(SnapshotError::UnknownMachine {
                        machine: machine.to_string(),
                    });
                }
            }
        }
        Ok(Self { machines, events })
    }

    /// Parse and validate a snapshot from its JSON wire form.
    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(input)?;
        Self::from_raw(raw)
    }

    /// Parse and validate a snapshot from an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSnapshot) -> Result<Self, SnapshotError> {
        let mut events = Vec::with_capacity(raw.edges.len());
        for edge in raw.edges {
            for (machine, clock) in [(&edge.src, edge.src_clock), (&edge.dst, edge.dst_clock)] {
                if clock < 0 {
                    return Err(SnapshotError::NegativeClock {
                        machine: machine.to_string(),
                        clock,
                    });
                }
            }
            events.push(MessageEvent {
                src: edge.src,
                src_clock: edge.src_clock as u64,
                message_type: edge.message_type,
                dst: edge.dst,
                dst_handler: edge.dst_handler,
                dst_clock: edge.dst_clock as u64,
            });
        }
        Self::new(raw.nodes, events)
    }

    /// Serialize back to the JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Declared machines, in rendering order (top of the diagram first).
    pub fn machines(&self) -> &[MachineId] {
        &self.machines
    }

    pub fn events(&self) -> &[MessageEvent] {
        &self.events
    }

    /// A machine's position in the declared list. `None` only for machines
    /// the snapshot has never heard of; every machine referenced by an event
    /// is guaranteed present.
    pub fn vertical_index(&self, machine: &MachineId) -> Option<usize> {
        self.machines.iter().position(|m| m == machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_id_forms() {
        let snapshot = TraceSnapshot::from_json(
            r#"{"nodes": [0, 1, 2], "edges": [{"src": "2", "src_clock": 0, "message_type": "Petition", "dst": "0", "dst_handler": "handle_petition", "dst_clock": 1}]}"#,
        )
        .unwrap();

        assert_eq!(
            snapshot.machines(),
            &[MachineId::new("0"), MachineId::new("1"), MachineId::new("2")]
        );
        assert_eq!(snapshot.events().len(), 1);
        assert_eq!(snapshot.events()[0].src, MachineId::new("2"));
        assert_eq!(snapshot.events()[0].dst_clock, 1);
    }

    #[test]
    fn rejects_undeclared_machine() {
        let err = TraceSnapshot::from_value(json!({
            "nodes": [0, 1],
            "edges": [{
                "src": "7", "src_clock": 0,
                "message_type": "Petition",
                "dst": "0", "dst_handler": "handle_petition", "dst_clock": 1
            }]
        }))
        .unwrap_err();

        assert!(matches!(err, SnapshotError::UnknownMachine { machine } if machine == "7"));
    }

    #[test]
    fn rejects_negative_clock() {
        let err = TraceSnapshot::from_value(json!({
            "nodes": [0, 1],
            "edges": [{
                "src": "0", "src_clock": -3,
                "message_type": "Petition",
                "dst": "1", "dst_handler": "handle_petition", "dst_clock": 1
            }]
        }))
        .unwrap_err();

        assert!(matches!(err, SnapshotError::NegativeClock { clock: -3, .. }));
    }

    #[test]
    fn rejects_missing_field() {
        let err = TraceSnapshot::from_json(
            r#"{"nodes": [0], "edges": [{"src": "0", "src_clock": 0}]}"#,
        )
        .unwrap_err();

        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn vertical_index_follows_declared_order() {
        let snapshot = TraceSnapshot::from_value(json!({"nodes": ["b", "a"], "edges": []})).unwrap();

        assert_eq!(snapshot.vertical_index(&MachineId::new("b")), Some(0));
        assert_eq!(snapshot.vertical_index(&MachineId::new("a")), Some(1));
        assert_eq!(snapshot.vertical_index(&MachineId::new("c")), None);
    }

    #[test]
    fn wire_round_trip() {
        let input = r#"{"nodes":["0","1"],"edges":[{"src":"0","src_clock":0,"message_type":"Ping","dst":"1","dst_handler":"handle_ping","dst_clock":1}]}"#;
        let snapshot = TraceSnapshot::from_json(input).unwrap();
        let reparsed = TraceSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(snapshot, reparsed);
    }
}
