use serde::Serialize;
use serde_json::json;
use worldline_core::{Envelope, Machine, MachineId, TraceSnapshot};

/// A captured run of the voting-ring protocol: three machines, six
/// messages, two of which elect a leader.
pub const RING_VOTE_SNAPSHOT: &str = r#"{"nodes": [0, 1, 2], "edges": [{"src": "2", "src_clock": 0, "message_type": "Petition", "dst": "0", "dst_handler": "handle_petition", "dst_clock": 1}, {"src": "0", "src_clock": 1, "message_type": "Vote", "dst": "2", "dst_handler": "handle_vote", "dst_clock": 2}, {"src": "1", "src_clock": 0, "message_type": "Petition", "dst": "2", "dst_handler": "handle_petition", "dst_clock": 3}, {"src": "0", "src_clock": 0, "message_type": "Petition", "dst": "1", "dst_handler": "handle_petition", "dst_clock": 4}, {"src": "2", "src_clock": 3, "message_type": "Vote", "dst": "1", "dst_handler": "handle_vote", "dst_clock": 5}, {"src": "1", "src_clock": 4, "message_type": "Vote", "dst": "0", "dst_handler": "handle_vote", "dst_clock": 6}]}"#;

#[derive(Debug, Serialize)]
pub struct SnapshotFixture {
    pub snapshot: TraceSnapshot,
    pub expected_nodes: usize,
    pub expected_timeline_edges: usize,
    pub expected_message_edges: usize,
}

pub fn ring_vote_fixture() -> SnapshotFixture {
    let snapshot =
        TraceSnapshot::from_json(RING_VOTE_SNAPSHOT).expect("reference snapshot parses");

    // Three machines, each with an init node and two handled events.
    SnapshotFixture {
        snapshot,
        expected_nodes: 9,
        expected_timeline_edges: 6,
        expected_message_edges: 6,
    }
}

/// Lowest-id-wins voting ring: every member petitions its right neighbor at
/// startup; a petition from an id no lower than the recipient's, or one
/// arriving while the recipient already leads, is rejected. An accepted
/// vote makes its recipient a leader — more than one member can end up
/// leading, which is the protocol defect the diagram makes visible.
#[derive(Debug)]
pub struct RingMember {
    id: u64,
    right: u64,
    pub is_leader: bool,
}

impl RingMember {
    pub fn new(id: u64, right: u64) -> Self {
        Self {
            id,
            right,
            is_leader: false,
        }
    }

    fn machine_id(n: u64) -> MachineId {
        MachineId::new(n.to_string())
    }
}

impl Machine for RingMember {
    fn initialize(&mut self) -> Vec<Envelope> {
        vec![Envelope::new(
            Self::machine_id(self.id),
            Self::machine_id(self.right),
            "Petition",
            json!({ "sender": self.id }),
        )]
    }

    fn handle(&mut self, envelope: &Envelope) -> Vec<Envelope> {
        match envelope.message_type.as_str() {
            "Petition" => {
                let sender = envelope.payload["sender"].as_u64().unwrap_or(u64::MAX);
                let accepted = sender < self.id && !self.is_leader;

                vec![Envelope::new(
                    Self::machine_id(self.id),
                    envelope.from.clone(),
                    "Vote",
                    json!({ "accepted": accepted }),
                )]
            }
            "Vote" => {
                if envelope.payload["accepted"].as_bool().unwrap_or(false) {
                    self.is_leader = true;
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

/// A three-member ring (0 -> 1 -> 2 -> 0), ids matching the reference
/// snapshot's machine list.
pub fn ring_members() -> Vec<(MachineId, RingMember)> {
    (0..3u64)
        .map(|id| {
            (
                MachineId::new(id.to_string()),
                RingMember::new(id, (id + 1) % 3),
            )
        })
        .collect()
}
