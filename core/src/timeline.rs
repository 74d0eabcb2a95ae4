use crate::config::LayoutConfig;
use crate::snapshot::{MachineId, TraceSnapshot};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Whether a node marks a machine's initialization or an ordinary handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Init,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One visual vertex of the space-time diagram.
///
/// Identity is `(machine, clock)`; a node is created the first time that
/// pair is referenced and reused for every later reference. Immutable once
/// built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramNode {
    pub id: String,
    pub position: Position,
    pub label: String,
    pub kind: NodeKind,
    #[serde(skip)]
    pub machine: MachineId,
    #[serde(skip)]
    pub clock: u64,
}

/// Renderer-facing identifier for the event at `clock` on `machine`.
pub fn node_id(machine: &MachineId, clock: u64) -> String {
    format!("{machine}-{clock}")
}

/// Per-machine, clock-ordered node sequences.
///
/// This is the single source of truth consumed by both timeline-edge
/// synthesis and message-edge resolution.
#[derive(Debug, Clone)]
pub struct MachineTimelines {
    lanes: HashMap<MachineId, Vec<DiagramNode>>,
    index: HashSet<(MachineId, u64)>,
    order: Vec<MachineId>,
}

impl MachineTimelines {
    /// Group the snapshot's events into per-machine node sequences.
    ///
    /// The destination pair of every event materializes a node; the source
    /// pair only at clock zero, since every other source clock was already
    /// created as the destination of an earlier event.
    pub fn build(snapshot: &TraceSnapshot, layout: &LayoutConfig) -> Self {
        let mut timelines = Self {
            lanes: HashMap::new(),
            index: HashSet::new(),
            order: snapshot.machines().to_vec(),
        };

        for event in snapshot.events() {
            if event.src_clock == 0 {
                timelines.insert(
                    snapshot,
                    layout,
                    &event.src,
                    0,
                    NodeKind::Init,
                    format!("Init: Node: {}, Clock: 0", event.src),
                );
            }

            timelines.insert(
                snapshot,
                layout,
                &event.dst,
                event.dst_clock,
                NodeKind::Event,
                format!(
                    "{}: Node: {}, Clock: {}",
                    event.dst_handler, event.dst, event.dst_clock
                ),
            );
        }

        // Clock order is the authoritative event order per machine.
        for lane in timelines.lanes.values_mut() {
            lane.sort_by_key(|node| node.clock);
        }

        tracing::debug!(
            machines = timelines.order.len(),
            nodes = timelines.index.len(),
            "built machine timelines"
        );

        timelines
    }

    fn insert(
        &mut self,
        snapshot: &TraceSnapshot,
        layout: &LayoutConfig,
        machine: &MachineId,
        clock: u64,
        kind: NodeKind,
        label: String,
    ) {
        if !self.index.insert((machine.clone(), clock)) {
            return;
        }

        let row = snapshot
            .vertical_index(machine)
            .expect("validated snapshot lists every referenced machine");

        self.lanes
            .entry(machine.clone())
            .or_default()
            .push(DiagramNode {
                id: node_id(machine, clock),
                position: Position {
                    x: clock as f64 * layout.column_width,
                    y: row as f64 * layout.row_height,
                },
                label,
                kind,
                machine: machine.clone(),
                clock,
            });
    }

    /// Declared machines, in rendering order.
    pub fn machines(&self) -> &[MachineId] {
        &self.order
    }

    /// The machine's clock-ordered nodes. Empty for a machine no event
    /// references, which is not an error.
    pub fn lane(&self, machine: &MachineId) -> &[DiagramNode] {
        self.lanes.get(machine).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a node with identity `(machine, clock)` was materialized.
    pub fn contains(&self, machine: &MachineId, clock: u64) -> bool {
        self.index.contains(&(machine.clone(), clock))
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Flatten all lanes into one node list, machines in declared order.
    pub fn into_nodes(mut self) -> Vec<DiagramNode> {
        let mut nodes = Vec::with_capacity(self.index.len());
        for machine in &self.order {
            if let Some(lane) = self.lanes.remove(machine) {
                nodes.extend(lane);
            }
        }
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> TraceSnapshot {
        TraceSnapshot::from_value(json!({
            "nodes": [0, 1, 2],
            "edges": [
                {"src": "2", "src_clock": 0, "message_type": "Petition",
                 "dst": "0", "dst_handler": "handle_petition", "dst_clock": 1},
                {"src": "0", "src_clock": 1, "message_type": "Vote",
                 "dst": "2", "dst_handler": "handle_vote", "dst_clock": 2}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn synthesizes_init_node_at_clock_zero_only() {
        let timelines = MachineTimelines::build(&snapshot(), &LayoutConfig::default());

        let lane_two = timelines.lane(&MachineId::new("2"));
        assert_eq!(lane_two.len(), 2);
        assert_eq!(lane_two[0].kind, NodeKind::Init);
        assert_eq!(lane_two[0].label, "Init: Node: 2, Clock: 0");
        assert_eq!(lane_two[1].kind, NodeKind::Event);

        // Source clock 1 on machine 0 reuses the destination node of the
        // first event rather than creating a second one.
        let lane_zero = timelines.lane(&MachineId::new("0"));
        assert_eq!(lane_zero.len(), 1);
        assert_eq!(lane_zero[0].label, "handle_petition: Node: 0, Clock: 1");
    }

    #[test]
    fn positions_follow_clock_and_vertical_index() {
        let timelines = MachineTimelines::build(&snapshot(), &LayoutConfig::default());

        let lane_two = timelines.lane(&MachineId::new("2"));
        assert_eq!(lane_two[0].position, Position { x: 0.0, y: 200.0 });
        assert_eq!(lane_two[1].position, Position { x: 200.0, y: 200.0 });

        let lane_zero = timelines.lane(&MachineId::new("0"));
        assert_eq!(lane_zero[0].position, Position { x: 100.0, y: 0.0 });
    }

    #[test]
    fn lanes_sorted_by_clock() {
        let snapshot = TraceSnapshot::from_value(json!({
            "nodes": ["a", "b"],
            "edges": [
                {"src": "b", "src_clock": 0, "message_type": "Ping",
                 "dst": "a", "dst_handler": "handle_ping", "dst_clock": 9},
                {"src": "b", "src_clock": 0, "message_type": "Ping",
                 "dst": "a", "dst_handler": "handle_ping", "dst_clock": 4}
            ]
        }))
        .unwrap();

        let timelines = MachineTimelines::build(&snapshot, &LayoutConfig::default());
        let clocks: Vec<u64> = timelines
            .lane(&MachineId::new("a"))
            .iter()
            .map(|n| n.clock)
            .collect();

        assert_eq!(clocks, vec![4, 9]);
        // The duplicate (b, 0) init reference produced a single node.
        assert_eq!(timelines.lane(&MachineId::new("b")).len(), 1);
    }

    #[test]
    fn unreferenced_machine_has_empty_lane() {
        let timelines = MachineTimelines::build(&snapshot(), &LayoutConfig::default());
        assert!(timelines.lane(&MachineId::new("1")).is_empty());
    }

    #[test]
    fn flatten_respects_declared_order() {
        let timelines = MachineTimelines::build(&snapshot(), &LayoutConfig::default());
        let ids: Vec<String> = timelines.into_nodes().into_iter().map(|n| n.id).collect();

        assert_eq!(ids, vec!["0-1", "2-0", "2-2"]);
    }
}
