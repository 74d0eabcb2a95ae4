use crate::config::Config;
use crate::error::GraphError;
use crate::resolve::{self, DiagramEdge};
use crate::snapshot::TraceSnapshot;
use crate::timeline::{DiagramNode, MachineTimelines};
use itertools::Itertools;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// The assembled space-time diagram: every node plus all timeline and
/// message edges, ready to hand to a renderer.
///
/// The graph owns its nodes and edges outright and is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceTimeGraph {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl SpaceTimeGraph {
    /// Serialize in the renderer-facing schema.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Directed view over the diagram, node ids as weights.
    pub fn to_digraph(&self) -> DiGraph<&str, &DiagramEdge> {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();

        for node in &self.nodes {
            indices.insert(node.id.as_str(), graph.add_node(node.id.as_str()));
        }

        for edge in &self.edges {
            if let (Some(&source), Some(&target)) = (
                indices.get(edge.source.as_str()),
                indices.get(edge.target.as_str()),
            ) {
                graph.add_edge(source, target, edge);
            }
        }

        graph
    }

    /// A recorded trace must not loop back on itself: every edge moves
    /// forward in logical time, so the combined timeline/message graph is a
    /// DAG for any consistent trace.
    pub fn is_causally_consistent(&self) -> bool {
        !is_cyclic_directed(&self.to_digraph())
    }
}

/// Build the complete space-time diagram for one snapshot.
///
/// Pure and stateless: re-running on the same snapshot and config yields an
/// identical graph, node for node and edge for edge.
pub fn assemble(snapshot: &TraceSnapshot, config: &Config) -> Result<SpaceTimeGraph, GraphError> {
    let timelines = MachineTimelines::build(snapshot, &config.layout);

    let mut edges = Vec::new();

    // One run of N-1 structural edges per machine, consecutive pairs only.
    for machine in snapshot.machines() {
        for (node, next) in timelines.lane(machine).iter().tuple_windows() {
            edges.push(resolve::timeline_edge(node, next));
        }
    }

    let mut message_ids = HashSet::new();
    for event in snapshot.events() {
        let edge = resolve::resolve_message_edge(event, snapshot, &timelines, &config.style)?;
        if !message_ids.insert(edge.id.clone()) {
            return Err(GraphError::DuplicateMessageEdge { id: edge.id });
        }
        edges.push(edge);
    }

    let nodes = timelines.into_nodes();

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        "assembled space-time graph"
    );

    Ok(SpaceTimeGraph { nodes, edges })
}

/// Parse a snapshot from its JSON wire form and assemble it in one step.
pub fn assemble_from_json(input: &str, config: &Config) -> Result<SpaceTimeGraph, GraphError> {
    let snapshot = TraceSnapshot::from_json(input)?;
    assemble(&snapshot, config)
}
