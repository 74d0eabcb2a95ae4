use crate::config::StyleConfig;
use crate::error::GraphError;
use crate::snapshot::{MessageEvent, TraceSnapshot};
use crate::timeline::{node_id, DiagramNode, MachineTimelines};
use serde::Serialize;

/// Attachment point on a diagram node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Timeline,
    Message,
}

/// Stroke and arrow styling for a message edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    pub stroke_width: f64,
    pub animated: bool,
    pub arrow_width: f64,
    pub arrow_height: f64,
}

/// One directed edge of the space-time diagram.
///
/// Timeline edges are purely structural and carry no label or style;
/// message edges carry the message type and its visual classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramEdge {
    pub id: String,
    pub source: String,
    pub source_handle_side: HandleSide,
    pub target: String,
    pub target_handle_side: HandleSide,
    pub kind: EdgeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
}

/// Which sides a message edge leaves and enters, as a pure function of the
/// two machines' vertical indices.
///
/// A source drawn above its destination sends from its bottom into the
/// destination's top; otherwise the edge runs from the source's top into
/// the destination's bottom. Arrows stay visually monotonic whichever way
/// causality crosses the stack.
pub fn resolve_sides(source_index: usize, dest_index: usize) -> (HandleSide, HandleSide) {
    if source_index < dest_index {
        (HandleSide::Bottom, HandleSide::Top)
    } else {
        (HandleSide::Top, HandleSide::Bottom)
    }
}

/// Produce the message edge for one event.
///
/// Edge identity is `(src, src_clock, dst, dst_clock)`. Both endpoints must
/// have been materialized by timeline building; a trace that references a
/// source clock never observed as a destination is corrupt, not renderable.
pub fn resolve_message_edge(
    event: &MessageEvent,
    snapshot: &TraceSnapshot,
    timelines: &MachineTimelines,
    style: &StyleConfig,
) -> Result<DiagramEdge, GraphError> {
    for (machine, clock) in [(&event.src, event.src_clock), (&event.dst, event.dst_clock)] {
        if !timelines.contains(machine, clock) {
            return Err(GraphError::DanglingReference {
                machine: machine.to_string(),
                clock,
            });
        }
    }

    let source_index = snapshot
        .vertical_index(&event.src)
        .expect("validated snapshot lists every referenced machine");
    let dest_index = snapshot
        .vertical_index(&event.dst)
        .expect("validated snapshot lists every referenced machine");

    let (source_side, target_side) = resolve_sides(source_index, dest_index);

    Ok(DiagramEdge {
        id: format!(
            "{}-{}-{}-{}",
            event.src, event.src_clock, event.dst, event.dst_clock
        ),
        source: node_id(&event.src, event.src_clock),
        source_handle_side: source_side,
        target: node_id(&event.dst, event.dst_clock),
        target_handle_side: target_side,
        kind: EdgeKind::Message,
        label: Some(event.message_type.clone()),
        style: Some(EdgeStyle {
            stroke: style.color_for(&event.message_type).to_string(),
            stroke_width: style.stroke_width,
            animated: true,
            arrow_width: style.arrow_width,
            arrow_height: style.arrow_height,
        }),
    })
}

/// Structural edge between two consecutive nodes on the same machine,
/// keeping the lane on one horizontal line.
pub fn timeline_edge(from: &DiagramNode, to: &DiagramNode) -> DiagramEdge {
    DiagramEdge {
        id: format!("{}-{}", from.id, to.id),
        source: from.id.clone(),
        source_handle_side: HandleSide::Right,
        target: to.id.clone(),
        target_handle_side: HandleSide::Left,
        kind: EdgeKind::Timeline,
        label: None,
        style: None,
    }
}
