pub mod assemble;
pub mod config;
pub mod error;
pub mod recorder;
pub mod resolve;
pub mod sim;
pub mod snapshot;
pub mod timeline;

pub use assemble::{assemble, assemble_from_json, SpaceTimeGraph};
pub use config::{Config, LayoutConfig, StyleConfig};
pub use error::{GraphError, SimError, SnapshotError};
pub use recorder::TraceRecorder;
pub use resolve::{DiagramEdge, EdgeKind, EdgeStyle, HandleSide};
pub use sim::{Envelope, Machine, Simulation};
pub use snapshot::{MachineId, MessageEvent, TraceSnapshot};
pub use timeline::{DiagramNode, MachineTimelines, NodeKind, Position};
