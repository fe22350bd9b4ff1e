//! Shareboard Core Library
//!
//! Platform-agnostic canvas state machine and peer-synchronization protocol
//! for the Shareboard shared whiteboard. Two peers each hold an independently
//! mutable copy of the element pool; local tool gestures mutate it through
//! the state machine and the synchronization layer reconciles the peers by
//! element id over an ordered data channel.

pub mod canvas;
pub mod elements;
pub mod geometry;
pub mod history;
pub mod identity;
pub mod selection;
pub mod signaling;
pub mod storage;
pub mod sync;
pub mod tools;
pub mod transport;

pub use canvas::{CanvasError, CanvasState, CommittedEdit, KeyInput};
pub use elements::{CanvasElement, Color, ElementId, Line, StrokeStyle, TextBox};
pub use geometry::BoundingBox;
pub use history::{History, HistoryAction};
pub use identity::UserIdentity;
pub use selection::{HorizontalZone, SelectionHover, VerticalZone};
pub use signaling::{CallSession, MemorySignalingStore, SignalingStore};
pub use storage::{BoardSnapshot, BoardStore, MemoryStorage, Storage};
pub use sync::{ConnectionState, SyncManager, WireMessage};
pub use tools::{ToolKind, ToolSettings};
pub use transport::{ChannelTransport, PeerTransport};
