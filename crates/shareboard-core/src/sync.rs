//! Peer synchronization layer.
//!
//! Translates committed local edits into wire messages and applies inbound
//! messages from the peer, joined on element id. The data channel is assumed
//! reliable and ordered; no message carries a logical clock, so concurrent
//! edits to the same element resolve purely by arrival order (last write
//! wins). That is an accepted weakness of the two-party design; a
//! per-element version counter would be the upgrade path.

use crate::canvas::{CanvasState, CommittedEdit};
use crate::elements::{CanvasElement, ElementId};
use crate::geometry::BoundingBox;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("malformed wire message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Connection state of the peer channel, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Messages exchanged between the two peers, as UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    /// Newly drawn elements, serialized in full.
    Draw { elements: Vec<CanvasElement> },
    /// Elements removed, by id.
    Erase { ids: Vec<ElementId> },
    /// Elements translated, by id.
    Move {
        ids: Vec<ElementId>,
        dx: f64,
        dy: f64,
    },
    /// Elements rescaled between two boxes, by id.
    Resize {
        ids: Vec<ElementId>,
        before: BoundingBox,
        after: BoundingBox,
    },
    /// Full replacement state of one element.
    Update { element: CanvasElement },
    /// Full snapshot of the pool, sent once when a peer joins.
    InitialState { elements: Vec<CanvasElement> },
}

impl From<CommittedEdit> for WireMessage {
    fn from(edit: CommittedEdit) -> Self {
        match edit {
            CommittedEdit::Draw { elements } => WireMessage::Draw { elements },
            CommittedEdit::Erase { ids } => WireMessage::Erase { ids },
            CommittedEdit::Move { ids, dx, dy } => WireMessage::Move { ids, dx, dy },
            CommittedEdit::Resize { ids, before, after } => {
                WireMessage::Resize { ids, before, after }
            }
            CommittedEdit::Update { element } => WireMessage::Update { element },
        }
    }
}

/// Bridges the canvas and the peer channel: queues outbound messages for the
/// transport to drain, and reconciles inbound messages into the local pool.
#[derive(Debug, Default)]
pub struct SyncManager {
    connection: ConnectionState,
    /// Pending outgoing messages (JSON strings).
    outgoing: Vec<String>,
}

impl SyncManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Record a connection-state change reported by the host. Losing the
    /// connection drops any queued messages; the canvas itself stays usable
    /// standalone.
    pub fn set_connection(&mut self, state: ConnectionState) {
        if state != self.connection {
            log::info!("peer connection: {:?} -> {:?}", self.connection, state);
        }
        self.connection = state;
        if matches!(
            state,
            ConnectionState::Disconnected | ConnectionState::Failed
        ) {
            self.outgoing.clear();
        }
    }

    /// Drain the canvas's committed edits into outbound wire messages. While
    /// disconnected the edits are dropped: a joining peer receives a full
    /// snapshot instead.
    pub fn broadcast_committed(&mut self, canvas: &mut CanvasState) {
        for edit in canvas.take_committed() {
            if self.is_connected() {
                self.queue(&WireMessage::from(edit));
            }
        }
    }

    /// Snapshot message for a newly joined peer.
    pub fn initial_state_message(canvas: &CanvasState) -> WireMessage {
        WireMessage::InitialState {
            elements: canvas.all_elements().cloned().collect(),
        }
    }

    /// Serialize and queue one message for sending.
    pub fn queue(&mut self, message: &WireMessage) {
        match serde_json::to_string(message) {
            Ok(json) => self.outgoing.push(json),
            Err(err) => log::error!("failed to encode wire message: {err}"),
        }
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Apply one inbound message to the local pool.
    ///
    /// Remote-origin mutations never touch the history log: undo is strictly
    /// local and never un-applies a peer's edit.
    pub fn apply_remote(&mut self, canvas: &mut CanvasState, json: &str) -> Result<(), SyncError> {
        let message: WireMessage = serde_json::from_str(json)?;
        self.apply_message(canvas, message);
        Ok(())
    }

    /// Apply an already-decoded inbound message.
    pub fn apply_message(&mut self, canvas: &mut CanvasState, message: WireMessage) {
        match message {
            WireMessage::Draw { elements } => {
                for element in elements {
                    // An id collision is a protocol error; reject the element
                    // rather than silently overwrite local state.
                    if canvas.contains_id(element.id()) {
                        log::warn!("rejecting draw with duplicate element id {}", element.id());
                    } else {
                        canvas.insert_element(element);
                    }
                }
            }
            WireMessage::Erase { ids } => {
                let removed = canvas.remove_by_ids(&ids);
                if removed < ids.len() {
                    // The peer may have erased elements we already dropped.
                    log::debug!("erase referenced {} unknown ids", ids.len() - removed);
                }
            }
            WireMessage::Move { ids, dx, dy } => {
                let moved = canvas.translate_by_ids(&ids, dx, dy);
                if moved < ids.len() {
                    log::debug!("move referenced {} unknown ids", ids.len() - moved);
                }
            }
            WireMessage::Resize { ids, before, after } => {
                let scaled = canvas.scale_by_ids(&ids, &before, &after);
                if scaled < ids.len() {
                    log::debug!("resize referenced {} unknown ids", ids.len() - scaled);
                }
            }
            WireMessage::Update { element } => {
                // Upsert: an update for an unknown id is a late-arriving draw.
                canvas.replace_element(element);
            }
            WireMessage::InitialState { elements } => {
                canvas.replace_all(elements);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Color, Line, StrokeStyle, TextBox};
    use crate::tools::{ToolKind, ToolSettings};
    use kurbo::Point;
    use uuid::Uuid;

    fn line_element(x0: f64, y0: f64, x1: f64, y1: f64) -> CanvasElement {
        CanvasElement::Line(Line::new(
            vec![Point::new(x0, y0), Point::new(x1, y1)],
            Color::black(),
            2.0,
            StrokeStyle::Solid,
        ))
    }

    fn connected_manager() -> SyncManager {
        let mut sync = SyncManager::new();
        sync.set_connection(ConnectionState::Connected);
        sync
    }

    #[test]
    fn test_remote_draw_appends_elements() {
        let mut canvas = CanvasState::new();
        let mut sync = connected_manager();
        let element = line_element(0.0, 0.0, 10.0, 10.0);
        let id = element.id();

        sync.apply_message(
            &mut canvas,
            WireMessage::Draw {
                elements: vec![element],
            },
        );
        assert_eq!(canvas.element_count(), 1);
        assert_eq!(canvas.all_elements().next().unwrap().id(), id);
        // Remote edits never enter the local history.
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_remote_draw_with_duplicate_id_is_rejected() {
        let mut canvas = CanvasState::new();
        let mut sync = connected_manager();
        let element = line_element(0.0, 0.0, 10.0, 10.0);

        sync.apply_message(
            &mut canvas,
            WireMessage::Draw {
                elements: vec![element.clone()],
            },
        );
        // Same id again, different geometry: must not overwrite.
        let mut altered = element;
        altered.translate(100.0, 100.0);
        sync.apply_message(
            &mut canvas,
            WireMessage::Draw {
                elements: vec![altered],
            },
        );

        assert_eq!(canvas.element_count(), 1);
        let b = canvas.all_elements().next().unwrap().bounding_box();
        assert_eq!((b.x0, b.y0), (0.0, 0.0));
    }

    #[test]
    fn test_remote_erase_of_unknown_id_leaves_pool_unchanged() {
        let mut canvas = CanvasState::new();
        let mut sync = connected_manager();
        sync.apply_message(
            &mut canvas,
            WireMessage::Draw {
                elements: vec![line_element(0.0, 0.0, 10.0, 10.0)],
            },
        );

        sync.apply_message(
            &mut canvas,
            WireMessage::Erase {
                ids: vec![Uuid::new_v4()],
            },
        );
        assert_eq!(canvas.element_count(), 1);
    }

    #[test]
    fn test_remote_move_ignores_unknown_ids() {
        let mut canvas = CanvasState::new();
        let mut sync = connected_manager();
        let element = line_element(0.0, 0.0, 10.0, 10.0);
        let id = element.id();
        sync.apply_message(
            &mut canvas,
            WireMessage::Draw {
                elements: vec![element],
            },
        );

        sync.apply_message(
            &mut canvas,
            WireMessage::Move {
                ids: vec![id, Uuid::new_v4()],
                dx: 5.0,
                dy: 5.0,
            },
        );
        let b = canvas.all_elements().next().unwrap().bounding_box();
        assert_eq!((b.x0, b.y0), (5.0, 5.0));
    }

    #[test]
    fn test_remote_update_replaces_fields_and_upserts() {
        let mut canvas = CanvasState::new();
        let mut sync = connected_manager();
        let tb = TextBox::new(
            "v1".to_string(),
            crate::geometry::BoundingBox::new(0.0, 0.0, 300.0, 200.0),
            Color::black(),
            None,
            20.0,
            "serif".to_string(),
        );
        let id = tb.id;

        // Update for an absent id behaves as a late-arriving draw.
        sync.apply_message(
            &mut canvas,
            WireMessage::Update {
                element: CanvasElement::TextBox(tb.clone()),
            },
        );
        assert_eq!(canvas.element_count(), 1);

        let mut tb2 = tb;
        tb2.text = "v2".to_string();
        sync.apply_message(
            &mut canvas,
            WireMessage::Update {
                element: CanvasElement::TextBox(tb2),
            },
        );
        assert_eq!(canvas.element_count(), 1);
        let CanvasElement::TextBox(current) = canvas.all_elements().next().unwrap() else {
            panic!("expected a text box");
        };
        assert_eq!(current.text, "v2");
        assert_eq!(current.id, id);
    }

    #[test]
    fn test_initial_state_replaces_the_pool() {
        let mut canvas = CanvasState::new();
        let mut sync = connected_manager();
        sync.apply_message(
            &mut canvas,
            WireMessage::Draw {
                elements: vec![line_element(0.0, 0.0, 1.0, 1.0)],
            },
        );

        let snapshot = vec![
            line_element(10.0, 10.0, 20.0, 20.0),
            line_element(30.0, 30.0, 40.0, 40.0),
        ];
        sync.apply_message(
            &mut canvas,
            WireMessage::InitialState { elements: snapshot },
        );
        assert_eq!(canvas.element_count(), 2);
    }

    #[test]
    fn test_wire_round_trip() {
        let message = WireMessage::Move {
            ids: vec![Uuid::new_v4()],
            dx: 1.5,
            dy: -2.5,
        };
        let json = serde_json::to_string(&message).unwrap();
        let back: WireMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(message, back);
    }

    #[test]
    fn test_malformed_message_is_an_error() {
        let mut canvas = CanvasState::new();
        let mut sync = connected_manager();
        assert!(sync.apply_remote(&mut canvas, "{\"type\":\"explode\"}").is_err());
        assert!(sync.apply_remote(&mut canvas, "not json").is_err());
    }

    #[test]
    fn test_local_commits_are_queued_only_while_connected() {
        let tools = ToolSettings::default().with_tool(ToolKind::Pencil);
        let mut canvas = CanvasState::new();
        let mut sync = SyncManager::new();

        canvas.handle_pointer_down(Point::new(0.0, 0.0), &tools);
        canvas.handle_pointer_move(Point::new(10.0, 0.0), &tools);
        canvas.handle_pointer_up(Point::new(10.0, 0.0), &tools).unwrap();
        sync.broadcast_committed(&mut canvas);
        assert!(!sync.has_outgoing());

        sync.set_connection(ConnectionState::Connected);
        canvas.handle_pointer_down(Point::new(0.0, 5.0), &tools);
        canvas.handle_pointer_move(Point::new(10.0, 5.0), &tools);
        canvas.handle_pointer_up(Point::new(10.0, 5.0), &tools).unwrap();
        sync.broadcast_committed(&mut canvas);
        assert_eq!(sync.take_outgoing().len(), 1);
    }

    #[test]
    fn test_disconnect_clears_queued_messages() {
        let mut sync = connected_manager();
        sync.queue(&WireMessage::Erase { ids: vec![] });
        assert!(sync.has_outgoing());
        sync.set_connection(ConnectionState::Failed);
        assert!(!sync.has_outgoing());
    }

    #[test]
    fn test_two_peers_converge_over_a_channel() {
        use crate::transport::{ChannelTransport, PeerTransport};

        let tools = ToolSettings::default().with_tool(ToolKind::Pencil);
        let (mut host_channel, mut guest_channel) = ChannelTransport::pair();
        let mut host_canvas = CanvasState::new();
        let mut host_sync = connected_manager();
        let mut guest_canvas = CanvasState::new();
        let mut guest_sync = connected_manager();

        // Host draws before the guest joins.
        host_canvas.handle_pointer_down(Point::new(0.0, 0.0), &tools);
        host_canvas.handle_pointer_move(Point::new(10.0, 10.0), &tools);
        host_canvas
            .handle_pointer_up(Point::new(10.0, 10.0), &tools)
            .unwrap();
        host_sync.broadcast_committed(&mut host_canvas);
        // Nobody is listening yet; drop the queued broadcast.
        host_sync.take_outgoing();

        // Guest joins: the host sends the full snapshot down the channel.
        host_sync.queue(&SyncManager::initial_state_message(&host_canvas));
        for json in host_sync.take_outgoing() {
            host_channel.send(&json).unwrap();
        }
        for json in guest_channel.poll() {
            guest_sync.apply_remote(&mut guest_canvas, &json).unwrap();
        }
        assert_eq!(guest_canvas.element_count(), 1);

        // Guest draws; host applies the broadcast.
        guest_canvas.handle_pointer_down(Point::new(50.0, 50.0), &tools);
        guest_canvas.handle_pointer_move(Point::new(60.0, 60.0), &tools);
        guest_canvas
            .handle_pointer_up(Point::new(60.0, 60.0), &tools)
            .unwrap();
        guest_sync.broadcast_committed(&mut guest_canvas);
        for json in guest_sync.take_outgoing() {
            guest_channel.send(&json).unwrap();
        }
        for json in host_channel.poll() {
            host_sync.apply_remote(&mut host_canvas, &json).unwrap();
        }
        assert_eq!(host_canvas.element_count(), 2);

        // Host undoes its own draw; the inverse reaches the guest.
        host_canvas.undo();
        host_sync.broadcast_committed(&mut host_canvas);
        for json in host_sync.take_outgoing() {
            host_channel.send(&json).unwrap();
        }
        for json in guest_channel.poll() {
            guest_sync.apply_remote(&mut guest_canvas, &json).unwrap();
        }

        assert_eq!(host_canvas.element_count(), 1);
        assert_eq!(guest_canvas.element_count(), 1);
        let host_ids: Vec<_> = host_canvas.all_elements().map(|e| e.id()).collect();
        let guest_ids: Vec<_> = guest_canvas.all_elements().map(|e| e.id()).collect();
        assert_eq!(host_ids, guest_ids);
    }
}
