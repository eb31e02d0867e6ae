// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notifications raised by the canvas.
//!
//! The canvas queues events while it mutates and the consumer drains them
//! with [`crate::Scene::drain_events`], usually once per frame.

use crate::connection::ConnectionId;
use crate::group::GroupId;
use crate::node::NodeId;
use crate::socket::SocketId;
use egui::Pos2;

/// Something observable changed on the canvas
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A node was registered
    NodeAdded(NodeId),
    /// A node was removed along with its sockets
    NodeDeleted(NodeId),
    /// The set of selected items changed
    SelectionChanged,
    /// Two sockets were joined
    ConnectionCreated(ConnectionId),
    /// A connection was destroyed
    ConnectionDeleted(ConnectionId),
    /// A drag started from a socket
    ConnectionStarted(SocketId),
    /// Exactly one connection is selected
    ConnectionSelected(ConnectionId),
    /// The pointer entered a connection
    ConnectionMouseOver(ConnectionId),
    /// A new-connection drag ended over empty space
    ConnectToEmpty {
        /// Socket the drag started from
        socket: SocketId,
        /// Release point in scene coordinates
        pos: Pos2,
    },
    /// An existing connection was dragged off a socket and dropped on empty space
    DisconnectToEmpty {
        /// Socket left attached to the dropped end
        socket: SocketId,
        /// Release point in scene coordinates
        pos: Pos2,
    },
    /// The zoom factor changed
    ZoomChanged(f32),
    /// A node's geometry or look changed
    ItemUpdated(NodeId),
    /// A group's frame changed
    GroupUpdated(GroupId),
}

impl SceneEvent {
    /// Node this event is about, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::NodeAdded(id) | Self::NodeDeleted(id) | Self::ItemUpdated(id) => Some(*id),
            Self::ConnectionStarted(socket)
            | Self::ConnectToEmpty { socket, .. }
            | Self::DisconnectToEmpty { socket, .. } => Some(socket.node),
            _ => None,
        }
    }
}
