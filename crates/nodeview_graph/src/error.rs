// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for canvas, connection, style and config operations.

use crate::connection::ConnectionId;
use crate::group::GroupId;
use crate::node::NodeId;
use crate::socket::SocketId;

/// Error when addressing items on the canvas
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Socket not found
    #[error("Socket not found: {0:?}")]
    SocketNotFound(SocketId),

    /// Connection not found
    #[error("Connection not found: {0:?}")]
    ConnectionNotFound(ConnectionId),

    /// Group not found
    #[error("Group not found: {0:?}")]
    GroupNotFound(GroupId),

    /// A node with this id is already on the canvas
    #[error("Node already added: {0:?}")]
    DuplicateNode(NodeId),

    /// Socket index outside the node's socket sequence
    #[error("Socket index {index} out of range (len {len})")]
    SocketIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Length of the sequence
        len: usize,
    },
}

/// Error when creating a connection between two sockets
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// One of the sockets is the invalid sentinel
    #[error("Invalid socket")]
    InvalidSocket,

    /// Socket not found
    #[error("Socket not found: {0:?}")]
    SocketNotFound(SocketId),

    /// Both sockets are inputs, or both are outputs
    #[error("Sockets have the same direction")]
    SameDirection,

    /// Both sockets belong to the same node
    #[error("Sockets belong to the same node: {0:?}")]
    SameNode(NodeId),
}

/// Error when writing a style property
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    /// The item has no property with this name
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// The value has the wrong type for the property
    #[error("Property {property} expects {expected}")]
    TypeMismatch {
        /// Property name
        property: String,
        /// Expected value kind
        expected: &'static str,
    },
}

/// Error when loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}
