// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph canvas core.
//!
//! This crate provides the editing model behind a node graph widget:
//! - Nodes with ordered input and output sockets and computed layout
//! - Connections drawn as curved paths with an arrow
//! - Groups that frame and move a set of nodes together
//! - A canvas with selection, grid snapping, zoom and pointer gestures
//!
//! ## Architecture
//!
//! The canvas is built on id-keyed registries:
//! - [`Scene`] owns every node, connection and group
//! - Nodes own their sockets; connections name their endpoints by [`SocketId`]
//! - Geometry changes propagate node, then connections, then groups
//! - Items paint through the [`PaintSurface`] trait; [`ui`] adapts it to egui
//! - Properties are styled by type and instance name through [`StyleSheet`]

pub mod animation;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod geometry;
pub mod group;
pub mod node;
pub mod paint;
pub mod scene;
pub mod socket;
pub mod stress;
pub mod style;
pub mod text;
pub mod ui;
pub mod view;
pub mod zorder;

pub use config::CanvasConfig;
pub use connection::{Connection, ConnectionId};
pub use error::{ConfigError, ConnectionError, SceneError, StyleError};
pub use events::SceneEvent;
pub use group::{GroupId, NodeGroup};
pub use node::{Node, NodeId, NodeKind};
pub use paint::{PaintSurface, RecordingSurface, SceneItem};
pub use scene::{DragState, Scene, SceneHit};
pub use socket::{Socket, SocketId, SocketType};
pub use stress::StressReport;
pub use style::{PropertyValue, StyleSheet, Styleable};
pub use text::{ElideMode, Font};
pub use view::ViewState;
pub use zorder::ZOrderService;
