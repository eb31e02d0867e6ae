// SPDX-License-Identifier: MIT OR Apache-2.0
//! The canvas: registries of nodes, connections and groups.
//!
//! Nodes own their sockets. Connections live in the canvas registry and name
//! their endpoints by [`SocketId`]; every socket keeps the ids of the
//! connections attached to it. All structural edits go through [`Scene`], which
//! keeps both sides consistent and propagates geometry in a fixed order:
//! node layout, then connection reroute, then group frames.

mod interaction;

pub use interaction::{DragState, RubberBand};

use crate::config::CanvasConfig;
use crate::connection::{Connection, ConnectionId};
use crate::error::{ConnectionError, SceneError};
use crate::events::SceneEvent;
use crate::geometry::snap_to_grid;
use crate::group::{GroupId, NodeGroup};
use crate::node::{Node, NodeId, NodeKind};
use crate::paint::{PaintSurface, SceneItem};
use crate::socket::{Socket, SocketId, SocketType};
use crate::style::StyleSheet;
use crate::view::ViewState;
use crate::zorder::ZOrderService;
use egui::{Pos2, Rect};
use indexmap::IndexMap;
use interaction::Interaction;

/// Topmost item under a scene point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneHit {
    /// A socket's connection point
    Socket(SocketId),
    /// A node body
    Node(NodeId),
    /// A connection path or arrow
    Connection(ConnectionId),
    /// A group title strip
    Group(GroupId),
}

/// Node graph canvas
pub struct Scene {
    nodes: IndexMap<NodeId, Node>,
    connections: IndexMap<ConnectionId, Connection>,
    groups: IndexMap<GroupId, NodeGroup>,
    z_order: ZOrderService,
    config: CanvasConfig,
    style: StyleSheet,
    view: ViewState,
    creation_point: Pos2,
    events: Vec<SceneEvent>,
    interaction: Interaction,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty canvas sharing the process-wide z-order counters
    pub fn new() -> Self {
        Self::with_parts(CanvasConfig::default(), ZOrderService::global())
    }

    /// Empty canvas with the given settings
    pub fn with_config(config: CanvasConfig) -> Self {
        Self::with_parts(config, ZOrderService::global())
    }

    /// Empty canvas drawing z values from `z_order`
    pub fn with_z_order(z_order: ZOrderService) -> Self {
        Self::with_parts(CanvasConfig::default(), z_order)
    }

    fn with_parts(config: CanvasConfig, z_order: ZOrderService) -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            groups: IndexMap::new(),
            z_order,
            view: ViewState::new(&config),
            config,
            style: StyleSheet::new(),
            creation_point: Pos2::ZERO,
            events: Vec::new(),
            interaction: Interaction::default(),
        }
    }

    /// Canvas settings
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// The z-order counters in use
    pub fn z_order(&self) -> &ZOrderService {
        &self.z_order
    }

    /// Viewport transform
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Viewport transform, mutable
    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    // ---- events --------------------------------------------------------

    fn emit(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- nodes ---------------------------------------------------------

    /// Where new nodes are placed
    pub fn creation_point(&self) -> Pos2 {
        self.creation_point
    }

    /// Move the creation point
    pub fn set_creation_point(&mut self, pos: Pos2) {
        self.creation_point = pos;
    }

    /// Create a standard node with default sockets at the creation point.
    ///
    /// A non-empty `type_tag` becomes the instance name used for styling.
    pub fn create_node(&mut self, inputs: usize, outputs: usize, type_tag: &str) -> NodeId {
        self.create_with_kind(NodeKind::Standard, inputs, outputs, type_tag)
    }

    /// Create a node without a title bar
    pub fn create_simple_node(&mut self, inputs: usize, outputs: usize, type_tag: &str) -> NodeId {
        self.create_with_kind(NodeKind::Simple { min_height: 0.0 }, inputs, outputs, type_tag)
    }

    /// Create a node with side sockets and a collapsible detail area
    pub fn create_side_socket_node(&mut self, inputs: usize, outputs: usize, type_tag: &str) -> NodeId {
        let kind = NodeKind::SideSocket(Default::default());
        self.create_with_kind(kind, inputs, outputs, type_tag)
    }

    fn create_with_kind(&mut self, kind: NodeKind, inputs: usize, outputs: usize, type_tag: &str) -> NodeId {
        let mut node = Node::with_kind(NodeId::new(), kind);
        node.begin_modify_node();
        for _ in 0..inputs {
            node.add_input_socket();
        }
        for _ in 0..outputs {
            node.add_output_socket();
        }
        if !type_tag.is_empty() {
            node.set_name(type_tag);
        }
        node.end_modify_node();
        self.insert_node(node)
    }

    /// Register a node built elsewhere and place it at the creation point.
    ///
    /// Connections do not travel with a node, so any socket back-references
    /// it carries are dropped.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, SceneError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(SceneError::DuplicateNode(id));
        }
        let stale: usize = node.sockets_mut().map(|s| s.take_connections().len()).sum();
        if stale > 0 {
            tracing::debug!("Dropped {} foreign connection references from node {:?}", stale, id);
        }
        Ok(self.insert_node(node))
    }

    fn insert_node(&mut self, mut node: Node) -> NodeId {
        let id = node.id();
        node.set_pos(self.creation_point);
        node.set_z_value(self.z_order.next_node());
        node.set_selected(false);
        if node.take_restyle() {
            restyle_node(&self.style, &mut node);
        }
        self.nodes.insert(id, node);
        tracing::debug!("Node {:?} added", id);
        self.emit(SceneEvent::NodeAdded(id));
        id
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node ids in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Change a node, then reroute its connections and refresh its groups
    pub fn update_node<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Node) -> R) -> Result<R, SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        let result = f(node);
        if node.take_restyle() {
            restyle_node(&self.style, node);
        }
        self.node_changed(id);
        Ok(result)
    }

    /// Move a node
    pub fn set_node_position(&mut self, id: NodeId, pos: Pos2) -> Result<(), SceneError> {
        self.update_node(id, |node| node.set_pos(pos))
    }

    fn node_changed(&mut self, id: NodeId) {
        self.reroute_node(id);
        self.emit(SceneEvent::ItemUpdated(id));
        let groups: Vec<GroupId> = self
            .groups
            .values()
            .filter(|g| g.contains_node(id))
            .map(NodeGroup::id)
            .collect();
        for group in groups {
            self.refresh_group(group);
        }
    }

    fn reroute_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        for socket in node.sockets() {
            for cid in socket.connections() {
                if let Some(connection) = self.connections.get_mut(cid) {
                    let (start, end) = endpoints(&self.nodes, connection);
                    connection.update_position(start, end);
                }
            }
        }
    }

    /// Delete a node, its sockets and every connection attached to them
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.shift_remove(&id).ok_or(SceneError::NodeNotFound(id))?;
        let attached: Vec<ConnectionId> = node
            .sockets()
            .flat_map(|s| s.connections().iter().copied())
            .collect();
        for cid in attached {
            self.destroy_connection(cid);
        }
        self.interaction.forget_node(id);

        let groups: Vec<GroupId> = self
            .groups
            .values_mut()
            .filter_map(|g| g.remove_member(id).then(|| g.id()))
            .collect();
        for group in groups {
            self.refresh_group(group);
        }

        tracing::info!("Node {:?} deleted", id);
        self.emit(SceneEvent::NodeDeleted(id));
        if node.is_selected() {
            self.notify_selection();
        }
        Ok(())
    }

    /// Delete every selected node
    pub fn delete_selected_nodes(&mut self) -> usize {
        let selected = self.selected_nodes();
        for id in &selected {
            if let Err(e) = self.delete_node(*id) {
                tracing::warn!("Failed to delete node: {}", e);
            }
        }
        selected.len()
    }

    /// Delete every node and restart the z-order counters
    pub fn delete_all_nodes(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        let count = ids.len();
        for id in ids {
            if let Err(e) = self.delete_node(id) {
                tracing::warn!("Failed to delete node: {}", e);
            }
        }
        self.z_order.reset();
        tracing::info!("Deleted all {} nodes", count);
    }

    // ---- sockets -------------------------------------------------------

    /// Socket by id
    pub fn socket(&self, id: SocketId) -> Option<&Socket> {
        self.nodes.get(&id.node)?.socket(id)
    }

    /// Connection anchor of a socket in scene coordinates
    pub fn socket_location(&self, id: SocketId) -> Option<Pos2> {
        socket_location(&self.nodes, id)
    }

    /// Change one socket, then relayout its node
    pub fn update_socket<R>(&mut self, id: SocketId, f: impl FnOnce(&mut Socket) -> R) -> Result<R, SceneError> {
        let node = self.nodes.get(&id.node).ok_or(SceneError::NodeNotFound(id.node))?;
        let (socket_type, index) = node.socket_index(id).ok_or(SceneError::SocketNotFound(id))?;
        self.update_node(id.node, |node| match socket_type {
            SocketType::Output => node.update_output_socket(index, f),
            _ => node.update_input_socket(index, f),
        })?
    }

    /// Delete an input socket and its connections
    pub fn delete_input_socket(&mut self, node: NodeId, index: usize) -> Result<(), SceneError> {
        self.delete_socket(node, SocketType::Input, index)
    }

    /// Delete an output socket and its connections
    pub fn delete_output_socket(&mut self, node: NodeId, index: usize) -> Result<(), SceneError> {
        self.delete_socket(node, SocketType::Output, index)
    }

    fn delete_socket(&mut self, id: NodeId, socket_type: SocketType, index: usize) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        let socket = match socket_type {
            SocketType::Output => node.remove_output_socket(index)?,
            _ => node.remove_input_socket(index)?,
        };
        for cid in socket.connections() {
            self.destroy_connection(*cid);
        }
        self.interaction.forget_socket(socket.id());
        self.node_changed(id);
        Ok(())
    }

    /// Allow or forbid several connections on a socket.
    ///
    /// Forbidding them while more than one is attached destroys them all.
    pub fn set_multiple_connections(&mut self, id: SocketId, multiple: bool) -> Result<(), SceneError> {
        let socket = self
            .nodes
            .get_mut(&id.node)
            .ok_or(SceneError::NodeNotFound(id.node))?
            .socket_mut(id)
            .ok_or(SceneError::SocketNotFound(id))?;
        let displaced = socket.set_multiple_connections(multiple);
        for cid in displaced {
            self.destroy_connection(cid);
        }
        Ok(())
    }

    /// Destroy every connection on a socket
    pub fn clear_connections(&mut self, id: SocketId) -> Result<usize, SceneError> {
        let attached = self
            .socket(id)
            .ok_or(SceneError::SocketNotFound(id))?
            .connections()
            .to_vec();
        for cid in &attached {
            self.destroy_connection(*cid);
        }
        Ok(attached.len())
    }

    // ---- connections ---------------------------------------------------

    fn resolve_socket(&self, id: SocketId) -> Result<&Socket, ConnectionError> {
        if id.node.0.is_nil() {
            return Err(ConnectionError::InvalidSocket);
        }
        let socket = self.socket(id).ok_or(ConnectionError::SocketNotFound(id))?;
        if socket.is_valid() {
            Ok(socket)
        } else {
            Err(ConnectionError::InvalidSocket)
        }
    }

    /// Join an output socket to an input socket on another node.
    ///
    /// Either argument order works. A socket that allows only one connection
    /// loses its current one first. On error nothing changes.
    pub fn create_connection(&mut self, a: SocketId, b: SocketId) -> Result<ConnectionId, ConnectionError> {
        let first = self.resolve_socket(a)?;
        let second = self.resolve_socket(b)?;
        if first.socket_type() == second.socket_type() {
            return Err(ConnectionError::SameDirection);
        }
        if a.node == b.node {
            return Err(ConnectionError::SameNode(a.node));
        }

        let (source, destination) = if first.socket_type() == SocketType::Output {
            (a, b)
        } else {
            (b, a)
        };

        for sid in [source, destination] {
            let displaced = match self.socket(sid) {
                Some(s) if !s.multiple_connections() => s.connections().to_vec(),
                _ => Vec::new(),
            };
            for cid in displaced {
                self.destroy_connection(cid);
            }
        }

        let id = ConnectionId::new();
        let mut connection = Connection::new(id, self.z_order.next_connection());
        connection.set_source(Some(source));
        connection.set_destination(Some(destination));
        let (start, end) = endpoints(&self.nodes, &connection);
        connection.update_position(start, end);
        self.style.apply(&mut connection);

        for sid in [source, destination] {
            if let Some(socket) = self.nodes.get_mut(&sid.node).and_then(|n| n.socket_mut(sid)) {
                socket.add_connection(id);
            }
        }
        self.connections.insert(id, connection);
        tracing::debug!("Connection {:?} created", id);
        self.emit(SceneEvent::ConnectionCreated(id));
        Ok(id)
    }

    /// Delete a connection, detaching it from both sockets
    pub fn delete_connection(&mut self, id: ConnectionId) -> Result<(), SceneError> {
        if self.destroy_connection(id) {
            Ok(())
        } else {
            Err(SceneError::ConnectionNotFound(id))
        }
    }

    fn destroy_connection(&mut self, id: ConnectionId) -> bool {
        let Some(connection) = self.connections.shift_remove(&id) else {
            return false;
        };
        for sid in [connection.source(), connection.destination()].into_iter().flatten() {
            if let Some(socket) = self.nodes.get_mut(&sid.node).and_then(|n| n.socket_mut(sid)) {
                socket.remove_connection(id);
            }
        }
        self.interaction.forget_connection(id);
        tracing::debug!("Connection {:?} deleted", id);
        self.emit(SceneEvent::ConnectionDeleted(id));
        if connection.is_selected() {
            self.notify_selection();
        }
        true
    }

    /// Delete every selected connection
    pub fn delete_selected_connections(&mut self) -> usize {
        let selected = self.selected_connections();
        for id in &selected {
            self.destroy_connection(*id);
        }
        selected.len()
    }

    /// Connection by id
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// All connections in creation order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Change a connection's look, then reroute it
    pub fn update_connection<R>(
        &mut self,
        id: ConnectionId,
        f: impl FnOnce(&mut Connection) -> R,
    ) -> Result<R, SceneError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(SceneError::ConnectionNotFound(id))?;
        let result = f(connection);
        let (start, end) = endpoints(&self.nodes, connection);
        connection.update_position(start, end);
        Ok(result)
    }

    /// Rename a connection and restyle it
    pub fn set_connection_name(&mut self, id: ConnectionId, name: &str) -> Result<(), SceneError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(SceneError::ConnectionNotFound(id))?;
        connection.set_name(name);
        self.style.apply(connection);
        Ok(())
    }

    // ---- connected-node queries ----------------------------------------

    fn peers(&self, socket: &Socket, outward: bool) -> Vec<(NodeId, usize)> {
        socket
            .connections()
            .iter()
            .filter_map(|cid| self.connections.get(cid))
            .filter_map(|c| if outward { c.destination() } else { c.source() })
            .filter_map(|sid| {
                let node = self.nodes.get(&sid.node)?;
                let (_, index) = node.socket_index(sid)?;
                Some((sid.node, index))
            })
            .collect()
    }

    /// Nodes feeding an input socket, with the index of their output socket
    pub fn connected_nodes_to_input_socket(&self, node: NodeId, index: usize) -> Result<Vec<(NodeId, usize)>, SceneError> {
        let node = self.nodes.get(&node).ok_or(SceneError::NodeNotFound(node))?;
        Ok(self.peers(node.input_socket(index)?, false))
    }

    /// Nodes fed by an output socket, with the index of their input socket
    pub fn connected_nodes_to_output_socket(&self, node: NodeId, index: usize) -> Result<Vec<(NodeId, usize)>, SceneError> {
        let node = self.nodes.get(&node).ok_or(SceneError::NodeNotFound(node))?;
        Ok(self.peers(node.output_socket(index)?, true))
    }

    /// Whether `check` feeds input socket `index` of `node`
    pub fn is_node_connected_to_input_socket(&self, node: NodeId, index: usize, check: NodeId) -> Result<bool, SceneError> {
        Ok(self
            .connected_nodes_to_input_socket(node, index)?
            .iter()
            .any(|(n, _)| *n == check))
    }

    /// Whether output socket `index` of `node` feeds `check`
    pub fn is_node_connected_to_output_socket(&self, node: NodeId, index: usize, check: NodeId) -> Result<bool, SceneError> {
        Ok(self
            .connected_nodes_to_output_socket(node, index)?
            .iter()
            .any(|(n, _)| *n == check))
    }

    /// Whether `check` feeds any input of `node`
    pub fn is_node_connected_to_input(&self, node: NodeId, check: NodeId) -> bool {
        let count = self.nodes.get(&node).map_or(0, Node::input_socket_count);
        (0..count).any(|i| self.is_node_connected_to_input_socket(node, i, check).unwrap_or(false))
    }

    /// Whether any output of `node` feeds `check`
    pub fn is_node_connected_to_output(&self, node: NodeId, check: NodeId) -> bool {
        let count = self.nodes.get(&node).map_or(0, Node::output_socket_count);
        (0..count).any(|i| self.is_node_connected_to_output_socket(node, i, check).unwrap_or(false))
    }

    /// Whether `node` and `check` share a connection in either direction
    pub fn is_node_connected(&self, node: NodeId, check: NodeId) -> bool {
        self.is_node_connected_to_input(node, check) || self.is_node_connected_to_output(node, check)
    }

    // ---- selection -----------------------------------------------------

    fn notify_selection(&mut self) {
        let connections = self.selected_connections();
        let others = self.nodes.values().filter(|n| n.is_selected()).count()
            + self.groups.values().filter(|g| g.is_selected()).count();
        if others == 0 && connections.len() == 1 {
            self.emit(SceneEvent::ConnectionSelected(connections[0]));
        }
        self.emit(SceneEvent::SelectionChanged);
    }

    fn mark_node_selected(&mut self, id: NodeId, selected: bool) -> Result<bool, SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.is_selected() == selected {
            return Ok(false);
        }
        node.set_selected(selected);
        if selected {
            node.set_z_value(self.z_order.next_node());
        }
        Ok(true)
    }

    fn mark_connection_selected(&mut self, id: ConnectionId, selected: bool) -> Result<bool, SceneError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(SceneError::ConnectionNotFound(id))?;
        if connection.is_selected() == selected {
            return Ok(false);
        }
        connection.set_selected(selected);
        if selected {
            connection.set_z_value(self.z_order.next_connection());
        }
        Ok(true)
    }

    fn mark_group_selected(&mut self, id: GroupId, selected: bool) -> Result<bool, SceneError> {
        let group = self.groups.get_mut(&id).ok_or(SceneError::GroupNotFound(id))?;
        if group.is_selected() == selected {
            return Ok(false);
        }
        group.set_selected(selected);
        Ok(true)
    }

    fn clear_selection_quietly(&mut self) -> bool {
        let mut changed = false;
        for node in self.nodes.values_mut().filter(|n| n.is_selected()) {
            node.set_selected(false);
            changed = true;
        }
        for connection in self.connections.values_mut().filter(|c| c.is_selected()) {
            connection.set_selected(false);
            changed = true;
        }
        for group in self.groups.values_mut().filter(|g| g.is_selected()) {
            group.set_selected(false);
            changed = true;
        }
        changed
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        if self.clear_selection_quietly() {
            self.notify_selection();
        }
    }

    /// Select a node, replacing the selection unless `additive`
    pub fn select_node(&mut self, id: NodeId, additive: bool) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&id) {
            return Err(SceneError::NodeNotFound(id));
        }
        let mut changed = !additive && self.clear_selection_quietly();
        changed |= self.mark_node_selected(id, true)?;
        if changed {
            self.notify_selection();
        }
        Ok(())
    }

    /// Set a node's selection state
    pub fn set_node_selected(&mut self, id: NodeId, selected: bool) -> Result<(), SceneError> {
        if self.mark_node_selected(id, selected)? {
            self.notify_selection();
        }
        Ok(())
    }

    /// Select a connection, replacing the selection unless `additive`
    pub fn select_connection(&mut self, id: ConnectionId, additive: bool) -> Result<(), SceneError> {
        if !self.connections.contains_key(&id) {
            return Err(SceneError::ConnectionNotFound(id));
        }
        let mut changed = !additive && self.clear_selection_quietly();
        changed |= self.mark_connection_selected(id, true)?;
        if changed {
            self.notify_selection();
        }
        Ok(())
    }

    /// Set a connection's selection state
    pub fn set_connection_selected(&mut self, id: ConnectionId, selected: bool) -> Result<(), SceneError> {
        if self.mark_connection_selected(id, selected)? {
            self.notify_selection();
        }
        Ok(())
    }

    /// Select a group, replacing the selection unless `additive`
    pub fn select_group(&mut self, id: GroupId, additive: bool) -> Result<(), SceneError> {
        if !self.groups.contains_key(&id) {
            return Err(SceneError::GroupNotFound(id));
        }
        let mut changed = !additive && self.clear_selection_quietly();
        changed |= self.mark_group_selected(id, true)?;
        if changed {
            self.notify_selection();
        }
        Ok(())
    }

    /// Ids of selected nodes
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes.values().filter(|n| n.is_selected()).map(Node::id).collect()
    }

    /// Ids of selected connections
    pub fn selected_connections(&self) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|c| c.is_selected())
            .map(Connection::id)
            .collect()
    }

    /// Ids of selected groups
    pub fn selected_groups(&self) -> Vec<GroupId> {
        self.groups.values().filter(|g| g.is_selected()).map(NodeGroup::id).collect()
    }

    /// Number of selected items of every kind
    pub fn selection_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_selected()).count()
            + self.connections.values().filter(|c| c.is_selected()).count()
            + self.groups.values().filter(|g| g.is_selected()).count()
    }

    // ---- grid ----------------------------------------------------------

    /// Grid spacing
    pub fn grid_size(&self) -> f32 {
        self.config.grid_size
    }

    /// Change the grid spacing; snaps every node when snapping is on
    pub fn set_grid_size(&mut self, size: f32) {
        self.config.grid_size = size;
        if self.config.snap_to_grid {
            self.snap_all();
        }
    }

    /// Whether released nodes snap to the grid
    pub fn snap_to_grid(&self) -> bool {
        self.config.snap_to_grid
    }

    /// Turn snapping on or off; turning it on snaps every node
    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.config.snap_to_grid = enabled;
        if enabled {
            self.snap_all();
        }
    }

    /// Whether grid lines are drawn
    pub fn grid_lines(&self) -> bool {
        self.config.grid_lines
    }

    /// Show or hide grid lines
    pub fn set_grid_lines(&mut self, enabled: bool) {
        self.config.grid_lines = enabled;
    }

    /// Snap one node to the grid if snapping is on
    pub fn snap_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        if !self.config.snap_to_grid {
            return Ok(());
        }
        let grid = self.config.grid_size;
        let pos = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?.pos();
        let snapped = snap_to_grid(pos, grid);
        if snapped != pos {
            self.set_node_position(id, snapped)?;
        }
        Ok(())
    }

    fn snap_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.snap_node(id) {
                tracing::warn!("Failed to snap node: {}", e);
            }
        }
    }

    // ---- groups --------------------------------------------------------

    /// Create an empty group
    pub fn create_group(&mut self, title: &str) -> GroupId {
        let id = GroupId::new();
        let mut group = NodeGroup::new(id);
        group.set_title(title);
        self.style.apply(&mut group);
        self.groups.insert(id, group);
        self.refresh_group(id);
        id
    }

    /// Group by id
    pub fn group(&self, id: GroupId) -> Option<&NodeGroup> {
        self.groups.get(&id)
    }

    /// All groups
    pub fn groups(&self) -> impl Iterator<Item = &NodeGroup> {
        self.groups.values()
    }

    /// Delete a group; members stay on the canvas
    pub fn delete_group(&mut self, id: GroupId) -> Result<(), SceneError> {
        self.groups.shift_remove(&id).ok_or(SceneError::GroupNotFound(id))?;
        self.interaction.forget_group(id);
        Ok(())
    }

    /// Add a node to a group and refresh the frame
    pub fn add_node_to_group(&mut self, group: GroupId, node: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&node) {
            return Err(SceneError::NodeNotFound(node));
        }
        let g = self.groups.get_mut(&group).ok_or(SceneError::GroupNotFound(group))?;
        if g.add_member(node) {
            self.refresh_group(group);
        }
        Ok(())
    }

    /// Remove a node from a group and refresh the frame
    pub fn remove_node_from_group(&mut self, group: GroupId, node: NodeId) -> Result<(), SceneError> {
        let g = self.groups.get_mut(&group).ok_or(SceneError::GroupNotFound(group))?;
        if g.remove_member(node) {
            self.refresh_group(group);
        }
        Ok(())
    }

    /// Change a group's title or look, then refresh the frame
    pub fn update_group<R>(&mut self, id: GroupId, f: impl FnOnce(&mut NodeGroup) -> R) -> Result<R, SceneError> {
        let group = self.groups.get_mut(&id).ok_or(SceneError::GroupNotFound(id))?;
        let name = group.name().to_string();
        let result = f(group);
        if group.name() != name {
            self.style.apply(group);
        }
        self.refresh_group(id);
        Ok(result)
    }

    /// Move a group; every member moves by the same delta
    pub fn set_group_position(&mut self, id: GroupId, pos: Pos2) -> Result<(), SceneError> {
        let group = self.groups.get_mut(&id).ok_or(SceneError::GroupNotFound(id))?;
        let delta = group.set_pos(pos);
        let members = group.members().to_vec();
        for member in members {
            if let Some(node) = self.nodes.get_mut(&member) {
                node.set_pos(node.pos() + delta);
                self.reroute_node(member);
                self.emit(SceneEvent::ItemUpdated(member));
            }
        }
        self.refresh_group(id);
        Ok(())
    }

    fn refresh_group(&mut self, id: GroupId) {
        let Some(group) = self.groups.get(&id) else {
            return;
        };
        let bounds: Vec<Rect> = group
            .members()
            .iter()
            .filter_map(|m| self.nodes.get(m))
            .map(SceneItem::bounding_rect)
            .collect();
        if let Some(group) = self.groups.get_mut(&id) {
            group.update_area(&bounds);
        }
        self.emit(SceneEvent::GroupUpdated(id));
    }

    // ---- style ---------------------------------------------------------

    /// Current style sheet
    pub fn style_sheet(&self) -> &StyleSheet {
        &self.style
    }

    /// Replace the style sheet and restyle every item
    pub fn set_style_sheet(&mut self, sheet: StyleSheet) {
        self.style = sheet;
        let mut written = 0;
        for node in self.nodes.values_mut() {
            written += restyle_node(&self.style, node);
        }
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.reroute_node(id);
        }
        for connection in self.connections.values_mut() {
            written += self.style.apply(connection);
            connection.recalculate();
        }
        let groups: Vec<GroupId> = self.groups.keys().copied().collect();
        for id in groups {
            if let Some(group) = self.groups.get_mut(&id) {
                written += self.style.apply(group);
            }
            self.refresh_group(id);
        }
        tracing::info!("Style sheet applied, {} properties written", written);
    }

    // ---- zoom ----------------------------------------------------------

    /// Set the zoom factor; out-of-range values are ignored
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        let changed = self.view.set_zoom(zoom);
        if changed {
            self.emit(SceneEvent::ZoomChanged(self.view.zoom()));
        }
        changed
    }

    /// Multiply the zoom about the viewport centre
    pub fn zoom_by(&mut self, factor: f32) -> bool {
        let center = self.view.viewport().center();
        let changed = self.view.zoom_about(factor, center);
        if changed {
            self.emit(SceneEvent::ZoomChanged(self.view.zoom()));
        }
        changed
    }

    /// Union of all node bounds
    pub fn items_bounding_rect(&self) -> Rect {
        self.nodes
            .values()
            .map(SceneItem::bounding_rect)
            .fold(Rect::NOTHING, Rect::union)
    }

    /// Fit all nodes into the viewport
    pub fn zoom_to_items(&mut self) -> bool {
        let rect = self.items_bounding_rect();
        let changed = self.view.zoom_to_fit(rect);
        if changed {
            self.emit(SceneEvent::ZoomChanged(self.view.zoom()));
        }
        changed
    }

    /// Fit the whole scene extent into the viewport
    pub fn zoom_to_scene_rect(&mut self) -> bool {
        let rect = self.config.scene_rect();
        let changed = self.view.zoom_to_fit(rect);
        if changed {
            self.emit(SceneEvent::ZoomChanged(self.view.zoom()));
        }
        changed
    }

    // ---- hit-testing and painting --------------------------------------

    fn nodes_top_down(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by_key(|n| std::cmp::Reverse(n.z_value()));
        nodes
    }

    /// Socket whose shape contains `pos`, topmost node first
    pub fn socket_at(&self, pos: Pos2) -> Option<SocketId> {
        self.nodes_top_down().into_iter().find_map(|node| {
            node.placed_sockets()
                .find(|p| p.socket.is_valid() && p.contains(pos))
                .map(|p| p.socket.id())
        })
    }

    /// Topmost node whose body contains `pos`
    pub fn node_at(&self, pos: Pos2) -> Option<NodeId> {
        match self.item_at(pos) {
            Some(SceneHit::Node(id)) => Some(id),
            Some(SceneHit::Socket(id)) => Some(id.node),
            _ => None,
        }
    }

    /// Topmost item under `pos`
    pub fn item_at(&self, pos: Pos2) -> Option<SceneHit> {
        for node in self.nodes_top_down() {
            if let Some(p) = node.placed_sockets().find(|p| p.socket.is_valid() && p.contains(pos)) {
                return Some(SceneHit::Socket(p.socket.id()));
            }
            if node.contains(pos) {
                return Some(SceneHit::Node(node.id()));
            }
        }
        let mut connections: Vec<&Connection> = self.connections.values().collect();
        connections.sort_by_key(|c| std::cmp::Reverse(c.z_value()));
        if let Some(c) = connections.into_iter().find(|c| c.contains(pos)) {
            return Some(SceneHit::Connection(c.id()));
        }
        self.groups
            .values()
            .find(|g| g.contains(pos))
            .map(|g| SceneHit::Group(g.id()))
    }

    /// Paint every item in ascending z order
    pub fn paint(&self, surface: &mut dyn PaintSurface) {
        let mut items: Vec<&dyn SceneItem> = Vec::with_capacity(
            self.groups.len() + self.connections.len() + self.nodes.len(),
        );
        items.extend(self.groups.values().map(|g| g as &dyn SceneItem));
        items.extend(self.connections.values().map(|c| c as &dyn SceneItem));
        items.extend(self.nodes.values().map(|n| n as &dyn SceneItem));
        items.sort_by_key(|item| item.z_value());
        for item in items {
            item.paint(surface);
        }
        if let Some(temp) = self.interaction.temp_connection() {
            temp.paint(surface);
        }
    }

    /// Advance hover animations; returns whether any is still running
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        let mut running = false;
        for node in self.nodes.values_mut() {
            for socket in node.sockets_mut() {
                running |= socket.animation.tick(dt_ms);
            }
        }
        for connection in self.connections.values_mut() {
            running |= connection.animation.tick(dt_ms);
        }
        running
    }
}

/// Apply the sheet to a node and its sockets inside one layout pass
fn restyle_node(sheet: &StyleSheet, node: &mut Node) -> usize {
    if sheet.is_empty() {
        return 0;
    }
    node.begin_modify_node();
    let mut written = sheet.apply(node);
    for socket in node.sockets_mut() {
        written += sheet.apply(socket);
    }
    node.end_modify_node();
    written
}

fn socket_location(nodes: &IndexMap<NodeId, Node>, id: SocketId) -> Option<Pos2> {
    nodes.get(&id.node)?.socket_location(id)
}

/// Start and end of a connection; a missing socket falls back to the drag point
fn endpoints(nodes: &IndexMap<NodeId, Node>, connection: &Connection) -> (Pos2, Pos2) {
    let locate = |socket: Option<SocketId>| {
        socket
            .and_then(|s| socket_location(nodes, s))
            .unwrap_or(connection.drag_point())
    };
    (locate(connection.source()), locate(connection.destination()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::RecordingSurface;
    use crate::style::PropertyValue;
    use proptest::prelude::*;

    pub(super) fn scene() -> Scene {
        Scene::with_z_order(ZOrderService::new())
    }

    fn input(scene: &Scene, node: NodeId, index: usize) -> SocketId {
        scene.node(node).expect("node").input_socket(index).expect("input").id()
    }

    fn output(scene: &Scene, node: NodeId, index: usize) -> SocketId {
        scene.node(node).expect("node").output_socket(index).expect("output").id()
    }

    fn assert_consistent(scene: &Scene) {
        for connection in scene.connections() {
            assert!(connection.is_attached(), "connection without endpoints");
            for sid in [connection.source(), connection.destination()].into_iter().flatten() {
                let socket = scene.socket(sid).expect("endpoint socket exists");
                assert!(socket.connections().contains(&connection.id()));
            }
        }
        for node in scene.nodes() {
            for socket in node.sockets() {
                if !socket.multiple_connections() {
                    assert!(socket.connection_count() <= 1);
                }
                for cid in socket.connections() {
                    assert!(scene.connection(*cid).is_some(), "dangling back-reference");
                }
            }
        }
    }

    #[test]
    fn test_create_node_populates_sockets() {
        let mut scene = scene();
        scene.set_creation_point(Pos2::new(40.0, 60.0));
        let id = scene.create_node(2, 1, "adder");
        let node = scene.node(id).expect("node");
        assert_eq!(node.input_socket_count(), 2);
        assert_eq!(node.output_socket_count(), 1);
        assert_eq!(node.name(), "adder");
        assert_eq!(node.pos(), Pos2::new(40.0, 60.0));
        assert_eq!(scene.drain_events(), vec![SceneEvent::NodeAdded(id)]);
    }

    #[test]
    fn test_connection_joins_sockets() {
        let mut scene = scene();
        let a = scene.create_node(0, 1, "");
        let b = scene.create_node(1, 0, "");
        scene.set_node_position(b, Pos2::new(300.0, 0.0)).expect("move");

        let id = scene
            .create_connection(input(&scene, b, 0), output(&scene, a, 0))
            .expect("connect");
        let connection = scene.connection(id).expect("connection");
        assert_eq!(connection.source(), Some(output(&scene, a, 0)));
        assert_eq!(connection.destination(), Some(input(&scene, b, 0)));
        assert_eq!(Some(connection.start()), scene.socket_location(output(&scene, a, 0)));
        assert_eq!(Some(connection.end()), scene.socket_location(input(&scene, b, 0)));
        assert_consistent(&scene);
    }

    #[test]
    fn test_connections_follow_moved_node() {
        let mut scene = scene();
        let a = scene.create_node(0, 1, "");
        let b = scene.create_node(1, 0, "");
        let id = scene
            .create_connection(output(&scene, a, 0), input(&scene, b, 0))
            .expect("connect");
        scene.set_node_position(b, Pos2::new(250.0, 80.0)).expect("move");
        let end = scene.connection(id).expect("connection").end();
        assert_eq!(Some(end), scene.socket_location(input(&scene, b, 0)));
    }

    #[test]
    fn test_incompatible_connections_are_rejected() {
        let mut scene = scene();
        let a = scene.create_node(1, 1, "");
        let b = scene.create_node(1, 1, "");
        assert_eq!(
            scene.create_connection(input(&scene, a, 0), input(&scene, b, 0)),
            Err(ConnectionError::SameDirection)
        );
        assert_eq!(
            scene.create_connection(output(&scene, a, 0), input(&scene, a, 0)),
            Err(ConnectionError::SameNode(a))
        );
        assert_eq!(
            scene.create_connection(Socket::invalid().id(), input(&scene, a, 0)),
            Err(ConnectionError::InvalidSocket)
        );
        assert_eq!(scene.connection_count(), 0);
    }

    #[test]
    fn test_single_connection_socket_displaces_old() {
        let mut scene = scene();
        let a = scene.create_node(0, 1, "");
        let b = scene.create_node(0, 1, "");
        let c = scene.create_node(1, 0, "");
        let first = scene
            .create_connection(output(&scene, a, 0), input(&scene, c, 0))
            .expect("connect");
        let second = scene
            .create_connection(output(&scene, b, 0), input(&scene, c, 0))
            .expect("connect");
        assert!(scene.connection(first).is_none());
        assert!(scene.connection(second).is_some());
        assert_eq!(scene.socket(output(&scene, a, 0)).expect("socket").connection_count(), 0);
        assert_consistent(&scene);
    }

    #[test]
    fn test_cascade_deletion() {
        let mut scene = scene();
        let doomed = scene.create_node(2, 1, "");
        let other = scene.create_node(1, 0, "");
        scene
            .create_connection(output(&scene, doomed, 0), input(&scene, other, 0))
            .expect("connect");
        scene.drain_events();

        scene.delete_node(doomed).expect("delete");
        assert_eq!(scene.connection_count(), 0);
        assert_eq!(scene.socket(input(&scene, other, 0)).expect("socket").connection_count(), 0);
        let events = scene.drain_events();
        assert!(matches!(events[0], SceneEvent::ConnectionDeleted(_)));
        assert_eq!(events.last(), Some(&SceneEvent::NodeDeleted(doomed)));
        assert_eq!(scene.delete_node(doomed), Err(SceneError::NodeNotFound(doomed)));
    }

    #[test]
    fn test_delete_socket_by_index() {
        let mut scene = scene();
        let a = scene.create_node(0, 1, "");
        let b = scene.create_node(2, 0, "");
        scene
            .create_connection(output(&scene, a, 0), input(&scene, b, 1))
            .expect("connect");
        assert_eq!(
            scene.delete_input_socket(b, 5),
            Err(SceneError::SocketIndexOutOfRange { index: 5, len: 2 })
        );
        scene.delete_input_socket(b, 1).expect("delete");
        assert_eq!(scene.node(b).expect("node").input_socket_count(), 1);
        assert_eq!(scene.connection_count(), 0);
        assert_consistent(&scene);
    }

    #[test]
    fn test_disable_multiple_connections_clears_socket() {
        let mut scene = scene();
        let hub = scene.create_node(0, 1, "");
        let a = scene.create_node(1, 0, "");
        let b = scene.create_node(1, 0, "");
        let out = output(&scene, hub, 0);
        scene.create_connection(out, input(&scene, a, 0)).expect("connect");
        scene.create_connection(out, input(&scene, b, 0)).expect("connect");
        scene.set_multiple_connections(out, false).expect("set");
        assert_eq!(scene.connection_count(), 0);
        assert_consistent(&scene);
    }

    #[test]
    fn test_connected_node_queries() {
        let mut scene = scene();
        let a = scene.create_node(0, 1, "");
        let b = scene.create_node(2, 0, "");
        let c = scene.create_node(1, 0, "");
        scene.create_connection(output(&scene, a, 0), input(&scene, b, 1)).expect("connect");

        assert_eq!(scene.connected_nodes_to_input_socket(b, 1), Ok(vec![(a, 0)]));
        assert_eq!(scene.connected_nodes_to_output_socket(a, 0), Ok(vec![(b, 1)]));
        assert!(scene.is_node_connected(a, b));
        assert!(scene.is_node_connected(b, a));
        assert!(scene.is_node_connected_to_input(b, a));
        assert!(!scene.is_node_connected_to_output(b, a));
        assert!(!scene.is_node_connected(a, c));
        assert!(scene.connected_nodes_to_input_socket(b, 2).is_err());
    }

    #[test]
    fn test_selection_bumps_z_and_reports() {
        let mut scene = scene();
        let a = scene.create_node(0, 1, "");
        let b = scene.create_node(1, 0, "");
        let before = scene.node(a).expect("node").z_value();
        scene.drain_events();

        scene.select_node(a, false).expect("select");
        assert!(scene.node(a).expect("node").z_value() > before);
        assert_eq!(scene.selected_nodes(), vec![a]);
        scene.select_node(b, true).expect("select");
        assert_eq!(scene.selection_count(), 2);
        scene.clear_selection();
        assert_eq!(scene.selection_count(), 0);

        let c = scene
            .create_connection(output(&scene, a, 0), input(&scene, b, 0))
            .expect("connect");
        scene.drain_events();
        scene.select_connection(c, false).expect("select");
        assert_eq!(
            scene.drain_events(),
            vec![SceneEvent::ConnectionSelected(c), SceneEvent::SelectionChanged]
        );
        assert_eq!(scene.delete_selected_connections(), 1);
        assert_eq!(scene.connection_count(), 0);
    }

    #[test]
    fn test_snap_to_grid() {
        let mut scene = scene();
        scene.set_snap_to_grid(false);
        scene.set_grid_size(20.0);
        let id = scene.create_node(0, 0, "");
        scene.set_node_position(id, Pos2::new(23.0, 37.0)).expect("move");
        assert_eq!(scene.node(id).expect("node").pos(), Pos2::new(23.0, 37.0));
        scene.set_snap_to_grid(true);
        assert_eq!(scene.node(id).expect("node").pos(), Pos2::new(20.0, 40.0));
    }

    #[test]
    fn test_group_rigidity() {
        let mut scene = scene();
        let a = scene.create_node(0, 0, "");
        let b = scene.create_node(0, 0, "");
        scene.set_node_position(a, Pos2::new(10.0, 10.0)).expect("move");
        scene.set_node_position(b, Pos2::new(50.0, 50.0)).expect("move");
        let group = scene.create_group("Pair");
        scene.add_node_to_group(group, a).expect("add");
        scene.add_node_to_group(group, b).expect("add");
        let frame = scene.group(group).expect("group").bounding_rect();

        scene.set_group_position(group, Pos2::new(5.0, 5.0)).expect("move");
        assert_eq!(scene.node(a).expect("node").pos(), Pos2::new(15.0, 15.0));
        assert_eq!(scene.node(b).expect("node").pos(), Pos2::new(55.0, 55.0));
        let moved = scene.group(group).expect("group").bounding_rect();
        assert_eq!(moved.min, frame.min + egui::Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_group_tracks_member_changes() {
        let mut scene = scene();
        let a = scene.create_node(0, 0, "");
        let group = scene.create_group("");
        scene.add_node_to_group(group, a).expect("add");
        let before = scene.group(group).expect("group").main_rect();
        scene.set_node_position(a, Pos2::new(200.0, 0.0)).expect("move");
        let after = scene.group(group).expect("group").main_rect();
        assert_eq!(after.min.x - before.min.x, 200.0);

        scene.delete_node(a).expect("delete");
        assert_eq!(scene.group(group).expect("group").member_count(), 0);
    }

    #[test]
    fn test_delete_all_resets_z() {
        let mut scene = scene();
        for _ in 0..3 {
            scene.create_node(1, 1, "");
        }
        scene.delete_all_nodes();
        assert_eq!(scene.node_count(), 0);
        let id = scene.create_node(0, 0, "");
        assert_eq!(scene.node(id).expect("node").z_value(), 1);
    }

    #[test]
    fn test_style_sheet_applies_by_type_and_name() {
        let mut scene = scene();
        let plain = scene.create_node(1, 0, "");
        let named = scene.create_node(1, 0, "special");
        let sheet = StyleSheet::new()
            .with("Node", "minimum_width", PropertyValue::Float(220.0))
            .with("Node#special", "minimum_width", PropertyValue::Float(300.0))
            .with("Socket", "shape_size", PropertyValue::Float(30.0));
        scene.set_style_sheet(sheet);

        // The title bar pads the minimum width by pen width + 3 on each side
        let width = |scene: &Scene, id: NodeId| {
            let node = scene.node(id).expect("node");
            node.polygon().width() - 2.0 * (node.outline_pen().width + 3.0)
        };
        assert_eq!(width(&scene, plain), 220.0);
        assert_eq!(width(&scene, named), 300.0);
        assert_eq!(scene.node(plain).expect("node").polygon().width(), 232.0);
        assert_eq!(scene.socket(input(&scene, plain, 0)).expect("socket").shape_size(), 30.0);

        let later = scene.create_node(1, 0, "");
        assert_eq!(width(&scene, later), 220.0);
        scene.update_node(later, |n| n.set_name("special")).expect("rename");
        assert_eq!(width(&scene, later), 300.0);
    }

    #[test]
    fn test_socket_rename_through_node_restyles() {
        let mut scene = scene();
        let id = scene.create_node(1, 1, "");
        scene.set_style_sheet(StyleSheet::new().with("Socket#big", "shape_size", PropertyValue::Float(32.0)));

        scene
            .update_node(id, |n| n.update_input_socket(0, |s| s.set_name("big")))
            .expect("node")
            .expect("socket");
        assert_eq!(scene.socket(input(&scene, id, 0)).expect("socket").shape_size(), 32.0);
        assert_eq!(scene.socket(output(&scene, id, 0)).expect("socket").shape_size(), 20.0);

        let out = output(&scene, id, 0);
        scene.update_socket(out, |s| s.set_name("big")).expect("socket");
        assert_eq!(scene.socket(out).expect("socket").shape_size(), 32.0);
    }

    #[test]
    fn test_add_node_drops_foreign_connections() {
        let mut first = scene();
        let a = first.create_node(0, 1, "");
        let b = first.create_node(1, 0, "");
        first.create_connection(output(&first, a, 0), input(&first, b, 0)).expect("connect");
        let copy = first.node(a).expect("node").clone();
        assert_eq!(copy.output_socket(0).expect("socket").connection_count(), 1);

        let mut second = scene();
        assert_eq!(second.add_node(copy.clone()), Ok(a));
        assert_eq!(second.socket(output(&second, a, 0)).expect("socket").connection_count(), 0);
        assert_eq!(second.node_count(), 1);
        assert_consistent(&second);

        second.drain_events();
        assert_eq!(second.add_node(copy.clone()), Err(SceneError::DuplicateNode(a)));
        assert!(second.drain_events().is_empty());

        assert_eq!(first.add_node(copy), Err(SceneError::DuplicateNode(a)));
        assert_eq!(first.node_count(), 2);
        assert_eq!(first.connection_count(), 1);
        assert_consistent(&first);
    }

    #[test]
    fn test_mesh_counts() {
        let mut scene = scene();
        let leaves: Vec<NodeId> = (0..5).map(|_| scene.create_node(1, 0, "")).collect();
        for leaf in &leaves {
            let sid = input(&scene, *leaf, 0);
            scene.set_multiple_connections(sid, true).expect("multi");
        }
        for _ in 0..3 {
            let hub = scene.create_node(0, 1, "test");
            let out = output(&scene, hub, 0);
            for leaf in &leaves {
                scene.create_connection(out, input(&scene, *leaf, 0)).expect("connect");
            }
        }
        assert_eq!(scene.connection_count(), 15);
        for leaf in &leaves {
            assert_eq!(scene.socket(input(&scene, *leaf, 0)).expect("socket").connection_count(), 3);
        }
        assert_consistent(&scene);
    }

    #[test]
    fn test_item_at_prefers_sockets_then_nodes() {
        let mut scene = scene();
        let id = scene.create_node(1, 0, "");
        let socket = input(&scene, id, 0);
        let at = scene.socket_location(socket).expect("location");
        assert_eq!(scene.item_at(at), Some(SceneHit::Socket(socket)));
        let body = scene.node(id).expect("node").bounding_rect().center();
        assert_eq!(scene.item_at(body), Some(SceneHit::Node(id)));
        assert_eq!(scene.item_at(Pos2::new(5000.0, 5000.0)), None);
    }

    #[test]
    fn test_paint_in_z_order() {
        let mut scene = scene();
        let a = scene.create_node(0, 1, "");
        let b = scene.create_node(1, 0, "");
        scene.update_node(a, |n| n.set_title("First")).expect("title");
        scene.update_node(b, |n| n.set_title("Second")).expect("title");
        scene.select_node(a, false).expect("select");
        let mut surface = RecordingSurface::new();
        scene.paint(&mut surface);
        let texts = surface.texts();
        let first = texts.iter().position(|t| *t == "First").expect("first");
        let second = texts.iter().position(|t| *t == "Second").expect("second");
        assert!(second < first);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Connect(usize, bool, usize, bool),
        Multi(usize, bool, bool),
        DeleteNode(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, any::<bool>(), 0..4usize, any::<bool>()).prop_map(|(a, ao, b, bo)| Op::Connect(a, ao, b, bo)),
            (0..4usize, any::<bool>(), any::<bool>()).prop_map(|(n, o, m)| Op::Multi(n, o, m)),
            (0..4usize).prop_map(Op::DeleteNode),
        ]
    }

    proptest! {
        #[test]
        fn prop_registry_stays_consistent(ops in proptest::collection::vec(op(), 1..40)) {
            let mut scene = scene();
            let nodes: Vec<NodeId> = (0..4).map(|_| scene.create_node(1, 1, "")).collect();
            let pick = |scene: &Scene, n: usize, out: bool| {
                let node = scene.node(nodes[n])?;
                let socket = if out { node.output_socket(0) } else { node.input_socket(0) };
                socket.ok().map(Socket::id)
            };
            for op in ops {
                match op {
                    Op::Connect(a, ao, b, bo) => {
                        if let (Some(x), Some(y)) = (pick(&scene, a, ao), pick(&scene, b, bo)) {
                            let before = scene.connection_count();
                            let result = scene.create_connection(x, y);
                            let compatible = ao != bo && a != b;
                            prop_assert_eq!(result.is_ok(), compatible);
                            if !compatible {
                                prop_assert_eq!(scene.connection_count(), before);
                            }
                        }
                    }
                    Op::Multi(n, out, multi) => {
                        if let Some(sid) = pick(&scene, n, out) {
                            scene.set_multiple_connections(sid, multi).expect("socket exists");
                        }
                    }
                    Op::DeleteNode(n) => {
                        let _ = scene.delete_node(nodes[n]);
                    }
                }
                assert_consistent(&scene);
            }
        }
    }
}
