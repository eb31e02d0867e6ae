// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer and keyboard handling for the canvas.
//!
//! Inputs arrive in screen coordinates and are mapped through the view. The
//! canvas keeps one [`DragState`] between press and release.

use super::{endpoints, Scene, SceneHit};
use crate::connection::{Connection, ConnectionId};
use crate::events::SceneEvent;
use crate::group::GroupId;
use crate::node::NodeId;
use crate::paint::SceneItem;
use crate::socket::{SocketId, SocketType};
use egui::{Key, Modifiers, PointerButton, Pos2, Rect};

/// Selection rectangle in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubberBand {
    /// Press point
    pub start: Pos2,
    /// Latest pointer point
    pub current: Pos2,
}

impl RubberBand {
    /// Normalized rectangle between the two corners
    pub fn rect(&self) -> Rect {
        Rect::from_two_pos(self.start, self.current)
    }
}

/// What the pointer is doing between press and release
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No button held
    #[default]
    Idle,
    /// Pressed on a socket that allows dragging; no movement yet
    SocketPressed(SocketId),
    /// Dragging a new connection out of a socket
    NewConnection(SocketId),
    /// Pressed on an existing connection
    Connection {
        /// Connection under the press
        id: ConnectionId,
        /// Press point in screen coordinates
        press_screen: Pos2,
        /// Whether one end has been pulled off its socket
        detached: bool,
    },
    /// Moving the selected nodes
    Nodes {
        /// Previous pointer point in scene coordinates
        last: Pos2,
    },
    /// Moving a group
    Group {
        /// Group under the press
        id: GroupId,
        /// Previous pointer point in scene coordinates
        last: Pos2,
    },
    /// Dragging a selection rectangle
    RubberBand(RubberBand),
    /// Panning with the middle button
    Pan {
        /// Previous pointer point in screen coordinates
        last_screen: Pos2,
        /// Whether the pointer moved since the press
        moved: bool,
    },
}

/// Drag and hover bookkeeping owned by the canvas
#[derive(Debug, Default)]
pub(crate) struct Interaction {
    drag: DragState,
    temp: Option<Connection>,
    hover_socket: Option<SocketId>,
    hover_connection: Option<ConnectionId>,
}

impl Interaction {
    /// Connection following the pointer during a new-connection drag
    pub(crate) fn temp_connection(&self) -> Option<&Connection> {
        self.temp.as_ref()
    }

    pub(crate) fn forget_node(&mut self, node: NodeId) {
        if self.hover_socket.is_some_and(|s| s.node == node) {
            self.hover_socket = None;
        }
        let dragging_from = match self.drag {
            DragState::SocketPressed(s) | DragState::NewConnection(s) => s.node == node,
            _ => false,
        };
        if dragging_from {
            self.cancel();
        }
    }

    pub(crate) fn forget_socket(&mut self, socket: SocketId) {
        if self.hover_socket == Some(socket) {
            self.hover_socket = None;
        }
        if matches!(self.drag, DragState::SocketPressed(s) | DragState::NewConnection(s) if s == socket) {
            self.cancel();
        }
    }

    pub(crate) fn forget_connection(&mut self, connection: ConnectionId) {
        if self.hover_connection == Some(connection) {
            self.hover_connection = None;
        }
        if matches!(self.drag, DragState::Connection { id, .. } if id == connection) {
            self.drag = DragState::Idle;
        }
    }

    pub(crate) fn forget_group(&mut self, group: GroupId) {
        if matches!(self.drag, DragState::Group { id, .. } if id == group) {
            self.drag = DragState::Idle;
        }
    }

    fn cancel(&mut self) {
        self.temp = None;
        self.drag = DragState::Idle;
    }
}

impl Scene {
    /// Current drag state
    pub fn drag_state(&self) -> &DragState {
        &self.interaction.drag
    }

    /// Selection rectangle while one is being dragged
    pub fn rubber_band(&self) -> Option<Rect> {
        match &self.interaction.drag {
            DragState::RubberBand(band) => Some(band.rect()),
            _ => None,
        }
    }

    /// Temporary connection of a new-connection drag
    pub fn temp_connection(&self) -> Option<&Connection> {
        self.interaction.temp_connection()
    }

    /// A button went down at a screen point
    pub fn pointer_pressed(&mut self, screen: Pos2, button: PointerButton, modifiers: Modifiers) {
        match button {
            PointerButton::Primary => self.primary_pressed(screen, modifiers),
            PointerButton::Middle => {
                self.interaction.drag = DragState::Pan {
                    last_screen: screen,
                    moved: false,
                };
            }
            _ => {}
        }
    }

    fn primary_pressed(&mut self, screen: Pos2, modifiers: Modifiers) {
        let pos = self.view.screen_to_scene(screen);
        let additive = modifiers.shift || modifiers.command;
        self.interaction.drag = match self.item_at(pos) {
            Some(SceneHit::Socket(socket)) => {
                let draggable = self.socket(socket).is_some_and(|s| s.drag_enabled());
                if draggable {
                    DragState::SocketPressed(socket)
                } else {
                    DragState::Idle
                }
            }
            Some(SceneHit::Node(id)) => {
                if self.update_node(id, |n| n.click_container(pos)).unwrap_or(false) {
                    return;
                }
                let selected = self.node(id).is_some_and(|n| n.is_selected());
                let result = if additive {
                    self.set_node_selected(id, !selected)
                } else if selected {
                    Ok(())
                } else {
                    self.select_node(id, false)
                };
                if let Err(e) = result {
                    tracing::warn!("Failed to select node: {}", e);
                }
                DragState::Nodes { last: pos }
            }
            Some(SceneHit::Connection(id)) => {
                let result = if additive {
                    let selected = self.connection(id).is_some_and(Connection::is_selected);
                    self.set_connection_selected(id, !selected)
                } else {
                    self.select_connection(id, false)
                };
                if let Err(e) = result {
                    tracing::warn!("Failed to select connection: {}", e);
                }
                DragState::Connection {
                    id,
                    press_screen: screen,
                    detached: false,
                }
            }
            Some(SceneHit::Group(id)) => {
                if let Err(e) = self.select_group(id, additive) {
                    tracing::warn!("Failed to select group: {}", e);
                }
                DragState::Group { id, last: pos }
            }
            None => {
                self.set_creation_point(pos);
                if !additive {
                    self.clear_selection();
                }
                DragState::RubberBand(RubberBand {
                    start: pos,
                    current: pos,
                })
            }
        };
    }

    /// The pointer moved to a screen point
    pub fn pointer_moved(&mut self, screen: Pos2) {
        let pos = self.view.screen_to_scene(screen);
        self.update_hover(pos);

        let mut drag = std::mem::take(&mut self.interaction.drag);
        if let DragState::SocketPressed(socket) = drag {
            self.start_new_connection(socket, pos);
            drag = DragState::NewConnection(socket);
            self.interaction.drag = drag;
            return;
        }
        match &mut drag {
            DragState::Idle | DragState::SocketPressed(_) => {}
            DragState::NewConnection(_) => {
                if let Some(temp) = self.interaction.temp.as_mut() {
                    temp.set_drag_point(pos);
                    let (start, end) = endpoints(&self.nodes, temp);
                    temp.update_position(start, end);
                }
            }
            DragState::Connection {
                id,
                press_screen,
                detached,
            } => {
                if !*detached {
                    *detached = self.detach_connection(*id, screen, *press_screen, pos);
                }
                if *detached {
                    if let Some(connection) = self.connections.get_mut(&*id) {
                        connection.set_drag_point(pos);
                        let (start, end) = endpoints(&self.nodes, connection);
                        connection.update_position(start, end);
                    }
                }
            }
            DragState::Nodes { last } => {
                let delta = pos - *last;
                *last = pos;
                for id in self.selected_nodes() {
                    if let Err(e) = self.update_node(id, |n| n.set_pos(n.pos() + delta)) {
                        tracing::warn!("Failed to move node: {}", e);
                    }
                }
            }
            DragState::Group { id, last } => {
                let delta = pos - *last;
                *last = pos;
                let target = self.groups.get(&*id).map(|g| g.pos() + delta);
                if let Some(target) = target {
                    if let Err(e) = self.set_group_position(*id, target) {
                        tracing::warn!("Failed to move group: {}", e);
                    }
                }
            }
            DragState::RubberBand(band) => band.current = pos,
            DragState::Pan { last_screen, moved } => {
                let delta = screen - *last_screen;
                if delta != egui::Vec2::ZERO {
                    self.view.pan_by(delta);
                    *moved = true;
                }
                *last_screen = screen;
            }
        }
        self.interaction.drag = drag;
    }

    fn start_new_connection(&mut self, socket: SocketId, pos: Pos2) {
        let Some(socket_type) = self.socket(socket).map(|s| s.socket_type()) else {
            return;
        };
        let mut temp = Connection::new(ConnectionId::new(), self.z_order.next_connection());
        if socket_type == SocketType::Output {
            temp.set_source(Some(socket));
        } else {
            temp.set_destination(Some(socket));
        }
        temp.set_drag_point(pos);
        self.style.apply(&mut temp);
        let (start, end) = endpoints(&self.nodes, &temp);
        temp.update_position(start, end);
        self.interaction.temp = Some(temp);
        tracing::debug!("Connection drag started from {:?}", socket);
        self.emit(SceneEvent::ConnectionStarted(socket));
    }

    /// Pull the end of `id` nearest the pointer off its socket.
    ///
    /// Attached connections ignore movement shorter than their drag distance.
    fn detach_connection(&mut self, id: ConnectionId, screen: Pos2, press_screen: Pos2, pos: Pos2) -> bool {
        let Some(connection) = self.connections.get(&id) else {
            return false;
        };
        if connection.is_attached() && screen.distance(press_screen) < connection.drag_distance() {
            return false;
        }

        let others: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.is_selected() && c.id() != id)
            .map(Connection::id)
            .collect();
        for other in &others {
            if let Err(e) = self.mark_connection_selected(*other, false) {
                tracing::warn!("Failed to deselect connection: {}", e);
            }
        }
        if !others.is_empty() {
            self.notify_selection();
        }

        let Some(connection) = self.connections.get_mut(&id) else {
            return false;
        };
        let pull_end = pos.distance(connection.start()) > pos.distance(connection.end());
        let released = if pull_end {
            let socket = connection.destination();
            connection.set_destination(None);
            socket
        } else {
            let socket = connection.source();
            connection.set_source(None);
            socket
        };
        connection.set_drag_point(pos);
        if let Some(sid) = released {
            if let Some(socket) = self.nodes.get_mut(&sid.node).and_then(|n| n.socket_mut(sid)) {
                socket.remove_connection(id);
            }
        }
        true
    }

    /// A button was released at a screen point
    pub fn pointer_released(&mut self, screen: Pos2, button: PointerButton) {
        let pos = self.view.screen_to_scene(screen);
        let drag = std::mem::take(&mut self.interaction.drag);
        match (button, drag) {
            (PointerButton::Primary, DragState::NewConnection(from)) => {
                self.interaction.temp = None;
                self.finish_new_connection(from, pos);
            }
            (PointerButton::Primary, DragState::Connection { id, detached: true, .. }) => {
                self.finish_connection_drag(id, pos);
            }
            (PointerButton::Primary, DragState::Nodes { .. }) => {
                for id in self.selected_nodes() {
                    if let Err(e) = self.snap_node(id) {
                        tracing::warn!("Failed to snap node: {}", e);
                    }
                }
            }
            (PointerButton::Primary, DragState::Group { id, .. }) => {
                let members = self.groups.get(&id).map(|g| g.members().to_vec()).unwrap_or_default();
                for member in members {
                    if let Err(e) = self.snap_node(member) {
                        tracing::warn!("Failed to snap node: {}", e);
                    }
                }
            }
            (PointerButton::Primary, DragState::RubberBand(band)) => {
                self.select_in_rect(band.rect());
            }
            (PointerButton::Middle, DragState::Pan { moved: false, .. }) => {
                self.zoom_to_items();
            }
            (PointerButton::Middle, DragState::Pan { .. }) => {}
            (_, drag) => {
                // Release of another button leaves the drag running
                if button != PointerButton::Primary {
                    self.interaction.drag = drag;
                }
            }
        }
    }

    fn finish_new_connection(&mut self, from: SocketId, pos: Pos2) {
        let Some(from_type) = self.socket(from).map(|s| s.socket_type()) else {
            return;
        };
        let target = self
            .socket_at(pos)
            .filter(|t| *t != from)
            .filter(|t| self.socket(*t).is_some_and(|s| s.socket_type() != from_type));
        match target {
            Some(target) => {
                if let Err(e) = self.create_connection(from, target) {
                    tracing::debug!("Connection drop rejected: {}", e);
                }
            }
            None => self.emit(SceneEvent::ConnectToEmpty { socket: from, pos }),
        }
    }

    fn finish_connection_drag(&mut self, id: ConnectionId, pos: Pos2) {
        let Some(remaining) = self.connections.get(&id).and_then(Connection::dangling_socket) else {
            self.destroy_connection(id);
            return;
        };
        let target = self.socket_at(pos).filter(|t| *t != remaining);
        self.destroy_connection(id);
        match target {
            Some(target) => {
                if let Err(e) = self.create_connection(remaining, target) {
                    tracing::debug!("Connection drop rejected: {}", e);
                }
            }
            None => self.emit(SceneEvent::DisconnectToEmpty { socket: remaining, pos }),
        }
    }

    fn select_in_rect(&mut self, rect: Rect) {
        let hits: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.bounding_rect().intersects(rect))
            .map(|n| n.id())
            .collect();
        let mut changed = false;
        for id in hits {
            changed |= self.mark_node_selected(id, true).unwrap_or(false);
        }
        if changed {
            self.notify_selection();
        }
    }

    fn update_hover(&mut self, pos: Pos2) {
        let hit = self.item_at(pos);

        let socket = match hit {
            Some(SceneHit::Socket(s)) => Some(s),
            _ => None,
        };
        if socket != self.interaction.hover_socket {
            if let Some(old) = self.interaction.hover_socket.take() {
                if let Some(s) = self.nodes.get_mut(&old.node).and_then(|n| n.socket_mut(old)) {
                    s.animation.hover_leave();
                }
            }
            if let Some(new) = socket {
                if let Some(s) = self.nodes.get_mut(&new.node).and_then(|n| n.socket_mut(new)) {
                    s.animation.hover_enter();
                }
            }
            self.interaction.hover_socket = socket;
        }

        let connection = match hit {
            Some(SceneHit::Connection(c)) => Some(c),
            _ => None,
        };
        if connection != self.interaction.hover_connection {
            if let Some(old) = self.interaction.hover_connection.take() {
                if let Some(c) = self.connections.get_mut(&old) {
                    c.animation.hover_leave();
                }
            }
            if let Some(new) = connection {
                let animated = self.connections.get_mut(&new).is_some_and(|c| {
                    c.animation.hover_enter();
                    c.animation.enabled
                });
                if animated {
                    self.emit(SceneEvent::ConnectionMouseOver(new));
                }
            }
            self.interaction.hover_connection = connection;
        }
    }

    /// Mouse wheel over the canvas; zooms about `anchor_screen`
    pub fn wheel(&mut self, delta: f32, anchor_screen: Pos2) -> bool {
        let factor = self.view.wheel_factor(delta);
        let changed = self.view.zoom_about(factor, anchor_screen);
        if changed {
            self.emit(SceneEvent::ZoomChanged(self.view.zoom()));
        }
        changed
    }

    /// A key went down; returns whether the canvas used it
    pub fn key_pressed(&mut self, key: Key) -> bool {
        match key {
            Key::Delete | Key::Backspace => self.delete_selected_connections() > 0,
            Key::Escape => {
                if matches!(self.interaction.drag, DragState::NewConnection(_)) {
                    self.interaction.cancel();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}
