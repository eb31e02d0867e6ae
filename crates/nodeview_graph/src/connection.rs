// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the canvas.
//!
//! A connection joins an output socket (source) to an input socket
//! (destination). While being dragged one side is empty and the drag point
//! stands in for it. Endpoint positions are pushed in by the canvas; the
//! connection only turns them into a path.

use crate::animation::HoverAnimation;
use crate::error::StyleError;
use crate::geometry::{ConnectionPath, ItemShape};
use crate::node::NodeId;
use crate::paint::{PaintSurface, SceneItem};
use crate::socket::SocketId;
use crate::style::{PropertyValue, Styleable};
use egui::{Color32, Pos2, Rect, Stroke};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// An edge between two sockets, or a socket and a drag point
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    id: ConnectionId,
    instance_name: String,
    source: Option<SocketId>,
    destination: Option<SocketId>,
    drag_point: Pos2,
    start: Pos2,
    end: Pos2,
    path: ConnectionPath,
    computed: bool,
    force_recalc: bool,
    curvature: f32,
    arrow_size: f32,
    arrow_position: f32,
    pen: Stroke,
    brush: Color32,
    selected_pen: Stroke,
    selected_brush: Color32,
    drag_distance: f32,
    z: i32,
    selected: bool,
    /// Hover highlight of the pen and brush
    pub animation: HoverAnimation,
}

impl Connection {
    /// An unattached connection with the default look
    pub fn new(id: ConnectionId, z: i32) -> Self {
        Self {
            id,
            instance_name: String::new(),
            source: None,
            destination: None,
            drag_point: Pos2::ZERO,
            start: Pos2::ZERO,
            end: Pos2::ZERO,
            path: ConnectionPath::new(Pos2::ZERO, Pos2::ZERO, 0.0),
            computed: false,
            force_recalc: false,
            curvature: 0.5,
            arrow_size: 15.0,
            arrow_position: 0.5,
            pen: Stroke::new(3.0, Color32::DARK_GRAY),
            brush: Color32::DARK_GRAY,
            selected_pen: Stroke::new(3.0, Color32::WHITE),
            selected_brush: Color32::WHITE,
            drag_distance: 20.0,
            z,
            selected: false,
            animation: HoverAnimation::default(),
        }
    }

    /// Connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Output-side socket
    pub fn source(&self) -> Option<SocketId> {
        self.source
    }

    /// Input-side socket
    pub fn destination(&self) -> Option<SocketId> {
        self.destination
    }

    pub(crate) fn set_source(&mut self, socket: Option<SocketId>) {
        self.source = socket;
        self.force_recalc = true;
    }

    pub(crate) fn set_destination(&mut self, socket: Option<SocketId>) {
        self.destination = socket;
        self.force_recalc = true;
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node: NodeId) -> bool {
        self.source.is_some_and(|s| s.node == node) || self.destination.is_some_and(|s| s.node == node)
    }

    /// Check if this connection involves a specific socket
    pub fn involves_socket(&self, socket: SocketId) -> bool {
        self.source == Some(socket) || self.destination == Some(socket)
    }

    /// Whether both endpoints are sockets
    pub fn is_attached(&self) -> bool {
        self.source.is_some() && self.destination.is_some()
    }

    /// Whether neither endpoint is a socket
    pub fn is_orphaned(&self) -> bool {
        self.source.is_none() && self.destination.is_none()
    }

    /// The socket end, when exactly one endpoint is attached
    pub fn dangling_socket(&self) -> Option<SocketId> {
        match (self.source, self.destination) {
            (Some(s), None) | (None, Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Scene point used in place of a missing endpoint
    pub fn drag_point(&self) -> Pos2 {
        self.drag_point
    }

    pub(crate) fn set_drag_point(&mut self, point: Pos2) {
        self.drag_point = point;
    }

    /// Start of the path as last computed
    pub fn start(&self) -> Pos2 {
        self.start
    }

    /// End of the path as last computed
    pub fn end(&self) -> Pos2 {
        self.end
    }

    /// Current path
    pub fn path(&self) -> &ConnectionPath {
        &self.path
    }

    /// Recompute the path between `start` and `end`.
    ///
    /// Skipped when both points equal the previous ones and no setter has
    /// forced a recalculation. Returns whether the path was rebuilt.
    pub fn update_position(&mut self, start: Pos2, end: Pos2) -> bool {
        if self.computed && !self.force_recalc && start == self.start && end == self.end {
            return false;
        }
        self.start = start;
        self.end = end;
        self.path = ConnectionPath::new(start, end, self.curvature).with_arrow(self.arrow_position, self.arrow_size);
        self.computed = true;
        self.force_recalc = false;
        tracing::trace!("Connection {:?} rerouted", self.id);
        true
    }

    /// Recompute using the last known endpoints
    pub fn recalculate(&mut self) {
        self.force_recalc = true;
        self.update_position(self.start, self.end);
    }

    /// Point at fraction `t` of the path length
    pub fn point_at_percent(&self, t: f32) -> Pos2 {
        self.path.point_at_percent(t)
    }

    /// Path length
    pub fn length(&self) -> f32 {
        self.path.length()
    }

    /// Bezier curvature factor
    pub fn curvature(&self) -> f32 {
        self.curvature
    }

    /// Set the curvature; zero draws a straight line
    pub fn set_curvature(&mut self, curvature: f32) {
        self.curvature = curvature;
        self.recalculate();
    }

    /// Arrowhead size
    pub fn arrow_size(&self) -> f32 {
        self.arrow_size
    }

    /// Set the arrowhead size; zero hides it
    pub fn set_arrow_size(&mut self, size: f32) {
        self.arrow_size = size;
        self.recalculate();
    }

    /// Arrowhead position as a fraction of the path length
    pub fn arrow_position_percent(&self) -> f32 {
        self.arrow_position
    }

    /// Set the arrowhead position, clamped to `[0, 1]`
    pub fn set_arrow_position_percent(&mut self, percent: f32) {
        self.arrow_position = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 1.0) };
        self.recalculate();
    }

    /// Line stroke
    pub fn pen(&self) -> Stroke {
        self.pen
    }

    /// Set the line stroke
    pub fn set_pen(&mut self, pen: Stroke) {
        self.pen = pen;
    }

    /// Arrowhead fill
    pub fn brush(&self) -> Color32 {
        self.brush
    }

    /// Set the arrowhead fill
    pub fn set_brush(&mut self, brush: Color32) {
        self.brush = brush;
    }

    /// Set pen and brush colour together
    pub fn set_color(&mut self, color: Color32) {
        self.pen.color = color;
        self.brush = color;
    }

    /// Line stroke while selected
    pub fn selected_pen(&self) -> Stroke {
        self.selected_pen
    }

    /// Set the selected line stroke
    pub fn set_selected_pen(&mut self, pen: Stroke) {
        self.selected_pen = pen;
    }

    /// Arrowhead fill while selected
    pub fn selected_brush(&self) -> Color32 {
        self.selected_brush
    }

    /// Set the selected arrowhead fill
    pub fn set_selected_brush(&mut self, brush: Color32) {
        self.selected_brush = brush;
    }

    /// Set selected pen and brush colour together
    pub fn set_selected_color(&mut self, color: Color32) {
        self.selected_pen.color = color;
        self.selected_brush = color;
    }

    /// Screen distance the pointer must travel before an end detaches
    pub fn drag_distance(&self) -> f32 {
        self.drag_distance
    }

    /// Set the detach threshold
    pub fn set_drag_distance(&mut self, distance: f32) {
        self.drag_distance = distance.max(0.0);
    }

    /// Whether the connection is selected
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_z_value(&mut self, z: i32) {
        self.z = z;
    }

    /// Instance name used in style keys
    pub fn name(&self) -> &str {
        &self.instance_name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.instance_name = name.into();
    }

    fn current_pen(&self) -> Stroke {
        let pen = if self.selected { self.selected_pen } else { self.pen };
        Stroke::new(pen.width, self.animation.color(pen.color))
    }

    fn current_brush(&self) -> Color32 {
        let brush = if self.selected { self.selected_brush } else { self.brush };
        self.animation.color(brush)
    }
}

impl SceneItem for Connection {
    fn bounding_rect(&self) -> Rect {
        self.path.bounds().expand(self.pen.width * 1.5)
    }

    fn shape(&self) -> ItemShape {
        let stroke = ItemShape::Stroke {
            points: self.path.points().to_vec(),
            width: self.pen.width * 3.0,
        };
        match self.path.arrow {
            Some(arrow) => ItemShape::Union(vec![stroke, ItemShape::Polygon(arrow.to_vec())]),
            None => stroke,
        }
    }

    fn z_value(&self) -> i32 {
        self.z
    }

    fn paint(&self, surface: &mut dyn PaintSurface) {
        surface.polyline(self.path.points(), self.current_pen());
        if let Some(arrow) = &self.path.arrow {
            surface.polygon(arrow, self.current_brush(), self.current_pen());
        }
    }
}

impl Styleable for Connection {
    fn type_name(&self) -> &'static str {
        "Connection"
    }

    fn instance_name(&self) -> &str {
        &self.instance_name
    }

    fn property_names(&self) -> &'static [&'static str] {
        &[
            "pen",
            "brush",
            "selected_pen",
            "selected_brush",
            "arrow_size",
            "arrow_position",
            "curvature",
            "drag_distance",
            "animation_enabled",
            "animation_duration",
            "animation_lightness",
        ]
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        Some(match name {
            "pen" => PropertyValue::Stroke(self.pen),
            "brush" => PropertyValue::Color(self.brush),
            "selected_pen" => PropertyValue::Stroke(self.selected_pen),
            "selected_brush" => PropertyValue::Color(self.selected_brush),
            "arrow_size" => PropertyValue::Float(self.arrow_size),
            "arrow_position" => PropertyValue::Float(self.arrow_position),
            "curvature" => PropertyValue::Float(self.curvature),
            "drag_distance" => PropertyValue::Float(self.drag_distance),
            "animation_enabled" => PropertyValue::Bool(self.animation.enabled),
            "animation_duration" => PropertyValue::Int(i64::from(self.animation.duration_ms)),
            "animation_lightness" => PropertyValue::Int(i64::from(self.animation.lightness)),
            _ => return None,
        })
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), StyleError> {
        match name {
            "pen" => self.set_pen(value.as_stroke(name)?),
            "brush" => self.set_brush(value.as_color(name)?),
            "selected_pen" => self.set_selected_pen(value.as_stroke(name)?),
            "selected_brush" => self.set_selected_brush(value.as_color(name)?),
            "arrow_size" => self.set_arrow_size(value.as_f32(name)?),
            "arrow_position" => self.set_arrow_position_percent(value.as_f32(name)?),
            "curvature" => self.set_curvature(value.as_f32(name)?),
            "drag_distance" => self.set_drag_distance(value.as_f32(name)?),
            "animation_enabled" => self.animation.enabled = value.as_bool(name)?,
            "animation_duration" => self.animation.duration_ms = value.as_u32(name)?,
            "animation_lightness" => self.animation.lightness = value.as_u32(name)?,
            _ => return Err(StyleError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let c = Connection::new(ConnectionId::new(), 0);
        assert_eq!(c.pen().width, 3.0);
        assert_eq!(c.arrow_size(), 15.0);
        assert_eq!(c.arrow_position_percent(), 0.5);
        assert_eq!(c.curvature(), 0.5);
        assert_eq!(c.drag_distance(), 20.0);
        assert!(c.is_orphaned());
    }

    #[test]
    fn test_arrow_clamp_examples() {
        let mut c = Connection::new(ConnectionId::new(), 0);
        c.set_arrow_position_percent(-5.0);
        assert_eq!(c.arrow_position_percent(), 0.0);
        c.set_arrow_position_percent(5.0);
        assert_eq!(c.arrow_position_percent(), 1.0);
        c.set_arrow_position_percent(0.5);
        assert_eq!(c.arrow_position_percent(), 0.5);
    }

    proptest! {
        #[test]
        fn prop_arrow_position_in_unit_range(p in proptest::num::f32::ANY) {
            let mut c = Connection::new(ConnectionId::new(), 0);
            c.set_arrow_position_percent(p);
            let stored = c.arrow_position_percent();
            prop_assert!((0.0..=1.0).contains(&stored));
        }
    }

    #[test]
    fn test_memoized_update() {
        let mut c = Connection::new(ConnectionId::new(), 0);
        let (a, b) = (Pos2::new(0.0, 0.0), Pos2::new(200.0, 80.0));
        assert!(c.update_position(a, b));
        let first = c.path().clone();
        assert!(!c.update_position(a, b));
        assert_eq!(c.path(), &first);

        assert!(c.update_position(a, Pos2::new(210.0, 80.0)));
        assert_ne!(c.path(), &first);
    }

    #[test]
    fn test_setters_force_recalc() {
        let mut c = Connection::new(ConnectionId::new(), 0);
        let (a, b) = (Pos2::new(0.0, 0.0), Pos2::new(200.0, 80.0));
        c.update_position(a, b);
        c.set_curvature(0.0);
        assert!(matches!(c.path().segment, crate::geometry::Segment::Line { .. }));
        c.set_arrow_size(0.0);
        assert!(c.path().arrow.is_none());
    }

    #[test]
    fn test_short_path_has_no_arrow() {
        let mut c = Connection::new(ConnectionId::new(), 0);
        c.update_position(Pos2::ZERO, Pos2::new(20.0, 0.0));
        assert!(c.path().arrow.is_none());
        c.update_position(Pos2::ZERO, Pos2::new(100.0, 0.0));
        assert!(c.path().arrow.is_some());
    }

    #[test]
    fn test_set_color_sets_pen_and_brush() {
        let mut c = Connection::new(ConnectionId::new(), 0);
        c.set_color(Color32::RED);
        assert_eq!(c.pen().color, Color32::RED);
        assert_eq!(c.brush(), Color32::RED);
        assert_eq!(c.pen().width, 3.0);
    }

    #[test]
    fn test_shape_hits_near_line() {
        let mut c = Connection::new(ConnectionId::new(), 0);
        c.set_curvature(0.0);
        c.update_position(Pos2::ZERO, Pos2::new(100.0, 0.0));
        assert!(c.contains(Pos2::new(30.0, 3.0)));
        assert!(!c.contains(Pos2::new(30.0, 20.0)));
    }

    #[test]
    fn test_dangling_socket() {
        let mut c = Connection::new(ConnectionId::new(), 0);
        let s = SocketId {
            node: NodeId::new(),
            local: 0,
        };
        c.set_source(Some(s));
        assert_eq!(c.dangling_socket(), Some(s));
        c.set_destination(Some(SocketId {
            node: NodeId::new(),
            local: 0,
        }));
        assert!(c.is_attached());
        assert_eq!(c.dangling_socket(), None);
    }
}
