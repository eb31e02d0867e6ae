// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sockets: the connection points on a node's left and right edges.
//!
//! A socket owns its shape and label geometry in socket-local coordinates.
//! Its position within the node is assigned by the node's layout pass, and
//! the list of attached connections is a back-reference only; connections
//! themselves live in the canvas registry.

use crate::animation::HoverAnimation;
use crate::connection::ConnectionId;
use crate::error::StyleError;
use crate::node::NodeId;
use crate::style::{PropertyValue, Styleable};
use crate::text::{ElideMode, Font};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use serde::{Deserialize, Serialize};

/// Gap between a widget socket's label and its embedded widget
const WIDGET_SPACING: f32 = 3.0;

/// Identifier of a socket; carries the id of the owning node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketId {
    /// Owning node
    pub node: NodeId,
    /// Per-node sequence number, never reused within the node
    pub local: u32,
}

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketType {
    /// Receives connections on the node's left edge
    Input,
    /// Sends connections from the node's right edge
    Output,
    /// Sentinel that never takes part in connections
    Invalid,
}

impl SocketType {
    /// Whether the type is Input or Output
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Outline drawn at the connection point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketShape {
    /// Circle
    Circle,
    /// Square
    Square,
    /// Triangle pointing in [`TriangleOrientation`]
    Triangle,
    /// No visible shape; still hit-testable
    None,
}

impl SocketShape {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "circle" => Some(Self::Circle),
            "square" => Some(Self::Square),
            "triangle" => Some(Self::Triangle),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::None => "none",
        }
    }
}

/// Direction a triangle shape points in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriangleOrientation {
    /// Up
    North,
    /// Right
    #[default]
    East,
    /// Down
    South,
    /// Left
    West,
    /// Treated as North
    None,
}

impl TriangleOrientation {
    /// Three outline points of a triangle inscribed in `rect`
    pub fn points(self, rect: Rect) -> [Pos2; 3] {
        let c = rect.center();
        match self {
            Self::North | Self::None => [
                rect.left_bottom(),
                Pos2::new(c.x, rect.top()),
                rect.right_bottom(),
            ],
            Self::East => [
                rect.left_top(),
                Pos2::new(rect.right(), c.y),
                rect.left_bottom(),
            ],
            Self::South => [
                rect.left_top(),
                Pos2::new(c.x, rect.bottom()),
                rect.right_top(),
            ],
            Self::West => [
                rect.right_top(),
                Pos2::new(rect.left(), c.y),
                rect.right_bottom(),
            ],
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "north" => Some(Self::North),
            "east" => Some(Self::East),
            "south" => Some(Self::South),
            "west" => Some(Self::West),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// How a label that is too wide is shortened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelStyle {
    /// Cut with an ellipsis
    #[default]
    Elide,
    /// Break into several lines
    Wrap,
}

/// Vertical placement of shape and label relative to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAlignment {
    /// Top edges aligned
    Top,
    /// Centres aligned
    #[default]
    Center,
    /// Bottom edges aligned
    Bottom,
}

impl VerticalAlignment {
    fn offset(self, container: f32, item: f32) -> f32 {
        match self {
            Self::Top => 0.0,
            Self::Center => container / 2.0 - item / 2.0,
            Self::Bottom => container - item,
        }
    }
}

/// Where a full-line socket draws its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelPosition {
    /// Against the left edge
    Left,
    /// Against the right edge
    Right,
    /// Centred in the row
    Center,
}

/// Layout variant of a socket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SocketKind {
    /// Shape on the node edge, label inside the node
    Standard,
    /// Shape spans the whole row; label inside it
    FullLine {
        /// Label placement within the row
        label_pos: LabelPosition,
    },
    /// Shape only
    Textless,
    /// Standard socket that reserves room for an embedded widget
    Widget {
        /// Size of the embedded widget
        size: Vec2,
    },
}

/// Derived socket geometry, socket-local
#[derive(Debug, Clone, PartialEq)]
pub struct SocketLayout {
    /// Width budget of the last rebuild
    pub width: f32,
    /// Rectangle of the connection shape
    pub shape_rect: Rect,
    /// Rectangle of the label, if one is shown
    pub label_rect: Option<Rect>,
    /// Displayed label lines after elision or wrapping
    pub label_lines: Vec<String>,
    /// Rectangle reserved for an embedded widget
    pub widget_rect: Option<Rect>,
}

impl Default for SocketLayout {
    fn default() -> Self {
        Self {
            width: 0.0,
            shape_rect: Rect::NOTHING,
            label_rect: None,
            label_lines: Vec::new(),
            widget_rect: None,
        }
    }
}

/// A connection point owned by a node
#[derive(Debug, Clone, PartialEq)]
pub struct Socket {
    id: SocketId,
    socket_type: SocketType,
    kind: SocketKind,
    instance_name: String,
    shape: SocketShape,
    shape_size: f32,
    triangle_orientation: TriangleOrientation,
    fill: Color32,
    outline: Stroke,
    label_text: String,
    label_font: Font,
    label_color: Color32,
    label_style: LabelStyle,
    alignment: VerticalAlignment,
    multiple_connections: bool,
    drag_enabled: bool,
    /// Hover highlight of the shape fill
    pub animation: HoverAnimation,
    connections: Vec<ConnectionId>,
    pos: Pos2,
    layout: SocketLayout,
}

impl Socket {
    /// A socket of `kind` with the default look for its direction
    pub fn new(id: SocketId, socket_type: SocketType, kind: SocketKind, label: impl Into<String>) -> Self {
        let shape = match (kind, socket_type) {
            (_, SocketType::Invalid) => SocketShape::None,
            (SocketKind::FullLine { .. }, _) | (_, SocketType::Input) => SocketShape::Square,
            (_, SocketType::Output) => SocketShape::Circle,
        };
        let mut socket = Self {
            id,
            socket_type,
            kind,
            instance_name: String::new(),
            shape,
            shape_size: 20.0,
            triangle_orientation: TriangleOrientation::default(),
            fill: Color32::from_rgb(0, 255, 255),
            outline: Stroke::new(1.0, Color32::BLACK),
            label_text: label.into(),
            label_font: Font::default(),
            label_color: Color32::BLACK,
            label_style: LabelStyle::Elide,
            alignment: VerticalAlignment::Center,
            multiple_connections: socket_type == SocketType::Output,
            drag_enabled: true,
            animation: HoverAnimation::default(),
            connections: Vec::new(),
            pos: Pos2::ZERO,
            layout: SocketLayout::default(),
        };
        socket.rebuild(0.0);
        socket
    }

    /// The invalid sentinel: no shape, no label, no connections
    pub fn invalid() -> Self {
        Self::new(
            SocketId {
                node: NodeId(uuid::Uuid::nil()),
                local: u32::MAX,
            },
            SocketType::Invalid,
            SocketKind::Textless,
            "",
        )
    }

    /// Socket id
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Owning node
    pub fn node(&self) -> NodeId {
        self.id.node
    }

    /// Direction
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Whether this is a real Input or Output socket
    pub fn is_valid(&self) -> bool {
        self.socket_type.is_valid()
    }

    /// Layout variant
    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Whether the shape spans the full node row
    pub fn is_full_line(&self) -> bool {
        matches!(self.kind, SocketKind::FullLine { .. })
    }

    /// Attached connections, in attachment order
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    /// Number of attached connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Register a back-reference; ignored on the invalid sentinel
    pub(crate) fn add_connection(&mut self, connection: ConnectionId) {
        if !self.is_valid() || self.connections.contains(&connection) {
            return;
        }
        self.connections.push(connection);
    }

    /// Drop a back-reference; returns whether it was present
    pub(crate) fn remove_connection(&mut self, connection: ConnectionId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| *c != connection);
        self.connections.len() != before
    }

    /// Empty the back-reference list, returning what it held
    pub(crate) fn take_connections(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.connections)
    }

    /// Whether more than one connection may attach
    pub fn multiple_connections(&self) -> bool {
        self.multiple_connections
    }

    /// Change the multiplicity flag.
    ///
    /// Turning it off while holding more than one connection empties the
    /// list; the returned ids must be destroyed by the caller.
    pub(crate) fn set_multiple_connections(&mut self, multiple: bool) -> Vec<ConnectionId> {
        self.multiple_connections = multiple;
        if !multiple && self.connections.len() > 1 {
            self.take_connections()
        } else {
            Vec::new()
        }
    }

    /// Whether dragging from the shape starts a connection
    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled && self.is_valid() && !self.is_full_line()
    }

    /// Enable or disable drag-out
    pub fn set_drag_enabled(&mut self, enabled: bool) {
        self.drag_enabled = enabled;
    }

    /// Instance name used in style keys
    pub fn name(&self) -> &str {
        &self.instance_name
    }

    /// Set the instance name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.instance_name = name.into();
    }

    /// Shape kind
    pub fn shape(&self) -> SocketShape {
        self.shape
    }

    /// Set the shape kind
    pub fn set_shape(&mut self, shape: SocketShape) {
        if !self.is_valid() {
            return;
        }
        self.shape = shape;
        self.update();
    }

    /// Side length of the shape
    pub fn shape_size(&self) -> f32 {
        self.shape_size
    }

    /// Set the side length of the shape
    pub fn set_shape_size(&mut self, size: f32) {
        if !self.is_valid() {
            return;
        }
        self.shape_size = size.max(0.0);
        self.update();
    }

    /// Orientation used when the shape is a triangle
    pub fn triangle_orientation(&self) -> TriangleOrientation {
        self.triangle_orientation
    }

    /// Set the triangle orientation
    pub fn set_triangle_orientation(&mut self, orientation: TriangleOrientation) {
        self.triangle_orientation = orientation;
    }

    /// Fill colour of the shape
    pub fn fill_color(&self) -> Color32 {
        self.fill
    }

    /// Set the fill colour
    pub fn set_fill_color(&mut self, color: Color32) {
        self.fill = color;
    }

    /// Outline of the shape
    pub fn outline(&self) -> Stroke {
        self.outline
    }

    /// Set the outline
    pub fn set_outline(&mut self, outline: Stroke) {
        self.outline = outline;
    }

    /// Full label text
    pub fn label(&self) -> &str {
        &self.label_text
    }

    /// Set the label text
    pub fn set_label(&mut self, label: impl Into<String>) {
        if !self.is_valid() {
            return;
        }
        self.label_text = label.into();
        self.update();
    }

    /// Label font
    pub fn font(&self) -> &Font {
        &self.label_font
    }

    /// Set the label font; textless sockets ignore it
    pub fn set_font(&mut self, font: Font) {
        if !self.is_valid() || matches!(self.kind, SocketKind::Textless) {
            return;
        }
        self.label_font = font;
        self.update();
    }

    /// Label colour
    pub fn label_color(&self) -> Color32 {
        self.label_color
    }

    /// Set the label colour
    pub fn set_label_color(&mut self, color: Color32) {
        self.label_color = color;
    }

    /// How an oversized label is shortened
    pub fn label_style(&self) -> LabelStyle {
        self.label_style
    }

    /// Set the label style
    pub fn set_label_style(&mut self, style: LabelStyle) {
        self.label_style = style;
        self.update();
    }

    /// Vertical alignment of shape and label
    pub fn alignment(&self) -> VerticalAlignment {
        self.alignment
    }

    /// Set the vertical alignment
    pub fn set_alignment(&mut self, alignment: VerticalAlignment) {
        self.alignment = alignment;
        self.update();
    }

    /// Label placement of a full-line socket
    pub fn label_position(&self) -> Option<LabelPosition> {
        match self.kind {
            SocketKind::FullLine { label_pos } => Some(label_pos),
            _ => None,
        }
    }

    /// Move the label of a full-line socket; other kinds ignore it
    pub fn set_label_position(&mut self, position: LabelPosition) {
        if let SocketKind::FullLine { label_pos } = &mut self.kind {
            *label_pos = position;
            self.update();
        }
    }

    /// Position of the socket's origin in node-local coordinates
    pub fn pos(&self) -> Pos2 {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: Pos2) {
        self.pos = pos;
    }

    /// Current derived geometry
    pub fn layout(&self) -> &SocketLayout {
        &self.layout
    }

    /// Bounds of shape, label and widget in socket-local coordinates
    pub fn local_bounds(&self) -> Rect {
        let mut rect = self.layout.shape_rect;
        if let Some(label) = self.layout.label_rect {
            rect = rect.union(label);
        }
        if let Some(widget) = self.layout.widget_rect {
            rect = rect.union(widget);
        }
        if rect == Rect::NOTHING {
            Rect::ZERO
        } else {
            rect
        }
    }

    /// Height taken in the node's socket column
    pub fn height(&self) -> f32 {
        self.local_bounds().height()
    }

    /// Shape rectangle in node-local coordinates
    pub fn shape_rect_in_node(&self) -> Rect {
        self.layout.shape_rect.translate(self.pos.to_vec2())
    }

    /// Anchor point used by connections, in node-local coordinates
    pub fn location_in_node(&self) -> Pos2 {
        self.shape_rect_in_node().center()
    }

    fn update(&mut self) {
        let width = self.layout.width;
        self.rebuild(width);
    }

    /// Lay out shape and label within a horizontal budget of `width`.
    pub fn rebuild(&mut self, width: f32) {
        let width = width.max(0.0);
        let size = self.shape_size;
        let mut layout = SocketLayout {
            width,
            ..Default::default()
        };

        match self.kind {
            _ if !self.is_valid() => {}
            SocketKind::Textless => {
                layout.shape_rect = Rect::from_min_size(Pos2::ZERO, Vec2::splat(size));
            }
            SocketKind::FullLine { label_pos } => {
                let font = &self.label_font;
                layout.shape_rect = match self.socket_type {
                    SocketType::Output => Rect::from_min_size(Pos2::new(-width, 0.0), Vec2::new(width, size)),
                    _ => Rect::from_min_size(Pos2::ZERO, Vec2::new(width, size)),
                };
                let shown = font.elided_text(&self.label_text, ElideMode::Right, width);
                let text_width = font.text_width(&shown);
                let shape = layout.shape_rect;
                let space = font.space_width();
                let x = match label_pos {
                    LabelPosition::Left => shape.left() + space,
                    LabelPosition::Right => shape.right() - space - text_width,
                    LabelPosition::Center => {
                        shape.right()
                            - space
                            - (text_width.min(width - 3.0 * space) + shape.width()) / 2.0
                    }
                };
                let y = shape.center().y - font.height() / 2.0;
                layout.label_rect = Some(Rect::from_min_size(
                    Pos2::new(x, y),
                    Vec2::new(text_width, font.height()),
                ));
                layout.label_lines = vec![shown];
            }
            SocketKind::Standard | SocketKind::Widget { .. } => {
                let widget = match self.kind {
                    SocketKind::Widget { size } => Some(size),
                    _ => None,
                };
                let budget = match widget {
                    Some(w) => (width - w.x - WIDGET_SPACING).max(0.0),
                    None => width,
                };
                self.layout_label(&mut layout, budget);
                if let Some(widget_size) = widget {
                    let rect = self.place_widget(&layout, widget_size);
                    // A widget taller than the shape pushes the row down
                    let shift = Vec2::new(0.0, (-rect.top()).max(0.0));
                    layout.shape_rect = layout.shape_rect.translate(shift);
                    layout.label_rect = layout.label_rect.map(|r| r.translate(shift));
                    layout.widget_rect = Some(rect.translate(shift));
                }
            }
        }
        self.layout = layout;
    }

    fn layout_label(&self, layout: &mut SocketLayout, budget: f32) {
        let font = &self.label_font;
        let size = self.shape_size;
        let lines = if font.text_width(&self.label_text) > budget {
            match self.label_style {
                LabelStyle::Elide => vec![font.elided_text(&self.label_text, ElideMode::Right, budget)],
                LabelStyle::Wrap => font.wrap_text(&self.label_text, budget),
            }
        } else {
            vec![self.label_text.clone()]
        };
        let label_width = lines.iter().map(|l| font.text_width(l)).fold(0.0, f32::max);
        let label_height = lines.len() as f32 * font.height();
        let space = font.space_width();
        let label_x = match self.socket_type {
            SocketType::Output => -space - label_width,
            _ => size + space,
        };

        let (shape_y, label_y) = if size > label_height {
            (0.0, self.alignment.offset(size, label_height))
        } else {
            (self.alignment.offset(label_height, size), 0.0)
        };

        layout.shape_rect = Rect::from_min_size(Pos2::new(0.0, shape_y), Vec2::splat(size));
        layout.label_rect = Some(Rect::from_min_size(
            Pos2::new(label_x, label_y),
            Vec2::new(label_width, label_height),
        ));
        layout.label_lines = lines;
    }

    fn place_widget(&self, layout: &SocketLayout, widget: Vec2) -> Rect {
        let label = layout.label_rect.unwrap_or(layout.shape_rect);
        let y = layout.shape_rect.center().y - widget.y / 2.0;
        let x = match self.socket_type {
            SocketType::Output => label.left() - WIDGET_SPACING - widget.x,
            _ => label.right() + WIDGET_SPACING,
        };
        Rect::from_min_size(Pos2::new(x, y), widget)
    }
}

impl Styleable for Socket {
    fn type_name(&self) -> &'static str {
        match self.kind {
            SocketKind::Standard => "Socket",
            SocketKind::FullLine { .. } => "FullLineSocket",
            SocketKind::Textless => "TextlessSocket",
            SocketKind::Widget { .. } => "WidgetSocket",
        }
    }

    fn instance_name(&self) -> &str {
        &self.instance_name
    }

    fn property_names(&self) -> &'static [&'static str] {
        &[
            "shape",
            "shape_size",
            "triangle_orientation",
            "fill_color",
            "outline",
            "font",
            "label_color",
            "label_style",
            "alignment",
            "drag_enabled",
            "animation_enabled",
            "animation_duration",
            "animation_lightness",
        ]
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        Some(match name {
            "shape" => PropertyValue::Text(self.shape.name().to_string()),
            "shape_size" => PropertyValue::Float(self.shape_size),
            "triangle_orientation" => PropertyValue::Text(format!("{:?}", self.triangle_orientation).to_lowercase()),
            "fill_color" => PropertyValue::Color(self.fill),
            "outline" => PropertyValue::Stroke(self.outline),
            "font" => PropertyValue::Font(self.label_font.clone()),
            "label_color" => PropertyValue::Color(self.label_color),
            "label_style" => PropertyValue::Text(
                match self.label_style {
                    LabelStyle::Elide => "elide",
                    LabelStyle::Wrap => "wrap",
                }
                .to_string(),
            ),
            "alignment" => PropertyValue::Text(format!("{:?}", self.alignment).to_lowercase()),
            "drag_enabled" => PropertyValue::Bool(self.drag_enabled),
            "animation_enabled" => PropertyValue::Bool(self.animation.enabled),
            "animation_duration" => PropertyValue::Int(i64::from(self.animation.duration_ms)),
            "animation_lightness" => PropertyValue::Int(i64::from(self.animation.lightness)),
            _ => return None,
        })
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), StyleError> {
        match name {
            "shape" => {
                let shape = SocketShape::from_name(&value.as_text(name)?).ok_or(
                    StyleError::TypeMismatch {
                        property: name.to_string(),
                        expected: "circle, square, triangle or none",
                    },
                )?;
                self.set_shape(shape);
            }
            "shape_size" => self.set_shape_size(value.as_f32(name)?),
            "triangle_orientation" => {
                let orientation = TriangleOrientation::from_name(&value.as_text(name)?).ok_or(
                    StyleError::TypeMismatch {
                        property: name.to_string(),
                        expected: "north, east, south, west or none",
                    },
                )?;
                self.set_triangle_orientation(orientation);
            }
            "fill_color" => self.set_fill_color(value.as_color(name)?),
            "outline" => self.set_outline(value.as_stroke(name)?),
            "font" => self.set_font(value.as_font(name)?),
            "label_color" => self.set_label_color(value.as_color(name)?),
            "label_style" => {
                let style = match value.as_text(name)?.to_ascii_lowercase().as_str() {
                    "elide" => LabelStyle::Elide,
                    "wrap" => LabelStyle::Wrap,
                    _ => {
                        return Err(StyleError::TypeMismatch {
                            property: name.to_string(),
                            expected: "elide or wrap",
                        })
                    }
                };
                self.set_label_style(style);
            }
            "alignment" => {
                let alignment = match value.as_text(name)?.to_ascii_lowercase().as_str() {
                    "top" => VerticalAlignment::Top,
                    "center" => VerticalAlignment::Center,
                    "bottom" => VerticalAlignment::Bottom,
                    _ => {
                        return Err(StyleError::TypeMismatch {
                            property: name.to_string(),
                            expected: "top, center or bottom",
                        })
                    }
                };
                self.set_alignment(alignment);
            }
            "drag_enabled" => self.set_drag_enabled(value.as_bool(name)?),
            "animation_enabled" => self.animation.enabled = value.as_bool(name)?,
            "animation_duration" => self.animation.duration_ms = value.as_u32(name)?,
            "animation_lightness" => self.animation.lightness = value.as_u32(name)?,
            _ => return Err(StyleError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}
