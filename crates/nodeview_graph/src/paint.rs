// SPDX-License-Identifier: MIT OR Apache-2.0
//! Painting and hit-testing capabilities of canvas items.
//!
//! Items never lay themselves out while painting; they only read the
//! geometry computed by the last layout pass.

use crate::geometry::ItemShape;
use crate::socket::{Socket, SocketShape};
use crate::text::Font;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};

/// A drawing backend in scene coordinates
pub trait PaintSurface {
    /// Filled and outlined rectangle with elliptical corners
    fn rect(&mut self, rect: Rect, radii: Vec2, fill: Color32, stroke: Stroke);

    /// Filled and outlined ellipse inscribed in `rect`
    fn ellipse(&mut self, rect: Rect, fill: Color32, stroke: Stroke);

    /// Filled and outlined closed polygon
    fn polygon(&mut self, points: &[Pos2], fill: Color32, stroke: Stroke);

    /// Open polyline
    fn polyline(&mut self, points: &[Pos2], stroke: Stroke);

    /// Single line segment
    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke);

    /// One line of text with its top-left corner at `pos`
    fn text(&mut self, pos: Pos2, text: &str, font: &Font, color: Color32);

    /// Externally supplied image identified by `key`
    fn image(&mut self, rect: Rect, key: &str);
}

/// Geometry and painting of something placed on the canvas.
///
/// All methods work in scene coordinates.
pub trait SceneItem {
    /// Area that painting may touch
    fn bounding_rect(&self) -> Rect;

    /// Precise outline used for hit-testing and overlap queries
    fn shape(&self) -> ItemShape;

    /// Draw order; higher values draw on top
    fn z_value(&self) -> i32;

    /// Whether `pos` hits the item
    fn contains(&self, pos: Pos2) -> bool {
        self.shape().contains(pos)
    }

    /// Draw using the current style and geometry
    fn paint(&self, surface: &mut dyn PaintSurface);
}

/// A socket together with the scene position of its node
#[derive(Debug, Clone, Copy)]
pub struct PlacedSocket<'a> {
    /// The socket
    pub socket: &'a Socket,
    /// Scene position of the owning node
    pub origin: Pos2,
    /// Draw order of the owning node
    pub z: i32,
}

impl PlacedSocket<'_> {
    /// Socket origin in scene coordinates
    pub fn scene_pos(&self) -> Pos2 {
        self.origin + self.socket.pos().to_vec2()
    }

    /// Connection anchor in scene coordinates
    pub fn location(&self) -> Pos2 {
        self.origin + self.socket.location_in_node().to_vec2()
    }

    /// Shape rectangle in scene coordinates
    pub fn shape_rect(&self) -> Rect {
        self.socket.shape_rect_in_node().translate(self.origin.to_vec2())
    }
}

impl SceneItem for PlacedSocket<'_> {
    fn bounding_rect(&self) -> Rect {
        self.socket
            .local_bounds()
            .translate(self.scene_pos().to_vec2())
            .expand(self.socket.outline().width / 2.0)
    }

    fn shape(&self) -> ItemShape {
        if !self.socket.is_valid() {
            return ItemShape::Empty;
        }
        let rect = self.shape_rect();
        match self.socket.shape() {
            SocketShape::Circle => ItemShape::Ellipse(rect),
            SocketShape::Triangle => {
                ItemShape::Polygon(self.socket.triangle_orientation().points(rect).to_vec())
            }
            SocketShape::Square | SocketShape::None => ItemShape::RoundedRect {
                rect,
                radii: Vec2::ZERO,
            },
        }
    }

    fn z_value(&self) -> i32 {
        self.z
    }

    fn paint(&self, surface: &mut dyn PaintSurface) {
        let socket = self.socket;
        if !socket.is_valid() {
            return;
        }
        let rect = self.shape_rect();
        let fill = socket.animation.color(socket.fill_color());
        let outline = socket.outline();
        match socket.shape() {
            SocketShape::Circle => surface.ellipse(rect, fill, outline),
            SocketShape::Square => surface.rect(rect, Vec2::ZERO, fill, outline),
            SocketShape::Triangle => {
                surface.polygon(&socket.triangle_orientation().points(rect), fill, outline);
            }
            SocketShape::None => {}
        }

        let layout = socket.layout();
        if let Some(label) = layout.label_rect {
            let origin = label.min + self.scene_pos().to_vec2();
            let line_height = socket.font().height();
            for (i, line) in layout.label_lines.iter().enumerate() {
                let pos = origin + Vec2::new(0.0, i as f32 * line_height);
                surface.text(pos, line, socket.font(), socket.label_color());
            }
        }
    }
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// See [`PaintSurface::rect`]
    Rect(Rect),
    /// See [`PaintSurface::ellipse`]
    Ellipse(Rect),
    /// See [`PaintSurface::polygon`]
    Polygon(Vec<Pos2>),
    /// See [`PaintSurface::polyline`]
    Polyline(Vec<Pos2>),
    /// See [`PaintSurface::line`]
    Line(Pos2, Pos2),
    /// See [`PaintSurface::text`]
    Text(Pos2, String),
    /// See [`PaintSurface::image`]
    Image(Rect, String),
}

/// Surface that records calls instead of drawing; used headless
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Calls in order
    pub commands: Vec<PaintCommand>,
}

impl RecordingSurface {
    /// Empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded text lines, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text(_, t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PaintSurface for RecordingSurface {
    fn rect(&mut self, rect: Rect, _radii: Vec2, _fill: Color32, _stroke: Stroke) {
        self.commands.push(PaintCommand::Rect(rect));
    }

    fn ellipse(&mut self, rect: Rect, _fill: Color32, _stroke: Stroke) {
        self.commands.push(PaintCommand::Ellipse(rect));
    }

    fn polygon(&mut self, points: &[Pos2], _fill: Color32, _stroke: Stroke) {
        self.commands.push(PaintCommand::Polygon(points.to_vec()));
    }

    fn polyline(&mut self, points: &[Pos2], _stroke: Stroke) {
        self.commands.push(PaintCommand::Polyline(points.to_vec()));
    }

    fn line(&mut self, from: Pos2, to: Pos2, _stroke: Stroke) {
        self.commands.push(PaintCommand::Line(from, to));
    }

    fn text(&mut self, pos: Pos2, text: &str, _font: &Font, _color: Color32) {
        self.commands.push(PaintCommand::Text(pos, text.to_string()));
    }

    fn image(&mut self, rect: Rect, key: &str) {
        self.commands.push(PaintCommand::Image(rect, key.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::socket::{SocketId, SocketKind, SocketType};

    fn input_socket() -> Socket {
        let mut socket = Socket::new(
            SocketId {
                node: NodeId::new(),
                local: 0,
            },
            SocketType::Input,
            SocketKind::Standard,
            "In",
        );
        socket.rebuild(100.0);
        socket
    }

    #[test]
    fn test_placed_socket_offsets_by_origin() {
        let socket = input_socket();
        let placed = PlacedSocket {
            socket: &socket,
            origin: Pos2::new(100.0, 50.0),
            z: 0,
        };
        assert_eq!(placed.location(), Pos2::new(110.0, 60.0));
        assert!(placed.contains(Pos2::new(105.0, 55.0)));
        assert!(!placed.contains(Pos2::new(95.0, 55.0)));
    }

    #[test]
    fn test_paint_square_and_label() {
        let socket = input_socket();
        let placed = PlacedSocket {
            socket: &socket,
            origin: Pos2::ZERO,
            z: 0,
        };
        let mut surface = RecordingSurface::new();
        placed.paint(&mut surface);
        assert!(matches!(surface.commands[0], PaintCommand::Rect(_)));
        assert_eq!(surface.texts(), vec!["In"]);
    }

    #[test]
    fn test_invalid_socket_paints_nothing() {
        let socket = Socket::invalid();
        let placed = PlacedSocket {
            socket: &socket,
            origin: Pos2::ZERO,
            z: 0,
        };
        let mut surface = RecordingSurface::new();
        placed.paint(&mut surface);
        assert!(surface.commands.is_empty());
        assert_eq!(placed.shape(), ItemShape::Empty);
    }
}
