// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layout of simple nodes: a bare body with socket rows above and below.

use super::{Node, NodeKind, DROP_SHADOW_OFFSET};
use crate::geometry::adjusted;
use crate::socket::Socket;
use egui::{Pos2, Rect, Vec2};

/// Horizontal gap between sockets in a row
const ROW_SPACING: f32 = 4.0;

fn row_width(sockets: &[Socket]) -> f32 {
    sockets.iter().map(|s| s.shape_size() + ROW_SPACING).sum()
}

fn max_shape(sockets: &[Socket], floor: f32) -> f32 {
    sockets.iter().map(Socket::shape_size).fold(floor, f32::max)
}

impl Node {
    pub(super) fn layout_simple(&mut self) {
        let NodeKind::Simple { min_height } = self.kind else {
            return;
        };
        for socket in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            let size = socket.shape_size();
            socket.rebuild(size);
        }

        let font = &self.title_font;
        let text_w = font.text_width(&self.title);
        let in_w = row_width(&self.inputs);
        let out_w = row_width(&self.outputs);
        let width = in_w.max(out_w).max(text_w + 10.0).max(self.min_width);
        let height = min_height.max(font.height());

        let polygon = Rect::from_min_size(Pos2::ZERO, Vec2::new(width, height));
        let center = polygon.center();
        let title_pos = Pos2::new((width - text_w) / 2.0, (height - font.height()) / 2.0);

        let mut in_start = center - Vec2::new(in_w / 2.0, height / 2.0);
        for socket in &mut self.inputs {
            let size = socket.shape_size();
            socket.set_pos(in_start - Vec2::new(0.0, size));
            in_start.x += size + ROW_SPACING;
        }
        let mut out_start = center + Vec2::new(-out_w / 2.0, height / 2.0);
        for socket in &mut self.outputs {
            socket.set_pos(out_start);
            out_start.x += socket.shape_size() + ROW_SPACING;
        }

        self.layout.polygon = polygon;
        self.layout.title_bar = None;
        self.layout.title_text = self.title.clone();
        self.layout.title_pos = title_pos;
        self.layout.pixmap_rect = None;
        self.layout.detail_rect = None;
        self.layout.detail_lines.clear();
        self.layout.body_detail_rect = None;
        self.layout.body_detail_lines.clear();
        self.layout.divider = None;
        self.update_simple_bounding_rect();
    }

    /// Inputs overflow the top edge and outputs the bottom edge
    pub(super) fn update_simple_bounding_rect(&mut self) {
        let polygon = self.layout.polygon;
        let pen = self.outline.width;
        let top = max_shape(&self.inputs, pen / 2.0);
        let bottom = max_shape(&self.outputs, pen / 2.0);
        let mut rect = adjusted(polygon, pen / 2.0, top, pen / 2.0, bottom);
        if self.drop_shadow {
            rect = rect.union(polygon.translate(DROP_SHADOW_OFFSET));
        }
        self.layout.bounding = rect;
    }
}

#[cfg(test)]
mod tests {
    use crate::node::{Node, NodeId};
    use crate::socket::SocketKind;

    #[test]
    fn test_sockets_are_textless_rows() {
        let mut node = Node::new_simple(NodeId::new());
        node.add_input_socket();
        node.add_input_socket();
        node.add_output_socket();
        assert!(node.title_bar_rect().is_none());
        assert!(node.sockets().all(|s| s.kind() == SocketKind::Textless));

        let a = node.input_socket(0).expect("socket").pos();
        let b = node.input_socket(1).expect("socket").pos();
        assert_eq!(a.y, b.y);
        assert_eq!(b.x - a.x, 24.0);
        // Inputs sit above the body, outputs below.
        assert_eq!(a.y, -20.0);
        let out = node.output_socket(0).expect("socket").pos();
        assert_eq!(out.y, node.polygon().bottom());
    }

    #[test]
    fn test_width_and_height_floors() {
        let mut node = Node::new_simple(NodeId::new());
        node.set_minimum_width(0.0);
        let text_w = node.title_font().text_width("Node");
        assert_eq!(node.polygon().width(), text_w + 10.0);
        assert_eq!(node.polygon().height(), node.title_font().height());
        node.set_minimum_height(50.0);
        assert_eq!(node.polygon().height(), 50.0);
    }

    #[test]
    fn test_bounds_cover_socket_rows() {
        let mut node = Node::new_simple(NodeId::new());
        node.set_drop_shadow(false);
        node.add_input_socket();
        node.add_output_socket();
        let bounds = node.local_bounds();
        assert_eq!(bounds.top(), -20.0);
        assert_eq!(bounds.bottom(), node.polygon().bottom() + 20.0);
        for socket in node.sockets() {
            let shape = socket.shape_rect_in_node();
            assert!(bounds.contains_rect(shape));
        }
    }
}
