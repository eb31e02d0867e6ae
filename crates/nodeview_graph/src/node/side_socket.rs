// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layout of side-socket nodes: sockets centred on the body edges around a
//! collapsible content area.

use super::{Node, NodeKind};
use crate::socket::Socket;
use egui::{Pos2, Rect, Vec2};

impl Node {
    pub(super) fn layout_side_socket(&mut self) {
        self.resize_title_bar(true);
        let bar = self.layout.title_bar.unwrap_or(Rect::ZERO);
        let adjust = self.title_adjust();
        let title_w = bar.width();
        let title_h = bar.height();
        let buffer = self.socket_buffer;
        let frame = self.outline.width + 3.0;

        for socket in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            socket.rebuild(title_w);
        }

        let NodeKind::SideSocket(container) = &mut self.kind else {
            return;
        };
        let container_title_h = container.title_height() + 3.0;
        let column = |sockets: &[Socket]| {
            sockets
                .iter()
                .map(|s| s.height() + buffer)
                .sum::<f32>()
        };
        let width_mod = |sockets: &[Socket]| {
            sockets
                .iter()
                .map(|s| adjust + s.shape_size() / 2.0 + 3.0)
                .fold(adjust, f32::max)
        };
        let left_indent = self
            .inputs
            .iter()
            .map(|s| s.shape_size() / 2.0)
            .fold(0.0, f32::max);
        let content_w = title_w - width_mod(&self.inputs) - width_mod(&self.outputs);
        container.place(
            Pos2::new(adjust, title_h + 3.0),
            title_w - 2.0 * adjust,
            left_indent,
            content_w,
        );

        let in_h = container_title_h + column(&self.inputs);
        let out_h = container_title_h + column(&self.outputs);
        let detail_h = container.layout().bounds.height().max(in_h).max(out_h);
        let height = title_h + detail_h + 2.0 * frame;
        let center_y = title_h + detail_h / 2.0 + frame;

        let place_column = |sockets: &mut [Socket], edge_x: f32| {
            let total = column(sockets);
            let mut y = center_y - total / 2.0;
            for socket in sockets {
                y += socket.height() + buffer;
                let pos = Pos2::new(edge_x - socket.shape_size() / 2.0, y - socket.height());
                socket.set_pos(pos);
            }
        };
        place_column(&mut self.inputs, 0.0);
        place_column(&mut self.outputs, title_w);

        self.layout.polygon = Rect::from_min_size(Pos2::ZERO, Vec2::new(title_w, height));
        self.layout.body_detail_rect = None;
        self.layout.body_detail_lines.clear();
        self.layout.divider = None;
        self.update_bounding_rect();
    }
}

#[cfg(test)]
mod tests {
    use crate::node::{Node, NodeId};
    use crate::socket::SocketKind;

    #[test]
    fn test_sockets_centred_on_edges() {
        let mut node = Node::new_side_socket(NodeId::new());
        node.add_input_socket();
        node.add_output_socket();
        assert!(node.sockets().all(|s| s.kind() == SocketKind::Textless));

        let body = node.polygon();
        let input = node.input_socket(0).expect("socket").location_in_node();
        let output = node.output_socket(0).expect("socket").location_in_node();
        assert_eq!(input.x, 0.0);
        assert_eq!(output.x, body.right());
        assert!((input.y - output.y).abs() < 1e-3);
        let bar = node.title_bar_rect().expect("bar");
        assert!(input.y > bar.bottom());
    }

    #[test]
    fn test_padded_title_width() {
        let mut node = Node::new_side_socket(NodeId::new());
        node.set_minimum_width(0.0);
        let adjust = node.outline_pen().width + 3.0;
        let text_w = node.title_font().text_width("Node");
        let bar = node.title_bar_rect().expect("bar");
        assert!((bar.width() - (text_w + 4.0 * adjust)).abs() < 1e-3);
    }

    #[test]
    fn test_expand_area_changes_height() {
        let mut node = Node::new_side_socket(NodeId::new());
        node.set_detail_text("Several words of content that wrap over a number of lines in the area");
        let open = node.polygon().height();
        node.expand_area(false);
        let closed = node.polygon().height();
        assert!(open > closed);
        assert!(!node.container().expect("container").is_expanded());
        node.expand_area(true);
        assert_eq!(node.polygon().height(), open);
    }

    #[test]
    fn test_click_container_title_toggles() {
        let mut node = Node::new_side_socket(NodeId::new());
        node.set_pos(egui::Pos2::new(100.0, 100.0));
        let strip = node.container().expect("container").pos();
        let hit = egui::Pos2::new(100.0, 100.0) + strip.to_vec2() + egui::Vec2::new(5.0, 2.0);
        assert!(node.click_container(hit));
        assert!(!node.container().expect("container").is_expanded());
        assert!(!node.click_container(egui::Pos2::new(0.0, 0.0)));
    }

    #[test]
    fn test_bounds_contain_sockets() {
        let mut node = Node::new_side_socket(NodeId::new());
        for _ in 0..3 {
            node.add_input_socket();
        }
        node.add_output_socket();
        let bounds = node.local_bounds();
        for socket in node.sockets() {
            assert!(bounds.contains_rect(socket.shape_rect_in_node()));
        }
    }
}
