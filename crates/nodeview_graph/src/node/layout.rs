// SPDX-License-Identifier: MIT OR Apache-2.0
//! The standard node layout pass and bounding-rectangle computation.

use super::{Node, NodeKind, PixmapPosition, TitleJustify, DROP_SHADOW_OFFSET};
use crate::geometry::adjusted;
use crate::socket::Socket;
use crate::text::ElideMode;
use egui::{Pos2, Rect, Vec2};

/// Geometry produced by the last layout pass, node-local
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    /// Body rectangle
    pub polygon: Rect,
    /// Area touched by painting, including socket overflow and shadow
    pub bounding: Rect,
    /// Title bar; `None` when the variant has none
    pub title_bar: Option<Rect>,
    /// Title as displayed, after elision
    pub title_text: String,
    /// Top-left of the title text
    pub title_pos: Pos2,
    /// Image rectangle when shown
    pub pixmap_rect: Option<Rect>,
    /// Detail text rectangle when shown
    pub detail_rect: Option<Rect>,
    /// Wrapped detail lines
    pub detail_lines: Vec<String>,
    /// Body text rectangle when shown
    pub body_detail_rect: Option<Rect>,
    /// Wrapped body text lines
    pub body_detail_lines: Vec<String>,
    /// Line between body text and sockets
    pub divider: Option<[Pos2; 2]>,
}

impl Default for NodeLayout {
    fn default() -> Self {
        let polygon = Rect::from_min_size(Pos2::new(-10.0, -10.0), Vec2::new(153.0, 33.0));
        Self {
            polygon,
            bounding: polygon,
            title_bar: None,
            title_text: String::new(),
            title_pos: Pos2::ZERO,
            pixmap_rect: None,
            detail_rect: None,
            detail_lines: Vec::new(),
            body_detail_rect: None,
            body_detail_lines: Vec::new(),
            divider: None,
        }
    }
}

impl Node {
    /// Run the layout pass for this node's variant.
    ///
    /// Does nothing between [`Node::begin_modify_node`] and
    /// [`Node::end_modify_node`]. Deterministic: a second call with no state
    /// change in between yields identical geometry.
    pub fn resize_node(&mut self) {
        if self.modifying {
            return;
        }
        match self.kind {
            NodeKind::Standard => self.layout_standard(),
            NodeKind::Simple { .. } => self.layout_simple(),
            NodeKind::SideSocket(_) => self.layout_side_socket(),
        }
        tracing::trace!(
            "Node {:?} laid out: {} x {}",
            self.id,
            self.layout.polygon.width(),
            self.layout.polygon.height()
        );
    }

    /// Padding inside the title bar
    pub(super) fn title_adjust(&self) -> f32 {
        self.outline.width + 3.0
    }

    fn effective_pixmap_position(&self) -> PixmapPosition {
        if self.pixmap.is_some() && self.pixmap_enabled() {
            self.pixmap_position
        } else {
            PixmapPosition::None
        }
    }

    /// Size the title bar and place title, image and detail text inside it.
    ///
    /// `padded_title` makes the text width include the padding on both
    /// sides, as side-socket nodes do; it also keeps the detail text out of
    /// the title bar.
    pub(super) fn resize_title_bar(&mut self, padded_title: bool) {
        let adjust = self.title_adjust();
        let font = &self.title_font;
        let line_h = font.height();
        let pix = self.pixmap_size();
        let position = self.effective_pixmap_position();
        let elide_none = self.elide == ElideMode::None;
        let full_width = font.text_width(&self.title);
        let min_w = self.min_width;

        let (width, text_budget) = match position {
            PixmapPosition::None => {
                let w = match (elide_none, padded_title) {
                    (true, true) => (full_width + 2.0 * adjust).max(min_w),
                    (true, false) => full_width.max(min_w),
                    (false, _) => min_w,
                };
                (w, w)
            }
            PixmapPosition::Left | PixmapPosition::Right => {
                let w = if elide_none {
                    (pix.x + full_width).max(min_w)
                } else {
                    pix.x.max(min_w)
                };
                (w, w - pix.x)
            }
            PixmapPosition::Top | PixmapPosition::Center | PixmapPosition::Bottom => {
                let mut w = pix.x;
                if elide_none {
                    w = w.max(full_width);
                }
                let w = w.max(min_w);
                (w, w)
            }
        };

        let shown = font.elided_text(&self.title, self.elide, text_budget);
        let text_w = font.text_width(&shown);

        let detail_in_title = !padded_title && self.detail.visible;
        let detail_h = if detail_in_title {
            self.detail.size(text_budget).y
        } else {
            0.0
        };

        let height = match position {
            PixmapPosition::None => line_h + detail_h,
            PixmapPosition::Left | PixmapPosition::Right => pix.y.max(line_h + detail_h),
            _ => line_h + pix.y + detail_h,
        };

        let bar = Rect::from_min_size(
            Pos2::ZERO,
            Vec2::new(width + 2.0 * adjust, height + 2.0 * adjust),
        );
        let cx = bar.center().x;
        let justified = |center_shift: f32, left: f32, right_shift: f32| match self.title_justify {
            TitleJustify::Center => cx - text_w / 2.0 + center_shift,
            TitleJustify::Left => left,
            TitleJustify::Right => bar.right() - adjust - text_w - right_shift,
        };

        let mut pixmap_rect = None;
        let (title_pos, detail_pos) = match position {
            PixmapPosition::None => (
                Pos2::new(justified(0.0, bar.left() + adjust, 0.0), adjust),
                Pos2::new(adjust, adjust + line_h),
            ),
            PixmapPosition::Left => {
                let pix_rect = Rect::from_min_size(bar.left_top() + Vec2::splat(adjust), pix);
                pixmap_rect = Some(pix_rect);
                (
                    Pos2::new(
                        justified(pix.x / 2.0, pix_rect.right() + adjust * 1.5, 0.0),
                        adjust,
                    ),
                    Pos2::new(adjust + pix.x, line_h),
                )
            }
            PixmapPosition::Right => {
                let pix_min = Pos2::new(bar.right() - pix.x - adjust / 2.0, bar.top() + adjust);
                pixmap_rect = Some(Rect::from_min_size(pix_min, pix));
                (
                    Pos2::new(justified(-pix.x / 2.0, bar.left() + adjust, pix.x), adjust),
                    Pos2::new(adjust, adjust + line_h),
                )
            }
            PixmapPosition::Top => {
                let pix_rect = Rect::from_min_size(Pos2::new(cx - pix.x / 2.0, adjust), pix);
                pixmap_rect = Some(pix_rect);
                let title_y = pix_rect.bottom();
                (
                    Pos2::new(justified(0.0, bar.left() + adjust, 0.0), title_y),
                    Pos2::new(adjust, title_y + line_h),
                )
            }
            PixmapPosition::Center => {
                let pix_rect = Rect::from_min_size(Pos2::new(cx - pix.x / 2.0, adjust + line_h), pix);
                pixmap_rect = Some(pix_rect);
                (
                    Pos2::new(justified(0.0, bar.left() + adjust, 0.0), adjust),
                    Pos2::new(adjust, pix_rect.bottom()),
                )
            }
            PixmapPosition::Bottom => {
                let detail_pos = Pos2::new(adjust, adjust + line_h);
                pixmap_rect = Some(Rect::from_min_size(
                    Pos2::new(cx - pix.x / 2.0, detail_pos.y + detail_h),
                    pix,
                ));
                (
                    Pos2::new(justified(0.0, bar.left() + adjust, 0.0), adjust),
                    detail_pos,
                )
            }
        };

        self.layout.title_bar = Some(bar);
        self.layout.title_text = shown;
        self.layout.title_pos = title_pos;
        self.layout.pixmap_rect = pixmap_rect;
        if detail_in_title {
            self.layout.detail_rect = Some(Rect::from_min_size(detail_pos, Vec2::new(text_budget, detail_h)));
            self.layout.detail_lines = self.detail.lines(text_budget);
        } else {
            self.layout.detail_rect = None;
            self.layout.detail_lines.clear();
        }
    }

    fn layout_standard(&mut self) {
        self.resize_title_bar(false);
        let bar = self.layout.title_bar.unwrap_or(Rect::ZERO);
        let title_w = bar.width();

        // Horizontal budgets
        let inline = self.inline_sockets;
        let width_pct = self.inline_width_percentage;
        let gap_pct = self.inline_gap_percentage;
        let max_length = |socket: &Socket| {
            (title_w - socket.shape_size() - 2.0 * socket.font().space_width()).floor()
        };
        for socket in &mut self.inputs {
            let max = max_length(socket);
            let width = if inline {
                (max * width_pct.clamp(0.0, 1.0)).round()
            } else {
                max
            };
            socket.rebuild(width);
        }
        for socket in &mut self.outputs {
            let max = max_length(socket);
            let width = if inline {
                (max - (max * width_pct).round() - (max * gap_pct).round()).max(0.0)
            } else {
                max
            };
            socket.rebuild(width);
        }

        // Vertical extent
        let buffer = self.socket_buffer;
        let stack = |sockets: &[Socket]| sockets.iter().map(|s| s.height() + buffer).sum::<f32>();
        let (in_h, out_h) = (stack(&self.inputs), stack(&self.outputs));
        let mut height = bar.height() + if inline { in_h.max(out_h) } else { in_h + out_h };

        // Body text sits right under the title bar, above the sockets
        let mut body = bar;
        if self.body_detail.visible {
            let text_h = self.body_detail.size(title_w).y;
            self.layout.body_detail_rect = Some(Rect::from_min_size(body.left_bottom(), Vec2::new(title_w, text_h)));
            self.layout.body_detail_lines = self.body_detail.lines(title_w);
            body.max.y += text_h;
            height += text_h;
            self.layout.divider = Some([body.left_bottom(), body.right_bottom()]);
            body.max.y += self.outline.width;
            height += self.outline.width;
        } else {
            self.layout.body_detail_rect = None;
            self.layout.body_detail_lines.clear();
            self.layout.divider = None;
        }

        let mut in_start = body.left_bottom();
        let mut out_start = body.right_bottom();
        self.layout.polygon = Rect::from_min_size(Pos2::ZERO, Vec2::new(title_w, height + 5.0));

        for socket in &mut self.outputs {
            let step = socket.height() + buffer;
            if !inline {
                in_start.y += step;
            }
            out_start.y += step;
            let x_shift = if socket.is_full_line() {
                0.0
            } else {
                socket.shape_size() / 2.0
            };
            socket.set_pos(out_start - Vec2::new(x_shift, socket.height()));
        }
        for socket in &mut self.inputs {
            in_start.y += socket.height() + buffer;
            let x_shift = if socket.is_full_line() {
                0.0
            } else {
                -socket.shape_size() / 2.0
            };
            socket.set_pos(in_start + Vec2::new(x_shift, -socket.height()));
        }

        self.update_bounding_rect();
    }

    /// Recompute the bounding rectangle from the polygon, socket overflow,
    /// title bar and drop shadow.
    pub fn update_bounding_rect(&mut self) {
        if let NodeKind::Simple { .. } = self.kind {
            self.update_simple_bounding_rect();
            return;
        }
        let polygon = self.layout.polygon;
        let pen = self.outline.width;
        let overflow = |sockets: &[Socket]| {
            sockets
                .iter()
                .filter(|s| !s.is_full_line())
                .map(|s| s.shape_size() / 2.0)
                .fold(pen / 2.0, f32::max)
        };
        let left = overflow(&self.inputs);
        let right = overflow(&self.outputs);

        let mut rect = adjusted(polygon, left, pen / 2.0, right, pen / 2.0);
        if let Some(bar) = self.layout.title_bar {
            rect = rect.union(bar);
        }
        if self.drop_shadow {
            rect = rect.union(polygon.translate(DROP_SHADOW_OFFSET));
        }
        self.layout.bounding = rect;
    }
}
