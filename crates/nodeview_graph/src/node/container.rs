// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collapsible content area with a title strip and an expand/collapse button.

use crate::paint::PaintSurface;
use crate::text::{ElideMode, Font, TextBlock};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use serde::{Deserialize, Serialize};

/// Side length of the expand/collapse button
pub const BUTTON_SIZE: f32 = 9.0;

/// Gap between button and label
const BUTTON_SPACING: f32 = 3.0;

/// Which end of the title strip carries the button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ButtonPosition {
    /// Button before the label
    Left,
    /// Button after the label
    #[default]
    Right,
}

/// Placement of the label within the title strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TitleLocation {
    /// Flush left
    #[default]
    Left,
    /// Flush right
    Right,
    /// Centred
    Center,
}

/// Geometry of the container, relative to its own origin
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLayout {
    /// Label as displayed, after elision
    pub label_text: String,
    /// Top-left of the label
    pub label_pos: Pos2,
    /// The expand/collapse button
    pub button_rect: Rect,
    /// Content text rectangle when expanded
    pub content_rect: Option<Rect>,
    /// Wrapped content lines
    pub content_lines: Vec<String>,
    /// Title strip plus content
    pub bounds: Rect,
}

impl Default for ContainerLayout {
    fn default() -> Self {
        Self {
            label_text: String::new(),
            label_pos: Pos2::ZERO,
            button_rect: Rect::ZERO,
            content_rect: None,
            content_lines: Vec::new(),
            bounds: Rect::ZERO,
        }
    }
}

/// A titled area whose content can be shown or hidden
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandableContainer {
    /// Title label
    pub label: String,
    /// Label font
    pub font: Font,
    /// Label colour
    pub title_color: Color32,
    /// Button placement
    pub button: ButtonPosition,
    /// Label placement
    pub title_location: TitleLocation,
    /// Contained text; always visible while expanded
    pub content: TextBlock,
    expanded: bool,
    pos: Pos2,
    width: f32,
    left_adjust: f32,
    content_width: f32,
    layout: ContainerLayout,
}

impl Default for ExpandableContainer {
    fn default() -> Self {
        Self {
            label: String::new(),
            font: Font::default(),
            title_color: Color32::BLACK,
            button: ButtonPosition::Right,
            title_location: TitleLocation::Left,
            content: TextBlock {
                visible: true,
                ..Default::default()
            },
            expanded: true,
            pos: Pos2::ZERO,
            width: 5000.0,
            left_adjust: 0.0,
            content_width: 5000.0,
            layout: ContainerLayout::default(),
        }
    }
}

impl ExpandableContainer {
    /// Whether the content is shown
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Show or hide the content
    pub fn expand_area(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Flip between expanded and collapsed
    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    /// Height of the title strip
    pub fn title_height(&self) -> f32 {
        self.font.height().max(BUTTON_SIZE)
    }

    /// Position in node-local coordinates
    pub fn pos(&self) -> Pos2 {
        self.pos
    }

    /// Current geometry
    pub fn layout(&self) -> &ContainerLayout {
        &self.layout
    }

    /// Title strip plus content, node-local
    pub fn bounds_in_node(&self) -> Rect {
        self.layout.bounds.translate(self.pos.to_vec2())
    }

    /// Whether a node-local point hits the title strip
    pub fn title_hit(&self, local: Pos2) -> bool {
        let strip = Rect::from_min_size(self.pos, Vec2::new(self.width, self.title_height()));
        strip.contains(local)
    }

    /// Place and size the container, then lay it out
    pub(super) fn place(&mut self, pos: Pos2, width: f32, left_adjust: f32, content_width: f32) {
        self.pos = pos;
        self.width = width.max(0.0);
        self.left_adjust = left_adjust;
        self.content_width = content_width.max(1.0);
        self.update();
    }

    fn update(&mut self) {
        let width = self.width;
        let title_h = self.title_height();
        let label = self.font.elided_text(&self.label, ElideMode::Right, width - 20.0);
        let label_w = self.font.text_width(&label);

        let (label_x, button_x) = match self.button {
            ButtonPosition::Right => {
                let room = width - BUTTON_SIZE - BUTTON_SPACING - label_w;
                let x = match self.title_location {
                    TitleLocation::Left => 0.0,
                    TitleLocation::Right => room,
                    TitleLocation::Center => room / 2.0,
                };
                (x, width - BUTTON_SIZE)
            }
            ButtonPosition::Left => {
                let x = match self.title_location {
                    TitleLocation::Left => BUTTON_SIZE + BUTTON_SPACING,
                    TitleLocation::Right => width - label_w,
                    TitleLocation::Center => {
                        (width - label_w - BUTTON_SIZE - BUTTON_SPACING) / 2.0 + BUTTON_SIZE - BUTTON_SPACING
                    }
                };
                (x, 0.0)
            }
        };

        let (content_rect, content_lines) = if self.expanded && !self.content.text.is_empty() {
            let size = self.content.size(self.content_width);
            let rect = Rect::from_min_size(Pos2::new(self.left_adjust, title_h), size);
            (Some(rect), self.content.lines(self.content_width))
        } else {
            (None, Vec::new())
        };

        let content_h = content_rect.map_or(0.0, |r| r.height());
        self.layout = ContainerLayout {
            label_text: label,
            label_pos: Pos2::new(label_x, 0.0),
            button_rect: Rect::from_min_size(Pos2::new(button_x, 0.0), Vec2::splat(BUTTON_SIZE)),
            content_rect,
            content_lines,
            bounds: Rect::from_min_size(Pos2::ZERO, Vec2::new(width, title_h + content_h)),
        };
    }

    /// Draw the label, the button and the content at `offset` + position
    pub(crate) fn paint(&self, surface: &mut dyn PaintSurface, offset: Vec2, stroke: Stroke) {
        let origin = self.pos.to_vec2() + offset;
        let layout = &self.layout;
        if !layout.label_text.is_empty() {
            surface.text(layout.label_pos + origin, &layout.label_text, &self.font, self.title_color);
        }

        let button = layout.button_rect.translate(origin);
        let pen = Stroke::new(1.0, stroke.color);
        surface.rect(button, Vec2::ZERO, Color32::TRANSPARENT, pen);
        let mid = button.center();
        let inset = BUTTON_SIZE / 2.0 - 2.0;
        surface.line(mid - Vec2::new(inset, 0.0), mid + Vec2::new(inset, 0.0), pen);
        if !self.expanded {
            surface.line(mid - Vec2::new(0.0, inset), mid + Vec2::new(0.0, inset), pen);
        }

        if let Some(rect) = layout.content_rect {
            let line_h = self.content.font.height();
            for (i, line) in layout.content_lines.iter().enumerate() {
                let pos = rect.min + origin + Vec2::new(0.0, i as f32 * line_h);
                surface.text(pos, line, &self.content.font, self.content.color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(text: &str) -> ExpandableContainer {
        let mut c = ExpandableContainer {
            label: "Details".to_string(),
            ..Default::default()
        };
        c.content.text = text.to_string();
        c.place(Pos2::new(6.0, 30.0), 200.0, 10.0, 150.0);
        c
    }

    #[test]
    fn test_defaults() {
        let c = ExpandableContainer::default();
        assert!(c.is_expanded());
        assert_eq!(c.button, ButtonPosition::Right);
        assert_eq!(c.title_location, TitleLocation::Left);
        assert!(c.title_height() >= BUTTON_SIZE);
    }

    #[test]
    fn test_collapse_hides_content() {
        let mut c = container("Line of content");
        let open = c.layout().bounds.height();
        assert!(c.layout().content_rect.is_some());
        c.toggle();
        c.update();
        assert!(c.layout().content_rect.is_none());
        assert_eq!(c.layout().bounds.height(), c.title_height());
        assert!(open > c.title_height());
    }

    #[test]
    fn test_button_positions() {
        let mut c = container("");
        assert_eq!(c.layout().button_rect.left(), 200.0 - BUTTON_SIZE);
        assert_eq!(c.layout().label_pos.x, 0.0);
        c.button = ButtonPosition::Left;
        c.update();
        assert_eq!(c.layout().button_rect.left(), 0.0);
        assert_eq!(c.layout().label_pos.x, BUTTON_SIZE + 3.0);
    }

    #[test]
    fn test_title_hit() {
        let c = container("");
        assert!(c.title_hit(Pos2::new(10.0, 32.0)));
        assert!(!c.title_hit(Pos2::new(10.0, 10.0)));
    }
}
