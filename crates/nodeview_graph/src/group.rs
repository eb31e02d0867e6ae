// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node groups: a titled frame around a set of member nodes.
//!
//! Groups track members by id and never own them. The frame is recomputed
//! from member bounds by the canvas whenever a member changes, and moving the
//! group moves every member by the same delta.

use crate::error::StyleError;
use crate::geometry::ItemShape;
use crate::node::{NodeId, TitleJustify};
use crate::paint::{PaintSurface, SceneItem};
use crate::style::{PropertyValue, Styleable};
use crate::text::{ElideMode, Font};
use crate::zorder::GROUP_Z;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Padding between member bounds and the frame
const FRAME_PADDING: f32 = 3.0;

/// Extra height of the title strip above the font height
const TITLE_PADDING: f32 = 6.0;

/// Unique identifier for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Create a new random group ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// A titled frame around member nodes
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGroup {
    id: GroupId,
    instance_name: String,
    members: Vec<NodeId>,
    pos: Pos2,
    main_rect: Rect,
    top_corner: Pos2,
    selected: bool,
    title: String,
    title_font: Font,
    title_color: Color32,
    title_justify: TitleJustify,
    elide: ElideMode,
    outline: Stroke,
    selected_outline: Stroke,
    background: Color32,
    selected_background: Color32,
    title_background: Color32,
    title_selected_background: Color32,
}

impl NodeGroup {
    /// An empty group titled "Title"
    pub fn new(id: GroupId) -> Self {
        let background = Color32::from_rgb(200, 255, 200);
        let title_background = crate::node::darker(background, 125);
        Self {
            id,
            instance_name: String::new(),
            members: Vec::new(),
            pos: Pos2::ZERO,
            main_rect: Rect::from_min_size(Pos2::ZERO, Vec2::splat(100.0)),
            top_corner: Pos2::ZERO,
            selected: false,
            title: "Title".to_string(),
            title_font: Font::default(),
            title_color: Color32::BLACK,
            title_justify: TitleJustify::Center,
            elide: ElideMode::None,
            outline: Stroke::new(3.0, Color32::BLACK),
            selected_outline: Stroke::new(3.0, Color32::DARK_GRAY),
            background,
            selected_background: background,
            title_background,
            title_selected_background: title_background,
        }
    }

    /// Group ID
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Member node ids in insertion order
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Number of members
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether `node` is a member
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    pub(crate) fn add_member(&mut self, node: NodeId) -> bool {
        if self.contains_node(node) {
            return false;
        }
        self.members.push(node);
        true
    }

    pub(crate) fn remove_member(&mut self, node: NodeId) -> bool {
        let before = self.members.len();
        self.members.retain(|n| *n != node);
        before != self.members.len()
    }

    /// Group origin in the scene
    pub fn pos(&self) -> Pos2 {
        self.pos
    }

    /// Move the origin without touching members.
    ///
    /// Returns the delta that members must be moved by.
    pub(crate) fn set_pos(&mut self, pos: Pos2) -> Vec2 {
        let delta = pos - self.pos;
        self.pos = pos;
        delta
    }

    /// Member area in group-local coordinates
    pub fn main_rect(&self) -> Rect {
        self.main_rect
    }

    fn title_strip_height(&self) -> f32 {
        self.title_font.height() + TITLE_PADDING
    }

    /// Recompute the frame from member bounds given in scene coordinates
    pub(crate) fn update_area(&mut self, member_bounds: &[Rect]) {
        let offset = self.pos.to_vec2();
        let mut working = member_bounds
            .iter()
            .map(|r| r.translate(-offset))
            .fold(Rect::NOTHING, Rect::union);
        if member_bounds.is_empty() {
            working = Rect::from_min_size(self.top_corner, Vec2::ZERO);
        } else if working.width() > 0.0 {
            self.top_corner = working.left_top();
        }

        if self.elide == ElideMode::None {
            let text_w = self.title_font.text_width(&self.title);
            let diff = text_w - working.width();
            if diff > 0.0 {
                let half = (diff / 2.0).round();
                working.min.x -= half;
                working.max.x += half;
            }
        }
        self.main_rect = working.expand(FRAME_PADDING);
    }

    fn has_area(&self) -> bool {
        self.main_rect.width() > 0.0
    }

    fn title_strip(&self) -> Rect {
        let h = self.title_strip_height();
        if self.has_area() {
            Rect::from_min_size(
                Pos2::new(self.main_rect.left(), self.main_rect.top() - h),
                Vec2::new(self.main_rect.width(), h),
            )
        } else {
            Rect::from_min_size(self.top_corner - Vec2::new(0.0, h), Vec2::new(50.0, h))
        }
    }

    fn body_rect(&self) -> Rect {
        if self.has_area() {
            self.main_rect
        } else {
            Rect::from_min_size(self.top_corner, Vec2::splat(50.0))
        }
    }

    /// Bounding rectangle, group-local
    pub fn local_bounds(&self) -> Rect {
        self.title_strip().union(self.body_rect())
    }

    /// Whether the group is selected
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Title text
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title text; the canvas refreshes the area afterwards
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Title font
    pub fn title_font(&self) -> &Font {
        &self.title_font
    }

    /// Set the title font
    pub fn set_title_font(&mut self, font: Font) {
        self.title_font = font;
    }

    /// Title justification
    pub fn title_justify(&self) -> TitleJustify {
        self.title_justify
    }

    /// Set the title justification
    pub fn set_title_justify(&mut self, justify: TitleJustify) {
        self.title_justify = justify;
    }

    /// Title elision; `None` widens the frame to fit the title
    pub fn elided_title(&self) -> ElideMode {
        self.elide
    }

    /// Set the title elision
    pub fn set_elided_title(&mut self, mode: ElideMode) {
        self.elide = mode;
    }

    /// Body fill
    pub fn background(&self) -> Color32 {
        self.background
    }

    /// Set the body fill
    pub fn set_background(&mut self, color: Color32) {
        self.background = color;
    }

    /// Outline while unselected
    pub fn outline_pen(&self) -> Stroke {
        self.outline
    }

    /// Set the outline
    pub fn set_outline_pen(&mut self, pen: Stroke) {
        self.outline = pen;
    }

    /// Instance name used in style keys
    pub fn name(&self) -> &str {
        &self.instance_name
    }

    /// Set the instance name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.instance_name = name.into();
    }

    fn displayed_title(&self) -> (String, f32) {
        let budget = if self.has_area() {
            self.main_rect.width() - 2.0 * FRAME_PADDING
        } else {
            50.0
        };
        let shown = self.title_font.elided_text(&self.title, self.elide, budget);
        let width = self.title_font.text_width(&shown);
        (shown, width)
    }
}

impl SceneItem for NodeGroup {
    fn bounding_rect(&self) -> Rect {
        self.local_bounds().translate(self.pos.to_vec2())
    }

    /// Only the title strip hit-tests, so members stay clickable
    fn shape(&self) -> ItemShape {
        ItemShape::RoundedRect {
            rect: self.title_strip().translate(self.pos.to_vec2()),
            radii: Vec2::ZERO,
        }
    }

    fn z_value(&self) -> i32 {
        GROUP_Z
    }

    fn paint(&self, surface: &mut dyn PaintSurface) {
        let offset = self.pos.to_vec2();
        let strip = self.title_strip().translate(offset);
        let (pen, title_fill, body_fill) = if self.selected {
            (self.selected_outline, self.title_selected_background, self.selected_background)
        } else {
            (self.outline, self.title_background, self.background)
        };
        surface.rect(strip, Vec2::ZERO, title_fill, pen);

        let body = self.body_rect().translate(offset);
        surface.rect(body, Vec2::ZERO, body_fill, pen);

        let (shown, width) = self.displayed_title();
        let left = match self.title_justify {
            TitleJustify::Left => FRAME_PADDING,
            TitleJustify::Center => strip.width() / 2.0 + FRAME_PADDING - width / 2.0,
            TitleJustify::Right => strip.width() - width - FRAME_PADDING,
        };
        let pos = Pos2::new(strip.left() + left, strip.top() + FRAME_PADDING);
        surface.text(pos, &shown, &self.title_font, self.title_color);
    }
}

impl Styleable for NodeGroup {
    fn type_name(&self) -> &'static str {
        "NodeGroup"
    }

    fn instance_name(&self) -> &str {
        &self.instance_name
    }

    fn property_names(&self) -> &'static [&'static str] {
        &[
            "title",
            "title_font",
            "title_color",
            "title_justify",
            "outline",
            "selected_outline",
            "background",
            "selected_background",
            "title_bar_background",
            "title_bar_selected_background",
        ]
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        Some(match name {
            "title" => PropertyValue::Text(self.title.clone()),
            "title_font" => PropertyValue::Font(self.title_font.clone()),
            "title_color" => PropertyValue::Color(self.title_color),
            "title_justify" => PropertyValue::Text(self.title_justify.name().to_string()),
            "outline" => PropertyValue::Stroke(self.outline),
            "selected_outline" => PropertyValue::Stroke(self.selected_outline),
            "background" => PropertyValue::Color(self.background),
            "selected_background" => PropertyValue::Color(self.selected_background),
            "title_bar_background" => PropertyValue::Color(self.title_background),
            "title_bar_selected_background" => PropertyValue::Color(self.title_selected_background),
            _ => return None,
        })
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), StyleError> {
        match name {
            "title" => self.title = value.as_text(name)?,
            "title_font" => self.title_font = value.as_font(name)?,
            "title_color" => self.title_color = value.as_color(name)?,
            "title_justify" => {
                self.title_justify = TitleJustify::from_name(&value.as_text(name)?).ok_or(
                    StyleError::TypeMismatch {
                        property: name.to_string(),
                        expected: "left, right or center",
                    },
                )?;
            }
            "outline" => self.outline = value.as_stroke(name)?,
            "selected_outline" => self.selected_outline = value.as_stroke(name)?,
            "background" => self.background = value.as_color(name)?,
            "selected_background" => self.selected_background = value.as_color(name)?,
            "title_bar_background" => self.title_background = value.as_color(name)?,
            "title_bar_selected_background" => {
                self.title_selected_background = value.as_color(name)?;
            }
            _ => return Err(StyleError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let group = NodeGroup::new(GroupId::new());
        assert_eq!(group.title(), "Title");
        assert_eq!(group.z_value(), i32::MIN);
        assert_eq!(group.main_rect(), Rect::from_min_size(Pos2::ZERO, Vec2::splat(100.0)));
    }

    #[test]
    fn test_update_area_pads_union() {
        let mut group = NodeGroup::new(GroupId::new());
        group.set_title("");
        let a = Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(100.0, 50.0));
        let b = Rect::from_min_size(Pos2::new(200.0, 80.0), Vec2::new(100.0, 50.0));
        group.update_area(&[a, b]);
        assert_eq!(
            group.main_rect(),
            Rect::from_min_max(Pos2::new(7.0, 7.0), Pos2::new(303.0, 133.0))
        );
    }

    #[test]
    fn test_wide_title_widens_frame() {
        let mut group = NodeGroup::new(GroupId::new());
        group.set_title("A group title much wider than its single small member");
        let member = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(20.0, 20.0));
        group.update_area(&[member]);
        let text_w = group.title_font().text_width(group.title());
        assert!(group.main_rect().width() >= text_w);
        assert!((group.main_rect().center().x - member.center().x).abs() <= 1.0);

        group.set_elided_title(ElideMode::Right);
        group.update_area(&[member]);
        assert_eq!(group.main_rect().width(), 26.0);
    }

    #[test]
    fn test_member_bounds_are_group_local() {
        let mut group = NodeGroup::new(GroupId::new());
        group.set_title("");
        group.set_pos(Pos2::new(100.0, 100.0));
        let member = Rect::from_min_size(Pos2::new(110.0, 110.0), Vec2::splat(10.0));
        group.update_area(&[member]);
        assert_eq!(group.main_rect().min, Pos2::new(7.0, 7.0));
        assert_eq!(group.bounding_rect().min.x, 107.0);
    }

    #[test]
    fn test_shape_is_title_strip() {
        let mut group = NodeGroup::new(GroupId::new());
        let member = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::splat(100.0));
        group.update_area(&[member]);
        assert!(group.contains(Pos2::new(50.0, -5.0)));
        assert!(!group.contains(Pos2::new(50.0, 50.0)));
        assert!(group.bounding_rect().top() < group.main_rect().top());
    }

    #[test]
    fn test_membership() {
        let mut group = NodeGroup::new(GroupId::new());
        let n = NodeId::new();
        assert!(group.add_member(n));
        assert!(!group.add_member(n));
        assert!(group.remove_member(n));
        assert!(!group.remove_member(n));
        assert_eq!(group.member_count(), 0);
    }

    #[test]
    fn test_set_pos_returns_delta() {
        let mut group = NodeGroup::new(GroupId::new());
        assert_eq!(group.set_pos(Pos2::new(5.0, 5.0)), Vec2::new(5.0, 5.0));
        assert_eq!(group.set_pos(Pos2::new(2.0, 9.0)), Vec2::new(-3.0, 4.0));
    }
}
