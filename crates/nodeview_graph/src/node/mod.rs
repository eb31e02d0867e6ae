// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes: titled containers of input and output sockets.
//!
//! Every change that affects size ends in [`Node::resize_node`], the layout
//! pass that places the title bar, sockets and detail text and recomputes the
//! polygon and bounding rectangle. The canvas reroutes connections after each
//! node mutation it performs.

mod container;
mod layout;
mod side_socket;
mod simple;

pub use container::{ButtonPosition, ContainerLayout, ExpandableContainer, TitleLocation};
pub use layout::NodeLayout;

use crate::error::{SceneError, StyleError};
use crate::geometry::ItemShape;
use crate::paint::{PaintSurface, PlacedSocket, SceneItem};
use crate::socket::{LabelPosition, Socket, SocketId, SocketKind, SocketType};
use crate::style::{PropertyValue, Styleable};
use crate::text::{ElideMode, Font, TextBlock};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offset of the drop shadow from the node body
pub const DROP_SHADOW_OFFSET: Vec2 = Vec2::new(8.0, 8.0);

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the title-bar image sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixmapPosition {
    /// No image
    #[default]
    None,
    /// Left of the title
    Left,
    /// Right of the title
    Right,
    /// Above the title
    Top,
    /// Between title and detail text
    Center,
    /// Below the detail text
    Bottom,
}

/// Horizontal placement of a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TitleJustify {
    /// Flush left
    Left,
    /// Flush right
    Right,
    /// Centred
    #[default]
    Center,
}

impl TitleJustify {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" => Some(Self::Center),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

/// An externally loaded image, referenced by key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pixmap {
    /// Lookup key for the painting backend
    pub key: String,
    /// Image size in scene units
    pub size: Vec2,
}

/// Layout variant of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Title bar, detail texts and labelled sockets
    Standard,
    /// No title bar; textless sockets in rows above and below a title
    Simple {
        /// Lower bound on the body height
        min_height: f32,
    },
    /// Title bar with textless side sockets around a collapsible area
    SideSocket(ExpandableContainer),
}

/// A titled container of ordered input and output sockets
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    instance_name: String,
    pos: Pos2,
    z: i32,
    selected: bool,
    modifying: bool,
    restyle_pending: bool,

    title: String,
    title_font: Font,
    title_color: Color32,
    title_justify: TitleJustify,
    elide: ElideMode,
    pixmap: Option<Pixmap>,
    pixmap_enabled: bool,
    pixmap_position: PixmapPosition,
    detail: TextBlock,
    body_detail: TextBlock,

    min_width: f32,
    corner_radii: Vec2,
    outline: Stroke,
    selected_outline: Stroke,
    background: Color32,
    selected_background: Color32,
    title_background: Color32,
    title_selected_background: Color32,
    drop_shadow: bool,

    socket_buffer: f32,
    inline_sockets: bool,
    inline_width_percentage: f32,
    inline_gap_percentage: f32,

    inputs: Vec<Socket>,
    outputs: Vec<Socket>,
    next_socket: u32,

    layout: NodeLayout,
}

impl Node {
    /// A standard node titled "Node"
    pub fn new(id: NodeId) -> Self {
        Self::with_kind(id, NodeKind::Standard)
    }

    /// A node without a title bar
    pub fn new_simple(id: NodeId) -> Self {
        Self::with_kind(id, NodeKind::Simple { min_height: 0.0 })
    }

    /// A node with side sockets and a collapsible detail area
    pub fn new_side_socket(id: NodeId) -> Self {
        Self::with_kind(id, NodeKind::SideSocket(ExpandableContainer::default()))
    }

    /// A node of the given variant, laid out once
    pub fn with_kind(id: NodeId, kind: NodeKind) -> Self {
        let background = Color32::from_rgb(200, 255, 200);
        let title_background = darker(background, 125);
        let mut node = Self {
            id,
            kind,
            instance_name: String::new(),
            pos: Pos2::ZERO,
            z: 0,
            selected: false,
            modifying: false,
            restyle_pending: true,
            title: "Node".to_string(),
            title_font: Font::bold(12.0),
            title_color: Color32::BLACK,
            title_justify: TitleJustify::Center,
            elide: ElideMode::None,
            pixmap: None,
            pixmap_enabled: false,
            pixmap_position: PixmapPosition::None,
            detail: TextBlock::default(),
            body_detail: TextBlock::default(),
            min_width: 150.0,
            corner_radii: Vec2::splat(5.0),
            outline: Stroke::new(3.0, Color32::BLACK),
            selected_outline: Stroke::new(3.0, Color32::DARK_GRAY),
            background,
            selected_background: background,
            title_background,
            title_selected_background: title_background,
            drop_shadow: true,
            socket_buffer: 2.0,
            inline_sockets: true,
            inline_width_percentage: 0.475,
            inline_gap_percentage: 0.05,
            inputs: Vec::new(),
            outputs: Vec::new(),
            next_socket: 0,
            layout: NodeLayout::default(),
        };
        if let NodeKind::Simple { .. } = node.kind {
            node.layout.polygon = Rect::from_min_size(Pos2::ZERO, Vec2::splat(10.0));
        }
        node.resize_node();
        node
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Layout variant
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Position of the node origin in the scene
    pub fn pos(&self) -> Pos2 {
        self.pos
    }

    /// Move the node origin
    pub fn set_pos(&mut self, pos: Pos2) {
        self.pos = pos;
    }

    /// Instance name used in style keys
    pub fn name(&self) -> &str {
        &self.instance_name
    }

    /// Set the instance name and request a restyle
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.instance_name = name.into();
        self.restyle_pending = true;
    }

    /// Clear and return the restyle request
    pub(crate) fn take_restyle(&mut self) -> bool {
        std::mem::take(&mut self.restyle_pending)
    }

    /// Whether the node is selected
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_z_value(&mut self, z: i32) {
        self.z = z;
    }

    // ---- scoped update -------------------------------------------------

    /// Suspend layout until [`Node::end_modify_node`]. Does not nest.
    pub fn begin_modify_node(&mut self) {
        self.modifying = true;
    }

    /// Resume layout and run exactly one pass
    pub fn end_modify_node(&mut self) {
        self.modifying = false;
        self.resize_node();
    }

    /// Whether layout is suspended
    pub fn is_modifying(&self) -> bool {
        self.modifying
    }

    // ---- derived geometry ----------------------------------------------

    /// Result of the last layout pass
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Body rectangle, node-local
    pub fn polygon(&self) -> Rect {
        self.layout.polygon
    }

    /// Bounding rectangle, node-local
    pub fn local_bounds(&self) -> Rect {
        self.layout.bounding
    }

    /// Title bar rectangle, node-local; `None` for simple nodes
    pub fn title_bar_rect(&self) -> Option<Rect> {
        self.layout.title_bar
    }

    // ---- sockets -------------------------------------------------------

    fn next_socket_id(&mut self) -> SocketId {
        let id = SocketId {
            node: self.id,
            local: self.next_socket,
        };
        self.next_socket += 1;
        id
    }

    fn push_socket(&mut self, socket_type: SocketType, kind: SocketKind, label: &str) -> usize {
        let kind = match self.kind {
            NodeKind::Standard => kind,
            NodeKind::Simple { .. } | NodeKind::SideSocket(_) => SocketKind::Textless,
        };
        let id = self.next_socket_id();
        let socket = Socket::new(id, socket_type, kind, label);
        let list = match socket_type {
            SocketType::Output => &mut self.outputs,
            _ => &mut self.inputs,
        };
        list.push(socket);
        let index = list.len() - 1;
        self.restyle_pending = true;
        self.resize_node();
        index
    }

    /// Append an input socket; returns its index
    pub fn add_input_socket(&mut self) -> usize {
        self.push_socket(SocketType::Input, SocketKind::Standard, "Input")
    }

    /// Append an output socket; returns its index
    pub fn add_output_socket(&mut self) -> usize {
        self.push_socket(SocketType::Output, SocketKind::Standard, "Output")
    }

    /// Append a full-row input socket; returns its index
    pub fn add_input_full_line_socket(&mut self) -> usize {
        let kind = SocketKind::FullLine {
            label_pos: LabelPosition::Left,
        };
        self.push_socket(SocketType::Input, kind, "Input")
    }

    /// Append a full-row output socket; returns its index
    pub fn add_output_full_line_socket(&mut self) -> usize {
        let kind = SocketKind::FullLine {
            label_pos: LabelPosition::Right,
        };
        self.push_socket(SocketType::Output, kind, "Output")
    }

    /// Append an input socket hosting a widget of `size`; returns its index
    pub fn add_input_widget_socket(&mut self, size: Vec2) -> usize {
        self.push_socket(SocketType::Input, SocketKind::Widget { size }, "Input")
    }

    /// Append an output socket hosting a widget of `size`; returns its index
    pub fn add_output_widget_socket(&mut self, size: Vec2) -> usize {
        self.push_socket(SocketType::Output, SocketKind::Widget { size }, "Output")
    }

    /// Remove an input socket. Its connections must be destroyed by the caller.
    pub(crate) fn remove_input_socket(&mut self, index: usize) -> Result<Socket, SceneError> {
        check_index(index, self.inputs.len())?;
        let socket = self.inputs.remove(index);
        self.resize_node();
        Ok(socket)
    }

    /// Remove an output socket. Its connections must be destroyed by the caller.
    pub(crate) fn remove_output_socket(&mut self, index: usize) -> Result<Socket, SceneError> {
        check_index(index, self.outputs.len())?;
        let socket = self.outputs.remove(index);
        self.resize_node();
        Ok(socket)
    }

    /// Number of input sockets
    pub fn input_socket_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output sockets
    pub fn output_socket_count(&self) -> usize {
        self.outputs.len()
    }

    /// Input sockets in order
    pub fn input_sockets(&self) -> &[Socket] {
        &self.inputs
    }

    /// Output sockets in order
    pub fn output_sockets(&self) -> &[Socket] {
        &self.outputs
    }

    /// Input socket at `index`
    pub fn input_socket(&self, index: usize) -> Result<&Socket, SceneError> {
        check_index(index, self.inputs.len())?;
        Ok(&self.inputs[index])
    }

    /// Output socket at `index`
    pub fn output_socket(&self, index: usize) -> Result<&Socket, SceneError> {
        check_index(index, self.outputs.len())?;
        Ok(&self.outputs[index])
    }

    /// Change an input socket, then relayout; a rename requests a restyle
    pub fn update_input_socket<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Socket) -> R,
    ) -> Result<R, SceneError> {
        check_index(index, self.inputs.len())?;
        let socket = &mut self.inputs[index];
        let name = socket.name().to_owned();
        let result = f(socket);
        if socket.name() != name {
            self.restyle_pending = true;
        }
        self.resize_node();
        Ok(result)
    }

    /// Change an output socket, then relayout; a rename requests a restyle
    pub fn update_output_socket<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Socket) -> R,
    ) -> Result<R, SceneError> {
        check_index(index, self.outputs.len())?;
        let socket = &mut self.outputs[index];
        let name = socket.name().to_owned();
        let result = f(socket);
        if socket.name() != name {
            self.restyle_pending = true;
        }
        self.resize_node();
        Ok(result)
    }

    /// Set the label of an input socket
    pub fn set_input_socket_name(&mut self, index: usize, name: &str) -> Result<(), SceneError> {
        self.update_input_socket(index, |s| s.set_label(name))
    }

    /// Set the label of an output socket
    pub fn set_output_socket_name(&mut self, index: usize, name: &str) -> Result<(), SceneError> {
        self.update_output_socket(index, |s| s.set_label(name))
    }

    /// All sockets, inputs first
    pub fn sockets(&self) -> impl Iterator<Item = &Socket> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub(crate) fn sockets_mut(&mut self) -> impl Iterator<Item = &mut Socket> {
        self.inputs.iter_mut().chain(self.outputs.iter_mut())
    }

    /// Socket with the given id
    pub fn socket(&self, id: SocketId) -> Option<&Socket> {
        if id.node != self.id {
            return None;
        }
        self.sockets().find(|s| s.id() == id)
    }

    pub(crate) fn socket_mut(&mut self, id: SocketId) -> Option<&mut Socket> {
        if id.node != self.id {
            return None;
        }
        self.sockets_mut().find(|s| s.id() == id)
    }

    /// Direction and index of a socket within its sequence
    pub fn socket_index(&self, id: SocketId) -> Option<(SocketType, usize)> {
        if let Some(i) = self.inputs.iter().position(|s| s.id() == id) {
            return Some((SocketType::Input, i));
        }
        self.outputs
            .iter()
            .position(|s| s.id() == id)
            .map(|i| (SocketType::Output, i))
    }

    /// Connection anchor of a socket in scene coordinates
    pub fn socket_location(&self, id: SocketId) -> Option<Pos2> {
        self.socket(id)
            .map(|s| self.pos + s.location_in_node().to_vec2())
    }

    /// Sockets paired with the node origin, for painting and hit-testing
    pub fn placed_sockets(&self) -> impl Iterator<Item = PlacedSocket<'_>> {
        let origin = self.pos;
        let z = self.z;
        self.sockets().map(move |socket| PlacedSocket { socket, origin, z })
    }

    // ---- title ---------------------------------------------------------

    /// Full title text
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title text
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.resize_node();
    }

    /// Title font
    pub fn title_font(&self) -> &Font {
        &self.title_font
    }

    /// Set the title font
    pub fn set_title_font(&mut self, font: Font) {
        self.title_font = font;
        self.resize_node();
    }

    /// Title text colour
    pub fn title_color(&self) -> Color32 {
        self.title_color
    }

    /// Set the title text colour
    pub fn set_title_color(&mut self, color: Color32) {
        self.title_color = color;
    }

    /// Title justification
    pub fn title_justify(&self) -> TitleJustify {
        self.title_justify
    }

    /// Set the title justification
    pub fn set_title_justify(&mut self, justify: TitleJustify) {
        self.title_justify = justify;
        self.resize_node();
    }

    /// How the title is shortened to the minimum width
    pub fn elided_title(&self) -> ElideMode {
        self.elide
    }

    /// Set the title elision
    pub fn set_elided_title(&mut self, mode: ElideMode) {
        self.elide = mode;
        self.resize_node();
    }

    // ---- pixmap --------------------------------------------------------

    /// Title-bar image
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Set the title-bar image
    pub fn set_pixmap(&mut self, pixmap: Option<Pixmap>) {
        self.pixmap = pixmap;
        self.resize_node();
    }

    /// Whether the image is shown
    pub fn pixmap_enabled(&self) -> bool {
        self.pixmap_position != PixmapPosition::None && self.pixmap_enabled
    }

    /// Show or hide the image; showing it with no position picks Center
    pub fn set_pixmap_enabled(&mut self, enabled: bool) {
        self.pixmap_enabled = enabled;
        if enabled && self.pixmap_position == PixmapPosition::None {
            self.pixmap_position = PixmapPosition::Center;
        }
        self.resize_node();
    }

    /// Image position
    pub fn pixmap_position(&self) -> PixmapPosition {
        self.pixmap_position
    }

    /// Set the image position
    pub fn set_pixmap_position(&mut self, position: PixmapPosition) {
        self.pixmap_position = position;
        self.resize_node();
    }

    /// Image size when shown, zero otherwise
    pub fn pixmap_size(&self) -> Vec2 {
        match &self.pixmap {
            Some(p) if self.pixmap_enabled() => p.size,
            _ => Vec2::ZERO,
        }
    }

    // ---- detail texts --------------------------------------------------

    /// Detail text below the title; the collapsible area of side-socket nodes
    pub fn detail(&self) -> &TextBlock {
        match &self.kind {
            NodeKind::SideSocket(container) => &container.content,
            _ => &self.detail,
        }
    }

    /// Change the detail text block, then relayout
    pub fn update_detail(&mut self, f: impl FnOnce(&mut TextBlock)) {
        match &mut self.kind {
            NodeKind::SideSocket(container) => f(&mut container.content),
            _ => f(&mut self.detail),
        }
        self.resize_node();
    }

    /// Set the detail text
    pub fn set_detail_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update_detail(|d| d.text = text);
    }

    /// Show or hide the detail text
    pub fn set_detail_text_enabled(&mut self, enabled: bool) {
        self.update_detail(|d| d.visible = enabled);
    }

    /// Set the detail font
    pub fn set_detail_text_font(&mut self, font: Font) {
        self.update_detail(|d| d.font = font);
    }

    /// Set the detail colour
    pub fn set_detail_text_color(&mut self, color: Color32) {
        self.update_detail(|d| d.color = color);
    }

    /// Body text between the title bar and the sockets
    pub fn body_detail(&self) -> &TextBlock {
        &self.body_detail
    }

    /// Change the body text block, then relayout
    pub fn update_body_detail(&mut self, f: impl FnOnce(&mut TextBlock)) {
        f(&mut self.body_detail);
        self.resize_node();
    }

    /// Set the body text
    pub fn set_body_detail_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update_body_detail(|d| d.text = text);
    }

    /// Show or hide the body text
    pub fn set_body_detail_text_enabled(&mut self, enabled: bool) {
        self.update_body_detail(|d| d.visible = enabled);
    }

    // ---- body look -----------------------------------------------------

    /// Lower bound on the width
    pub fn minimum_width(&self) -> f32 {
        self.min_width
    }

    /// Set the lower bound on the width
    pub fn set_minimum_width(&mut self, width: f32) {
        self.min_width = width.max(0.0);
        self.resize_node();
    }

    /// Lower bound on the body height of simple nodes
    pub fn minimum_height(&self) -> Option<f32> {
        match self.kind {
            NodeKind::Simple { min_height } => Some(min_height),
            _ => None,
        }
    }

    /// Set the minimum height of a simple node; other kinds ignore it
    pub fn set_minimum_height(&mut self, height: f32) {
        if let NodeKind::Simple { min_height } = &mut self.kind {
            *min_height = height.max(0.0);
            self.resize_node();
        }
    }

    /// Corner radii of the body
    pub fn corner_radii(&self) -> Vec2 {
        self.corner_radii
    }

    /// Set the horizontal corner radius
    pub fn set_corner_x_radius(&mut self, radius: f32) {
        self.corner_radii.x = radius;
        self.update_bounding_rect();
    }

    /// Set the vertical corner radius
    pub fn set_corner_y_radius(&mut self, radius: f32) {
        self.corner_radii.y = radius;
        self.update_bounding_rect();
    }

    /// Outline while unselected
    pub fn outline_pen(&self) -> Stroke {
        self.outline
    }

    /// Set the outline; its width feeds the title padding
    pub fn set_outline_pen(&mut self, pen: Stroke) {
        self.outline = pen;
        self.resize_node();
    }

    /// Outline while selected
    pub fn selected_pen(&self) -> Stroke {
        self.selected_outline
    }

    /// Set the selected outline
    pub fn set_selected_pen(&mut self, pen: Stroke) {
        self.selected_outline = pen;
    }

    /// Body fill
    pub fn background(&self) -> Color32 {
        self.background
    }

    /// Set the body fill
    pub fn set_background(&mut self, color: Color32) {
        self.background = color;
    }

    /// Body fill while selected
    pub fn selected_background(&self) -> Color32 {
        self.selected_background
    }

    /// Set the selected body fill
    pub fn set_selected_background(&mut self, color: Color32) {
        self.selected_background = color;
    }

    /// Title bar fill
    pub fn title_bar_background(&self) -> Color32 {
        self.title_background
    }

    /// Set the title bar fill
    pub fn set_title_bar_background(&mut self, color: Color32) {
        self.title_background = color;
    }

    /// Title bar fill while selected
    pub fn title_bar_selected_background(&self) -> Color32 {
        self.title_selected_background
    }

    /// Set the selected title bar fill
    pub fn set_title_bar_selected_background(&mut self, color: Color32) {
        self.title_selected_background = color;
    }

    /// Whether a drop shadow is drawn
    pub fn drop_shadow(&self) -> bool {
        self.drop_shadow
    }

    /// Enable or disable the drop shadow
    pub fn set_drop_shadow(&mut self, enabled: bool) {
        self.drop_shadow = enabled;
        self.update_bounding_rect();
    }

    // ---- socket layout knobs -------------------------------------------

    /// Vertical gap between sockets
    pub fn socket_buffer(&self) -> f32 {
        self.socket_buffer
    }

    /// Set the vertical gap between sockets
    pub fn set_socket_buffer(&mut self, buffer: f32) {
        self.socket_buffer = buffer;
        self.resize_node();
    }

    /// Whether inputs and outputs share rows
    pub fn inline_sockets(&self) -> bool {
        self.inline_sockets
    }

    /// Put inputs and outputs side by side, or stack them
    pub fn set_inline_sockets(&mut self, enabled: bool) {
        self.inline_sockets = enabled;
        self.resize_node();
    }

    /// Share of the row width given to input labels
    pub fn inline_text_width_percentage(&self) -> f32 {
        self.inline_width_percentage
    }

    /// Set the input share of the row width
    pub fn set_inline_text_width_percentage(&mut self, percentage: f32) {
        self.inline_width_percentage = percentage;
        self.resize_node();
    }

    /// Share of the row width kept empty between labels
    pub fn inline_text_gap_percentage(&self) -> f32 {
        self.inline_gap_percentage
    }

    /// Set the gap share of the row width
    pub fn set_inline_text_gap_percentage(&mut self, percentage: f32) {
        self.inline_gap_percentage = percentage;
        self.resize_node();
    }

    // ---- side-socket container -----------------------------------------

    /// Collapsible area of a side-socket node
    pub fn container(&self) -> Option<&ExpandableContainer> {
        match &self.kind {
            NodeKind::SideSocket(container) => Some(container),
            _ => None,
        }
    }

    /// Change the collapsible area, then relayout
    pub fn update_container(&mut self, f: impl FnOnce(&mut ExpandableContainer)) -> bool {
        let NodeKind::SideSocket(container) = &mut self.kind else {
            return false;
        };
        f(container);
        self.resize_node();
        true
    }

    /// Show or hide the collapsible area
    pub fn expand_area(&mut self, expanded: bool) {
        self.update_container(|c| c.expand_area(expanded));
    }

    /// Toggle the collapsible area if `scene_pos` hits its title strip
    pub fn click_container(&mut self, scene_pos: Pos2) -> bool {
        let local = scene_pos - self.pos.to_vec2();
        let hit = self
            .container()
            .is_some_and(|c| c.title_hit(local));
        if hit {
            self.update_container(ExpandableContainer::toggle);
        }
        hit
    }

    fn current_outline(&self) -> Stroke {
        if self.selected {
            self.selected_outline
        } else {
            self.outline
        }
    }

    fn paint_text_block(
        surface: &mut dyn PaintSurface,
        block: &TextBlock,
        lines: &[String],
        origin: Pos2,
    ) {
        let line_height = block.font.height();
        for (i, line) in lines.iter().enumerate() {
            let pos = origin + Vec2::new(0.0, i as f32 * line_height);
            surface.text(pos, line, &block.font, block.color);
        }
    }
}

fn check_index(index: usize, len: usize) -> Result<(), SceneError> {
    if index < len {
        Ok(())
    } else {
        Err(SceneError::SocketIndexOutOfRange { index, len })
    }
}

/// Darken `color` by `factor` percent, like dividing its HSV value
pub(crate) fn darker(color: Color32, factor: u32) -> Color32 {
    if factor == 0 {
        return color;
    }
    let mut hsv = egui::ecolor::Hsva::from(color);
    hsv.v = (hsv.v * 100.0 / factor as f32).clamp(0.0, 1.0);
    Color32::from(hsv)
}

impl SceneItem for Node {
    fn bounding_rect(&self) -> Rect {
        self.layout.bounding.translate(self.pos.to_vec2())
    }

    fn shape(&self) -> ItemShape {
        ItemShape::RoundedRect {
            rect: self.layout.polygon.translate(self.pos.to_vec2()),
            radii: self.corner_radii,
        }
    }

    fn z_value(&self) -> i32 {
        self.z
    }

    fn paint(&self, surface: &mut dyn PaintSurface) {
        let offset = self.pos.to_vec2();
        let body = self.layout.polygon.translate(offset);
        let outline = self.current_outline();

        if self.drop_shadow {
            let alpha = (75 * u32::from(self.background.a()) / 255) as u8;
            let shadow = Color32::from_rgba_unmultiplied(0, 0, 0, alpha);
            surface.rect(body.translate(DROP_SHADOW_OFFSET), self.corner_radii, shadow, Stroke::NONE);
        }

        let fill = if self.selected {
            self.selected_background
        } else {
            self.background
        };
        surface.rect(body, self.corner_radii, fill, outline);

        if let Some(title_bar) = self.layout.title_bar {
            let title_fill = if self.selected {
                self.title_selected_background
            } else {
                self.title_background
            };
            surface.rect(title_bar.translate(offset), Vec2::ZERO, title_fill, outline);
        }

        if let (Some(rect), Some(pixmap)) = (self.layout.pixmap_rect, &self.pixmap) {
            surface.image(rect.translate(offset), &pixmap.key);
        }

        if !self.layout.title_text.is_empty() {
            surface.text(
                self.layout.title_pos + offset,
                &self.layout.title_text,
                &self.title_font,
                self.title_color,
            );
        }

        if let Some(rect) = self.layout.detail_rect {
            Self::paint_text_block(surface, &self.detail, &self.layout.detail_lines, rect.min + offset);
        }

        if let Some([a, b]) = self.layout.divider {
            surface.line(a + offset, b + offset, outline);
        }
        if let Some(rect) = self.layout.body_detail_rect {
            Self::paint_text_block(
                surface,
                &self.body_detail,
                &self.layout.body_detail_lines,
                rect.min + offset,
            );
        }

        if let NodeKind::SideSocket(container) = &self.kind {
            container.paint(surface, offset, outline);
        }

        for placed in self.placed_sockets() {
            placed.paint(surface);
        }
    }
}

impl Styleable for Node {
    fn type_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Standard => "Node",
            NodeKind::Simple { .. } => "SimpleNode",
            NodeKind::SideSocket(_) => "SideSocketNode",
        }
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
            "elided_title",
            "pixmap_position",
            "detail_enabled",
            "detail_font",
            "detail_color",
            "body_detail_enabled",
            "body_detail_font",
            "body_detail_color",
            "minimum_width",
            "minimum_height",
            "corner_x_radius",
            "corner_y_radius",
            "outline",
            "selected_outline",
            "background",
            "selected_background",
            "title_bar_background",
            "title_bar_selected_background",
            "drop_shadow",
            "socket_buffer",
            "inline_sockets",
            "inline_width_percentage",
            "inline_gap_percentage",
        ]
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        Some(match name {
            "title" => PropertyValue::Text(self.title.clone()),
            "title_font" => PropertyValue::Font(self.title_font.clone()),
            "title_color" => PropertyValue::Color(self.title_color),
            "title_justify" => PropertyValue::Text(self.title_justify.name().to_string()),
            "elided_title" => PropertyValue::Text(elide_name(self.elide).to_string()),
            "pixmap_position" => {
                PropertyValue::Text(format!("{:?}", self.pixmap_position).to_lowercase())
            }
            "detail_enabled" => PropertyValue::Bool(self.detail().visible),
            "detail_font" => PropertyValue::Font(self.detail().font.clone()),
            "detail_color" => PropertyValue::Color(self.detail().color),
            "body_detail_enabled" => PropertyValue::Bool(self.body_detail.visible),
            "body_detail_font" => PropertyValue::Font(self.body_detail.font.clone()),
            "body_detail_color" => PropertyValue::Color(self.body_detail.color),
            "minimum_width" => PropertyValue::Float(self.min_width),
            "minimum_height" => PropertyValue::Float(self.minimum_height()?),
            "corner_x_radius" => PropertyValue::Float(self.corner_radii.x),
            "corner_y_radius" => PropertyValue::Float(self.corner_radii.y),
            "outline" => PropertyValue::Stroke(self.outline),
            "selected_outline" => PropertyValue::Stroke(self.selected_outline),
            "background" => PropertyValue::Color(self.background),
            "selected_background" => PropertyValue::Color(self.selected_background),
            "title_bar_background" => PropertyValue::Color(self.title_background),
            "title_bar_selected_background" => PropertyValue::Color(self.title_selected_background),
            "drop_shadow" => PropertyValue::Bool(self.drop_shadow),
            "socket_buffer" => PropertyValue::Float(self.socket_buffer),
            "inline_sockets" => PropertyValue::Bool(self.inline_sockets),
            "inline_width_percentage" => PropertyValue::Float(self.inline_width_percentage),
            "inline_gap_percentage" => PropertyValue::Float(self.inline_gap_percentage),
            _ => return None,
        })
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), StyleError> {
        match name {
            "title" => self.set_title(value.as_text(name)?),
            "title_font" => self.set_title_font(value.as_font(name)?),
            "title_color" => self.set_title_color(value.as_color(name)?),
            "title_justify" => {
                let justify = TitleJustify::from_name(&value.as_text(name)?).ok_or(StyleError::TypeMismatch {
                    property: name.to_string(),
                    expected: "left, right or center",
                })?;
                self.set_title_justify(justify);
            }
            "elided_title" => {
                let mode = elide_from_name(&value.as_text(name)?).ok_or(StyleError::TypeMismatch {
                    property: name.to_string(),
                    expected: "none, left, middle or right",
                })?;
                self.set_elided_title(mode);
            }
            "pixmap_position" => {
                let position = match value.as_text(name)?.to_ascii_lowercase().as_str() {
                    "none" => PixmapPosition::None,
                    "left" => PixmapPosition::Left,
                    "right" => PixmapPosition::Right,
                    "top" => PixmapPosition::Top,
                    "center" => PixmapPosition::Center,
                    "bottom" => PixmapPosition::Bottom,
                    _ => {
                        return Err(StyleError::TypeMismatch {
                            property: name.to_string(),
                            expected: "none, left, right, top, center or bottom",
                        })
                    }
                };
                self.set_pixmap_position(position);
            }
            "detail_enabled" => self.set_detail_text_enabled(value.as_bool(name)?),
            "detail_font" => self.set_detail_text_font(value.as_font(name)?),
            "detail_color" => self.set_detail_text_color(value.as_color(name)?),
            "body_detail_enabled" => self.set_body_detail_text_enabled(value.as_bool(name)?),
            "body_detail_font" => {
                let font = value.as_font(name)?;
                self.update_body_detail(|d| d.font = font);
            }
            "body_detail_color" => {
                let color = value.as_color(name)?;
                self.update_body_detail(|d| d.color = color);
            }
            "minimum_width" => self.set_minimum_width(value.as_f32(name)?),
            "minimum_height" if self.minimum_height().is_some() => {
                self.set_minimum_height(value.as_f32(name)?);
            }
            "corner_x_radius" => self.set_corner_x_radius(value.as_f32(name)?),
            "corner_y_radius" => self.set_corner_y_radius(value.as_f32(name)?),
            "outline" => self.set_outline_pen(value.as_stroke(name)?),
            "selected_outline" => self.set_selected_pen(value.as_stroke(name)?),
            "background" => self.set_background(value.as_color(name)?),
            "selected_background" => self.set_selected_background(value.as_color(name)?),
            "title_bar_background" => self.set_title_bar_background(value.as_color(name)?),
            "title_bar_selected_background" => {
                self.set_title_bar_selected_background(value.as_color(name)?);
            }
            "drop_shadow" => self.set_drop_shadow(value.as_bool(name)?),
            "socket_buffer" => self.set_socket_buffer(value.as_f32(name)?),
            "inline_sockets" => self.set_inline_sockets(value.as_bool(name)?),
            "inline_width_percentage" => self.set_inline_text_width_percentage(value.as_f32(name)?),
            "inline_gap_percentage" => self.set_inline_text_gap_percentage(value.as_f32(name)?),
            _ => return Err(StyleError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

fn elide_name(mode: ElideMode) -> &'static str {
    match mode {
        ElideMode::None => "none",
        ElideMode::Left => "left",
        ElideMode::Middle => "middle",
        ElideMode::Right => "right",
    }
}

fn elide_from_name(name: &str) -> Option<ElideMode> {
    match name.to_ascii_lowercase().as_str() {
        "none" => Some(ElideMode::None),
        "left" => Some(ElideMode::Left),
        "middle" => Some(ElideMode::Middle),
        "right" => Some(ElideMode::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::RecordingSurface;
    use crate::style::StyleSheet;

    #[test]
    fn test_defaults() {
        let node = Node::new(NodeId::new());
        assert_eq!(node.title(), "Node");
        assert_eq!(node.minimum_width(), 150.0);
        assert_eq!(node.corner_radii(), Vec2::splat(5.0));
        assert_eq!(node.outline_pen().width, 3.0);
        assert_eq!(node.background(), Color32::from_rgb(200, 255, 200));
        assert!(node.title_bar_background().g() < node.background().g());
        assert!(node.drop_shadow());
        assert!(node.inline_sockets());
        assert_eq!(node.socket_buffer(), 2.0);
        assert_eq!(node.title_justify(), TitleJustify::Center);
    }

    #[test]
    fn test_add_socket_returns_index() {
        let mut node = Node::new(NodeId::new());
        assert_eq!(node.add_input_socket(), 0);
        assert_eq!(node.add_input_socket(), 1);
        assert_eq!(node.add_output_socket(), 0);
        assert_eq!(node.input_socket_count(), 2);
        assert_eq!(node.output_socket(0).map(Socket::label), Ok("Output"));
    }

    #[test]
    fn test_socket_ids_not_reused() {
        let mut node = Node::new(NodeId::new());
        node.add_input_socket();
        let first = node.input_socket(0).map(Socket::id).expect("socket");
        node.remove_input_socket(0).expect("remove");
        node.add_input_socket();
        let second = node.input_socket(0).map(Socket::id).expect("socket");
        assert_ne!(first, second);
        assert_eq!(second.node, node.id());
    }

    #[test]
    fn test_out_of_range_index() {
        let mut node = Node::new(NodeId::new());
        node.add_input_socket();
        assert_eq!(
            node.input_socket(3).err(),
            Some(SceneError::SocketIndexOutOfRange { index: 3, len: 1 })
        );
        let before = node.clone();
        assert!(node.remove_output_socket(0).is_err());
        assert_eq!(node, before);
    }

    #[test]
    fn test_modify_suspends_layout() {
        let mut node = Node::new(NodeId::new());
        let before = node.polygon();
        node.begin_modify_node();
        node.add_input_socket();
        node.add_input_socket();
        assert_eq!(node.polygon(), before);
        node.end_modify_node();
        assert!(node.polygon().height() > before.height());
        assert!(!node.is_modifying());
    }

    #[test]
    fn test_modify_does_not_nest() {
        let mut node = Node::new(NodeId::new());
        let before = node.polygon();
        node.begin_modify_node();
        node.begin_modify_node();
        node.add_output_socket();
        node.end_modify_node();
        // A single end resumes layout even after two begins.
        assert!(!node.is_modifying());
        assert!(node.polygon().height() > before.height());
    }

    #[test]
    fn test_pixmap_enabled_forces_center() {
        let mut node = Node::new(NodeId::new());
        node.set_pixmap(Some(Pixmap {
            key: "icon".to_string(),
            size: Vec2::new(32.0, 32.0),
        }));
        assert!(!node.pixmap_enabled());
        node.set_pixmap_enabled(true);
        assert_eq!(node.pixmap_position(), PixmapPosition::Center);
        assert!(node.pixmap_enabled());
        assert!(node.layout().pixmap_rect.is_some());
    }

    #[test]
    fn test_set_name_requests_restyle() {
        let mut node = Node::new(NodeId::new());
        assert!(node.take_restyle());
        assert!(!node.take_restyle());
        node.set_name("output");
        assert!(node.take_restyle());
        assert_eq!(node.style_key(), "Node#output");
    }

    #[test]
    fn test_style_property_triggers_layout() {
        let mut node = Node::new(NodeId::new());
        let sheet = StyleSheet::new().with("Node", "minimum_width", PropertyValue::Float(300.0));
        assert_eq!(sheet.apply(&mut node), 1);
        assert!(node.polygon().width() >= 300.0);
    }

    #[test]
    fn test_minimum_height_only_on_simple() {
        let mut node = Node::new(NodeId::new());
        assert!(node.set_property("minimum_height", &PropertyValue::Float(5.0)).is_err());
        let mut simple = Node::new_simple(NodeId::new());
        assert!(simple.set_property("minimum_height", &PropertyValue::Float(40.0)).is_ok());
        assert_eq!(simple.polygon().height(), 40.0);
    }

    #[test]
    fn test_paint_draws_title_and_sockets() {
        let mut node = Node::new(NodeId::new());
        node.add_input_socket();
        node.add_output_socket();
        let mut surface = RecordingSurface::new();
        node.paint(&mut surface);
        let texts = surface.texts();
        assert_eq!(texts, vec!["Node", "Input", "Output"]);
    }

    #[test]
    fn test_darker() {
        let c = darker(Color32::from_rgb(200, 255, 200), 125);
        assert!(c.g() < 255);
        assert_eq!(darker(Color32::RED, 0), Color32::RED);
    }
}
