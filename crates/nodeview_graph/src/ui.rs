// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui front end for the canvas.
//!
//! [`canvas`] allocates the available space, keeps the scene viewport in sync
//! with it, forwards pointer and keyboard input to the scene state machine and
//! paints the grid, the items and the selection rectangle.

use crate::paint::PaintSurface;
use crate::scene::Scene;
use crate::text::Font;
use crate::view::ViewState;
use egui::{Align2, Color32, Event, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};

/// Grid lines closer than this many screen pixels are not drawn
const MIN_GRID_PIXELS: f32 = 5.0;

/// Every n-th grid line is drawn stronger
const MAJOR_EVERY: i64 = 5;

const BACKGROUND: Color32 = Color32::from_rgb(40, 40, 44);
const GRID_MINOR: Color32 = Color32::from_rgba_premultiplied(60, 60, 60, 100);
const GRID_MAJOR: Color32 = Color32::from_rgba_premultiplied(80, 80, 80, 150);
const AXIS: Color32 = Color32::from_rgba_premultiplied(100, 100, 150, 180);

/// [`PaintSurface`] drawing through an egui painter, mapping scene to screen
pub struct EguiSurface<'a> {
    painter: &'a egui::Painter,
    view: &'a ViewState,
}

impl<'a> EguiSurface<'a> {
    /// Surface over `painter` using the transform of `view`
    pub fn new(painter: &'a egui::Painter, view: &'a ViewState) -> Self {
        Self { painter, view }
    }

    fn pos(&self, p: Pos2) -> Pos2 {
        self.view.scene_to_screen(p)
    }

    fn rect_of(&self, r: Rect) -> Rect {
        Rect::from_min_max(self.pos(r.min), self.pos(r.max))
    }

    fn stroke(&self, stroke: Stroke) -> Stroke {
        Stroke::new(stroke.width * self.view.zoom(), stroke.color)
    }

    fn points(&self, points: &[Pos2]) -> Vec<Pos2> {
        points.iter().map(|p| self.pos(*p)).collect()
    }
}

impl PaintSurface for EguiSurface<'_> {
    fn rect(&mut self, rect: Rect, radii: Vec2, fill: Color32, stroke: Stroke) {
        // egui corners are circular
        let rounding = radii.min_elem() * self.view.zoom();
        self.painter
            .rect(self.rect_of(rect), rounding, fill, self.stroke(stroke));
    }

    fn ellipse(&mut self, rect: Rect, fill: Color32, stroke: Stroke) {
        let rect = self.rect_of(rect);
        let radius = rect.size() / 2.0;
        self.painter
            .add(Shape::ellipse_filled(rect.center(), radius, fill));
        self.painter
            .add(Shape::ellipse_stroke(rect.center(), radius, self.stroke(stroke)));
    }

    fn polygon(&mut self, points: &[Pos2], fill: Color32, stroke: Stroke) {
        self.painter.add(Shape::convex_polygon(
            self.points(points),
            fill,
            self.stroke(stroke),
        ));
    }

    fn polyline(&mut self, points: &[Pos2], stroke: Stroke) {
        self.painter
            .add(Shape::line(self.points(points), self.stroke(stroke)));
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.painter
            .line_segment([self.pos(from), self.pos(to)], self.stroke(stroke));
    }

    fn text(&mut self, pos: Pos2, text: &str, font: &Font, color: Color32) {
        let font_id = FontId::proportional(font.pixel_size() * self.view.zoom());
        self.painter
            .text(self.pos(pos), Align2::LEFT_TOP, text, font_id, color);
    }

    fn image(&mut self, rect: Rect, key: &str) {
        // Images are supplied by the host; show where they go
        let rect = self.rect_of(rect);
        self.painter
            .rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::GRAY));
        self.painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            key,
            FontId::proportional(10.0),
            Color32::GRAY,
        );
    }
}

/// Multiples of `step` within `[start, end]`
pub fn grid_steps(start: f32, end: f32, step: f32) -> impl Iterator<Item = (i64, f32)> {
    let (first, last) = if step > 0.0 && start <= end {
        ((start / step).ceil() as i64, (end / step).floor() as i64)
    } else {
        (1, 0)
    };
    (first..=last).map(move |i| (i, i as f32 * step))
}

/// Whether the grid is dense enough to be worth drawing
pub fn grid_visible(zoom: f32, grid_size: f32) -> bool {
    zoom * grid_size >= MIN_GRID_PIXELS
}

/// Show the canvas in the remaining space of `ui`
pub fn canvas(ui: &mut egui::Ui, scene: &mut Scene) -> egui::Response {
    let rect = ui.available_rect_before_wrap();
    let response = ui.allocate_rect(rect, Sense::click_and_drag());
    let painter = ui.painter_at(rect);

    if scene.view().viewport() != rect {
        scene.view_mut().set_viewport(rect);
    }

    handle_input(ui, &response, scene);

    let dt_ms = ui.input(|i| i.stable_dt) * 1000.0;
    if scene.tick(dt_ms) {
        ui.ctx().request_repaint();
    }

    painter.rect_filled(rect, 0.0, BACKGROUND);
    if scene.grid_lines() {
        draw_grid(&painter, scene, rect);
    }

    scene.paint(&mut EguiSurface::new(&painter, scene.view()));

    if let Some(band) = scene.rubber_band() {
        draw_rubber_band(&painter, scene.view(), band);
    }

    draw_status_bar(&painter, scene, rect);
    response
}

fn handle_input(ui: &egui::Ui, response: &egui::Response, scene: &mut Scene) {
    let rect = response.rect;
    let (events, scroll, hover) = ui.input(|i| {
        (
            i.events.clone(),
            i.raw_scroll_delta.y,
            i.pointer.hover_pos(),
        )
    });

    for event in events {
        match event {
            Event::PointerMoved(pos) => scene.pointer_moved(pos),
            Event::PointerButton {
                pos,
                button,
                pressed: true,
                modifiers,
            } if rect.contains(pos) => scene.pointer_pressed(pos, button, modifiers),
            Event::PointerButton {
                pos,
                button,
                pressed: false,
                ..
            } => scene.pointer_released(pos, button),
            Event::Key {
                key, pressed: true, ..
            } if response.hovered() || response.has_focus() => {
                scene.key_pressed(key);
            }
            _ => {}
        }
    }

    if scroll != 0.0 {
        if let Some(pos) = hover.filter(|p| rect.contains(*p)) {
            scene.wheel(scroll, pos);
        }
    }
}

fn draw_grid(painter: &egui::Painter, scene: &Scene, rect: Rect) {
    let view = scene.view();
    let grid = scene.grid_size();
    if !grid_visible(view.zoom(), grid) {
        return;
    }
    let visible = view.visible_scene_rect();

    let line_stroke = |index: i64| {
        if index % MAJOR_EVERY == 0 {
            Stroke::new(1.0, GRID_MAJOR)
        } else {
            Stroke::new(1.0, GRID_MINOR)
        }
    };

    for (i, x) in grid_steps(visible.min.x, visible.max.x, grid) {
        let sx = view.scene_to_screen(Pos2::new(x, 0.0)).x;
        painter.line_segment(
            [Pos2::new(sx, rect.top()), Pos2::new(sx, rect.bottom())],
            line_stroke(i),
        );
    }
    for (i, y) in grid_steps(visible.min.y, visible.max.y, grid) {
        let sy = view.scene_to_screen(Pos2::new(0.0, y)).y;
        painter.line_segment(
            [Pos2::new(rect.left(), sy), Pos2::new(rect.right(), sy)],
            line_stroke(i),
        );
    }

    let origin = view.scene_to_screen(Pos2::ZERO);
    if rect.contains(origin) {
        painter.line_segment(
            [Pos2::new(origin.x, rect.top()), Pos2::new(origin.x, rect.bottom())],
            Stroke::new(2.0, AXIS),
        );
        painter.line_segment(
            [Pos2::new(rect.left(), origin.y), Pos2::new(rect.right(), origin.y)],
            Stroke::new(2.0, AXIS),
        );
    }
}

fn draw_rubber_band(painter: &egui::Painter, view: &ViewState, band: Rect) {
    let rect = Rect::from_two_pos(view.scene_to_screen(band.min), view.scene_to_screen(band.max));
    painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(100, 150, 255, 30));
    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::from_rgb(100, 150, 255)));
}

fn draw_status_bar(painter: &egui::Painter, scene: &Scene, rect: Rect) {
    let text = format!(
        "Nodes: {} | Connections: {} | Selected: {} | Zoom: {:.0}%",
        scene.node_count(),
        scene.connection_count(),
        scene.selection_count(),
        scene.view().zoom() * 100.0
    );
    painter.text(
        rect.left_bottom() + Vec2::new(8.0, -8.0),
        Align2::LEFT_BOTTOM,
        text,
        FontId::proportional(11.0),
        Color32::from_gray(150),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zorder::ZOrderService;
    use egui::{Modifiers, PointerButton, RawInput};

    fn run_frame(ctx: &egui::Context, scene: &mut Scene, events: Vec<Event>) -> egui::FullOutput {
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
            events,
            ..Default::default()
        };
        ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                canvas(ui, scene);
            });
        })
    }

    #[test]
    fn test_grid_steps_cover_range() {
        let steps: Vec<(i64, f32)> = grid_steps(-25.0, 25.0, 10.0).collect();
        assert_eq!(steps, vec![(-2, -20.0), (-1, -10.0), (0, 0.0), (1, 10.0), (2, 20.0)]);
        assert_eq!(grid_steps(0.0, 10.0, 0.0).count(), 0);
    }

    #[test]
    fn test_grid_hidden_when_dense() {
        assert!(grid_visible(1.0, 10.0));
        assert!(grid_visible(0.5, 10.0));
        assert!(!grid_visible(0.4, 10.0));
    }

    #[test]
    fn test_frame_paints_and_tracks_viewport() {
        let ctx = egui::Context::default();
        let mut scene = Scene::with_z_order(ZOrderService::new());
        scene.create_node(1, 1, "");
        let output = run_frame(&ctx, &mut scene, Vec::new());
        assert!(!output.shapes.is_empty());
        assert!(scene.view().viewport().width() > 0.0);
    }

    #[test]
    fn test_press_on_empty_space_sets_creation_point() {
        let ctx = egui::Context::default();
        let mut scene = Scene::with_z_order(ZOrderService::new());
        run_frame(&ctx, &mut scene, Vec::new());

        let screen = Pos2::new(700.0, 500.0);
        let events = vec![
            Event::PointerMoved(screen),
            Event::PointerButton {
                pos: screen,
                button: PointerButton::Primary,
                pressed: true,
                modifiers: Modifiers::NONE,
            },
        ];
        run_frame(&ctx, &mut scene, events);
        let expected = scene.view().screen_to_scene(screen);
        assert!((scene.creation_point() - expected).length() < 1e-3);
        assert!(scene.rubber_band().is_some());
    }
}
