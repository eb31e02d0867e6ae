// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pan and zoom of the canvas viewport.
//!
//! A scene point maps to the screen as `center + (scene + pan) * zoom`, where
//! `center` is the middle of the viewport rectangle.

use crate::config::CanvasConfig;
use egui::{Pos2, Rect, Vec2};

/// Viewport transform state
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Pan offset in scene units
    pub pan: Vec2,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    wheel_step: f32,
    viewport: Rect,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl ViewState {
    /// Identity view with the zoom bounds of `config`
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            wheel_step: config.wheel_step,
            viewport: Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        }
    }

    /// Current zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Screen rectangle the canvas occupies
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Update the screen rectangle
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Scene to screen
    pub fn scene_to_screen(&self, scene: Pos2) -> Pos2 {
        self.viewport.center() + (scene.to_vec2() + self.pan) * self.zoom
    }

    /// Screen to scene
    pub fn screen_to_scene(&self, screen: Pos2) -> Pos2 {
        ((screen - self.viewport.center()) / self.zoom - self.pan).to_pos2()
    }

    /// Scene rectangle visible through the viewport
    pub fn visible_scene_rect(&self) -> Rect {
        Rect::from_two_pos(
            self.screen_to_scene(self.viewport.min),
            self.screen_to_scene(self.viewport.max),
        )
    }

    /// Set the zoom factor. Values outside the bounds are ignored.
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        if !(self.min_zoom..=self.max_zoom).contains(&zoom) || zoom == self.zoom {
            return false;
        }
        self.zoom = zoom;
        true
    }

    /// Multiply the zoom, keeping the scene point under `anchor` fixed.
    ///
    /// Returns false when the result would leave the zoom bounds.
    pub fn zoom_about(&mut self, factor: f32, anchor: Pos2) -> bool {
        let before = self.screen_to_scene(anchor);
        if !self.set_zoom(self.zoom * factor) {
            return false;
        }
        let after = self.screen_to_scene(anchor);
        self.pan += after - before;
        true
    }

    /// Zoom factor for a wheel delta: doubles every `wheel_step` units
    pub fn wheel_factor(&self, delta: f32) -> f32 {
        2.0_f32.powf(delta / self.wheel_step)
    }

    /// Move the view by a screen-space delta
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta / self.zoom;
    }

    /// Centre on `rect` and zoom so it fits the viewport
    pub fn zoom_to_fit(&mut self, rect: Rect) -> bool {
        if !rect.is_positive() {
            return false;
        }
        let fit = (self.viewport.width() / rect.width()).min(self.viewport.height() / rect.height());
        self.zoom = fit.clamp(self.min_zoom, self.max_zoom);
        self.pan = -rect.center().to_vec2();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewState {
        let mut view = ViewState::default();
        view.set_viewport(Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 200.0)));
        view
    }

    #[test]
    fn test_transforms_invert() {
        let mut view = view();
        view.pan = Vec2::new(30.0, -12.0);
        view.set_zoom(2.5);
        let scene = Pos2::new(17.0, -44.0);
        let back = view.screen_to_scene(view.scene_to_screen(scene));
        assert!((back - scene).length() < 1e-3);
        assert_eq!(view.scene_to_screen(Pos2::new(-30.0, 12.0)), Pos2::new(200.0, 100.0));
    }

    #[test]
    fn test_zoom_bounds_ignore_out_of_range() {
        let mut view = view();
        assert!(!view.set_zoom(0.0001));
        assert!(!view.set_zoom(1000.0));
        assert_eq!(view.zoom(), 1.0);
        assert!(view.set_zoom(100.0));
        assert!(!view.zoom_about(2.0, Pos2::ZERO));
        assert_eq!(view.zoom(), 100.0);
    }

    #[test]
    fn test_wheel_factor_doubles_per_step() {
        let view = view();
        assert!((view.wheel_factor(480.0) - 2.0).abs() < 1e-6);
        assert!((view.wheel_factor(-480.0) - 0.5).abs() < 1e-6);
        assert_eq!(view.wheel_factor(0.0), 1.0);
    }

    #[test]
    fn test_zoom_about_keeps_anchor() {
        let mut view = view();
        let anchor = Pos2::new(300.0, 40.0);
        let before = view.screen_to_scene(anchor);
        assert!(view.zoom_about(2.0, anchor));
        let after = view.screen_to_scene(anchor);
        assert!((after - before).length() < 1e-3);
    }

    #[test]
    fn test_zoom_to_fit() {
        let mut view = view();
        let target = Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(800.0, 100.0));
        assert!(view.zoom_to_fit(target));
        assert_eq!(view.zoom(), 0.5);
        assert_eq!(view.scene_to_screen(target.center()), view.viewport().center());
        assert!(!view.zoom_to_fit(Rect::NOTHING));
    }
}
