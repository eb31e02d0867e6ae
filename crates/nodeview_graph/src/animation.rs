// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hover highlight animation for sockets and connections.

use egui::ecolor::HsvaGamma;
use egui::Color32;

/// Lighten `color` by `factor` percent in HSV space.
///
/// Value is scaled by `factor / 100`; overflow above full value is taken out
/// of the saturation instead, so very bright colours drift towards white.
pub fn lighter(color: Color32, factor: u32) -> Color32 {
    if factor == 100 {
        return color;
    }
    let mut hsv = HsvaGamma::from(color);
    let scaled = hsv.v * factor as f32 / 100.0;
    if scaled > 1.0 {
        hsv.s = (hsv.s - (scaled - 1.0)).max(0.0);
        hsv.v = 1.0;
    } else {
        hsv.v = scaled;
    }
    Color32::from(hsv)
}

/// Direction the highlight is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationDirection {
    /// Towards the lightened colour
    Forward,
    /// Back to the base colour
    Backward,
}

/// Timer-driven interpolation between a base colour and its lightened form.
///
/// Purely cosmetic: it never feeds into layout or connection logic.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverAnimation {
    /// Full-run duration in milliseconds
    pub duration_ms: u32,
    /// Target lightness factor in percent
    pub lightness: u32,
    /// Whether hovering animates at all
    pub enabled: bool,
    progress: f32,
    direction: AnimationDirection,
    running: bool,
}

impl Default for HoverAnimation {
    fn default() -> Self {
        Self {
            duration_ms: 250,
            lightness: 175,
            enabled: true,
            progress: 0.0,
            direction: AnimationDirection::Forward,
            running: false,
        }
    }
}

impl HoverAnimation {
    /// Start (or reverse into) the forward run
    pub fn hover_enter(&mut self) {
        if !self.enabled {
            return;
        }
        self.direction = AnimationDirection::Forward;
        self.running = self.progress < 1.0;
    }

    /// Start (or reverse into) the backward run
    pub fn hover_leave(&mut self) {
        if !self.enabled {
            self.progress = 0.0;
            self.running = false;
            return;
        }
        self.direction = AnimationDirection::Backward;
        self.running = self.progress > 0.0;
    }

    /// Advance by `dt_ms` milliseconds; returns whether anything changed
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        if !self.running {
            return false;
        }
        let step = if self.duration_ms == 0 {
            1.0
        } else {
            dt_ms / self.duration_ms as f32
        };
        match self.direction {
            AnimationDirection::Forward => {
                self.progress = (self.progress + step).min(1.0);
                self.running = self.progress < 1.0;
            }
            AnimationDirection::Backward => {
                self.progress = (self.progress - step).max(0.0);
                self.running = self.progress > 0.0;
            }
        }
        true
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current position between base (0) and lightened (1)
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Current direction
    pub fn direction(&self) -> AnimationDirection {
        self.direction
    }

    /// Colour at the current progress
    pub fn color(&self, base: Color32) -> Color32 {
        if self.progress <= 0.0 {
            return base;
        }
        let target = lighter(base, self.lightness);
        lerp_color(base, target, self.progress)
    }
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgba_unmultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighter_brightens() {
        let base = Color32::from_rgb(100, 50, 50);
        let light = lighter(base, 175);
        assert!(light.r() > base.r());
        assert_eq!(lighter(base, 100), base);
    }

    #[test]
    fn test_forward_then_backward() {
        let mut anim = HoverAnimation::default();
        anim.hover_enter();
        assert!(anim.is_running());
        anim.tick(125.0);
        assert!((anim.progress() - 0.5).abs() < 1e-6);

        // Reversal resumes from the current progress.
        anim.hover_leave();
        anim.tick(50.0);
        assert!((anim.progress() - 0.3).abs() < 1e-6);
        anim.tick(500.0);
        assert_eq!(anim.progress(), 0.0);
        assert!(!anim.is_running());
    }

    #[test]
    fn test_disabled_does_nothing() {
        let mut anim = HoverAnimation {
            enabled: false,
            ..Default::default()
        };
        anim.hover_enter();
        assert!(!anim.tick(100.0));
        assert_eq!(anim.color(Color32::RED), Color32::RED);
    }
}
