//! Object transform stage
//!
//! Three independently replaceable affine components, composed in the fixed
//! order scale → rotate → translate and applied to geometry on demand. The
//! stage holds no render state; callers invalidate cached rendering after a
//! change.

use glam::{DAffine2, DVec2, dvec2};

/// The scale/rotate/translate stack attached to one plot object.
///
/// Setters replace a whole component at a time, so readers never observe a
/// partially built transform. Last writer wins; there is no history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotTransform {
    scale: DAffine2,
    rotate: DAffine2,
    translate: DAffine2,
}

impl Default for PlotTransform {
    fn default() -> Self {
        Self {
            scale: DAffine2::IDENTITY,
            rotate: DAffine2::IDENTITY,
            translate: DAffine2::IDENTITY,
        }
    }
}

impl PlotTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scale component
    pub fn set_scale(&mut self, sx: f64, sy: f64) {
        self.scale = DAffine2::from_scale(dvec2(sx, sy));
    }

    /// Replace the rotation component, counterclockwise degrees
    pub fn set_rotate(&mut self, degrees: f64) {
        self.rotate = DAffine2::from_angle(degrees.to_radians());
    }

    /// Replace the translation component, HPGL units
    pub fn set_translate(&mut self, dx: f64, dy: f64) {
        self.translate = DAffine2::from_translation(dvec2(dx, dy));
    }

    /// The composed map: scale first, then rotation, then translation
    pub fn composed(&self) -> DAffine2 {
        self.translate * self.rotate * self.scale
    }

    /// Map one point through the composed transform. Pure; no mutation.
    pub fn apply(&self, point: DVec2) -> DVec2 {
        self.composed().transform_point2(point)
    }
}
