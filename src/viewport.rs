use crate::error::{CrimeMapError, CrimeMapResult};
use serde::{Deserialize, Serialize};

pub const ZOOM_MIN: f64 = 0.8;
pub const ZOOM_MAX: f64 = 8.0;
pub const ZOOM_STEP: f64 = 1.2;
pub const INITIAL_ZOOM: f64 = 1.0;
/// Geographic center of India as (longitude, latitude).
pub const INITIAL_CENTER: (f64, f64) = (78.9629, 22.5937);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    /// (longitude, latitude)
    pub center: (f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ZoomBounds {
    pub fn new(min: f64, max: f64, step: f64) -> CrimeMapResult<Self> {
        if !(min > 0.0 && min.is_finite() && max.is_finite()) {
            return Err(CrimeMapError::InvalidViewport(format!(
                "zoom bounds must be positive and finite, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(CrimeMapError::InvalidViewport(format!(
                "zoom min {min} exceeds max {max}"
            )));
        }
        if !(step > 1.0 && step.is_finite()) {
            return Err(CrimeMapError::InvalidViewport(format!(
                "zoom step must be greater than 1, got {step}"
            )));
        }
        Ok(ZoomBounds { min, max, step })
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        ZoomBounds {
            min: ZOOM_MIN,
            max: ZOOM_MAX,
            step: ZOOM_STEP,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    bounds: ZoomBounds,
}

impl ViewportController {
    pub fn new(bounds: ZoomBounds, center: (f64, f64)) -> Self {
        ViewportController {
            viewport: Viewport {
                zoom: INITIAL_ZOOM.clamp(bounds.min, bounds.max),
                center,
            },
            bounds,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    /// Multiplies zoom by the step, capped at the upper bound.
    pub fn zoom_in(&mut self) -> Viewport {
        if self.viewport.zoom < self.bounds.max {
            self.viewport.zoom = (self.viewport.zoom * self.bounds.step).min(self.bounds.max);
        }
        self.viewport
    }

    /// Divides zoom by the step, floored at the lower bound.
    pub fn zoom_out(&mut self) -> Viewport {
        if self.viewport.zoom > self.bounds.min {
            self.viewport.zoom = (self.viewport.zoom / self.bounds.step).max(self.bounds.min);
        }
        self.viewport
    }

    pub fn on_external_move(&mut self, center: (f64, f64)) -> Viewport {
        self.viewport.center = center;
        self.viewport
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ZoomBounds::default(), INITIAL_CENTER)
    }
}
