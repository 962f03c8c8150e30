//! Mechanical-resolution rounding and no-op removal.
//!
//! Rounding happens once, right before a step is transmitted; compression
//! happens once per choreography before execution. Points closer than the
//! epsilon are not motions and must never be planned as one.

use crate::choreography::step::{Step, StepKind};
use crate::geometry::coordinate_mapper::MillimeterPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepQuantizer {
    resolution_mm: f64,
    epsilon: f64,
}

impl StepQuantizer {
    pub fn new(resolution_mm: f64, epsilon: f64) -> Self {
        Self { resolution_mm, epsilon }
    }

    #[inline]
    pub fn quantize_value(&self, value: f64) -> f64 {
        (value / self.resolution_mm).round() * self.resolution_mm
    }

    pub fn quantize_point(&self, point: MillimeterPoint) -> MillimeterPoint {
        MillimeterPoint::new(self.quantize_value(point.x), self.quantize_value(point.y))
    }

    /// Round every coordinate of the step, including the origin recorded for
    /// a displaced obstacle so its recenter lands on the same grid.
    pub fn quantize(&self, step: &Step) -> Step {
        let mut out = step.clone();
        out.from = self.quantize_point(step.from);
        out.to = self.quantize_point(step.to);
        if let StepKind::ObstacleSlide(mut obstacle) = step.kind {
            obstacle.origin = self.quantize_point(obstacle.origin);
            obstacle.offset_mm = self.quantize_value(obstacle.offset_mm);
            out.kind = StepKind::ObstacleSlide(obstacle);
        }
        out
    }

    pub fn compress(&self, steps: Vec<Step>) -> Vec<Step> {
        compress_zero_len(steps, self.epsilon)
    }
}

/// Drop steps whose endpoints agree within `eps` on both axes, keeping the
/// order of the rest.
pub fn compress_zero_len(steps: Vec<Step>, eps: f64) -> Vec<Step> {
    steps.into_iter().filter(|s| !s.is_degenerate(eps)).collect()
}
