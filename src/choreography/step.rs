//! Motion steps and the bookkeeping attached to them.

use std::fmt;

use crate::board_state::chess_types::GridCell;
use crate::geometry::coordinate_mapper::MillimeterPoint;

/// Gantry axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub const fn perpendicular(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// A foreign piece pushed off the travel line, to be returned to `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacedObstacle {
    pub cell: GridCell,
    pub origin: MillimeterPoint,
    /// Axis the piece was pushed along.
    pub axis: Axis,
    /// Signed push distance along `axis`.
    pub offset_mm: f64,
}

impl DisplacedObstacle {
    pub fn displaced_position(&self) -> MillimeterPoint {
        match self.axis {
            Axis::X => self.origin.offset(self.offset_mm, 0.0),
            Axis::Y => self.origin.offset(0.0, self.offset_mm),
        }
    }

    pub fn slide_step(&self) -> Step {
        Step::new(
            "obstacle slide",
            self.origin,
            self.displaced_position(),
            format!("push blocker on {} out of the path", self.cell),
        )
        .with_kind(StepKind::ObstacleSlide(*self))
    }

    pub fn recenter_step(&self) -> Step {
        Step::new(
            "obstacle recenter",
            self.displaced_position(),
            self.origin,
            format!("return blocker to {}", self.cell),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepKind {
    /// Ordinary relocation of the piece under the magnet.
    Carry,
    /// Pushes a blocking piece aside; the executor must put it back.
    ObstacleSlide(DisplacedObstacle),
}

/// One straight-line magnet-on motion.
///
/// The controller travels magnet-off to `from` on its own, so consecutive
/// steps need not chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub action: &'static str,
    pub from: MillimeterPoint,
    pub to: MillimeterPoint,
    pub note: String,
    pub kind: StepKind,
}

impl Step {
    pub fn new(action: &'static str, from: MillimeterPoint, to: MillimeterPoint, note: impl Into<String>) -> Self {
        Self {
            action,
            from,
            to,
            note: note.into(),
            kind: StepKind::Carry,
        }
    }

    pub fn with_kind(mut self, kind: StepKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    pub fn is_degenerate(&self, eps: f64) -> bool {
        self.from.approx_eq(self.to, eps)
    }

    pub fn displaced_obstacle(&self) -> Option<DisplacedObstacle> {
        match self.kind {
            StepKind::ObstacleSlide(obstacle) => Some(obstacle),
            StepKind::Carry => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<18} {} -> {}  {}", self.action, self.from, self.to, self.note)
    }
}

/// Step list realizing one relocation unit (a chess move, or one piece of a
/// reset). Obstacles displaced inside it are recentered when it completes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Choreography {
    pub label: String,
    pub steps: Vec<Step>,
}

impl Choreography {
    pub fn new(label: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            label: label.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_slide_and_recenter_are_inverse_motions() {
        let obstacle = DisplacedObstacle {
            cell: GridCell::new(2, 1),
            origin: MillimeterPoint::new(100.0, 50.0),
            axis: Axis::Y,
            offset_mm: -9.0,
        };
        let slide = obstacle.slide_step();
        let back = obstacle.recenter_step();
        assert_eq!(slide.to, MillimeterPoint::new(100.0, 41.0));
        assert_eq!(slide.from, back.to);
        assert_eq!(slide.to, back.from);
        assert_eq!(slide.displaced_obstacle(), Some(obstacle));
        assert_eq!(back.displaced_obstacle(), None);
    }

    #[test]
    fn degenerate_detection_uses_both_axes() {
        let p = MillimeterPoint::new(1.0, 1.0);
        assert!(Step::new("noop", p, p.offset(1e-7, -1e-7), "").is_degenerate(1e-6));
        assert!(!Step::new("move", p, p.offset(0.0, 0.5), "").is_degenerate(1e-6));
    }
}
