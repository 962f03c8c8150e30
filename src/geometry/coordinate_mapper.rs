//! Grid ↔ millimeter conversions.
//!
//! The transform is affine: `x = origin_x + file * square`, `y = origin_y +
//! rank * square`. It is defined for the off-board parking cells too, so a
//! slot at file `-1` lands one square left of the a-file.

use std::fmt;

use crate::board_state::chess_types::GridCell;
use crate::errors::RobotResult;
use crate::geometry::gantry_config::GantryConfig;
use crate::utils::algebraic::algebraic_to_cell;

/// Gantry-space position in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MillimeterPoint {
    pub x: f64,
    pub y: f64,
}

impl MillimeterPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// True when both axes differ by at most `eps`.
    #[inline]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl fmt::Display for MillimeterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    square_size_mm: f64,
    origin_x_mm: f64,
    origin_y_mm: f64,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(&GantryConfig::default())
    }
}

impl CoordinateMapper {
    pub fn new(config: &GantryConfig) -> Self {
        Self {
            square_size_mm: config.square_size_mm,
            origin_x_mm: config.board_origin_x_mm,
            origin_y_mm: config.board_origin_y_mm,
        }
    }

    #[inline]
    pub fn cell_to_mm(&self, cell: GridCell) -> MillimeterPoint {
        MillimeterPoint::new(
            self.origin_x_mm + f64::from(cell.file) * self.square_size_mm,
            self.origin_y_mm + f64::from(cell.rank) * self.square_size_mm,
        )
    }

    /// Centre of an algebraic square such as `"e4"`.
    pub fn square_to_mm(&self, square: &str) -> RobotResult<MillimeterPoint> {
        Ok(self.cell_to_mm(algebraic_to_cell(square)?))
    }

    /// Snap a point to the nearest grid cell, rounding each axis.
    pub fn mm_to_nearest_cell(&self, point: MillimeterPoint) -> GridCell {
        let file = ((point.x - self.origin_x_mm) / self.square_size_mm).round();
        let rank = ((point.y - self.origin_y_mm) / self.square_size_mm).round();
        GridCell::new(
            file.clamp(f64::from(i8::MIN), f64::from(i8::MAX)) as i8,
            rank.clamp(f64::from(i8::MIN), f64::from(i8::MAX)) as i8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_is_board_origin() {
        let mapper = CoordinateMapper::default();
        let a1 = mapper.square_to_mm("a1").expect("a1 should map");
        assert!(a1.approx_eq(MillimeterPoint::new(60.8, 46.2), 1e-9));
        let h8 = mapper.square_to_mm("h8").expect("h8 should map");
        assert!(h8.approx_eq(MillimeterPoint::new(60.8 + 7.0 * 43.6, 46.2 + 7.0 * 43.6), 1e-9));
    }

    #[test]
    fn round_trip_is_exact_for_every_square() {
        let mapper = CoordinateMapper::default();
        for file in 0..8 {
            for rank in 0..8 {
                let cell = GridCell::new(file, rank);
                assert_eq!(mapper.mm_to_nearest_cell(mapper.cell_to_mm(cell)), cell);
            }
        }
    }

    #[test]
    fn parking_cells_map_outside_the_board() {
        let mapper = CoordinateMapper::default();
        let left_of_a1 = mapper.cell_to_mm(GridCell::new(-1, 0));
        assert!((left_of_a1.x - (60.8 - 43.6)).abs() < 1e-9);
        assert_eq!(mapper.mm_to_nearest_cell(left_of_a1), GridCell::new(-1, 0));
    }

    #[test]
    fn snapping_rounds_to_nearest() {
        let mapper = CoordinateMapper::default();
        let e4 = mapper.square_to_mm("e4").expect("e4 should map");
        assert_eq!(mapper.mm_to_nearest_cell(e4.offset(9.0, -9.0)), GridCell::new(4, 3));
        assert_eq!(mapper.mm_to_nearest_cell(e4.offset(30.0, 0.0)), GridCell::new(5, 3));
    }

    #[test]
    fn invalid_square_is_rejected() {
        assert!(CoordinateMapper::default().square_to_mm("z9").is_err());
    }
}
