//! Half-square lanes between a board cell and a parking slot.
//!
//! Pieces rest on cell centres, so a path running half a square off every
//! centre line never touches one. The lane route is: offset off the cell
//! toward the slot's rank, slide along that lane row to the lane column
//! beside the slot, slide along the column to the slot's rank, then recenter
//! into the slot.

use crate::board_state::chess_types::GridCell;
use crate::choreography::step::Step;
use crate::geometry::coordinate_mapper::{CoordinateMapper, MillimeterPoint};

#[derive(Debug, Clone, Copy)]
pub struct ParkingLane {
    mapper: CoordinateMapper,
    lane_offset_mm: f64,
}

impl ParkingLane {
    pub fn new(mapper: CoordinateMapper, lane_offset_mm: f64) -> Self {
        Self { mapper, lane_offset_mm }
    }

    /// Carry the piece on `cell` into the slot at `slot`.
    pub fn to_slot(&self, cell: GridCell, slot: GridCell) -> Vec<Step> {
        let [start, offset, lane_corner, lane_end, parked] = self.waypoints(cell, slot);
        vec![
            Step::new("lane offset", start, offset, format!("lift {cell} into its lane")),
            Step::new("lane slide", offset, lane_corner, "slide along lane row"),
            Step::new("lane slide", lane_corner, lane_end, "slide along lane column"),
            Step::new("lane park", lane_end, parked, format!("park in slot at {slot}")),
        ]
    }

    /// Carry the piece waiting at `slot` onto `cell`; the exact reverse of
    /// [`ParkingLane::to_slot`].
    pub fn from_slot(&self, slot: GridCell, cell: GridCell) -> Vec<Step> {
        let [placed, offset, lane_corner, lane_end, parked] = self.waypoints(cell, slot);
        vec![
            Step::new("lane unpark", parked, lane_end, format!("leave slot at {slot}")),
            Step::new("lane slide", lane_end, lane_corner, "slide along lane column"),
            Step::new("lane slide", lane_corner, offset, "slide along lane row"),
            Step::new("lane place", offset, placed, format!("set down on {cell}")),
        ]
    }

    fn waypoints(&self, cell: GridCell, slot: GridCell) -> [MillimeterPoint; 5] {
        let start = self.mapper.cell_to_mm(cell);
        let parked = self.mapper.cell_to_mm(slot);
        let dy = if slot.rank >= cell.rank { 1.0 } else { -1.0 };
        let dx = if cell.file >= slot.file { 1.0 } else { -1.0 };

        let offset = start.offset(0.0, dy * self.lane_offset_mm);
        let lane_x = parked.x + dx * self.lane_offset_mm;
        let lane_corner = MillimeterPoint::new(lane_x, offset.y);
        let lane_end = MillimeterPoint::new(lane_x, parked.y);
        [start, offset, lane_corner, lane_end, parked]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::gantry_config::GantryConfig;

    fn lane() -> ParkingLane {
        let config = GantryConfig::default();
        ParkingLane::new(CoordinateMapper::new(&config), config.lane_offset_mm)
    }

    fn is_cell_centre(mapper: &CoordinateMapper, p: MillimeterPoint) -> bool {
        p.approx_eq(mapper.cell_to_mm(mapper.mm_to_nearest_cell(p)), 1e-6)
    }

    #[test]
    fn lane_waypoints_stay_off_cell_centres() {
        let mapper = CoordinateMapper::default();
        let steps = lane().to_slot(GridCell::new(4, 4), GridCell::new(8, 6));
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].from, mapper.cell_to_mm(GridCell::new(4, 4)));
        assert_eq!(steps[3].to, mapper.cell_to_mm(GridCell::new(8, 6)));
        for step in &steps[..3] {
            assert!(!is_cell_centre(&mapper, step.to), "{step} ends on a cell centre");
        }
        // Each step moves along exactly one axis.
        for step in &steps {
            let dx = (step.to.x - step.from.x).abs();
            let dy = (step.to.y - step.from.y).abs();
            assert!(dx < 1e-9 || dy < 1e-9, "{step} is diagonal");
        }
    }

    #[test]
    fn from_slot_retraces_to_slot() {
        let l = lane();
        let out = l.to_slot(GridCell::new(2, 0), GridCell::new(2, -1));
        let back = l.from_slot(GridCell::new(2, -1), GridCell::new(2, 0));
        for (a, b) in out.iter().zip(back.iter().rev()) {
            assert_eq!(a.from, b.to);
            assert_eq!(a.to, b.from);
        }
    }
}
