//! Off-board parking geometry.
//!
//! Pawns park in the column just outside their owner's left edge (white at
//! file -1 counting up from rank 1, black at file 8 counting down from rank
//! 8). Every other kind parks in the row in front of its owner (rank -1 for
//! white, rank 8 for black) on that kind's starting files, left-preferred
//! from the owner's seat.
//!
//! Slot indices beyond a kind's file list (a third queen, say) clamp to the
//! last file, so two pieces share a nominal slot. That is logged, not
//! rejected.

use log::warn;

use crate::board_state::chess_rules::starting_files_left_preferred;
use crate::board_state::chess_types::{Color, GridCell, PieceKind};
use crate::geometry::coordinate_mapper::{CoordinateMapper, MillimeterPoint};

/// One parking position: the `index`-th unit of `kind`/`color` to leave the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParkingSlot {
    pub color: Color,
    pub kind: PieceKind,
    pub index: usize,
}

impl ParkingSlot {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind, index: usize) -> Self {
        Self { color, kind, index }
    }
}

/// File of the pawn parking column.
#[inline]
pub const fn pawn_parking_file(color: Color) -> i8 {
    match color {
        Color::Light => -1,
        Color::Dark => 8,
    }
}

/// Rank of the non-pawn parking row.
#[inline]
pub const fn front_parking_rank(color: Color) -> i8 {
    match color {
        Color::Light => -1,
        Color::Dark => 8,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParkingAllocator {
    mapper: CoordinateMapper,
}

impl ParkingAllocator {
    pub fn new(mapper: CoordinateMapper) -> Self {
        Self { mapper }
    }

    pub fn pawn_slot_cell(&self, color: Color, slot_index: usize) -> GridCell {
        let depth = if slot_index > 7 {
            warn!("pawn parking slot {slot_index} for {color} exceeds the column, clamping to 7");
            7
        } else {
            slot_index as i8
        };
        let rank = match color {
            Color::Light => depth,
            Color::Dark => 7 - depth,
        };
        GridCell::new(pawn_parking_file(color), rank)
    }

    pub fn pawn_slot(&self, color: Color, slot_index: usize) -> MillimeterPoint {
        self.mapper.cell_to_mm(self.pawn_slot_cell(color, slot_index))
    }

    pub fn special_slot_cell(&self, kind: PieceKind, color: Color, slot_index: usize) -> GridCell {
        let files = starting_files_left_preferred(kind, color);
        let file = match files.get(slot_index) {
            Some(&file) => file,
            None => {
                let last = files.last().copied().unwrap_or(0);
                warn!(
                    "parking slot overflow: {color} {kind} slot {slot_index} clamped to file {last} (shared slot)"
                );
                last
            }
        };
        GridCell::new(file, front_parking_rank(color))
    }

    pub fn special_slot(&self, kind: PieceKind, color: Color, slot_index: usize) -> MillimeterPoint {
        self.mapper.cell_to_mm(self.special_slot_cell(kind, color, slot_index))
    }

    pub fn slot_cell(&self, slot: ParkingSlot) -> GridCell {
        match slot.kind {
            PieceKind::Pawn => self.pawn_slot_cell(slot.color, slot.index),
            kind => self.special_slot_cell(kind, slot.color, slot.index),
        }
    }

    pub fn slot_position(&self, slot: ParkingSlot) -> MillimeterPoint {
        self.mapper.cell_to_mm(self.slot_cell(slot))
    }
}
