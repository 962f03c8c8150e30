//! Explicit parking-slot occupancy.
//!
//! Each (color, kind) owns a stack of slots: parking a piece takes the next
//! free index, fetching a piece for promotion returns the most recently
//! parked one. With nothing parked, slot 0 is where the spare promotion
//! piece of that kind waits.
//!
//! A ledger can live across a whole game (see `BoardSession`) or be rebuilt
//! for a single move from the post-move FEN with `before_move_*`, which rolls
//! the move's own effect back out of the FEN-derived captured counts.

use std::collections::BTreeMap;

use log::debug;

use crate::board_state::board_state::{BoardState, PieceCounts};
use crate::board_state::chess_types::{Color, GridCell, PieceKind};
use crate::errors::RobotResult;
use crate::parking::parking_allocator::ParkingSlot;

/// What sits in an occupied slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOccupancy {
    /// Counted from a FEN; the square it came from is unknown.
    Inferred,
    /// Parked by a choreography from `from`.
    Parked { from: GridCell },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParkingLedger {
    depth: [[usize; 6]; 2],
    occupants: BTreeMap<ParkingSlot, SlotOccupancy>,
}

impl ParkingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one inferred occupant per captured piece.
    pub fn from_captured(captured: &PieceCounts) -> Self {
        let mut ledger = Self::new();
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for _ in 0..captured.get(color, kind) {
                    ledger.push(color, kind, SlotOccupancy::Inferred);
                }
            }
        }
        ledger
    }

    pub fn from_fen(fen: &str) -> RobotResult<Self> {
        Ok(Self::from_captured(&BoardState::from_fen(fen)?.captured()))
    }

    /// Ledger as it stood before a capture of `captured_color`/`captured_kind`
    /// whose result is `post_move_fen`.
    pub fn before_move_capture(
        post_move_fen: &str,
        captured_color: Color,
        captured_kind: PieceKind,
    ) -> RobotResult<Self> {
        let mut ledger = Self::from_fen(post_move_fen)?;
        ledger.pop(captured_color, captured_kind);
        Ok(ledger)
    }

    /// Ledger as it stood before `mover` promoted a pawn to `placed`, with an
    /// optional capture on the promotion square.
    pub fn before_move_promotion(
        post_move_fen: &str,
        mover: Color,
        placed: PieceKind,
        captured: Option<PieceKind>,
    ) -> RobotResult<Self> {
        let mut ledger = Self::from_fen(post_move_fen)?;
        if let Some(kind) = captured {
            ledger.pop(mover.opposite(), kind);
        }
        ledger.pop(mover, PieceKind::Pawn);
        // The promoted piece left its slot during the move, so the FEN
        // undercounts the parked pieces of that kind by one, unless the slot
        // was the spare (count already zero).
        if ledger.parked_count(mover, placed) > 0 {
            ledger.push(mover, placed, SlotOccupancy::Inferred);
        }
        Ok(ledger)
    }

    #[inline]
    pub fn parked_count(&self, color: Color, kind: PieceKind) -> usize {
        self.depth[color.index()][kind.index()]
    }

    pub fn occupant(&self, slot: ParkingSlot) -> Option<SlotOccupancy> {
        self.occupants.get(&slot).copied()
    }

    /// Reserve the next free slot for a piece leaving `from`.
    pub fn park(&mut self, color: Color, kind: PieceKind, from: GridCell) -> ParkingSlot {
        let slot = self.push(color, kind, SlotOccupancy::Parked { from });
        debug!("ledger: park {color} {kind} from {from} into slot {}", slot.index);
        slot
    }

    /// Slot to fetch a `kind` piece from for promotion.
    pub fn unpark(&mut self, color: Color, kind: PieceKind) -> ParkingSlot {
        match self.pop(color, kind) {
            Some((slot, _)) => {
                debug!("ledger: unpark {color} {kind} from slot {}", slot.index);
                slot
            }
            None => {
                debug!("ledger: no parked {color} {kind}, using spare in slot 0");
                ParkingSlot::new(color, kind, 0)
            }
        }
    }

    /// Every occupied slot in (color, kind, index) order.
    pub fn occupied_slots(&self) -> impl Iterator<Item = (ParkingSlot, SlotOccupancy)> + '_ {
        self.occupants.iter().map(|(slot, occupancy)| (*slot, *occupancy))
    }

    pub fn clear(&mut self) {
        self.depth = [[0; 6]; 2];
        self.occupants.clear();
    }

    fn push(&mut self, color: Color, kind: PieceKind, occupancy: SlotOccupancy) -> ParkingSlot {
        let depth = &mut self.depth[color.index()][kind.index()];
        let slot = ParkingSlot::new(color, kind, *depth);
        *depth += 1;
        self.occupants.insert(slot, occupancy);
        slot
    }

    fn pop(&mut self, color: Color, kind: PieceKind) -> Option<(ParkingSlot, SlotOccupancy)> {
        let depth = &mut self.depth[color.index()][kind.index()];
        if *depth == 0 {
            return None;
        }
        *depth -= 1;
        let slot = ParkingSlot::new(color, kind, *depth);
        let occupancy = self.occupants.remove(&slot).unwrap_or(SlotOccupancy::Inferred);
        Some((slot, occupancy))
    }
}
