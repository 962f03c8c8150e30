//! FEN placement field analysis.
//!
//! Builds the occupied-cell set and per-color piece tallies the choreography
//! needs. Only the first whitespace-delimited FEN field is interpreted; side
//! to move, castling rights, en passant and clocks are ignored. Characters
//! that are neither digits, `/` nor piece letters are skipped so promotion
//! markers or stray annotations never abort a move.

use std::collections::BTreeSet;

use crate::board_state::chess_rules::starting_count;
use crate::board_state::chess_types::*;
use crate::errors::{RobotError, RobotResult};

/// Set of occupied cells derived from a FEN placement field.
pub type BoardOccupancy = BTreeSet<GridCell>;

/// Per-color, per-kind piece tallies (`[color][kind]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PieceCounts {
    counts: [[u8; 6]; 2],
}

impl PieceCounts {
    #[inline]
    pub fn get(&self, color: Color, kind: PieceKind) -> u8 {
        self.counts[color.index()][kind.index()]
    }

    #[inline]
    pub fn set(&mut self, color: Color, kind: PieceKind, value: u8) {
        self.counts[color.index()][kind.index()] = value;
    }

    #[inline]
    fn increment(&mut self, color: Color, kind: PieceKind) {
        let slot = &mut self.counts[color.index()][kind.index()];
        *slot = slot.saturating_add(1);
    }

    /// Sum over both colors and every kind.
    pub fn total(&self) -> u32 {
        self.counts
            .iter()
            .flat_map(|per_kind| per_kind.iter())
            .map(|&n| u32::from(n))
            .sum()
    }

    /// `max(0, start - present)` for every color/kind. Boards with more
    /// pieces than the standard start (promotions) clamp to zero.
    pub fn captured(&self) -> PieceCounts {
        let mut captured = PieceCounts::default();
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                captured.set(color, kind, starting_count(kind).saturating_sub(self.get(color, kind)));
            }
        }
        captured
    }
}

/// Snapshot of one FEN placement field.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    pub occupancy: BoardOccupancy,
    pub pieces: Vec<PlacedPiece>,
    pub counts: PieceCounts,
}

impl BoardState {
    pub fn from_fen(fen: &str) -> RobotResult<Self> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or_else(|| RobotError::malformed("FEN is missing the piece placement field"))?;

        let mut state = BoardState::default();
        let mut rank: i8 = 7;
        let mut file: i8 = 0;

        for ch in placement.chars() {
            if ch == '/' {
                rank = rank.saturating_sub(1);
                file = 0;
                continue;
            }

            if let Some(empty_count) = ch.to_digit(10) {
                file = file.saturating_add(empty_count as i8);
                continue;
            }

            let Some((color, kind)) = piece_from_fen_char(ch) else {
                continue;
            };

            let cell = GridCell::new(file, rank);
            state.occupancy.insert(cell);
            state.pieces.push(PlacedPiece { cell, color, kind });
            state.counts.increment(color, kind);
            file = file.saturating_add(1);
        }

        Ok(state)
    }

    #[inline]
    pub fn captured(&self) -> PieceCounts {
        self.counts.captured()
    }

    #[inline]
    pub fn is_occupied(&self, cell: GridCell) -> bool {
        self.occupancy.contains(&cell)
    }

    pub fn piece_on(&self, cell: GridCell) -> Option<PlacedPiece> {
        self.pieces.iter().copied().find(|p| p.cell == cell)
    }
}

/// Occupied cells of the FEN's placement field.
pub fn occupancy(fen: &str) -> RobotResult<BoardOccupancy> {
    Ok(BoardState::from_fen(fen)?.occupancy)
}

/// Pieces present per color/kind.
pub fn counts(fen: &str) -> RobotResult<PieceCounts> {
    Ok(BoardState::from_fen(fen)?.counts)
}

/// Pieces missing per color/kind relative to the standard start.
pub fn captured(fen: &str) -> RobotResult<PieceCounts> {
    Ok(BoardState::from_fen(fen)?.captured())
}

/// Every piece on the board in scan order (rank 8 first, a-file first).
pub fn placed_pieces(fen: &str) -> RobotResult<Vec<PlacedPiece>> {
    Ok(BoardState::from_fen(fen)?.pieces)
}

pub fn piece_from_fen_char(ch: char) -> Option<(Color, PieceKind)> {
    let color = if ch.is_ascii_uppercase() {
        Color::Light
    } else if ch.is_ascii_lowercase() {
        Color::Dark
    } else {
        return None;
    };

    let piece = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some((color, piece))
}
