//! Canonical chess-rule constants.
//!
//! Starting position, per-kind starting counts and the starting files each
//! non-pawn kind occupies. Parking geometry mirrors these files.

use crate::board_state::chess_types::{Color, PieceKind};

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Number of pieces of `kind` each side starts with.
#[inline]
pub const fn starting_count(kind: PieceKind) -> u8 {
    match kind {
        PieceKind::Pawn => 8,
        PieceKind::Rook | PieceKind::Knight | PieceKind::Bishop => 2,
        PieceKind::Queen | PieceKind::King => 1,
    }
}

/// Starting files of a non-pawn kind in ascending file order.
/// Pawns start on every file.
pub const fn starting_files(kind: PieceKind) -> &'static [i8] {
    match kind {
        PieceKind::Rook => &[0, 7],
        PieceKind::Knight => &[1, 6],
        PieceKind::Bishop => &[2, 5],
        PieceKind::Queen => &[3],
        PieceKind::King => &[4],
        PieceKind::Pawn => &[0, 1, 2, 3, 4, 5, 6, 7],
    }
}

/// Starting files ordered so the file on the player's left comes first:
/// white reads a→h, black (sitting opposite) reads h→a.
pub fn starting_files_left_preferred(kind: PieceKind, color: Color) -> Vec<i8> {
    let mut files = starting_files(kind).to_vec();
    if color == Color::Dark {
        files.reverse();
    }
    files
}
