//! Terminal view of the board and its parking area.
//!
//! The playing area is drawn with the parking border around it (file −1/8,
//! rank −1/8), so parked pieces show up where the gantry put them.

use crate::board_state::board_state::BoardState;
use crate::board_state::chess_types::{Color, GridCell, PieceKind};
use crate::parking::parking_allocator::ParkingAllocator;
use crate::parking::parking_ledger::ParkingLedger;

/// Render the placement of `board` plus every occupied slot in `ledger`.
pub fn render_board(board: &BoardState, ledger: &ParkingLedger, allocator: &ParkingAllocator) -> String {
    let mut out = String::new();
    out.push_str("    a b c d e f g h\n");

    for rank in (-1..=8).rev() {
        if (0..8).contains(&rank) {
            out.push(char::from(b'1' + rank as u8));
        } else {
            out.push(' ');
        }
        out.push(' ');

        for file in -1..=8 {
            let cell = GridCell::new(file, rank);
            let symbol = board
                .piece_on(cell)
                .map(|p| piece_to_unicode(p.color, p.kind))
                .or_else(|| parked_on(cell, ledger, allocator))
                .unwrap_or(if cell.is_on_board() { '·' } else { ' ' });
            out.push(symbol);
            if file < 8 {
                out.push(' ');
            }
        }
        out.push('\n');
    }

    out.push_str("    a b c d e f g h");
    out
}

fn parked_on(cell: GridCell, ledger: &ParkingLedger, allocator: &ParkingAllocator) -> Option<char> {
    ledger
        .occupied_slots()
        .find(|(slot, _)| allocator.slot_cell(*slot) == cell)
        .map(|(slot, _)| piece_to_unicode(slot.color, slot.kind))
}

fn piece_to_unicode(color: Color, piece: PieceKind) -> char {
    match (color, piece) {
        (Color::Light, PieceKind::Pawn) => '♙',
        (Color::Light, PieceKind::Knight) => '♘',
        (Color::Light, PieceKind::Bishop) => '♗',
        (Color::Light, PieceKind::Rook) => '♖',
        (Color::Light, PieceKind::Queen) => '♕',
        (Color::Light, PieceKind::King) => '♔',
        (Color::Dark, PieceKind::Pawn) => '♟',
        (Color::Dark, PieceKind::Knight) => '♞',
        (Color::Dark, PieceKind::Bishop) => '♝',
        (Color::Dark, PieceKind::Rook) => '♜',
        (Color::Dark, PieceKind::Queen) => '♛',
        (Color::Dark, PieceKind::King) => '♚',
    }
}
