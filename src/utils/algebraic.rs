//! Algebraic square conversions.
//!
//! Converts between human-readable coordinates (e.g., `e4`) and grid cells
//! used by occupancy, routing and parking.

use crate::board_state::chess_types::GridCell;
use crate::errors::{RobotError, RobotResult};

/// Convert algebraic notation (for example: "e4") to a grid cell.
/// Upper-case files are accepted; surrounding whitespace is not.
#[inline]
pub fn algebraic_to_cell(square: &str) -> RobotResult<GridCell> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(RobotError::malformed(format!("invalid algebraic square: {square:?}")));
    }

    let file = bytes[0].to_ascii_lowercase();
    let rank = bytes[1];

    if !(b'a'..=b'h').contains(&file) {
        return Err(RobotError::malformed(format!("invalid algebraic file: {}", file as char)));
    }
    if !(b'1'..=b'8').contains(&rank) {
        return Err(RobotError::malformed(format!("invalid algebraic rank: {}", rank as char)));
    }

    Ok(GridCell::new((file - b'a') as i8, (rank - b'1') as i8))
}

/// Convert an on-board grid cell to algebraic notation (for example: "e4").
#[inline]
pub fn cell_to_algebraic(cell: GridCell) -> RobotResult<String> {
    if !cell.is_on_board() {
        return Err(RobotError::malformed(format!(
            "cell ({}, {}) is off the board",
            cell.file, cell.rank
        )));
    }

    let file_char = char::from(b'a' + cell.file as u8);
    let rank_char = char::from(b'1' + cell.rank as u8);
    Ok(format!("{file_char}{rank_char}"))
}
