//! Core value types shared by board analysis, parking and choreography.

use std::fmt;

use crate::errors::{RobotError, RobotResult};
use crate::utils::algebraic::cell_to_algebraic;

/// Piece color. `Light` is white, `Dark` is black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Light, Color::Dark];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Color::Light => 0,
            Color::Dark => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Parse the color names used by move records (`"white"` / `"black"`).
    pub fn from_name(name: &str) -> RobotResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "white" | "w" | "light" => Ok(Color::Light),
            "black" | "b" | "dark" => Ok(Color::Dark),
            other => Err(RobotError::malformed(format!("unknown color '{other}'"))),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Color::Light => "white",
            Color::Dark => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Piece kind (color is represented separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    /// Parse the piece names used by move records (`"queen"`, `"pawn"`, ...).
    /// Single FEN letters are accepted as well.
    pub fn from_name(name: &str) -> RobotResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pawn" | "p" => Ok(PieceKind::Pawn),
            "knight" | "n" => Ok(PieceKind::Knight),
            "bishop" | "b" => Ok(PieceKind::Bishop),
            "rook" | "r" => Ok(PieceKind::Rook),
            "queen" | "q" => Ok(PieceKind::Queen),
            "king" | "k" => Ok(PieceKind::King),
            other => Err(RobotError::malformed(format!("unknown piece '{other}'"))),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid cell as `(file_idx, rank_idx)`.
///
/// `0..=7` on both axes is the playing area; `-1` and `8` address the
/// off-board parking row/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub file: i8,
    pub rank: i8,
}

impl GridCell {
    #[inline]
    pub const fn new(file: i8, rank: i8) -> Self {
        Self { file, rank }
    }

    #[inline]
    pub const fn is_on_board(self) -> bool {
        self.file >= 0 && self.file <= 7 && self.rank >= 0 && self.rank <= 7
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match cell_to_algebraic(*self) {
            Ok(square) => f.write_str(&square),
            Err(_) => write!(f, "({}, {})", self.file, self.rank),
        }
    }
}

/// A piece standing on the board, as enumerated from a FEN placement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedPiece {
    pub cell: GridCell,
    pub color: Color,
    pub kind: PieceKind,
}
