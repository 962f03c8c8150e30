//! Inbound move records.
//!
//! `MoveRecord` mirrors the JSON produced by the ingestion front end:
//!
//! ```json
//! {"from": "h5", "to": "f7", "fen": "...", "type": "capture",
//!  "piece_captured": "pawn", "color_captured": "black"}
//! ```
//!
//! `MoveRequest` is the validated form the choreographer consumes. Every
//! required field is checked here so a bad record fails before any motion.

use serde::{Deserialize, Serialize};

use crate::board_state::board_state::BoardState;
use crate::board_state::chess_types::{Color, GridCell, PieceKind};
use crate::errors::{RobotError, RobotResult};
use crate::utils::algebraic::algebraic_to_cell;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastlingLegRecord {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub piece: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub fen: Option<String>,
    #[serde(default, rename = "type")]
    pub move_type: Option<String>,
    #[serde(default)]
    pub piece_captured: Option<String>,
    #[serde(default)]
    pub color_captured: Option<String>,
    #[serde(default)]
    pub piece_placed: Option<String>,
    /// Color of the side making the move; inferred from the FEN when absent.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub moves: Option<Vec<CastlingLegRecord>>,
}

impl MoveRecord {
    pub fn from_json(json: &str) -> RobotResult<Self> {
        serde_json::from_str(json).map_err(|e| RobotError::malformed(format!("move record is not valid JSON: {e}")))
    }

    /// Standard move record, handy for scripted games and tests.
    pub fn standard(from: &str, to: &str, fen: &str) -> Self {
        Self {
            from: Some(from.to_owned()),
            to: Some(to.to_owned()),
            fen: Some(fen.to_owned()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Standard,
    Capture,
    Castling,
    Promotion,
    PromotionCapture,
}

impl MoveKind {
    pub fn from_type(move_type: Option<&str>) -> RobotResult<Self> {
        match move_type {
            None | Some("standard") => Ok(MoveKind::Standard),
            Some("capture") => Ok(MoveKind::Capture),
            Some("castling") => Ok(MoveKind::Castling),
            Some("promotion") => Ok(MoveKind::Promotion),
            Some("promotion_capture") => Ok(MoveKind::PromotionCapture),
            Some(other) => Err(RobotError::UnsupportedMoveKind(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingLeg {
    pub from: GridCell,
    pub to: GridCell,
    pub piece: PieceKind,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveDetail {
    Standard,
    Capture {
        captured: PieceKind,
        captured_color: Color,
    },
    /// King and rook legs, already sorted by execution order.
    Castling { legs: Vec<CastlingLeg> },
    Promotion {
        mover: Color,
        placed: PieceKind,
    },
    PromotionCapture {
        mover: Color,
        placed: PieceKind,
        captured: PieceKind,
    },
}

#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub from: GridCell,
    pub to: GridCell,
    pub fen: String,
    /// Post-move board, parsed once.
    pub board: BoardState,
    pub detail: MoveDetail,
}

impl MoveRequest {
    pub fn from_record(record: &MoveRecord) -> RobotResult<Self> {
        let kind = MoveKind::from_type(record.move_type.as_deref())?;
        let from = algebraic_to_cell(required(&record.from, "from")?)?;
        let to = algebraic_to_cell(required(&record.to, "to")?)?;
        let fen = required(&record.fen, "fen")?.to_owned();
        let board = BoardState::from_fen(&fen)?;

        let detail = match kind {
            MoveKind::Standard => MoveDetail::Standard,
            MoveKind::Capture => {
                let captured = PieceKind::from_name(required(&record.piece_captured, "piece_captured")?)?;
                let captured_color = match &record.color_captured {
                    Some(name) => Color::from_name(name)?,
                    None => mover_color(record, &board, to)?.opposite(),
                };
                MoveDetail::Capture {
                    captured,
                    captured_color,
                }
            }
            MoveKind::Castling => MoveDetail::Castling {
                legs: castling_legs(record, from, to)?,
            },
            MoveKind::Promotion => MoveDetail::Promotion {
                mover: mover_color(record, &board, to)?,
                placed: placed_piece(record)?,
            },
            MoveKind::PromotionCapture => MoveDetail::PromotionCapture {
                mover: mover_color(record, &board, to)?,
                placed: placed_piece(record)?,
                captured: PieceKind::from_name(required(&record.piece_captured, "piece_captured")?)?,
            },
        };

        Ok(Self {
            from,
            to,
            fen,
            board,
            detail,
        })
    }

    pub fn kind(&self) -> MoveKind {
        match self.detail {
            MoveDetail::Standard => MoveKind::Standard,
            MoveDetail::Capture { .. } => MoveKind::Capture,
            MoveDetail::Castling { .. } => MoveKind::Castling,
            MoveDetail::Promotion { .. } => MoveKind::Promotion,
            MoveDetail::PromotionCapture { .. } => MoveKind::PromotionCapture,
        }
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> RobotResult<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| RobotError::malformed(format!("move record is missing '{name}'")))
}

fn placed_piece(record: &MoveRecord) -> RobotResult<PieceKind> {
    match &record.piece_placed {
        Some(name) => PieceKind::from_name(name),
        None => Ok(PieceKind::Queen),
    }
}

/// Explicit `color` field, else the piece now standing on `to`, else the
/// side whose promotion rank `to` is on.
fn mover_color(record: &MoveRecord, board: &BoardState, to: GridCell) -> RobotResult<Color> {
    if let Some(name) = &record.color {
        return Color::from_name(name);
    }
    if let Some(piece) = board.piece_on(to) {
        return Ok(piece.color);
    }
    Ok(if to.rank == 0 { Color::Dark } else { Color::Light })
}

fn castling_legs(record: &MoveRecord, from: GridCell, to: GridCell) -> RobotResult<Vec<CastlingLeg>> {
    let mut legs = match &record.moves {
        Some(moves) if !moves.is_empty() => moves
            .iter()
            .enumerate()
            .map(|(i, leg)| {
                let piece = match &leg.piece {
                    Some(name) => PieceKind::from_name(name)?,
                    None if i == 0 => PieceKind::King,
                    None => PieceKind::Rook,
                };
                Ok(CastlingLeg {
                    from: algebraic_to_cell(&leg.from)?,
                    to: algebraic_to_cell(&leg.to)?,
                    piece,
                    order: leg.order.unwrap_or(i as u32 + 1),
                })
            })
            .collect::<RobotResult<Vec<_>>>()?,
        _ => {
            let kingside = to.file > from.file;
            let (rook_from, rook_to) = if kingside { (7, 5) } else { (0, 3) };
            vec![
                CastlingLeg {
                    from,
                    to,
                    piece: PieceKind::King,
                    order: 1,
                },
                CastlingLeg {
                    from: GridCell::new(rook_from, from.rank),
                    to: GridCell::new(rook_to, from.rank),
                    piece: PieceKind::Rook,
                    order: 2,
                },
            ]
        }
    };
    legs.sort_by_key(|leg| leg.order);
    Ok(legs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_capture_record_from_json() {
        let json = r#"{"from":"h5","to":"f7","fen":"r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
                       "type":"capture","piece_captured":"pawn","color_captured":"black"}"#;
        let record = MoveRecord::from_json(json).expect("json should decode");
        let request = MoveRequest::from_record(&record).expect("record should validate");
        assert_eq!(request.kind(), MoveKind::Capture);
        assert_eq!(
            request.detail,
            MoveDetail::Capture {
                captured: PieceKind::Pawn,
                captured_color: Color::Dark
            }
        );
    }

    #[test]
    fn captured_color_is_inferred_from_the_mover() {
        let record = MoveRecord {
            move_type: Some("capture".into()),
            piece_captured: Some("knight".into()),
            ..MoveRecord::standard("c4", "f7", "4k3/5B2/8/8/8/8/8/4K3 b - - 0 1")
        };
        let request = MoveRequest::from_record(&record).expect("record should validate");
        assert_eq!(
            request.detail,
            MoveDetail::Capture {
                captured: PieceKind::Knight,
                captured_color: Color::Dark
            }
        );
    }

    #[test]
    fn missing_fields_are_malformed() {
        let mut record = MoveRecord::standard("e2", "e4", "8/8/8/8/4P3/8/8/8 b - - 0 1");
        record.fen = None;
        assert!(matches!(MoveRequest::from_record(&record), Err(RobotError::MalformedInput(_))));

        let capture = MoveRecord {
            move_type: Some("capture".into()),
            ..MoveRecord::standard("e4", "d5", "8/8/8/3P4/8/8/8/8 b - - 0 1")
        };
        assert!(matches!(MoveRequest::from_record(&capture), Err(RobotError::MalformedInput(_))));
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let record = MoveRecord {
            move_type: Some("teleport".into()),
            ..MoveRecord::standard("e2", "e4", "8/8/8/8/4P3/8/8/8 b - - 0 1")
        };
        assert_eq!(
            MoveRequest::from_record(&record).expect_err("teleport is not a move kind"),
            RobotError::UnsupportedMoveKind("teleport".into())
        );
    }

    #[test]
    fn castling_legs_follow_explicit_order() {
        let json = r#"{"from":"e1","to":"g1","fen":"4k3/8/8/8/8/8/8/5RK1 b - - 1 1","type":"castling",
                       "moves":[{"from":"h1","to":"f1","piece":"rook","order":2},
                                {"from":"e1","to":"g1","piece":"king","order":1}]}"#;
        let request = MoveRequest::from_record(&MoveRecord::from_json(json).expect("json should decode"))
            .expect("record should validate");
        let MoveDetail::Castling { legs } = request.detail else {
            panic!("expected castling detail");
        };
        assert_eq!(legs[0].piece, PieceKind::King);
        assert_eq!(legs[1].piece, PieceKind::Rook);
        assert_eq!(legs[1].from, GridCell::new(7, 0));
    }

    #[test]
    fn castling_legs_are_inferred_without_a_move_list() {
        let record = MoveRecord {
            move_type: Some("castling".into()),
            ..MoveRecord::standard("e8", "c8", "2kr4/8/8/8/8/8/8/4K3 w - - 1 2")
        };
        let request = MoveRequest::from_record(&record).expect("record should validate");
        let MoveDetail::Castling { legs } = request.detail else {
            panic!("expected castling detail");
        };
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[1].from, GridCell::new(0, 7));
        assert_eq!(legs[1].to, GridCell::new(3, 7));
    }

    #[test]
    fn promotion_defaults_to_queen_and_reads_mover_from_fen() {
        let record = MoveRecord {
            move_type: Some("promotion".into()),
            ..MoveRecord::standard("b2", "b1", "4k3/8/8/8/8/8/8/1n2K3 w - - 0 50")
        };
        let request = MoveRequest::from_record(&record).expect("record should validate");
        assert_eq!(
            request.detail,
            MoveDetail::Promotion {
                mover: Color::Dark,
                placed: PieceKind::Queen
            }
        );
    }
}
