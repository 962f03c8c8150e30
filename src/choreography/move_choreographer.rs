//! Step assembly per move kind.
//!
//! Composition order matters: a piece leaving the board goes first so the
//! mover never lands on it, and the pawn of a promotion is parked before its
//! replacement comes in.

use log::{debug, info};

use crate::board_state::chess_types::{Color, GridCell, PieceKind};
use crate::choreography::move_record::{CastlingLeg, MoveDetail, MoveRecord, MoveRequest};
use crate::choreography::obstacle_router::ObstacleRouter;
use crate::choreography::parking_lane::ParkingLane;
use crate::choreography::step::{Choreography, Step};
use crate::choreography::step_quantizer::StepQuantizer;
use crate::errors::RobotResult;
use crate::geometry::coordinate_mapper::CoordinateMapper;
use crate::geometry::gantry_config::GantryConfig;
use crate::parking::parking_allocator::ParkingAllocator;
use crate::parking::parking_ledger::ParkingLedger;

#[derive(Debug, Clone, Copy)]
pub struct MoveChoreographer {
    mapper: CoordinateMapper,
    allocator: ParkingAllocator,
    router: ObstacleRouter,
    lane: ParkingLane,
    lane_offset_mm: f64,
    quantizer: StepQuantizer,
}

impl Default for MoveChoreographer {
    fn default() -> Self {
        Self::new(&GantryConfig::default())
    }
}

impl MoveChoreographer {
    pub fn new(config: &GantryConfig) -> Self {
        let mapper = CoordinateMapper::new(config);
        Self {
            mapper,
            allocator: ParkingAllocator::new(mapper),
            router: ObstacleRouter::new(mapper, config.lane_offset_mm, config.obstacle_slide_mm),
            lane: ParkingLane::new(mapper, config.lane_offset_mm),
            lane_offset_mm: config.lane_offset_mm,
            quantizer: StepQuantizer::new(config.mm_resolution, config.zero_length_epsilon),
        }
    }

    /// Validate and plan a raw record without any state from earlier moves.
    pub fn plan_record(&self, record: &MoveRecord) -> RobotResult<Choreography> {
        self.plan(&MoveRequest::from_record(record)?)
    }

    /// Plan a move with slot indices derived from the post-move FEN alone.
    pub fn plan(&self, request: &MoveRequest) -> RobotResult<Choreography> {
        let mut ledger = match request.detail {
            MoveDetail::Capture {
                captured,
                captured_color,
            } => ParkingLedger::before_move_capture(&request.fen, captured_color, captured)?,
            MoveDetail::Promotion { mover, placed } => {
                ParkingLedger::before_move_promotion(&request.fen, mover, placed, None)?
            }
            MoveDetail::PromotionCapture {
                mover,
                placed,
                captured,
            } => ParkingLedger::before_move_promotion(&request.fen, mover, placed, Some(captured))?,
            MoveDetail::Standard | MoveDetail::Castling { .. } => ParkingLedger::new(),
        };
        Ok(self.plan_with_ledger(request, &mut ledger))
    }

    /// Plan a move against a caller-owned ledger, which is updated with
    /// every piece parked or fetched.
    pub fn plan_with_ledger(&self, request: &MoveRequest, ledger: &mut ParkingLedger) -> Choreography {
        let (from, to) = (request.from, request.to);
        let steps = match &request.detail {
            MoveDetail::Standard => self.standard(request),
            MoveDetail::Capture {
                captured,
                captured_color,
            } => {
                let mut steps = self.capture_to_parking(to, *captured_color, *captured, ledger);
                steps.extend(self.standard(request));
                steps
            }
            MoveDetail::Castling { legs } => self.castling(legs),
            MoveDetail::Promotion { mover, placed } => self.promotion(from, to, *mover, *placed, ledger),
            MoveDetail::PromotionCapture {
                mover,
                placed,
                captured,
            } => {
                let slot = ledger.park(mover.opposite(), *captured, to);
                let mut steps = vec![Step::new(
                    "capture park",
                    self.mapper.cell_to_mm(to),
                    self.allocator.slot_position(slot),
                    format!("{} {captured} from {to} to slot {}", mover.opposite(), slot.index),
                )];
                steps.extend(self.promotion(from, to, *mover, *placed, ledger));
                steps
            }
        };

        let label = format!("{:?} {from}-{to}", request.kind()).to_lowercase();
        let steps = self.quantizer.compress(steps);
        info!("planned {label}: {} step(s)", steps.len());
        for step in &steps {
            debug!("  {step}");
        }
        Choreography::new(label, steps)
    }

    fn standard(&self, request: &MoveRequest) -> Vec<Step> {
        self.router.route(request.from, request.to, &request.board.occupancy).steps
    }

    fn capture_to_parking(
        &self,
        to: GridCell,
        color: Color,
        kind: PieceKind,
        ledger: &mut ParkingLedger,
    ) -> Vec<Step> {
        let slot = ledger.park(color, kind, to);
        debug!("captured {color} {kind} on {to} goes to slot {}", slot.index);
        self.lane.to_slot(to, self.allocator.slot_cell(slot))
    }

    /// Each piece runs along its own lane: the king on the board side of its
    /// rank, everything else on the edge side.
    fn castling(&self, legs: &[CastlingLeg]) -> Vec<Step> {
        let mut steps = Vec::with_capacity(legs.len() * 3);
        for leg in legs {
            let inward = if leg.from.rank < 4 { 1.0 } else { -1.0 };
            let dy = if leg.piece == PieceKind::King {
                inward * self.lane_offset_mm
            } else {
                -inward * self.lane_offset_mm
            };
            let start = self.mapper.cell_to_mm(leg.from);
            let end = self.mapper.cell_to_mm(leg.to);
            let lane_start = start.offset(0.0, dy);
            let lane_end = end.offset(0.0, dy);
            let piece = leg.piece;
            steps.push(Step::new("castle offset", start, lane_start, format!("{piece} off {}", leg.from)));
            steps.push(Step::new("castle slide", lane_start, lane_end, format!("{piece} along lane")));
            steps.push(Step::new("castle recenter", lane_end, end, format!("{piece} onto {}", leg.to)));
        }
        steps
    }

    fn promotion(
        &self,
        from: GridCell,
        to: GridCell,
        mover: Color,
        placed: PieceKind,
        ledger: &mut ParkingLedger,
    ) -> Vec<Step> {
        let pawn_slot = ledger.park(mover, PieceKind::Pawn, from);
        let placed_slot = ledger.unpark(mover, placed);
        vec![
            Step::new(
                "promotion pawn",
                self.mapper.cell_to_mm(from),
                self.allocator.slot_position(pawn_slot),
                format!("{mover} pawn from {from} to slot {}", pawn_slot.index),
            ),
            Step::new(
                "promotion place",
                self.allocator.slot_position(placed_slot),
                self.mapper.cell_to_mm(to),
                format!("{mover} {placed} from slot {} to {to}", placed_slot.index),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_state::chess_rules::STARTING_POSITION_FEN;
    use crate::utils::algebraic::algebraic_to_cell;

    fn mm(square: &str) -> crate::geometry::coordinate_mapper::MillimeterPoint {
        CoordinateMapper::default()
            .square_to_mm(square)
            .expect("test square should parse")
    }

    fn record(json: &str) -> MoveRecord {
        MoveRecord::from_json(json).expect("test record should decode")
    }

    #[test]
    fn standard_move_on_open_line_is_one_step() {
        let plan = MoveChoreographer::default()
            .plan_record(&MoveRecord::standard(
                "e2",
                "e4",
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            ))
            .expect("move should plan");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].from, mm("e2"));
        assert_eq!(plan.steps[0].to, mm("e4"));
    }

    #[test]
    fn capture_parks_in_the_slot_after_earlier_captures() {
        // Qxe5 with one black pawn (d7) already gone before this capture.
        let plan = MoveChoreographer::default()
            .plan_record(&record(
                r#"{"from":"h5","to":"e5","fen":"rnbqkbnr/ppp2ppp/8/4Q3/8/8/PPPP1PPP/RNB1KBNR b KQkq - 0 3",
                    "type":"capture","piece_captured":"pawn","color_captured":"black"}"#,
            ))
            .expect("capture should plan");

        let slot_one = ParkingAllocator::default().pawn_slot(Color::Dark, 1);
        let parked = plan
            .steps
            .iter()
            .find(|s| s.action == "lane park")
            .expect("capture parks a piece");
        assert_eq!(parked.to, slot_one);
        assert_eq!(plan.steps[0].from, mm("e5"));

        // The mover's own traversal follows the parking run and ends on e5.
        let last = plan.steps.last().expect("plan has steps");
        assert_eq!(last.to, mm("e5"));
    }

    #[test]
    fn castling_runs_king_then_rook_on_separate_lanes() {
        let plan = MoveChoreographer::default()
            .plan_record(&record(
                r#"{"from":"e1","to":"g1","fen":"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1RK1 b kq - 1 1",
                    "type":"castling","moves":[{"from":"e1","to":"g1","piece":"king","order":1},
                                               {"from":"h1","to":"f1","piece":"rook","order":2}]}"#,
            ))
            .expect("castling should plan");

        assert_eq!(plan.len(), 6);
        let actions: Vec<&str> = plan.steps.iter().map(|s| s.action).collect();
        assert_eq!(
            actions,
            vec![
                "castle offset",
                "castle slide",
                "castle recenter",
                "castle offset",
                "castle slide",
                "castle recenter"
            ]
        );
        assert_eq!(plan.steps[0].from, mm("e1"));
        assert_eq!(plan.steps[2].to, mm("g1"));
        assert_eq!(plan.steps[3].from, mm("h1"));
        assert_eq!(plan.steps[5].to, mm("f1"));

        let king_lane = plan.steps[1].from.y;
        let rook_lane = plan.steps[4].from.y;
        assert!(king_lane > mm("e1").y);
        assert!(rook_lane < mm("h1").y);
        assert!((king_lane - rook_lane).abs() > 1.0);
    }

    #[test]
    fn promotion_parks_pawn_then_fetches_queen() {
        // Only the e-pawn is missing for white and no queen was captured.
        let plan = MoveChoreographer::default()
            .plan_record(&record(
                r#"{"from":"e7","to":"e8","fen":"rnbqQbnr/pppp1ppp/8/8/8/8/PPPP1PPP/RNBQKBNR b KQ - 0 9",
                    "type":"promotion","piece_placed":"queen","color":"white"}"#,
            ))
            .expect("promotion should plan");

        let allocator = ParkingAllocator::default();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps[0].from, mm("e7"));
        assert_eq!(plan.steps[0].to, allocator.pawn_slot(Color::Light, 0));
        assert_eq!(plan.steps[1].from, allocator.special_slot(PieceKind::Queen, Color::Light, 0));
        assert_eq!(plan.steps[1].to, mm("e8"));
    }

    #[test]
    fn promotion_capture_clears_the_square_first() {
        let plan = MoveChoreographer::default()
            .plan_record(&record(
                r#"{"from":"e7","to":"d8","fen":"rnbQkbnr/pppp1ppp/8/8/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 9",
                    "type":"promotion_capture","piece_captured":"queen","piece_placed":"queen"}"#,
            ))
            .expect("promotion capture should plan");

        let allocator = ParkingAllocator::default();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.steps[0].from, mm("d8"));
        assert_eq!(plan.steps[0].to, allocator.special_slot(PieceKind::Queen, Color::Dark, 0));
        assert_eq!(plan.steps[1].to, allocator.pawn_slot(Color::Light, 0));
        assert_eq!(plan.steps[2].to, mm("d8"));
    }

    #[test]
    fn ledger_path_matches_stateless_path_for_a_capture() {
        let chor = MoveChoreographer::default();
        let request = MoveRequest::from_record(&record(
            r#"{"from":"d4","to":"e5","fen":"rnbqkbnr/pppp1ppp/8/4P3/8/8/PPP1PPPP/RNBQKBNR b KQkq - 0 2",
                "type":"capture","piece_captured":"pawn"}"#,
        ))
        .expect("record should validate");

        let mut ledger = ParkingLedger::from_fen(STARTING_POSITION_FEN).expect("fen should parse");
        let with_ledger = chor.plan_with_ledger(&request, &mut ledger);
        let stateless = chor.plan(&request).expect("capture should plan");
        assert_eq!(with_ledger, stateless);
        assert_eq!(ledger.parked_count(Color::Dark, PieceKind::Pawn), 1);
        assert_eq!(
            algebraic_to_cell("e5").expect("square should parse"),
            request.to
        );
    }

    #[test]
    fn unknown_move_type_produces_no_steps() {
        let mut r = MoveRecord::standard("e2", "e4", STARTING_POSITION_FEN);
        r.move_type = Some("en_passant_backwards".into());
        assert!(MoveChoreographer::default().plan_record(&r).is_err());
    }
}
