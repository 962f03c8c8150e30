//! Full board reset.
//!
//! Every piece on the board is first carried to parking, then the target
//! position is dealt back out of parking. Slot indices come from a ledger
//! walked in FEN scan order rather than from FEN deltas, so the plan is the
//! same however the game got to the current position. Pieces captured
//! during the game already sit in the low slots, which is why the default
//! ledger is seeded from the current position's captured counts.

use log::info;

use crate::board_state::board_state::BoardState;
use crate::choreography::parking_lane::ParkingLane;
use crate::choreography::step::Choreography;
use crate::choreography::step_quantizer::StepQuantizer;
use crate::errors::RobotResult;
use crate::geometry::coordinate_mapper::CoordinateMapper;
use crate::geometry::gantry_config::GantryConfig;
use crate::parking::parking_allocator::ParkingAllocator;
use crate::parking::parking_ledger::ParkingLedger;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetPlan {
    /// One choreography per piece carried off the board.
    pub clearing: Vec<Choreography>,
    /// One choreography per piece dealt onto the target position.
    pub dealing: Vec<Choreography>,
}

impl ResetPlan {
    pub fn choreographies(&self) -> impl Iterator<Item = &Choreography> {
        self.clearing.iter().chain(self.dealing.iter())
    }

    pub fn step_count(&self) -> usize {
        self.choreographies().map(Choreography::len).sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResetChoreographer {
    allocator: ParkingAllocator,
    lane: ParkingLane,
    quantizer: StepQuantizer,
}

impl Default for ResetChoreographer {
    fn default() -> Self {
        Self::new(&GantryConfig::default())
    }
}

impl ResetChoreographer {
    pub fn new(config: &GantryConfig) -> Self {
        let mapper = CoordinateMapper::new(config);
        Self {
            allocator: ParkingAllocator::new(mapper),
            lane: ParkingLane::new(mapper, config.lane_offset_mm),
            quantizer: StepQuantizer::new(config.mm_resolution, config.zero_length_epsilon),
        }
    }

    pub fn plan(&self, current_fen: &str, target_fen: &str) -> RobotResult<ResetPlan> {
        let mut ledger = ParkingLedger::from_fen(current_fen)?;
        self.plan_with_ledger(current_fen, target_fen, &mut ledger)
    }

    pub fn plan_with_ledger(
        &self,
        current_fen: &str,
        target_fen: &str,
        ledger: &mut ParkingLedger,
    ) -> RobotResult<ResetPlan> {
        let current = BoardState::from_fen(current_fen)?;
        let target = BoardState::from_fen(target_fen)?;
        let mut plan = ResetPlan::default();

        for piece in &current.pieces {
            let slot = ledger.park(piece.color, piece.kind, piece.cell);
            let steps = self.lane.to_slot(piece.cell, self.allocator.slot_cell(slot));
            plan.clearing.push(Choreography::new(
                format!("clear {} {} {}", piece.color, piece.kind, piece.cell),
                self.quantizer.compress(steps),
            ));
        }

        for piece in &target.pieces {
            let slot = ledger.unpark(piece.color, piece.kind);
            let steps = self.lane.from_slot(self.allocator.slot_cell(slot), piece.cell);
            plan.dealing.push(Choreography::new(
                format!("deal {} {} {}", piece.color, piece.kind, piece.cell),
                self.quantizer.compress(steps),
            ));
        }

        info!(
            "reset planned: {} piece(s) cleared, {} dealt, {} step(s)",
            plan.clearing.len(),
            plan.dealing.len(),
            plan.step_count()
        );
        Ok(plan)
    }
}
