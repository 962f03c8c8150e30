//! Game-long state: the current and previous FEN and the parking ledger.
//!
//! Planning never mutates the session. A plan carries the ledger and FEN the
//! board will have once it has been executed, and `commit` adopts them, so a
//! run that fails half way leaves the session describing the last position
//! that was physically completed.

use log::info;

use crate::board_state::chess_rules::STARTING_POSITION_FEN;
use crate::choreography::move_choreographer::MoveChoreographer;
use crate::choreography::move_record::{MoveRecord, MoveRequest};
use crate::choreography::reset_choreographer::ResetChoreographer;
use crate::choreography::step::Choreography;
use crate::errors::RobotResult;
use crate::geometry::gantry_config::GantryConfig;
use crate::parking::parking_ledger::ParkingLedger;

/// Choreographies to run plus the session state they lead to.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub choreographies: Vec<Choreography>,
    ledger: ParkingLedger,
    fen: String,
}

impl SessionPlan {
    pub fn resulting_fen(&self) -> &str {
        &self.fen
    }
}

#[derive(Debug, Clone)]
pub struct BoardSession {
    choreographer: MoveChoreographer,
    resetter: ResetChoreographer,
    ledger: ParkingLedger,
    current_fen: String,
    previous_fen: Option<String>,
}

impl BoardSession {
    /// Session at the standard starting position with empty parking.
    pub fn new(config: &GantryConfig) -> Self {
        Self {
            choreographer: MoveChoreographer::new(config),
            resetter: ResetChoreographer::new(config),
            ledger: ParkingLedger::new(),
            current_fen: STARTING_POSITION_FEN.to_owned(),
            previous_fen: None,
        }
    }

    /// Session resumed mid-game; parked pieces are inferred from the FEN.
    pub fn from_fen(config: &GantryConfig, fen: &str) -> RobotResult<Self> {
        Ok(Self {
            ledger: ParkingLedger::from_fen(fen)?,
            current_fen: fen.to_owned(),
            ..Self::new(config)
        })
    }

    pub fn current_fen(&self) -> &str {
        &self.current_fen
    }

    pub fn previous_fen(&self) -> Option<&str> {
        self.previous_fen.as_deref()
    }

    pub fn ledger(&self) -> &ParkingLedger {
        &self.ledger
    }

    pub fn plan_move(&self, record: &MoveRecord) -> RobotResult<SessionPlan> {
        let request = MoveRequest::from_record(record)?;
        let mut ledger = self.ledger.clone();
        let choreography = self.choreographer.plan_with_ledger(&request, &mut ledger);
        Ok(SessionPlan {
            choreographies: vec![choreography],
            ledger,
            fen: request.fen,
        })
    }

    pub fn plan_reset(&self, target_fen: &str) -> RobotResult<SessionPlan> {
        let mut ledger = self.ledger.clone();
        let reset = self
            .resetter
            .plan_with_ledger(&self.current_fen, target_fen, &mut ledger)?;
        Ok(SessionPlan {
            choreographies: reset.clearing.into_iter().chain(reset.dealing).collect(),
            ledger,
            fen: target_fen.to_owned(),
        })
    }

    /// Adopt the state reached by a fully executed plan.
    pub fn commit(&mut self, plan: SessionPlan) {
        info!("session: {} -> {}", self.current_fen, plan.fen);
        let previous = std::mem::replace(&mut self.current_fen, plan.fen);
        self.previous_fen = Some(previous);
        self.ledger = plan.ledger;
    }
}
