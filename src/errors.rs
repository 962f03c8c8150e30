//! Errors used throughout the board robot.
//!
//! `RobotError` is the single error type returned by FEN analysis, move-record
//! decoding, choreography and execution. Input-related variants are raised
//! before any motion is attempted; execution variants carry the list of
//! obstacles that were left displaced on the physical board so the caller
//! can ask an operator to put them back.
//!
//! Parking-slot overflow is intentionally not an error: the allocator clamps
//! to the last slot and logs a warning.

use thiserror::Error;

use crate::choreography::step::DisplacedObstacle;
use crate::execution::transport::Acknowledgement;

pub type RobotResult<T> = Result<T, RobotError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RobotError {
    /// FEN without a placement field, unparsable square, missing record
    /// field, unknown piece/color name or malformed JSON.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The `type` field of a move record named no known move kind.
    #[error("unsupported move kind: {0}")]
    UnsupportedMoveKind(String),

    /// A step was not acknowledged. Remaining steps were not sent.
    #[error("transport failure on step {step_index} ({action}): {ack:?}, {} obstacle(s) left displaced", stranded.len())]
    TransportFailure {
        step_index: usize,
        action: String,
        ack: Acknowledgement,
        stranded: Vec<DisplacedObstacle>,
    },

    /// The primary move finished but an obstacle could not be slid back.
    #[error("obstacle recenter failed: {ack:?}, {} obstacle(s) need operator intervention", stranded.len())]
    RecenterFailed {
        ack: Acknowledgement,
        stranded: Vec<DisplacedObstacle>,
    },

    /// The cancellation flag was observed before step `step_index`.
    #[error("cancelled before step {step_index}, {} obstacle(s) left displaced", stranded.len())]
    Cancelled {
        step_index: usize,
        stranded: Vec<DisplacedObstacle>,
    },

    #[error("invalid gantry configuration: {0}")]
    InvalidConfig(String),
}

impl RobotError {
    /// Obstacles that are physically out of place after this error.
    pub fn stranded_obstacles(&self) -> &[DisplacedObstacle] {
        match self {
            RobotError::TransportFailure { stranded, .. }
            | RobotError::RecenterFailed { stranded, .. }
            | RobotError::Cancelled { stranded, .. } => stranded,
            _ => &[],
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        RobotError::MalformedInput(message.into())
    }
}
