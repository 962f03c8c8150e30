//! Physical gantry constants.
//!
//! Defaults describe the reference build: 43.6 mm squares with the centre of
//! a1 at (60.8, 46.2) mm from the homing corner. The struct deserializes from
//! JSON with every field optional so a deployment file only lists overrides.

use serde::{Deserialize, Serialize};

use crate::errors::{RobotError, RobotResult};

pub const DEFAULT_SQUARE_SIZE_MM: f64 = 43.6;
pub const DEFAULT_BOARD_ORIGIN_X_MM: f64 = 60.8;
pub const DEFAULT_BOARD_ORIGIN_Y_MM: f64 = 46.2;
pub const DEFAULT_OBSTACLE_SLIDE_MM: f64 = 9.0;
pub const DEFAULT_MM_RESOLUTION: f64 = 0.1;
pub const DEFAULT_ZERO_LENGTH_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GantryConfig {
    pub square_size_mm: f64,
    pub board_origin_x_mm: f64,
    pub board_origin_y_mm: f64,
    /// Perpendicular offset of the travel lane used by captures and castling.
    pub lane_offset_mm: f64,
    /// How far a blocking piece is pushed off the travel line.
    pub obstacle_slide_mm: f64,
    /// Smallest commanded increment; every coordinate is rounded to it.
    pub mm_resolution: f64,
    /// Steps shorter than this on both axes are dropped as no-ops.
    pub zero_length_epsilon: f64,
}

impl Default for GantryConfig {
    fn default() -> Self {
        Self {
            square_size_mm: DEFAULT_SQUARE_SIZE_MM,
            board_origin_x_mm: DEFAULT_BOARD_ORIGIN_X_MM,
            board_origin_y_mm: DEFAULT_BOARD_ORIGIN_Y_MM,
            lane_offset_mm: DEFAULT_SQUARE_SIZE_MM / 2.0,
            obstacle_slide_mm: DEFAULT_OBSTACLE_SLIDE_MM,
            mm_resolution: DEFAULT_MM_RESOLUTION,
            zero_length_epsilon: DEFAULT_ZERO_LENGTH_EPSILON,
        }
    }
}

impl GantryConfig {
    pub fn from_json(json: &str) -> RobotResult<Self> {
        let config: GantryConfig = serde_json::from_str(json)
            .map_err(|e| RobotError::InvalidConfig(format!("cannot parse gantry config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RobotResult<()> {
        if !(self.square_size_mm > 0.0) {
            return Err(RobotError::InvalidConfig(format!(
                "square_size_mm must be positive, got {}",
                self.square_size_mm
            )));
        }
        if !(self.mm_resolution > 0.0) {
            return Err(RobotError::InvalidConfig(format!(
                "mm_resolution must be positive, got {}",
                self.mm_resolution
            )));
        }
        if !(self.zero_length_epsilon >= 0.0) {
            return Err(RobotError::InvalidConfig(format!(
                "zero_length_epsilon must not be negative, got {}",
                self.zero_length_epsilon
            )));
        }
        if self.obstacle_slide_mm.abs() >= self.square_size_mm / 2.0 {
            return Err(RobotError::InvalidConfig(format!(
                "obstacle_slide_mm {} would push a piece into the neighbouring square",
                self.obstacle_slide_mm
            )));
        }
        Ok(())
    }
}
