//! Step-by-step replay of a choreography against a transport.
//!
//! Every step is rounded to the mechanical resolution before no-op steps are
//! dropped. Per step: check the cancellation flag, send, wait for the
//! acknowledgement, optionally home. Any step that is not acknowledged ends
//! the run at once. Obstacles pushed aside by `ObstacleSlide` steps are
//! collected in a per-call accumulator and slid back, newest first, once the
//! last primary step is done. The accumulator never outlives `execute`: on
//! every error path its contents are handed to the caller inside the error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::choreography::step::{Choreography, DisplacedObstacle, Step};
use crate::choreography::step_quantizer::StepQuantizer;
use crate::errors::{RobotError, RobotResult};
use crate::execution::transport::{Acknowledgement, GantryTransport};
use crate::geometry::coordinate_mapper::MillimeterPoint;
use crate::geometry::gantry_config::GantryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorConfig {
    /// Try to slide displaced obstacles back before reporting a failed or
    /// cancelled run. Off by default: after a fault the head position is
    /// not trusted.
    pub recenter_on_failure: bool,
    /// Issue `home()` after every acknowledged step.
    pub home_after_each_step: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorPhase {
    Idle,
    Sending,
    AwaitingAck,
    Done,
    Failed,
    TimedOut,
    RecenterObstacles,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub label: String,
    pub steps_sent: usize,
    pub obstacles_recentered: usize,
    pub homes: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

pub struct Executor<T: GantryTransport> {
    transport: T,
    quantizer: StepQuantizer,
    epsilon: f64,
    config: ExecutorConfig,
    cancel: Arc<AtomicBool>,
    phase: ExecutorPhase,
}

impl<T: GantryTransport> Executor<T> {
    pub fn new(transport: T, gantry: &GantryConfig, config: ExecutorConfig) -> Self {
        Self {
            transport,
            quantizer: StepQuantizer::new(gantry.mm_resolution, gantry.zero_length_epsilon),
            epsilon: gantry.zero_length_epsilon,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            phase: ExecutorPhase::Idle,
        }
    }

    /// Shared flag; storing `true` stops the current run before its next step.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn phase(&self) -> ExecutorPhase {
        self.phase
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run choreographies in order, stopping at the first error.
    pub fn execute_all<'a>(
        &mut self,
        choreographies: impl IntoIterator<Item = &'a Choreography>,
    ) -> RobotResult<Vec<ExecutionReport>> {
        choreographies.into_iter().map(|c| self.execute(c)).collect()
    }

    pub fn execute(&mut self, choreography: &Choreography) -> RobotResult<ExecutionReport> {
        let started_at = Utc::now();
        let quantized = choreography.steps.iter().map(|s| self.quantizer.quantize(s)).collect();
        let steps = self.quantizer.compress(quantized);
        let mut displaced: Vec<DisplacedObstacle> = Vec::new();
        let mut previous_end: Option<MillimeterPoint> = None;
        let mut homes = 0;

        info!("executing '{}' ({} step(s))", choreography.label, steps.len());

        for (step_index, step) in steps.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                warn!("'{}' cancelled before step {step_index}", choreography.label);
                self.phase = ExecutorPhase::Idle;
                let stranded = self.after_abort(displaced);
                return Err(RobotError::Cancelled { step_index, stranded });
            }

            if let Some(end) = previous_end {
                if !end.approx_eq(step.from, self.epsilon) {
                    debug!(
                        "step {step_index} starts at {} away from {end}; travelling unpowered",
                        step.from
                    );
                }
            }

            if let Err(ack) = self.send(step_index, step) {
                let stranded = self.after_abort(displaced);
                return Err(RobotError::TransportFailure {
                    step_index,
                    action: step.action.to_owned(),
                    ack,
                    stranded,
                });
            }
            if let Some(obstacle) = step.displaced_obstacle() {
                displaced.push(obstacle);
            }
            previous_end = Some(step.to);

            if self.config.home_after_each_step {
                let ack = self.transport.home();
                if !ack.is_done() {
                    error!("homing after step {step_index} {ack}");
                    self.phase = terminal_phase(ack);
                    let stranded = self.after_abort(displaced);
                    return Err(RobotError::TransportFailure {
                        step_index,
                        action: "home".to_owned(),
                        ack,
                        stranded,
                    });
                }
                homes += 1;
            }
        }

        self.phase = ExecutorPhase::RecenterObstacles;
        let obstacles_recentered = displaced.len();
        match self.recenter(displaced) {
            Ok(recenter_homes) => homes += recenter_homes,
            Err((ack, stranded)) => {
                error!(
                    "'{}': {} obstacle(s) could not be recentered ({ack})",
                    choreography.label,
                    stranded.len()
                );
                self.phase = terminal_phase(ack);
                return Err(RobotError::RecenterFailed { ack, stranded });
            }
        }

        self.phase = ExecutorPhase::Done;
        Ok(ExecutionReport {
            label: choreography.label.clone(),
            steps_sent: steps.len(),
            obstacles_recentered,
            homes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn send(&mut self, step_index: usize, step: &Step) -> Result<(), Acknowledgement> {
        self.phase = ExecutorPhase::Sending;
        debug!("step {step_index}: {step}");
        self.phase = ExecutorPhase::AwaitingAck;
        let ack = self.transport.move_piece(step.from, step.to);
        if ack.is_done() {
            self.phase = ExecutorPhase::Done;
            Ok(())
        } else {
            error!("step {step_index} ({}) {ack}", step.action);
            self.phase = terminal_phase(ack);
            Err(ack)
        }
    }

    /// Slide obstacles back newest first, homing after each one when
    /// configured. Returns the number of homes issued; on failure returns the
    /// acknowledgement and every obstacle still out of place.
    fn recenter(
        &mut self,
        mut displaced: Vec<DisplacedObstacle>,
    ) -> Result<usize, (Acknowledgement, Vec<DisplacedObstacle>)> {
        let mut homes = 0;
        while let Some(obstacle) = displaced.pop() {
            let step = self.quantizer.quantize(&obstacle.recenter_step());
            debug!("recenter: {step}");
            let ack = self.transport.move_piece(step.from, step.to);
            if !ack.is_done() {
                displaced.push(obstacle);
                return Err((ack, displaced));
            }
            if self.config.home_after_each_step {
                let ack = self.transport.home();
                if !ack.is_done() {
                    error!("homing after recentering {} {ack}", obstacle.cell);
                    return Err((ack, displaced));
                }
                homes += 1;
            }
        }
        Ok(homes)
    }

    /// Obstacles left displaced after an aborted run.
    fn after_abort(&mut self, displaced: Vec<DisplacedObstacle>) -> Vec<DisplacedObstacle> {
        if displaced.is_empty() {
            return displaced;
        }
        if !self.config.recenter_on_failure {
            warn!("{} obstacle(s) left displaced; operator must recenter", displaced.len());
            return displaced;
        }
        match self.recenter(displaced) {
            Ok(_) => {
                info!("displaced obstacles recentered after abort");
                Vec::new()
            }
            Err((ack, stranded)) => {
                warn!("best-effort recenter stopped ({ack}); {} obstacle(s) stranded", stranded.len());
                stranded
            }
        }
    }
}

fn terminal_phase(ack: Acknowledgement) -> ExecutorPhase {
    match ack {
        Acknowledgement::Done => ExecutorPhase::Done,
        Acknowledgement::Failed => ExecutorPhase::Failed,
        Acknowledgement::TimedOut => ExecutorPhase::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_state::chess_types::GridCell;
    use crate::choreography::step::Axis;
    use crate::execution::transport::{SimulatedTransport, TransportCommand};

    fn p(x: f64, y: f64) -> MillimeterPoint {
        MillimeterPoint::new(x, y)
    }

    fn obstacle() -> DisplacedObstacle {
        DisplacedObstacle {
            cell: GridCell::new(1, 1),
            origin: p(104.5, 89.5),
            axis: Axis::X,
            offset_mm: 9.0,
        }
    }

    /// Slide an obstacle, then carry the mover in two legs.
    fn routed() -> Choreography {
        Choreography::new(
            "routed",
            vec![
                obstacle().slide_step(),
                Step::new("leg", p(60.5, 46.0), p(60.5, 133.5), ""),
                Step::new("leg", p(60.5, 133.5), p(104.5, 133.5), ""),
            ],
        )
    }

    fn executor(transport: SimulatedTransport, config: ExecutorConfig) -> Executor<SimulatedTransport> {
        // Half-millimetre grid keeps every test coordinate exact after rounding.
        let gantry = GantryConfig {
            mm_resolution: 0.5,
            ..GantryConfig::default()
        };
        Executor::new(transport, &gantry, config)
    }

    #[test]
    fn success_recenters_displaced_obstacles_last() {
        let mut exec = executor(SimulatedTransport::new(), ExecutorConfig::default());
        let report = exec.execute(&routed()).expect("run should succeed");
        assert_eq!(report.steps_sent, 3);
        assert_eq!(report.obstacles_recentered, 1);
        assert!(report.elapsed() >= chrono::Duration::zero());
        assert_eq!(exec.phase(), ExecutorPhase::Done);

        let moves: Vec<_> = exec.transport().moves().collect();
        assert_eq!(moves.len(), 4);
        let back = obstacle().recenter_step();
        assert_eq!(moves[3], (back.from, back.to));
    }

    #[test]
    fn second_step_timeout_halts_and_skips_recentering() {
        let transport = SimulatedTransport::new().fail_at(1, Acknowledgement::TimedOut);
        let mut exec = executor(transport, ExecutorConfig::default());
        let err = exec.execute(&routed()).expect_err("second step times out");
        match &err {
            RobotError::TransportFailure {
                step_index,
                action,
                ack,
                stranded,
            } => {
                assert_eq!(*step_index, 1);
                assert_eq!(action, "leg");
                assert_eq!(*ack, Acknowledgement::TimedOut);
                assert_eq!(stranded, &vec![obstacle()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        // Nothing after the failed command, no recenter attempt.
        assert_eq!(exec.transport().commands().len(), 2);
        assert_eq!(exec.phase(), ExecutorPhase::TimedOut);
    }

    #[test]
    fn recenter_on_failure_is_best_effort() {
        let transport = SimulatedTransport::new().fail_at(2, Acknowledgement::Failed);
        let config = ExecutorConfig {
            recenter_on_failure: true,
            ..ExecutorConfig::default()
        };
        let mut exec = executor(transport, config);
        let err = exec.execute(&routed()).expect_err("third step fails");
        assert!(err.stranded_obstacles().is_empty());
        let commands = exec.transport().commands();
        assert_eq!(commands.len(), 4);
        let back = obstacle().recenter_step();
        assert_eq!(commands[3], TransportCommand::Move { from: back.from, to: back.to });
    }

    #[test]
    fn failed_recenter_reports_stranded_obstacle() {
        let transport = SimulatedTransport::new().fail_at(3, Acknowledgement::Failed);
        let mut exec = executor(transport, ExecutorConfig::default());
        let err = exec.execute(&routed()).expect_err("recenter fails");
        assert_eq!(
            err,
            RobotError::RecenterFailed {
                ack: Acknowledgement::Failed,
                stranded: vec![obstacle()]
            }
        );
    }

    #[test]
    fn cancellation_is_observed_between_steps() {
        let mut exec = executor(SimulatedTransport::new(), ExecutorConfig::default());
        exec.cancellation_flag().store(true, Ordering::Relaxed);
        let err = exec.execute(&routed()).expect_err("run is cancelled");
        assert_eq!(
            err,
            RobotError::Cancelled {
                step_index: 0,
                stranded: Vec::new()
            }
        );
        assert!(exec.transport().commands().is_empty());
    }

    #[test]
    fn homing_after_each_step_and_degenerate_steps_are_dropped() {
        let config = ExecutorConfig {
            home_after_each_step: true,
            ..ExecutorConfig::default()
        };
        let mut exec = executor(SimulatedTransport::new(), config);
        let chor = Choreography::new(
            "with noop",
            vec![
                Step::new("move", p(60.5, 46.0), p(60.5, 89.5), ""),
                Step::new("noop", p(60.5, 89.5), p(60.5, 89.5), ""),
            ],
        );
        let report = exec.execute(&chor).expect("run should succeed");
        assert_eq!(report.steps_sent, 1);
        assert_eq!(report.homes, 1);
        assert_eq!(exec.transport().commands()[1], TransportCommand::Home);
    }

    #[test]
    fn homing_follows_recenter_motions_too() {
        let config = ExecutorConfig {
            home_after_each_step: true,
            ..ExecutorConfig::default()
        };
        let mut exec = executor(SimulatedTransport::new(), config);
        let report = exec.execute(&routed()).expect("run should succeed");
        assert_eq!(report.homes, 4);

        let commands = exec.transport().commands();
        assert_eq!(commands.len(), 8);
        let back = obstacle().recenter_step();
        assert_eq!(commands[6], TransportCommand::Move { from: back.from, to: back.to });
        assert_eq!(commands[7], TransportCommand::Home);
    }

    #[test]
    fn steps_that_round_to_nothing_are_not_sent() {
        let mut exec = executor(SimulatedTransport::new(), ExecutorConfig::default());
        let chor = Choreography::new(
            "jitter",
            vec![
                Step::new("move", p(60.5, 46.0), p(60.5, 89.5), ""),
                // Both ends land on (60.5, 46.0) at half-millimetre resolution.
                Step::new("jitter", p(60.6, 46.1), p(60.4, 45.9), ""),
            ],
        );
        let report = exec.execute(&chor).expect("run should succeed");
        assert_eq!(report.steps_sent, 1);
        assert_eq!(exec.transport().commands().len(), 1);
    }

    #[test]
    fn execute_all_stops_at_first_error() {
        let transport = SimulatedTransport::new().fail_at(0, Acknowledgement::Failed);
        let mut exec = executor(transport, ExecutorConfig::default());
        let plans = [routed(), routed()];
        assert!(exec.execute_all(plans.iter()).is_err());
        assert_eq!(exec.transport().commands().len(), 1);
    }
}
