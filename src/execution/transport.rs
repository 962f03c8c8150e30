//! Gantry transport capability.
//!
//! The executor talks to the hardware only through `GantryTransport`. Every
//! call blocks until the controller reports completion, an explicit error,
//! or the transport's own timeout expires; retries, if any, live behind this
//! trait.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::geometry::coordinate_mapper::MillimeterPoint;

/// Outcome of one transport command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    Done,
    /// The controller reported an error.
    Failed,
    /// No terminal status before the deadline.
    TimedOut,
}

impl Acknowledgement {
    #[inline]
    pub fn is_done(self) -> bool {
        self == Acknowledgement::Done
    }
}

impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Acknowledgement::Done => "done",
            Acknowledgement::Failed => "failed",
            Acknowledgement::TimedOut => "timed out",
        })
    }
}

pub trait GantryTransport {
    /// Carry the piece under the magnet from `from` to `to` in a straight
    /// line. The controller reaches `from` on its own with the magnet off.
    fn move_piece(&mut self, from: MillimeterPoint, to: MillimeterPoint) -> Acknowledgement;

    /// Return the head to the reference corner.
    fn home(&mut self) -> Acknowledgement;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Move { from: MillimeterPoint, to: MillimeterPoint },
    Home,
}

/// In-memory stand-in for the controller.
///
/// Records every command and acknowledges it. Individual commands can be
/// scripted to fail, and random faults can be drawn from a seeded RNG to
/// exercise recovery paths reproducibly.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    commands: Vec<TransportCommand>,
    scripted: BTreeMap<usize, Acknowledgement>,
    fault_rate: f64,
    rng: StdRng,
    head: MillimeterPoint,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            scripted: BTreeMap::new(),
            fault_rate: 0.0,
            rng: StdRng::seed_from_u64(0),
            head: MillimeterPoint::new(0.0, 0.0),
        }
    }

    /// Answer the `command_index`-th command (0-based, homes included) with
    /// `ack` instead of `Done`.
    pub fn fail_at(mut self, command_index: usize, ack: Acknowledgement) -> Self {
        self.scripted.insert(command_index, ack);
        self
    }

    /// Fail each command with probability `fault_rate`, half of them as
    /// timeouts.
    pub fn with_random_faults(mut self, fault_rate: f64, seed: u64) -> Self {
        self.fault_rate = fault_rate.clamp(0.0, 1.0);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn commands(&self) -> &[TransportCommand] {
        &self.commands
    }

    pub fn moves(&self) -> impl Iterator<Item = (MillimeterPoint, MillimeterPoint)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            TransportCommand::Move { from, to } => Some((from, to)),
            TransportCommand::Home => None,
        })
    }

    /// Last position the simulated head reached.
    pub fn head(&self) -> MillimeterPoint {
        self.head
    }

    fn acknowledge(&mut self, command: TransportCommand) -> Acknowledgement {
        let index = self.commands.len();
        self.commands.push(command);

        let ack = match self.scripted.get(&index) {
            Some(&ack) => ack,
            None if self.fault_rate > 0.0 && self.rng.random_bool(self.fault_rate) => {
                if self.rng.random_bool(0.5) {
                    Acknowledgement::TimedOut
                } else {
                    Acknowledgement::Failed
                }
            }
            None => Acknowledgement::Done,
        };

        if ack.is_done() {
            self.head = match command {
                TransportCommand::Move { to, .. } => to,
                TransportCommand::Home => MillimeterPoint::new(0.0, 0.0),
            };
        } else {
            warn!("simulated transport: command {index} {command:?} -> {ack}");
        }
        ack
    }
}

impl GantryTransport for SimulatedTransport {
    fn move_piece(&mut self, from: MillimeterPoint, to: MillimeterPoint) -> Acknowledgement {
        debug!("sim move {from} -> {to}");
        self.acknowledge(TransportCommand::Move { from, to })
    }

    fn home(&mut self) -> Acknowledgement {
        debug!("sim home");
        self.acknowledge(TransportCommand::Home)
    }
}
