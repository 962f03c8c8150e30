//! Status-byte polling protocol of the motion controller.
//!
//! A move is the byte `'M'` followed by four little-endian `f32` values
//! (`from.x, from.y, to.x, to.y`); homing is the single byte `'H'`. After a
//! command the controller's status byte is read once per poll interval:
//!
//! | byte  | meaning                        |
//! |-------|--------------------------------|
//! | `'M'` | move finished                  |
//! | `'H'` | homing finished                |
//! | `'W'` | still working                  |
//! | `'E'` | controller error               |
//!
//! Read errors and unknown bytes keep polling until the attempt budget for
//! the command's timeout runs out.

use std::io;
use std::thread;
use std::time::Duration;

use log::{debug, error, warn};

use crate::execution::transport::{Acknowledgement, GantryTransport};
use crate::geometry::coordinate_mapper::MillimeterPoint;

pub const MOVE_COMMAND: u8 = b'M';
pub const HOME_COMMAND: u8 = b'H';
pub const STATUS_WORKING: u8 = b'W';
pub const STATUS_ERROR: u8 = b'E';

/// Byte-level access to the controller bus.
pub trait ControllerLink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn read_byte(&mut self) -> io::Result<u8>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub move_timeout: Duration,
    pub home_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            move_timeout: Duration::from_secs(15),
            home_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl PollingConfig {
    fn attempts(&self, timeout: Duration) -> u32 {
        if self.poll_interval.is_zero() {
            return 1;
        }
        ((timeout.as_secs_f64() / self.poll_interval.as_secs_f64()).floor() as u32).max(1)
    }
}

pub fn encode_move(from: MillimeterPoint, to: MillimeterPoint) -> [u8; 17] {
    let mut frame = [0u8; 17];
    frame[0] = MOVE_COMMAND;
    for (i, value) in [from.x, from.y, to.x, to.y].into_iter().enumerate() {
        let start = 1 + i * 4;
        frame[start..start + 4].copy_from_slice(&(value as f32).to_le_bytes());
    }
    frame
}

pub struct PollingTransport<L: ControllerLink> {
    link: L,
    config: PollingConfig,
}

impl<L: ControllerLink> PollingTransport<L> {
    pub fn new(link: L, config: PollingConfig) -> Self {
        Self { link, config }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Write a single zero byte to see whether the controller answers at all.
    pub fn ping(&mut self) -> bool {
        self.link.write(&[0x00]).is_ok()
    }

    fn command(&mut self, frame: &[u8], done_byte: u8, timeout: Duration) -> Acknowledgement {
        if let Err(e) = self.link.write(frame) {
            error!("controller write failed: {e}");
            return Acknowledgement::Failed;
        }

        let attempts = self.config.attempts(timeout);
        for attempt in 1..=attempts {
            thread::sleep(self.config.poll_interval);
            match self.link.read_byte() {
                Ok(byte) if byte == done_byte => {
                    debug!("controller done after {attempt} poll(s)");
                    return Acknowledgement::Done;
                }
                Ok(STATUS_WORKING) => {}
                Ok(STATUS_ERROR) => {
                    warn!("controller reported an error");
                    return Acknowledgement::Failed;
                }
                Ok(other) => debug!("ignoring unexpected status byte {other:#04x}"),
                Err(e) => debug!("status read failed, polling again: {e}"),
            }
        }

        warn!("controller did not finish within {timeout:?}");
        Acknowledgement::TimedOut
    }
}

impl<L: ControllerLink> GantryTransport for PollingTransport<L> {
    fn move_piece(&mut self, from: MillimeterPoint, to: MillimeterPoint) -> Acknowledgement {
        let frame = encode_move(from, to);
        self.command(&frame, MOVE_COMMAND, self.config.move_timeout)
    }

    fn home(&mut self) -> Acknowledgement {
        self.command(&[HOME_COMMAND], HOME_COMMAND, self.config.home_timeout)
    }
}
