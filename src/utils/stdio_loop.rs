//! Line-oriented command loop.
//!
//! Each input line is either a JSON move record (`{"from": ...}`) or one of
//! the plain commands below. Every line gets at least one reply line.
//!
//! | command            | effect                                           |
//! |--------------------|--------------------------------------------------|
//! | `{...}`            | plan and execute the move, then advance the game |
//! | `reset [fen]`      | clear the board and deal `fen` (default: start)  |
//! | `position <fen>`   | resume from `fen` without moving anything        |
//! | `home`             | home the gantry                                  |
//! | `board`            | print the board and parking area                 |
//! | `fen`              | print the current FEN                            |
//! | `isready`          | reply `readyok`                                  |
//! | `quit`             | leave the loop                                   |

use std::io::{self, BufRead, Write};

use log::{debug, warn};

use crate::board_state::board_state::BoardState;
use crate::board_state::chess_rules::STARTING_POSITION_FEN;
use crate::choreography::move_record::MoveRecord;
use crate::errors::RobotError;
use crate::execution::board_session::{BoardSession, SessionPlan};
use crate::execution::executor::{Executor, ExecutorConfig};
use crate::execution::transport::GantryTransport;
use crate::geometry::coordinate_mapper::CoordinateMapper;
use crate::geometry::gantry_config::GantryConfig;
use crate::parking::parking_allocator::ParkingAllocator;
use crate::utils::render_board::render_board;

pub fn run_stdio_loop<T: GantryTransport>(
    transport: T,
    gantry: &GantryConfig,
    config: ExecutorConfig,
) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut robot = RobotLoop::new(transport, gantry, config);

    for line in stdin.lock().lines() {
        let line = line?;
        let should_quit = robot.handle_command(&line, &mut stdout)?;
        stdout.flush()?;
        if should_quit {
            break;
        }
    }

    Ok(())
}

pub struct RobotLoop<T: GantryTransport> {
    gantry: GantryConfig,
    session: BoardSession,
    executor: Executor<T>,
}

impl<T: GantryTransport> RobotLoop<T> {
    pub fn new(transport: T, gantry: &GantryConfig, config: ExecutorConfig) -> Self {
        Self {
            gantry: *gantry,
            session: BoardSession::new(gantry),
            executor: Executor::new(transport, gantry, config),
        }
    }

    pub fn session(&self) -> &BoardSession {
        &self.session
    }

    pub fn executor(&self) -> &Executor<T> {
        &self.executor
    }

    /// Handle one input line. Returns `true` when the loop should stop.
    pub fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        debug!("command: {trimmed}");

        if trimmed.starts_with('{') {
            match MoveRecord::from_json(trimmed).and_then(|record| self.session.plan_move(&record)) {
                Ok(plan) => self.run(plan, out)?,
                Err(err) => writeln!(out, "error {err}")?,
            }
            return Ok(false);
        }

        let (cmd, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (trimmed, ""),
        };

        match cmd {
            "quit" => return Ok(true),
            "isready" => writeln!(out, "readyok")?,
            "fen" => writeln!(out, "fen {}", self.session.current_fen())?,
            "home" => {
                let ack = self.executor.transport_mut().home();
                writeln!(out, "home {ack}")?;
            }
            "position" => {
                let fen = if rest.is_empty() || rest == "startpos" {
                    STARTING_POSITION_FEN
                } else {
                    rest
                };
                match BoardSession::from_fen(&self.gantry, fen) {
                    Ok(session) => {
                        self.session = session;
                        writeln!(out, "position set")?;
                    }
                    Err(err) => writeln!(out, "error {err}")?,
                }
            }
            "reset" => {
                let target = if rest.is_empty() { STARTING_POSITION_FEN } else { rest };
                match self.session.plan_reset(target) {
                    Ok(plan) => self.run(plan, out)?,
                    Err(err) => writeln!(out, "error {err}")?,
                }
            }
            "board" => match BoardState::from_fen(self.session.current_fen()) {
                Ok(board) => {
                    let allocator = ParkingAllocator::new(CoordinateMapper::new(&self.gantry));
                    writeln!(out, "{}", render_board(&board, self.session.ledger(), &allocator))?;
                }
                Err(err) => writeln!(out, "error {err}")?,
            },
            other => writeln!(out, "error unknown command '{other}'")?,
        }

        Ok(false)
    }

    fn run(&mut self, plan: SessionPlan, out: &mut impl Write) -> io::Result<()> {
        match self.executor.execute_all(plan.choreographies.iter()) {
            Ok(reports) => {
                let steps: usize = reports.iter().map(|r| r.steps_sent).sum();
                let recentered: usize = reports.iter().map(|r| r.obstacles_recentered).sum();
                for report in &reports {
                    writeln!(out, "done {} steps={}", report.label, report.steps_sent)?;
                }
                writeln!(out, "ok steps={steps} recentered={recentered}")?;
                self.session.commit(plan);
            }
            Err(err) => {
                warn!("execution aborted: {err}");
                writeln!(out, "error {err}")?;
                report_stranded(&err, out)?;
            }
        }
        Ok(())
    }
}

fn report_stranded(err: &RobotError, out: &mut impl Write) -> io::Result<()> {
    for obstacle in err.stranded_obstacles() {
        writeln!(
            out,
            "stranded {} at {} (home {})",
            obstacle.cell,
            obstacle.displaced_position(),
            obstacle.origin
        )?;
    }
    Ok(())
}
