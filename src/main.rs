//! Board robot command loop.
//!
//! Run with:
//! `cargo run --release`
//! `cargo run --release -- gantry.json --recenter-on-failure --home-after-step`
//!
//! Move records and commands are read from stdin one per line; see
//! `board_robot::utils::stdio_loop`. Without a hardware link the loop drives
//! the simulated transport. Set `RUST_LOG=debug` to see every step.

use std::fs;

use board_robot::execution::executor::ExecutorConfig;
use board_robot::execution::transport::SimulatedTransport;
use board_robot::geometry::gantry_config::GantryConfig;
use board_robot::utils::stdio_loop::run_stdio_loop;
use log::info;

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let executor_config = ExecutorConfig {
        recenter_on_failure: args.iter().any(|a| a == "--recenter-on-failure"),
        home_after_each_step: args.iter().any(|a| a == "--home-after-step"),
    };

    let gantry = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
            GantryConfig::from_json(&json).map_err(|e| e.to_string())?
        }
        None => GantryConfig::default(),
    };
    info!("gantry: {gantry:?}");
    info!("executor: {executor_config:?}");

    run_stdio_loop(SimulatedTransport::new(), &gantry, executor_config).map_err(|e| e.to_string())
}
