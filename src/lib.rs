//! Crate root module declarations for the board robot.
//!
//! The robot moves chess pieces on a physical board with a magnet carried by
//! a two-axis gantry. Modules are listed leaf first: board analysis and
//! geometry, parking, choreography (turning a move record into gantry
//! steps), and execution against a transport.

pub mod errors;

pub mod board_state {
    pub mod board_state;
    pub mod chess_rules;
    pub mod chess_types;
}

pub mod geometry {
    pub mod coordinate_mapper;
    pub mod gantry_config;
}

pub mod parking {
    pub mod parking_allocator;
    pub mod parking_ledger;
}

pub mod choreography {
    pub mod move_choreographer;
    pub mod move_record;
    pub mod obstacle_router;
    pub mod parking_lane;
    pub mod reset_choreographer;
    pub mod step;
    pub mod step_quantizer;
}

pub mod execution {
    pub mod board_session;
    pub mod executor;
    pub mod polling_transport;
    pub mod transport;
}

pub mod utils {
    pub mod algebraic;
    pub mod render_board;
    pub mod stdio_loop;
}
