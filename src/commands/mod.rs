pub mod move_division;

pub use move_division::{
    MoveOptions, MoveSummary, execute, move_command, run_from_args, sqlite_platform,
};
