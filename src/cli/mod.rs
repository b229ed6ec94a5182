pub mod app;

pub use app::{Cli, Invocation, parse_args};
