//! Process entry points: argument parsing and logging setup

mod cli;
mod logging;

pub use cli::parse_args;
pub use logging::setup_logging;
