//! Driver configuration: command-line arguments and the optional JSON
//! tracker parameter file.

pub mod cli;
pub mod tracker;

pub use cli::{parse_args, usage, validate_paths, CliAction, CliConfig};
pub use tracker::load_tracker_params;
