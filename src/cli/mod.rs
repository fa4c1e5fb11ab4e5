//! CLI module - argument parsing, prompts and subcommand runners

pub mod args;
pub mod commands;
pub mod prompts;

pub use args::{Cli, Commands, PredictArgs, TrainArgs};
pub use commands::{read_payloads, run_features, run_groups, run_predict, run_train};
pub use prompts::*;
