//! Operator command-line interface for fxhost.
//!
//! The binary in `main.rs` is the composition root; this library holds the
//! argument parser, the bootstrap that wires settings into a supervisor, and
//! one handler per subcommand.

#![deny(unused_crate_dependencies)]

// `.env` is loaded by the binary
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliContext, bootstrap, init_tracing, load_settings};
pub use commands::{Commands, ConfigCommand};
pub use error::CliError;
pub use parser::Cli;
