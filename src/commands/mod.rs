//! Subcommand handlers.
//!
//! Handlers receive validated options and an open [`ConnectionManager`];
//! argument parsing and connection resolution happen in [`crate::cli`]
//! before anything connects. Every handler closes the session on both the
//! success and the failure path.
//!
//! [`ConnectionManager`]: crate::connection::ConnectionManager

mod run;
mod setup;

pub use run::{cmd_bench, cmd_run, run_queries, RunOptions};
pub use setup::{cmd_all, cmd_load, cmd_schema};
