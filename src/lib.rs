//! tpch-mysql - TPC-H benchmark orchestration for MySQL.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod generate;
pub mod harness;
pub mod load;
pub mod logging;
pub mod monitor;
pub mod schema;
