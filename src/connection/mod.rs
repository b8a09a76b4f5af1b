//! Connection management for tpch-mysql.
//!
//! Centralizes session lifecycle and session-level settings.

pub mod manager;

pub use manager::{try_set_session_limit, ConnectionManager};
