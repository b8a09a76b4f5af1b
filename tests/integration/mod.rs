//! Integration tests for tpch-mysql.

pub mod cli_test;
pub mod harness_test;
pub mod mysql_test;
