//! Integration tests for the autoship CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior that
//! needs no cloud account: argument parsing, configuration, and local
//! analysis of archives.

mod analyze_command;
mod config_command;
