//! Unit tests for autoship CLI
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod architecture;
mod pipeline_scenarios;
mod property_tests;
