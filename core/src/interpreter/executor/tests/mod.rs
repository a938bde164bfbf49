//! Tests for the executor
//!
//! Organized by feature area

mod helpers;

mod hook_tests;
mod stdlib_tests;
