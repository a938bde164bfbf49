//! Tests for the execution controller

mod helpers;

mod transition_tests;
