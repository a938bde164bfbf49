//! Tests for the traced session and its worker

mod helpers;

mod worker_tests;
