#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for radgate
//!
//! These tests run the relay and the accounting sink over real UDP sockets.

mod accounting_test;
mod config_test;
mod relay_test;
