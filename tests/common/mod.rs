//! Shared fakes and fixtures for the integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Initialize tracing once per test binary
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .init();
    });
}
