#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod game;
pub mod telemetry;
pub mod ws;

pub use config::EngineConfig;
pub use error::AppError;
pub use errors::{DomainError, ValidationKind};
pub use game::RoomRegistry;

#[cfg(test)]
pub mod test_bootstrap;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
