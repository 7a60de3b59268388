pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod progression;
pub mod schedule;
pub mod srs;
pub mod streak;
