//! FlashDefender Control - library surface for testing.

pub mod cli;
pub mod client;
pub mod direct;
pub mod output;
