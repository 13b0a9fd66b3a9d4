//! Command implementations for the evlog CLI

pub mod export;
pub mod read;
