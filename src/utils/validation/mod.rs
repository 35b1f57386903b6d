//! Consolidated validation utilities
//!
//! Selection checks run locally and never touch the network.

pub mod config;
pub mod file;

pub use config::ConfigValidator;
pub use file::FileValidator;
