//! CLI module for the bg-remover binary
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
mod view;

pub use main_impl::{main, Cli};
