//! # SAKIP Library
//!
//! This library exposes the SAKIP modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;

// Re-export sakip_core for convenience
pub use sakip_core;
