//! Music globe server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod config;
pub mod globe_loop;
pub mod history;
pub mod http;
pub mod state;
pub mod ws;
