//! CLI command handlers
//!
//! Each subcommand lives in its own module and talks to the background
//! service through the message router.

pub mod check;
pub mod helpers;
pub mod message;
pub mod serve;
pub mod settings;
pub mod stats;
