//! Message surface of the background service
//!
//! Provides:
//! - Action routing with structured responses
//! - Context menu actions
//! - An HTTP transport (`POST /message`, `GET /health`)

pub mod menu;
pub mod router;
pub mod server;

pub use menu::MenuAction;
pub use router::{ErrorPayload, MessageRouter, Request, Response, ACTIONS};
pub use server::ApiServer;
