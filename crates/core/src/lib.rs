// Core types and pure logic for the Home Assistant bridge
//
// Nothing in this crate performs I/O. The SDK feeds it entity states and
// upstream documents; the MCP layer renders what comes back out.

pub mod analytics;
pub mod control;
pub mod dashboard;
pub mod error;
pub mod error_log;
pub mod filter;
pub mod history;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::*;
