//! Process-level clients for end-to-end tests of the `fireberry-mcp` binary.

pub mod ipc;

pub use ipc::{HttpClient, StdioClient};
