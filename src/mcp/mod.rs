pub mod handlers;
pub mod params;
pub mod server;
pub mod stdio;
pub mod tools;

pub use server::FireberryMcpServer;
pub use tools::ToolKind;
