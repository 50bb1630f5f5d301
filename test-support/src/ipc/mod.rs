mod client;
mod stdio;

pub use client::HttpClient;
pub use stdio::StdioClient;
