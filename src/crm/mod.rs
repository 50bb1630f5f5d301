mod client;
pub mod object_type;
mod request;

pub use client::{CrmTransport, HttpTransport};
pub use object_type::normalize;
pub use request::CrmRequest;

#[cfg(test)]
pub(crate) use client::MockCrmTransport;
