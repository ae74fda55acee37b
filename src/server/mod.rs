//! HTTP server: host state, REST exposure and the builder that wires them

pub mod builder;
pub mod exposure;
pub mod host;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use host::ServerHost;
