//! API exposure modules
//!
//! Each exposure consumes a `ServerHost` and produces a Router for its
//! protocol. REST (with an SSE notification stream) is the only one.

pub mod rest;

pub use rest::RestExposure;
