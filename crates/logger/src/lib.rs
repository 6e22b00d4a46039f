//! Shared tracing setup for the webstatus binaries.

mod subscriber;

pub use subscriber::init;
