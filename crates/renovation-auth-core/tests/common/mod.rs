//! Shared test utilities

pub mod mock_host;

#[allow(unused_imports)]
pub use mock_host::*;
