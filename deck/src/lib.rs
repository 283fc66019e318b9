//! Slide deck discovery and navigation.
//!
//! - **[`core`]**: Pure, deterministic logic (order inference, metadata
//!   parsing, sequence building, navigation resolution). No I/O.
//! - **[`io`]**: Config, slide sources, the cached registry and content
//!   resolvers.
//!
//! The `deck` binary and the `deck-server` crate are thin layers over these.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
