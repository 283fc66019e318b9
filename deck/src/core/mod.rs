//! Deterministic, pure logic for slide ordering and navigation.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod frontmatter;
pub mod navigation;
pub mod order;
pub mod sequence;
pub mod types;
