//! I/O helpers: configuration, slide sources, caching, content loading, deck libraries.

pub mod config;
pub mod content;
pub mod init;
pub mod library;
pub mod registry;
pub mod source;
