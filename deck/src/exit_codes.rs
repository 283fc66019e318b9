//! Stable exit codes for `deck` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid config, unreadable slide source, or duplicate slide ids.
pub const INVALID: i32 = 1;
/// `deck validate` found no slides.
pub const EMPTY: i32 = 2;
