//! Command-line command handlers for autotemp.
//!
//! One-shot commands that run instead of the daemon. Each command lives in its
//! own submodule.

pub mod now;
