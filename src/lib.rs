//! # autotemp
//!
//! Library behind the `autotemp` binary: keeps a display's color temperature
//! in step with the sun.
//!
//! The library exists to enable testing of the scheduler and its
//! collaborators, and to keep CLI dispatch (`main.rs`) separate from
//! application logic.
//!
//! ## Architecture
//!
//! - **Scheduler**: [`core::Engine`] runs automatic mode on a background thread;
//!   [`core::mode::ModeController`] arbitrates between it and manual writes
//! - **Solar data**: [`geo`] resolves the observer's location and fetches the
//!   day's sun schedule
//! - **Color math**: [`color`] turns Kelvin into RGB multipliers and gamma ramps
//! - **Output**: [`backend`] delivers values to a display backend, newest first
//! - **Configuration**: [`config`] for the TOML settings file
//! - **Infrastructure**: signal handling, the instance lock, logging, and the
//!   injectable clock

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod backend;
pub mod color;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod geo;
pub mod io;
pub mod time_source;
