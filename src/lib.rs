//! SML library.
//!
//! Provides the translator and register machine for the SML assembly
//! language, plus the logging and configuration used by the `sml` binary.

pub mod config;
pub mod utils;
pub mod virtual_machine;
