//! Public API module.
//!
//! This module contains the high-level user-facing API for the `wipi` crate.

pub mod config;
pub mod models;
pub mod wipi;
