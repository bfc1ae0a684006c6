//! Core internal logic.
//!
//! Connection switching with rollback, scanning, status reads and credential
//! store maintenance. Everything here works against the [`crate::control`]
//! traits and never spawns processes directly.

pub(crate) mod cleanup;
pub(crate) mod connection;
pub(crate) mod credentials;
pub(crate) mod scan;
pub(crate) mod state_wait;
pub(crate) mod status;
pub(crate) mod traffic;
