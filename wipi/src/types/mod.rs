//! Type definitions and constants.
//!
//! This module contains wpa_supplicant and host-tool constants.

pub(crate) mod constants;
