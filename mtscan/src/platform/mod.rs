//! Vendor console definitions.
//!
//! This module holds the command syntax, prompt layout and failure wording
//! of the device CLI the session drives.

pub mod routeros;

pub use routeros::DeviceFailure;
