//! # gps-tracker-protocol
//!
//! Driver tracking payload types and codec.
//!
//! This crate defines the JSON document posted to the tracking API and the
//! URL it is posted to. It performs no I/O.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
