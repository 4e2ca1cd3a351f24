//! Common utilities and types shared across SealKit crates.
//!
//! This crate provides the error taxonomy used by every cryptographic
//! component, so callers can match on one error type regardless of the
//! algorithm they picked.

pub mod error;

pub use error::{Error, Result};
