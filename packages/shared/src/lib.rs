//! Shared utilities for the ichiba realtime client.
//!
//! This crate provides logging setup and time utilities used by the
//! client library and its binaries.

pub mod logger;
pub mod time;
