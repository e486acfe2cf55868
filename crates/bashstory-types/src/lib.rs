//! Foundation types for bashstory.
//!
//! This crate contains the types shared by the server-side resolver and the
//! client-side terminal: the request/outcome wire protocol, phase tags,
//! platform-agnostic input events, configuration, and error types.

pub mod config;
pub mod error;
pub mod input;
pub mod protocol;
