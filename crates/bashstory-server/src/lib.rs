//! HTTP boundary for the bashstory terminal.
//!
//! One endpoint, `POST /api/command`, takes a `CommandRequest` and answers
//! with a `CommandOutcome`. The session token travels in a cookie; this
//! crate is the only place that reads or writes it.

pub mod cookies;
pub mod routes;

pub use routes::{AppState, router};
