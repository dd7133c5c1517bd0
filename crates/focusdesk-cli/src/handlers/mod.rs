//! Command handlers.
//!
//! Each handler connects through the [`CliContext`](crate::CliContext)
//! client, does one thing, and disconnects before returning.

pub mod call;
pub mod tools;
