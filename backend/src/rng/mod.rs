//! Deterministic random number generation.
//!
//! Uses the xorshift64* algorithm for fast, deterministic random draws.
//! CRITICAL: every random draw anywhere in the engine MUST go through a
//! single [`RngStream`] threaded in by the Tick Pipeline for that tick.

mod xorshift;

pub use xorshift::RngStream;
