//! Integration tests for the minefield tripwire pipeline.
//!
//! The tests live in the `tests/` directory; this crate exists to give
//! them a workspace member to hang off.
