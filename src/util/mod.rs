//! Utility modules: cancellable waits.

pub mod wait;
