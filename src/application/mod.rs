//! Application layer containing the status synchronization logic.
//!
//! This module defines the `StatusSynchronizer`, which decides whether an
//! observed status becomes a visible transition, and `watch`, which wires one
//! transport into it.

pub mod synchronizer;
