//! Orrery Core
//!
//! Shared astronomy math, hash collections, logging and profiling helpers used by every
//! crate of the Orrery renderer.

pub mod alloc;
pub mod logging;
pub mod math;
pub mod profiling;
