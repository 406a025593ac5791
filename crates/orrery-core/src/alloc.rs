//! Hash collections used throughout Orrery.
//!
//! Glyph tables and per-frame lookups are keyed by small integers, so the
//! AHash hasher is used in place of SipHash.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
