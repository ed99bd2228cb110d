#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Configuration errors reported by the fallible constructors.
pub mod error;

mod probe_table;

/// Probe-length and occupancy statistics.
#[cfg(any(test, feature = "stats"))]
pub mod stats;

/// The `u64` set and its iterators.
///
/// This module provides [`UintSet`], an open-addressing set with linear
/// probing, along with the iterator types its methods return.
pub mod uint_set;

#[cfg(all(test, feature = "std"))]
mod proptests;

pub use error::ConfigError;
pub use probe_table::FREE_KEY;
pub use uint_set::DEFAULT_FILL_FACTOR;
pub use uint_set::DEFAULT_SIZE_HINT;
pub use uint_set::UintSet;
