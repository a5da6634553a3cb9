#![doc = include_str!("../README.md")]

mod error;
mod key;
mod map;
mod raw;

#[cfg(feature = "serde")]
mod serde_impls;

pub use error::{Error, Result};
pub use key::{Key, MAX_KEY_LEN};
pub use map::{Dump, Entry, Iter, Stats, Table};
pub use raw::{MAX_CAPACITY, MIN_CAPACITY};
