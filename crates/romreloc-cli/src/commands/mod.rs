//! CLI command implementations.

pub mod catalog;
pub mod compare;
pub mod diff;
pub mod hex_utils;
pub mod inspect;
pub mod lookup;
pub mod summary;
