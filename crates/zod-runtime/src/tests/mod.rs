//! Test module for zod-runtime
//!
//! Unit tests per schema family, plus property-based tests using proptest
//! for the invariants every schema must uphold.

#[cfg(test)]
pub mod primitive_tests;

#[cfg(test)]
pub mod wrapper_tests;

#[cfg(test)]
pub mod object_tests;

#[cfg(test)]
pub mod collection_tests;

#[cfg(test)]
pub mod union_tests;
