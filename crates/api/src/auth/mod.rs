//! Authentication primitives.
//!
//! - [`jwt`] -- validation of externally issued JWT access tokens.

pub mod jwt;
