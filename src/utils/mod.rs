//! Utility functions

pub mod common;

pub use common::*;
