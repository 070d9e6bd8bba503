//! Error types and result aliases for sift.
//!
//! This module provides the core error handling infrastructure shared by
//! every crate in the workspace.

mod error;

pub use error::{SiftError, SiftResult};
