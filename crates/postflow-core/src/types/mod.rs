//! Core type definitions used across the Postflow workspace.

pub mod id;

pub use id::*;
