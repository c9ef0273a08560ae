//! # postflow-core
//!
//! Core crate for Postflow. Contains configuration schemas, typed
//! identifiers, and the unified error system shared by the scheduled
//! post publication pipeline.
//!
//! This crate has **no** internal dependencies on other Postflow crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
