//! # postflow-entity
//!
//! Domain entity models for Postflow. Every struct in this crate is a
//! database row or a value embedded in one. Row types derive
//! `sqlx::FromRow`; the per-location progress array is stored as JSONB
//! on its parent post.

pub mod owner;
pub mod post;
