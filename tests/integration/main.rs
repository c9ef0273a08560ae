//! Integration tests: the real HTTP clients against mock endpoints,
//! with posts held in the in-memory store.

mod helpers;
mod pipeline_test;
