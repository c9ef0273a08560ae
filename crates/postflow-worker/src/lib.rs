//! Scheduled post publication pipeline for Postflow.
//!
//! A sweep selects due posts, claims each one with a conditional update,
//! exchanges its refresh token for an access token, then publishes it
//! location by location, debiting the owner's wallet after every
//! confirmed publish and persisting progress immediately.
//!
//! This crate provides:
//! - [`PublicationPipeline`], one sweep per call with a per-run diagnostics log
//! - the HTTP boundaries (OAuth2 token exchange, listing publish, wallet ledger)
//! - the [`store::PostStore`] port with PostgreSQL and in-memory adapters
//! - an interval [`SweepRunner`] and a cron [`CronScheduler`] that trigger sweeps

pub mod bootstrap;
pub mod claimer;
pub mod credential;
pub mod diagnostics;
pub mod guard;
pub mod ledger;
pub mod listing;
pub mod pipeline;
pub mod publisher;
pub mod runner;
pub mod scheduler;
pub mod selector;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{build_pipeline, pg_store};
pub use diagnostics::RunLog;
pub use pipeline::{PipelinePolicy, PublicationPipeline, RunReport, RunStats};
pub use runner::SweepRunner;
pub use scheduler::CronScheduler;
