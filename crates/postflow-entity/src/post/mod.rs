//! Scheduled post domain entities.

pub mod content;
pub mod location;
pub mod model;
pub mod status;

pub use content::{ContentKind, PostContent};
pub use location::LocationTask;
pub use model::ScheduledPost;
pub use status::PostStatus;
