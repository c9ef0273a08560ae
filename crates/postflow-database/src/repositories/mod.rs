//! Repository implementations backed by PostgreSQL.

pub mod owner;
pub mod post;

pub use owner::OwnerRepository;
pub use post::{PostRepository, StatusCount};
