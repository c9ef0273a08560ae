//! Content published with a post.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of content the listing platform should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Text update, optionally with a link.
    Standard,
    /// Update carrying an image.
    Photo,
    /// Update carrying a video.
    Video,
}

/// Content payload reference stored alongside a post.
///
/// Media lives in external storage; only its reference is kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PostContent {
    /// Reference (URL or storage key) of the uploaded media, if any.
    pub media_ref: Option<String>,
    /// Body text.
    pub description: String,
    /// Optional call-to-action link.
    pub link: Option<String>,
    /// Content-type selector passed to the publish endpoint.
    pub content_kind: ContentKind,
}
