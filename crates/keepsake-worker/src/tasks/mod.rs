//! The five enrichment tasks, in the order the standard registry runs them.

mod face_detect;
mod location;
mod metadata;
mod thumbnail;
mod video;

pub use face_detect::FaceDetectTask;
pub use location::LocationTask;
pub use metadata::MetadataTask;
pub use thumbnail::{thumbnail_path, ThumbnailTask, THUMBNAIL_MIME};
pub use video::{normalized_path, VideoTask};
