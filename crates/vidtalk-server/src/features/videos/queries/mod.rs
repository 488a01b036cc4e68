pub mod get;
pub mod list;

pub use get::{GetVideoError, GetVideoQuery};
pub use list::{ListVideosError, ListVideosQuery, VideoSummary};
