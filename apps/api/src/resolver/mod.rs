//! Pasted URL to video id, thumbnail and title.

pub mod debounce;
pub mod metadata;
pub mod video;

pub use debounce::{DebouncedResolver, Resolution, DEBOUNCE_WINDOW};
pub use metadata::{TitleLookup, YouTubeClient};
pub use video::{embed_url, extract_video_id, thumbnail_url};
