//! Per-upstream adapter implementations.
//!
//! Each adapter owns its endpoint URL, its field chains and its not-found
//! predicate. [`Adapters`] bundles one instance of each so a server can hold
//! them behind a single shared handle.

pub mod character;
pub mod chat;
pub mod geoip;
pub mod quote;
pub mod screenshot;
pub mod short_video;
pub mod verse;
pub mod video_download;
pub mod video_search;

pub use character::{CharacterAdapter, CharacterRecord};
pub use chat::{ChatAdapter, ChatRecord};
pub use geoip::{GeoIpAdapter, GeoRecord};
pub use quote::{QuoteAdapter, QuoteRecord};
pub use screenshot::{Screenshot, ScreenshotAdapter};
pub use short_video::{ShortVideoAdapter, ShortVideoRecord};
pub use verse::{VerseAdapter, VerseRecord};
pub use video_download::{DownloadRecord, VideoDownloadAdapter};
pub use video_search::{VideoSearchAdapter, VideoSearchRecord};

use crate::config::Endpoints;

/// One instance of every HTTP-backed adapter.
#[derive(Debug, Clone)]
pub struct Adapters {
    /// Bible verse lookup.
    pub verse: VerseAdapter,
    /// Random quote.
    pub quote: QuoteAdapter,
    /// Geo-IP lookup.
    pub geoip: GeoIpAdapter,
    /// Video search listing.
    pub video_search: VideoSearchAdapter,
    /// Video download links.
    pub video_download: VideoDownloadAdapter,
    /// Short-video search listing.
    pub short_video: ShortVideoAdapter,
    /// Character lookup.
    pub character: CharacterAdapter,
    /// Chat reply.
    pub chat: ChatAdapter,
}

impl Adapters {
    /// Build every adapter against `endpoints`.
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            verse: VerseAdapter::new(endpoints.verse_url.as_str()),
            quote: QuoteAdapter::new(endpoints.quote_url.as_str()),
            geoip: GeoIpAdapter::new(endpoints.geoip_url.as_str()),
            video_search: VideoSearchAdapter::new(endpoints.video_search_url.as_str()),
            video_download: VideoDownloadAdapter::new(endpoints.download_url.as_str()),
            short_video: ShortVideoAdapter::new(endpoints.short_video_url.as_str()),
            character: CharacterAdapter::new(endpoints.character_url.as_str()),
            chat: ChatAdapter::new(endpoints.chat_url.as_str()),
        }
    }
}

impl Default for Adapters {
    fn default() -> Self {
        Self::new(&Endpoints::default())
    }
}
