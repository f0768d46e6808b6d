//! Data module for downloading and caching ephemeris files

mod downloader;

pub use downloader::{
    download_ephemeris, download_ephemeris_to, ensure_cache_dir, ephemeris_url, get_cache_dir,
    DEFAULT_EPHEMERIS,
};
