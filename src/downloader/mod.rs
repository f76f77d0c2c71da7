//! Media download module

pub mod engine;

pub use engine::{DownloadConfig, DownloadEngine, Downloader};
