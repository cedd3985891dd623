//! Binary JPEG structure parsing for the forensic report engine.
//!
//! This crate provides:
//! - A sequential marker segment scanner over a compressed image stream
//! - Embedded-thumbnail extraction built on top of it

pub mod jpeg;
pub mod thumbnail;

pub use jpeg::{JpegError, JpegResult, Marker, MarkerScanner};
pub use thumbnail::{extract_thumbnails, ThumbnailScan};
