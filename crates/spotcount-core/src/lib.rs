//! Core types shared by the spotcount pipeline crates.
//!
//! This crate only knows about pixel grids and logging. Decoding image files
//! and every pipeline stage live in other crates.

mod image;
mod logger;

pub use image::{
    GrayImage, GrayImageView, ImageError, ImageSize, PixelGrid, PixelGridView, Rgb, RgbImage,
    RgbImageView,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init, parse_level, LogFormat, LogSettings, LoggerError};
