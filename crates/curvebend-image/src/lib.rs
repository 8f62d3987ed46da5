#![deny(missing_docs)]
//! Image types and traits for generating and manipulating rasters

/// image representation for the bend engine.
pub mod image;

/// Error types for the image module.
pub mod error;

/// Pixel format conversions.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageDtype, ImageSize};
