//! Geometric image transformations.
//!
//! - Affine transformations (rotation, translation, scaling, shearing)
//! - Rotation matrix generation
//! - Affine transform inversion
//! - Whole-raster rotation that grows the canvas to the rotated bounding box
//!
//! # Examples
//!
//! Rotating an RGBA raster by 30 degrees clockwise:
//!
//! ```
//! use curvebend_image::{Image, ImageSize};
//! use curvebend_imgproc::interpolation::InterpolationMode;
//! use curvebend_imgproc::warp::rotate_expand;
//!
//! let image = Image::<u8, 4>::from_size_val(ImageSize { width: 8, height: 4 }, 255).unwrap();
//! let rotated = rotate_expand(&image, 30.0, InterpolationMode::Nearest).unwrap();
//!
//! assert!(rotated.width() > 8);
//! ```

mod affine;
mod rotate;

pub use affine::{get_rotation_matrix2d, invert_affine_transform, warp_affine};
pub use rotate::{rotate_expand, rotate_quarter, rotated_size, QuarterTurn};
