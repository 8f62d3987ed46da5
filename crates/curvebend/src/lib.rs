#![deny(missing_docs)]
#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

/// The bend pipeline: rotation, curve expansion, canvas growth and placement.
pub mod bend;

/// Outline representations and the bend parameter set.
pub mod curve;

/// The in-memory host document.
pub mod document;

/// Error types of the engine.
pub mod error;

/// Canvas extents and the per pixel displacement field.
pub mod geometry;

/// From/to interpolation of animated runs.
pub mod iteration;

/// Point file save and load.
pub mod pointfile;

/// Preview thumbnails and rendering.
pub mod preview;

/// Procedure entry points.
pub mod procedure;

/// Progress reporting sinks.
pub mod progress;

/// The vertical bend rasterizer.
pub mod raster;

/// Interactive editing state.
pub mod session;

/// Catmull-Rom spline evaluation.
pub mod spline;

/// Parameter records kept between invocations.
pub mod store;

/// Rescaling of freehand curves.
pub mod stretch;

#[doc(inline)]
pub use curvebend_image as image;

#[doc(inline)]
pub use curvebend_imgproc as imgproc;

pub use crate::error::{BendError, ErrorKind};
pub use crate::procedure::{run_curve_bend, run_iterator, BendArgs, BendOutcome, RunMode};
