use curvebend_image::ImageError;

use crate::document::DrawableId;
use crate::pointfile::PointFileError;
use crate::store::StoreError;

/// How a failed invocation is reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed malformed arguments.
    Calling,
    /// The arguments were fine but the bend could not be carried out.
    Execution,
}

/// An error type for the bend engine.
#[derive(thiserror::Error, Debug)]
pub enum BendError {
    /// Error raised by the image containers or the rotation primitive.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error while reading or writing a point file.
    #[error(transparent)]
    PointFile(#[from] PointFileError),

    /// Error in the parameter store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An invocation argument has the wrong shape or range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The iteration entry point was called for a record of a different layout.
    #[error("Iteration record size ({actual}) does not match the stored record size ({expected})")]
    IterationSizeMismatch {
        /// Size of the stored parameter record.
        expected: usize,
        /// Size announced by the caller.
        actual: usize,
    },

    /// The target drawable does not exist in the document.
    #[error("Unknown drawable ({0})")]
    UnknownDrawable(DrawableId),

    /// The target drawable is a channel, not a layer.
    #[error("Can operate on layers only (but was called on channel or mask)")]
    NotALayer(DrawableId),

    /// The target layer carries a layer mask.
    #[error("Cannot operate on layers with masks")]
    LayerHasMask(DrawableId),

    /// The selection does not intersect the target layer.
    #[error("Cannot operate on empty selections")]
    EmptySelection,

    /// The target layer has no pixels.
    #[error("Cannot operate on empty drawable ({0})")]
    EmptyDrawable(DrawableId),

    /// An iteration run found no from/to record in the store.
    #[error("No stored values for {0}")]
    MissingIterationData(&'static str),
}

impl BendError {
    /// Classify the error the way the host reports it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BendError::InvalidArgument(_) | BendError::IterationSizeMismatch { .. } => {
                ErrorKind::Calling
            }
            _ => ErrorKind::Execution,
        }
    }
}
