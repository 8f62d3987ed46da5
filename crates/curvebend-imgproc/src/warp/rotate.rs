use curvebend_image::{Image, ImageDtype, ImageError, ImageSize};

use super::affine::{get_rotation_matrix2d, warp_affine};
use crate::interpolation::InterpolationMode;

/// Angles closer than this to a multiple of 90 degrees take the exact quarter turn path.
const QUARTER_EPS: f64 = 1e-9;

/// A rotation by a multiple of 90 degrees, clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterTurn {
    /// 90 degrees clockwise.
    Cw90,
    /// 180 degrees.
    Cw180,
    /// 270 degrees clockwise, i.e. 90 degrees counter-clockwise.
    Cw270,
}

impl QuarterTurn {
    /// Match a clockwise angle in degrees against the quarter turns.
    pub fn from_degrees(angle: f64) -> Option<Self> {
        let angle = angle.rem_euclid(360.0);
        [(90.0, Self::Cw90), (180.0, Self::Cw180), (270.0, Self::Cw270)]
            .into_iter()
            .find(|(deg, _)| (angle - deg).abs() < QUARTER_EPS)
            .map(|(_, turn)| turn)
    }
}

/// Size of the axis aligned bounding box of a `size` raster rotated by `angle` degrees.
///
/// A non-empty raster never shrinks to zero pixels.
pub fn rotated_size(size: ImageSize, angle: f64) -> ImageSize {
    if size.is_empty() {
        return size;
    }
    let (sin, cos) = angle.to_radians().sin_cos();
    let (w, h) = (size.width as f64, size.height as f64);
    // drop rounding noise so that 30 degrees of a 10x10 square is not one pixel too wide
    let fit = |v: f64| ((v - 1e-6).ceil().max(1.0)) as usize;
    ImageSize {
        width: fit(w * cos.abs() + h * sin.abs()),
        height: fit(w * sin.abs() + h * cos.abs()),
    }
}

/// Rotate an image by a multiple of 90 degrees clockwise, copying pixels exactly.
///
/// # Example
///
/// ```
/// use curvebend_image::{Image, ImageSize};
/// use curvebend_imgproc::warp::{rotate_quarter, QuarterTurn};
///
/// let image = Image::<u8, 1>::new(ImageSize { width: 3, height: 1 }, vec![1, 2, 3]).unwrap();
/// let rotated = rotate_quarter(&image, QuarterTurn::Cw90).unwrap();
///
/// assert_eq!(rotated.size(), ImageSize { width: 1, height: 3 });
/// assert_eq!(rotated.as_slice(), &[1, 2, 3]);
/// ```
pub fn rotate_quarter<T, const C: usize>(
    src: &Image<T, C>,
    turn: QuarterTurn,
) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default,
{
    let (w, h) = (src.width(), src.height());
    let dst_size = match turn {
        QuarterTurn::Cw180 => src.size(),
        QuarterTurn::Cw90 | QuarterTurn::Cw270 => ImageSize {
            width: h,
            height: w,
        },
    };

    let src_data = src.as_slice();
    let mut data = Vec::with_capacity(src_data.len());
    for v in 0..dst_size.height {
        for u in 0..dst_size.width {
            let (x, y) = match turn {
                QuarterTurn::Cw90 => (v, h - 1 - u),
                QuarterTurn::Cw180 => (w - 1 - u, h - 1 - v),
                QuarterTurn::Cw270 => (w - 1 - v, u),
            };
            let base = (y * w + x) * C;
            data.extend_from_slice(&src_data[base..base + C]);
        }
    }

    Image::new(dst_size, data)
}

/// Rotate an image clockwise by `angle` degrees around its center.
///
/// The canvas grows to the bounding box of the rotated raster; pixels not covered by the
/// source are all zero, which for an RGBA raster means transparent. Multiples of 90 degrees
/// are exact pixel permutations, other angles are resampled with `interpolation`.
///
/// # Errors
///
/// Returns an error when the intermediate float rasters cannot be allocated consistently.
pub fn rotate_expand<T, const C: usize>(
    src: &Image<T, C>,
    angle: f64,
    interpolation: InterpolationMode,
) -> Result<Image<T, C>, ImageError>
where
    T: ImageDtype,
{
    let angle = angle.rem_euclid(360.0);
    if angle.abs() < QUARTER_EPS || (360.0 - angle).abs() < QUARTER_EPS || src.size().is_empty()
    {
        return Ok(src.clone());
    }
    if let Some(turn) = QuarterTurn::from_degrees(angle) {
        return rotate_quarter(src, turn);
    }

    let dst_size = rotated_size(src.size(), angle);
    log::trace!(
        "rotating {} by {angle:.3} degrees into {}",
        src.size(),
        dst_size
    );

    let src_f32: Image<f32, C> = src.cast()?;
    let mut dst_f32 = Image::<f32, C>::from_size_val(dst_size, 0.0)?;

    // pixel centers sit at half integers, the rotation pivots on the raster center
    let src_center = (
        (src.width() as f32 - 1.0) / 2.0,
        (src.height() as f32 - 1.0) / 2.0,
    );
    let dst_center = (
        (dst_size.width as f32 - 1.0) / 2.0,
        (dst_size.height as f32 - 1.0) / 2.0,
    );

    // negative angle: the matrix turns counter-clockwise on screen
    let mut m = get_rotation_matrix2d(src_center, -(angle as f32), 1.0);
    m[2] += dst_center.0 - src_center.0;
    m[5] += dst_center.1 - src_center.1;

    warp_affine(&src_f32, &mut dst_f32, &m, interpolation)?;

    Image::new(
        dst_size,
        dst_f32.as_slice().iter().map(|&v| T::from_f32(v)).collect(),
    )
}
