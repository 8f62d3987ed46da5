use crate::{Image, ImageError};

/// Add an opaque alpha channel to an RGB image.
///
/// Example:
///
/// ```
/// use curvebend_image::{Image, ImageSize};
/// use curvebend_image::ops::rgb_to_rgba;
///
/// let image = Image::<u8, 3>::new(
///   ImageSize {
///     width: 1,
///     height: 1,
///   },
///   vec![10u8, 20, 30],
/// ).unwrap();
///
/// let rgba = rgb_to_rgba(&image).unwrap();
///
/// assert_eq!(rgba.as_slice(), &[10u8, 20, 30, 255]);
/// ```
pub fn rgb_to_rgba(src: &Image<u8, 3>) -> Result<Image<u8, 4>, ImageError> {
    let data = src
        .as_slice()
        .chunks_exact(3)
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect();

    Image::new(src.size(), data)
}

/// Expand a grayscale image into RGBA, replicating the gray value and adding opaque alpha.
pub fn gray_to_rgba(src: &Image<u8, 1>) -> Result<Image<u8, 4>, ImageError> {
    let data = src
        .as_slice()
        .iter()
        .flat_map(|&v| [v, v, v, 255])
        .collect();

    Image::new(src.size(), data)
}

/// Expand a gray + alpha image into RGBA.
pub fn gray_alpha_to_rgba(src: &Image<u8, 2>) -> Result<Image<u8, 4>, ImageError> {
    let data = src
        .as_slice()
        .chunks_exact(2)
        .flat_map(|p| [p[0], p[0], p[0], p[1]])
        .collect();

    Image::new(src.size(), data)
}
