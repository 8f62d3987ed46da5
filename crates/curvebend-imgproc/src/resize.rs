use curvebend_image::{Image, ImageError};

/// Resize an image to the size of `dst` by nearest neighbor sampling.
///
/// Destination pixel `(x, y)` copies source pixel `(x * sx, y * sy)` with the coordinates
/// truncated, where `sx` and `sy` are the source to destination size ratios. No filtering is
/// applied, which keeps the function suitable for quick thumbnails.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, its size selects the target size.
///
/// # Errors
///
/// Returns an error when the source is empty while the destination is not.
///
/// # Example
///
/// ```
/// use curvebend_image::{Image, ImageSize};
/// use curvebend_imgproc::resize::resize_nearest;
///
/// let image = Image::<_, 1>::new(
///     ImageSize {
///         width: 4,
///         height: 2,
///     },
///     vec![0u8, 1, 2, 3, 4, 5, 6, 7],
/// )
/// .unwrap();
///
/// let mut image_resized = Image::<_, 1>::from_size_val([2, 1].into(), 0u8).unwrap();
///
/// resize_nearest(&image, &mut image_resized).unwrap();
///
/// assert_eq!(image_resized.as_slice(), &[0, 2]);
/// ```
pub fn resize_nearest<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: Copy,
{
    if dst.size().is_empty() {
        return Ok(());
    }
    if src.size().is_empty() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let scale_x = src.width() as f64 / dst.width() as f64;
    let scale_y = src.height() as f64 / dst.height() as f64;
    let (src_cols, dst_cols) = (src.cols(), dst.cols());
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .chunks_exact_mut(C * dst_cols)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let sy = ((y as f64 * scale_y) as usize).min(src.rows() - 1);
            dst_row
                .chunks_exact_mut(C)
                .enumerate()
                .for_each(|(x, dst_pixel)| {
                    let sx = ((x as f64 * scale_x) as usize).min(src_cols - 1);
                    let base = (sy * src_cols + sx) * C;
                    dst_pixel.copy_from_slice(&src_data[base..base + C]);
                });
        });

    Ok(())
}
