use rayon::prelude::*;

use crate::interpolation::grid::SamplingGrid;
use curvebend_image::{Image, ImageError};

/// Apply a function to each pixel for grid sampling in parallel.
///
/// The rows of `dst` are processed in parallel; `f` receives the source coordinate stored in
/// the grid for that destination pixel together with the destination pixel itself.
///
/// # Errors
///
/// The grid must have the same size as the destination image.
pub fn par_iter_rows_resample<const C: usize>(
    dst: &mut Image<f32, C>,
    grid: &SamplingGrid,
    f: impl Fn(&f32, &f32, &mut [f32]) + Send + Sync,
) -> Result<(), ImageError> {
    if grid.size != dst.size() {
        return Err(ImageError::InvalidImageSize(
            grid.size.width,
            grid.size.height,
            dst.width(),
            dst.height(),
        ));
    }

    let cols = dst.cols();
    if cols == 0 {
        return Ok(());
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(grid.map_x.par_chunks_exact(cols))
        .zip(grid.map_y.par_chunks_exact(cols))
        .for_each(|((dst_chunk, map_x_chunk), map_y_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(map_x_chunk.iter().zip(map_y_chunk.iter()))
                .for_each(|(dst_pixel, (x, y))| {
                    f(x, y, dst_pixel);
                });
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::interpolation::grid::meshgrid_from_fn;
    use curvebend_image::{Image, ImageError};

    #[test]
    fn resample_writes_every_pixel() -> Result<(), ImageError> {
        let mut dst = Image::<f32, 2>::from_size_val([3, 2].into(), 0.0)?;
        let grid = meshgrid_from_fn(3, 2, |x, y| Ok((x as f32, y as f32)))?;

        super::par_iter_rows_resample(&mut dst, &grid, |&x, &y, pixel| {
            pixel[0] = x;
            pixel[1] = y;
        })?;

        assert_eq!(dst.pixel(2, 1), Some([2.0, 1.0]));
        assert_eq!(dst.pixel(0, 1), Some([0.0, 1.0]));
        Ok(())
    }

    #[test]
    fn resample_size_mismatch() -> Result<(), ImageError> {
        let mut dst = Image::<f32, 1>::from_size_val([3, 2].into(), 0.0)?;
        let grid = meshgrid_from_fn(2, 2, |x, y| Ok((x as f32, y as f32)))?;

        let result = super::par_iter_rows_resample(&mut dst, &grid, |_, _, _| {});
        assert!(result.is_err());
        Ok(())
    }
}
