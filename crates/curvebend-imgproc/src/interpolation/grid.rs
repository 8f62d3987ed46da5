use curvebend_image::{ImageError, ImageSize};

/// A dense sampling grid: for every destination pixel, the source coordinate to read.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingGrid {
    /// Grid size, equal to the destination image size.
    pub size: ImageSize,
    /// Source x coordinates, row major.
    pub map_x: Vec<f32>,
    /// Source y coordinates, row major.
    pub map_y: Vec<f32>,
}

/// Create a sampling grid by evaluating `f(x, y)` for every destination pixel.
///
/// # Arguments
///
/// * `cols` - The number of columns of the grid
/// * `rows` - The number of rows of the grid
/// * `f` - The function mapping a destination pixel to a source position
pub fn meshgrid_from_fn(
    cols: usize,
    rows: usize,
    f: impl Fn(usize, usize) -> Result<(f32, f32), ImageError>,
) -> Result<SamplingGrid, ImageError> {
    let mut map_x = Vec::with_capacity(rows * cols);
    let mut map_y = Vec::with_capacity(rows * cols);

    for y in 0..rows {
        for x in 0..cols {
            let (u, v) = f(x, y)?;
            map_x.push(u);
            map_y.push(v);
        }
    }

    Ok(SamplingGrid {
        size: ImageSize {
            width: cols,
            height: rows,
        },
        map_x,
        map_y,
    })
}
