use crate::curve::Outline;

/// Per column displacement curves of both outlines, one value per source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedCurves {
    /// Upper outline, values in `[0, ymax]`.
    pub upper: Vec<i32>,
    /// Lower outline, values in `[0, ymax]`.
    pub lower: Vec<i32>,
}

impl ExpandedCurves {
    /// The curve of one outline.
    pub fn get(&self, outline: Outline) -> &[i32] {
        match outline {
            Outline::Upper => &self.upper,
            Outline::Lower => &self.lower,
        }
    }

    /// The curve of one outline, mutably.
    pub fn get_mut(&mut self, outline: Outline) -> &mut Vec<i32> {
        match outline {
            Outline::Upper => &mut self.upper,
            Outline::Lower => &mut self.lower,
        }
    }
}

/// Extent of one outline curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineExtent {
    /// Smallest value of the curve.
    pub min: i32,
    /// Largest value of the curve.
    pub max: i32,
    /// Baseline of the curve, the value that means "not displaced".
    pub zero: i32,
}

/// Extents of both outlines for one bend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryState {
    /// Upper outline extent.
    pub upper: OutlineExtent,
    /// Lower outline extent.
    pub lower: OutlineExtent,
}

impl GeometryState {
    /// Derive the extents from the expanded curves.
    ///
    /// The upper baseline is the smaller and the lower baseline the larger of the two edge
    /// values of the respective curve.
    pub fn from_curves(curves: &ExpandedCurves) -> Self {
        let extent = |curve: &[i32], zero: fn(i32, i32) -> i32| {
            let first = curve.first().copied().unwrap_or(0);
            let last = curve.last().copied().unwrap_or(0);
            OutlineExtent {
                min: curve.iter().copied().min().unwrap_or(0),
                max: curve.iter().copied().max().unwrap_or(0),
                zero: zero(first, last),
            }
        };

        Self {
            upper: extent(curves.upper.as_slice(), i32::min),
            lower: extent(curves.lower.as_slice(), i32::max),
        }
    }

    /// Rows the destination needs above the source, also the shift of every destination row.
    pub fn upper_extend(&self, height: i32) -> i32 {
        let y1 = self.upper.max - self.upper.zero;
        let y2 = (self.lower.max - self.lower.zero) - height;
        y1.max(y2)
    }

    /// Rows the destination needs below the source.
    pub fn lower_extend(&self, height: i32) -> i32 {
        let y1 = self.lower.zero - self.lower.min;
        let y2 = (self.upper.zero - self.upper.min) - height;
        y1.max(y2)
    }

    /// Height of the destination raster for a source of `height` rows.
    pub fn dst_height(&self, height: i32) -> i32 {
        height + self.upper_extend(height) + self.lower_extend(height)
    }
}

/// Vertical displacement of every source pixel.
///
/// Row `y` of column `x` moves by a blend of the upper and lower outline displacement,
/// weighted by the row position.
#[derive(Debug, Clone, Copy)]
pub struct Displacement<'a> {
    curves: &'a ExpandedCurves,
    geometry: &'a GeometryState,
    height: i32,
}

impl<'a> Displacement<'a> {
    /// Create the displacement field of a source with `height` rows.
    pub fn new(curves: &'a ExpandedCurves, geometry: &'a GeometryState, height: i32) -> Self {
        Self {
            curves,
            geometry,
            height,
        }
    }

    /// Displacement of the pixel at column `x` and row `y`, negative values move up.
    pub fn dy(&self, x: usize, y: i32) -> i32 {
        let upper = self.curves.upper.get(x).copied().unwrap_or(self.geometry.upper.zero);
        let lower = self.curves.lower.get(x).copied().unwrap_or(self.geometry.lower.zero);

        let y1 = (self.geometry.upper.zero - upper) as f64;
        let y2 = (self.geometry.lower.zero - lower) as f64;

        // a single row source follows the upper outline
        if self.height < 2 {
            return y1.round() as i32;
        }

        let delta = (y2 - y1) / (self.height - 1) as f64 * y as f64;
        (y1 + delta).round() as i32
    }
}
