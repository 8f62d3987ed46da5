use curvebend_image::{Image, ImageSize};
use curvebend_imgproc::{interpolation::InterpolationMode, warp::rotate_expand};

use crate::curve::{BendParameters, CurveType, Outline};
use crate::document::{Document, DrawableId, Layer};
use crate::error::BendError;
use crate::geometry::{Displacement, ExpandedCurves, GeometryState};
use crate::iteration::{interpolate_curves, Iteration};
use crate::progress::Progress;
use crate::raster::{vertical_bend, RasterOptions};
use crate::spline::pixel_curve;
use crate::stretch::stretch;

/// Stages of one bend, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BendStage {
    /// Rotate the source so that the bend direction is vertical.
    RotatePre,
    /// Expand both outlines to one value per column.
    ComputeCurves,
    /// Derive baselines and canvas growth.
    ComputeExtents,
    /// Allocate the transparent destination.
    AllocateDestination,
    /// Move the pixels.
    Rasterize,
    /// Rotate the result back.
    RotatePost,
    /// Place the result in the document.
    Finalize,
}

fn enter(stage: BendStage, detail: impl std::fmt::Display) {
    log::debug!("curve bend {stage:?}: {detail}");
}

fn expand_outline(params: &BendParameters, outline: Outline, xmax: usize) -> Vec<i32> {
    let curve = params.curve(outline);
    let ymax = xmax as i32;
    match params.curve_type {
        CurveType::Smooth => pixel_curve(&curve.points, xmax, ymax),
        CurveType::Freehand => stretch(&curve.samples, xmax, ymax),
    }
}

/// Expand both outlines to `width` columns with values in `[0, width - 1]`.
///
/// With an iteration the curves of its "from" and "to" parameters are expanded separately and
/// blended per column; `params` only decides the curves otherwise.
pub fn compute_curves(
    params: &BendParameters,
    iteration: Option<&Iteration>,
    width: usize,
) -> ExpandedCurves {
    let xmax = width.saturating_sub(1);
    let mut curves = ExpandedCurves {
        upper: Vec::new(),
        lower: Vec::new(),
    };

    for outline in Outline::ALL {
        let curve = match iteration.filter(|it| it.state.total_steps >= 1) {
            Some(it) => {
                let from = expand_outline(&it.from, outline, xmax);
                let to = expand_outline(&it.to, outline, xmax);
                let mut curve = from.clone();
                interpolate_curves(&mut curve, &from, &to, it.state);
                curve
            }
            None => expand_outline(params, outline, xmax),
        };
        *curves.get_mut(outline) = curve;
    }

    curves
}

/// Bend a raster and return the new, usually taller, raster.
///
/// `src_has_alpha` tells the antialiasing whether transparent source pixels are meaningful.
///
/// # Errors
///
/// Fails when the rotation or an allocation of the destination fails.
pub fn bend_image(
    src: &Image<u8, 4>,
    src_has_alpha: bool,
    params: &BendParameters,
    iteration: Option<&Iteration>,
    progress: &mut dyn Progress,
) -> Result<Image<u8, 4>, BendError> {
    let interpolation = if params.smoothing {
        InterpolationMode::Bilinear
    } else {
        InterpolationMode::Nearest
    };

    let rotated = if params.rotation != 0.0 {
        enter(BendStage::RotatePre, format_args!("{} degrees", params.rotation));
        rotate_expand(src, params.rotation, interpolation)?
    } else {
        src.clone()
    };

    let (width, height) = (rotated.width(), rotated.height() as i32);
    enter(BendStage::ComputeCurves, format_args!("{width} columns"));
    let curves = compute_curves(params, iteration, width);

    let geometry = GeometryState::from_curves(&curves);
    let topshift = geometry.upper_extend(height);
    let dst_height = geometry.dst_height(height).max(0) as usize;
    enter(
        BendStage::ComputeExtents,
        format_args!("{geometry:?}, height {height} -> {dst_height}"),
    );

    enter(BendStage::AllocateDestination, format_args!("{width}x{dst_height}"));
    let mut dst = Image::from_size_val(
        ImageSize {
            width,
            height: dst_height,
        },
        0u8,
    )?;

    enter(BendStage::Rasterize, format_args!("topshift {topshift}"));
    let displacement = Displacement::new(&curves, &geometry, height);
    let options = RasterOptions {
        smoothing: params.smoothing,
        antialias: params.antialias,
        src_has_alpha,
    };
    vertical_bend(&rotated, &mut dst, &displacement, topshift, options, progress);

    if params.rotation != 0.0 {
        enter(
            BendStage::RotatePost,
            format_args!("{} degrees", 360.0 - params.rotation),
        );
        dst = rotate_expand(&dst, 360.0 - params.rotation, interpolation)?;
    }

    Ok(dst)
}

/// Bend a layer of `document` and return the id of the layer holding the result.
///
/// With `work_on_copy` the result goes into a new layer named after the source with a `_b`
/// suffix, otherwise the source layer is resized in place. Either way the result gains an
/// alpha channel and is centred on the source layer.
///
/// # Errors
///
/// [`BendError::UnknownDrawable`] for a missing layer, [`BendError::EmptyDrawable`] for a
/// layer without pixels, or any failure of [`bend_image`].
pub fn main_bend(
    document: &mut Document,
    id: DrawableId,
    params: &BendParameters,
    iteration: Option<&Iteration>,
    progress: &mut dyn Progress,
) -> Result<DrawableId, BendError> {
    let layer = document.layer(id).ok_or(BendError::UnknownDrawable(id))?;
    if layer.size().is_empty() {
        return Err(BendError::EmptyDrawable(id));
    }

    let center = layer.center();
    let bent = bend_image(&layer.pixels, layer.has_alpha, params, iteration, progress)?;
    let offsets = (
        center.0 - bent.width() as i32 / 2,
        center.1 - bent.height() as i32 / 2,
    );
    enter(BendStage::Finalize, format_args!("{} at {offsets:?}", bent.size()));

    if params.work_on_copy {
        let copy = Layer {
            name: format!("{}_b", layer.name),
            pixels: bent,
            has_alpha: true,
            offsets,
            visible: layer.visible,
            has_mask: false,
        };
        return Ok(document.add_layer(copy));
    }

    let layer = document
        .layer_mut(id)
        .ok_or(BendError::UnknownDrawable(id))?;
    layer.pixels = bent;
    layer.has_alpha = true;
    layer.offsets = offsets;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::ControlPoints;
    use crate::iteration::IterationState;
    use crate::progress::NoProgress;

    fn bulge(amplitude: f64) -> BendParameters {
        let mut params = BendParameters::default();
        params.upper.points.set(8, Some((0.5, 0.5 + amplitude)));
        params.lower.points.set(8, Some((0.5, 0.5 - amplitude)));
        params
    }

    #[test]
    fn flat_parameters_keep_size() -> Result<(), BendError> {
        // an odd column count keeps the flat outline on an exact pixel row
        let src = Image::from_size_pixel([21, 10].into(), [10, 20, 30, 255]);
        let out = bend_image(&src, false, &BendParameters::default(), None, &mut NoProgress)?;
        assert_eq!(out, src);
        Ok(())
    }

    #[test]
    fn flat_freehand_keeps_size() -> Result<(), BendError> {
        let params = BendParameters {
            curve_type: CurveType::Freehand,
            smoothing: false,
            antialias: false,
            ..Default::default()
        };
        for width in [3, 5, 20, 31, 101, 256, 300] {
            let src = Image::from_size_pixel([width, 10].into(), [10, 20, 30, 255]);
            let out = bend_image(&src, false, &params, None, &mut NoProgress)?;
            assert_eq!(out.size(), src.size(), "width {width}");
        }
        Ok(())
    }

    #[test]
    fn bulge_grows_canvas() -> Result<(), BendError> {
        let src = Image::from_size_pixel([101, 40].into(), [200, 0, 0, 255]);
        let out = bend_image(&src, false, &bulge(0.1), None, &mut NoProgress)?;
        assert_eq!(out.width(), 101);
        // 0.1 of 100 rows on each side
        assert!((out.height() as i32 - 60).abs() <= 2, "{}", out.height());
        Ok(())
    }

    #[test]
    fn freehand_uses_samples() {
        let mut params = BendParameters {
            curve_type: CurveType::Freehand,
            ..Default::default()
        };
        params.upper.samples = [255; 256];
        params.upper.points = ControlPoints::empty();
        let curves = compute_curves(&params, None, 11);
        assert_eq!(curves.upper, vec![10; 11]);
        assert_eq!(curves.lower, vec![5; 11]);
    }

    #[test]
    fn iteration_blends_from_and_to() {
        let mut to = BendParameters {
            curve_type: CurveType::Freehand,
            ..Default::default()
        };
        to.upper.samples = [255; 256];
        let mut from = to;
        from.upper.samples = [0; 256];

        let iteration = Iteration {
            from,
            to,
            state: IterationState::new(2, 1.0),
        };
        let curves = compute_curves(&BendParameters::default(), Some(&iteration), 11);
        assert_eq!(curves.upper, vec![5; 11]);
    }

    #[test]
    fn copy_goes_to_new_layer() -> Result<(), BendError> {
        let mut doc = Document::default();
        let mut source = Layer::new(
            "photo",
            Image::from_size_pixel([21, 10].into(), [1, 2, 3, 255]),
        )
        .with_offsets(100, 50);
        source.visible = false;
        let id = doc.add_layer(source);

        let params = BendParameters {
            work_on_copy: true,
            ..bulge(0.2)
        };
        let out = main_bend(&mut doc, id, &params, None, &mut NoProgress)?;
        assert_ne!(out, id);

        let copy = doc.layer(out).ok_or(BendError::UnknownDrawable(out))?;
        assert_eq!(copy.name, "photo_b");
        assert!(!copy.visible);
        assert!(copy.has_alpha);
        assert!(copy.pixels.height() > 10);
        assert_eq!(copy.center(), (110, 55));
        assert_eq!(doc.layer(id).map(|l| l.pixels.height()), Some(10));
        Ok(())
    }

    #[test]
    fn in_place_resizes_layer() -> Result<(), BendError> {
        let mut doc = Document::default();
        let rgb = Image::<u8, 3>::from_size_val([21, 10].into(), 7)?;
        let id = doc.add_layer(Layer::from_rgb("bg", &rgb)?);

        let out = main_bend(&mut doc, id, &bulge(0.2), None, &mut NoProgress)?;
        assert_eq!(out, id);
        let layer = doc.layer(id).ok_or(BendError::UnknownDrawable(id))?;
        assert!(layer.has_alpha);
        assert!(layer.pixels.height() > 10);
        assert_eq!(layer.center(), (10, 5));
        Ok(())
    }

    #[test]
    fn empty_layer_is_rejected() -> Result<(), BendError> {
        let mut doc = Document::default();
        let id = doc.add_layer(Layer::new("empty", Image::from_size_val([0, 0].into(), 0)?));
        assert!(matches!(
            main_bend(&mut doc, id, &BendParameters::default(), None, &mut NoProgress),
            Err(BendError::EmptyDrawable(_))
        ));
        Ok(())
    }
}
