//! Editing state of an interactive bend.
//!
//! A [`BendSession`] owns the parameters being edited and the preview derived from them. UI
//! adapters translate their events into the methods below; every editing operation leaves the
//! graph curve and, when enabled, the preview up to date.
//!
//! Graph coordinates span `0..=255` on both axes with `y` growing downwards, so a graph
//! position `(x, y)` stands for the curve value `255 - y` at column `x`.

use std::path::Path;

use curvebend_image::Image;

use crate::curve::{
    to_freehand, to_smooth_approx, BendParameters, ControlCurve, ControlPoints, CurveType,
    Outline, CURVE_SAMPLES, MAX_POINTS,
};
use crate::document::ImageBase;
use crate::error::BendError;
use crate::pointfile::PointFile;
use crate::preview::{bend_preview, render_preview, thumbnail};
use crate::spline::graph_curve;

/// Pointer distance in graph units within which a press grabs an existing control point.
const MIN_DISTANCE: i32 = 8;

const GRAPH_MAX: i32 = CURVE_SAMPLES as i32 - 1;

/// What the pointer currently drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grab {
    /// A control point in smooth mode, confined between its neighbours.
    Point {
        slot: usize,
        leftmost: i32,
        rightmost: i32,
    },
    /// The pen in freehand mode with its last position.
    Freehand { x: i32, last_y: i32 },
}

/// The editing state of one interactive bend.
#[derive(Debug, Clone)]
pub struct BendSession {
    params: BendParameters,
    outline: Outline,
    grab: Option<Grab>,
    base: ImageBase,
    thumbnail: Option<Image<u8, 4>>,
    preview_enabled: bool,
    preview: Option<Image<u8, 4>>,
}

impl BendSession {
    /// Start editing `params` with the upper outline active and the preview disabled.
    pub fn new(params: BendParameters) -> Self {
        let mut session = Self {
            params,
            outline: Outline::Upper,
            grab: None,
            base: ImageBase::Rgb,
            thumbnail: None,
            preview_enabled: false,
            preview: None,
        };
        session.bake_graph();
        session
    }

    /// Use `pixels` as the preview source, shown in the colour model `base`.
    pub fn with_preview_source(
        mut self,
        pixels: &Image<u8, 4>,
        base: ImageBase,
    ) -> Result<Self, BendError> {
        self.thumbnail = Some(thumbnail(pixels)?);
        self.base = base;
        Ok(self)
    }

    /// The parameters being edited.
    pub fn parameters(&self) -> &BendParameters {
        &self.params
    }

    /// Change scalar parameters; call [`BendSession::recompute`] afterwards.
    pub fn parameters_mut(&mut self) -> &mut BendParameters {
        &mut self.params
    }

    /// Finish editing.
    pub fn into_parameters(self) -> BendParameters {
        self.params
    }

    /// The outline the graph edits.
    pub fn active_outline(&self) -> Outline {
        self.outline
    }

    /// Switch the outline the graph edits.
    pub fn set_active_outline(&mut self, outline: Outline) {
        self.outline = outline;
        self.grab = None;
    }

    /// The rendered preview, present once the preview was enabled with a preview source.
    pub fn preview(&self) -> Option<&Image<u8, 4>> {
        self.preview.as_ref()
    }

    /// Turn the live preview on or off.
    pub fn set_preview_enabled(&mut self, enabled: bool) -> Result<(), BendError> {
        self.preview_enabled = enabled;
        if !enabled {
            self.preview = None;
        }
        self.recompute()
    }

    /// Regenerate the graph curve and, when enabled, the preview.
    pub fn recompute(&mut self) -> Result<(), BendError> {
        self.bake_graph();
        self.refresh_preview()
    }

    /// Render the preview once, regardless of the live preview switch.
    pub fn update_preview_once(&mut self) -> Result<(), BendError> {
        self.render()
    }

    fn refresh_preview(&mut self) -> Result<(), BendError> {
        if self.preview_enabled {
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), BendError> {
        if let Some(thumb) = &self.thumbnail {
            let bent = bend_preview(thumb, &self.params)?;
            self.preview = Some(render_preview(&bent, self.base)?);
        }
        Ok(())
    }

    /// In smooth mode the samples mirror the spline through the points.
    fn bake_graph(&mut self) {
        if self.params.curve_type == CurveType::Smooth {
            for outline in Outline::ALL {
                let curve = self.params.curve_mut(outline);
                graph_curve(&curve.points, &mut curve.samples);
            }
        }
    }

    fn bake_active(&mut self) {
        if self.params.curve_type == CurveType::Smooth {
            let curve = self.params.curve_mut(self.outline);
            graph_curve(&curve.points, &mut curve.samples);
        }
    }

    fn active(&mut self) -> &mut ControlCurve {
        self.params.curve_mut(self.outline)
    }

    /// Reset an outline to the flat default.
    pub fn reset(&mut self, outline: Outline) -> Result<(), BendError> {
        *self.params.curve_mut(outline) = ControlCurve::default();
        self.grab = None;
        self.recompute()
    }

    /// Copy the active outline onto the other one.
    pub fn copy_to_other(&mut self) -> Result<(), BendError> {
        let active = *self.params.curve(self.outline);
        *self.params.curve_mut(self.outline.other()) = active;
        self.recompute()
    }

    /// Copy the mirrored active outline onto the other one.
    pub fn copy_inverted_to_other(&mut self) -> Result<(), BendError> {
        let inverted = self.params.curve(self.outline).inverted();
        *self.params.curve_mut(self.outline.other()) = inverted;
        self.recompute()
    }

    /// Exchange the two outlines.
    pub fn swap_outlines(&mut self) -> Result<(), BendError> {
        std::mem::swap(&mut self.params.upper, &mut self.params.lower);
        self.recompute()
    }

    /// Switch between the smooth and the freehand representation.
    ///
    /// Going smooth approximates the freehand samples by control points, going freehand bakes
    /// the spline into the samples.
    pub fn set_curve_type(&mut self, curve_type: CurveType) -> Result<(), BendError> {
        if curve_type == self.params.curve_type {
            return Ok(());
        }
        for outline in Outline::ALL {
            let curve = self.params.curve_mut(outline);
            match curve_type {
                CurveType::Smooth => curve.points = to_smooth_approx(&curve.samples),
                CurveType::Freehand => curve.samples = to_freehand(&curve.points),
            }
        }
        self.params.curve_type = curve_type;
        self.grab = None;
        self.recompute()
    }

    /// Slot of the defined point horizontally closest to `x`, or the slot under `x` when no
    /// point is near.
    fn closest_slot(&self, x: i32) -> usize {
        let points = &self.params.curve(self.outline).points;
        let closest = points
            .iter_defined()
            .map(|(i, (px, _))| (i, ((x as f64 - px * 255.0) as i32).abs()))
            .min_by_key(|&(_, distance)| distance);
        match closest {
            Some((slot, distance)) if distance <= MIN_DISTANCE => slot,
            _ => slot_under(x),
        }
    }

    /// Start a drag at graph position `(x, y)`.
    pub fn press(&mut self, x: i32, y: i32) {
        let (x, y) = (x.clamp(0, GRAPH_MAX), y.clamp(0, GRAPH_MAX));

        match self.params.curve_type {
            CurveType::Smooth => {
                let slot = self.closest_slot(x);
                let points = &self.params.curve(self.outline).points;
                let leftmost = (0..slot)
                    .rev()
                    .find_map(|i| points.get(i))
                    .map_or(-1, |(px, _)| (px * 255.0) as i32);
                let rightmost = (slot + 1..MAX_POINTS)
                    .find_map(|i| points.get(i))
                    .map_or(256, |(px, _)| (px * 255.0) as i32);

                self.active().points.set(slot, Some(graph_point(x, y)));
                self.grab = Some(Grab::Point {
                    slot,
                    leftmost,
                    rightmost,
                });
                self.bake_active();
            }
            CurveType::Freehand => {
                self.active().samples[x as usize] = (GRAPH_MAX - y) as u8;
                self.grab = Some(Grab::Freehand { x, last_y: y });
            }
        }
    }

    /// Continue a drag to graph position `(x, y)`; without a drag nothing changes.
    pub fn motion(&mut self, x: i32, y: i32) {
        let (x, y) = (x.clamp(0, GRAPH_MAX), y.clamp(0, GRAPH_MAX));

        match self.grab {
            Some(Grab::Point {
                slot,
                leftmost,
                rightmost,
            }) => {
                let points = &mut self.active().points;
                points.set(slot, None);

                let mut slot = slot;
                if x > leftmost && x < rightmost {
                    let under = slot_under(x);
                    if points.get(under).is_none() {
                        slot = under;
                    }
                    points.set(slot, Some(graph_point(x, y)));
                }

                self.grab = Some(Grab::Point {
                    slot,
                    leftmost,
                    rightmost,
                });
                self.bake_active();
            }
            Some(Grab::Freehand { x: gx, last_y }) => {
                let ((x1, y1), (x2, y2)) = if gx > x {
                    ((x, y), (gx, last_y))
                } else {
                    ((gx, last_y), (x, y))
                };

                let samples = &mut self.active().samples;
                if x2 != x1 {
                    for i in x1..=x2 {
                        let y = y1 + (y2 - y1) * (i - x1) / (x2 - x1);
                        samples[i as usize] = (GRAPH_MAX - y) as u8;
                    }
                } else {
                    samples[x as usize] = (GRAPH_MAX - y) as u8;
                }

                self.grab = Some(Grab::Freehand { x, last_y: y });
            }
            None => {}
        }
    }

    /// End a drag and refresh the preview.
    pub fn release(&mut self) -> Result<(), BendError> {
        self.grab = None;
        self.refresh_preview()
    }

    /// Replace points and samples with the records of a point file.
    ///
    /// A file that cannot be loaded leaves the session unchanged.
    pub fn load_points(&mut self, path: impl AsRef<Path>) -> Result<(), BendError> {
        let file = PointFile::load(path)?;
        file.apply_to(&mut self.params);
        self.grab = None;
        self.recompute()
    }

    /// Save points and samples of both outlines to a point file.
    pub fn save_points(&self, path: impl AsRef<Path>) -> Result<(), BendError> {
        PointFile::from_parameters(&self.params).save(path)?;
        Ok(())
    }

    /// Control points of the active outline, for drawing the graph.
    pub fn active_points(&self) -> &ControlPoints {
        &self.params.curve(self.outline).points
    }
}

fn slot_under(x: i32) -> usize {
    (((x + 8) / 16) as usize).min(MAX_POINTS - 1)
}

fn graph_point(x: i32, y: i32) -> (f64, f64) {
    (x as f64 / 255.0, (GRAPH_MAX - y) as f64 / 255.0)
}
