use serde::{Deserialize, Serialize};

use crate::spline;

/// Number of control point slots per outline.
pub const MAX_POINTS: usize = 17;

/// Number of samples of a freehand curve.
pub const CURVE_SAMPLES: usize = 256;

/// Sample value of a flat freehand curve.
pub const MIDDLE: u8 = 127;

/// A normalized control point `(x, y)` in `[0, 1] x [0, 1]`, y grows upwards.
pub type ControlPoint = (f64, f64);

/// One of the two outlines of the bend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outline {
    /// The outline the top row of the source follows.
    Upper,
    /// The outline the bottom row of the source follows.
    Lower,
}

impl Outline {
    /// Both outlines, upper first.
    pub const ALL: [Outline; 2] = [Outline::Upper, Outline::Lower];

    /// The opposite outline.
    pub fn other(self) -> Self {
        match self {
            Outline::Upper => Outline::Lower,
            Outline::Lower => Outline::Upper,
        }
    }

    /// Array index of the outline in persisted records.
    pub fn index(self) -> usize {
        match self {
            Outline::Upper => 0,
            Outline::Lower => 1,
        }
    }
}

/// Which representation of the curves drives the bend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurveType {
    /// Catmull-Rom spline through the control points.
    #[default]
    Smooth,
    /// The 256 samples are used as they are.
    Freehand,
}

impl CurveType {
    /// Decode the integer code used by invocation arguments, `0` is smooth and anything else
    /// is freehand.
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            CurveType::Smooth
        } else {
            CurveType::Freehand
        }
    }

    /// The integer code of the curve type.
    pub fn code(self) -> i32 {
        match self {
            CurveType::Smooth => 0,
            CurveType::Freehand => 1,
        }
    }
}

/// The 17 control point slots of one outline.
///
/// Only defined slots take part in the spline, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoints([Option<ControlPoint>; MAX_POINTS]);

impl Default for ControlPoints {
    fn default() -> Self {
        let mut slots = [None; MAX_POINTS];
        slots[0] = Some((0.0, 0.5));
        slots[MAX_POINTS - 1] = Some((1.0, 0.5));
        Self(slots)
    }
}

impl ControlPoints {
    /// Control points with every slot unused.
    pub fn empty() -> Self {
        Self([None; MAX_POINTS])
    }

    /// Create control points from raw slots.
    pub fn from_slots(slots: [Option<ControlPoint>; MAX_POINTS]) -> Self {
        Self(slots)
    }

    /// Decode the sentinel form where an `x` of `-1` marks an unused slot.
    pub fn from_sentinel(raw: &[[f64; 2]; MAX_POINTS]) -> Self {
        let mut slots = [None; MAX_POINTS];
        for (slot, [x, y]) in slots.iter_mut().zip(raw.iter()) {
            if *x != -1.0 {
                *slot = Some((*x, *y));
            }
        }
        Self(slots)
    }

    /// Encode into the sentinel form, unused slots become `[-1, -1]`.
    pub fn to_sentinel(&self) -> [[f64; 2]; MAX_POINTS] {
        let mut raw = [[-1.0; 2]; MAX_POINTS];
        for (dst, slot) in raw.iter_mut().zip(self.0.iter()) {
            if let Some((x, y)) = slot {
                *dst = [*x, *y];
            }
        }
        raw
    }

    /// The slot at `index`, `None` when unused or out of range.
    pub fn get(&self, index: usize) -> Option<ControlPoint> {
        self.0.get(index).copied().flatten()
    }

    /// Set or clear the slot at `index`. Out of range indices are ignored.
    pub fn set(&mut self, index: usize, point: Option<ControlPoint>) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = point;
        }
    }

    /// Borrow the raw slots.
    pub fn slots(&self) -> &[Option<ControlPoint>; MAX_POINTS] {
        &self.0
    }

    /// The defined points in slot order.
    pub fn defined(&self) -> Vec<ControlPoint> {
        self.0.iter().flatten().copied().collect()
    }

    /// Iterate over `(slot, point)` for every defined slot.
    pub fn iter_defined(&self) -> impl Iterator<Item = (usize, ControlPoint)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|p| (i, p)))
    }

    /// Mirror every defined point vertically, `y -> 1 - y`.
    pub fn inverted(&self) -> Self {
        let mut slots = self.0;
        for (_, y) in slots.iter_mut().flatten() {
            *y = 1.0 - *y;
        }
        Self(slots)
    }
}

/// Both representations of one outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlCurve {
    /// Control points used in smooth mode.
    pub points: ControlPoints,
    /// Samples used in freehand mode, index is x and value is y, both in `0..=255`.
    #[serde(with = "samples_serde")]
    pub samples: [u8; CURVE_SAMPLES],
}

impl Default for ControlCurve {
    fn default() -> Self {
        Self {
            points: ControlPoints::default(),
            samples: [MIDDLE; CURVE_SAMPLES],
        }
    }
}

impl ControlCurve {
    /// A mirrored copy: points `y -> 1 - y`, samples `s -> 255 - s`.
    pub fn inverted(&self) -> Self {
        let mut samples = self.samples;
        samples.iter_mut().for_each(|s| *s = 255 - *s);
        Self {
            points: self.points.inverted(),
            samples,
        }
    }
}

/// Bake the spline through `points` into 256 samples.
///
/// Columns the spline does not reach keep the flat value [`MIDDLE`].
pub fn to_freehand(points: &ControlPoints) -> [u8; CURVE_SAMPLES] {
    let mut samples = [MIDDLE; CURVE_SAMPLES];
    spline::graph_curve(points, &mut samples);
    samples
}

/// Approximate freehand samples by 9 control points.
///
/// The samples at `0, 32, ..., 224, 255` become the points of the even slots; the odd slots
/// are cleared so that only the representative points drive the spline.
pub fn to_smooth_approx(samples: &[u8; CURVE_SAMPLES]) -> ControlPoints {
    let mut points = ControlPoints::empty();
    for i in 0..=8 {
        let index = (i * 32).min(CURVE_SAMPLES - 1);
        points.set(
            i * 2,
            Some((index as f64 / 255.0, samples[index] as f64 / 255.0)),
        );
    }
    points
}

/// The complete parameter set of one bend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BendParameters {
    /// The upper outline.
    pub upper: ControlCurve,
    /// The lower outline.
    pub lower: ControlCurve,
    /// Which representation drives the bend.
    pub curve_type: CurveType,
    /// Blend displaced columns with their left neighbours and interpolate rotations.
    pub smoothing: bool,
    /// Fade the outline edges into transparency.
    pub antialias: bool,
    /// Write into a new layer instead of resizing the source layer.
    pub work_on_copy: bool,
    /// Bend direction in degrees, `0` bends vertically.
    pub rotation: f64,
}

impl Default for BendParameters {
    fn default() -> Self {
        Self {
            upper: ControlCurve::default(),
            lower: ControlCurve::default(),
            curve_type: CurveType::Smooth,
            smoothing: true,
            antialias: true,
            work_on_copy: false,
            rotation: 0.0,
        }
    }
}

impl BendParameters {
    /// The curve of one outline.
    pub fn curve(&self, outline: Outline) -> &ControlCurve {
        match outline {
            Outline::Upper => &self.upper,
            Outline::Lower => &self.lower,
        }
    }

    /// The curve of one outline, mutably.
    pub fn curve_mut(&mut self, outline: Outline) -> &mut ControlCurve {
        match outline {
            Outline::Upper => &mut self.upper,
            Outline::Lower => &mut self.lower,
        }
    }
}

/// serde has no impls for arrays longer than 32, samples travel as a sequence.
mod samples_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::CURVE_SAMPLES;

    pub fn serialize<S: Serializer>(
        samples: &[u8; CURVE_SAMPLES],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(samples.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u8; CURVE_SAMPLES], D::Error> {
        let samples = Vec::<u8>::deserialize(deserializer)?;
        let len = samples.len();
        samples
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"256 samples"))
    }
}
