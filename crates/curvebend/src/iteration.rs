use serde::{Deserialize, Serialize};

use crate::curve::BendParameters;

/// Progress of an animated run that bends every frame a little further.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IterationState {
    /// Number of steps between the "from" and the "to" parameters; `0` disables iteration.
    pub total_steps: i32,
    /// The current step, `0` yields "from" and `total_steps` yields "to".
    pub current_step: f64,
}

impl IterationState {
    /// Create a new iteration state.
    pub fn new(total_steps: i32, current_step: f64) -> Self {
        Self {
            total_steps,
            current_step,
        }
    }

    /// Whether a stored run asks for from/to interpolation.
    pub fn is_active(&self) -> bool {
        self.total_steps != 0
    }
}

/// The two parameter sets an animated run interpolates between.
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    /// Parameters at step `0`.
    pub from: BendParameters,
    /// Parameters at the last step.
    pub to: BendParameters,
    /// Where between them the current run sits.
    pub state: IterationState,
}

/// Values that can be linearly interpolated between two iteration endpoints.
pub trait Lerp: Copy {
    /// The value `t` of the way from `from` to `to`.
    fn lerp(from: Self, to: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(from: Self, to: Self, t: f64) -> Self {
        from + (to - from) * t
    }
}

impl Lerp for i32 {
    fn lerp(from: Self, to: Self, t: f64) -> Self {
        (from as f64 + (to - from) as f64 * t).round() as i32
    }
}

/// Interpolate `value` between `from` and `to` at `current_step` of `total_steps`.
///
/// With `total_steps < 1` the value is left unchanged.
///
/// # Example
///
/// ```
/// use curvebend::iteration::interpolate_iteration;
///
/// let mut rotation = 0.0;
/// interpolate_iteration(&mut rotation, 10.0, 50.0, 4, 1.0);
/// assert_eq!(rotation, 20.0);
/// ```
pub fn interpolate_iteration<T: Lerp>(
    value: &mut T,
    from: T,
    to: T,
    total_steps: i32,
    current_step: f64,
) {
    if total_steps < 1 {
        return;
    }
    *value = T::lerp(from, to, current_step / total_steps as f64);
}

/// Interpolate two expanded curves column by column into `curve`.
///
/// All three slices are expected to have the same length; extra columns are left alone.
pub fn interpolate_curves(curve: &mut [i32], from: &[i32], to: &[i32], state: IterationState) {
    for ((v, &f), &t) in curve.iter_mut().zip(from).zip(to) {
        interpolate_iteration(v, f, t, state.total_steps, state.current_step);
    }
}
