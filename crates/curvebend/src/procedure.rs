//! Entry points of the curve bend procedure and its iteration helper.

use crate::bend::main_bend;
use crate::curve::{
    BendParameters, ControlPoints, CurveType, Outline, CURVE_SAMPLES, MAX_POINTS, MIDDLE,
};
use crate::document::{Document, Drawable, DrawableId};
use crate::error::BendError;
use crate::iteration::{interpolate_iteration, Iteration, IterationState};
use crate::progress::Progress;
use crate::session::BendSession;
use crate::store::{ParameterStore, StoredValues, ITER_FROM_KEY, ITER_TO_KEY, PROCEDURE_KEY};

/// Parameters of a non-interactive call, in their wire shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BendArgs {
    /// Bend direction in degrees, `[0, 360)`.
    pub rotation: f64,
    /// Smoothing switch.
    pub smoothing: bool,
    /// Antialiasing switch.
    pub antialias: bool,
    /// Write into a new layer.
    pub work_on_copy: bool,
    /// `0` smooth, `1` freehand.
    pub curve_type: i32,
    /// X coordinates of the upper control points, `-1` for unused slots.
    pub upper_point_x: Vec<f64>,
    /// Y coordinates of the upper control points.
    pub upper_point_y: Vec<f64>,
    /// X coordinates of the lower control points, `-1` for unused slots.
    pub lower_point_x: Vec<f64>,
    /// Y coordinates of the lower control points.
    pub lower_point_y: Vec<f64>,
    /// Freehand samples of the upper outline.
    pub upper_val_y: Vec<u8>,
    /// Freehand samples of the lower outline.
    pub lower_val_y: Vec<u8>,
}

fn copy_points(xs: &[f64], ys: &[f64], name: &str) -> Result<ControlPoints, BendError> {
    if xs.len() != ys.len() {
        return Err(BendError::InvalidArgument(format!(
            "{name}: {} x values but {} y values",
            xs.len(),
            ys.len()
        )));
    }
    if !(2..=MAX_POINTS).contains(&xs.len()) {
        return Err(BendError::InvalidArgument(format!(
            "{name}: expected 2 to {MAX_POINTS} points, got {}",
            xs.len()
        )));
    }

    let mut raw = [[-1.0; 2]; MAX_POINTS];
    for (slot, (&x, &y)) in raw.iter_mut().zip(xs.iter().zip(ys)) {
        *slot = [x, y];
    }
    Ok(ControlPoints::from_sentinel(&raw))
}

fn copy_samples(values: &[u8], name: &str) -> Result<[u8; CURVE_SAMPLES], BendError> {
    if values.len() > CURVE_SAMPLES {
        return Err(BendError::InvalidArgument(format!(
            "{name}: at most {CURVE_SAMPLES} values, got {}",
            values.len()
        )));
    }
    let fill = values.last().copied().unwrap_or(MIDDLE);
    let mut samples = [fill; CURVE_SAMPLES];
    samples[..values.len()].copy_from_slice(values);
    Ok(samples)
}

impl BendArgs {
    /// Validate the arguments and build the parameter set.
    ///
    /// # Errors
    ///
    /// [`BendError::InvalidArgument`] for a rotation outside `[0, 360)`, point arrays of
    /// unequal or invalid length and sample arrays longer than 256.
    pub fn to_parameters(&self) -> Result<BendParameters, BendError> {
        if !(0.0..360.0).contains(&self.rotation) {
            return Err(BendError::InvalidArgument(format!(
                "rotation {} outside [0, 360)",
                self.rotation
            )));
        }

        let mut params = BendParameters {
            curve_type: CurveType::from_code(self.curve_type),
            smoothing: self.smoothing,
            antialias: self.antialias,
            work_on_copy: self.work_on_copy,
            rotation: self.rotation,
            ..Default::default()
        };
        params.upper.points = copy_points(&self.upper_point_x, &self.upper_point_y, "upper")?;
        params.lower.points = copy_points(&self.lower_point_x, &self.lower_point_y, "lower")?;
        params.curve_mut(Outline::Upper).samples = copy_samples(&self.upper_val_y, "upper")?;
        params.curve_mut(Outline::Lower).samples = copy_samples(&self.lower_val_y, "lower")?;
        Ok(params)
    }
}

/// How the procedure obtains its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    /// Ask the user through a [`BendDialog`].
    Interactive,
    /// Take the given arguments.
    NonInteractive(BendArgs),
    /// Repeat the last stored parameters, or an animated step of them.
    WithLastValues,
}

/// How the user closed the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResponse {
    /// Bend with the edited parameters.
    Ok,
    /// Leave the document alone.
    Cancel,
}

/// The interactive front end of the procedure.
pub trait BendDialog {
    /// Let the user edit `session` and report how the dialog was closed.
    fn run(&mut self, session: &mut BendSession) -> DialogResponse;
}

/// A dialog that confirms the parameters it is given, for hosts without a user interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptDialog;

impl BendDialog for AcceptDialog {
    fn run(&mut self, _session: &mut BendSession) -> DialogResponse {
        DialogResponse::Ok
    }
}

/// Result of a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BendOutcome {
    /// The layer that holds the bent pixels.
    Bent(DrawableId),
    /// The user cancelled the dialog.
    Cancelled,
}

fn retrieve_last_values(
    store: &ParameterStore,
) -> Result<(BendParameters, Option<Iteration>), BendError> {
    let Some(values) = store.retrieve_values(PROCEDURE_KEY)? else {
        return Ok((BendParameters::default(), None));
    };

    let mut params = values.parameters();
    let state = values.iteration_state();
    if !state.is_active() {
        return Ok((params, None));
    }

    let from = store
        .retrieve_values(ITER_FROM_KEY)?
        .ok_or(BendError::MissingIterationData(ITER_FROM_KEY))?;
    let to = store
        .retrieve_values(ITER_TO_KEY)?
        .ok_or(BendError::MissingIterationData(ITER_TO_KEY))?;

    // an animated step always bends the frame itself
    params.work_on_copy = false;
    let iteration = Iteration {
        from: from.parameters(),
        to: to.parameters(),
        state,
    };
    Ok((params, Some(iteration)))
}

/// Run the curve bend procedure on `drawable`.
///
/// Layers with a mask and channels are rejected. A selection is floated into a new layer
/// first, which then becomes the target. Interactive runs store their final parameters as the
/// last values.
///
/// # Errors
///
/// Any [`BendError`]; use [`BendError::kind`] to tell calling errors from execution errors.
pub fn run_curve_bend(
    document: &mut Document,
    store: &mut ParameterStore,
    drawable: DrawableId,
    mode: RunMode,
    dialog: &mut dyn BendDialog,
    progress: &mut dyn Progress,
) -> Result<BendOutcome, BendError> {
    match document.get(drawable) {
        None => return Err(BendError::UnknownDrawable(drawable)),
        Some(Drawable::Channel(_)) => return Err(BendError::NotALayer(drawable)),
        Some(Drawable::Layer(layer)) if layer.has_mask => {
            return Err(BendError::LayerHasMask(drawable))
        }
        Some(Drawable::Layer(_)) => {}
    }

    // arguments and stored records are checked before the document is touched
    let interactive = mode == RunMode::Interactive;
    let (mut params, iteration) = match &mode {
        RunMode::Interactive => (retrieve_last_values(store)?.0, None),
        RunMode::NonInteractive(args) => (args.to_parameters()?, None),
        RunMode::WithLastValues => retrieve_last_values(store)?,
    };

    let target = document.float_selection(drawable)?;
    log::debug!("curve bend on {target} ({mode:?})");

    if interactive {
        let layer = document
            .layer(target)
            .ok_or(BendError::UnknownDrawable(target))?;
        let mut session =
            BendSession::new(params).with_preview_source(&layer.pixels, document.base())?;

        if dialog.run(&mut session) == DialogResponse::Cancel {
            if target != drawable {
                document.remove(target);
            }
            log::debug!("curve bend cancelled");
            return Ok(BendOutcome::Cancelled);
        }
        params = session.into_parameters();
    }

    let bent = main_bend(document, target, &params, iteration.as_ref(), progress)?;

    if interactive {
        store.store_values(
            PROCEDURE_KEY,
            &StoredValues::new(&params, IterationState::default()),
        )?;
    }

    Ok(BendOutcome::Bent(bent))
}

/// Prepare the last values of the bend procedure for one step of an animated run.
///
/// Reads the "from" and "to" records, interpolates the rotation for `current_step` of
/// `total_steps` and stores the result, with the step recorded, as the last values. A
/// following [`RunMode::WithLastValues`] run then blends the curves of both records.
///
/// # Errors
///
/// [`BendError::IterationSizeMismatch`] when `len_struct` is not the size of the stored
/// record, [`BendError::MissingIterationData`] when a record is missing.
pub fn run_iterator(
    store: &mut ParameterStore,
    total_steps: i32,
    current_step: f64,
    len_struct: usize,
) -> Result<(), BendError> {
    if len_struct != StoredValues::ENCODED_LEN {
        return Err(BendError::IterationSizeMismatch {
            expected: StoredValues::ENCODED_LEN,
            actual: len_struct,
        });
    }

    let from = store
        .retrieve_values(ITER_FROM_KEY)?
        .ok_or(BendError::MissingIterationData(ITER_FROM_KEY))?;
    let to = store
        .retrieve_values(ITER_TO_KEY)?
        .ok_or(BendError::MissingIterationData(ITER_TO_KEY))?;

    let mut values = from;
    interpolate_iteration(
        &mut values.rotation,
        from.rotation,
        to.rotation,
        total_steps,
        current_step,
    );
    let state = IterationState::new(total_steps, current_step);
    values.total_steps = state.total_steps;
    values.current_step = state.current_step;

    log::debug!(
        "iteration step {current_step} of {total_steps}, rotation {}",
        values.rotation
    );
    store.store_values(PROCEDURE_KEY, &values)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Channel, Layer, Rect};
    use crate::error::ErrorKind;
    use crate::progress::NoProgress;
    use curvebend_image::Image;

    struct CancelDialog;

    impl BendDialog for CancelDialog {
        fn run(&mut self, _session: &mut BendSession) -> DialogResponse {
            DialogResponse::Cancel
        }
    }

    /// Drags the middle of the upper outline to the top of the graph.
    struct BulgeDialog;

    impl BendDialog for BulgeDialog {
        fn run(&mut self, session: &mut BendSession) -> DialogResponse {
            session.press(128, 0);
            session.release().ok();
            DialogResponse::Ok
        }
    }

    fn flat_args() -> BendArgs {
        BendArgs {
            upper_point_x: vec![0.0, 1.0],
            upper_point_y: vec![0.5, 0.5],
            lower_point_x: vec![0.0, 1.0],
            lower_point_y: vec![0.5, 0.5],
            smoothing: true,
            antialias: true,
            ..Default::default()
        }
    }

    fn document() -> (Document, DrawableId) {
        let mut doc = Document::default();
        let pixels = Image::from_size_pixel([33, 16].into(), [10, 200, 30, 255]);
        let id = doc.add_layer(Layer::new("bg", pixels));
        (doc, id)
    }

    #[test]
    fn args_build_parameters() -> Result<(), BendError> {
        let mut args = flat_args();
        args.upper_point_x = vec![0.0, -1.0, 1.0];
        args.upper_point_y = vec![0.2, 0.9, 0.8];
        args.upper_val_y = vec![1, 2];
        args.curve_type = 1;
        let params = args.to_parameters()?;

        assert_eq!(params.curve_type, CurveType::Freehand);
        assert_eq!(params.upper.points.defined(), vec![(0.0, 0.2), (1.0, 0.8)]);
        assert_eq!(params.upper.points.get(3), None);
        assert_eq!(params.upper.samples[1], 2);
        assert_eq!(params.upper.samples[255], 2);
        assert_eq!(params.lower.samples[0], MIDDLE);
        Ok(())
    }

    #[test]
    fn bad_args_are_calling_errors() {
        let cases = [
            BendArgs {
                rotation: 360.0,
                ..flat_args()
            },
            BendArgs {
                upper_point_y: vec![0.5],
                ..flat_args()
            },
            BendArgs {
                lower_point_x: vec![0.0],
                lower_point_y: vec![0.5],
                ..flat_args()
            },
            BendArgs {
                upper_point_x: vec![0.0; 18],
                upper_point_y: vec![0.5; 18],
                ..flat_args()
            },
            BendArgs {
                lower_val_y: vec![0; 257],
                ..flat_args()
            },
        ];
        for args in cases {
            let err = args.to_parameters().err();
            assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Calling), "{args:?}");
        }
    }

    #[test]
    fn validation_errors() -> Result<(), BendError> {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();
        let channel = doc.add_channel(Channel {
            name: "c".into(),
            pixels: Image::from_size_val([2, 2].into(), 0)?,
        });
        let mut masked = Layer::new("m", Image::from_size_pixel([2, 2].into(), [0; 4]));
        masked.has_mask = true;
        let masked = doc.add_layer(masked);

        let mut run = |doc: &mut Document, target| {
            run_curve_bend(
                doc,
                &mut store,
                target,
                RunMode::WithLastValues,
                &mut AcceptDialog,
                &mut NoProgress,
            )
        };
        assert!(matches!(
            run(&mut doc, DrawableId(99)),
            Err(BendError::UnknownDrawable(_))
        ));
        assert!(matches!(
            run(&mut doc, channel),
            Err(BendError::NotALayer(_))
        ));
        assert!(matches!(
            run(&mut doc, masked),
            Err(BendError::LayerHasMask(_))
        ));

        doc.select(Rect {
            x: 100,
            y: 100,
            width: 5,
            height: 5,
        });
        let err = run(&mut doc, id).err();
        assert!(matches!(err, Some(BendError::EmptySelection)));
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Execution));
        Ok(())
    }

    #[test]
    fn non_interactive_bend() -> Result<(), BendError> {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();
        let args = BendArgs {
            work_on_copy: true,
            upper_point_x: vec![0.0, 0.5, 1.0],
            upper_point_y: vec![0.5, 0.8, 0.5],
            ..flat_args()
        };

        let outcome = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::NonInteractive(args),
            &mut CancelDialog,
            &mut NoProgress,
        )?;
        let BendOutcome::Bent(out) = outcome else {
            panic!("expected a bent layer, got {outcome:?}");
        };
        assert_ne!(out, id);
        assert!(doc.layer(out).map(|l| l.pixels.height()) > Some(16));
        // non-interactive runs leave the last values alone
        assert_eq!(store.get_data(PROCEDURE_KEY), None);
        Ok(())
    }

    #[test]
    fn interactive_cancel_and_store() -> Result<(), BendError> {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();

        let cancelled = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::Interactive,
            &mut CancelDialog,
            &mut NoProgress,
        )?;
        assert_eq!(cancelled, BendOutcome::Cancelled);
        assert_eq!(doc.layer(id).map(|l| l.pixels.height()), Some(16));

        let bent = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::Interactive,
            &mut BulgeDialog,
            &mut NoProgress,
        )?;
        assert_eq!(bent, BendOutcome::Bent(id));
        assert!(doc.layer(id).map(|l| l.pixels.height()) > Some(16));

        let stored = store
            .retrieve_values(PROCEDURE_KEY)?
            .ok_or(BendError::MissingIterationData(PROCEDURE_KEY))?;
        assert_eq!(stored.total_steps, 0);
        assert!(stored.parameters().upper.points.get(8).is_some());
        Ok(())
    }

    fn selected(doc: &mut Document) {
        doc.select(Rect {
            x: 4,
            y: 4,
            width: 10,
            height: 6,
        });
    }

    #[test]
    fn cancel_leaves_no_floating_layer() -> Result<(), BendError> {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();
        selected(&mut doc);

        let outcome = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::Interactive,
            &mut CancelDialog,
            &mut NoProgress,
        )?;
        assert_eq!(outcome, BendOutcome::Cancelled);
        assert_eq!(doc.layer_ids(), vec![id]);
        Ok(())
    }

    #[test]
    fn bad_args_fail_before_floating() {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();
        selected(&mut doc);

        let args = BendArgs {
            rotation: 400.0,
            ..flat_args()
        };
        let err = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::NonInteractive(args),
            &mut AcceptDialog,
            &mut NoProgress,
        )
        .err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Calling));
        assert_eq!(doc.layer_ids(), vec![id]);
    }

    #[test]
    fn missing_iteration_records_fail_before_floating() -> Result<(), BendError> {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();
        store.store_values(
            PROCEDURE_KEY,
            &StoredValues::new(&BendParameters::default(), IterationState::new(3, 1.0)),
        )?;
        selected(&mut doc);

        let result = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::WithLastValues,
            &mut AcceptDialog,
            &mut NoProgress,
        );
        assert!(matches!(result, Err(BendError::MissingIterationData(_))));
        assert_eq!(doc.layer_ids(), vec![id]);
        Ok(())
    }

    #[test]
    fn selection_is_floated_and_bent() -> Result<(), BendError> {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();
        selected(&mut doc);

        let outcome = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::NonInteractive(flat_args()),
            &mut AcceptDialog,
            &mut NoProgress,
        )?;
        let BendOutcome::Bent(floated) = outcome else {
            panic!("expected a bent layer, got {outcome:?}");
        };
        assert_ne!(floated, id);
        assert_eq!(doc.layer_ids().len(), 2);
        Ok(())
    }

    #[test]
    fn iterator_prepares_last_values() -> Result<(), BendError> {
        let mut store = ParameterStore::new();
        let from = BendParameters {
            rotation: 10.0,
            work_on_copy: true,
            ..Default::default()
        };
        let to = BendParameters {
            rotation: 50.0,
            ..from
        };
        store.store_values(ITER_FROM_KEY, &StoredValues::new(&from, IterationState::default()))?;
        store.store_values(ITER_TO_KEY, &StoredValues::new(&to, IterationState::default()))?;

        let err = run_iterator(&mut store, 4, 1.0, 12).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Calling));

        run_iterator(&mut store, 4, 1.0, StoredValues::ENCODED_LEN)?;
        let last = store
            .retrieve_values(PROCEDURE_KEY)?
            .ok_or(BendError::MissingIterationData(PROCEDURE_KEY))?;
        assert_eq!(last.rotation, 20.0);
        assert_eq!(last.iteration_state(), IterationState::new(4, 1.0));

        let (params, iteration) = retrieve_last_values(&store)?;
        assert!(!params.work_on_copy);
        assert_eq!(iteration.map(|it| it.to.rotation), Some(50.0));
        Ok(())
    }

    #[test]
    fn iteration_without_records_fails() -> Result<(), BendError> {
        let (mut doc, id) = document();
        let mut store = ParameterStore::new();
        store.store_values(
            PROCEDURE_KEY,
            &StoredValues::new(&BendParameters::default(), IterationState::new(3, 1.0)),
        )?;
        let result = run_curve_bend(
            &mut doc,
            &mut store,
            id,
            RunMode::WithLastValues,
            &mut AcceptDialog,
            &mut NoProgress,
        );
        assert!(matches!(result, Err(BendError::MissingIterationData(_))));

        assert!(matches!(
            run_iterator(&mut store, 3, 1.0, StoredValues::ENCODED_LEN),
            Err(BendError::MissingIterationData(ITER_FROM_KEY))
        ));
        Ok(())
    }
}
