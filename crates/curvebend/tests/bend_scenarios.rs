use curvebend::bend::bend_image;
use curvebend::curve::BendParameters;
use curvebend::document::{Document, Layer};
use curvebend::geometry::GeometryState;
use curvebend::image::{ops::rgb_to_rgba, Image, ImageSize};
use curvebend::iteration::IterationState;
use curvebend::pointfile::PointFile;
use curvebend::procedure::AcceptDialog;
use curvebend::progress::NoProgress;
use curvebend::store::{ParameterStore, StoredValues, ITER_FROM_KEY, ITER_TO_KEY};
use curvebend::{run_curve_bend, run_iterator, BendArgs, BendError, BendOutcome, RunMode};

fn gradient(width: usize, height: usize) -> Image<u8, 4> {
    let mut data = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8, 255]);
        }
    }
    Image::new(ImageSize { width, height }, data).expect("valid gradient")
}

fn bulge(amplitude: f64) -> BendParameters {
    let mut params = BendParameters {
        smoothing: false,
        antialias: false,
        ..Default::default()
    };
    params.upper.points.set(8, Some((0.5, 0.5 + amplitude)));
    params.lower.points.set(8, Some((0.5, 0.5 - amplitude)));
    params
}

fn opaque_rows(image: &Image<u8, 4>, x: usize) -> usize {
    (0..image.height())
        .filter(|&y| image.pixel(x as i64, y as i64).map(|p| p[3]) == Some(255))
        .count()
}

fn flat_args() -> BendArgs {
    BendArgs {
        smoothing: true,
        antialias: true,
        upper_point_x: vec![0.0, 1.0],
        upper_point_y: vec![0.5, 0.5],
        lower_point_x: vec![0.0, 1.0],
        lower_point_y: vec![0.5, 0.5],
        ..Default::default()
    }
}

#[test]
fn test_flat_bend_reproduces_input() -> Result<(), BendError> {
    let rgb = Image::<u8, 3>::new(
        [31, 12].into(),
        (0..31 * 12 * 3).map(|v| (v % 251) as u8).collect(),
    )?;
    let mut doc = Document::default();
    let id = doc.add_layer(Layer::from_rgb("flat", &rgb)?);
    let mut store = ParameterStore::new();

    let outcome = run_curve_bend(
        &mut doc,
        &mut store,
        id,
        RunMode::NonInteractive(flat_args()),
        &mut AcceptDialog,
        &mut NoProgress,
    )?;
    assert_eq!(outcome, BendOutcome::Bent(id));

    let layer = doc.layer(id).ok_or(BendError::UnknownDrawable(id))?;
    assert!(layer.has_alpha);
    assert_eq!(layer.offsets, (0, 0));
    assert_eq!(layer.pixels, rgb_to_rgba(&rgb)?);
    Ok(())
}

#[test]
fn test_symmetric_bulge_grows_canvas() -> Result<(), BendError> {
    let src = Image::from_size_pixel([101, 40].into(), [0, 0, 255, 255]);
    let out = bend_image(&src, false, &bulge(0.1), None, &mut NoProgress)?;

    // ten rows of growth on each side
    assert!((out.height() as i64 - 60).abs() <= 2, "{}", out.height());

    let heights: Vec<usize> = (0..out.width()).map(|x| opaque_rows(&out, x)).collect();
    let tallest = heights.iter().copied().max().unwrap_or(0);
    assert_eq!(heights[50], tallest);
    assert!((tallest as i64 - 60).abs() <= 2, "{tallest}");
    assert_eq!(heights[0], 40);
    assert_eq!(heights[100], 40);
    Ok(())
}

#[test]
fn test_destination_never_shrinks() {
    let height = 30;
    for peak in [0.0, 0.2, 0.5, 0.8, 1.0] {
        for valley in [0.0, 0.3, 0.7, 1.0] {
            let mut params = BendParameters::default();
            params.upper.points.set(4, Some((0.25, peak)));
            params.lower.points.set(12, Some((0.75, valley)));
            let curves = curvebend::bend::compute_curves(&params, None, 64);
            let geometry = GeometryState::from_curves(&curves);
            assert!(
                geometry.dst_height(height) >= height,
                "peak {peak} valley {valley}"
            );
        }
    }
}

#[test]
fn test_malformed_point_file_loads_valid_records() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("curve_bend.points");
    std::fs::write(
        &path,
        "POINTFILE_CURVE_BEND\n\
         VERSION 1.0\n\
         \n\
         # a comment\n\
         POINTS +0.000000  +0.500000   +0.000000  +0.500000\n\
         POINTS +0.100000  +0.200000   +0.300000\n\
         POINTS +0.500000  +0.700000   +0.500000  +0.300000\n\
         POINTS +1.000000  +0.500000   +1.000000  +0.500000\n\
         VAL_Y 200  10\n",
    )?;

    let file = PointFile::load(&path)?;
    assert_eq!(file.points.len(), 3);
    assert_eq!(file.samples, vec![(200, 10)]);

    let mut params = BendParameters {
        antialias: false,
        ..Default::default()
    };
    file.apply_to(&mut params);
    assert_eq!(params.upper.points.get(1), Some((0.5, 0.7)));
    assert_eq!(params.upper.samples[0], 200);

    let src = gradient(41, 20);
    let out = bend_image(&src, true, &params, None, &mut NoProgress)?;
    assert!(out.height() > src.height());
    Ok(())
}

#[test]
fn test_rotation_by_90_round_trips() -> Result<(), BendError> {
    // 21 rows become 21 columns, which keeps the flat outline on an exact pixel row
    let src = gradient(16, 21);
    let mut doc = Document::default();
    let id = doc.add_layer(Layer::new("rot", src.clone()).with_offsets(5, 7));
    let mut store = ParameterStore::new();

    let args = BendArgs {
        rotation: 90.0,
        work_on_copy: true,
        ..flat_args()
    };
    let outcome = run_curve_bend(
        &mut doc,
        &mut store,
        id,
        RunMode::NonInteractive(args),
        &mut AcceptDialog,
        &mut NoProgress,
    )?;
    let BendOutcome::Bent(copy) = outcome else {
        panic!("expected a bent layer, got {outcome:?}");
    };

    let layer = doc.layer(copy).ok_or(BendError::UnknownDrawable(copy))?;
    assert_eq!(layer.name, "rot_b");
    assert_eq!(layer.offsets, (5, 7));
    assert_eq!(layer.pixels, src);
    Ok(())
}

#[test]
fn test_iteration_bends_halfway() -> Result<(), BendError> {
    let mut store = ParameterStore::new();
    let flat = BendParameters {
        smoothing: false,
        antialias: false,
        ..Default::default()
    };
    store.store_values(
        ITER_FROM_KEY,
        &StoredValues::new(&flat, IterationState::default()),
    )?;
    store.store_values(
        ITER_TO_KEY,
        &StoredValues::new(&bulge(0.1), IterationState::default()),
    )?;
    run_iterator(&mut store, 2, 1.0, StoredValues::ENCODED_LEN)?;

    let mut doc = Document::default();
    let id = doc.add_layer(Layer::new(
        "frame",
        Image::from_size_pixel([101, 40].into(), [1, 2, 3, 255]),
    ));
    let outcome = run_curve_bend(
        &mut doc,
        &mut store,
        id,
        RunMode::WithLastValues,
        &mut AcceptDialog,
        &mut NoProgress,
    )?;
    assert_eq!(outcome, BendOutcome::Bent(id));

    let height = doc.layer(id).map_or(0, |l| l.pixels.height()) as i64;
    assert!((height - 50).abs() <= 2, "{height}");
    Ok(())
}
