use clap::Parser;
use image::DynamicImage;
use std::path::PathBuf;

use curvebend::curve::{BendParameters, ControlCurve, ControlPoints, CurveType};
use curvebend::document::{Document, ImageBase, Layer};
use curvebend::image::{Image, ImageSize};
use curvebend::pointfile::PointFile;
use curvebend::procedure::AcceptDialog;
use curvebend::progress::LogProgress;
use curvebend::store::ParameterStore;
use curvebend::{run_curve_bend, BendArgs, BendOutcome, RunMode};

#[derive(Parser)]
#[command(about = "Bend an image along the outlines of a point file")]
struct Args {
    /// path to the input image
    #[arg(short, long)]
    input: PathBuf,

    /// path of the bent PNG to write
    #[arg(short, long)]
    output: PathBuf,

    /// point file holding the upper and lower outlines
    #[arg(short, long)]
    points: Option<PathBuf>,

    /// rotation in degrees applied before bending
    #[arg(short, long, default_value_t = 0.0)]
    rotation: f64,

    /// use nearest neighbour sampling for the rotation
    #[arg(long)]
    no_smoothing: bool,

    /// disable the antialiasing of bent edges
    #[arg(long)]
    no_antialias: bool,

    /// treat the outlines of the point file as freehand samples
    #[arg(long)]
    freehand: bool,
}

fn to_args(params: &BendParameters) -> BendArgs {
    let split = |curve: &ControlCurve| -> (Vec<f64>, Vec<f64>) {
        curve.points.defined().into_iter().unzip()
    };
    let (upper_point_x, upper_point_y) = split(&params.upper);
    let (lower_point_x, lower_point_y) = split(&params.lower);
    BendArgs {
        rotation: params.rotation,
        smoothing: params.smoothing,
        antialias: params.antialias,
        work_on_copy: false,
        curve_type: params.curve_type.code(),
        upper_point_x,
        upper_point_y,
        lower_point_x,
        lower_point_y,
        upper_val_y: params.upper.samples.to_vec(),
        lower_val_y: params.lower.samples.to_vec(),
    }
}

/// Apply a point file on top of the default outlines.
///
/// Files may list fewer than 17 slots; when they carry at least two `POINTS` records the
/// default anchors are dropped so only the listed points shape the outlines. Files with only
/// freehand samples keep the default anchors.
fn apply_point_file(file: &PointFile, params: &mut BendParameters) {
    if file.points.len() >= 2 {
        params.upper.points = ControlPoints::empty();
        params.lower.points = ControlPoints::empty();
    }
    file.apply_to(params);
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let decoded = image::open(&args.input)?;
    let size = ImageSize {
        width: decoded.width() as usize,
        height: decoded.height() as usize,
    };
    log::info!("loaded {} ({}x{})", args.input.display(), size.width, size.height);

    let mut params = BendParameters {
        rotation: args.rotation,
        smoothing: !args.no_smoothing,
        antialias: !args.no_antialias,
        ..Default::default()
    };
    if args.freehand {
        params.curve_type = CurveType::Freehand;
    }
    if let Some(path) = &args.points {
        apply_point_file(&PointFile::load(path)?, &mut params);
        log::info!("applied outlines from {}", path.display());
    }

    let (base, layer) = match decoded {
        DynamicImage::ImageLuma8(gray) => (
            ImageBase::Gray,
            Layer::from_gray("input", &Image::new(size, gray.into_raw())?)?,
        ),
        DynamicImage::ImageLumaA8(gray) => (
            ImageBase::Gray,
            Layer::from_gray_alpha("input", &Image::new(size, gray.into_raw())?)?,
        ),
        DynamicImage::ImageRgb8(rgb) => (
            ImageBase::Rgb,
            Layer::from_rgb("input", &Image::new(size, rgb.into_raw())?)?,
        ),
        other => (
            ImageBase::Rgb,
            Layer::new("input", Image::new(size, other.into_rgba8().into_raw())?),
        ),
    };
    let mut document = Document::new(base);
    let id = document.add_layer(layer);
    let mut store = ParameterStore::new();

    let outcome = run_curve_bend(
        &mut document,
        &mut store,
        id,
        RunMode::NonInteractive(to_args(&params)),
        &mut AcceptDialog,
        &mut LogProgress::default(),
    )?;
    let BendOutcome::Bent(bent) = outcome else {
        anyhow::bail!("the bend was cancelled");
    };

    let layer = document
        .layer(bent)
        .ok_or_else(|| anyhow::anyhow!("bent layer {bent} is missing"))?;
    let out = image::RgbaImage::from_raw(
        layer.pixels.width() as u32,
        layer.pixels.height() as u32,
        layer.pixels.as_slice().to_vec(),
    )
    .ok_or_else(|| anyhow::anyhow!("bent buffer does not match its size"))?;
    out.save(&args.output)?;
    log::info!(
        "wrote {} ({}x{})",
        args.output.display(),
        layer.pixels.width(),
        layer.pixels.height()
    );

    Ok(())
}
