//! Text files holding the control points and freehand samples of both outlines.
//!
//! ```text
//! POINTFILE_CURVE_BEND
//! VERSION 1.0
//!
//! POINTS +0.000000  +0.500000   +0.000000  +0.500000
//! ...
//! VAL_Y 127  127
//! ...
//! ```
//!
//! Lines are recognised by their leading keyword; everything else is ignored. Unused control
//! points are written as `-1`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::curve::{BendParameters, ControlPoint, Outline, CURVE_SAMPLES, MAX_POINTS};

/// First line of every point file.
pub const POINTFILE_KEY: &str = "POINTFILE_CURVE_BEND";
const POINTS_KEY: &str = "POINTS";
const VAL_Y_KEY: &str = "VAL_Y";

/// An error type for point files.
#[derive(thiserror::Error, Debug)]
pub enum PointFileError {
    /// The file could not be opened, read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file is empty.
    #[error("Point file is empty")]
    Empty,

    /// The first line is not the point file header.
    #[error("Not a point file, expected the first line to start with {POINTFILE_KEY}")]
    MissingHeader,
}

/// The records of a point file, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointFile {
    /// `[upper_x, upper_y, lower_x, lower_y]` per control point slot, `-1` marks unused.
    pub points: Vec<[f64; 4]>,
    /// `(upper, lower)` freehand sample per column.
    pub samples: Vec<(u8, u8)>,
}

fn to_sentinel(point: Option<ControlPoint>) -> [f64; 2] {
    point.map_or([-1.0, -1.0], |(x, y)| [x, y])
}

fn from_sentinel(x: f64, y: f64) -> Option<ControlPoint> {
    (x != -1.0).then_some((x, y))
}

/// Parse the first `N` whitespace separated tokens of `rest`.
fn parse_fields<T: std::str::FromStr, const N: usize>(rest: &str) -> Option<[T; N]> {
    let values: Vec<T> = rest
        .split_whitespace()
        .take(N)
        .map_while(|token| token.parse().ok())
        .collect();
    values.try_into().ok()
}

impl PointFile {
    /// All 17 point slots and 256 samples of both outlines.
    pub fn from_parameters(params: &BendParameters) -> Self {
        let points = (0..MAX_POINTS)
            .map(|i| {
                let [ux, uy] = to_sentinel(params.upper.points.get(i));
                let [lx, ly] = to_sentinel(params.lower.points.get(i));
                [ux, uy, lx, ly]
            })
            .collect();
        let samples = params
            .upper
            .samples
            .iter()
            .zip(params.lower.samples.iter())
            .map(|(&u, &l)| (u, l))
            .collect();
        Self { points, samples }
    }

    /// Overwrite point slots and samples from index `0` with the loaded records.
    ///
    /// Slots and samples beyond the loaded records keep their values.
    pub fn apply_to(&self, params: &mut BendParameters) {
        for (i, &[ux, uy, lx, ly]) in self.points.iter().enumerate().take(MAX_POINTS) {
            params.upper.points.set(i, from_sentinel(ux, uy));
            params.lower.points.set(i, from_sentinel(lx, ly));
        }
        for (i, &(u, l)) in self.samples.iter().enumerate().take(CURVE_SAMPLES) {
            params.curve_mut(Outline::Upper).samples[i] = u;
            params.curve_mut(Outline::Lower).samples[i] = l;
        }
    }

    /// Write the file contents.
    pub fn write_to<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "{POINTFILE_KEY}")?;
        writeln!(w, "VERSION 1.0")?;
        writeln!(w)?;
        writeln!(w, "# points for upper and lower smooth curve (0.0 <= pt <= 1.0)")?;
        writeln!(w, "# there are up to 17 points where unused points are set to -1")?;
        writeln!(w, "#       UPPERX     UPPERY      LOWERX    LOWERY")?;
        writeln!(w)?;
        for [ux, uy, lx, ly] in &self.points {
            writeln!(w, "{POINTS_KEY} {ux:+.6}  {uy:+.6}   {lx:+.6}  {ly:+.6}")?;
        }
        writeln!(w)?;
        writeln!(w, "# y values for upper/lower freehand curve (0 <= y <= 255)")?;
        writeln!(w, "# there must be exactly 256 y values")?;
        writeln!(w, "#     UPPER_Y  LOWER_Y")?;
        writeln!(w)?;
        for (u, l) in &self.samples {
            writeln!(w, "{VAL_Y_KEY} {u:3}  {l:3}")?;
        }
        Ok(())
    }

    /// Save to `path`, replacing an existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PointFileError> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Parse point file records from a reader.
    ///
    /// Malformed and surplus records are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Fails on read errors, on an empty input and when the header is missing.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, PointFileError> {
        let mut lines = reader.lines();
        let header = lines.next().ok_or(PointFileError::Empty)??;
        if !header.starts_with(POINTFILE_KEY) {
            return Err(PointFileError::MissingHeader);
        }

        let mut file = PointFile::default();
        for line in lines {
            let line = line?;
            if let Some(rest) = line.strip_prefix(POINTS_KEY) {
                match parse_fields::<f64, 4>(rest) {
                    Some(point) if file.points.len() < MAX_POINTS => file.points.push(point),
                    _ => log::warn!("bad points[{}] are ignored: {line}", file.points.len()),
                }
            } else if let Some(rest) = line.strip_prefix(VAL_Y_KEY) {
                let sample = parse_fields::<i32, 2>(rest).and_then(|[u, l]| {
                    Some((u8::try_from(u).ok()?, u8::try_from(l).ok()?))
                });
                match sample {
                    Some(sample) if file.samples.len() < CURVE_SAMPLES => {
                        file.samples.push(sample)
                    }
                    _ => log::warn!("bad y_vals[{}] are ignored: {line}", file.samples.len()),
                }
            }
        }

        Ok(file)
    }

    /// Load from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PointFileError> {
        let path = path.as_ref();
        let file = Self::read_from(BufReader::new(File::open(path)?))?;
        log::debug!(
            "loaded {} points and {} samples from {}",
            file.points.len(),
            file.samples.len(),
            path.display()
        );
        Ok(file)
    }
}
