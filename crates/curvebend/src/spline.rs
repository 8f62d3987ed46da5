//! Catmull-Rom spline evaluation by forward differencing.

use crate::curve::{ControlPoint, ControlPoints, CURVE_SAMPLES};

type CrMatrix = [[f64; 4]; 4];

const CR_BASIS: CrMatrix = [
    [-0.5, 1.5, -1.5, 0.5],
    [1.0, -2.5, 2.0, -0.5],
    [-0.5, 0.0, 0.5, 0.0],
    [0.0, 1.0, 0.0, 0.0],
];

fn compose(a: &CrMatrix, b: &CrMatrix) -> CrMatrix {
    let mut ab = [[0.0; 4]; 4];
    for (i, row) in ab.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j] + a[i][3] * b[3][j];
        }
    }
    ab
}

/// Plot the spline segment between `segment[1]` and `segment[2]`.
///
/// `segment[0]` and `segment[3]` are the outer neighbours; at the ends of a curve they repeat
/// the end point. The points are scaled by `xmax` and `ymax`, the segment is walked in
/// `4 * xmax` forward difference steps and `plot(x, y)` is called for the truncated start
/// point and then for every rounded point that differs from its predecessor. Both
/// coordinates are clamped into `[0, xmax] x [0, ymax]`.
pub fn plot_segment(
    segment: [ControlPoint; 4],
    xmax: i32,
    ymax: i32,
    mut plot: impl FnMut(usize, i32),
) {
    let mut geometry = [[0.0; 4]; 4];
    for (row, (px, py)) in geometry.iter_mut().zip(segment.iter()) {
        row[0] = px * xmax as f64;
        row[1] = py * ymax as f64;
    }

    let ntimes = 4 * xmax.max(0);
    let d = if ntimes > 0 { 1.0 / ntimes as f64 } else { 0.0 };
    let (d2, d3) = (d * d, d * d * d);

    // forward differencing deltas
    let tmp2: CrMatrix = [
        [0.0, 0.0, 0.0, 1.0],
        [d3, d2, d, 0.0],
        [6.0 * d3, 2.0 * d2, 0.0, 0.0],
        [6.0 * d3, 0.0, 0.0, 0.0],
    ];

    let tmp1 = compose(&CR_BASIS, &geometry);
    let deltas = compose(&tmp2, &tmp1);

    let (mut x, mut dx, mut dx2, dx3) = (deltas[0][0], deltas[1][0], deltas[2][0], deltas[3][0]);
    let (mut y, mut dy, mut dy2, dy3) = (deltas[0][1], deltas[1][1], deltas[2][1], deltas[3][1]);

    let mut lastx = x.clamp(0.0, xmax as f64) as i32;
    let mut lasty = y.clamp(0.0, ymax as f64) as i32;
    plot(lastx as usize, lasty);

    for _ in 0..ntimes {
        x += dx;
        dx += dx2;
        dx2 += dx3;

        y += dy;
        dy += dy2;
        dy2 += dy3;

        let newx = (x.round() as i32).clamp(0, xmax);
        let newy = (y.round() as i32).clamp(0, ymax);

        if lastx != newx || lasty != newy {
            plot(newx as usize, newy);
        }

        lastx = newx;
        lasty = newy;
    }
}

/// Walk every segment of the spline through the defined points.
fn plot_spline(points: &[ControlPoint], xmax: i32, ymax: i32, mut plot: impl FnMut(usize, i32)) {
    let n = points.len();
    for i in 0..n.saturating_sub(1) {
        let p1 = if i == 0 { points[i] } else { points[i - 1] };
        let p4 = if i == n - 2 { points[n - 1] } else { points[i + 2] };
        plot_segment([p1, points[i], points[i + 1], p4], xmax, ymax, &mut plot);
    }
}

/// Evaluate the spline into the 256 slot graph curve.
///
/// Columns left of the first point take the first point's value, columns from the last
/// point onwards take the last point's value, the rest is plotted. Without defined points
/// `samples` is left untouched.
pub fn graph_curve(points: &ControlPoints, samples: &mut [u8; CURVE_SAMPLES]) {
    let defined = points.defined();
    let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) = (defined.first(), defined.last())
    else {
        return;
    };

    let max = (CURVE_SAMPLES - 1) as f64;
    for (i, s) in samples.iter_mut().enumerate() {
        if (i as f64) < first_x * max {
            *s = (first_y * max) as u8;
        }
    }
    let start = ((last_x * max) as i64).max(0) as usize;
    for s in samples.iter_mut().skip(start) {
        *s = (last_y * max) as u8;
    }

    let xmax = (CURVE_SAMPLES - 1) as i32;
    plot_spline(&defined, xmax, xmax, |x, y| {
        if let Some(s) = samples.get_mut(x) {
            *s = y as u8;
        }
    });
}

/// Evaluate the spline at pixel resolution: `xmax + 1` columns with values in `[0, ymax]`.
///
/// The left half is pre-filled with the first point's value and the right half with the last
/// point's value before the segments are plotted over it. Without defined points the curve
/// is flat at zero.
pub fn pixel_curve(points: &ControlPoints, xmax: usize, ymax: i32) -> Vec<i32> {
    let mut curve = vec![0i32; xmax + 1];
    let defined = points.defined();
    let (Some(&(_, first_y)), Some(&(_, last_y))) = (defined.first(), defined.last()) else {
        return curve;
    };

    let yfirst = (first_y * ymax as f64) as i32;
    let ylast = (last_y * ymax as f64) as i32;
    let xmid = xmax / 2;
    curve[..xmid].fill(yfirst);
    curve[xmid..].fill(ylast);

    plot_spline(&defined, xmax as i32, ymax, |x, y| {
        if let Some(v) = curve.get_mut(x) {
            *v = y;
        }
    });

    curve
}
