use crate::curve::CURVE_SAMPLES;

/// Rescale a 256 sample freehand curve to `xmax + 1` columns with values in `[0, ymax]`.
///
/// Column `x1` reads sample `x1 * 255 / xmax`. Up to 255 columns the sample is scaled
/// directly; wider targets interpolate linearly between neighbouring samples.
///
/// # Example
///
/// ```
/// use curvebend::stretch::stretch;
///
/// let samples = [127u8; 256];
/// let curve = stretch(&samples, 510, 510);
///
/// assert_eq!(curve.len(), 511);
/// assert!(curve.iter().all(|&v| v == 254));
/// ```
pub fn stretch(samples: &[u8; CURVE_SAMPLES], xmax: usize, ymax: i32) -> Vec<i32> {
    if xmax == 0 {
        return vec![0];
    }

    let last = CURVE_SAMPLES - 1;
    (0..=xmax)
        .map(|x1| {
            let x2 = x1 * last / xmax;
            let ya = samples[x2] as i32;

            if xmax <= last && x2 < last {
                return ((ya * ymax) as f64 / last as f64).round() as i32;
            }

            // the last column has no right neighbour to blend with
            let yb = samples.get(x2 + 1).map_or(ya, |&s| s as i32);
            let rest = (x1 as f64 * last as f64) / xmax as f64 - x2 as f64;
            let y = ya as f64 + (yb - ya) as f64 * rest;
            ((y * ymax as f64) / last as f64).round() as i32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::stretch;
    use crate::curve::CURVE_SAMPLES;

    fn ramp() -> [u8; CURVE_SAMPLES] {
        let mut samples = [0u8; CURVE_SAMPLES];
        samples.iter_mut().enumerate().for_each(|(i, s)| *s = i as u8);
        samples
    }

    #[test]
    fn native_resolution_is_identity() {
        let mut samples = ramp();
        samples[17] = 250;
        samples[200] = 3;
        let curve = stretch(&samples, 255, 255);
        let expected: Vec<i32> = samples.iter().map(|&s| s as i32).collect();
        assert_eq!(curve, expected);
    }

    #[test]
    fn downscale_picks_samples() {
        let curve = stretch(&ramp(), 5, 255);
        assert_eq!(curve, vec![0, 51, 102, 153, 204, 255]);
    }

    #[test]
    fn upscale_interpolates() {
        let curve = stretch(&ramp(), 510, 510);
        assert_eq!(curve.len(), 511);
        assert_eq!(curve[0], 0);
        assert_eq!(curve[1], 1);
        assert_eq!(curve[2], 2);
        assert_eq!(curve[510], 510);
    }

    #[test]
    fn degenerate_width() {
        assert_eq!(stretch(&ramp(), 0, 0), vec![0]);
    }

    #[test]
    fn direct_columns_round_like_the_last_column() {
        let samples = [127u8; CURVE_SAMPLES];
        for xmax in [2, 10, 30, 100, 254] {
            let curve = stretch(&samples, xmax, xmax as i32);
            let expected = (127.0 * xmax as f64 / 255.0).round() as i32;
            assert!(curve.iter().all(|&v| v == expected), "xmax {xmax}: {curve:?}");
        }
    }

    #[test]
    fn values_scale_with_ymax() {
        let samples = [255u8; CURVE_SAMPLES];
        let curve = stretch(&samples, 10, 40);
        assert!(curve.iter().all(|&v| v == 40));
    }
}
