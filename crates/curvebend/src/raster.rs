//! The vertical bend rasterizer.
//!
//! Every source pixel is moved vertically by the displacement of its column and row. Columns
//! are walked left to right, rows top to bottom. Gaps between vertically neighbouring source
//! pixels that moved apart are filled, smoothing blends a column with its left neighbour where
//! the displacement changes, and antialiasing fades the top and bottom outline into
//! transparency. All writes outside the destination are clipped.

use curvebend_image::Image;

use crate::geometry::Displacement;
use crate::progress::Progress;

/// An RGBA pixel.
pub type Rgba = [u8; 4];

const ALPHA: usize = 3;

/// Switches of the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Blend with the left neighbour and interpolate gap colours.
    pub smoothing: bool,
    /// Fade the outline edges.
    pub antialias: bool,
    /// The source carries a real alpha channel.
    pub src_has_alpha: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Last {
    y: i32,
    color: Rgba,
}

fn mix_channel(a: u8, b: u8, mask: u8) -> u8 {
    let (a, b, m) = (a as u32, b as u32, mask as u32);
    ((a * m + b * (255 - m)) / 255) as u8
}

fn put_pixel(dst: &mut Image<u8, 4>, x: i64, y: i64, color: Rgba) {
    dst.set_pixel(x, y, color);
}

/// Write `color`, blended with the left neighbour when the displacement of this column
/// differs from one of the two columns before it.
fn put_mix_pixel(
    dst: &mut Image<u8, 4>,
    x: i64,
    y: i64,
    color: Rgba,
    nb_curvy: i32,
    nb2_curvy: i32,
    curvy: i32,
) {
    let mut mask = 255 - 96;
    if nb_curvy == curvy {
        mask = 255 - 48;
        if nb2_curvy == curvy {
            put_pixel(dst, x, y, color);
            return;
        }
    }

    let neighbour = dst.pixel(x - 1, y).unwrap_or_default();
    if neighbour[ALPHA] < 10 {
        put_pixel(dst, x, y, color);
        return;
    }

    let mut mixed = neighbour;
    for c in 0..ALPHA {
        mixed[c] = mix_channel(color[c], neighbour[c], mask);
    }
    mixed[ALPHA] = color[ALPHA];
    put_pixel(dst, x, y, mixed);
}

/// Colour of the `dy`-th of `diff` pixels between `last` (the pixel above in the source) and
/// `color`, weighted by alpha.
fn blend_gap(last: Rgba, color: Rgba, dy: i32, diff: i32, mix: &mut Rgba) {
    let a1 = last[ALPHA] as u64;
    let a2 = color[ALPHA] as u64;
    let m = (255.0 * (dy as f64 / (diff + 1) as f64)) as u64;

    let alpha = a1 * m + a2 * (255 - m);
    mix[ALPHA] = (alpha / 255) as u8;
    if mix[ALPHA] != 0 {
        for c in 0..ALPHA {
            mix[c] = ((a1 * m * last[c] as u64 + a2 * (255 - m) * color[c] as u64) / alpha) as u8;
        }
    }
}

/// Bend `src` into `dst`.
///
/// `dst` must be at least as wide as `src`; it is expected to be transparent and tall enough
/// for the displacement, anything beyond its bounds is dropped. `topshift` moves every row
/// down so that upward displacements stay inside the destination.
pub fn vertical_bend(
    src: &Image<u8, 4>,
    dst: &mut Image<u8, 4>,
    displacement: &Displacement,
    topshift: i32,
    options: RasterOptions,
    progress: &mut dyn Progress,
) {
    let (width, height) = (src.width(), src.height() as i32);
    let mut last_arr = vec![Last::default(); width];
    let mut first_arr = vec![Last::default(); width];

    // state carried from row to row like the neighbours of a scanline walker
    let (mut diff, mut miny, mut maxy) = (0i32, 0i32, 0i32);
    let (mut nb_curvy, mut nb2_curvy) = (0i32, 0i32);
    let mut alias_color: Rgba = [0; 4];

    progress.init("Curve Bend");

    for x in 0..width {
        let xi = x as i64;

        for y in 0..height {
            let color = src.pixel(xi, y as i64).unwrap_or_default();
            let curvy = displacement.dy(x, y);
            let desty = y + topshift + curvy;

            // copy the source pixel to its bent position
            if options.smoothing && x > 0 {
                nb_curvy = displacement.dy(x - 1, y);
                nb2_curvy = if nb_curvy == curvy && x > 1 {
                    displacement.dy(x - 2, y)
                } else {
                    nb_curvy
                };
                put_mix_pixel(dst, xi, desty as i64, color, nb_curvy, nb2_curvy, curvy);
            } else {
                put_pixel(dst, xi, desty as i64, color);
            }

            if options.antialias {
                let mut othery = desty;

                if y == 0 {
                    first_arr[x] = Last { y: curvy, color };
                    if x > 0 {
                        let prev = first_arr[x - 1];
                        alias_color = prev.color;
                        diff = (prev.y - curvy).abs() + 1;
                        miny = prev.y.min(curvy) - 1;
                        maxy = prev.y.max(curvy) + 1;
                        othery = (height - 1) + topshift + displacement.dy(x, height - 1);
                    }
                }

                if y == height - 1 {
                    if x > 0 {
                        let prev = last_arr[x - 1];
                        alias_color = prev.color;
                        diff = (prev.y - curvy).abs() + 1;
                        miny = prev.y.min(curvy) - 1;
                        maxy = prev.y.max(curvy) + 1;
                    }
                    othery = topshift + displacement.dy(x, 0);
                }

                // the column left of a crossing of both outlines is not faded
                let alias_dir = (othery - desty).signum();
                if alias_dir != 0 && x > 0 {
                    let alpha_lo = if options.src_has_alpha {
                        alias_color[ALPHA].min(20)
                    } else {
                        20
                    };

                    for dy in 0..diff {
                        let mask = (255.0 * ((dy + 1) as f64 / (diff + 1) as f64)) as u8;
                        alias_color[ALPHA] = mix_channel(color[ALPHA], alpha_lo, mask);

                        let row = if alias_dir > 0 {
                            y + topshift + miny + dy
                        } else {
                            y + topshift + (maxy - dy)
                        };
                        put_pixel(dst, xi - 1, row as i64, alias_color);
                    }
                }
            }

            // fill the rows between this pixel and the one above it
            if y > 0 {
                let last = last_arr[x];
                let gap = last.y - curvy;
                let (gap, sign) = if gap < 0 { (-gap, -1) } else { (gap, 1) };
                let mut mixcolor = color;

                for dy in 1..=gap {
                    if options.smoothing {
                        blend_gap(last.color, color, dy, gap, &mut mixcolor);
                    } else if dy < gap / 2 {
                        mixcolor = color;
                    } else {
                        mixcolor = last.color;
                    }

                    let row = (desty + dy * sign) as i64;
                    if options.smoothing && x > 0 {
                        put_mix_pixel(dst, xi, row, mixcolor, nb_curvy, nb2_curvy, curvy);
                    } else {
                        put_pixel(dst, xi, row, mixcolor);
                    }
                }
            }

            last_arr[x] = Last { y: curvy, color };
        }

        progress.update((x + 1) as f64 / width as f64);
    }

    progress.update(1.0);
}
