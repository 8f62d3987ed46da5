use curvebend_image::{Image, ImageError, ImageSize};
use curvebend_imgproc::resize::resize_nearest;

use crate::bend::bend_image;
use crate::curve::BendParameters;
use crate::document::ImageBase;
use crate::error::BendError;
use crate::progress::NoProgress;

/// Longer side of the preview thumbnail.
pub const THUMBNAIL_SIZE: usize = 128;

/// Side of the square preview area.
pub const PREVIEW_SIZE: usize = 256;

/// Size of the thumbnail of a `size` raster: the longer side becomes [`THUMBNAIL_SIZE`].
pub fn thumbnail_size(size: ImageSize) -> ImageSize {
    let (w, h) = (size.width.max(1), size.height.max(1));
    if h > w {
        ImageSize {
            width: (w * THUMBNAIL_SIZE / h).max(1),
            height: THUMBNAIL_SIZE,
        }
    } else {
        ImageSize {
            width: THUMBNAIL_SIZE,
            height: (h * THUMBNAIL_SIZE / w).max(1),
        }
    }
}

/// Scale a layer down, or up, to its preview thumbnail.
pub fn thumbnail(src: &Image<u8, 4>) -> Result<Image<u8, 4>, ImageError> {
    let mut thumb = Image::from_size_val(thumbnail_size(src.size()), 0u8)?;
    resize_nearest(src, &mut thumb)?;
    Ok(thumb)
}

/// Bend a thumbnail the way a copy of the layer would be bent.
pub fn bend_preview(
    thumbnail: &Image<u8, 4>,
    params: &BendParameters,
) -> Result<Image<u8, 4>, BendError> {
    let params = BendParameters {
        work_on_copy: true,
        ..*params
    };
    bend_image(thumbnail, true, &params, None, &mut NoProgress)
}

/// Render the bent thumbnail centred into the square preview area.
///
/// Pixels outside the thumbnail are transparent black; grey documents show channel `0`.
pub fn render_preview(bent: &Image<u8, 4>, base: ImageBase) -> Result<Image<u8, 4>, ImageError> {
    let mut area = Image::from_size_val([PREVIEW_SIZE, PREVIEW_SIZE].into(), 0u8)?;
    let half = (PREVIEW_SIZE / 2) as i64;
    let ofx = bent.width() as i64 / 2 - half;
    let ofy = bent.height() as i64 / 2 - half;

    for y in 0..PREVIEW_SIZE as i64 {
        for x in 0..PREVIEW_SIZE as i64 {
            let px = bent.pixel(x + ofx, y + ofy).unwrap_or_default();
            let px = match base {
                ImageBase::Rgb => px,
                ImageBase::Gray => [px[0], px[0], px[0], px[3]],
            };
            area.set_pixel(x, y, px);
        }
    }

    Ok(area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_keeps_aspect() {
        assert_eq!(thumbnail_size([400, 200].into()), ImageSize::from([128, 64]));
        assert_eq!(thumbnail_size([100, 400].into()), ImageSize::from([32, 128]));
        assert_eq!(thumbnail_size([10, 10].into()), ImageSize::from([128, 128]));
        assert_eq!(thumbnail_size([1000, 1].into()), ImageSize::from([128, 1]));
    }

    #[test]
    fn thumbnail_samples_source() -> Result<(), ImageError> {
        let src = Image::from_size_pixel([256, 64].into(), [3, 4, 5, 255]);
        let thumb = thumbnail(&src)?;
        assert_eq!(thumb.size(), ImageSize::from([128, 32]));
        assert_eq!(thumb.pixel(127, 31), Some([3, 4, 5, 255]));
        Ok(())
    }

    #[test]
    fn render_centres_and_pads() -> Result<(), ImageError> {
        let bent = Image::from_size_pixel([2, 2].into(), [50, 60, 70, 255]);
        let area = render_preview(&bent, ImageBase::Rgb)?;
        assert_eq!(area.size(), ImageSize::from([PREVIEW_SIZE, PREVIEW_SIZE]));
        assert_eq!(area.pixel(127, 127), Some([50, 60, 70, 255]));
        assert_eq!(area.pixel(128, 128), Some([50, 60, 70, 255]));
        assert_eq!(area.pixel(126, 127), Some([0, 0, 0, 0]));
        assert_eq!(area.pixel(0, 0), Some([0, 0, 0, 0]));
        Ok(())
    }

    #[test]
    fn gray_replicates_first_channel() -> Result<(), ImageError> {
        let bent = Image::from_size_pixel([256, 256].into(), [90, 1, 2, 200]);
        let area = render_preview(&bent, ImageBase::Gray)?;
        assert_eq!(area.pixel(10, 10), Some([90, 90, 90, 200]));
        Ok(())
    }

    #[test]
    fn preview_of_flat_bend_is_unchanged() -> Result<(), BendError> {
        let thumb = Image::from_size_pixel([129, 20].into(), [9, 9, 9, 255]);
        let bent = bend_preview(&thumb, &BendParameters::default())?;
        assert_eq!(bent, thumb);
        Ok(())
    }
}
