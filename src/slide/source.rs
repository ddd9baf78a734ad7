//! Image sources that paint slide regions
//!
//! A source paints a region of the slide at a given downsample into a target
//! buffer. Region coordinates are in the downsampled pixel space, so the
//! region `(slide_x, slide_y, width, height)` covers layer-0 pixels
//! `slide_x * downsample .. (slide_x + width) * downsample` horizontally.
//! Pixels outside the content are left untouched.

use std::path::Path;

use image::{Rgb, RgbImage};

/// Errors from image sources
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("region at ({x}, {y}) unavailable: {detail}")]
    Unavailable { x: i64, y: i64, detail: String },

    #[error("target {target_w}x{target_h} too small for {width}x{height} at ({origin_x}, {origin_y})")]
    TargetTooSmall {
        origin_x: u32,
        origin_y: u32,
        width: u32,
        height: u32,
        target_w: u32,
        target_h: u32,
    },

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("render panicked: {0}")]
    Panicked(String),
}

impl SourceError {
    pub fn unavailable(x: i64, y: i64, detail: impl Into<String>) -> Self {
        Self::Unavailable {
            x,
            y,
            detail: detail.into(),
        }
    }
}

/// Slide content provider. Called from worker threads, concurrently for
/// different tiles.
pub trait ImageSource: Send + Sync {
    /// Paint `width` x `height` downsampled pixels starting at
    /// `(slide_x, slide_y)` into `target` at `(origin_x, origin_y)`.
    #[allow(clippy::too_many_arguments)]
    fn paint_region(
        &self,
        target: &mut RgbImage,
        origin_x: u32,
        origin_y: u32,
        slide_x: i64,
        slide_y: i64,
        width: u32,
        height: u32,
        downsample: f64,
    ) -> Result<(), SourceError>;

    /// Full content size at native resolution
    fn content_extent(&self) -> (u32, u32);
}

fn check_target(
    target: &RgbImage,
    origin_x: u32,
    origin_y: u32,
    width: u32,
    height: u32,
) -> Result<(), SourceError> {
    let fits_x = origin_x.checked_add(width).is_some_and(|r| r <= target.width());
    let fits_y = origin_y.checked_add(height).is_some_and(|b| b <= target.height());
    if fits_x && fits_y {
        Ok(())
    } else {
        Err(SourceError::TargetTooSmall {
            origin_x,
            origin_y,
            width,
            height,
            target_w: target.width(),
            target_h: target.height(),
        })
    }
}

/// Map a downsampled pixel to the layer-0 pixel it samples
#[inline]
fn to_layer0(p: i64, downsample: f64) -> i64 {
    (p as f64 * downsample).floor() as i64
}

/// Calls `paint` for every target pixel whose sample lands inside
/// `extent`, with the layer-0 sample position.
#[allow(clippy::too_many_arguments)]
fn for_each_sample(
    target: &mut RgbImage,
    origin_x: u32,
    origin_y: u32,
    slide_x: i64,
    slide_y: i64,
    width: u32,
    height: u32,
    downsample: f64,
    extent: (u32, u32),
    mut paint: impl FnMut(u32, u32) -> Rgb<u8>,
) {
    let (content_w, content_h) = (i64::from(extent.0), i64::from(extent.1));
    for j in 0..height {
        let ly = to_layer0(slide_y + i64::from(j), downsample);
        if !(0..content_h).contains(&ly) {
            continue;
        }
        for i in 0..width {
            let lx = to_layer0(slide_x + i64::from(i), downsample);
            if !(0..content_w).contains(&lx) {
                continue;
            }
            target.put_pixel(origin_x + i, origin_y + j, paint(lx as u32, ly as u32));
        }
    }
}

/// Procedurally generated slide: a color gradient over a checkerboard, with
/// dark rings every 1000 layer-0 pixels from the center so zoom levels are
/// easy to tell apart.
#[derive(Clone, Debug)]
pub struct SyntheticSlide {
    width: u32,
    height: u32,
    cell: u32,
}

impl SyntheticSlide {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cell: 512,
        }
    }

    /// Color of the layer-0 pixel at `(x, y)`
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> Rgb<u8> {
        let r = (u64::from(x) * 255 / u64::from(self.width.max(1))) as u8;
        let g = (u64::from(y) * 255 / u64::from(self.height.max(1))) as u8;
        let checker = ((x / self.cell) + (y / self.cell)) % 2 == 0;
        let b = if checker { 200 } else { 90 };

        let dx = f64::from(x) - f64::from(self.width) / 2.0;
        let dy = f64::from(y) - f64::from(self.height) / 2.0;
        let ring = (dx.hypot(dy) % 1000.0) < 12.0;

        if ring {
            Rgb([r / 4, g / 4, b / 4])
        } else {
            Rgb([r, g, b])
        }
    }
}

impl ImageSource for SyntheticSlide {
    fn paint_region(
        &self,
        target: &mut RgbImage,
        origin_x: u32,
        origin_y: u32,
        slide_x: i64,
        slide_y: i64,
        width: u32,
        height: u32,
        downsample: f64,
    ) -> Result<(), SourceError> {
        check_target(target, origin_x, origin_y, width, height)?;
        for_each_sample(
            target,
            origin_x,
            origin_y,
            slide_x,
            slide_y,
            width,
            height,
            downsample,
            (self.width, self.height),
            |x, y| self.sample(x, y),
        );
        Ok(())
    }

    fn content_extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Slide backed by a decoded image held in memory, sampled nearest-neighbor
pub struct RasterSlide {
    image: RgbImage,
}

impl RasterSlide {
    #[must_use]
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Decode an image file with the `image` crate
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let image = image::open(path)?.to_rgb8();
        Ok(Self::new(image))
    }
}

impl ImageSource for RasterSlide {
    fn paint_region(
        &self,
        target: &mut RgbImage,
        origin_x: u32,
        origin_y: u32,
        slide_x: i64,
        slide_y: i64,
        width: u32,
        height: u32,
        downsample: f64,
    ) -> Result<(), SourceError> {
        check_target(target, origin_x, origin_y, width, height)?;
        for_each_sample(
            target,
            origin_x,
            origin_y,
            slide_x,
            slide_y,
            width,
            height,
            downsample,
            self.image.dimensions(),
            |x, y| *self.image.get_pixel(x, y),
        );
        Ok(())
    }

    fn content_extent(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl std::fmt::Debug for RasterSlide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSlide")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgb<u8> = Rgb([1, 1, 1]);

    #[test]
    fn raster_native_resolution_copies_pixels() {
        let mut image = RgbImage::new(4, 4);
        image.put_pixel(2, 3, Rgb([10, 20, 30]));
        let slide = RasterSlide::new(image);
        let mut target = RgbImage::from_pixel(4, 4, BG);

        slide
            .paint_region(&mut target, 0, 0, 0, 0, 4, 4, 1.0)
            .unwrap();

        assert_eq!(*target.get_pixel(2, 3), Rgb([10, 20, 30]));
    }

    #[test]
    fn raster_downsample_skips_pixels() {
        let mut image = RgbImage::new(8, 8);
        image.put_pixel(4, 2, Rgb([50, 60, 70]));
        let slide = RasterSlide::new(image);
        let mut target = RgbImage::from_pixel(4, 4, BG);

        slide
            .paint_region(&mut target, 0, 0, 0, 0, 4, 4, 2.0)
            .unwrap();

        assert_eq!(*target.get_pixel(2, 1), Rgb([50, 60, 70]));
    }

    #[test]
    fn outside_content_is_untouched() {
        let slide = SyntheticSlide::new(100, 100);
        let mut target = RgbImage::from_pixel(16, 16, BG);

        slide
            .paint_region(&mut target, 0, 0, -8, -8, 16, 16, 1.0)
            .unwrap();

        assert_eq!(*target.get_pixel(0, 0), BG);
        assert_eq!(*target.get_pixel(7, 15), BG);
        assert_eq!(*target.get_pixel(8, 8), slide.sample(0, 0));
    }

    #[test]
    fn origin_offsets_into_target() {
        let slide = SyntheticSlide::new(100, 100);
        let mut target = RgbImage::from_pixel(8, 8, BG);

        slide
            .paint_region(&mut target, 4, 4, 10, 10, 4, 4, 1.0)
            .unwrap();

        assert_eq!(*target.get_pixel(3, 3), BG);
        assert_eq!(*target.get_pixel(4, 4), slide.sample(10, 10));
    }

    #[test]
    fn oversized_region_is_rejected() {
        let slide = SyntheticSlide::new(100, 100);
        let mut target = RgbImage::new(8, 8);

        let err = slide
            .paint_region(&mut target, 4, 0, 0, 0, 8, 8, 1.0)
            .unwrap_err();

        assert!(matches!(err, SourceError::TargetTooSmall { .. }));
    }
}
