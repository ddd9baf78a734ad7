//! Slide pane widget
//!
//! Draws a composited RGB frame into terminal cells using the upper half
//! block: each cell shows two vertically stacked pixels, the top one as the
//! foreground color and the bottom one as the background color.

use image::RgbImage;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

const UPPER_HALF_BLOCK: &str = "\u{2580}";

/// Pixel size of the frame a pane of `area` displays
#[must_use]
pub fn frame_size(area: Rect) -> (u32, u32) {
    (u32::from(area.width), u32::from(area.height) * 2)
}

#[derive(Debug, Clone, Copy)]
pub struct SlidePane<'a> {
    frame: &'a RgbImage,
}

impl<'a> SlidePane<'a> {
    #[must_use]
    pub fn new(frame: &'a RgbImage) -> Self {
        Self { frame }
    }
}

impl Widget for SlidePane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let buffer_area = buf.area();
        let x_end = area.x.saturating_add(area.width).min(buffer_area.right());
        let y_end = area.y.saturating_add(area.height).min(buffer_area.bottom());
        let x_start = area.x.max(buffer_area.left());
        let y_start = area.y.max(buffer_area.top());

        for y in y_start..y_end {
            let top_row = u32::from(y - area.y) * 2;
            for x in x_start..x_end {
                let px = u32::from(x - area.x);
                let (Some(top), Some(bottom)) = (
                    self.frame.get_pixel_checked(px, top_row),
                    self.frame.get_pixel_checked(px, top_row + 1),
                ) else {
                    continue;
                };

                buf[(x, y)]
                    .set_symbol(UPPER_HALF_BLOCK)
                    .set_fg(Color::Rgb(top[0], top[1], top[2]))
                    .set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
            }
        }
    }
}
