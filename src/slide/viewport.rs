//! Pan and zoom state for a slide view
//!
//! Zoom is an integer exponent of a fixed base; the effective downsample
//! factor is `base ^ exponent`. Pan is the top-left of the viewport in the
//! current downsample's pixel space, so it changes whenever the exponent does.

use super::geometry::PixelRect;
use super::types::Size;

#[derive(Clone, Debug)]
pub struct ViewportState {
    downsample_base: f64,
    max_exponent: i32,
    exponent: i32,

    /// Top-left of the viewport in downsampled pixels
    pub pan_x: i64,
    pub pan_y: i64,

    /// Stored for future use; not applied to rendering or geometry
    rotation: f64,

    /// Size of the drawing area
    viewport: Size,

    /// Size that drives the retention window and paint margin
    screen: Size,
}

impl ViewportState {
    /// `downsample_base` must be greater than 1; smaller values are replaced
    /// by the default base.
    #[must_use]
    pub fn new(downsample_base: f64, max_exponent: i32) -> Self {
        let downsample_base = if downsample_base.is_finite() && downsample_base > 1.0 {
            downsample_base
        } else {
            super::DEFAULT_DOWNSAMPLE_BASE
        };

        Self {
            downsample_base,
            max_exponent: max_exponent.max(0),
            exponent: 0,
            pan_x: 0,
            pan_y: 0,
            rotation: 0.0,
            viewport: Size::default(),
            screen: Size::default(),
        }
    }

    #[must_use]
    pub fn downsample_base(&self) -> f64 {
        self.downsample_base
    }

    #[must_use]
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    #[must_use]
    pub fn max_exponent(&self) -> i32 {
        self.max_exponent
    }

    /// Effective downsample factor
    #[must_use]
    pub fn downsample(&self) -> f64 {
        self.downsample_base.powi(self.exponent)
    }

    #[must_use]
    pub fn viewport_size(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport = size;
    }

    #[must_use]
    pub fn screen_size(&self) -> Size {
        self.screen
    }

    pub fn set_screen_size(&mut self, size: Size) {
        self.screen = size;
    }

    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set_rotation(&mut self, angle: f64) {
        self.rotation = angle;
    }

    /// Rectangle handed to tile reconciliation: pan position by screen size
    #[must_use]
    pub fn view_rect(&self) -> PixelRect {
        PixelRect::new(self.pan_x, self.pan_y, self.screen.width, self.screen.height)
    }

    pub fn pan(&mut self, dx: i64, dy: i64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Set the exponent, clamped to `0..=max_exponent`
    pub fn set_exponent(&mut self, exponent: i32) {
        self.exponent = exponent.clamp(0, self.max_exponent);
    }

    /// Zoom by `steps` exponent steps keeping the slide point under
    /// `(screen_x, screen_y)` fixed. Returns true if the exponent changed.
    pub fn zoom_at(&mut self, screen_x: i64, screen_y: i64, steps: i32) -> bool {
        let old_ds = self.downsample();
        let anchor_x = (self.pan_x + screen_x) as f64 * old_ds;
        let anchor_y = (self.pan_y + screen_y) as f64 * old_ds;

        let old_exponent = self.exponent;
        self.set_exponent(self.exponent.saturating_add(steps));
        if self.exponent == old_exponent {
            return false;
        }

        let new_ds = self.downsample();
        self.pan_x = (anchor_x / new_ds).round() as i64 - screen_x;
        self.pan_y = (anchor_y / new_ds).round() as i64 - screen_y;
        true
    }

    /// Center content of the given layer-0 size in the viewport at the
    /// current downsample. No-op for an empty viewport.
    pub fn center_on_content(&mut self, content_width: u32, content_height: u32) {
        if self.viewport.is_empty() {
            return;
        }

        let ds = self.downsample();
        let scaled_w = (f64::from(content_width) / ds) as i64;
        let scaled_h = (f64::from(content_height) / ds) as i64;

        self.pan_x = scaled_w / 2 - self.viewport.width / 2;
        self.pan_y = scaled_h / 2 - self.viewport.height / 2;
    }

    /// Pick the smallest exponent at which the whole content fits in the
    /// viewport. No-op for an empty viewport.
    pub fn fit_to_viewport(&mut self, content_width: u32, content_height: u32) {
        if self.viewport.is_empty() {
            return;
        }

        let width_scale = f64::from(content_width) / self.viewport.width as f64;
        let height_scale = f64::from(content_height) / self.viewport.height as f64;
        let max_scale = width_scale.max(height_scale);

        let exponent = if max_scale < 1.0 {
            0
        } else {
            (max_scale.ln() / self.downsample_base.ln()).ceil() as i32
        };

        self.set_exponent(exponent);
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(
            super::DEFAULT_DOWNSAMPLE_BASE,
            super::DEFAULT_MAX_DOWNSAMPLE_EXPONENT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_800x600() -> ViewportState {
        let mut state = ViewportState::new(1.2, 40);
        state.set_viewport_size(Size::new(800, 600));
        state.set_screen_size(Size::new(800, 600));
        state
    }

    #[test]
    fn pan_translates() {
        let mut state = state_800x600();
        state.pan(50, -20);
        state.pan(-10, 5);

        assert_eq!((state.pan_x, state.pan_y), (40, -15));
    }

    #[test]
    fn zoom_clamps_silently() {
        let mut state = state_800x600();

        assert!(!state.zoom_at(0, 0, -3));
        assert_eq!(state.exponent(), 0);

        assert!(state.zoom_at(0, 0, 100));
        assert_eq!(state.exponent(), 40);

        assert!(!state.zoom_at(0, 0, 1));
        assert_eq!(state.exponent(), 40);
    }

    #[test]
    fn zoom_keeps_anchor_under_cursor() {
        for &(pan_x, pan_y) in &[(0_i64, 0_i64), (-300, 125), (4321, -987), (17, 3)] {
            for &(sx, sy) in &[(0_i64, 0_i64), (400, 300), (799, 1), (123, 456)] {
                for start in [0, 5, 20, 39] {
                    for step in [-1, 1] {
                        let mut state = state_800x600();
                        state.set_exponent(start);
                        state.pan_x = pan_x;
                        state.pan_y = pan_y;

                        let before_x = (state.pan_x + sx) as f64 * state.downsample();
                        let before_y = (state.pan_y + sy) as f64 * state.downsample();

                        state.zoom_at(sx, sy, step);

                        let ds = state.downsample();
                        let after_x = (state.pan_x + sx) as f64 * ds;
                        let after_y = (state.pan_y + sy) as f64 * ds;

                        assert!(((before_x - after_x) / ds).abs() < 1.0);
                        assert!(((before_y - after_y) / ds).abs() < 1.0);
                    }
                }
            }
        }
    }

    #[test]
    fn fit_picks_smallest_covering_exponent() {
        let mut state = state_800x600();
        state.fit_to_viewport(10_000, 8_000);

        let e = state.exponent();
        let needed = 8_000.0 / 600.0;
        assert_eq!(e, 15);
        assert!(1.2_f64.powi(e) >= needed);
        assert!(1.2_f64.powi(e - 1) < needed);
    }

    #[test]
    fn fit_small_content_uses_native_resolution() {
        let mut state = state_800x600();
        state.set_exponent(7);
        state.fit_to_viewport(400, 300);

        assert_eq!(state.exponent(), 0);
    }

    #[test]
    fn fit_clamps_to_max() {
        let mut state = ViewportState::new(1.2, 10);
        state.set_viewport_size(Size::new(100, 100));
        state.fit_to_viewport(1_000_000, 10);

        assert_eq!(state.exponent(), 10);
    }

    #[test]
    fn center_places_content_in_middle() {
        let mut state = state_800x600();
        state.fit_to_viewport(10_000, 8_000);
        state.center_on_content(10_000, 8_000);

        // 10000 / 1.2^15 = 649.0, 8000 / 1.2^15 = 519.2
        assert_eq!((state.pan_x, state.pan_y), (324 - 400, 259 - 300));
    }

    #[test]
    fn degenerate_viewport_is_noop() {
        let mut state = ViewportState::new(1.2, 40);
        state.set_viewport_size(Size::new(0, 600));
        state.pan_x = 12;
        state.set_exponent(3);

        state.fit_to_viewport(10_000, 8_000);
        state.center_on_content(10_000, 8_000);

        assert_eq!(state.exponent(), 3);
        assert_eq!(state.pan_x, 12);
    }

    #[test]
    fn rotation_is_stored_only() {
        let mut state = state_800x600();
        let rect = state.view_rect();
        state.set_rotation(90.0);

        assert_eq!(state.rotation(), 90.0);
        assert_eq!(state.view_rect(), rect);
    }

    #[test]
    fn invalid_base_falls_back_to_default() {
        let state = ViewportState::new(0.5, 40);
        assert_eq!(state.downsample_base(), super::super::DEFAULT_DOWNSAMPLE_BASE);
    }
}
