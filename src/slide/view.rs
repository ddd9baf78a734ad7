//! A single slide view: viewport state wired to its tile pipeline

use std::sync::Arc;

use log::{debug, info};

use super::compositor::{PaintPlan, TileCanvas, plan_paint};
use super::redraw::RedrawSignal;
use super::service::TilePipeline;
use super::source::ImageSource;
use super::types::{Size, TilePalette};
use super::viewport::ViewportState;
use super::{DEFAULT_DOWNSAMPLE_BASE, DEFAULT_MAX_DOWNSAMPLE_EXPONENT, DEFAULT_WORKERS};

/// Construction parameters for a [`SlideView`]
#[derive(Clone, Debug)]
pub struct ViewConfig {
    pub downsample_base: f64,
    pub max_downsample_exponent: i32,
    pub workers: usize,
    pub palette: TilePalette,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            downsample_base: DEFAULT_DOWNSAMPLE_BASE,
            max_downsample_exponent: DEFAULT_MAX_DOWNSAMPLE_EXPONENT,
            workers: DEFAULT_WORKERS,
            palette: TilePalette::default(),
        }
    }
}

pub struct SlideView {
    state: ViewportState,
    source: Arc<dyn ImageSource>,
    pipeline: TilePipeline,
    first_paint: bool,
}

impl SlideView {
    #[must_use]
    pub fn new(
        source: Arc<dyn ImageSource>,
        config: &ViewConfig,
        redraw: Arc<RedrawSignal>,
    ) -> Self {
        let (w, h) = source.content_extent();
        info!(
            "slide view: content {w}x{h}, base {}, max exponent {}",
            config.downsample_base, config.max_downsample_exponent
        );

        let pipeline = TilePipeline::new(
            Arc::clone(&source),
            config.palette,
            config.workers,
            redraw,
        );

        Self {
            state: ViewportState::new(config.downsample_base, config.max_downsample_exponent),
            source,
            pipeline,
            first_paint: true,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    #[must_use]
    pub fn pipeline(&self) -> &TilePipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut TilePipeline {
        &mut self.pipeline
    }

    #[must_use]
    pub fn redraw(&self) -> &Arc<RedrawSignal> {
        self.pipeline.redraw()
    }

    /// Update the drawing area and the screen size driving tile retention
    pub fn resize(&mut self, viewport: Size, screen: Size) {
        if self.state.viewport_size() == viewport && self.state.screen_size() == screen {
            return;
        }
        self.state.set_viewport_size(viewport);
        self.state.set_screen_size(screen);
        if !self.first_paint {
            self.reconcile();
        }
        self.pipeline.redraw().request();
    }

    pub fn pan(&mut self, dx: i64, dy: i64) {
        self.state.pan(dx, dy);
        self.reconcile();
        self.pipeline.redraw().request();
    }

    /// Keyboard navigation; same movement as a drag
    pub fn translate(&mut self, dx: i64, dy: i64) {
        self.pan(dx, dy);
    }

    /// Zoom by `steps` around a viewport point. Cached tiles are kept on
    /// screen until their re-render at the new level lands.
    pub fn zoom_at(&mut self, x: i64, y: i64, steps: i32) {
        if !self.state.zoom_at(x, y, steps) {
            return;
        }
        debug!(
            "zoom: exponent {} (downsample {:.3})",
            self.state.exponent(),
            self.state.downsample()
        );

        {
            let mut cache = self.pipeline.lock_cache();
            cache.set_zoom(self.state.exponent(), self.state.downsample());
            cache.reconcile(self.state.view_rect(), self.pipeline.queue());
            cache.invalidate_all(self.pipeline.queue());
        }
        self.pipeline.redraw().request();
    }

    /// Center the whole slide at the current zoom
    pub fn center(&mut self) {
        let (w, h) = self.source.content_extent();
        self.state.center_on_content(w, h);
        self.reconcile();
        self.pipeline.redraw().request();
    }

    /// Choose the zoom level at which the whole slide fits
    pub fn fit(&mut self) {
        let (w, h) = self.source.content_extent();
        let before = self.state.exponent();
        self.state.fit_to_viewport(w, h);

        let mut cache = self.pipeline.lock_cache();
        cache.set_zoom(self.state.exponent(), self.state.downsample());
        if self.state.exponent() != before {
            cache.invalidate_all(self.pipeline.queue());
        }
    }

    /// Bring the cache in line with the current view rectangle
    pub fn reconcile(&mut self) {
        self.pipeline
            .lock_cache()
            .reconcile(self.state.view_rect(), self.pipeline.queue());
    }

    /// True until the first paint with a non-empty viewport
    #[must_use]
    pub fn awaiting_first_paint(&self) -> bool {
        self.first_paint
    }

    /// Composite cached tiles onto `canvas`. The first paint with a usable
    /// viewport fits and centers the slide and populates the cache.
    pub fn paint(&mut self, canvas: &mut dyn TileCanvas) -> PaintPlan {
        if self.first_paint && !self.state.viewport_size().is_empty() {
            self.fit();
            self.center();
            self.first_paint = false;
        }

        let plan = plan_paint(&self.state, self.pipeline.cache());
        plan.draw(canvas);
        plan
    }
}
