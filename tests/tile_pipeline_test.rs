use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};
use slideview::slide::{
    FrameCanvas, ImageSource, RedrawSignal, Size, SlideView, SourceError, SyntheticSlide,
    TileState, ViewConfig,
};
use slideview::test_utils::test_helpers::wait_for;

const WAIT: Duration = Duration::from_secs(10);

struct FailingSlide {
    calls: AtomicUsize,
}

impl ImageSource for FailingSlide {
    fn paint_region(
        &self,
        _target: &mut RgbImage,
        _origin_x: u32,
        _origin_y: u32,
        slide_x: i64,
        slide_y: i64,
        _width: u32,
        _height: u32,
        _downsample: f64,
    ) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SourceError::unavailable(slide_x, slide_y, "region offline"))
    }

    fn content_extent(&self) -> (u32, u32) {
        (4096, 4096)
    }
}

/// Synthetic content until switched off, then every region fails
struct FlakySlide {
    inner: SyntheticSlide,
    offline: AtomicBool,
}

impl ImageSource for FlakySlide {
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
        if self.offline.load(Ordering::SeqCst) {
            return Err(SourceError::unavailable(slide_x, slide_y, "scanner offline"));
        }
        self.inner.paint_region(
            target, origin_x, origin_y, slide_x, slide_y, width, height, downsample,
        )
    }

    fn content_extent(&self) -> (u32, u32) {
        self.inner.content_extent()
    }
}

struct SlowSlide {
    inner: SyntheticSlide,
    delay: Duration,
}

impl ImageSource for SlowSlide {
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
        std::thread::sleep(self.delay);
        self.inner.paint_region(
            target, origin_x, origin_y, slide_x, slide_y, width, height, downsample,
        )
    }

    fn content_extent(&self) -> (u32, u32) {
        self.inner.content_extent()
    }
}

fn config(workers: usize) -> ViewConfig {
    ViewConfig {
        workers,
        ..ViewConfig::default()
    }
}

fn first_paint(view: &mut SlideView, width: i64, height: i64) {
    view.resize(Size::new(width, height), Size::new(width, height));
    let mut canvas = FrameCanvas::new(width as u32, height as u32, Rgb([255, 255, 255]));
    view.paint(&mut canvas);
}

fn all_rendered(view: &SlideView) -> bool {
    let cache = view.pipeline().lock_cache();
    !cache.is_empty()
        && cache
            .coordinates()
            .all(|c| cache.get(&c).is_some_and(|t| t.state() == TileState::Rendered))
}

#[test]
fn workers_replace_placeholders_and_request_redraw() {
    let redraw = Arc::new(RedrawSignal::default());
    let source = Arc::new(SyntheticSlide::new(2048, 2048));
    let mut view = SlideView::new(source, &config(2), Arc::clone(&redraw));

    first_paint(&mut view, 512, 512);
    assert!(!view.awaiting_first_paint());
    assert!(!view.pipeline().lock_cache().is_empty());

    redraw.take_pending();
    assert!(wait_for(WAIT, || all_rendered(&view)));
    assert!(wait_for(WAIT, || redraw.is_pending()));

    view.pipeline_mut().shutdown();
}

#[test]
fn rendered_tiles_show_up_in_the_frame() {
    let redraw = Arc::new(RedrawSignal::default());
    let source = Arc::new(SyntheticSlide::new(600, 400));
    let mut view = SlideView::new(source.clone(), &config(1), redraw);

    // Content smaller than the viewport stays at native resolution
    first_paint(&mut view, 800, 600);
    assert_eq!(view.state().exponent(), 0);
    assert!(wait_for(WAIT, || all_rendered(&view)));

    let mut canvas = FrameCanvas::new(800, 600, Rgb([255, 255, 255]));
    view.paint(&mut canvas);

    // Slide origin lands at -pan in the frame
    let x = (-view.state().pan_x) as u32;
    let y = (-view.state().pan_y) as u32;
    assert_eq!(*canvas.frame().get_pixel(x + 10, y + 10), source.sample(10, 10));

    view.pipeline_mut().shutdown();
}

#[test]
fn failing_source_keeps_placeholders() {
    let redraw = Arc::new(RedrawSignal::default());
    let source = Arc::new(FailingSlide {
        calls: AtomicUsize::new(0),
    });
    let mut view = SlideView::new(source.clone(), &config(2), Arc::clone(&redraw));

    first_paint(&mut view, 512, 512);
    let tiles = view.pipeline().lock_cache().len();
    redraw.take_pending();

    assert!(wait_for(WAIT, || source.calls.load(Ordering::SeqCst) >= tiles));
    view.pipeline_mut().shutdown();

    let cache = view.pipeline().lock_cache();
    assert_eq!(cache.len(), tiles);
    assert!(
        cache
            .coordinates()
            .all(|c| cache.get(&c).is_some_and(|t| t.state() == TileState::Placeholder))
    );
    assert!(!redraw.is_pending());
}

#[test]
fn zoom_rerenders_at_new_level() {
    let redraw = Arc::new(RedrawSignal::default());
    let source = Arc::new(SyntheticSlide::new(8192, 8192));
    let mut view = SlideView::new(source, &config(2), redraw);

    first_paint(&mut view, 512, 512);
    assert!(wait_for(WAIT, || all_rendered(&view)));

    let before = view.state().exponent();
    view.zoom_at(256, 256, -2);
    assert_eq!(view.state().exponent(), before - 2);
    assert_eq!(view.pipeline().lock_cache().zoom().0, before - 2);

    assert!(wait_for(WAIT, || view.pipeline().queue().is_empty()
        && all_rendered(&view)));

    view.pipeline_mut().shutdown();
}

#[test]
fn failed_rerender_after_zoom_falls_back_to_placeholders() {
    let redraw = Arc::new(RedrawSignal::default());
    let source = Arc::new(FlakySlide {
        inner: SyntheticSlide::new(8192, 8192),
        offline: AtomicBool::new(false),
    });
    let mut view = SlideView::new(source.clone(), &config(2), Arc::clone(&redraw));

    first_paint(&mut view, 512, 512);
    assert!(wait_for(WAIT, || all_rendered(&view)));

    source.offline.store(true, Ordering::SeqCst);
    view.zoom_at(0, 0, -1);

    // Nothing can render at the new level, so old content must not linger
    let rendered = |view: &SlideView| {
        let cache = view.pipeline().lock_cache();
        cache
            .coordinates()
            .filter(|c| cache.get(c).is_some_and(|t| t.state() == TileState::Rendered))
            .count()
    };
    assert!(wait_for(WAIT, || rendered(&view) == 0));

    view.pipeline_mut().shutdown();
    assert_eq!(rendered(&view), 0);
}

#[test]
fn shutdown_skips_queued_backlog() {
    let source = Arc::new(SlowSlide {
        inner: SyntheticSlide::new(100_000, 80_000),
        delay: Duration::from_millis(20),
    });
    let mut view = SlideView::new(source, &config(2), Arc::new(RedrawSignal::default()));

    first_paint(&mut view, 1600, 1200);
    let queued = view.pipeline().queue().len();
    assert!(queued > 100);

    let started = Instant::now();
    view.pipeline_mut().shutdown();

    // Each worker finishes at most the tile it is on
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(view.pipeline().worker_count(), 0);
}

#[test]
fn shutdown_joins_all_workers() {
    let source = Arc::new(SyntheticSlide::new(1024, 1024));
    let mut view = SlideView::new(source, &config(3), Arc::new(RedrawSignal::default()));
    assert_eq!(view.pipeline().worker_count(), 3);

    view.pipeline_mut().shutdown();
    assert_eq!(view.pipeline().worker_count(), 0);
}
