use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::event_source::EventSource;
use crate::input::{InputMapper, ViewerInput};
use crate::slide::{
    FrameCanvas, ImageSource, Mirror, RedrawSignal, Size, SlideView, ViewConfig, ViewGroup, ViewId,
};
use crate::widget::{SlidePane, frame_size};

const HELP_TEXT: &str =
    "drag/arrows/wasd: pan | wheel: zoom | space: center | tab: focus | l: link | q: quit";

/// Terminal host for one or two slide views
pub struct App {
    group: ViewGroup,
    canvases: Vec<FrameCanvas>,
    pane_areas: Vec<Rect>,
    focused: ViewId,
    mapper: InputMapper,
    redraw: Arc<RedrawSignal>,
    keyboard_scroll_amount: i64,
    should_quit: bool,
}

impl App {
    /// Build `panes` views (one or two) over the same source. Two panes start
    /// linked.
    pub fn new(
        source: Arc<dyn ImageSource>,
        config: &ViewConfig,
        panes: usize,
        keyboard_scroll_amount: i64,
    ) -> Self {
        let redraw = Arc::new(RedrawSignal::default());
        let mut group = ViewGroup::new();
        let mut canvases = Vec::new();

        for _ in 0..panes.clamp(1, 2) {
            group.add(SlideView::new(
                Arc::clone(&source),
                config,
                Arc::clone(&redraw),
            ));
            canvases.push(FrameCanvas::new(0, 0, config.palette.background));
        }
        if group.len() == 2 {
            group.link(ViewId(0), ViewId(1));
        }

        Self {
            group,
            canvases,
            pane_areas: Vec::new(),
            focused: ViewId(0),
            mapper: InputMapper::new(),
            redraw,
            keyboard_scroll_amount,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn group(&self) -> &ViewGroup {
        &self.group
    }

    #[must_use]
    pub fn focused(&self) -> ViewId {
        self.focused
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn redraw(&self) -> &Arc<RedrawSignal> {
        &self.redraw
    }

    /// Stop every view's render workers and wait for them
    pub fn shutdown(&mut self) {
        for (_, view) in self.group.iter_mut() {
            view.pipeline_mut().shutdown();
        }
    }

    /// Pane containing a terminal cell
    fn pane_at(&self, column: u16, row: u16) -> Option<(ViewId, Rect)> {
        self.pane_areas
            .iter()
            .enumerate()
            .find(|(_, area)| {
                column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
            })
            .map(|(i, area)| (ViewId(i), *area))
    }

    pub fn handle_input(&mut self, input: ViewerInput) {
        match input {
            ViewerInput::Press { column, row } => {
                if let Some((id, _)) = self.pane_at(column, row) {
                    self.focused = id;
                }
            }
            ViewerInput::Drag { dx, dy, .. } => {
                // Content follows the pointer; one row is two pixels
                self.group.pan(
                    self.focused,
                    -i64::from(dx),
                    -i64::from(dy) * 2,
                    Mirror::Yes,
                );
            }
            ViewerInput::Wheel { column, row, steps } => {
                let (id, area) = self
                    .pane_at(column, row)
                    .unwrap_or((self.focused, Rect::default()));
                let x = i64::from(column.saturating_sub(area.x));
                let y = i64::from(row.saturating_sub(area.y)) * 2;
                self.group.zoom_at(id, x, y, steps, Mirror::Yes);
            }
            ViewerInput::Key(direction) => {
                let (dx, dy) = direction.delta(self.keyboard_scroll_amount);
                self.group.translate(self.focused, dx, dy, Mirror::Yes);
            }
            ViewerInput::Center => self.group.center(self.focused, Mirror::Yes),
            ViewerInput::FocusNext => {
                let count = self.group.len().max(1);
                self.focused = ViewId((self.focused.0 + 1) % count);
            }
            ViewerInput::ToggleLink => {
                if self.group.links().is_linked(self.focused) {
                    info!("unlinking views");
                    self.group.unlink(self.focused);
                } else if self.group.len() == 2 {
                    info!("linking views");
                    self.group.link(ViewId(0), ViewId(1));
                }
            }
            ViewerInput::Resize { columns, rows } => {
                debug!("terminal resized to {columns}x{rows}");
            }
            ViewerInput::Quit => self.should_quit = true,
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let full = f.area();
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(full);

        let constraints: Vec<Constraint> = (0..self.group.len())
            .map(|_| Constraint::Ratio(1, self.group.len() as u32))
            .collect();
        let panes = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints(constraints)
            .split(chunks[0]);

        let (screen_w, screen_h) = frame_size(full);
        let screen = Size::new(i64::from(screen_w), i64::from(screen_h));

        self.pane_areas.clear();
        let ids: Vec<ViewId> = self.group.ids().collect();
        for (id, pane) in ids.into_iter().zip(panes.iter()) {
            let linked = self.group.links().is_linked(id);
            let Some(view) = self.group.get_mut(id) else {
                continue;
            };

            let title = format!(
                " view {}{} | zoom {} (x{:.2}) ",
                id.0 + 1,
                if linked { " [linked]" } else { "" },
                view.state().exponent(),
                view.state().downsample(),
            );
            let border_color = if id == self.focused {
                Color::Yellow
            } else {
                Color::DarkGray
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border_color));
            let inner = block.inner(*pane);
            f.render_widget(block, *pane);

            let (w, h) = frame_size(inner);
            view.resize(Size::new(i64::from(w), i64::from(h)), screen);

            let canvas = &mut self.canvases[id.0];
            canvas.reset(w, h);
            view.paint(canvas);
            f.render_widget(SlidePane::new(canvas.frame()), inner);

            self.pane_areas.push(inner);
        }

        let status = self.status_line();
        f.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
            chunks[1],
        );
    }

    fn status_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        if let Some(view) = self.group.get(self.focused) {
            let state = view.state();
            let cached = view.pipeline().lock_cache().len();
            let queued = view.pipeline().queue().len();
            spans.push(Span::styled(
                format!(
                    "pan ({}, {}) tiles {cached} queued {queued} | ",
                    state.pan_x, state.pan_y
                ),
                Style::default().fg(Color::Gray),
            ));
        }
        spans.push(Span::raw(HELP_TEXT));
        Line::from(spans)
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let frame_interval = Duration::from_millis(16);
    let mut first_render = true;
    let mut events_processed = 0;

    loop {
        // Worker completions only set the flag; the repaint happens here
        let tiles_ready = app.redraw.take_pending();
        if first_render || events_processed > 0 || tiles_ready {
            terminal.draw(|f| app.draw(f))?;
            first_render = false;
        }

        events_processed = 0;
        while events_processed < 64 && event_source.poll(Duration::from_millis(0))? {
            let event = event_source.read()?;
            events_processed += 1;
            if let Some(input) = app.mapper.map(&event) {
                app.handle_input(input);
            }
            if app.should_quit {
                info!("quit requested");
                return Ok(());
            }
        }

        if events_processed == 0 {
            event_source.poll(frame_interval)?;
        }
    }
}
