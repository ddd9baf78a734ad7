use std::{fs::File, io::stdout, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use slideview::event_source::TerminalEventSource;
use slideview::main_app::{App, run_app_with_event_source};
use slideview::panic_handler;
use slideview::settings;
use slideview::slide::{ImageSource, RasterSlide, SyntheticSlide};

#[derive(Parser, Debug)]
#[command(name = "slideview", version, about = "Terminal viewer for very large tiled images")]
struct Args {
    /// Image to open; a synthetic slide is used when omitted
    image: Option<PathBuf>,
    /// Size of the synthetic slide, as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_extent, default_value = "100000x80000")]
    synthetic: (u32, u32),
    /// Show two linked views side by side
    #[arg(long, default_value_t = false)]
    dual: bool,
    /// Render worker threads per view
    #[arg(long)]
    workers: Option<usize>,
    /// Downsample factor per zoom step
    #[arg(long)]
    base: Option<f64>,
    #[arg(long)]
    max_exponent: Option<i32>,
    #[arg(long, default_value = "slideview.log")]
    log_file: PathBuf,
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn parse_extent(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if w == 0 || h == 0 {
        return Err("extent must be non-zero".to_string());
    }
    Ok((w, h))
}

fn open_source(args: &Args) -> Result<Arc<dyn ImageSource>> {
    match &args.image {
        Some(path) => {
            let slide = RasterSlide::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            info!("opened {}", path.display());
            Ok(Arc::new(slide))
        }
        None => {
            let (w, h) = args.synthetic;
            info!("using synthetic slide {w}x{h}");
            Ok(Arc::new(SyntheticSlide::new(w, h)))
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        args.log_level,
        Config::default(),
        File::create(&args.log_file)?,
    )?;
    info!("Starting slideview");

    panic_handler::initialize_panic_handler();
    settings::load_settings();

    if let Some(workers) = args.workers {
        settings::set_render_workers(workers);
    }
    if let Some(base) = args.base {
        settings::set_downsample_base(base);
    }
    if let Some(exponent) = args.max_exponent {
        settings::set_max_downsample_exponent(exponent);
    }

    let source = open_source(&args)?;
    let current = settings::current();
    let panes = if args.dual { 2 } else { 1 };
    let mut app = App::new(
        source,
        &current.view_config(),
        panes,
        current.keyboard_scroll_amount,
    );

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = TerminalEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown();

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down slideview");
    Ok(())
}
