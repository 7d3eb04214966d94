// Main-thread scheduler: owns the terminal, renders frames, and applies
// input intents. The sampler thread only ever touches the store; this loop
// never blocks longer than the input poll timeout.

pub mod horizon;
pub mod input;

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use log::debug;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::{Frame, Terminal};

use crate::config::Config;
use crate::display::modes::ViewMode;
use crate::display::presenter::{self, PresenterRegistry, Row};
use crate::display::DisplayState;
use crate::error::TelemetryError;
use crate::metrics::domain_of;
use crate::store::MetricStore;
use horizon::{palette_for_domain, ColorBand, HorizonRow};
use input::{intent_for, Intent};

/// Upper bound on how long a frame waits for input.
const INPUT_POLL_MS: u64 = 100;

/// Terminal rows per metric: ruler plus chart.
const ROWS_PER_METRIC: u16 = 2;

struct App {
    store: Arc<MetricStore>,
    registry: PresenterRegistry,
    bands: HashMap<&'static str, ColorBand>,
    fallback_band: ColorBand,
    refresh_ms: u64,
}

impl App {
    fn new(config: &Config, store: Arc<MetricStore>) -> Self {
        let domains = [
            "cpu", "gpu", "accel", "memory", "swap", "power", "disk", "network",
        ];
        let bands = domains
            .iter()
            .map(|d| (*d, ColorBand::new(palette_for_domain(d))))
            .collect();
        App {
            store,
            registry: PresenterRegistry::new(),
            bands,
            fallback_band: ColorBand::new(palette_for_domain("")),
            refresh_ms: config.refresh_ms,
        }
    }

    fn band(&self, domain: &str) -> &ColorBand {
        self.bands.get(domain).unwrap_or(&self.fallback_band)
    }
}

/// Run the TUI until quit or shutdown. Restores the terminal on every exit
/// path before returning.
pub fn run(
    config: &Config,
    store: Arc<MetricStore>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), TelemetryError> {
    let app = App::new(config, store);
    let state = Mutex::new(DisplayState::from_config(config));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &app, &state, &shutdown);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show).ok();
    result.map_err(TelemetryError::from)
}

fn event_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &App,
    state: &Mutex<DisplayState>,
    shutdown: &Arc<AtomicBool>,
) -> io::Result<()> {
    let mut last_generation = app.store.generation();
    loop {
        if shutdown.load(Ordering::Acquire) {
            return Ok(());
        }

        if event::poll(Duration::from_millis(INPUT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(intent) = intent_for(key) {
                        apply_intent(app, state, shutdown, intent);
                    }
                }
                Event::Resize(_, _) => {
                    state.lock().expect("state lock poisoned").dirty = true;
                }
                _ => {}
            }
        }

        let generation = app.store.generation();
        let snapshot = {
            let mut guard = state.lock().expect("state lock poisoned");
            if generation != last_generation {
                // While scrolled into history the window stays frozen: new
                // ticks push the offset further out instead of the view.
                let delta = (generation - last_generation) as usize;
                guard.viewport.hold_on_history(delta, app.store.capacity());
                guard.dirty = true;
                last_generation = generation;
            }
            if !guard.dirty {
                continue;
            }
            guard.dirty = false;
            *guard
        };
        terminal.draw(|frame| draw_frame(frame, app, &snapshot))?;
    }
}

fn apply_intent(
    app: &App,
    state: &Mutex<DisplayState>,
    shutdown: &Arc<AtomicBool>,
    intent: Intent,
) {
    match intent {
        Intent::Quit => {
            debug!("quit requested");
            shutdown.store(true, Ordering::Release);
        }
        Intent::Toggle(key) => {
            let mut guard = state.lock().expect("state lock poisoned");
            if guard.modes.toggle(key) {
                guard.dirty = true;
            }
        }
        Intent::ResetScroll => {
            let mut guard = state.lock().expect("state lock poisoned");
            guard.viewport.reset_scroll();
            guard.dirty = true;
        }
        Intent::Scroll { dx, dy } => {
            let modes = state.lock().expect("state lock poisoned").modes;
            let max_cols = app.store.longest_len();
            let total_rows = presenter::rows(&app.store.names(), &modes, &app.registry).len();
            let mut guard = state.lock().expect("state lock poisoned");
            guard
                .viewport
                .scroll(dx, dy, max_cols, total_rows.saturating_sub(1));
            guard.dirty = true;
        }
    }
}

fn draw_frame(frame: &mut Frame, app: &App, state: &DisplayState) {
    let area = frame.area();
    let slots = (area.height / ROWS_PER_METRIC) as usize;
    if area.width == 0 || slots == 0 {
        return;
    }

    let names = app.store.names();
    let rows = presenter::rows(&names, &state.modes, &app.registry);
    let rows_off = state.viewport.rows_off.min(rows.len().saturating_sub(1));

    for (slot, row) in rows.iter().skip(rows_off).take(slots).enumerate() {
        let y = area.y + slot as u16 * ROWS_PER_METRIC;
        let window = app
            .store
            .snapshot(&row.name, area.width as usize, state.viewport.cols_off);
        let scale_max = presenter::scale_for(&row.name, window.max);

        let ruler = Rect::new(area.x, y, area.width, 1);
        draw_ruler(frame, app, state, row, &window.values, scale_max, ruler);

        let chart = Rect::new(area.x, y + 1, area.width, 1);
        frame.render_widget(
            HorizonRow {
                values: &window.values,
                scale_max,
                band: app.band(domain_of(&row.name)),
            },
            chart,
        );
    }
}

fn draw_ruler(
    frame: &mut Frame,
    app: &App,
    state: &DisplayState,
    row: &Row,
    values: &[f64],
    scale_max: f64,
    area: Rect,
) {
    let title = format!("{:1$}{2}", "", row.indent as usize, row.title);
    let legend = legend_text(app, state, row, values, scale_max);

    let buf = frame.buffer_mut();
    buf.set_stringn(
        area.x,
        area.y,
        &title,
        area.width as usize,
        Style::default().add_modifier(Modifier::BOLD),
    );
    if !legend.is_empty() && (legend.len() as u16) < area.width {
        let x = area.x + area.width - legend.len() as u16;
        buf.set_stringn(
            x,
            area.y,
            &legend,
            legend.len(),
            Style::default().add_modifier(Modifier::DIM),
        );
    }
}

/// Right-hand side of the ruler. The current value reads the right edge of
/// the window, which is the newest sample when live and the cell under the
/// pause cursor otherwise.
fn legend_text(
    app: &App,
    state: &DisplayState,
    row: &Row,
    values: &[f64],
    scale_max: f64,
) -> String {
    if !presenter::shows_value(state.modes.view) {
        return String::new();
    }
    let current = values.last().copied().unwrap_or(0.0);
    let mut legend = String::new();
    if state.viewport.paused() {
        legend.push_str(&format!("[-{}] ", state.viewport.cols_off));
    }
    legend.push_str(&presenter::format_value(&row.name, current));
    if state.modes.view == ViewMode::All {
        let window_s = values.len() as u64 * app.refresh_ms / 1000;
        legend.push_str(&format!(
            " of {} ({}s)",
            presenter::format_value(&row.name, scale_max),
            window_s
        ));
    }
    legend
}
