use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tokio::runtime::Runtime;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use seedmap::app::{App, InputMode};
use seedmap::config::{load_app_config, AppConfig};
use seedmap::data::{BoundaryClient, BoundaryError, CountyBoundary, WardRecord};
use seedmap::environment::MockEnvironmentalDataProvider;
use seedmap::geolocation::ConfiguredGeolocator;
use seedmap::selection::SpatialMode;
use seedmap::session::{LocalStore, Role, Session, View};
use seedmap::ui;

type BoundaryResult = Result<(CountyBoundary, Vec<WardRecord>), BoundaryError>;

fn main() -> Result<()> {
    let config = load_app_config()?;
    init_logging(&config)?;
    info!(county = %config.county, api = %config.api_base_url, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let boundaries = spawn_boundary_load(&runtime, &config);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config, boundaries);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        error!("exited with error: {e:#}");
    }
    result
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter '{}'", config.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Fetch county and wards concurrently; the UI polls the receiver each frame
fn spawn_boundary_load(runtime: &Runtime, config: &AppConfig) -> oneshot::Receiver<BoundaryResult> {
    let (tx, rx) = oneshot::channel();
    let base_url = config.api_base_url.clone();
    let county = config.county.clone();
    runtime.spawn(async move {
        let result = async {
            let client = BoundaryClient::new(&base_url, &county)?;
            let (boundary, wards) =
                tokio::try_join!(client.load_county_boundary(), client.load_wards())?;
            Ok::<_, BoundaryError>((boundary, wards))
        }
        .await;
        // Receiver gone means the UI already quit
        let _ = tx.send(result);
    });
    rx
}

/// Keys for the sign-in screen
fn handle_login_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('u') | KeyCode::Char('U') => app.login(Role::User),
        KeyCode::Char('a') | KeyCode::Char('A') => app.login(Role::Admin),
        KeyCode::Esc => app.login_prompt = None,
        KeyCode::Char('q') => app.quit(),
        _ => {}
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    let entries = app.nav_entries();
    match key.code {
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => app.nav.next(entries.len()),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => app.nav.prev(entries.len()),
        KeyCode::Enter => {
            if let Some(view) = app.nav.choose(&entries) {
                app.navigate(view);
            }
        }
        KeyCode::Esc | KeyCode::Char('m') => app.nav.close(),
        _ => {}
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_cancel(),
        KeyCode::Enter => app.input_submit(),
        KeyCode::Backspace => app.input_backspace(),
        KeyCode::Down => app.input_move(true),
        KeyCode::Up => app.input_move(false),
        KeyCode::Char(c) => app.input_char(c),
        _ => {}
    }
}

/// Keys that work in every view
fn handle_global_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('m') => app.nav.toggle(),
        KeyCode::Tab => app.next_view(),
        KeyCode::Char('X') => app.logout(),
        _ => return false,
    }
    true
}

fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Selection
        KeyCode::Char('p') => app.activate_mode(SpatialMode::PointPick),
        KeyCode::Char('a') => app.activate_mode(SpatialMode::AreaDraw),
        KeyCode::Enter => app.finish_area(),
        KeyCode::Backspace => app.undo(),
        KeyCode::Esc => {
            if app.selection.is_active() || app.store.restore_point().is_some() {
                app.cancel();
            } else {
                app.close_panel();
            }
        }
        KeyCode::Char('w') => app.open_ward_picker(),
        KeyCode::Char(':') => app.begin_coordinate_entry(),
        KeyCode::Char('g') => app.use_gps(),
        KeyCode::Char('0') => app.select_county(),
        KeyCode::Char('r') => app.fit_county(),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_county(),
        KeyCode::Char('y') | KeyCode::Char('Y') => app.map_renderer.toggle_wards(),
        KeyCode::Char('n') | KeyCode::Char('N') => app.map_renderer.toggle_labels(),
        KeyCode::Char('o') | KeyCode::Char('O') => app.map_renderer.cycle_overlay(),
        KeyCode::Char('V') => app.cycle_variety(),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.login_prompt.is_some() {
        return handle_login_key(app, key);
    }
    if app.nav.is_open() {
        return handle_menu_key(app, key);
    }
    if app.input != InputMode::Normal {
        return handle_input_key(app, key);
    }
    if handle_global_key(app, key) {
        return;
    }
    match app.session.view() {
        View::Landing => {
            if key.code == KeyCode::Enter {
                app.navigate(View::Dashboard);
            }
        }
        View::Dashboard => handle_map_key(app, key),
        View::Recommendations | View::Explorer => {
            if key.code == KeyCode::Char('V') {
                app.cycle_variety();
            }
        }
        View::Admin => {}
    }
}

/// Mouse only drives the dashboard map and info sheet
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    let map_has_focus = app.session.view() == View::Dashboard
        && app.login_prompt.is_none()
        && !app.nav.is_open()
        && app.input == InputMode::Normal;
    if !map_has_focus {
        return;
    }

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.mouse_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => {
            app.mouse_up(mouse.column, mouse.row, Instant::now())
        }
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    config: &AppConfig,
    boundaries: oneshot::Receiver<BoundaryResult>,
) -> Result<()> {
    let size = terminal.size()?;
    let session = Session::restore(LocalStore::open_or_default(&config.state_file));
    let mut app = App::new(
        size.width,
        size.height,
        session,
        MockEnvironmentalDataProvider::new(config.data_seed),
        Box::new(ConfiguredGeolocator::new(config.gps)),
    );
    let mut pending = Some(boundaries);

    // Main loop
    loop {
        if let Some(rx) = pending.as_mut() {
            match rx.try_recv() {
                Ok(result) => {
                    app.boundaries_loaded(result);
                    pending = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => {
                    error!("boundary loader dropped without a result");
                    pending = None;
                }
            }
        }

        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("shutting down");
    Ok(())
}
