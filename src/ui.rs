use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Sparkline, Table, Widget, Wrap},
    Frame,
};

use crate::app::{App, BoundaryStatus, InputMode, Notice};
use crate::braille::BrailleCanvas;
use crate::context::LocationDetails;
use crate::environment::{EnvironmentalDataProvider, SOIL_TYPES};
use crate::map::{MapLayers, SelectionOverlay, OVERLAY_BANDS};
use crate::panel::PanelHeight;
use crate::recommend::CATALOG;
use crate::selection::SpatialMode;
use crate::session::{Role, View};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Overlay band colors, low to high
const BAND_COLORS: [Color; OVERLAY_BANDS] = [Color::Red, Color::Yellow, Color::LightGreen, Color::Green];

/// Screen regions of the map dashboard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardLayout {
    pub header: Rect,
    /// Bordered map block
    pub map: Rect,
    /// Map drawing area inside the border
    pub map_inner: Rect,
    pub sheet: Option<Rect>,
    /// Row of the sheet's drag handle (its top border)
    pub sheet_handle: Option<u16>,
    pub status: Rect,
}

/// Split the screen; shared by rendering and mouse hit-testing
pub fn dashboard_layout(area: Rect, sheet: Option<PanelHeight>) -> DashboardLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Map + sheet
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let body = chunks[1];

    let (map, sheet_area) = match sheet {
        Some(height) => {
            let rows = height.rows(body.height).min(body.height.saturating_sub(3));
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(rows)])
                .split(body);
            (split[0], (rows > 0).then_some(split[1]))
        }
        None => (body, None),
    };

    DashboardLayout {
        header: chunks[0],
        map,
        map_inner: Block::default().borders(Borders::ALL).inner(map),
        sheet: sheet_area,
        sheet_handle: sheet_area.map(|s| s.y),
        status: chunks[2],
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if let Some(target) = app.login_prompt {
        render_login(frame, target, area);
        return;
    }

    match app.session.view() {
        View::Landing => render_landing(frame, app, area),
        View::Dashboard => render_dashboard(frame, app),
        View::Recommendations => with_header(frame, app, area, render_recommendations),
        View::Explorer => with_header(frame, app, area, render_explorer),
        View::Admin => with_header(frame, app, area, render_admin),
    }

    if app.nav.is_open() {
        render_nav_menu(frame, app, area);
    }
    match &app.input {
        InputMode::Normal => {}
        InputMode::Coordinates { buffer } => render_coordinate_input(frame, buffer, area),
        InputMode::WardPicker { query, highlighted } => {
            render_ward_picker(frame, app, query, *highlighted, area)
        }
    }
}

fn with_header(frame: &mut Frame, app: &App, area: Rect, body: fn(&mut Frame, &App, Rect)) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    render_header(frame, app, chunks[0]);
    body(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            " SmartSeed ",
            Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", app.session.view().title()), Style::default().fg(Color::Green)),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.context().describe(), Style::default().fg(Color::Cyan)),
    ];

    match &app.boundary_status {
        BoundaryStatus::Loading => spans.push(Span::styled(
            "  loading boundaries…",
            Style::default().fg(Color::DarkGray),
        )),
        BoundaryStatus::Loaded { .. } => {}
        BoundaryStatus::Failed(_) => spans.push(Span::styled(
            "  ⚠ could not load ward boundaries",
            Style::default().fg(Color::Red),
        )),
    }

    if let Some(role) = app.session.role() {
        spans.push(Span::styled(
            format!(
                "  [{}]",
                match role {
                    Role::User => "user",
                    Role::Admin => "admin",
                }
            ),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_dashboard(frame: &mut Frame, app: &App) {
    let layout = app.layout();
    render_header(frame, app, layout.header);
    render_map(frame, app, &layout);
    if let (Some(sheet), Some(details)) = (layout.sheet, app.panel.as_ref()) {
        render_info_sheet(frame, app, details, sheet);
    }
    render_status_bar(frame, app, layout.status);
}

fn render_map(frame: &mut Frame, app: &App, layout: &DashboardLayout) {
    let mode = app.selection.mode();
    let mut title = vec![Span::styled(
        format!(" {} ", app.context().label),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if mode != SpatialMode::Idle {
        title.push(Span::styled(
            format!("[{} mode] ", mode.label()),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(layer) = app.map_renderer.settings.overlay {
        title.push(Span::styled(
            format!("[{}] ", layer.name()),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(title));
    let inner = layout.map_inner;
    frame.render_widget(block, layout.map);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let selection = SelectionOverlay {
        context: app.context(),
        draft: app.selection.draft(),
    };
    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &selection,
        app.provider(),
    );

    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let inside = col >= inner.x
            && col < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let rows = canvas.height().min(area.height as usize);
        let cols = canvas.width().min(area.width as usize);
        for cy in 0..rows {
            for cx in 0..cols {
                if let Some(ch) = canvas.glyph(cx, cy) {
                    buf[(area.x + cx as u16, area.y + cy as u16)]
                        .set_char(ch)
                        .set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        for (canvas, color) in self.layers.overlay.iter().zip(BAND_COLORS) {
            Self::render_layer(canvas, color, area, buf);
        }
        Self::render_layer(&self.layers.wards, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.county, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.focus, Color::Yellow, area, buf);
        Self::render_layer(&self.layers.draft, Color::Magenta, area, buf);

        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - *lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + *lx + i as u16, area.y + *ly)]
                    .set_char(ch)
                    .set_style(label_style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

fn suitability_color(score: u32) -> Color {
    match score {
        85.. => Color::Green,
        75..=84 => Color::LightGreen,
        _ => Color::Yellow,
    }
}

fn bar(value: u32, max: u32, width: usize) -> String {
    let filled = (value.min(max) as usize * width) / max.max(1) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn render_info_sheet(frame: &mut Frame, app: &App, details: &LocationDetails, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);
    let r = &details.reading;

    let mut lines = vec![Line::from(vec![
        Span::styled(details.name.clone(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", details.kind), label),
    ])];

    let mut place = vec![Span::styled(details.county.clone(), value)];
    if let Some(sub) = &details.sub_county {
        place.push(Span::styled(format!(" · {sub}"), value));
    }
    place.push(Span::styled(format!("  {}", details.coordinates), label));
    if let Some(extent) = &details.extent {
        place.push(Span::styled(format!("  {extent}"), Style::default().fg(Color::Magenta)));
    }
    lines.push(Line::from(place));

    lines.push(Line::from(vec![
        Span::styled("Suitability ", label),
        Span::styled(bar(r.suitability, 100, 20), Style::default().fg(suitability_color(r.suitability))),
        Span::styled(format!(" {}%", r.suitability), value),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Rainfall ", label),
        Span::styled(format!("{}mm", r.rainfall_mm), value),
        Span::styled("  Temp ", label),
        Span::styled(format!("{}°C", r.temperature_c), value),
        Span::styled("  NDVI ", label),
        Span::styled(format!("{:.2}", r.ndvi), value),
        Span::styled("  Soil ", label),
        Span::styled(r.soil_type, value),
    ]));

    lines.push(Line::from(Span::styled("Recommended varieties", label)));
    for (rank, rec) in app.recommendations().iter().take(3).enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!(" {}. {:<8}", rank + 1, rec.variety.name), value),
            Span::styled(bar(rec.score, 100, 10), Style::default().fg(suitability_color(rec.score))),
            Span::styled(format!(" {}%  {}", rec.score, rec.variety.company), label),
        ]));
    }

    let drag_hint = if app.sheet.is_dragging() {
        format!(" ↕ {} ", app.sheet.offset())
    } else {
        " ━━━ ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(Line::from(drag_hint).centered());

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.notice {
        Some(Notice::Error(msg)) => Line::from(Span::styled(format!(" {msg}"), Style::default().fg(Color::Red))),
        Some(Notice::Info(msg)) => Line::from(Span::styled(format!(" {msg}"), Style::default().fg(Color::Yellow))),
        None => {
            let settings = &app.map_renderer.settings;
            let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
                Span::styled(
                    if on { on_text } else { off_text },
                    Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
                )
            };
            let hints = match app.selection.mode() {
                SpatialMode::Idle if app.store.restore_point().is_some() => {
                    " | Esc:back p:point a:area w:ward ::coords g:gps m:menu q:quit"
                }
                SpatialMode::Idle => " | p:point a:area w:ward ::coords g:gps o:overlay m:menu q:quit",
                SpatialMode::PointPick => " | click:pick Esc:cancel",
                SpatialMode::AreaDraw => " | click:add Enter:finish Bksp:undo Esc:cancel",
            };
            Line::from(vec![
                Span::styled(" Zoom ", Style::default().fg(Color::DarkGray)),
                Span::styled(app.viewport.level().to_string(), Style::default().fg(Color::Yellow)),
                Span::raw(" "),
                toggle(settings.show_county, "[B]county ", "[b]county "),
                toggle(settings.show_wards, "[Y]wards ", "[y]wards "),
                toggle(settings.show_labels, "[N]ames ", "[n]ames "),
                Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
                Span::styled(hints, Style::default().fg(Color::DarkGray)),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_landing(frame: &mut Frame, app: &App, area: Rect) {
    let green = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("SmartSeed", green)).centered(),
        Line::from("Maize seed recommendations for Nandi County").centered(),
        Line::from(""),
        Line::from("Pick a ward, a farm point, or draw your plot on the map to see").centered(),
        Line::from("suitability, rainfall and the varieties that fit best.").centered(),
        Line::from(""),
        Line::from(Span::styled("Enter: open the map   m: menu   q: quit", dim)).centered(),
    ];
    if let BoundaryStatus::Failed(msg) = &app.boundary_status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("Could not load boundaries: {msg}"), Style::default().fg(Color::Red))).centered());
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_login(frame: &mut Frame, target: View, area: Rect) {
    let popup = centered_rect(48, 7, area);
    frame.render_widget(Clear, popup);
    let lines = vec![
        Line::from(format!("Sign in to open {}", target.title())),
        Line::from(""),
        Line::from(vec![
            Span::styled("u", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(": farmer / user    "),
            Span::styled("a", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(": admin"),
        ]),
        Line::from(Span::styled("Esc: back", Style::default().fg(Color::DarkGray))),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Sign in ")
        .border_style(Style::default().fg(Color::Green));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn render_recommendations(frame: &mut Frame, app: &App, area: Rect) {
    let recs = app.recommendations();
    let rows = recs.iter().enumerate().map(|(rank, rec)| {
        let v = rec.variety;
        Row::new(vec![
            format!("{}", rank + 1),
            v.name.to_string(),
            v.company.to_string(),
            format!("{} {}%", bar(rec.score, 100, 10), rec.score),
            v.maturity.to_string(),
            v.yield_range.to_string(),
            v.traits.join(", "),
        ])
        .style(Style::default().fg(suitability_color(rec.score)))
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(22),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["#", "Variety", "Company", "Score", "Maturity", "Yield", "Traits"])
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} · {} (V: change) ", app.context().label, app.variety.label())),
    );
    frame.render_widget(table, area);
}

fn render_explorer(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    let r = app.current_reading();
    let summary = vec![
        Line::from(format!(
            "Suitability {}%   Rainfall {}mm   Temperature {}°C   NDVI {:.2}",
            r.suitability, r.rainfall_mm, r.temperature_c, r.ndvi
        )),
        Line::from(format!("Soil {}   Elevation {}m", r.soil_type, r.elevation_m)),
    ];
    frame.render_widget(
        Paragraph::new(summary).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", app.context().describe())),
        ),
        chunks[0],
    );

    let monthly = app.provider().monthly_rainfall(app.context().center);
    let data: Vec<u64> = monthly.iter().map(|&mm| u64::from(mm)).collect();
    let peak = monthly
        .iter()
        .enumerate()
        .max_by_key(|(_, mm)| **mm)
        .map(|(i, mm)| format!("peak {} {mm}mm", MONTHS[i]))
        .unwrap_or_default();
    frame.render_widget(
        Sparkline::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Monthly rainfall, Jan-Dec ({peak}) ")),
            )
            .data(&data)
            .style(Style::default().fg(Color::Blue)),
        chunks[1],
    );

    let rows = app.map_renderer.wards().iter().map(|w| {
        let r = app.provider().reading(w.center);
        Row::new(vec![
            w.name.clone(),
            format!("{}%", r.suitability),
            format!("{}mm", r.rainfall_mm),
            format!("{}°C", r.temperature_c),
            format!("{:.2}", r.ndvi),
            r.soil_type.to_string(),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["Ward", "Suit.", "Rain", "Temp", "NDVI", "Soil"])
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Wards "));
    frame.render_widget(table, chunks[2]);
}

fn render_admin(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    let wards = app.map_renderer.wards();
    let population: u64 = wards.iter().filter_map(|w| w.population).sum();
    let status = match &app.boundary_status {
        BoundaryStatus::Loading => "loading".to_string(),
        BoundaryStatus::Loaded { wards } => format!("loaded ({wards} wards)"),
        BoundaryStatus::Failed(msg) => format!("failed: {msg}"),
    };
    let overview = vec![
        Line::from(format!(
            "Wards {}   Recorded population {}   Varieties {}   Soil classes {}",
            wards.len(),
            population,
            CATALOG.len(),
            SOIL_TYPES.len()
        )),
        Line::from(format!("Boundary data: {status}")),
        Line::from(format!("Context revision {}", app.store.revision())),
    ];
    frame.render_widget(
        Paragraph::new(overview).block(Block::default().borders(Borders::ALL).title(" Overview ")),
        chunks[0],
    );

    let rows = wards.iter().map(|w| {
        Row::new(vec![
            w.name.clone(),
            w.sub_county.clone().unwrap_or_else(|| "-".to_string()),
            w.population.map_or_else(|| "-".to_string(), |p| p.to_string()),
            w.elevation.clone().unwrap_or_else(|| "-".to_string()),
            w.center.to_string(),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(16),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(24),
        ],
    )
    .header(
        Row::new(vec!["Ward", "Sub-county", "Population", "Elevation", "Center"])
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Ward registry "));
    frame.render_widget(table, chunks[1]);
}

fn render_nav_menu(frame: &mut Frame, app: &App, area: Rect) {
    let entries = app.nav_entries();
    let popup = Rect {
        x: area.width.saturating_sub(28),
        y: 1,
        width: 28.min(area.width),
        height: (entries.len() as u16 + 2).min(area.height.saturating_sub(1)),
    };
    let items: Vec<ListItem> = entries
        .iter()
        .map(|v| {
            let marker = if *v == app.session.view() { "● " } else { "  " };
            ListItem::new(format!("{marker}{}", v.title()))
        })
        .collect();

    let mut state = ListState::default();
    if let crate::panel::NavMenu::Open { highlighted } = app.nav {
        state.select(Some(highlighted));
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Menu "))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Green));

    frame.render_widget(Clear, popup);
    frame.render_stateful_widget(list, popup, &mut state);
}

fn render_coordinate_input(frame: &mut Frame, buffer: &str, area: Rect) {
    let popup = centered_rect(60, 6, area);
    frame.render_widget(Clear, popup);
    let lines = vec![
        Line::from(vec![Span::raw("> "), Span::styled(format!("{buffer}▏"), Style::default().fg(Color::White))]),
        Line::from(""),
        Line::from(Span::styled(
            "lat, lng  for a point   lat,lng; lat,lng; lat,lng  for a farm area",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Enter coordinates (Enter: apply, Esc: close) ")
        .border_style(Style::default().fg(Color::Green));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn render_ward_picker(frame: &mut Frame, app: &App, query: &str, highlighted: usize, area: Rect) {
    let popup = centered_rect(40, 16, area);
    frame.render_widget(Clear, popup);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(popup);

    frame.render_widget(
        Paragraph::new(format!("{query}▏")).block(Block::default().borders(Borders::ALL).title(" Select ward ")),
        chunks[0],
    );

    let matches = app.ward_matches(query);
    let items: Vec<ListItem> = matches
        .iter()
        .map(|w| {
            let sub = w.sub_county.as_deref().unwrap_or("");
            ListItem::new(Line::from(vec![
                Span::raw(w.name.clone()),
                Span::styled(format!("  {sub}"), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();
    let mut state = ListState::default();
    if !matches.is_empty() {
        state.select(Some(highlighted.min(matches.len() - 1)));
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Green));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
