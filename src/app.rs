use std::time::Instant;

use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::context::{
    ContextKind, LocationContext, LocationContextStore, LocationDetails, ZoomLevel,
    DEFAULT_COUNTY, DEFAULT_COUNTY_CENTER,
};
use crate::data::{BoundaryError, CountyBoundary, WardRecord};
use crate::environment::{EnvironmentalDataProvider, EnvironmentalReading, MockEnvironmentalDataProvider};
use crate::geo::{open_ring, LatLng};
use crate::geolocation::{
    farm_area_label, parse_coordinate, parse_polygon, CoordinateError, Geolocator,
};
use crate::map::{MapRenderer, Viewport};
use crate::panel::{Click, ClickTracker, NavMenu, PanelHeight, PointerId, SheetDrag, SheetOutcome};
use crate::recommend::{recommend, Recommendation, VarietyFilter};
use crate::selection::{Selection, SelectionError, SelectionSession, SpatialMode, UndoOutcome};
use crate::session::{Role, Session, View};
use crate::ui;

/// Pointer id used for the mouse's left button
const MOUSE_POINTER: PointerId = 0;

/// Progress of the boundary fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryStatus {
    Loading,
    Loaded { wards: usize },
    /// Persistent; there is no retry
    Failed(String),
}

/// One-line message under the map
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Keyboard focus
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing `lat, lng` or `lat,lng; lat,lng; ...`
    Coordinates { buffer: String },
    WardPicker { query: String, highlighted: usize },
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Set once a press has moved, so the release is not a click
    dragged: bool,
    screen: Rect,
    pub store: LocationContextStore,
    pub selection: SelectionSession,
    pub session: Session,
    /// Info sheet payload; `None` means the sheet is closed
    pub panel: Option<LocationDetails>,
    pub sheet: SheetDrag,
    pub nav: NavMenu,
    clicks: ClickTracker,
    pub input: InputMode,
    pub boundary_status: BoundaryStatus,
    pub notice: Option<Notice>,
    pub variety: VarietyFilter,
    /// View waiting on the login screen
    pub login_prompt: Option<View>,
    provider: MockEnvironmentalDataProvider,
    geolocator: Box<dyn Geolocator>,
}

impl App {
    pub fn new(
        width: u16,
        height: u16,
        session: Session,
        provider: MockEnvironmentalDataProvider,
        geolocator: Box<dyn Geolocator>,
    ) -> Self {
        let store = LocationContextStore::default();
        let initial = store.current().clone();
        let mut app = Self {
            viewport: Viewport::at_level(initial.center, initial.zoom_hint, 0, 0),
            map_renderer: MapRenderer::new(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            dragged: false,
            screen: Rect::new(0, 0, width, height),
            store,
            selection: SelectionSession::new(),
            session,
            panel: None,
            sheet: SheetDrag::default(),
            nav: NavMenu::default(),
            clicks: ClickTracker::default(),
            input: InputMode::Normal,
            boundary_status: BoundaryStatus::Loading,
            notice: None,
            variety: VarietyFilter::All,
            login_prompt: None,
            provider,
            geolocator,
        };
        app.sync_viewport_size();
        app
    }

    pub fn provider(&self) -> &MockEnvironmentalDataProvider {
        &self.provider
    }

    pub fn context(&self) -> &LocationContext {
        self.store.current()
    }

    /// Update layout when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::new(0, 0, width, height);
        // Handle row moved under the pointer
        self.sheet.abandon();
        self.sync_viewport_size();
    }

    pub fn layout(&self) -> ui::DashboardLayout {
        ui::dashboard_layout(self.screen, self.sheet_height())
    }

    /// Sheet height while it is open
    pub fn sheet_height(&self) -> Option<PanelHeight> {
        self.panel.as_ref().map(|_| self.sheet.height())
    }

    fn sync_viewport_size(&mut self) {
        let inner = self.layout().map_inner;
        // Braille gives 2x4 resolution per character
        self.viewport.width = inner.width as usize * 2;
        self.viewport.height = inner.height as usize * 4;
    }

    fn set_panel(&mut self, panel: Option<LocationDetails>) {
        self.panel = panel;
        self.sync_viewport_size();
    }

    /// Terminal cell to braille pixel inside the map, if the cell is on the map
    fn cell_to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = self.layout().map_inner;
        let inside = col >= inner.x
            && col < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        inside.then(|| ((col - inner.x) as i32 * 2, (row - inner.y) as i32 * 4))
    }

    pub fn cell_to_latlng(&self, col: u16, row: u16) -> Option<LatLng> {
        self.cell_to_pixel(col, row)
            .map(|(px, py)| self.viewport.unproject(px, py))
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // -- context -----------------------------------------------------------

    /// Replace the location context and bring the map along with it
    pub fn set_context(&mut self, context: LocationContext) {
        let context = self.store.set_context(context);
        self.viewport.set_view(context.center, context.zoom_hint);
    }

    /// Info-panel payload for a context
    pub fn details_for(&self, context: &LocationContext) -> LocationDetails {
        let county = self
            .map_renderer
            .county()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| DEFAULT_COUNTY.to_string());

        let (sub_county, extent) = match &context.kind {
            ContextKind::Ward { ward } => (
                self.map_renderer
                    .ward_named(ward)
                    .and_then(|w| w.sub_county.clone()),
                None,
            ),
            ContextKind::Point { buffer_m } => (
                self.map_renderer
                    .ward_at(context.center)
                    .and_then(|w| w.sub_county.clone()),
                Some(format!("{buffer_m:.0} m buffer")),
            ),
            ContextKind::Area {
                vertices, area_ha, ..
            } => (
                self.map_renderer
                    .ward_at(context.center)
                    .and_then(|w| w.sub_county.clone()),
                Some(format!("{area_ha:.2} ha, {} vertices", vertices.len())),
            ),
        };

        LocationDetails {
            name: context.label.clone(),
            kind: context.kind_label(),
            county,
            sub_county,
            coordinates: context.center,
            extent,
            reading: self.provider.reading(context.center),
        }
    }

    pub fn current_reading(&self) -> EnvironmentalReading {
        self.provider.reading(self.context().center)
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        recommend(&self.current_reading(), self.variety)
    }

    pub fn cycle_variety(&mut self) {
        self.variety = self.variety.cycle();
    }

    fn open_context(&mut self, context: LocationContext) {
        let details = self.details_for(&context);
        self.set_context(context);
        self.set_panel(Some(details));
    }

    /// Open a ward by name (ward picker or map click)
    pub fn select_ward(&mut self, name: &str) -> bool {
        let Some(ward) = self.map_renderer.ward_named(name) else {
            return false;
        };
        let context = LocationContext::ward(&ward.name, ward.center, ZoomLevel::WARD);
        if self.selection.is_active() {
            self.selection.cancel();
        }
        // An explicit choice supersedes the probe's way back
        self.store.consume_restore_point();
        self.open_context(context);
        true
    }

    /// Back to the whole county
    pub fn select_county(&mut self) {
        self.selection.cancel();
        self.store.consume_restore_point();
        self.set_context(LocationContext::county());
        self.set_panel(None);
        self.fit_county();
    }

    /// Zoom the map to the county outline, or the default center before data arrives
    pub fn fit_county(&mut self) {
        match self.map_renderer.data_bounds() {
            Some(bbox) => self.viewport.fit_bounds(&bbox),
            None => self
                .viewport
                .set_view(DEFAULT_COUNTY_CENTER, ZoomLevel::COUNTY),
        }
    }

    fn apply_selection(&mut self, selection: Selection, label: Option<String>) {
        self.open_context(LocationContext::from_selection(selection, label));
    }

    // -- spatial modes -----------------------------------------------------

    /// Bind a drawing mode to map clicks; choosing the active mode again cancels it
    pub fn activate_mode(&mut self, mode: SpatialMode) {
        if self.selection.mode() == mode {
            self.cancel();
            return;
        }
        self.store.capture_restore_point(self.panel.clone());
        self.selection.activate(mode);
        self.clicks.reset();
        self.notice = match mode {
            SpatialMode::PointPick => Some(Notice::Info(
                "Click the map to analyze a point.".to_string(),
            )),
            SpatialMode::AreaDraw => Some(Notice::Info(
                "Click to add points, Enter or double-click to finish.".to_string(),
            )),
            SpatialMode::Idle => None,
        };
    }

    /// A single click on the map at a geographic position
    pub fn map_click(&mut self, at: LatLng) {
        match self.selection.mode() {
            SpatialMode::Idle => {
                let ward = self.map_renderer.ward_at(at).map(|w| w.name.clone());
                if let Some(name) = ward {
                    self.select_ward(&name);
                }
            }
            SpatialMode::PointPick => {
                if let Some(selection) = self.selection.click(at) {
                    self.apply_selection(selection, None);
                }
            }
            SpatialMode::AreaDraw => {
                self.selection.click(at);
                self.notice = Some(Notice::Info(format!(
                    "{} point(s) selected",
                    self.selection.draft().len()
                )));
            }
        }
    }

    pub fn map_double_click(&mut self, at: LatLng) {
        if self.selection.mode() == SpatialMode::AreaDraw {
            self.finish_area();
        } else {
            self.map_click(at);
        }
    }

    pub fn finish_area(&mut self) {
        match self.selection.finish() {
            Ok(selection) => {
                self.notice = None;
                self.apply_selection(selection, None);
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    pub fn undo(&mut self) {
        match self.selection.undo() {
            UndoOutcome::Removed { remaining } => {
                self.notice = Some(Notice::Info(format!("{remaining} point(s) selected")));
            }
            UndoOutcome::Exited => self.cancel(),
            UndoOutcome::Ignored => {}
        }
    }

    /// Leave the drawing mode and return to where the probe started, if anywhere
    pub fn cancel(&mut self) {
        self.selection.cancel();
        self.notice = None;
        if let Some(restore) = self.store.consume_restore_point() {
            debug!(label = %restore.context.label, "restoring context");
            self.set_context(restore.context);
            self.set_panel(restore.panel);
        }
    }

    // -- manual entry & GPS -------------------------------------------------

    pub fn begin_coordinate_entry(&mut self) {
        self.input = InputMode::Coordinates {
            buffer: String::new(),
        };
    }

    /// Apply typed coordinates: a point, or a polygon when the input has `;`
    pub fn submit_coordinates(&mut self, input: &str) {
        let result = if input.contains(';') {
            parse_polygon(input).map_err(|e| e.to_string()).and_then(|vertices| {
                // A typed ring may repeat its first point at the end
                let vertices = open_ring(vertices);
                let label = farm_area_label(vertices.len());
                LocationContext::area(vertices, Some(label)).map_err(|e| match e {
                    SelectionError::TooFewVertices { .. } => CoordinateError::TooFewPoints.to_string(),
                    other => other.to_string(),
                })
            })
        } else {
            parse_coordinate(input)
                .map(|at| LocationContext::from_selection(Selection::point(at), None))
                .map_err(|e| e.to_string())
        };

        match result {
            Ok(context) => {
                self.selection.cancel();
                self.store.capture_restore_point(self.panel.clone());
                self.notice = None;
                self.open_context(context);
            }
            Err(message) => self.notice = Some(Notice::Error(message)),
        }
    }

    pub fn use_gps(&mut self) {
        match self.geolocator.current_position() {
            Ok(at) => {
                info!(%at, "GPS fix");
                self.selection.cancel();
                self.store.capture_restore_point(self.panel.clone());
                self.notice = None;
                self.apply_selection(Selection::point(at), Some("GPS Location".to_string()));
            }
            Err(e) => {
                warn!("GPS failed: {e}");
                self.notice = Some(Notice::Error(e.to_string()));
            }
        }
    }

    // -- ward picker ---------------------------------------------------------

    pub fn open_ward_picker(&mut self) {
        if !self.map_renderer.has_wards() {
            self.notice = Some(Notice::Error("Ward boundaries are not loaded.".to_string()));
            return;
        }
        self.input = InputMode::WardPicker {
            query: String::new(),
            highlighted: 0,
        };
    }

    /// Ward names matching the picker query, alphabetical
    pub fn ward_matches(&self, query: &str) -> Vec<&WardRecord> {
        let query = query.to_lowercase();
        let mut matches: Vec<&WardRecord> = self
            .map_renderer
            .wards()
            .iter()
            .filter(|w| w.name.to_lowercase().contains(&query))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }

    // -- text input ----------------------------------------------------------

    pub fn input_char(&mut self, c: char) {
        match &mut self.input {
            InputMode::Normal => {}
            InputMode::Coordinates { buffer } => buffer.push(c),
            InputMode::WardPicker { query, highlighted } => {
                query.push(c);
                *highlighted = 0;
            }
        }
    }

    pub fn input_backspace(&mut self) {
        match &mut self.input {
            InputMode::Normal => {}
            InputMode::Coordinates { buffer } => {
                buffer.pop();
            }
            InputMode::WardPicker { query, highlighted } => {
                query.pop();
                *highlighted = 0;
            }
        }
    }

    /// Move the ward picker highlight, wrapping around
    pub fn input_move(&mut self, down: bool) {
        let InputMode::WardPicker { query, highlighted } = &self.input else {
            return;
        };
        let len = self.ward_matches(query).len();
        if len == 0 {
            return;
        }
        let next = if down {
            (highlighted + 1) % len
        } else {
            (highlighted + len - 1) % len
        };
        if let InputMode::WardPicker { highlighted, .. } = &mut self.input {
            *highlighted = next;
        }
    }

    /// Enter in a text prompt. Coordinate errors keep the prompt open.
    pub fn input_submit(&mut self) {
        match std::mem::take(&mut self.input) {
            InputMode::Normal => {}
            InputMode::Coordinates { buffer } => {
                self.submit_coordinates(&buffer);
                if matches!(self.notice, Some(Notice::Error(_))) {
                    self.input = InputMode::Coordinates { buffer };
                }
            }
            InputMode::WardPicker { query, highlighted } => {
                let name = self
                    .ward_matches(&query)
                    .get(highlighted)
                    .map(|w| w.name.clone());
                if let Some(name) = name {
                    self.select_ward(&name);
                }
            }
        }
    }

    pub fn input_cancel(&mut self) {
        self.input = InputMode::Normal;
    }

    // -- navigation ----------------------------------------------------------

    /// Menu entries for the current role
    pub fn nav_entries(&self) -> Vec<View> {
        self.session.available_views().collect()
    }

    /// Switch views; anything beyond the landing page asks for a login first
    pub fn navigate(&mut self, view: View) {
        self.nav.close();
        if view != View::Landing && !self.session.is_authenticated() {
            self.login_prompt = Some(view);
            return;
        }
        if self.session.navigate(view) {
            self.sync_viewport_size();
        }
    }

    pub fn next_view(&mut self) {
        let entries = self.nav_entries();
        let idx = entries
            .iter()
            .position(|v| *v == self.session.view())
            .map_or(0, |i| (i + 1) % entries.len());
        if let Some(view) = entries.get(idx).copied() {
            self.navigate(view);
        }
    }

    pub fn login(&mut self, role: Role) {
        self.session.login(role);
        let target = self.login_prompt.take().unwrap_or(View::Dashboard);
        self.navigate(target);
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.nav.close();
        self.login_prompt = None;
    }

    // -- boundary data --------------------------------------------------------

    pub fn boundaries_loaded(
        &mut self,
        result: Result<(CountyBoundary, Vec<WardRecord>), BoundaryError>,
    ) {
        match result {
            Ok((county, wards)) => {
                info!(county = %county.name, wards = wards.len(), "boundaries ready");
                self.boundary_status = BoundaryStatus::Loaded { wards: wards.len() };
                self.map_renderer.set_county(county);
                self.map_renderer.set_wards(wards);
                if self.context().label == DEFAULT_COUNTY {
                    self.fit_county();
                }
            }
            Err(e) => {
                warn!("boundary load failed: {e}");
                self.boundary_status = BoundaryStatus::Failed(e.to_string());
            }
        }
    }

    // -- map interaction -------------------------------------------------------

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Left button pressed: either grab the sheet handle or start a map press
    pub fn mouse_down(&mut self, col: u16, row: u16) {
        if self.layout().sheet_handle == Some(row) {
            self.sheet.start(MOUSE_POINTER, i32::from(row));
            return;
        }
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    pub fn mouse_drag(&mut self, col: u16, row: u16) {
        if self.sheet.is_dragging() {
            self.sheet.move_to(MOUSE_POINTER, i32::from(row));
            return;
        }
        if let Some((last_x, last_y)) = self.last_mouse {
            if (last_x, last_y) != (col, row) {
                self.dragged = true;
                // Less sensitive when zoomed out
                let scale = if self.viewport.level() < 8 { 2 } else { 3 };
                self.pan(
                    (last_x as i32 - col as i32) * scale,
                    (last_y as i32 - row as i32) * scale,
                );
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Left button released: finish a sheet drag, or turn a still press into a click
    pub fn mouse_up(&mut self, col: u16, row: u16, at: Instant) {
        if self.sheet.is_dragging() {
            match self.sheet.end(MOUSE_POINTER) {
                SheetOutcome::Closed => self.set_panel(None),
                SheetOutcome::Resized(_) => self.sync_viewport_size(),
                SheetOutcome::Unchanged => {}
            }
            return;
        }
        let pressed = self.last_mouse.take().is_some();
        if !pressed || self.dragged {
            return;
        }
        let Some(position) = self.cell_to_latlng(col, row) else {
            return;
        };
        match self.clicks.register(col, row, at) {
            Click::Single => self.map_click(position),
            Click::Double => self.map_double_click(position),
        }
    }

    pub fn close_panel(&mut self) {
        self.set_panel(None);
    }

    /// Map center formatted for the status line
    pub fn center_coords(&self) -> String {
        self.viewport.center.to_string()
    }
}
