mod core;
mod geo;
mod input;
mod playback;
mod ui;

use crate::core::{CollisionRecord, DatasetIndex};
use geo::Topology;
use input::load_csv;
use playback::{PlaybackController, TICK_DELAY};
use ui::{
    FileDialogs, HourHistogramWindow, MapWindow, TransportAction, TransportControls, ViewModel,
    YearTimelineWindow,
};

use imgui::{Condition, Context, FontConfig, FontSource};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin_winit::{DisplayBuilder, GlWindow};
use glow::HasContext;
use raw_window_handle::HasRawWindowHandle;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;
use tracing::{error, info};

/// Object name in the ONS GB boundaries topology. When absent, the first
/// object in the file is used instead.
const GB_REGION_OBJECT: &str = "GBregion";

struct AppState {
    controller: PlaybackController,
    view: ViewModel,
    map: MapWindow,
    timeline: YearTimelineWindow,
    hours: HourHistogramWindow,
    transport: TransportControls,
    data_loaded: bool,
    show_csv_open_pending: bool,
    show_boundaries_open_pending: bool,
    status_message: Option<String>,
    // Window visibility
    show_map: bool,
    show_timeline: bool,
    show_hours: bool,
    // Async loading state
    loading: bool,
    loading_receiver: Option<Receiver<LoadingUpdate>>,
}

/// Messages for async loading
enum LoadingUpdate {
    Complete(Vec<CollisionRecord>),
    Error(String),
}

/// Persistent application settings
#[derive(Serialize, Deserialize)]
struct AppSettings {
    show_map: bool,
    show_timeline: bool,
    show_hours: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            show_map: true,
            show_timeline: true,
            show_hours: true,
        }
    }
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("collision-viz").join("settings.json"))
    }

    fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(contents) = fs::read_to_string(&path) {
                if let Ok(settings) = serde_json::from_str(&contents) {
                    return settings;
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(&path, json);
            }
        }
    }
}

impl AppState {
    fn new() -> Self {
        let settings = AppSettings::load();

        Self {
            controller: PlaybackController::new(DatasetIndex::default(), TICK_DELAY),
            view: ViewModel::default(),
            map: MapWindow::new(),
            timeline: YearTimelineWindow::new(),
            hours: HourHistogramWindow::new(),
            transport: TransportControls::new(),
            data_loaded: false,
            show_csv_open_pending: false,
            show_boundaries_open_pending: false,
            status_message: None,
            show_map: settings.show_map,
            show_timeline: settings.show_timeline,
            show_hours: settings.show_hours,
            loading: false,
            loading_receiver: None,
        }
    }

    fn save_settings(&self) {
        let settings = AppSettings {
            show_map: self.show_map,
            show_timeline: self.show_timeline,
            show_hours: self.show_hours,
        };
        settings.save();
    }

    fn load_collision_file(&mut self, path: &str) {
        self.loading = true;
        self.status_message = Some(format!("Loading {}...", path));

        let path = path.to_string();
        let (tx, rx) = channel();
        self.loading_receiver = Some(rx);

        std::thread::spawn(move || match load_csv(&path) {
            Ok(records) => {
                let _ = tx.send(LoadingUpdate::Complete(records));
            }
            Err(e) => {
                let _ = tx.send(LoadingUpdate::Error(e.to_string()));
            }
        });
    }

    /// Process loading updates from the background thread
    fn process_loading(&mut self) {
        let Some(receiver) = self.loading_receiver.take() else {
            return;
        };

        match receiver.try_recv() {
            Ok(LoadingUpdate::Complete(records)) => {
                self.finish_loading(records);
                self.loading = false;
            }
            Ok(LoadingUpdate::Error(e)) => {
                self.status_message = Some(format!("Failed to load data: {}", e));
                error!("failed to load collision data: {}", e);
                self.loading = false;
            }
            Err(_) => {
                self.loading_receiver = Some(receiver);
            }
        }
    }

    /// Wire a freshly loaded dataset into playback and the chart windows
    fn finish_loading(&mut self, records: Vec<CollisionRecord>) {
        let record_count = records.len();
        let index = DatasetIndex::build(records);
        let year_count = index.len();

        self.timeline.set_series(index.year_series());
        self.transport.set_year_count(year_count);

        self.controller = PlaybackController::new(index, TICK_DELAY);
        self.view = ViewModel::default();
        self.controller.start(Instant::now(), &mut self.view);
        self.data_loaded = true;

        if year_count == 0 {
            self.status_message =
                Some(format!("Loaded {} records, but none had a year", record_count));
        } else {
            self.status_message = Some(format!(
                "Loaded {} records across {} years",
                record_count, year_count
            ));
        }
        info!(records = record_count, years = year_count, "dataset ready");
    }

    fn load_boundaries_file(&mut self, path: &str) {
        let result = fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| Topology::from_slice(&bytes).map_err(|e| e.to_string()));

        match result {
            Ok(topology) => {
                let object = if topology.object_names().any(|n| n == GB_REGION_OBJECT) {
                    GB_REGION_OBJECT.to_string()
                } else {
                    topology.object_names().next().unwrap_or_default().to_string()
                };

                match self.map.set_topology(&topology, &object) {
                    Ok(()) => {
                        self.status_message = Some(format!("Loaded boundaries ({})", object));
                        // redraw the point layer against the new projection
                        if let Some(year) = self.view.current_year() {
                            self.map.update_points(self.controller.index().records_in(year));
                        }
                    }
                    Err(e) => {
                        self.status_message = Some(format!("Failed to read boundaries: {}", e));
                    }
                }
            }
            Err(e) => {
                self.status_message = Some(format!("Failed to load boundaries: {}", e));
                error!("failed to load boundaries: {}", e);
            }
        }
    }

    fn process_file_dialogs(&mut self) {
        if self.show_csv_open_pending {
            if let Some(path) = FileDialogs::open_collision_file() {
                self.load_collision_file(path.to_str().unwrap_or(""));
            }
            self.show_csv_open_pending = false;
        }

        if self.show_boundaries_open_pending {
            if let Some(path) = FileDialogs::open_boundaries_file() {
                self.load_boundaries_file(path.to_str().unwrap_or(""));
            }
            self.show_boundaries_open_pending = false;
        }
    }

    /// Per-frame drive: poll the playback tick and push any year change
    /// into the windows that cache per-year state.
    fn update_playback(&mut self) {
        self.controller.update(Instant::now(), &mut self.view);

        if self.view.take_year_dirty() {
            if let Some(year) = self.view.current_year() {
                self.map.update_points(self.controller.index().records_in(year));
            }
        }

        self.transport.set_playing(self.controller.is_playing());
        // only programmatic changes move the slider; a user drag already
        // shows the value the user set
        if let Some(index) = self.view.take_scrub_sync() {
            self.transport.set_displayed_index(index);
        }
    }

    fn apply_transport_action(&mut self, action: TransportAction) {
        match action {
            TransportAction::None => {}
            TransportAction::TogglePlayPause => {
                self.controller.toggle_play_pause(Instant::now());
            }
            TransportAction::StepBack => {
                self.controller.step_back(&mut self.view);
            }
            TransportAction::StepForward => {
                self.controller.step_forward(&mut self.view);
            }
            TransportAction::Scrub(index) => {
                self.controller.scrub(index, &mut self.view);
            }
        }
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create event loop
    let event_loop = EventLoop::new().expect("Failed to create EventLoop");

    // Build the window and GL display using glutin-winit
    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(
            WindowBuilder::new()
                .with_title("Collision-Viz - GB Fatal Collision Visualization")
                .with_inner_size(winit::dpi::LogicalSize::new(1400.0, 900.0)),
        ))
        .build(
            &event_loop,
            glutin::config::ConfigTemplateBuilder::new(),
            |mut iter| iter.next().unwrap(),
        )
        .expect("Failed to create window and display");

    let window = window.expect("Failed to create window");
    let gl_display = gl_config.display();

    let context = unsafe {
        gl_display.create_context(
            &gl_config,
            &glutin::context::ContextAttributesBuilder::new()
                .build(Some(window.raw_window_handle())),
        )
    }
    .expect("Failed to create GL context");

    let attrs = window.build_surface_attributes(
        glutin::surface::SurfaceAttributesBuilder::<glutin::surface::WindowSurface>::new(),
    );

    let surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
        .expect("Failed to create surface");

    let context = context
        .make_current(&surface)
        .expect("Failed to make context current");

    let gl = unsafe {
        glow::Context::from_loader_function(|ptr| {
            gl_display.get_proc_address(&std::ffi::CString::new(ptr).unwrap()) as *const _
        })
    };

    // Set up imgui
    let mut imgui = Context::create();
    imgui.set_log_filename(None::<std::path::PathBuf>);

    // Persist window layout under the user config dir
    let ini_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("collision-viz")
        .join("layout.ini");
    if let Some(parent) = ini_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    imgui.set_ini_filename(Some(ini_path));

    // Enable docking
    imgui.io_mut().config_flags |= imgui::ConfigFlags::DOCKING_ENABLE;

    // Configure fonts
    let hidpi_factor = window.scale_factor();
    let font_size = (14.0 * hidpi_factor) as f32;
    imgui.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            size_pixels: font_size,
            ..FontConfig::default()
        }),
    }]);
    imgui.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;

    // Set up platform and renderer
    let mut platform = WinitPlatform::init(&mut imgui);
    platform.attach_window(imgui.io_mut(), &window, HiDpiMode::Default);

    let mut renderer = imgui_glow_renderer::AutoRenderer::initialize(gl, &mut imgui)
        .expect("Failed to initialize renderer");

    // Second glow context for clearing (both reference the same GL context)
    let gl_clear = unsafe {
        glow::Context::from_loader_function(|ptr| {
            gl_display.get_proc_address(&std::ffi::CString::new(ptr).unwrap()) as *const _
        })
    };

    let mut state = AppState::new();
    let mut last_frame_time = Instant::now();
    let mut last_settings_save = Instant::now();

    event_loop
        .run(move |event, window_target| {
            match event {
                Event::NewEvents(_) => {
                    let now = Instant::now();
                    imgui.io_mut().update_delta_time(now - last_frame_time);
                    last_frame_time = now;
                }
                Event::AboutToWait => {
                    state.process_file_dialogs();
                    state.process_loading();
                    state.update_playback();

                    // Save settings periodically (every 30 seconds)
                    if last_settings_save.elapsed().as_secs() >= 30 {
                        state.save_settings();
                        last_settings_save = Instant::now();
                    }

                    platform
                        .prepare_frame(imgui.io_mut(), &window)
                        .expect("Failed to prepare frame");
                    window.request_redraw();
                }
                Event::WindowEvent {
                    event: WindowEvent::RedrawRequested,
                    ..
                } => {
                    let ui = imgui.new_frame();

                    ui.main_menu_bar(|| {
                        ui.menu("File", || {
                            if ui.menu_item("Open Collision Data...") {
                                state.show_csv_open_pending = true;
                            }
                            if ui.menu_item("Load GB Boundaries...") {
                                state.show_boundaries_open_pending = true;
                            }
                            ui.separator();
                            if ui.menu_item("Exit") {
                                window_target.exit();
                            }
                        });

                        ui.menu("Playback", || {
                            let label = if state.controller.is_playing() {
                                "Pause"
                            } else {
                                "Play"
                            };
                            if ui.menu_item(label) {
                                state.apply_transport_action(TransportAction::TogglePlayPause);
                            }
                            if ui.menu_item("Step Back") {
                                state.apply_transport_action(TransportAction::StepBack);
                            }
                            if ui.menu_item("Step Forward") {
                                state.apply_transport_action(TransportAction::StepForward);
                            }
                        });

                        ui.menu("View", || {
                            if ui.menu_item("Map") {
                                state.show_map = !state.show_map;
                            }
                            if ui.menu_item("Collisions by Year") {
                                state.show_timeline = !state.show_timeline;
                            }
                            if ui.menu_item("Hourly Distribution") {
                                state.show_hours = !state.show_hours;
                            }
                        });
                    });

                    // Status bar
                    let window_size = window.inner_size();
                    ui.set_cursor_pos([
                        0.0,
                        window_size.height as f32 / hidpi_factor as f32 - 25.0,
                    ]);
                    ui.child_window("Status")
                        .size([window_size.width as f32 / hidpi_factor as f32, 25.0])
                        .build(|| {
                            if state.loading {
                                ui.text_colored([1.0, 0.8, 0.3, 1.0], "Loading...");
                            } else if let Some(ref msg) = state.status_message {
                                ui.text(msg);
                            } else if state.data_loaded {
                                let years = state.controller.index().len();
                                ui.text(format!(
                                    "Records: {} | Years: {} | Playing: {}",
                                    state.controller.index().record_count(),
                                    years,
                                    state.controller.is_playing()
                                ));
                            } else {
                                ui.text(
                                    "Open a collision CSV to begin (File > Open Collision Data...)",
                                );
                            }
                        });

                    ui.dockspace_over_main_viewport();

                    if state.show_map {
                        let labels = state
                            .view
                            .current_year()
                            .zip(state.view.aggregate().map(|a| a.total));
                        state.map.render(ui, &mut state.show_map, labels);
                    }

                    if state.show_timeline {
                        state.timeline.render(
                            ui,
                            &mut state.show_timeline,
                            state.view.current_year(),
                        );
                    }

                    if state.show_hours {
                        let mut open = state.show_hours;
                        state.hours.render(ui, &mut open, state.view.aggregate());
                        state.show_hours = open;
                    }

                    // Transport controls in their own dockable strip
                    let mut action = TransportAction::None;
                    ui.window("Transport")
                        .size([1380.0, 70.0], Condition::FirstUseEver)
                        .position([10.0, 790.0], Condition::FirstUseEver)
                        .build(|| {
                            action = state.transport.render(ui, state.view.current_year());
                        });
                    state.apply_transport_action(action);

                    // Prepare and render
                    platform.prepare_render(ui, &window);
                    let draw_data = imgui.render();

                    unsafe {
                        gl_clear.clear_color(0.1, 0.1, 0.1, 1.0);
                        gl_clear.clear(glow::COLOR_BUFFER_BIT);
                    }

                    renderer.render(draw_data).expect("Rendering failed");
                    surface
                        .swap_buffers(&context)
                        .expect("Failed to swap buffers");
                }
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    state.save_settings();
                    window_target.exit();
                }
                _ => {}
            }

            platform.handle_event(imgui.io_mut(), &window, &event);
        })
        .expect("EventLoop error");
}
