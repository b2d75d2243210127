// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo window setup and event loop.

use crate::nodes::{Constant, Display, Scale, Sum};
use crate::render::Gpu;
use egui::{Color32, Pos2, Rect, Stroke};
use egui_wgpu::wgpu;
use nodeflow::{ConfigError, EguiSurface, Graph, GraphConfig, PinRef, PinUid};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const CONFIG_FILE: &str = "nodeflow.ron";
const GRID_SPACING: f32 = 24.0;
const CANVAS_FILL: Color32 = Color32::from_rgb(30, 30, 34);

/// Demo application errors
#[derive(Debug, Error)]
pub enum DemoError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Result type for demo operations
pub type Result<T> = std::result::Result<T, DemoError>;

/// The graph being edited plus canvas chrome
struct DemoState {
    graph: Graph,
}

impl DemoState {
    fn new() -> Self {
        let mut graph = Graph::with_config(load_config(Path::new(CONFIG_FILE)));
        graph.set_on_node_create(|node| tracing::info!("Created node {:?}", node.title()));
        graph.set_on_link_create(|id, link| {
            tracing::info!("Created link {:?}: {:?} -> {:?}", id, link.source(), link.destination());
        });

        let a = graph.add_node(egui::pos2(40.0, 60.0), Constant::new(1.5));
        let b = graph.add_node(egui::pos2(40.0, 180.0), Constant::new(4.0));
        let scale = graph.add_node(egui::pos2(240.0, 180.0), Scale::new(0.5));
        graph.add_node(egui::pos2(440.0, 100.0), Sum::default());
        let display = graph.add_node(egui::pos2(440.0, 260.0), Display::default());

        graph.create_link(
            PinRef::input(scale, PinUid::new("in")),
            PinRef::output(b, PinUid::new("value")),
        );
        graph.create_link(
            PinRef::output(a, PinUid::new("value")),
            PinRef::input(display, PinUid::new("value")),
        );

        Self { graph }
    }

    fn update(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Nodes: {}", self.graph.node_count()));
                ui.separator();
                ui.label(format!("Links: {}", self.graph.link_count()));
                if let Some(pin) = self.graph.hovered_pin().and_then(|pin| self.graph.pin(pin)) {
                    ui.separator();
                    ui.label(format!("{} ({})", pin.name(), pin.pin_type().name()));
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(CANVAS_FILL))
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                let response = ui.interact(rect, ui.id().with("canvas"), egui::Sense::click_and_drag());
                if response.dragged_by(egui::PointerButton::Middle) {
                    let scroll = self.graph.scroll() + response.drag_delta();
                    self.graph.set_scroll(scroll);
                }

                draw_grid(ui.painter(), rect, self.graph.scroll());
                let mut surface = EguiSurface::with_canvas(ui, rect);
                self.graph.update(&mut surface);

                response.context_menu(|ui| self.add_node_menu(ui));
            });
    }

    fn add_node_menu(&mut self, ui: &mut egui::Ui) {
        ui.label("Add node");
        ui.separator();
        if ui.button("Constant").clicked() {
            self.graph.place_node(Constant::new(1.0));
            ui.close_menu();
        }
        if ui.button("Scale").clicked() {
            self.graph.place_node(Scale::new(2.0));
            ui.close_menu();
        }
        if ui.button("Sum").clicked() {
            self.graph.place_node(Sum::default());
            ui.close_menu();
        }
        if ui.button("Display").clicked() {
            self.graph.place_node(Display::default());
            ui.close_menu();
        }
    }
}

fn load_config(path: &Path) -> GraphConfig {
    match GraphConfig::load(path) {
        Ok(config) => {
            tracing::info!("Using settings from {:?}", path);
            config
        }
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => GraphConfig::default(),
        Err(e) => {
            tracing::warn!("Ignoring {:?}: {e}", path);
            GraphConfig::default()
        }
    }
}

fn draw_grid(painter: &egui::Painter, rect: Rect, scroll: egui::Vec2) {
    let minor = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 60, 60, 100));
    let major = Stroke::new(1.0, Color32::from_rgba_unmultiplied(80, 80, 80, 150));

    let mut x = rect.left() + scroll.x.rem_euclid(GRID_SPACING);
    while x < rect.right() {
        let on_major = ((x - rect.left() - scroll.x) / GRID_SPACING).round() as i64 % 5 == 0;
        let stroke = if on_major { major } else { minor };
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += GRID_SPACING;
    }

    let mut y = rect.top() + scroll.y.rem_euclid(GRID_SPACING);
    while y < rect.bottom() {
        let on_major = ((y - rect.top() - scroll.y) / GRID_SPACING).round() as i64 % 5 == 0;
        let stroke = if on_major { major } else { minor };
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += GRID_SPACING;
    }
}

/// Everything that exists once the window is up
struct DemoRunning {
    window: Arc<Window>,
    gpu: Gpu,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    demo: DemoState,
}

impl DemoRunning {
    fn new(event_loop: &ActiveEventLoop) -> Result<Self> {
        let window_attrs = Window::default_attributes()
            .with_title("nodeflow")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800))
            .with_min_inner_size(winit::dpi::LogicalSize::new(640, 400));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| DemoError::WindowCreation(e.to_string()))?,
        );

        let gpu = Gpu::new(Arc::clone(&window), CANVAS_FILL)?;
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024),
        );

        Ok(Self {
            window,
            gpu,
            egui_ctx,
            egui_state,
            demo: DemoState::new(),
        })
    }
}

/// Main demo application
#[derive(Default)]
pub struct DemoApp {
    running: Option<DemoRunning>,
}

impl DemoApp {
    /// Open the window and run until it is closed
    pub fn run() -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut DemoApp::default())?;
        Ok(())
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match DemoRunning::new(event_loop) {
            Ok(running) => {
                tracing::info!("Window size: {:?}", running.window.inner_size());
                self.running = Some(running);
            }
            Err(e) => {
                tracing::error!("{e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                running.gpu.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| running.demo.update(ctx));

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());

                let pixels_per_point = running.window.scale_factor() as f32;
                match running.gpu.present(&running.egui_ctx, full_output, pixels_per_point) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.gpu.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}
