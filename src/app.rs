use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::camera::CameraController;
use crate::camera::camera::Camera;
use crate::constants::{
    DEFAULT_SCENE_PATH, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, WINDOW_TITLE,
    resolve_data_path,
};
use crate::gpu::backend::WgpuBackend;
use crate::gpu::context::GpuContext;
use crate::gpu::error::RenderError;
use crate::gpu::pipeline::load_kernel_source;
use crate::input::handler::{self, InputAction};
use crate::model::ObjMeshLoader;
use crate::render::accumulator::AccumulationController;
use crate::render::config::RenderConfig;
use crate::render::scheduler::{FrameScheduler, TickOutcome};
use crate::scene::SceneStore;
use crate::scene::loader::load_scene;
use crate::scene::scene::Scene;

pub fn run(scene_path: Option<String>) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(scene_path);
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    scene_path: Option<String>,
    state: Option<AppState>,
}

impl App {
    fn new(scene_path: Option<String>) -> Self {
        Self {
            scene_path,
            state: None,
        }
    }
}

struct AppState {
    window: Arc<Window>,
    scene_path: Option<PathBuf>,
    store: SceneStore,
    scheduler: FrameScheduler<WgpuBackend>,
    accumulation: AccumulationController,
    camera: Camera,
    controller: CameraController,
    last_frame: Instant,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match AppState::new(event_loop, self.scene_path.as_deref()) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("Failed to initialize: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        let was_captured = state.controller.mouse_captured;
        let action = handler::handle_window_event(&event, &mut state.controller);
        if state.controller.mouse_captured != was_captured {
            state.set_cursor_grabbed(state.controller.mouse_captured);
        }

        match action {
            Some(InputAction::Exit) => {
                event_loop.exit();
                return;
            }
            Some(InputAction::ToggleAccumulation) => state.accumulation.toggle(),
            Some(InputAction::ResetAccumulation) => state.accumulation.mark_dirty(),
            Some(InputAction::ReloadScene) => {
                if let Err(e) = state.reload_scene() {
                    log::error!("Scene reload failed: {e:#}");
                    if e.downcast_ref::<RenderError>().is_some() {
                        event_loop.exit();
                        return;
                    }
                }
            }
            None => {}
        }

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.handle_resize(*size);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = state.update_and_render() {
                    log::error!("Fatal render error: {e}");
                    event_loop.exit();
                    return;
                }
                state.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state
            && let DeviceEvent::MouseMotion { delta: (dx, dy) } = event
        {
            state.controller.accumulate_mouse_delta(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state
            && let Err(e) = state.scheduler.shutdown()
        {
            log::error!("GPU shutdown failed: {e}");
        }
    }
}

impl AppState {
    fn new(event_loop: &ActiveEventLoop, scene_path: Option<&str>) -> Result<Self> {
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title(WINDOW_TITLE)
                    .with_inner_size(PhysicalSize::new(
                        DEFAULT_WINDOW_WIDTH,
                        DEFAULT_WINDOW_HEIGHT,
                    )),
            )?,
        );

        let (scene, scene_path) = match scene_path {
            Some(path) => (load_scene(Path::new(path))?, Some(PathBuf::from(path))),
            None => {
                let default = resolve_data_path(DEFAULT_SCENE_PATH);
                match load_scene(&default) {
                    Ok(scene) => (scene, Some(default)),
                    Err(e) => {
                        log::warn!("{e:#}; starting with an empty scene");
                        (Scene::empty(), None)
                    }
                }
            }
        };

        let config = RenderConfig::from_scene(&scene);
        let store = scene.build_store(&ObjMeshLoader)?;

        let gpu = GpuContext::new(window.clone(), config.vsync)?;
        let kernel = load_kernel_source(Path::new(&config.shader_path))?;
        let backend = WgpuBackend::new(gpu, &store, &kernel)?;
        let scheduler = FrameScheduler::new(backend, &config)?;

        Ok(Self {
            window,
            scene_path,
            store,
            scheduler,
            accumulation: AccumulationController::new(config.accumulate),
            camera: config.initial_camera.clone(),
            controller: CameraController::new(),
            last_frame: Instant::now(),
        })
    }

    fn set_cursor_grabbed(&self, grabbed: bool) {
        use winit::window::CursorGrabMode;
        self.window.set_cursor_visible(!grabbed);
        if grabbed {
            // Locked is unsupported on X11; fall back to confining the cursor.
            if self.window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
                let _ = self.window.set_cursor_grab(CursorGrabMode::Confined);
            }
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        }
    }

    /// Sampled by the scheduler on its next tick.
    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.scheduler
            .backend_mut()
            .set_window_size(size.width, size.height);
        self.scheduler.request_resize();
    }

    /// Replaces geometry, materials and lights. Render settings stay as loaded
    /// at startup.
    fn reload_scene(&mut self) -> Result<()> {
        let path = self
            .scene_path
            .clone()
            .context("No scene file to reload")?;
        let scene = load_scene(&path)?;
        let store = scene.build_store(&ObjMeshLoader)?;
        self.scheduler.backend_mut().upload_scene(&store)?;
        self.store = store;
        self.accumulation.mark_dirty();
        log::info!("Reloaded scene {}", path.display());
        Ok(())
    }

    fn update_and_render(&mut self) -> Result<(), RenderError> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        let moved = self.controller.update(&mut self.camera, dt);
        let rotated = self.controller.apply_mouse_look(&mut self.camera);
        let zoomed = self.controller.apply_zoom(&mut self.camera);
        if moved || rotated || zoomed {
            self.accumulation.mark_dirty();
        }

        let outcome =
            self.scheduler
                .tick(&mut self.accumulation, &self.camera, self.store.lights())?;
        if let TickOutcome::Presented { fps: Some(fps), .. } = outcome {
            self.window.set_title(&format!(
                "{WINDOW_TITLE} | {fps:.1} FPS | {} spp{}",
                self.accumulation.sample_count(),
                if self.accumulation.is_enabled() {
                    ""
                } else {
                    " (accumulation off)"
                }
            ));
        }
        Ok(())
    }
}
