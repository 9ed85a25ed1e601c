mod egui_host;
mod input;
mod timing;

pub use egui_host::EguiFrameOutput;
use egui_host::EguiHost;

use crate::render::{OrbitCamera, PresentOutcome, RenderContext, RenderError};
use crate::ui::{UiAction, UiInput, UiState};
use input::{InputAction, InputState};
use shadelab::config::ViewerConfig;
use shadelab::jobs::ThreadDispatch;
use shadelab::scene::{SceneAssembler, SceneUpdate};
use shadelab::session::{Route, SessionEntry, SessionStore};
use shadelab::shapes::ShapeSelection;
use shadelab::upload::UploadedFile;
use timing::FrameTiming;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const MODEL_EXTENSIONS: &[&str] = &["obj", "gltf", "glb", "stl"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to start loader threads: {0}")]
    Loader(#[source] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub struct App {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    egui: Option<EguiHost>,
    render: Option<RenderContext>,
    scene: SceneAssembler,
    session: SessionStore,
    route: Route,
    ui: UiState,
    ui_wants_keyboard: bool,
    input: InputState,
    camera: OrbitCamera,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    close_requested: bool,
    startup_error: Option<AppError>,
}

impl App {
    fn new(config: ViewerConfig, scene: SceneAssembler, route: Route) -> Self {
        Self {
            timing: FrameTiming::new(config.window_title.clone()),
            config,
            window: None,
            egui: None,
            render: None,
            scene,
            session: SessionStore::new(),
            route: Route::Welcome,
            ui: UiState::new(),
            ui_wants_keyboard: false,
            input: InputState::default(),
            camera: OrbitCamera::default(),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            close_requested: false,
            startup_error: None,
        }
        .with_route(route)
    }

    fn with_route(mut self, route: Route) -> Self {
        self.navigate(route);
        self
    }

    fn navigate(&mut self, route: Route) {
        let dropped = self.session.navigate(&route);
        self.scene
            .discard_uploads(dropped.iter().filter_map(SessionEntry::blob));

        let route = match route {
            Route::Viewer(ShapeSelection::CustomModel) => self.enter_custom_model(),
            Route::Viewer(selection) => {
                // a rejected selection has already been reported
                let _ = self.scene.update(SceneUpdate::SelectShape(selection));
                Route::Viewer(selection)
            }
            other => other,
        };
        if route != self.route {
            log::info!("navigating to {}", route);
        }
        self.route = route;
    }

    /// Opens a freshly staged upload, or returns to a model that is already loaded.
    fn enter_custom_model(&mut self) -> Route {
        let custom = Route::Viewer(ShapeSelection::CustomModel);
        if let Some(upload) = self.session.take_uploaded_model() {
            return match self.scene.open_custom_model(upload) {
                Ok(()) => custom,
                Err(_) => Route::Upload,
            };
        }
        if self.scene.custom_model().is_some() {
            let _ = self
                .scene
                .update(SceneUpdate::SelectShape(ShapeSelection::CustomModel));
            return custom;
        }
        if self.scene.loading_model().is_some() {
            return custom;
        }
        log::warn!("no uploaded model to show; redirecting to the gallery");
        Route::Gallery
    }

    fn pick_file(title: &str, filter: &str, extensions: &[&str]) -> Option<UploadedFile> {
        let path = rfd::FileDialog::new()
            .set_title(title)
            .add_filter(filter, extensions)
            .pick_file()?;
        Self::read_upload(&path)
    }

    fn read_upload(path: &Path) -> Option<UploadedFile> {
        match UploadedFile::from_path(path) {
            Ok(file) => Some(file),
            Err(err) => {
                log::warn!("failed to read {}: {}", path.display(), err);
                None
            }
        }
    }

    fn handle_choose_model(&mut self) {
        let Some(file) = Self::pick_file("Upload a 3D model", "3D models", MODEL_EXTENSIONS) else {
            return;
        };
        if self
            .scene
            .stage_model_upload(file, &mut self.session)
            .is_ok()
        {
            self.navigate(Route::Viewer(ShapeSelection::CustomModel));
        }
    }

    fn handle_choose_texture(&mut self) {
        let Some(file) = Self::pick_file("Upload a texture", "Images", IMAGE_EXTENSIONS) else {
            return;
        };
        let _ = self.scene.upload_texture(file);
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Navigate(route) => self.navigate(route),
            UiAction::Update(update) => {
                let _ = self.scene.update(update);
            }
            UiAction::ChooseModelFile => self.handle_choose_model(),
            UiAction::ChooseTextureFile => self.handle_choose_texture(),
            UiAction::Orbit { yaw, pitch } => self.camera.orbit(yaw, pitch),
            UiAction::Zoom(delta) => self.camera.zoom(delta),
        }
    }

    fn handle_shortcut(&mut self, action: InputAction) {
        let update = match action {
            InputAction::None => return,
            InputAction::ToggleRotation => SceneUpdate::ToggleRotation,
            InputAction::ToggleWireframe => SceneUpdate::ToggleWireframe,
            InputAction::ToggleHelpers => SceneUpdate::ToggleHelpers,
            InputAction::BackToGallery => {
                self.navigate(Route::Gallery);
                return;
            }
        };
        let _ = self.scene.update(update);
    }

    fn status(&self) -> String {
        match self.route {
            Route::Viewer(selection) => {
                let name = match (selection, self.scene.custom_model_name()) {
                    (ShapeSelection::CustomModel, Some(name)) => name.to_string(),
                    _ => self.scene.state().selection.display_name().to_string(),
                };
                format!(
                    "{} ({})",
                    name,
                    self.scene.state().effective_mode().option().display_name
                )
            }
            _ => String::new(),
        }
    }

    fn init_graphics(&mut self, window: &Arc<Window>) -> Result<(), AppError> {
        let render = RenderContext::new(Arc::clone(window))?;
        self.egui = Some(EguiHost::new(window));
        self.render = Some(render);
        self.target_frame_duration = timing::target_frame_duration(window);
        self.next_frame_time = Instant::now();
        Ok(())
    }

    fn render(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let now = Instant::now();

        self.scene.poll();
        let notices = self.scene.take_notices();
        self.ui.push_notices(notices, now);

        let frame = match self.route {
            Route::Viewer(_) => {
                self.scene.tick();
                Some(self.scene.frame())
            }
            _ => None,
        };

        let Some(egui) = self.egui.as_mut() else {
            return;
        };
        let input = UiInput {
            route: self.route,
            state: self.scene.state(),
            frame: frame.as_ref(),
            camera: &self.camera,
            custom_model_name: self.scene.custom_model_name(),
            loading_model: self.scene.loading_model(),
            texture_limit: self.config.texture_upload_limit,
            model_limit: self.config.model_upload_limit,
        };
        let ui = &mut self.ui;
        let mut actions = Vec::new();
        let output = egui.run_ui(&window, |ctx| {
            actions = ui.show(ctx, &input, now);
        });
        self.ui_wants_keyboard = output.wants_keyboard_input;
        if output.repaint_requested {
            self.next_frame_time = now;
        }

        if let Some(render) = self.render.as_mut() {
            if render.present(&output) == PresentOutcome::Fatal {
                self.close_requested = true;
            }
        }

        for action in actions {
            self.apply(action);
        }
        let status = self.status();
        self.timing.update(&window, now, &status);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let [width, height] = self.config.window_size;
        let window_attrs = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.startup_error = Some(err.into());
                event_loop.exit();
                return;
            }
        };
        if let Err(err) = self.init_graphics(&window) {
            self.startup_error = Some(err);
            event_loop.exit();
            return;
        }
        log::info!(
            "window ready: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (self.egui.as_mut(), self.window.as_ref()) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested, shutting down");
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if consumed || self.ui_wants_keyboard || !matches!(self.route, Route::Viewer(_)) {
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                let action = self.input.handle_key(event.physical_key, pressed);
                self.handle_shortcut(action);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(new_size);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } | WindowEvent::Moved(_) => {
                if let Some(window) = &self.window {
                    self.target_frame_duration = timing::target_frame_duration(window);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            event_loop.exit();
            return;
        }
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

/// Opens the viewer window on `route` and runs until it is closed.
pub fn run(config: ViewerConfig, route: Route) -> Result<(), AppError> {
    let dispatch = ThreadDispatch::new(config.loader_threads).map_err(AppError::Loader)?;
    let scene = SceneAssembler::new(config.clone(), Arc::new(dispatch));

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, scene, route);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.startup_error.take() {
        return Err(err);
    }
    let leftovers = app.scene.notices().len();
    if leftovers > 0 {
        log::debug!("{} notice(s) were never shown", leftovers);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadelab::jobs::InlineDispatch;
    use shadelab::scene::NoticeLevel;
    use shadelab::shapes::ShapeId;

    fn app(route: Route) -> App {
        let config = ViewerConfig::default();
        let scene = SceneAssembler::new(config.clone(), Arc::new(InlineDispatch::new()));
        App::new(config, scene, route)
    }

    #[test]
    fn viewer_route_selects_the_shape() {
        let app = app(Route::parse("/shape/torus"));
        assert_eq!(app.route, Route::Viewer(ShapeSelection::Builtin(ShapeId::Torus)));
        assert_eq!(
            app.scene.state().selection,
            ShapeSelection::Builtin(ShapeId::Torus)
        );
    }

    #[test]
    fn custom_model_route_without_upload_goes_to_gallery() {
        let app = app(Route::parse("/shape/customModel"));
        assert_eq!(app.route, Route::Gallery);
    }

    #[test]
    fn staged_upload_opens_in_the_viewer() {
        let mut app = app(Route::Upload);
        let file = UploadedFile::new("tri.obj", "model/obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
        app.scene.stage_model_upload(file, &mut app.session).unwrap();
        app.navigate(Route::Viewer(ShapeSelection::CustomModel));
        assert_eq!(app.route, Route::Viewer(ShapeSelection::CustomModel));

        app.scene.poll();
        assert_eq!(app.scene.state().selection, ShapeSelection::CustomModel);
        assert_eq!(app.status(), "tri.obj (Phong Shading)");
    }

    #[test]
    fn leaving_for_a_shape_mid_load_keeps_that_shape() {
        let mut app = app(Route::Upload);
        let file = UploadedFile::new("tri.obj", "model/obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
        app.scene.stage_model_upload(file, &mut app.session).unwrap();
        app.navigate(Route::Viewer(ShapeSelection::CustomModel));
        app.navigate(Route::Viewer(ShapeSelection::Builtin(ShapeId::Sphere)));

        app.scene.poll();
        assert_eq!(app.route, Route::Viewer(ShapeSelection::Builtin(ShapeId::Sphere)));
        assert_eq!(app.status(), "Sphere (Phong Shading)");
    }

    #[test]
    fn abandoned_upload_is_released() {
        let mut app = app(Route::Upload);
        let file = UploadedFile::new("tri.obj", "model/obj", b"v 0 0 0\n".to_vec());
        app.scene.stage_model_upload(file, &mut app.session).unwrap();
        assert_eq!(app.scene.blobs().len(), 1);

        app.navigate(Route::Gallery);
        assert!(app.scene.blobs().is_empty());
        app.navigate(Route::Viewer(ShapeSelection::CustomModel));
        assert_eq!(app.route, Route::Gallery);
    }

    #[test]
    fn shortcuts_drive_the_scene() {
        let mut app = app(Route::parse("/shape/cube"));
        app.handle_shortcut(InputAction::ToggleWireframe);
        assert!(app.scene.state().wireframe);
        app.handle_shortcut(InputAction::ToggleRotation);
        assert!(app.scene.state().rotation_paused);
        app.handle_shortcut(InputAction::BackToGallery);
        assert_eq!(app.route, Route::Gallery);
        assert!(app.status().is_empty());
    }

    #[test]
    fn notices_can_be_raised_from_the_shell() {
        let mut app = app(Route::Welcome);
        app.scene.notify(NoticeLevel::Warning, "careful");
        assert_eq!(app.scene.take_notices().len(), 1);
    }
}
