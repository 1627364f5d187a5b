mod egui_host;
mod input;
mod timing;

pub use egui_host::EguiFrameOutput;

use crate::ai::LightingAssistant;
use crate::project::{thumbnail, CameraPose, ProjectStore};
use crate::render::{pick, CameraController, CameraMovement, RenderContext};
use crate::scene::{SceneState, TextureRef};
use crate::ui::{self, UiAction, UiState};
use egui_host::EguiHost;
use glam::Vec3;
use input::{InputAction, InputState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use timing::FrameTiming;
use uuid::Uuid;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Maquette";

const ORBIT_SENSITIVITY: f32 = 0.008;
const PAN_SENSITIVITY: f32 = 0.01;
const ZOOM_STEP: f32 = 0.5;

pub struct App {
    window: Option<Arc<Window>>,
    render: Option<RenderContext>,
    egui_host: Option<EguiHost>,

    scene: SceneState,
    camera: CameraController,
    input: InputState,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,

    ui: UiState,
    store: Option<ProjectStore>,
    active_project: Option<(Uuid, String)>,
    assistant: LightingAssistant,

    mouse_pos: Option<(f32, f32)>,
    orbiting: bool,
    panning: bool,
    window_focused: bool,
}

impl App {
    fn new() -> Self {
        let mut ui = UiState::new();
        let store = match ProjectStore::open(store_path()) {
            Ok(store) => {
                log::info!("Project store at {:?}", store.path());
                Some(store)
            }
            Err(err) => {
                log::warn!("Project store unavailable: {}", err);
                ui.toasts.error(format!("Project store unavailable: {}", err));
                None
            }
        };

        let pose = CameraPose::default();
        Self {
            window: None,
            render: None,
            egui_host: None,
            scene: SceneState::new(),
            camera: CameraController::new(Vec3::from_array(pose.position), pose.yaw, pose.pitch),
            input: InputState::default(),
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            ui,
            store,
            active_project: None,
            assistant: LightingAssistant::from_env(),
            mouse_pos: None,
            orbiting: false,
            panning: false,
            window_focused: true,
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn update_camera(&mut self) {
        let movement = CameraMovement {
            move_forward: self.input.move_forward,
            move_backward: self.input.move_backward,
            move_left: self.input.move_left,
            move_right: self.input.move_right,
            move_up: self.input.move_up,
            move_down: self.input.move_down,
            aim_left: self.input.aim_left,
            aim_right: self.input.aim_right,
            aim_up: self.input.aim_up,
            aim_down: self.input.aim_down,
        };
        self.camera.update_movement(&movement, self.timing.frame_dt);
    }

    /// The orbit pivot: the selected object if there is one, otherwise
    /// the center of the scene.
    fn orbit_pivot(&self) -> Vec3 {
        self.scene
            .selected()
            .and_then(|id| self.scene.object(id))
            .map(|object| Vec3::from_array(object.transform.position))
            .unwrap_or_else(|| self.scene.bounds().0)
    }

    fn handle_viewport_click(&mut self, cursor: (f32, f32)) {
        let Some(render) = &self.render else {
            return;
        };
        let view_proj = render.view_proj(&self.camera);
        let hit = pick::pick_at_cursor(&self.scene, cursor, render.viewport(), view_proj);
        self.scene.select(hit.map(|hit| hit.object_id));
    }

    fn frame_selection(&mut self) {
        let (center, extent) = match self.scene.selected().and_then(|id| self.scene.object(id)) {
            Some(object) => {
                let half = Vec3::from_array(object.primitive.half_extents());
                let scale = Vec3::from_array(object.transform.scale).abs();
                (
                    Vec3::from_array(object.transform.position),
                    half * scale.max(Vec3::splat(0.01)),
                )
            }
            None => self.scene.bounds(),
        };
        self.camera.frame_bounds_preserve_orientation(center, extent);
    }

    fn poll_assistant(&mut self) {
        let Some(result) = self.assistant.poll() else {
            return;
        };
        match result {
            Ok(suggestion) => {
                let mut lighting = *self.scene.lighting();
                lighting.ambient.intensity = suggestion.ambient_intensity;
                lighting.sun.intensity = suggestion.directional_intensity;
                lighting.sun.direction = suggestion.direction;
                lighting.sun.shadow_bias = suggestion.shadow_bias;
                self.scene.set_lighting(lighting);
                self.ui.toasts.success("Lighting suggestion applied.");
            }
            Err(err) => {
                self.ui
                    .toasts
                    .error(format!("Lighting assistant failed: {}", err));
            }
        }
    }

    fn refresh_project_list(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.list() {
            Ok(summaries) => {
                self.ui.project_summaries = summaries;
                self.refresh_thumbnails();
            }
            Err(err) => self
                .ui
                .toasts
                .error(format!("Could not read project list: {}", err)),
        }
    }

    /// Decodes stored thumbnails into egui textures for the project
    /// list, and drops textures of deleted projects.
    fn refresh_thumbnails(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let Some(host) = &self.egui_host else {
            return;
        };
        let live: Vec<Uuid> = self.ui.project_summaries.iter().map(|s| s.id).collect();
        self.ui
            .project_thumbnails
            .retain(|id, _| live.contains(id));

        for summary in &self.ui.project_summaries {
            if !summary.has_thumbnail || self.ui.project_thumbnails.contains_key(&summary.id) {
                continue;
            }
            let Ok(record) = store.load(summary.id) else {
                continue;
            };
            let Some(encoded) = record.thumbnail else {
                continue;
            };
            let Some((width, height, rgba)) = thumbnail::decode_png_base64(&encoded) else {
                log::warn!("Thumbnail for '{}' did not decode", summary.name);
                continue;
            };
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [width as usize, height as usize],
                &rgba,
            );
            let handle = host.context().load_texture(
                format!("thumb_{}", summary.id),
                image,
                egui::TextureOptions::LINEAR,
            );
            self.ui.project_thumbnails.insert(summary.id, handle);
        }
    }

    fn camera_pose(&self) -> CameraPose {
        CameraPose {
            position: self.camera.position.to_array(),
            yaw: self.camera.yaw,
            pitch: self.camera.pitch,
        }
    }

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::AddObject(primitive) => {
                let id = self.scene.add_object(primitive);
                self.scene.select(Some(id));
            }
            UiAction::DeleteObject(id) => {
                self.scene.remove_object(id);
            }
            UiAction::DuplicateObject(id) => {
                if let Some(copy) = self.scene.duplicate_object(id) {
                    self.scene.select(Some(copy));
                }
            }
            UiAction::Select(id) => self.scene.select(id),
            UiAction::RenameObject(id, name) => {
                self.scene.rename_object(id, &name);
            }
            UiAction::SetTransform(id, transform) => {
                if !self.scene.set_transform(id, transform) {
                    self.ui.toasts.info("Object is locked.");
                }
            }
            UiAction::SetPrimitive(id, primitive) => {
                if !self.scene.set_primitive(id, primitive) {
                    self.ui.toasts.info("Object is locked.");
                }
            }
            UiAction::SetVisible(id, visible) => {
                self.scene.set_visible(id, visible);
            }
            UiAction::SetLocked(id, locked) => {
                self.scene.set_locked(id, locked);
            }
            UiAction::AssignMaterial(object_id, material_id) => {
                if !self.scene.assign_material(object_id, material_id) {
                    self.ui.toasts.error("Material no longer exists.");
                }
            }
            UiAction::EditObjectMaterial(object_id, patch) => {
                self.scene.edit_object_material(object_id, |material| {
                    material.base_color = patch.base_color;
                    material.roughness = patch.roughness;
                    material.metalness = patch.metalness;
                });
            }
            UiAction::PickTexture(object_id) => self.handle_pick_texture(object_id),
            UiAction::ClearTexture(object_id) => {
                self.scene.edit_object_material(object_id, |material| {
                    material.texture = None;
                });
            }
            UiAction::SetLighting(lighting) => self.scene.set_lighting(lighting),
            UiAction::FrameSelection => self.frame_selection(),
            UiAction::NewProject(name) => self.handle_new_project(name),
            UiAction::SaveProject => self.handle_save_project(),
            UiAction::OpenProject(id) => self.handle_open_project(id),
            UiAction::RenameProject(id, name) => self.handle_rename_project(id, name),
            UiAction::DeleteProject(id) => self.handle_delete_project(id),
            UiAction::ExportScene => self.handle_export_scene(),
            UiAction::ImportScene => self.handle_import_scene(),
            UiAction::RequestLighting(description) => {
                if let Err(err) = self.assistant.request(&description) {
                    self.ui
                        .toasts
                        .error(format!("Lighting assistant unavailable: {}", err));
                }
            }
        }
    }

    fn handle_pick_texture(&mut self, object_id: Uuid) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "tga", "bmp"])
            .pick_file()
        else {
            return;
        };
        let Some(path_str) = path.to_str() else {
            self.ui.toasts.error("Texture path is not valid UTF-8.");
            return;
        };
        let path_str = path_str.to_string();
        self.scene.edit_object_material(object_id, |material| {
            material.texture = Some(TextureRef { path: path_str });
        });
    }

    fn handle_new_project(&mut self, name: String) {
        let Some(store) = &self.store else {
            self.ui.toasts.error("Project store unavailable.");
            return;
        };
        match store.create(&name, self.scene.clone(), self.camera_pose()) {
            Ok(record) => {
                match thumbnail::render_png_base64(&self.scene) {
                    Ok(png) => {
                        if let Err(err) = store.set_thumbnail(record.id, png) {
                            log::warn!("Failed to store thumbnail: {}", err);
                        }
                    }
                    Err(err) => log::warn!("Failed to render thumbnail: {}", err),
                }
                self.active_project = Some((record.id, record.name.clone()));
                self.ui.active_project_name = Some(record.name);
                self.ui.toasts.success(format!("Created project '{}'.", name));
                self.refresh_project_list();
            }
            Err(err) => {
                self.ui
                    .toasts
                    .error(format!("Could not create project: {}", err));
            }
        }
    }

    fn handle_save_project(&mut self) {
        let Some((id, name)) = self.active_project.clone() else {
            self.ui.show_projects_window = true;
            self.ui
                .toasts
                .info("No project open - create one to save into.");
            return;
        };
        let Some(store) = &self.store else {
            self.ui.toasts.error("Project store unavailable.");
            return;
        };
        let record = crate::project::ProjectRecord {
            id,
            name: name.clone(),
            last_modified: 0, // stamped by the store
            thumbnail: thumbnail::render_png_base64(&self.scene).ok(),
            scene: self.scene.clone(),
            camera: self.camera_pose(),
        };
        match store.save(&record) {
            Ok(_) => {
                self.ui.toasts.success(format!("Saved '{}'.", name));
                // The stored thumbnail just changed; force a re-decode.
                self.ui.project_thumbnails.remove(&id);
                self.refresh_project_list();
            }
            Err(err) => self.ui.toasts.error(format!("Save failed: {}", err)),
        }
    }

    fn handle_open_project(&mut self, id: Uuid) {
        let Some(store) = &self.store else {
            self.ui.toasts.error("Project store unavailable.");
            return;
        };
        match store.load(id) {
            Ok(record) => {
                self.scene = record.scene;
                self.camera = CameraController::new(
                    Vec3::from_array(record.camera.position),
                    record.camera.yaw,
                    record.camera.pitch,
                );
                if let Some(render) = &mut self.render {
                    render.reset_scene();
                }
                self.active_project = Some((record.id, record.name.clone()));
                self.ui.active_project_name = Some(record.name.clone());
                self.ui.toasts.success(format!("Opened '{}'.", record.name));
            }
            Err(err) => self
                .ui
                .toasts
                .error(format!("Could not open project: {}", err)),
        }
    }

    fn handle_rename_project(&mut self, id: Uuid, name: String) {
        let Some(store) = &self.store else {
            return;
        };
        match store.rename(id, &name) {
            Ok(()) => {
                if let Some((active_id, active_name)) = &mut self.active_project {
                    if *active_id == id {
                        *active_name = name.clone();
                        self.ui.active_project_name = Some(name);
                    }
                }
                self.refresh_project_list();
            }
            Err(err) => self.ui.toasts.error(format!("Rename failed: {}", err)),
        }
    }

    fn handle_delete_project(&mut self, id: Uuid) {
        let Some(store) = &self.store else {
            return;
        };
        match store.delete(id) {
            Ok(removed) => {
                if removed {
                    // Deleting the open project clears the active handle;
                    // the scene stays on screen as an unsaved draft.
                    if self.active_project.as_ref().map(|(active, _)| *active) == Some(id) {
                        self.active_project = None;
                        self.ui.active_project_name = None;
                        self.scene.select(None);
                    }
                    self.ui.toasts.info("Project deleted.");
                }
                self.refresh_project_list();
            }
            Err(err) => self.ui.toasts.error(format!("Delete failed: {}", err)),
        }
    }

    fn handle_export_scene(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Scene", &["json"])
            .set_file_name("scene.json")
            .save_file()
        else {
            return;
        };
        match crate::scene::serialization::save_scene_to_file(&self.scene, &path) {
            Ok(()) => self.ui.toasts.success("Scene exported."),
            Err(err) => self.ui.toasts.error(format!("Export failed: {}", err)),
        }
    }

    fn handle_import_scene(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Scene", &["json"])
            .pick_file()
        else {
            return;
        };
        match crate::scene::serialization::load_scene_from_file(&path) {
            Ok(scene) => {
                self.scene = scene;
                if let Some(render) = &mut self.render {
                    render.reset_scene();
                }
                let (center, extent) = self.scene.bounds();
                self.camera = CameraController::from_bounds(center, extent);
                self.ui.toasts.success("Scene imported.");
            }
            Err(err) => self.ui.toasts.error(format!("Import failed: {}", err)),
        }
    }

    fn redraw(&mut self) {
        let frame_start = Instant::now();
        self.poll_assistant();
        self.timing
            .update(self.window.as_deref(), frame_start);
        self.update_camera();

        let Some(window) = self.window.clone() else {
            return;
        };

        let mut actions: Vec<UiAction> = Vec::new();
        let frame = {
            let Some(host) = self.egui_host.as_mut() else {
                return;
            };
            let ui_state = &mut self.ui;
            let scene = &self.scene;
            let pending = self.assistant.pending();
            host.run_ui(&window, |ctx| {
                ui::draw_ui(ctx, ui_state, scene, pending, &mut actions);
            })
        };
        for action in actions {
            self.apply_action(action);
        }

        if let Some(render) = &mut self.render {
            render.sync_scene(&self.scene);
            let render_start = Instant::now();
            if let Err(err) = render.render(&self.scene, &self.camera, &frame) {
                log::error!("Frame render failed: {}", err);
            }
            self.timing
                .set_render_ms(render_start.elapsed().as_secs_f32() * 1000.0);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1440u32, 900u32))
            .with_resizable(true);
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        match RenderContext::new(window.clone()) {
            Ok(render) => self.render = Some(render),
            Err(err) => {
                log::error!("Renderer initialization failed: {}", err);
                event_loop.exit();
                return;
            }
        }
        self.egui_host = Some(EguiHost::new(&window));
        self.update_target_frame_duration(&window);
        self.refresh_project_list();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let egui_consumed = self
            .egui_host
            .as_mut()
            .map(|host| host.on_window_event(&window, &event))
            .unwrap_or(false);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Focused(focused) => {
                self.window_focused = focused;
                if !focused {
                    self.input.clear_held();
                    self.orbiting = false;
                    self.panning = false;
                    self.mouse_pos = None;
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(new_size);
                }
                self.update_target_frame_duration(&window);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(render) = &mut self.render {
                    render.resize(window.inner_size());
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let egui_wants_keyboard = self
                    .egui_host
                    .as_ref()
                    .map(|host| host.wants_keyboard_input())
                    .unwrap_or(false);
                if egui_consumed || egui_wants_keyboard {
                    self.input.clear_held();
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                match self.input.handle_key(event.physical_key, pressed) {
                    InputAction::DeleteSelected => {
                        if let Some(id) = self.scene.selected() {
                            self.scene.remove_object(id);
                        }
                    }
                    InputAction::FrameSelection => self.frame_selection(),
                    InputAction::Deselect => self.scene.select(None),
                    InputAction::ZoomIn => self.camera.nudge(0.0, 0.0, ZOOM_STEP),
                    InputAction::ZoomOut => self.camera.nudge(0.0, 0.0, -ZOOM_STEP),
                    InputAction::None => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let current = (position.x as f32, position.y as f32);
                if let Some((last_x, last_y)) = self.mouse_pos {
                    let dx = current.0 - last_x;
                    let dy = current.1 - last_y;
                    if self.orbiting {
                        let pivot = self.orbit_pivot();
                        self.camera.orbit_around(
                            pivot,
                            dx * ORBIT_SENSITIVITY,
                            -dy * ORBIT_SENSITIVITY,
                        );
                    } else if self.panning {
                        self.camera
                            .pan(-dx * PAN_SENSITIVITY, dy * PAN_SENSITIVITY);
                    }
                }
                self.mouse_pos = Some(current);
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_pos = None;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                let egui_wants_pointer = self
                    .egui_host
                    .as_ref()
                    .map(|host| host.wants_pointer_input())
                    .unwrap_or(false);
                match button {
                    MouseButton::Right => {
                        self.orbiting = pressed && !egui_wants_pointer;
                    }
                    MouseButton::Middle => {
                        self.panning = pressed && !egui_wants_pointer;
                    }
                    MouseButton::Left => {
                        if pressed && !egui_wants_pointer && self.window_focused {
                            if let Some(cursor) = self.mouse_pos {
                                self.handle_viewport_click(cursor);
                            }
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let egui_wants_pointer = self
                    .egui_host
                    .as_ref()
                    .map(|host| host.wants_pointer_input())
                    .unwrap_or(false);
                if !egui_wants_pointer {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                    };
                    self.camera.nudge(0.0, 0.0, scroll * ZOOM_STEP);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
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

/// Where the project store lives; overridable for tests and portable
/// installs.
fn store_path() -> PathBuf {
    let base = std::env::var("MAQUETTE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".maquette"));
    base.join("projects.json")
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Maquette scene editor starting");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("Goodbye");
}
