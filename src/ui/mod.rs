mod panels;
pub mod toasts;

pub use panels::draw_ui;

use crate::project::ProjectSummary;
use crate::scene::{PrimitiveKind, Transform};
use std::collections::HashMap;
use toasts::ToastStack;
use uuid::Uuid;

/// What a material edit changes, applied by the app through the store's
/// clone-on-edit path so the shared default is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialPatch {
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
}

/// Everything a panel can ask the application to do. Panels never mutate
/// the scene themselves - they emit actions, the app applies them.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    AddObject(PrimitiveKind),
    DeleteObject(Uuid),
    DuplicateObject(Uuid),
    Select(Option<Uuid>),
    RenameObject(Uuid, String),
    SetTransform(Uuid, Transform),
    SetPrimitive(Uuid, PrimitiveKind),
    SetVisible(Uuid, bool),
    SetLocked(Uuid, bool),
    AssignMaterial(Uuid, Option<Uuid>),
    EditObjectMaterial(Uuid, MaterialPatch),
    PickTexture(Uuid),
    ClearTexture(Uuid),
    SetLighting(crate::scene::LightingState),
    FrameSelection,
    NewProject(String),
    SaveProject,
    OpenProject(Uuid),
    RenameProject(Uuid, String),
    DeleteProject(Uuid),
    ExportScene,
    ImportScene,
    RequestLighting(String),
}

/// UI-only state: open windows, text buffers, the cached project list,
/// toasts. Scene data itself lives in the store.
pub struct UiState {
    pub show_projects_window: bool,
    pub show_ai_window: bool,
    pub ai_description: String,
    pub new_project_name: String,
    pub rename_project: Option<(Uuid, String)>,
    pub project_summaries: Vec<ProjectSummary>,
    /// Decoded thumbnail textures, keyed by project id.
    pub project_thumbnails: HashMap<Uuid, egui::TextureHandle>,
    pub active_project_name: Option<String>,
    pub toasts: ToastStack,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            show_projects_window: false,
            show_ai_window: false,
            ai_description: String::new(),
            new_project_name: String::new(),
            rename_project: None,
            project_summaries: Vec::new(),
            project_thumbnails: HashMap::new(),
            active_project_name: None,
            toasts: ToastStack::new(),
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// "just now" / "5 min ago" style age label for the project list.
pub fn format_age(now_ms: u64, then_ms: u64) -> String {
    let seconds = now_ms.saturating_sub(then_ms) / 1000;
    match seconds {
        0..=9 => "just now".to_string(),
        10..=59 => format!("{}s ago", seconds),
        60..=3599 => format!("{} min ago", seconds / 60),
        3600..=86_399 => format!("{} h ago", seconds / 3600),
        _ => format!("{} d ago", seconds / 86_400),
    }
}

#[cfg(test)]
mod tests {
    use super::format_age;

    #[test]
    fn age_labels_scale_with_elapsed_time() {
        let now = 10_000_000_000;
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(format_age(now, now - 30_000), "30s ago");
        assert_eq!(format_age(now, now - 5 * 60_000), "5 min ago");
        assert_eq!(format_age(now, now - 3 * 3_600_000), "3 h ago");
        assert_eq!(format_age(now, now - 2 * 86_400_000), "2 d ago");
    }

    #[test]
    fn age_never_underflows() {
        assert_eq!(format_age(0, 500), "just now");
    }
}
