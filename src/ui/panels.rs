//! The egui panels: menu + toolbar, outliner, inspector, project list
//! and the lighting-assistant window. Panels read the scene and emit
//! [`UiAction`]s; they never mutate state directly.

use crate::scene::{LightingState, PrimitiveKind, SceneState};
use crate::ui::{format_age, MaterialPatch, UiAction, UiState};
use uuid::Uuid;

pub fn draw_ui(
    ctx: &egui::Context,
    state: &mut UiState,
    scene: &SceneState,
    assistant_pending: bool,
    actions: &mut Vec<UiAction>,
) {
    draw_menu_bar(ctx, state, scene, actions);
    draw_outliner(ctx, scene, actions);
    draw_inspector(ctx, scene, actions);
    draw_projects_window(ctx, state, actions);
    draw_ai_window(ctx, state, assistant_pending, actions);
    state.toasts.draw(ctx);
}

fn draw_menu_bar(
    ctx: &egui::Context,
    state: &mut UiState,
    scene: &SceneState,
    actions: &mut Vec<UiAction>,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("Project", |ui| {
                if ui.button("Projects...").clicked() {
                    state.show_projects_window = true;
                    ui.close_menu();
                }
                let can_save = state.active_project_name.is_some();
                if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                    actions.push(UiAction::SaveProject);
                    ui.close_menu();
                }
            });
            ui.menu_button("Scene", |ui| {
                if ui.button("Import JSON...").clicked() {
                    actions.push(UiAction::ImportScene);
                    ui.close_menu();
                }
                if ui.button("Export JSON...").clicked() {
                    actions.push(UiAction::ExportScene);
                    ui.close_menu();
                }
            });
            ui.menu_button("Lighting", |ui| {
                if ui.button("Assistant...").clicked() {
                    state.show_ai_window = true;
                    ui.close_menu();
                }
            });

            ui.separator();
            if ui.button("+ Cube").clicked() {
                actions.push(UiAction::AddObject(PrimitiveKind::cube()));
            }
            if ui.button("+ Cylinder").clicked() {
                actions.push(UiAction::AddObject(PrimitiveKind::cylinder()));
            }
            if ui.button("+ Plane").clicked() {
                actions.push(UiAction::AddObject(PrimitiveKind::plane()));
            }
            if ui.button("+ Sphere").clicked() {
                actions.push(UiAction::AddObject(PrimitiveKind::sphere()));
            }

            if let Some(selected) = scene.selected() {
                ui.separator();
                if ui.button("Duplicate").clicked() {
                    actions.push(UiAction::DuplicateObject(selected));
                }
                if ui.button("Delete").clicked() {
                    actions.push(UiAction::DeleteObject(selected));
                }
                if ui.button("Frame").clicked() {
                    actions.push(UiAction::FrameSelection);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match &state.active_project_name {
                    Some(name) => ui.label(format!("Project: {}", name)),
                    None => ui.label(egui::RichText::new("Unsaved scene").weak()),
                };
            });
        });
    });
}

fn draw_outliner(ctx: &egui::Context, scene: &SceneState, actions: &mut Vec<UiAction>) {
    egui::SidePanel::left("outliner")
        .resizable(true)
        .default_width(210.0)
        .show(ctx, |ui| {
            ui.heading("Objects");
            ui.separator();
            if scene.objects().is_empty() {
                ui.label(egui::RichText::new("Empty scene - add a primitive.").weak());
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for object in scene.objects() {
                    let selected = scene.selected() == Some(object.id);
                    ui.horizontal(|ui| {
                        let mut visible = object.visible;
                        if ui
                            .checkbox(&mut visible, "")
                            .on_hover_text("Visible")
                            .changed()
                        {
                            actions.push(UiAction::SetVisible(object.id, visible));
                        }
                        let label = if object.locked {
                            format!("{} [locked]", object.name)
                        } else {
                            object.name.clone()
                        };
                        if ui.selectable_label(selected, label).clicked() {
                            actions.push(UiAction::Select(Some(object.id)));
                        }
                    });
                }
            });
        });
}

fn draw_inspector(ctx: &egui::Context, scene: &SceneState, actions: &mut Vec<UiAction>) {
    egui::SidePanel::right("inspector")
        .resizable(true)
        .default_width(280.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                match scene.selected().and_then(|id| scene.object(id)) {
                    Some(object) => draw_object_inspector(ui, scene, object, actions),
                    None => {
                        ui.heading("Inspector");
                        ui.separator();
                        ui.label(egui::RichText::new("Nothing selected.").weak());
                    }
                }
                ui.separator();
                draw_lighting_section(ui, scene, actions);
            });
        });
}

fn draw_object_inspector(
    ui: &mut egui::Ui,
    scene: &SceneState,
    object: &crate::scene::SceneObject,
    actions: &mut Vec<UiAction>,
) {
    ui.heading("Inspector");
    ui.separator();

    let mut name = object.name.clone();
    if ui.text_edit_singleline(&mut name).changed() {
        actions.push(UiAction::RenameObject(object.id, name));
    }

    ui.horizontal(|ui| {
        let mut visible = object.visible;
        if ui.checkbox(&mut visible, "Visible").changed() {
            actions.push(UiAction::SetVisible(object.id, visible));
        }
        let mut locked = object.locked;
        if ui.checkbox(&mut locked, "Locked").changed() {
            actions.push(UiAction::SetLocked(object.id, locked));
        }
    });

    ui.add_enabled_ui(!object.locked, |ui| {
        ui.collapsing("Transform", |ui| {
            let mut transform = object.transform;
            let mut changed = false;
            changed |= drag3(ui, "Position", &mut transform.position, 0.05);
            changed |= drag3(ui, "Rotation", &mut transform.rotation_deg, 1.0);
            changed |= drag3(ui, "Scale", &mut transform.scale, 0.02);
            if changed {
                actions.push(UiAction::SetTransform(object.id, transform));
            }
        });

        ui.collapsing("Dimensions", |ui| {
            draw_dimensions(ui, object.id, object.primitive, actions);
        });
    });

    ui.collapsing("Material", |ui| {
        draw_material_section(ui, scene, object, actions);
    });
}

fn draw_dimensions(
    ui: &mut egui::Ui,
    id: Uuid,
    primitive: PrimitiveKind,
    actions: &mut Vec<UiAction>,
) {
    let mut edited = primitive;
    let changed = match &mut edited {
        PrimitiveKind::Cube {
            width,
            height,
            depth,
        } => {
            let mut changed = drag1(ui, "Width", width, 0.05);
            changed |= drag1(ui, "Height", height, 0.05);
            changed |= drag1(ui, "Depth", depth, 0.05);
            changed
        }
        PrimitiveKind::Cylinder { radius, height } => {
            let mut changed = drag1(ui, "Radius", radius, 0.02);
            changed |= drag1(ui, "Height", height, 0.05);
            changed
        }
        PrimitiveKind::Plane { width, depth } => {
            let mut changed = drag1(ui, "Width", width, 0.05);
            changed |= drag1(ui, "Depth", depth, 0.05);
            changed
        }
        PrimitiveKind::Sphere { radius } => drag1(ui, "Radius", radius, 0.02),
    };
    if changed {
        clamp_dimensions(&mut edited);
        actions.push(UiAction::SetPrimitive(id, edited));
    }
}

/// Dimensions stay strictly positive; zero-size meshes render nothing
/// and break picking.
fn clamp_dimensions(primitive: &mut PrimitiveKind) {
    const MIN: f32 = 0.01;
    match primitive {
        PrimitiveKind::Cube {
            width,
            height,
            depth,
        } => {
            *width = width.max(MIN);
            *height = height.max(MIN);
            *depth = depth.max(MIN);
        }
        PrimitiveKind::Cylinder { radius, height } => {
            *radius = radius.max(MIN);
            *height = height.max(MIN);
        }
        PrimitiveKind::Plane { width, depth } => {
            *width = width.max(MIN);
            *depth = depth.max(MIN);
        }
        PrimitiveKind::Sphere { radius } => *radius = radius.max(MIN),
    }
}

fn draw_material_section(
    ui: &mut egui::Ui,
    scene: &SceneState,
    object: &crate::scene::SceneObject,
    actions: &mut Vec<UiAction>,
) {
    let material = scene.resolve_material(object);
    let using_default = material.id == scene.default_material_id();

    if scene.material_ref_dangling(object) {
        ui.colored_label(
            egui::Color32::from_rgb(230, 160, 80),
            "Material reference missing - using default.",
        );
    }

    egui::ComboBox::from_id_salt("material_select")
        .selected_text(material.name.clone())
        .show_ui(ui, |ui| {
            for candidate in scene.materials() {
                let checked = candidate.id == material.id;
                if ui
                    .selectable_label(checked, candidate.name.clone())
                    .clicked()
                    && !checked
                {
                    let assigned = if candidate.id == scene.default_material_id() {
                        None
                    } else {
                        Some(candidate.id)
                    };
                    actions.push(UiAction::AssignMaterial(object.id, assigned));
                }
            }
        });
    if using_default {
        ui.label(
            egui::RichText::new("Shared default - edits create a copy.")
                .weak()
                .small(),
        );
    }

    let mut patch = MaterialPatch {
        base_color: material.base_color,
        roughness: material.roughness,
        metalness: material.metalness,
    };
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label("Base color");
        changed |= ui
            .color_edit_button_rgba_unmultiplied(&mut patch.base_color)
            .changed();
    });
    changed |= ui
        .add(egui::Slider::new(&mut patch.roughness, 0.04..=1.0).text("Roughness"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut patch.metalness, 0.0..=1.0).text("Metalness"))
        .changed();
    if changed {
        actions.push(UiAction::EditObjectMaterial(object.id, patch));
    }

    ui.horizontal(|ui| {
        match &material.texture {
            Some(texture) => {
                ui.label("Texture:");
                ui.monospace(shorten_path(&texture.path));
            }
            None => {
                ui.label(egui::RichText::new("No texture").weak());
            }
        }
        if ui.button("Browse...").clicked() {
            actions.push(UiAction::PickTexture(object.id));
        }
        if material.texture.is_some() && ui.button("Clear").clicked() {
            actions.push(UiAction::ClearTexture(object.id));
        }
    });
}

fn draw_lighting_section(ui: &mut egui::Ui, scene: &SceneState, actions: &mut Vec<UiAction>) {
    ui.heading("Lighting");
    let mut lighting: LightingState = *scene.lighting();
    let mut changed = false;

    ui.label("Ambient");
    ui.horizontal(|ui| {
        changed |= ui.color_edit_button_rgb(&mut lighting.ambient.color).changed();
        changed |= ui
            .add(egui::Slider::new(&mut lighting.ambient.intensity, 0.0..=2.0).text("Intensity"))
            .changed();
    });

    ui.label("Sun");
    ui.horizontal(|ui| {
        changed |= ui.color_edit_button_rgb(&mut lighting.sun.color).changed();
        changed |= ui
            .add(egui::Slider::new(&mut lighting.sun.intensity, 0.0..=5.0).text("Intensity"))
            .changed();
    });
    changed |= drag3(ui, "Direction", &mut lighting.sun.direction, 0.02);
    changed |= ui
        .checkbox(&mut lighting.sun.cast_shadows, "Cast shadows")
        .changed();
    ui.add_enabled_ui(lighting.sun.cast_shadows, |ui| {
        changed |= ui
            .add(
                egui::Slider::new(&mut lighting.sun.shadow_bias, 0.0001..=0.01)
                    .logarithmic(true)
                    .text("Shadow bias"),
            )
            .changed();
    });

    if changed {
        actions.push(UiAction::SetLighting(lighting));
    }
}

fn draw_projects_window(ctx: &egui::Context, state: &mut UiState, actions: &mut Vec<UiAction>) {
    if !state.show_projects_window {
        return;
    }
    let mut open = state.show_projects_window;
    egui::Window::new("Projects")
        .open(&mut open)
        .resizable(true)
        .default_width(340.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut state.new_project_name);
                let can_create = !state.new_project_name.trim().is_empty();
                if ui
                    .add_enabled(can_create, egui::Button::new("Create"))
                    .clicked()
                {
                    actions.push(UiAction::NewProject(state.new_project_name.trim().to_string()));
                    state.new_project_name.clear();
                }
            });
            ui.separator();

            if state.project_summaries.is_empty() {
                ui.label(egui::RichText::new("No saved projects yet.").weak());
            }
            let now_ms = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or(0);
            let summaries = state.project_summaries.clone();
            egui::ScrollArea::vertical().show(ui, |ui| {
                for summary in &summaries {
                    ui.horizontal(|ui| {
                        let renaming_this = state
                            .rename_project
                            .as_ref()
                            .map(|(id, _)| *id == summary.id)
                            .unwrap_or(false);
                        if renaming_this {
                            let (id, mut draft) =
                                state.rename_project.clone().expect("checked above");
                            if ui.text_edit_singleline(&mut draft).changed() {
                                state.rename_project = Some((id, draft.clone()));
                            }
                            if ui.button("Apply").clicked() && !draft.trim().is_empty() {
                                actions
                                    .push(UiAction::RenameProject(id, draft.trim().to_string()));
                                state.rename_project = None;
                            }
                            if ui.button("Cancel").clicked() {
                                state.rename_project = None;
                            }
                        } else {
                            if let Some(handle) = state.project_thumbnails.get(&summary.id) {
                                ui.add(
                                    egui::Image::new(handle)
                                        .fit_to_exact_size(egui::vec2(48.0, 36.0)),
                                );
                            }
                            ui.label(&summary.name);
                            ui.label(
                                egui::RichText::new(format_age(now_ms, summary.last_modified))
                                    .weak()
                                    .small(),
                            );
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.button("Delete").clicked() {
                                        actions.push(UiAction::DeleteProject(summary.id));
                                    }
                                    if ui.button("Rename").clicked() {
                                        state.rename_project =
                                            Some((summary.id, summary.name.clone()));
                                    }
                                    if ui.button("Open").clicked() {
                                        actions.push(UiAction::OpenProject(summary.id));
                                    }
                                },
                            );
                        }
                    });
                    ui.separator();
                }
            });
        });
    state.show_projects_window = open;
}

fn draw_ai_window(
    ctx: &egui::Context,
    state: &mut UiState,
    assistant_pending: bool,
    actions: &mut Vec<UiAction>,
) {
    if !state.show_ai_window {
        return;
    }
    let mut open = state.show_ai_window;
    egui::Window::new("Lighting Assistant")
        .open(&mut open)
        .resizable(true)
        .default_width(320.0)
        .show(ctx, |ui| {
            ui.label("Describe the lighting you want:");
            ui.add(
                egui::TextEdit::multiline(&mut state.ai_description)
                    .hint_text("e.g. late afternoon sun through tall windows, soft shadows")
                    .desired_rows(3),
            );
            ui.horizontal(|ui| {
                let can_send =
                    !assistant_pending && !state.ai_description.trim().is_empty();
                if ui
                    .add_enabled(can_send, egui::Button::new("Suggest lighting"))
                    .clicked()
                {
                    actions.push(UiAction::RequestLighting(
                        state.ai_description.trim().to_string(),
                    ));
                }
                if assistant_pending {
                    ui.add(egui::Spinner::new());
                    ui.label("Waiting for the model...");
                }
            });
        });
    state.show_ai_window = open;
}

fn drag1(ui: &mut egui::Ui, label: &str, value: &mut f32, speed: f32) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::DragValue::new(value).speed(speed)).changed()
    })
    .inner
}

fn drag3(ui: &mut egui::Ui, label: &str, values: &mut [f32; 3], speed: f32) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut changed = false;
        for value in values.iter_mut() {
            changed |= ui.add(egui::DragValue::new(value).speed(speed)).changed();
        }
        changed
    })
    .inner
}

fn shorten_path(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}
