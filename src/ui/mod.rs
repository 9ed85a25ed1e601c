//! egui screens. Widgets never touch the scene directly: every interaction comes
//! back to the app as a [`UiAction`].

use crate::render::{OrbitCamera, ViewportPainter};
use egui::{Color32, RichText};
use shadelab::color::Rgb;
use shadelab::lighting::{
    backgrounds, lighting_presets, rendering_modes, Axis, BaseLight, LightSpec, CUSTOM_LIGHT_COUNT,
};
use shadelab::scene::{Frame, LightEdit, LightSlot, Notice, NoticeLevel, SceneUpdate, SessionState};
use shadelab::session::Route;
use shadelab::shapes::{selection_surface, ShapeSelection};
use shadelab::textures::{builtin_textures, find_builtin, TextureSelection};
use std::time::{Duration, Instant};

const NOTICE_LIFETIME: Duration = Duration::from_secs(5);
const LIGHT_POSITION_RANGE: std::ops::RangeInclusive<f32> = -5.0..=5.0;

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Navigate(Route),
    Update(SceneUpdate),
    ChooseModelFile,
    ChooseTextureFile,
    Orbit { yaw: f32, pitch: f32 },
    Zoom(f32),
}

/// Everything the screens read for one frame.
pub struct UiInput<'a> {
    pub route: Route,
    pub state: &'a SessionState,
    /// Present on the viewer route.
    pub frame: Option<&'a Frame>,
    pub camera: &'a OrbitCamera,
    pub custom_model_name: Option<&'a str>,
    pub loading_model: Option<&'a str>,
    pub texture_limit: u64,
    pub model_limit: u64,
}

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

pub struct UiState {
    toasts: Vec<Toast>,
    viewport: ViewportPainter,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            toasts: Vec::new(),
            viewport: ViewportPainter::new(),
        }
    }

    pub fn push_notices(&mut self, notices: Vec<Notice>, now: Instant) {
        self.toasts.extend(
            notices
                .into_iter()
                .map(|notice| Toast { notice, shown_at: now }),
        );
    }

    fn prune_toasts(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < NOTICE_LIFETIME);
    }

    pub fn show(&mut self, ctx: &egui::Context, input: &UiInput<'_>, now: Instant) -> Vec<UiAction> {
        let mut actions = Vec::new();
        match input.route {
            Route::Welcome => welcome(ctx, &mut actions),
            Route::Gallery => gallery(ctx, &mut actions),
            Route::Upload => upload(ctx, input, &mut actions),
            Route::Viewer(_) => {
                viewer_controls(ctx, input, &mut actions);
                self.viewer_canvas(ctx, input, &mut actions);
            }
        }
        self.prune_toasts(now);
        self.show_toasts(ctx);
        actions
    }

    fn viewer_canvas(&mut self, ctx: &egui::Context, input: &UiInput<'_>, actions: &mut Vec<UiAction>) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());
                if let Some(frame) = input.frame {
                    self.viewport
                        .paint(ctx, &ui.painter_at(rect), rect, frame, input.camera);
                }
                if response.dragged() {
                    let delta = response.drag_delta();
                    actions.push(UiAction::Orbit {
                        yaw: -delta.x * 0.01,
                        pitch: delta.y * 0.01,
                    });
                }
                if response.hovered() {
                    let scroll = ui.input(|i| i.smooth_scroll_delta.y);
                    if scroll != 0.0 {
                        actions.push(UiAction::Zoom(scroll * 0.01));
                    }
                }
                if let Some(name) = input.loading_model {
                    ui.put(
                        egui::Rect::from_center_size(rect.center(), egui::vec2(240.0, 40.0)),
                        egui::Label::new(
                            RichText::new(format!("Loading {}...", name))
                                .color(Color32::GRAY)
                                .size(18.0),
                        ),
                    );
                }
            });
    }

    fn show_toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("notices"))
            .anchor(egui::Align2::LEFT_BOTTOM, [12.0, -12.0])
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.colored_label(level_color(toast.notice.level), &toast.notice.message);
                    });
                }
            });
    }
}

fn level_color(level: NoticeLevel) -> Color32 {
    match level {
        NoticeLevel::Info => Color32::from_rgb(70, 150, 70),
        NoticeLevel::Warning => Color32::from_rgb(210, 150, 20),
        NoticeLevel::Error => Color32::from_rgb(210, 70, 70),
    }
}

fn format_limit(bytes: u64) -> String {
    format!("{:.0} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn welcome(ctx: &egui::Context, actions: &mut Vec<UiAction>) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            ui.heading(RichText::new("Surface Illumination Explorer").size(36.0));
            ui.add_space(12.0);
            ui.label(
                "Compare rendering techniques and surface illumination models on \
                 interactive shapes, or on a model of your own.",
            );
            ui.add_space(24.0);
            if ui.button(RichText::new("Get Started").size(20.0)).clicked() {
                actions.push(UiAction::Navigate(Route::Gallery));
            }
        });
    });
}

fn gallery(ctx: &egui::Context, actions: &mut Vec<UiAction>) {
    const COLUMNS: usize = 4;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("Home").clicked() {
                actions.push(UiAction::Navigate(Route::Welcome));
            }
            ui.heading("Choose a shape");
        });
        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("gallery")
                .spacing([12.0, 12.0])
                .show(ui, |ui| {
                    for (index, selection) in selection_surface().into_iter().enumerate() {
                        let label = match selection {
                            ShapeSelection::CustomModel => "Upload Custom Model".to_string(),
                            _ => selection.display_name().to_string(),
                        };
                        let tile = egui::Button::new(RichText::new(label).size(16.0))
                            .min_size(egui::vec2(180.0, 90.0));
                        if ui.add(tile).clicked() {
                            let route = match selection {
                                ShapeSelection::CustomModel => Route::Upload,
                                builtin => Route::Viewer(builtin),
                            };
                            actions.push(UiAction::Navigate(route));
                        }
                        if (index + 1) % COLUMNS == 0 {
                            ui.end_row();
                        }
                    }
                });
        });
    });
}

fn upload(ctx: &egui::Context, input: &UiInput<'_>, actions: &mut Vec<UiAction>) {
    egui::CentralPanel::default().show(ctx, |ui| {
        if ui.button("Back to gallery").clicked() {
            actions.push(UiAction::Navigate(Route::Gallery));
        }
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.25);
            ui.heading("Upload a 3D model");
            ui.label(format!(
                "OBJ, glTF, GLB or STL, up to {}.",
                format_limit(input.model_limit)
            ));
            ui.add_space(16.0);
            if ui.button(RichText::new("Choose file...").size(18.0)).clicked() {
                actions.push(UiAction::ChooseModelFile);
            }
        });
    });
}

fn viewer_controls(ctx: &egui::Context, input: &UiInput<'_>, actions: &mut Vec<UiAction>) {
    let state = input.state;
    egui::SidePanel::right("controls")
        .resizable(true)
        .default_width(300.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("< Gallery").clicked() {
                        actions.push(UiAction::Navigate(Route::Gallery));
                    }
                    let title = match (state.selection, input.custom_model_name) {
                        (ShapeSelection::CustomModel, Some(name)) => name.to_string(),
                        (selection, _) => selection.display_name().to_string(),
                    };
                    ui.heading(title);
                });
                ui.separator();

                rendering_section(ui, state, actions);
                texture_section(ui, state, input.texture_limit, actions);
                lighting_section(ui, state, actions);
                scene_section(ui, state, actions);

                ui.separator();
                ui.small("Space: pause  W: wireframe  H: helpers  Esc: gallery");
            });
        });
}

fn rendering_section(ui: &mut egui::Ui, state: &SessionState, actions: &mut Vec<UiAction>) {
    egui::CollapsingHeader::new("Rendering")
        .default_open(true)
        .show(ui, |ui| {
            let current = state.shading_mode;
            egui::ComboBox::from_id_salt("shading_mode")
                .selected_text(current.option().display_name)
                .show_ui(ui, |ui| {
                    for option in rendering_modes() {
                        if ui
                            .selectable_label(option.id == current, option.display_name)
                            .clicked()
                            && option.id != current
                        {
                            actions.push(UiAction::Update(SceneUpdate::SetShadingMode(option.id)));
                        }
                    }
                });
            ui.label(RichText::new(current.option().description).weak());

            let mut wireframe = state.wireframe;
            if ui.checkbox(&mut wireframe, "Wireframe").changed() {
                actions.push(UiAction::Update(SceneUpdate::SetWireframe(wireframe)));
            }

            let mut color = state.color.to_array();
            ui.horizontal(|ui| {
                ui.label("Color");
                if ui.color_edit_button_rgb(&mut color).changed() {
                    actions.push(UiAction::Update(SceneUpdate::SetColor(Rgb(color))));
                }
            });

            let mut shininess = state.shininess;
            if ui
                .add(egui::Slider::new(&mut shininess, 0.0..=100.0).text("Shininess"))
                .changed()
            {
                actions.push(UiAction::Update(SceneUpdate::SetShininess(shininess)));
            }
        });
}

fn texture_label(selection: &TextureSelection) -> &'static str {
    match selection {
        TextureSelection::None => "No Texture",
        TextureSelection::Builtin(id) => find_builtin(id).map_or("Unknown", |t| t.display_name),
        TextureSelection::Custom(_) => "Uploaded Texture",
    }
}

fn texture_section(
    ui: &mut egui::Ui,
    state: &SessionState,
    texture_limit: u64,
    actions: &mut Vec<UiAction>,
) {
    egui::CollapsingHeader::new("Texture")
        .default_open(true)
        .show(ui, |ui| {
            egui::ComboBox::from_id_salt("texture")
                .selected_text(texture_label(&state.texture))
                .show_ui(ui, |ui| {
                    for builtin in builtin_textures() {
                        let selection = match builtin.path {
                            None => TextureSelection::None,
                            Some(_) => TextureSelection::builtin(builtin.id),
                        };
                        let selected = selection == state.texture;
                        if ui.selectable_label(selected, builtin.display_name).clicked() && !selected {
                            actions.push(UiAction::Update(SceneUpdate::SetTexture(selection)));
                        }
                    }
                });
            ui.horizontal(|ui| {
                if ui.button("Upload texture...").clicked() {
                    actions.push(UiAction::ChooseTextureFile);
                }
                ui.label(RichText::new(format!("max {}", format_limit(texture_limit))).weak());
            });
        });
}

fn light_controls(ui: &mut egui::Ui, slot: LightSlot, label: &str, spec: &LightSpec, actions: &mut Vec<UiAction>) {
    let mut edit = |edit: LightEdit| actions.push(UiAction::Update(SceneUpdate::EditLight(slot, edit)));
    ui.horizontal(|ui| {
        let mut enabled = spec.enabled;
        if ui.checkbox(&mut enabled, label).changed() {
            edit(LightEdit::Enabled(enabled));
        }
        let mut color = spec.color.to_array();
        if ui.color_edit_button_rgb(&mut color).changed() {
            edit(LightEdit::Color(Rgb(color)));
        }
        if spec.kind.has_position() {
            let mut helper = spec.helper_visible;
            if ui.checkbox(&mut helper, "Helper").changed() {
                edit(LightEdit::HelperVisible(helper));
            }
        }
    });
    if !spec.enabled {
        return;
    }
    ui.indent(label, |ui| {
        let mut intensity = spec.intensity;
        if ui
            .add(egui::Slider::new(&mut intensity, 0.0..=2.0).text("Intensity"))
            .changed()
        {
            edit(LightEdit::Intensity(intensity));
        }
        if spec.kind.has_position() {
            for axis in Axis::ALL {
                let mut value = spec.position[axis.index()];
                if ui
                    .add(egui::Slider::new(&mut value, LIGHT_POSITION_RANGE).text(axis.label()))
                    .changed()
                {
                    edit(LightEdit::Axis(axis, value));
                }
            }
        }
    });
}

fn lighting_section(ui: &mut egui::Ui, state: &SessionState, actions: &mut Vec<UiAction>) {
    egui::CollapsingHeader::new("Lighting")
        .default_open(true)
        .show(ui, |ui| {
            let preset_text = state
                .preset
                .as_deref()
                .and_then(|id| lighting_presets().iter().find(|p| p.id == id))
                .map_or("Custom", |p| p.display_name);
            egui::ComboBox::from_id_salt("preset")
                .selected_text(preset_text)
                .show_ui(ui, |ui| {
                    for preset in lighting_presets() {
                        let selected = state.preset.as_deref() == Some(preset.id);
                        if ui
                            .selectable_label(selected, preset.display_name)
                            .on_hover_text(preset.description)
                            .clicked()
                        {
                            actions.push(UiAction::Update(SceneUpdate::ApplyPreset(
                                preset.id.to_string(),
                            )));
                        }
                    }
                });

            for which in BaseLight::ALL {
                light_controls(
                    ui,
                    LightSlot::Base(which),
                    which.label(),
                    state.base_lights.get(which),
                    actions,
                );
            }
            ui.separator();
            for index in 0..CUSTOM_LIGHT_COUNT {
                let label = format!("Light {}", index + 1);
                light_controls(
                    ui,
                    LightSlot::Custom(index),
                    &label,
                    &state.custom_lights[index],
                    actions,
                );
            }

            ui.horizontal(|ui| {
                let mut helpers = state.any_helper_visible();
                if ui.checkbox(&mut helpers, "All helpers").changed() {
                    actions.push(UiAction::Update(SceneUpdate::SetAllHelpers(helpers)));
                }
                if ui.button("Reset lights").clicked() {
                    actions.push(UiAction::Update(SceneUpdate::ResetLights));
                }
            });
        });
}

fn scene_section(ui: &mut egui::Ui, state: &SessionState, actions: &mut Vec<UiAction>) {
    egui::CollapsingHeader::new("Scene")
        .default_open(true)
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for background in backgrounds() {
                    if ui
                        .radio(state.background == background.id, background.display_name)
                        .clicked()
                    {
                        actions.push(UiAction::Update(SceneUpdate::SetBackground(background.id)));
                    }
                }
            });
            let mut paused = state.rotation_paused;
            if ui.checkbox(&mut paused, "Pause rotation").changed() {
                actions.push(UiAction::Update(SceneUpdate::SetRotationPaused(paused)));
            }
            if state.selection == ShapeSelection::CustomModel {
                let mut keep = state.keep_model_materials;
                if ui.checkbox(&mut keep, "Keep model materials").changed() {
                    actions.push(UiAction::Update(SceneUpdate::SetKeepModelMaterials(keep)));
                }
            }
        });
}
