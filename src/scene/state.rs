//! Session parameters and the pure updates that change them.

use crate::color::Rgb;
use crate::lighting::material::{resolve_material_with_shininess, DEFAULT_SHININESS};
use crate::lighting::{
    default_custom_lights, find_preset, Axis, BackgroundId, BaseLight, BaseLights, LightSpec,
    MaterialDescription, ShadingMode, CUSTOM_LIGHT_COUNT,
};
use crate::shapes::ShapeSelection;
use crate::textures::{TextureKey, TextureSelection};

/// Addresses one of the six user-editable lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightSlot {
    Base(BaseLight),
    /// Index into the custom lights, `0..CUSTOM_LIGHT_COUNT`.
    Custom(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightEdit {
    Enabled(bool),
    Color(Rgb),
    Intensity(f32),
    Axis(Axis, f32),
    HelperVisible(bool),
}

impl LightEdit {
    fn apply(self, spec: LightSpec) -> LightSpec {
        match self {
            LightEdit::Enabled(enabled) => spec.with_enabled(enabled),
            LightEdit::Color(color) => spec.with_color(color),
            LightEdit::Intensity(intensity) => spec.with_intensity(intensity),
            LightEdit::Axis(axis, value) => spec.with_axis(axis, value),
            LightEdit::HelperVisible(visible) => spec.with_helper_visible(visible),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneUpdate {
    SelectShape(ShapeSelection),
    SetShadingMode(ShadingMode),
    SetWireframe(bool),
    ToggleWireframe,
    SetColor(Rgb),
    SetShininess(f32),
    SetTexture(TextureSelection),
    EditLight(LightSlot, LightEdit),
    ApplyPreset(String),
    SetAllHelpers(bool),
    ToggleHelpers,
    SetBackground(BackgroundId),
    SetRotationPaused(bool),
    ToggleRotation,
    SetKeepModelMaterials(bool),
    ResetLights,
}

/// Every user-facing parameter of a viewing session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub selection: ShapeSelection,
    pub shading_mode: ShadingMode,
    /// Quick toggle; wins over `shading_mode` while on.
    pub wireframe: bool,
    pub color: Rgb,
    pub shininess: f32,
    pub texture: TextureSelection,
    pub base_lights: BaseLights,
    pub custom_lights: [LightSpec; CUSTOM_LIGHT_COUNT],
    pub preset: Option<String>,
    pub background: BackgroundId,
    pub rotation_paused: bool,
    /// Show a custom model's own materials instead of the session material.
    pub keep_model_materials: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        let base = BaseLights::default();
        Self {
            selection: ShapeSelection::default(),
            shading_mode: ShadingMode::default(),
            wireframe: false,
            color: Rgb::WHITE,
            shininess: DEFAULT_SHININESS,
            texture: TextureSelection::None,
            // the point light starts switched off
            base_lights: BaseLights {
                specular: base.specular.with_enabled(false),
                ..base
            },
            custom_lights: default_custom_lights(),
            preset: Some("default".to_string()),
            background: BackgroundId::default(),
            rotation_paused: false,
            keep_model_materials: false,
        }
    }
}

impl SessionState {
    /// Returns the updated state. `self` is left untouched; an update that does
    /// not apply (unknown preset, out-of-range light) yields an unchanged copy.
    pub fn apply(&self, update: SceneUpdate) -> SessionState {
        let mut next = self.clone();
        match update {
            SceneUpdate::SelectShape(selection) => next.selection = selection,
            SceneUpdate::SetShadingMode(mode) => next.shading_mode = mode,
            SceneUpdate::SetWireframe(on) => next.wireframe = on,
            SceneUpdate::ToggleWireframe => next.wireframe = !self.wireframe,
            SceneUpdate::SetColor(color) => next.color = color,
            SceneUpdate::SetShininess(shininess) => next.shininess = shininess.max(0.0),
            SceneUpdate::SetTexture(texture) => next.texture = texture,
            SceneUpdate::EditLight(slot, edit) => match slot {
                LightSlot::Base(which) => {
                    let spec = edit.apply(*self.base_lights.get(which));
                    next.base_lights = self.base_lights.with(which, spec);
                    if matches!(edit, LightEdit::Color(_)) {
                        next.preset = None;
                    }
                }
                LightSlot::Custom(index) => match self.custom_lights.get(index) {
                    Some(spec) => next.custom_lights[index] = edit.apply(*spec),
                    None => log::warn!("no custom light {}", index),
                },
            },
            SceneUpdate::ApplyPreset(id) => match find_preset(&id) {
                Some(preset) => {
                    next.base_lights = self.base_lights.with_preset(preset);
                    next.preset = Some(id);
                }
                None => log::warn!("unknown lighting preset '{}'", id),
            },
            SceneUpdate::SetAllHelpers(visible) => next.set_all_helpers(visible),
            SceneUpdate::ToggleHelpers => next.set_all_helpers(!self.any_helper_visible()),
            SceneUpdate::SetBackground(background) => next.background = background,
            SceneUpdate::SetRotationPaused(paused) => next.rotation_paused = paused,
            SceneUpdate::ToggleRotation => next.rotation_paused = !self.rotation_paused,
            SceneUpdate::SetKeepModelMaterials(keep) => next.keep_model_materials = keep,
            SceneUpdate::ResetLights => {
                let defaults = SessionState::default();
                next.base_lights = defaults.base_lights;
                next.custom_lights = defaults.custom_lights;
                next.preset = defaults.preset;
            }
        }
        next
    }

    fn set_all_helpers(&mut self, visible: bool) {
        self.base_lights = BaseLights {
            ambient: self.base_lights.ambient.with_helper_visible(visible),
            diffuse: self.base_lights.diffuse.with_helper_visible(visible),
            specular: self.base_lights.specular.with_helper_visible(visible),
        };
        self.custom_lights = self
            .custom_lights
            .map(|spec| spec.with_helper_visible(visible));
    }

    pub fn any_helper_visible(&self) -> bool {
        self.lights().any(|spec| spec.helper_visible)
    }

    /// Base lights first, then the custom lights.
    pub fn lights(&self) -> impl Iterator<Item = &LightSpec> {
        self.base_lights.iter().chain(self.custom_lights.iter())
    }

    pub fn light(&self, slot: LightSlot) -> Option<&LightSpec> {
        match slot {
            LightSlot::Base(which) => Some(self.base_lights.get(which)),
            LightSlot::Custom(index) => self.custom_lights.get(index),
        }
    }

    pub fn effective_mode(&self) -> ShadingMode {
        if self.wireframe {
            ShadingMode::Wireframe
        } else {
            self.shading_mode
        }
    }

    /// Material for the current parameters, texture still unbound.
    pub fn material(&self, texture: Option<&TextureKey>) -> MaterialDescription {
        resolve_material_with_shininess(self.effective_mode(), self.color, texture, self.shininess)
    }

    /// Whether going from `self` to `next` needs a new material.
    pub fn material_inputs_differ(&self, next: &SessionState) -> bool {
        self.effective_mode() != next.effective_mode()
            || self.color != next.color
            || self.shininess != next.shininess
            || self.texture != next.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeId;
    use glam::Vec3;

    #[test]
    fn updates_do_not_touch_the_original() {
        let state = SessionState::default();
        let next = state.apply(SceneUpdate::EditLight(
            LightSlot::Custom(0),
            LightEdit::Axis(Axis::X, 5.0),
        ));
        assert_eq!(next.custom_lights[0].position, Vec3::new(5.0, 2.0, 2.0));
        assert_eq!(state.custom_lights[0].position, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(
            SessionState::default().custom_lights[0].position,
            Vec3::new(2.0, 2.0, 2.0)
        );
    }

    #[test]
    fn out_of_range_light_is_ignored() {
        let state = SessionState::default();
        let next = state.apply(SceneUpdate::EditLight(
            LightSlot::Custom(CUSTOM_LIGHT_COUNT),
            LightEdit::Enabled(true),
        ));
        assert_eq!(next, state);
        assert_eq!(next.custom_lights.len(), CUSTOM_LIGHT_COUNT);
    }

    #[test]
    fn wireframe_toggle_overrides_the_mode() {
        let state = SessionState::default().apply(SceneUpdate::SetShadingMode(ShadingMode::Toon));
        let wire = state.apply(SceneUpdate::ToggleWireframe);
        assert_eq!(wire.effective_mode(), ShadingMode::Wireframe);
        assert!(wire.material(None).wireframe);
        let back = wire.apply(SceneUpdate::ToggleWireframe);
        assert_eq!(back.effective_mode(), ShadingMode::Toon);
    }

    #[test]
    fn presets_and_manual_colors() {
        let state = SessionState::default().apply(SceneUpdate::ApplyPreset("vibrant".into()));
        assert_eq!(state.preset.as_deref(), Some("vibrant"));
        assert_eq!(state.base_lights.ambient.color, Rgb::from_hex(0x606060));

        let edited = state.apply(SceneUpdate::EditLight(
            LightSlot::Base(BaseLight::Diffuse),
            LightEdit::Color(Rgb::from_hex(0xff0000)),
        ));
        assert_eq!(edited.preset, None);

        let unknown = edited.apply(SceneUpdate::ApplyPreset("disco".into()));
        assert_eq!(unknown, edited);
    }

    #[test]
    fn helper_toggle_flips_every_light() {
        let state = SessionState::default();
        assert!(!state.any_helper_visible());
        let shown = state.apply(SceneUpdate::ToggleHelpers);
        assert!(shown.lights().all(|spec| spec.helper_visible));
        let hidden = shown.apply(SceneUpdate::ToggleHelpers);
        assert!(hidden.lights().all(|spec| !spec.helper_visible));
    }

    #[test]
    fn only_material_inputs_trigger_rebuilds() {
        let state = SessionState::default();
        let rotated = state.apply(SceneUpdate::SetRotationPaused(true));
        assert!(!state.material_inputs_differ(&rotated));
        let shape = state.apply(SceneUpdate::SelectShape(ShapeSelection::Builtin(ShapeId::Torus)));
        assert!(!state.material_inputs_differ(&shape));
        let colored = state.apply(SceneUpdate::SetColor(Rgb::BLACK));
        assert!(state.material_inputs_differ(&colored));
    }

    #[test]
    fn reset_restores_default_lights() {
        let state = SessionState::default()
            .apply(SceneUpdate::ApplyPreset("dark".into()))
            .apply(SceneUpdate::EditLight(LightSlot::Custom(2), LightEdit::Enabled(true)));
        let reset = state.apply(SceneUpdate::ResetLights);
        assert_eq!(reset.base_lights, SessionState::default().base_lights);
        assert_eq!(reset.custom_lights, default_custom_lights());
    }
}
