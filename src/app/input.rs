use winit::keyboard::{KeyCode, PhysicalKey};

/// Viewer keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    ToggleRotation,
    ToggleWireframe,
    ToggleHelpers,
    BackToGallery,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    /// Last physical key that produced an action, cleared on release.
    held: Option<PhysicalKey>,
}

impl InputState {
    /// Maps a key event to its action. Releases and auto-repeat do nothing.
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> InputAction {
        if !pressed {
            if self.held == Some(key) {
                self.held = None;
            }
            return InputAction::None;
        }
        if self.held == Some(key) {
            return InputAction::None;
        }
        let action = match key {
            PhysicalKey::Code(KeyCode::Space) => InputAction::ToggleRotation,
            PhysicalKey::Code(KeyCode::KeyW) => InputAction::ToggleWireframe,
            PhysicalKey::Code(KeyCode::KeyH) => InputAction::ToggleHelpers,
            PhysicalKey::Code(KeyCode::Escape) => InputAction::BackToGallery,
            _ => InputAction::None,
        };
        if action != InputAction::None {
            self.held = Some(key);
        }
        action
    }
}
