use winit::keyboard::{KeyCode, PhysicalKey};

/// One-shot editor actions triggered from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    DeleteSelected,
    FrameSelection,
    Deselect,
    ZoomIn,
    ZoomOut,
}

/// Held-key state for camera movement, plus one-shot action mapping.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub aim_left: bool,
    pub aim_right: bool,
    pub aim_up: bool,
    pub aim_down: bool,
}

impl InputState {
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> InputAction {
        match key {
            PhysicalKey::Code(KeyCode::KeyW) => self.move_forward = pressed,
            PhysicalKey::Code(KeyCode::KeyS) => self.move_backward = pressed,
            PhysicalKey::Code(KeyCode::KeyA) => self.move_left = pressed,
            PhysicalKey::Code(KeyCode::KeyD) => self.move_right = pressed,
            PhysicalKey::Code(KeyCode::KeyE) => self.move_up = pressed,
            PhysicalKey::Code(KeyCode::KeyQ) => self.move_down = pressed,
            PhysicalKey::Code(KeyCode::ArrowLeft) => self.aim_left = pressed,
            PhysicalKey::Code(KeyCode::ArrowRight) => self.aim_right = pressed,
            PhysicalKey::Code(KeyCode::ArrowUp) => self.aim_up = pressed,
            PhysicalKey::Code(KeyCode::ArrowDown) => self.aim_down = pressed,
            PhysicalKey::Code(KeyCode::Delete) if pressed => {
                return InputAction::DeleteSelected;
            }
            PhysicalKey::Code(KeyCode::KeyF) if pressed => {
                return InputAction::FrameSelection;
            }
            PhysicalKey::Code(KeyCode::Escape) if pressed => {
                return InputAction::Deselect;
            }
            PhysicalKey::Code(KeyCode::Equal) if pressed => {
                return InputAction::ZoomIn;
            }
            PhysicalKey::Code(KeyCode::Minus) if pressed => {
                return InputAction::ZoomOut;
            }
            _ => {}
        }
        InputAction::None
    }

    /// Drops all held keys, e.g. when the window loses focus.
    pub fn clear_held(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_toggle_with_press_state() {
        let mut input = InputState::default();
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::KeyW), true),
            InputAction::None
        );
        assert!(input.move_forward);
        input.handle_key(PhysicalKey::Code(KeyCode::KeyW), false);
        assert!(!input.move_forward);
    }

    #[test]
    fn one_shot_actions_fire_on_press_only() {
        let mut input = InputState::default();
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::Delete), true),
            InputAction::DeleteSelected
        );
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::Delete), false),
            InputAction::None
        );
    }

    #[test]
    fn clear_held_releases_everything() {
        let mut input = InputState::default();
        input.handle_key(PhysicalKey::Code(KeyCode::KeyA), true);
        input.handle_key(PhysicalKey::Code(KeyCode::ArrowUp), true);
        input.clear_held();
        assert!(!input.move_left);
        assert!(!input.aim_up);
    }
}
