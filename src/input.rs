use glam::Vec2;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Modifier keys as sampled when a drag starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        ctrl: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

/// Held navigation keys plus pointer-look state. Owned by the navigator and
/// fed by the host; tests build it directly.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub look_up: bool,
    pub look_down: bool,
    /// Right mouse button held for drag-look.
    pub look_button: bool,
    pub pointer: Option<Vec2>,
    pub modifiers: Modifiers,
}

impl InputState {
    /// Returns true when the key is one of the navigation keys.
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> bool {
        let PhysicalKey::Code(code) = key else {
            return false;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => self.move_forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.move_backward = pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.move_left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.move_right = pressed,
            KeyCode::KeyQ => self.turn_left = pressed,
            KeyCode::KeyE => self.turn_right = pressed,
            KeyCode::KeyR => self.look_up = pressed,
            KeyCode::KeyF => self.look_down = pressed,
            _ => return false,
        }
        true
    }

    /// Record a new pointer position and return the delta from the last one.
    pub fn pointer_moved(&mut self, position: Vec2) -> Vec2 {
        let delta = self
            .pointer
            .map(|last| position - last)
            .unwrap_or(Vec2::ZERO);
        self.pointer = Some(position);
        delta
    }

    pub fn any_navigation_held(&self) -> bool {
        self.move_forward
            || self.move_backward
            || self.move_left
            || self.move_right
            || self.turn_left
            || self.turn_right
            || self.look_up
            || self.look_down
    }

    /// Drop every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        let modifiers = self.modifiers;
        *self = Self {
            modifiers,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_share_movement_flags() {
        let mut input = InputState::default();
        assert!(input.handle_key(PhysicalKey::Code(KeyCode::ArrowUp), true));
        assert!(input.move_forward);
        assert!(input.handle_key(PhysicalKey::Code(KeyCode::KeyW), false));
        assert!(!input.move_forward);
        assert!(input.handle_key(PhysicalKey::Code(KeyCode::KeyQ), true));
        assert!(input.turn_left);
        assert!(!input.handle_key(PhysicalKey::Code(KeyCode::KeyZ), true));
    }

    #[test]
    fn pointer_delta_starts_at_zero() {
        let mut input = InputState::default();
        assert_eq!(input.pointer_moved(Vec2::new(10.0, 10.0)), Vec2::ZERO);
        assert_eq!(
            input.pointer_moved(Vec2::new(13.0, 8.0)),
            Vec2::new(3.0, -2.0)
        );
    }

    #[test]
    fn release_all_keeps_modifiers() {
        let mut input = InputState {
            move_left: true,
            look_button: true,
            modifiers: Modifiers::shift(),
            ..InputState::default()
        };
        input.release_all();
        assert!(!input.any_navigation_held());
        assert!(!input.look_button);
        assert!(input.modifiers.shift);
    }
}
