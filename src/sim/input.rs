//! Keyboard and mouse state
//!
//! Tracks held keys and single-frame "just pressed" edges. The engine calls
//! [`InputManager::end_frame`] after gameplay has consumed the frame's input.

use glam::Vec2;

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    /// Fire the reveal pulse
    Pulse,
    /// Slingshot boost
    Action,
    Pause,
}

impl Key {
    pub const ALL: [Key; 9] = [
        Key::Forward,
        Key::Back,
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Pulse,
        Key::Action,
        Key::Pause,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Map a browser `KeyboardEvent.code` to a logical key
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(Key::Forward),
            "KeyS" | "ArrowDown" => Some(Key::Back),
            "KeyA" | "ArrowLeft" => Some(Key::Left),
            "KeyD" | "ArrowRight" => Some(Key::Right),
            "KeyQ" => Some(Key::Up),
            "KeyZ" => Some(Key::Down),
            "Space" => Some(Key::Pulse),
            "KeyE" | "ShiftLeft" | "ShiftRight" => Some(Key::Action),
            "Escape" | "KeyP" => Some(Key::Pause),
            _ => None,
        }
    }
}

/// Per-frame mouse velocity decay factor
const MOUSE_DECAY: f32 = 0.85;

#[derive(Debug, Clone, Default)]
pub struct InputManager {
    held: [bool; Key::ALL.len()],
    pressed_this_frame: [bool; Key::ALL.len()],
    mouse_velocity: Vec2,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        let i = key.index();
        // Auto-repeat keydown events must not re-trigger the edge
        if !self.held[i] {
            self.pressed_this_frame[i] = true;
        }
        self.held[i] = true;
    }

    pub fn key_up(&mut self, key: Key) {
        self.held[key.index()] = false;
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    /// True only during the frame the key went down
    pub fn just_pressed(&self, key: Key) -> bool {
        self.pressed_this_frame[key.index()]
    }

    /// Accumulate relative mouse motion (pixels)
    pub fn mouse_move(&mut self, dx: f32, dy: f32) {
        self.mouse_velocity += Vec2::new(dx, dy);
    }

    pub fn mouse_velocity(&self) -> Vec2 {
        self.mouse_velocity
    }

    /// Direction from held movement keys, x = right, y = forward
    pub fn move_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.is_pressed(Key::Right) {
            axis.x += 1.0;
        }
        if self.is_pressed(Key::Left) {
            axis.x -= 1.0;
        }
        if self.is_pressed(Key::Forward) {
            axis.y += 1.0;
        }
        if self.is_pressed(Key::Back) {
            axis.y -= 1.0;
        }
        axis.normalize_or_zero()
    }

    /// Vertical intent: +1 up, -1 down
    pub fn vertical_axis(&self) -> f32 {
        let mut v = 0.0;
        if self.is_pressed(Key::Up) {
            v += 1.0;
        }
        if self.is_pressed(Key::Down) {
            v -= 1.0;
        }
        v
    }

    /// Clear edges and decay the mouse (call once per frame, after gameplay)
    pub fn end_frame(&mut self) {
        self.pressed_this_frame = [false; Key::ALL.len()];
        self.mouse_velocity *= MOUSE_DECAY;
        if self.mouse_velocity.length_squared() < 1e-4 {
            self.mouse_velocity = Vec2::ZERO;
        }
    }

    /// Drop all held state (focus loss, chapter swap)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_lasts_one_frame() {
        let mut input = InputManager::new();
        input.key_down(Key::Pulse);
        assert!(input.just_pressed(Key::Pulse));
        assert!(input.is_pressed(Key::Pulse));

        input.end_frame();
        assert!(!input.just_pressed(Key::Pulse));
        assert!(input.is_pressed(Key::Pulse));

        // Repeat keydown while held is not a new edge
        input.key_down(Key::Pulse);
        assert!(!input.just_pressed(Key::Pulse));

        input.key_up(Key::Pulse);
        input.key_down(Key::Pulse);
        assert!(input.just_pressed(Key::Pulse));
    }

    #[test]
    fn test_mouse_velocity_decays() {
        let mut input = InputManager::new();
        input.mouse_move(10.0, 0.0);
        let before = input.mouse_velocity().x;
        input.end_frame();
        assert!(input.mouse_velocity().x < before);
        for _ in 0..200 {
            input.end_frame();
        }
        assert_eq!(input.mouse_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("KeyW"), Some(Key::Forward));
        assert_eq!(Key::from_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_code("Space"), Some(Key::Pulse));
        assert_eq!(Key::from_code("KeyE"), Some(Key::Action));
        assert_eq!(Key::from_code("F5"), None);
    }

    #[test]
    fn test_move_axis_normalized() {
        let mut input = InputManager::new();
        input.key_down(Key::Forward);
        input.key_down(Key::Right);
        let axis = input.move_axis();
        assert!((axis.length() - 1.0).abs() < 1e-5);
    }
}
