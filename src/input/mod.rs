//! Input handling
//!
//! The simulation never touches the keyboard directly; it reads an
//! `InputState` snapshot taken once per frame. That keeps the tick
//! deterministic and lets tests drive the game without a window.

pub mod actions;

pub use actions::{Action, ACTION_COUNT};

#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    held: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample the keyboard for this frame.
    pub fn poll(&mut self) {
        use macroquad::prelude::{is_key_down, is_key_pressed};
        for action in Action::ALL {
            let i = action.index();
            self.held[i] = action.keys().iter().any(|&k| is_key_down(k));
            self.pressed[i] = action.keys().iter().any(|&k| is_key_pressed(k));
        }
    }

    pub fn down(&self, action: Action) -> bool {
        self.held[action.index()]
    }

    /// True only on the frame the action was first pressed.
    pub fn pressed(&self, action: Action) -> bool {
        self.pressed[action.index()]
    }

    #[cfg(test)]
    pub fn set_down(&mut self, action: Action, down: bool) {
        self.held[action.index()] = down;
    }

    #[cfg(test)]
    pub fn set_pressed(&mut self, action: Action, pressed: bool) {
        self.pressed[action.index()] = pressed;
        if pressed {
            self.held[action.index()] = true;
        }
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
