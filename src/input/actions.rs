//! Logical input actions, decoupled from physical keys.

use macroquad::prelude::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Jump,
    Down,
    /// Dragon fire breath
    Fire,
    /// Dragon secondary attack (reserved slot)
    Charge,
    ToggleControl,
    ReloadLevel,
}

pub const ACTION_COUNT: usize = 8;

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::Left,
        Action::Right,
        Action::Jump,
        Action::Down,
        Action::Fire,
        Action::Charge,
        Action::ToggleControl,
        Action::ReloadLevel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Physical keys bound to this action.
    pub fn keys(self) -> &'static [KeyCode] {
        match self {
            Action::Left => &[KeyCode::A, KeyCode::Left],
            Action::Right => &[KeyCode::D, KeyCode::Right],
            Action::Jump => &[KeyCode::Space],
            Action::Down => &[KeyCode::S, KeyCode::Down],
            Action::Fire => &[KeyCode::F],
            Action::Charge => &[KeyCode::E],
            Action::ToggleControl => &[KeyCode::M],
            Action::ReloadLevel => &[KeyCode::R],
        }
    }
}
