/// Keys the simulation reacts to. Anything else is dropped at the window
/// layer before reaching the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Left,
    Right,
    Space,
    KeyR,
    KeyD,
    KeyF,
    KeyH,
    Comma,
    Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub state: ButtonState,
    pub shift: bool,
}

impl KeyInput {
    pub fn pressed(key: Key) -> KeyInput {
        KeyInput {
            key,
            state: ButtonState::Pressed,
            shift: false,
        }
    }

    pub fn released(key: Key) -> KeyInput {
        KeyInput {
            key,
            state: ButtonState::Released,
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> KeyInput {
        self.shift = true;
        self
    }
}
