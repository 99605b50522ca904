//! Input events
//!
//! Platform-independent pointer and keyboard events delivered by the host
//! each frame. Only the first-person navigation system consumes them.

/// Keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Special keys
    Escape,
    Tab,
    Space,
    Enter,

    // Arrow keys
    Left,
    Right,
    Up,
    Down,

    // Modifier keys
    Shift,
    Control,
    Alt,
}

impl Key {
    /// Parse a key name as reported by common windowing layers
    /// (`"w"`, `"KeyW"`, `"ArrowUp"`, `"Space"`, `"ShiftLeft"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("Key").filter(|s| s.len() == 1).unwrap_or(name);
        if name.len() == 1 {
            let c = name.chars().next()?.to_ascii_lowercase();
            return match c {
                'a' => Some(Key::A),
                'b' => Some(Key::B),
                'c' => Some(Key::C),
                'd' => Some(Key::D),
                'e' => Some(Key::E),
                'f' => Some(Key::F),
                'g' => Some(Key::G),
                'h' => Some(Key::H),
                'i' => Some(Key::I),
                'j' => Some(Key::J),
                'k' => Some(Key::K),
                'l' => Some(Key::L),
                'm' => Some(Key::M),
                'n' => Some(Key::N),
                'o' => Some(Key::O),
                'p' => Some(Key::P),
                'q' => Some(Key::Q),
                'r' => Some(Key::R),
                's' => Some(Key::S),
                't' => Some(Key::T),
                'u' => Some(Key::U),
                'v' => Some(Key::V),
                'w' => Some(Key::W),
                'x' => Some(Key::X),
                'y' => Some(Key::Y),
                'z' => Some(Key::Z),
                ' ' => Some(Key::Space),
                _ => None,
            };
        }
        match name {
            "Escape" => Some(Key::Escape),
            "Tab" => Some(Key::Tab),
            "Space" => Some(Key::Space),
            "Enter" => Some(Key::Enter),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "Shift" | "ShiftLeft" | "ShiftRight" => Some(Key::Shift),
            "Control" | "ControlLeft" | "ControlRight" => Some(Key::Control),
            "Alt" | "AltLeft" | "AltRight" => Some(Key::Alt),
            _ => None,
        }
    }
}

/// Discrete input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Relative pointer motion in pixels.
    PointerMove { dx: f32, dy: f32 },
    /// Pointer lock acquired or released.
    PointerLockChange { locked: bool },
    KeyDown(Key),
    KeyUp(Key),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("w"), Some(Key::W));
        assert_eq!(Key::from_name("KeyW"), Some(Key::W));
        assert_eq!(Key::from_name("ArrowUp"), Some(Key::Up));
        assert_eq!(Key::from_name("ShiftLeft"), Some(Key::Shift));
        assert_eq!(Key::from_name("Key"), None);
        assert_eq!(Key::from_name("F13"), None);
    }
}
