use winit::keyboard::{KeyCode, ModifiersState};

use super::{Modifiers, RawKeyCode, ToolbarAction};

/// Host-level toolbar shortcuts. These never reach the canvas.
pub fn toolbar_action_for(code: KeyCode) -> Option<ToolbarAction> {
    match code {
        KeyCode::F5 => Some(ToolbarAction::Play),
        KeyCode::F6 => Some(ToolbarAction::Pause),
        KeyCode::F8 => Some(ToolbarAction::Stop),
        _ => None,
    }
}

pub fn modifiers_from_state(state: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, state.shift_key());
    modifiers.set(Modifiers::CONTROL, state.control_key());
    modifiers.set(Modifiers::ALT, state.alt_key());
    modifiers.set(Modifiers::META, state.super_key());
    modifiers
}

/// Host key numbering for a physical key. Keys with no host code are `None`.
pub fn raw_key_code(code: KeyCode) -> Option<RawKeyCode> {
    let raw = match code {
        KeyCode::KeyA => 'A',
        KeyCode::KeyB => 'B',
        KeyCode::KeyC => 'C',
        KeyCode::KeyD => 'D',
        KeyCode::KeyE => 'E',
        KeyCode::KeyF => 'F',
        KeyCode::KeyG => 'G',
        KeyCode::KeyH => 'H',
        KeyCode::KeyI => 'I',
        KeyCode::KeyJ => 'J',
        KeyCode::KeyK => 'K',
        KeyCode::KeyL => 'L',
        KeyCode::KeyM => 'M',
        KeyCode::KeyN => 'N',
        KeyCode::KeyO => 'O',
        KeyCode::KeyP => 'P',
        KeyCode::KeyQ => 'Q',
        KeyCode::KeyR => 'R',
        KeyCode::KeyS => 'S',
        KeyCode::KeyT => 'T',
        KeyCode::KeyU => 'U',
        KeyCode::KeyV => 'V',
        KeyCode::KeyW => 'W',
        KeyCode::KeyX => 'X',
        KeyCode::KeyY => 'Y',
        KeyCode::KeyZ => 'Z',
        KeyCode::Digit0 | KeyCode::Numpad0 => '0',
        KeyCode::Digit1 | KeyCode::Numpad1 => '1',
        KeyCode::Digit2 | KeyCode::Numpad2 => '2',
        KeyCode::Digit3 | KeyCode::Numpad3 => '3',
        KeyCode::Digit4 | KeyCode::Numpad4 => '4',
        KeyCode::Digit5 | KeyCode::Numpad5 => '5',
        KeyCode::Digit6 | KeyCode::Numpad6 => '6',
        KeyCode::Digit7 | KeyCode::Numpad7 => '7',
        KeyCode::Digit8 | KeyCode::Numpad8 => '8',
        KeyCode::Digit9 | KeyCode::Numpad9 => '9',
        KeyCode::Space => ' ',
        other => return special_key_code(other),
    };
    RawKeyCode::from_ascii(raw)
}

fn special_key_code(code: KeyCode) -> Option<RawKeyCode> {
    let raw = match code {
        KeyCode::Escape => RawKeyCode::ESCAPE,
        KeyCode::Tab => RawKeyCode::TAB,
        KeyCode::Backspace => RawKeyCode::BACKSPACE,
        KeyCode::Enter | KeyCode::NumpadEnter => RawKeyCode::RETURN,
        KeyCode::Insert => RawKeyCode::INSERT,
        KeyCode::Delete => RawKeyCode::DELETE,
        KeyCode::Home => RawKeyCode::HOME,
        KeyCode::End => RawKeyCode::END,
        KeyCode::ArrowLeft => RawKeyCode::LEFT,
        KeyCode::ArrowUp => RawKeyCode::UP,
        KeyCode::ArrowRight => RawKeyCode::RIGHT,
        KeyCode::ArrowDown => RawKeyCode::DOWN,
        KeyCode::PageUp => RawKeyCode::PAGE_UP,
        KeyCode::PageDown => RawKeyCode::PAGE_DOWN,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => RawKeyCode::SHIFT,
        KeyCode::ControlLeft | KeyCode::ControlRight => RawKeyCode::CONTROL,
        KeyCode::SuperLeft | KeyCode::SuperRight => RawKeyCode::META,
        KeyCode::AltLeft | KeyCode::AltRight => RawKeyCode::ALT,
        KeyCode::F1 => return RawKeyCode::function(1),
        KeyCode::F2 => return RawKeyCode::function(2),
        KeyCode::F3 => return RawKeyCode::function(3),
        KeyCode::F4 => return RawKeyCode::function(4),
        KeyCode::F5 => return RawKeyCode::function(5),
        KeyCode::F6 => return RawKeyCode::function(6),
        KeyCode::F7 => return RawKeyCode::function(7),
        KeyCode::F8 => return RawKeyCode::function(8),
        KeyCode::F9 => return RawKeyCode::function(9),
        KeyCode::F10 => return RawKeyCode::function(10),
        KeyCode::F11 => return RawKeyCode::function(11),
        KeyCode::F12 => return RawKeyCode::function(12),
        _ => return None,
    };
    Some(raw)
}
