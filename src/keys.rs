//! Key codec: translates config key names into key identifiers and back.
//!
//! Config files name keys the way users type them: a single character (`"p"`,
//! `"/"`) or a bracketed symbolic name (`"<c-a>"`, `"<tab>"`, `"<pgdown>"`).
//! Symbolic names are matched case-insensitively against a fixed table. Terminal
//! events from crossterm are normalized into the same [`Key`] space so that a
//! binding built from config compares equal to the event that should trigger it.
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key name is empty")]
    Empty,

    #[error("unrecognized key '{0}'")]
    Unrecognized(String),
}

// ============================================================================
// Key Identifier
// ============================================================================

/// A key identifier: either a printable character or a named special key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Rune(char),
    Special(SpecialKey),
}

/// Keys without a printable representation, including mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    F(u8),
    Insert,
    Delete,
    Home,
    End,
    PgUp,
    PgDown,
    Up,
    Down,
    Left,
    Right,
    Tab,
    Enter,
    Esc,
    Backspace,
    Space,
    CtrlSpace,
    /// Control chord with a lowercase letter, digit or symbol.
    Ctrl(char),
    MouseLeft,
    MouseRight,
    MouseMiddle,
    MouseWheelUp,
    MouseWheelDown,
}

/// Modifier attached to a key event.
///
/// Shift is folded into the character itself and control chords are their own
/// [`SpecialKey::Ctrl`] identifiers, so only the remaining cases live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modifier {
    #[default]
    None,
    Alt,
    /// Mouse movement with a button held (drag).
    Motion,
}

const fn special(key: SpecialKey) -> Key {
    Key::Special(key)
}

const fn ctrl(c: char) -> Key {
    Key::Special(SpecialKey::Ctrl(c))
}

/// Symbolic key names accepted in config. Aliases that terminals cannot tell
/// apart (`<c-i>` and `<tab>`, `<c-m>` and `<enter>`) resolve to one identifier.
pub const KEY_NAMES: &[(&str, Key)] = &[
    ("<c-a>", ctrl('a')),
    ("<c-b>", ctrl('b')),
    ("<c-c>", ctrl('c')),
    ("<c-d>", ctrl('d')),
    ("<c-e>", ctrl('e')),
    ("<c-f>", ctrl('f')),
    ("<c-g>", ctrl('g')),
    ("<c-h>", ctrl('h')),
    ("<c-i>", special(SpecialKey::Tab)),
    ("<c-j>", ctrl('j')),
    ("<c-k>", ctrl('k')),
    ("<c-l>", ctrl('l')),
    ("<c-m>", special(SpecialKey::Enter)),
    ("<c-n>", ctrl('n')),
    ("<c-o>", ctrl('o')),
    ("<c-p>", ctrl('p')),
    ("<c-q>", ctrl('q')),
    ("<c-r>", ctrl('r')),
    ("<c-s>", ctrl('s')),
    ("<c-t>", ctrl('t')),
    ("<c-u>", ctrl('u')),
    ("<c-v>", ctrl('v')),
    ("<c-w>", ctrl('w')),
    ("<c-x>", ctrl('x')),
    ("<c-y>", ctrl('y')),
    ("<c-z>", ctrl('z')),
    ("<c-~>", special(SpecialKey::CtrlSpace)),
    ("<c-2>", special(SpecialKey::CtrlSpace)),
    ("<c-3>", special(SpecialKey::Esc)),
    ("<c-4>", ctrl('\\')),
    ("<c-5>", ctrl(']')),
    ("<c-6>", ctrl('6')),
    ("<c-7>", ctrl('/')),
    ("<c-8>", ctrl('8')),
    ("<c-space>", special(SpecialKey::CtrlSpace)),
    ("<c-\\>", ctrl('\\')),
    ("<c-[>", special(SpecialKey::Esc)),
    ("<c-]>", ctrl(']')),
    ("<c-/>", ctrl('/')),
    ("<c-_>", ctrl('/')),
    ("<backspace>", special(SpecialKey::Backspace)),
    ("<tab>", special(SpecialKey::Tab)),
    ("<enter>", special(SpecialKey::Enter)),
    ("<esc>", special(SpecialKey::Esc)),
    ("<space>", special(SpecialKey::Space)),
    ("<f1>", special(SpecialKey::F(1))),
    ("<f2>", special(SpecialKey::F(2))),
    ("<f3>", special(SpecialKey::F(3))),
    ("<f4>", special(SpecialKey::F(4))),
    ("<f5>", special(SpecialKey::F(5))),
    ("<f6>", special(SpecialKey::F(6))),
    ("<f7>", special(SpecialKey::F(7))),
    ("<f8>", special(SpecialKey::F(8))),
    ("<f9>", special(SpecialKey::F(9))),
    ("<f10>", special(SpecialKey::F(10))),
    ("<f11>", special(SpecialKey::F(11))),
    ("<f12>", special(SpecialKey::F(12))),
    ("<insert>", special(SpecialKey::Insert)),
    ("<delete>", special(SpecialKey::Delete)),
    ("<home>", special(SpecialKey::Home)),
    ("<end>", special(SpecialKey::End)),
    ("<pgup>", special(SpecialKey::PgUp)),
    ("<pgdown>", special(SpecialKey::PgDown)),
    ("<up>", special(SpecialKey::Up)),
    ("<down>", special(SpecialKey::Down)),
    ("<left>", special(SpecialKey::Left)),
    ("<right>", special(SpecialKey::Right)),
];

// ============================================================================
// Encode / Decode
// ============================================================================

/// Encode a config key name into a [`Key`].
///
/// Single characters map to themselves; anything longer must be a symbolic
/// name from [`KEY_NAMES`] (case-insensitive).
pub fn encode(name: &str) -> Result<Key, KeyError> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Err(KeyError::Empty),
        (Some(c), None) => Ok(Key::Rune(c)),
        _ => {
            let lowered = name.to_lowercase();
            KEY_NAMES
                .iter()
                .find(|(n, _)| *n == lowered)
                .map(|(_, key)| *key)
                .ok_or(KeyError::Unrecognized(lowered))
        }
    }
}

/// Render a key as a short label for the help menu and option bar.
pub fn decode(key: Key) -> String {
    let special = match key {
        Key::Rune(c) => return c.to_string(),
        Key::Special(s) => s,
    };

    match special {
        SpecialKey::F(n) => format!("f{}", n),
        SpecialKey::Insert => "insert".to_string(),
        SpecialKey::Delete => "delete".to_string(),
        SpecialKey::Home => "home".to_string(),
        SpecialKey::End => "end".to_string(),
        SpecialKey::PgUp => "pgup".to_string(),
        SpecialKey::PgDown => "pgdown".to_string(),
        SpecialKey::Up => "▲".to_string(),
        SpecialKey::Down => "▼".to_string(),
        SpecialKey::Left => "◄".to_string(),
        SpecialKey::Right => "►".to_string(),
        SpecialKey::Tab => "tab".to_string(),
        SpecialKey::Enter => "enter".to_string(),
        SpecialKey::Esc => "esc".to_string(),
        SpecialKey::Backspace => "backspace".to_string(),
        SpecialKey::Space => "space".to_string(),
        SpecialKey::CtrlSpace => "ctrl+space".to_string(),
        SpecialKey::Ctrl(c) => format!("ctrl+{}", c),
        SpecialKey::MouseLeft => "mouse left".to_string(),
        SpecialKey::MouseRight => "mouse right".to_string(),
        SpecialKey::MouseMiddle => "mouse middle".to_string(),
        SpecialKey::MouseWheelUp => "wheel up".to_string(),
        SpecialKey::MouseWheelDown => "wheel down".to_string(),
    }
}

// ============================================================================
// Terminal Event Translation
// ============================================================================

/// Normalize a crossterm key event into the codec's key space.
///
/// Returns `None` for keys the codec has no identifier for (media keys,
/// back-tab, F13 and above).
pub fn from_key_event(event: &KeyEvent) -> Option<(Key, Modifier)> {
    let modifier = if event.modifiers.contains(KeyModifiers::ALT) {
        Modifier::Alt
    } else {
        Modifier::None
    };

    let key = match event.code {
        KeyCode::Char(' ') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            special(SpecialKey::CtrlSpace)
        }
        KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => {
            ctrl(c.to_ascii_lowercase())
        }
        KeyCode::Char(' ') => special(SpecialKey::Space),
        KeyCode::Char(c) => Key::Rune(c),
        KeyCode::Enter => special(SpecialKey::Enter),
        KeyCode::Esc => special(SpecialKey::Esc),
        KeyCode::Tab => special(SpecialKey::Tab),
        KeyCode::Backspace => special(SpecialKey::Backspace),
        KeyCode::Insert => special(SpecialKey::Insert),
        KeyCode::Delete => special(SpecialKey::Delete),
        KeyCode::Home => special(SpecialKey::Home),
        KeyCode::End => special(SpecialKey::End),
        KeyCode::PageUp => special(SpecialKey::PgUp),
        KeyCode::PageDown => special(SpecialKey::PgDown),
        KeyCode::Up => special(SpecialKey::Up),
        KeyCode::Down => special(SpecialKey::Down),
        KeyCode::Left => special(SpecialKey::Left),
        KeyCode::Right => special(SpecialKey::Right),
        KeyCode::F(n) if (1..=12).contains(&n) => special(SpecialKey::F(n)),
        _ => return None,
    };

    Some((key, modifier))
}

/// Normalize a crossterm mouse event. Only presses, drags and wheel motion
/// produce keys; releases and bare movement are ignored.
pub fn from_mouse_event(event: &MouseEvent) -> Option<(Key, Modifier)> {
    let button = |b: MouseButton| match b {
        MouseButton::Left => SpecialKey::MouseLeft,
        MouseButton::Right => SpecialKey::MouseRight,
        MouseButton::Middle => SpecialKey::MouseMiddle,
    };

    match event.kind {
        MouseEventKind::Down(b) => Some((special(button(b)), Modifier::None)),
        MouseEventKind::Drag(b) => Some((special(button(b)), Modifier::Motion)),
        MouseEventKind::ScrollUp => Some((special(SpecialKey::MouseWheelUp), Modifier::None)),
        MouseEventKind::ScrollDown => {
            Some((special(SpecialKey::MouseWheelDown), Modifier::None))
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_single_char() {
        assert_eq!(encode("p"), Ok(Key::Rune('p')));
        assert_eq!(encode("P"), Ok(Key::Rune('P')));
        assert_eq!(encode("/"), Ok(Key::Rune('/')));
    }

    #[test]
    fn test_encode_multibyte_single_char() {
        // One rune, several bytes: still a single-character key
        assert_eq!(encode("é"), Ok(Key::Rune('é')));
    }

    #[test]
    fn test_encode_symbolic_case_insensitive() {
        assert_eq!(encode("<c-a>"), Ok(ctrl('a')));
        assert_eq!(encode("<C-A>"), Ok(ctrl('a')));
        assert_eq!(encode("<Tab>"), Ok(special(SpecialKey::Tab)));
        assert_eq!(encode("<PgDown>"), Ok(special(SpecialKey::PgDown)));
    }

    #[test]
    fn test_encode_terminal_aliases() {
        assert_eq!(encode("<c-i>"), encode("<tab>"));
        assert_eq!(encode("<c-m>"), encode("<enter>"));
        assert_eq!(encode("<c-[>"), encode("<esc>"));
    }

    #[test]
    fn test_encode_empty_fails() {
        assert_eq!(encode(""), Err(KeyError::Empty));
    }

    #[test]
    fn test_encode_unknown_fails() {
        let err = encode("<Hyper-X>").unwrap_err();
        assert_eq!(err, KeyError::Unrecognized("<hyper-x>".to_string()));
        assert!(err.to_string().contains("<hyper-x>"));
    }

    #[test]
    fn test_every_symbolic_name_decodes_non_empty() {
        for (name, _) in KEY_NAMES {
            let key = encode(name).unwrap();
            assert!(!decode(key).is_empty(), "empty label for {}", name);
        }
    }

    #[test]
    fn test_decode_labels() {
        assert_eq!(decode(Key::Rune('q')), "q");
        assert_eq!(decode(ctrl('d')), "ctrl+d");
        assert_eq!(decode(special(SpecialKey::Up)), "▲");
        assert_eq!(decode(special(SpecialKey::F(5))), "f5");
        assert_eq!(decode(special(SpecialKey::Space)), "space");
    }

    #[test]
    fn test_from_key_event_plain_and_ctrl() {
        let ev = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        assert_eq!(from_key_event(&ev), Some((Key::Rune('j'), Modifier::None)));

        let ev = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(from_key_event(&ev), Some((Key::Rune('R'), Modifier::None)));

        let ev = KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL);
        assert_eq!(from_key_event(&ev), Some((ctrl('o'), Modifier::None)));
        assert_eq!(from_key_event(&ev).map(|(k, _)| k), encode("<c-o>").ok());
    }

    #[test]
    fn test_from_key_event_space_matches_config() {
        let ev = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(from_key_event(&ev).map(|(k, _)| k), encode("<space>").ok());
    }

    #[test]
    fn test_from_key_event_alt_modifier() {
        let ev = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(from_key_event(&ev), Some((Key::Rune('x'), Modifier::Alt)));
    }

    #[test]
    fn test_from_key_event_unmapped() {
        let ev = KeyEvent::new(KeyCode::F(20), KeyModifiers::NONE);
        assert_eq!(from_key_event(&ev), None);
    }

    #[test]
    fn test_from_mouse_event() {
        let ev = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            from_mouse_event(&ev),
            Some((special(SpecialKey::MouseLeft), Modifier::None))
        );

        let ev = MouseEvent {
            kind: MouseEventKind::Moved,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(from_mouse_event(&ev), None);
    }

    proptest! {
        #[test]
        fn prop_single_char_encode_is_injective(a in any::<char>(), b in any::<char>()) {
            let ka = encode(&a.to_string()).unwrap();
            let kb = encode(&b.to_string()).unwrap();
            prop_assert_eq!(a == b, ka == kb);
        }

        #[test]
        fn prop_single_char_decodes_to_itself(c in any::<char>()) {
            prop_assert_eq!(decode(encode(&c.to_string()).unwrap()), c.to_string());
        }
    }
}
