use crate::types::{Direction, Vec2};

pub(super) fn offset(pos: Vec2, dir: Direction) -> Vec2 {
    let (dx, dy) = dir.delta();
    Vec2::new(pos.x + dx, pos.y + dy)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CharClass {
    Space,
    Word,
    Punct,
}

/// Big words treat every non-space character as one class.
pub(super) fn char_class(ch: char, big: bool) -> CharClass {
    if ch == ' ' {
        CharClass::Space
    } else if big || ch.is_ascii_alphanumeric() {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// Returns the matching bracket and whether it lies forward.
pub(super) fn bracket_pair(ch: char) -> Option<(char, bool)> {
    match ch {
        '(' => Some((')', true)),
        '{' => Some(('}', true)),
        '[' => Some((']', true)),
        ')' => Some(('(', false)),
        '}' => Some(('{', false)),
        ']' => Some(('[', false)),
        _ => None,
    }
}
