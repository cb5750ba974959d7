use std::collections::VecDeque;

/// Non-blocking key source. `None` means no key is pending this tick.
pub trait KeySource {
    fn next_key(&mut self) -> Option<char>;
}

/// Replays a fixed key script, one key per call.
#[derive(Clone, Debug, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<char>,
}

impl ScriptedKeys {
    pub fn new(script: &str) -> Self {
        Self {
            keys: script.chars().collect(),
        }
    }

    pub fn push(&mut self, key: char) {
        self.keys.push_back(key);
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> Option<char> {
        self.keys.pop_front()
    }
}
