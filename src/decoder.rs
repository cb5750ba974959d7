use log::debug;

use crate::constants::MAX_COUNT;

const DOUBLED_PREFIX: char = 'g';
const GOTO_LINE_KEY: char = 'G';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FindSpec {
    pub target: char,
    pub forward: bool,
    /// `f`/`F` land on the target, `t`/`T` one cell before it.
    pub inclusive: bool,
}

impl FindSpec {
    pub fn from_prefix(prefix: char, target: char) -> Option<Self> {
        let (forward, inclusive) = match prefix {
            'f' => (true, true),
            'F' => (false, true),
            't' => (true, false),
            'T' => (false, false),
            _ => return None,
        };
        Some(Self {
            target,
            forward,
            inclusive,
        })
    }

    pub fn reversed(self) -> Self {
        Self {
            forward: !self.forward,
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Left,
    Down,
    Up,
    Right,
    WordForward { big: bool },
    WordBackward { big: bool },
    WordEnd { big: bool },
    LineStart,
    LineEnd,
    FirstNonBlank,
    BracketMatch,
    Find(FindSpec),
    RepeatFind { reverse: bool },
    FirstLine,
    LastLine,
    MiddleLine,
    GotoLine(u32),
    ToggleFreeze,
}

impl Motion {
    pub fn from_key(key: char) -> Option<Self> {
        let motion = match key {
            'h' => Self::Left,
            'j' => Self::Down,
            'k' => Self::Up,
            'l' => Self::Right,
            'w' => Self::WordForward { big: false },
            'W' => Self::WordForward { big: true },
            'b' => Self::WordBackward { big: false },
            'B' => Self::WordBackward { big: true },
            'e' => Self::WordEnd { big: false },
            'E' => Self::WordEnd { big: true },
            '0' => Self::LineStart,
            '$' => Self::LineEnd,
            '^' => Self::FirstNonBlank,
            '%' => Self::BracketMatch,
            ';' => Self::RepeatFind { reverse: false },
            ',' => Self::RepeatFind { reverse: true },
            'H' => Self::FirstLine,
            'G' | 'L' => Self::LastLine,
            'M' => Self::MiddleLine,
            '!' => Self::ToggleFreeze,
            _ => return None,
        };
        Some(motion)
    }
}

/// A fully decoded command. For finds `count` selects the Nth occurrence;
/// for everything else the motion is repeated `count` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    pub motion: Motion,
    pub count: u32,
}

impl Command {
    pub fn once(motion: Motion) -> Self {
        Self { motion, count: 1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderState {
    Empty,
    AccumulatingDigits,
    AwaitingSecondPrefixKey,
    AwaitingFindTargetChar,
}

fn is_find_prefix(key: char) -> bool {
    matches!(key, 'f' | 'F' | 't' | 'T')
}

/// Turns a one-key-at-a-time stream into [`Command`]s with one key of
/// lookahead. Unrecognized combinations reset the buffer silently.
#[derive(Clone, Debug, Default)]
pub struct CommandDecoder {
    digits: String,
    prefix: Option<char>,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DecoderState {
        match self.prefix {
            Some(DOUBLED_PREFIX) => DecoderState::AwaitingSecondPrefixKey,
            Some(_) => DecoderState::AwaitingFindTargetChar,
            None if !self.digits.is_empty() => DecoderState::AccumulatingDigits,
            None => DecoderState::Empty,
        }
    }

    /// Keys typed so far for the command in progress.
    pub fn pending(&self) -> String {
        let mut pending = self.digits.clone();
        pending.extend(self.prefix);
        pending
    }

    pub fn reset(&mut self) {
        self.digits.clear();
        self.prefix = None;
    }

    pub fn feed(&mut self, key: char) -> Option<Command> {
        // Esc and other control keys cancel whatever is pending
        if key.is_control() {
            self.reset();
            return None;
        }
        if let Some(prefix) = self.prefix.filter(|prefix| is_find_prefix(*prefix)) {
            let count = self.take_count().unwrap_or(1);
            return FindSpec::from_prefix(prefix, key).map(|spec| Command {
                motion: Motion::Find(spec),
                count,
            });
        }

        if key == DOUBLED_PREFIX {
            if self.prefix == Some(DOUBLED_PREFIX) {
                self.reset();
                return Some(Command::once(Motion::FirstLine));
            }
            if self.digits.is_empty() && self.prefix.is_none() {
                self.prefix = Some(DOUBLED_PREFIX);
                return None;
            }
            self.discard(key);
            return None;
        }

        // a lone `g` accepts nothing but a second `g`
        if self.prefix.is_some() {
            self.discard(key);
            return None;
        }

        let continues_count = key.is_ascii_digit() && (key != '0' || !self.digits.is_empty());
        if continues_count {
            self.push_digit(key);
            return None;
        }

        if is_find_prefix(key) {
            self.prefix = Some(key);
            return None;
        }

        let count = self.take_count();
        if key == GOTO_LINE_KEY {
            if let Some(line) = count {
                return Some(Command::once(Motion::GotoLine(line)));
            }
        }
        match Motion::from_key(key) {
            Some(motion) => Some(Command {
                motion,
                count: count.unwrap_or(1),
            }),
            None => {
                debug!("decoder: no command for key {key:?}");
                None
            }
        }
    }

    fn take_count(&mut self) -> Option<u32> {
        self.prefix = None;
        if self.digits.is_empty() {
            return None;
        }
        let count = self.digits.parse::<u32>().ok();
        self.digits.clear();
        count
    }

    /// Counts saturate at `MAX_COUNT`; the buffer never holds more.
    fn push_digit(&mut self, key: char) {
        self.digits.push(key);
        let within_cap = self
            .digits
            .parse::<u32>()
            .is_ok_and(|count| count <= MAX_COUNT);
        if !within_cap {
            self.digits = MAX_COUNT.to_string();
        }
    }

    fn discard(&mut self, key: char) {
        debug!(
            "decoder: discarding {:?} after key {key:?}",
            self.pending()
        );
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn feed_all(decoder: &mut CommandDecoder, keys: &str) -> Vec<Command> {
        keys.chars().filter_map(|key| decoder.feed(key)).collect()
    }

    #[test]
    fn single_keys_emit_immediately() {
        let mut decoder = CommandDecoder::new();
        assert_eq!(decoder.feed('l'), Some(Command::once(Motion::Right)));
        assert_eq!(
            decoder.feed('W'),
            Some(Command::once(Motion::WordForward { big: true }))
        );
        assert_eq!(decoder.state(), DecoderState::Empty);
    }

    #[test]
    fn count_applies_to_next_key() {
        let mut decoder = CommandDecoder::new();
        assert_eq!(decoder.feed('3'), None);
        assert_eq!(decoder.state(), DecoderState::AccumulatingDigits);
        assert_eq!(
            decoder.feed('l'),
            Some(Command {
                motion: Motion::Right,
                count: 3
            })
        );
        assert_eq!(decoder.pending(), "");
    }

    #[test]
    fn zero_is_line_start_only_as_first_key() {
        let mut decoder = CommandDecoder::new();
        assert_eq!(decoder.feed('0'), Some(Command::once(Motion::LineStart)));
        let commands = feed_all(&mut decoder, "10j");
        assert_eq!(
            commands,
            vec![Command {
                motion: Motion::Down,
                count: 10
            }]
        );
    }

    #[test]
    fn doubled_prefix_jumps_to_first_line() {
        let mut decoder = CommandDecoder::new();
        assert_eq!(decoder.feed('g'), None);
        assert_eq!(decoder.state(), DecoderState::AwaitingSecondPrefixKey);
        assert_eq!(decoder.feed('g'), Some(Command::once(Motion::FirstLine)));
    }

    #[test]
    fn digits_then_goto_key_jumps_to_line() {
        let mut decoder = CommandDecoder::new();
        assert_eq!(
            feed_all(&mut decoder, "12G"),
            vec![Command::once(Motion::GotoLine(12))]
        );
        assert_eq!(feed_all(&mut decoder, "G"), vec![Command::once(Motion::LastLine)]);
    }

    #[test]
    fn find_prefix_takes_any_next_key() {
        let mut decoder = CommandDecoder::new();
        assert_eq!(decoder.feed('t'), None);
        assert_eq!(decoder.state(), DecoderState::AwaitingFindTargetChar);
        assert_eq!(
            decoder.feed('3'),
            Some(Command::once(Motion::Find(FindSpec {
                target: '3',
                forward: true,
                inclusive: false,
            })))
        );
    }

    #[test]
    fn counted_find_selects_nth_occurrence() {
        let mut decoder = CommandDecoder::new();
        assert_eq!(
            feed_all(&mut decoder, "2Fx"),
            vec![Command {
                motion: Motion::Find(FindSpec {
                    target: 'x',
                    forward: false,
                    inclusive: true,
                }),
                count: 2,
            }]
        );
    }

    #[test]
    fn interrupted_sequences_reset_silently() {
        let mut decoder = CommandDecoder::new();
        assert!(feed_all(&mut decoder, "g3").is_empty());
        assert_eq!(decoder.state(), DecoderState::Empty);
        assert!(feed_all(&mut decoder, "gx").is_empty());
        assert!(feed_all(&mut decoder, "3g").is_empty());
        assert_eq!(decoder.state(), DecoderState::Empty);
        assert!(feed_all(&mut decoder, "z").is_empty());
        assert_eq!(decoder.feed('k'), Some(Command::once(Motion::Up)));
    }

    #[test]
    fn huge_counts_are_capped() {
        let mut decoder = CommandDecoder::new();
        let commands = feed_all(&mut decoder, "99999999l");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].count, MAX_COUNT);
    }

    #[test]
    fn count_past_the_cap_saturates_instead_of_truncating() {
        let mut decoder = CommandDecoder::new();
        assert!(feed_all(&mut decoder, "12345").is_empty());
        assert_eq!(decoder.pending(), MAX_COUNT.to_string());
        assert_eq!(
            decoder.feed('l'),
            Some(Command {
                motion: Motion::Right,
                count: MAX_COUNT
            })
        );
        assert_eq!(
            feed_all(&mut decoder, "10000G"),
            vec![Command::once(Motion::GotoLine(MAX_COUNT))]
        );
    }

    #[test]
    fn pending_shows_count_and_prefix() {
        let mut decoder = CommandDecoder::new();
        feed_all(&mut decoder, "4f");
        assert_eq!(decoder.pending(), "4f");
        decoder.reset();
        assert_eq!(decoder.pending(), "");
    }

    #[test]
    fn escape_cancels_a_pending_find() {
        let mut decoder = CommandDecoder::new();
        assert!(feed_all(&mut decoder, "2f\u{1b}").is_empty());
        assert_eq!(decoder.state(), DecoderState::Empty);
        assert_eq!(decoder.feed('x'), None);
    }

    proptest! {
        #[test]
        fn count_prefix_matches_repeated_keys(count in 1u32..200, key in prop::sample::select(vec!['h', 'j', 'k', 'l', 'w', 'b', 'e', 'W', 'B', 'E', '$', '%', ';'])) {
            let mut decoder = CommandDecoder::new();
            let keys = format!("{count}{key}");
            let commands = feed_all(&mut decoder, &keys);
            prop_assert_eq!(commands.len(), 1);
            prop_assert_eq!(commands[0].count, count);
            prop_assert_eq!(Some(commands[0].motion), Motion::from_key(key));
            prop_assert_eq!(decoder.state(), DecoderState::Empty);
        }
    }
}
