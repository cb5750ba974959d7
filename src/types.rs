use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed check order used for seeker tie breaks.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// N -> E -> S -> W -> N
    pub fn clockwise(self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub fn anticlockwise(self) -> Self {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    #[default]
    InProgress,
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Normal,
    #[default]
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "n" | "normal" => Some(Self::Normal),
            "h" | "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostSpecies {
    Seeker,
    Lemming,
    ClockwiseLemming,
    AntiClockwiseLemming,
    Dormant,
    /// Tag from the level file that names no known species.
    Unresolved(String),
}

impl GhostSpecies {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            None | Some("seeker") => Self::Seeker,
            Some("lemming") => Self::Lemming,
            Some("clockwise") => Self::ClockwiseLemming,
            Some("anticlockwise") => Self::AntiClockwiseLemming,
            Some("dormant") => Self::Dormant,
            Some(other) => Self::Unresolved(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub score: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub species: GhostSpecies,
    pub heading: Option<Direction>,
    #[serde(rename = "thinkIntervalMs")]
    pub think_interval_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PointCollected { x: i32, y: i32 },
    HazardEntered { x: i32, y: i32 },
    PlayerCaught { ghost_id: usize },
    LevelCleared,
    GhostActivated { ghost_id: usize },
    GhostStuck { ghost_id: usize },
    FreezeToggled { frozen: bool },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub outcome: GameOutcome,
    pub score: u32,
    #[serde(rename = "totalPoints")]
    pub total_points: u32,
    pub frozen: bool,
    #[serde(rename = "pendingKeys")]
    pub pending_keys: String,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<SessionEvent>,
}
