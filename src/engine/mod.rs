use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::SessionConfig;
use crate::constants::{
    think_interval_ms, DEFAULT_HEADING, DORMANT_ACTIVATION_RADIUS, EXTRA_ROTATION_CHANCE,
    GUTTER_WIDTH, MAX_HEADING_ROTATIONS, PHASE_THROUGH_WALL_CHANCE, SEEKER_SENTINEL_DISTANCE,
};
use crate::decoder::{Command, CommandDecoder, FindSpec, Motion};
use crate::error::{LevelError, MotionError, MotionResult};
use crate::input::KeySource;
use crate::level::{GhostDeclaration, LevelDefinition};
use crate::maze::{CellKind, Maze};
use crate::reachability::ReachabilityMap;
use crate::render::{render_session, RenderSurface};
use crate::rng::Rng;
use crate::types::{
    Direction, GameOutcome, GhostSpecies, GhostView, PlayerView, SessionEvent, Snapshot, Vec2,
};

mod ghost_system;
mod motion_system;
mod spawn_system;
mod utils;

use self::utils::{bracket_pair, char_class, offset, CharClass};

/// The player is always actor 0; ghosts follow in declaration order.
pub const PLAYER: usize = 0;

#[derive(Clone, Debug, PartialEq)]
pub enum Role {
    Player,
    Ghost(GhostSpecies),
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub pos: Vec2,
    pub role: Role,
    /// Lemming headings; `None` until the first decision.
    pub heading: Option<Direction>,
    pub think_interval_ms: u64,
    pub next_think_at_ms: u64,
    pub phase_capable: bool,
}

impl Actor {
    pub fn is_ghost(&self) -> bool {
        matches!(self.role, Role::Ghost(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct GameState {
    pub score: u32,
    pub total_points: u32,
    pub outcome: GameOutcome,
    pub frozen: bool,
    pub last_find: Option<FindSpec>,
    collected: HashSet<Vec2>,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    maze: Maze,
    reachability: ReachabilityMap,
    decoder: CommandDecoder,
    state: GameState,
    actors: Vec<Actor>,
    rng: Rng,
    seed: u32,
    elapsed_ms: u64,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(level: &LevelDefinition, config: &SessionConfig) -> Result<Self, LevelError> {
        let mut maze = Maze::new(&level.rows)?;
        let reachability = ReachabilityMap::build(maze.rows(), GUTTER_WIDTH);
        let first_navigable =
            (0..maze.height() as i32).find(|row| reachability.has_reachable_cell(*row));
        maze.set_first_navigable_row(first_navigable);

        let seed = config.resolve_seed();
        let total_points = maze.total_points();
        let mut session = Self {
            maze,
            reachability,
            decoder: CommandDecoder::new(),
            state: GameState {
                total_points,
                ..GameState::default()
            },
            actors: Vec::new(),
            rng: Rng::new(seed),
            seed,
            elapsed_ms: 0,
            events: Vec::new(),
        };
        session.spawn_player(level.player_spawn)?;
        session.spawn_ghosts(&level.ghosts, config.effective_think_multiplier());
        info!(
            "level ready: {}x{} grid, {} points, {} ghosts, seed {}",
            session.maze.width(),
            session.maze.height(),
            total_points,
            session.actors.len() - 1,
            seed
        );
        Ok(session)
    }

    /// Feeds one key to the decoder and runs the command it completes, if any.
    pub fn apply_key(&mut self, key: char) -> Option<MotionResult> {
        let command = self.decoder.feed(key)?;
        let result = self.execute(command);
        if let Err(err) = result {
            debug!("{:?} x{} failed: {err}", command.motion, command.count);
        }
        Some(result)
    }

    pub fn execute(&mut self, command: Command) -> MotionResult {
        match command.motion {
            Motion::Find(spec) => {
                self.state.last_find = Some(spec);
                self.find_char(PLAYER, spec, command.count)
            }
            Motion::RepeatFind { reverse } => {
                let Some(spec) = self.state.last_find else {
                    return Err(MotionError::InvalidMotion);
                };
                let spec = if reverse { spec.reversed() } else { spec };
                self.find_char(PLAYER, spec, command.count)
            }
            Motion::GotoLine(line) => {
                let line = i32::try_from(line).unwrap_or(i32::MAX);
                self.jump_to_line(PLAYER, line, false)
            }
            motion => {
                for _ in 0..command.count {
                    self.run_motion(PLAYER, motion)?;
                }
                Ok(())
            }
        }
    }

    /// One main-loop tick: at most one pending key, then every ghost gate.
    pub fn pump<K: KeySource + ?Sized>(
        &mut self,
        keys: &mut K,
        dt_ms: u64,
    ) -> Option<MotionResult> {
        let result = keys.next_key().and_then(|key| self.apply_key(key));
        self.tick_ghosts(dt_ms);
        result
    }

    pub fn tick_ghosts(&mut self, dt_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if self.state.frozen {
            return;
        }
        for idx in 1..self.actors.len() {
            if !self.is_in_progress() {
                break;
            }
            if self.elapsed_ms < self.actors[idx].next_think_at_ms {
                continue;
            }
            self.actors[idx].next_think_at_ms = self
                .elapsed_ms
                .saturating_add(self.actors[idx].think_interval_ms);
            self.think_ghost(idx);
        }
    }

    pub fn outcome(&self) -> GameOutcome {
        self.state.outcome
    }

    pub fn is_in_progress(&self) -> bool {
        self.outcome() == GameOutcome::InProgress
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn total_points(&self) -> u32 {
        self.state.total_points
    }

    pub fn is_frozen(&self) -> bool {
        self.state.frozen
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn pending_keys(&self) -> String {
        self.decoder.pending()
    }

    pub fn player_position(&self) -> Vec2 {
        self.actors[PLAYER].pos
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn ghost_positions(&self) -> Vec<Vec2> {
        self.actors.iter().skip(1).map(|ghost| ghost.pos).collect()
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn reachability(&self) -> &ReachabilityMap {
        &self.reachability
    }

    pub fn is_reachable(&self, x: i32, y: i32) -> bool {
        self.reachability.is_reachable(x, y)
    }

    pub fn is_collected(&self, pos: Vec2) -> bool {
        self.state.collected.contains(&pos)
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let player = self.actors[PLAYER].pos;
        Snapshot {
            elapsed_ms: self.elapsed_ms,
            outcome: self.outcome(),
            score: self.state.score,
            total_points: self.state.total_points,
            frozen: self.state.frozen,
            pending_keys: self.decoder.pending(),
            player: PlayerView {
                x: player.x,
                y: player.y,
                score: self.state.score,
            },
            ghosts: self
                .actors
                .iter()
                .enumerate()
                .filter_map(|(id, actor)| match &actor.role {
                    Role::Ghost(species) => Some(GhostView {
                        id,
                        x: actor.pos.x,
                        y: actor.pos.y,
                        species: species.clone(),
                        heading: actor.heading,
                        think_interval_ms: actor.think_interval_ms,
                    }),
                    Role::Player => None,
                })
                .collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    /// Debug view of the reachability map: `.` reachable, `x` not, `#` wall.
    pub fn reachability_overlay(&self) -> Vec<String> {
        (0..self.maze.height() as i32)
            .map(|y| {
                (0..self.maze.width() as i32)
                    .map(|col| {
                        let x = col + GUTTER_WIDTH;
                        if self.maze.is_wall(x, y) {
                            '#'
                        } else if self.reachability.is_reachable(x, y) {
                            '.'
                        } else {
                            'x'
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn render_to<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        render_session(self, surface);
    }

    fn latch(&mut self, outcome: GameOutcome, event: SessionEvent) {
        if !self.is_in_progress() {
            return;
        }
        info!("outcome latched: {outcome:?} ({event:?})");
        self.state.outcome = outcome;
        self.events.push(event);
    }
}
