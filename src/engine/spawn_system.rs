use super::*;

impl GameSession {
    pub(super) fn spawn_player(&mut self, spawn: Option<(i32, i32)>) -> Result<(), LevelError> {
        // a column too large to shift into screen space is off the grid
        let requested = match spawn {
            Some((column, row)) => column
                .checked_add(GUTTER_WIDTH)
                .map(|x| Vec2::new(x, row))
                .ok_or((column, row)),
            None => Ok(self.maze.center()),
        };
        let pos = match requested {
            Ok(requested) if !self.maze.is_wall(requested.x, requested.y) => requested,
            _ => {
                let fallback = self
                    .first_reachable_cell()
                    .or_else(|| self.first_open_cell())
                    .ok_or(LevelError::NoOpenCell)?;
                let (x, y) = match requested {
                    Ok(requested) => (requested.x, requested.y),
                    Err(marker) => marker,
                };
                warn!(
                    "player spawn ({x}, {y}) is not walkable, using ({}, {})",
                    fallback.x, fallback.y
                );
                fallback
            }
        };

        self.maze.mark_spawn(pos);
        self.actors.push(Actor {
            pos,
            role: Role::Player,
            heading: None,
            think_interval_ms: 0,
            next_think_at_ms: 0,
            phase_capable: false,
        });
        self.maze.set_occupant(pos, Some(PLAYER));

        if self.maze.cell(pos.x, pos.y) == Some(CellKind::Hazard) {
            self.latch(
                GameOutcome::Lost,
                SessionEvent::HazardEntered { x: pos.x, y: pos.y },
            );
            return Ok(());
        }
        self.collect_at(pos);
        Ok(())
    }

    pub(super) fn spawn_ghosts(&mut self, declarations: &[GhostDeclaration], multiplier: f64) {
        for declaration in declarations {
            let Some(x) = declaration.column.checked_add(GUTTER_WIDTH) else {
                warn!(
                    "ghost at column {} row {} is off the grid, skipped",
                    declaration.column, declaration.row
                );
                continue;
            };
            let pos = Vec2::new(x, declaration.row);
            if self.maze.is_wall(pos.x, pos.y) {
                warn!("ghost at ({}, {}) would spawn in a wall, skipped", pos.x, pos.y);
                continue;
            }
            if let Some(other) = self.maze.occupant(pos.x, pos.y) {
                warn!(
                    "ghost at ({}, {}) overlaps actor {other}, skipped",
                    pos.x, pos.y
                );
                continue;
            }

            let species = GhostSpecies::from_tag(declaration.species_tag.as_deref());
            if let GhostSpecies::Unresolved(tag) = &species {
                warn!("ghost at ({}, {}) has unknown species {tag:?}", pos.x, pos.y);
            }
            let think_interval_ms = think_interval_ms(declaration.think_seconds, multiplier);
            let idx = self.actors.len();
            self.actors.push(Actor {
                pos,
                phase_capable: species == GhostSpecies::Dormant,
                role: Role::Ghost(species),
                heading: None,
                think_interval_ms,
                next_think_at_ms: self.elapsed_ms.saturating_add(think_interval_ms),
            });
            self.maze.mark_spawn(pos);
            self.maze.set_occupant(pos, Some(idx));
        }
    }

    /// Puts a ghost back on its own cell with a fresh think timer.
    pub(super) fn respawn_ghost_in_place(&mut self, idx: usize) {
        let pos = self.actors[idx].pos;
        self.maze.set_occupant(pos, Some(idx));
        self.actors[idx].heading = None;
        self.actors[idx].next_think_at_ms = self
            .elapsed_ms
            .saturating_add(self.actors[idx].think_interval_ms);
    }

    fn first_reachable_cell(&self) -> Option<Vec2> {
        (0..self.maze.height() as i32).find_map(|row| {
            self.reachability
                .first_reachable_index(row)
                .map(|x| Vec2::new(x, row))
        })
    }

    fn first_open_cell(&self) -> Option<Vec2> {
        (0..self.maze.height() as i32).find_map(|row| {
            (0..self.maze.width() as i32)
                .map(|col| Vec2::new(col + GUTTER_WIDTH, row))
                .find(|pos| !self.maze.is_wall(pos.x, pos.y))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::session_from;

    const G: i32 = GUTTER_WIDTH;

    #[test]
    fn ghosts_in_walls_or_on_the_player_are_skipped() {
        let session =
            session_from("######\n#ab c#\n######\np 1 1\n/1 0 0\n/1 1 1\n/1 3 1\n/1 3 1\n");
        assert_eq!(session.ghost_positions(), vec![Vec2::new(3 + G, 1)]);
    }

    #[test]
    fn markers_past_the_last_column_do_not_overflow() {
        let session = session_from("#####\n#abc#\n#####\np 2147483647 1\n/1 2147483647 1\n");
        assert_eq!(session.player_position(), Vec2::new(1 + G, 1));
        assert!(session.ghost_positions().is_empty());
        assert!(session.is_in_progress());
    }

    #[test]
    fn think_interval_uses_difficulty_multiplier() {
        let level = crate::level::parse_level("#####\n#ab c#\n#####\np 1 1\n/1.5 3 1\n")
            .expect("valid level");
        let config = SessionConfig {
            difficulty: crate::types::Difficulty::Normal,
            seed: Some(3),
            ..SessionConfig::default()
        };
        let session = GameSession::new(&level, &config).expect("session starts");
        assert_eq!(session.actors()[1].think_interval_ms, 1_800);
        assert_eq!(session.actors()[1].next_think_at_ms, 1_800);
    }

    #[test]
    fn dormant_ghosts_start_phase_capable() {
        let session = session_from("#######\n#ab   #\n#######\np 1 1\n/1 4 1 dormant\n");
        assert!(session.actors()[1].phase_capable);
        assert_eq!(
            session.actors()[1].role,
            Role::Ghost(GhostSpecies::Dormant)
        );
    }

    #[test]
    fn player_spawning_on_hazard_loses() {
        let session = session_from("#####\n#~ab#\n#####\np 1 1\n");
        assert_eq!(session.outcome(), GameOutcome::Lost);
        assert_eq!(session.score(), 0);
    }
}
