use super::*;

impl GameSession {
    pub(super) fn think_ghost(&mut self, idx: usize) {
        let Role::Ghost(species) = self.actors[idx].role.clone() else {
            return;
        };
        match species {
            GhostSpecies::Seeker => self.seek_player(idx),
            GhostSpecies::Lemming => self.wander(idx),
            GhostSpecies::ClockwiseLemming => self.rotate_and_advance(idx, Direction::clockwise),
            GhostSpecies::AntiClockwiseLemming => {
                self.rotate_and_advance(idx, Direction::anticlockwise)
            }
            GhostSpecies::Dormant => self.check_activation(idx),
            GhostSpecies::Unresolved(tag) => {
                warn!("ghost {idx}: unknown species {tag:?}, skipping this tick");
            }
        }
    }

    /// Neighbour a ghost may step onto, ignoring walls when `phase` is set.
    fn ghost_target(&self, idx: usize, dir: Direction, phase: bool) -> Option<Vec2> {
        let mut target = offset(self.actors[idx].pos, dir);
        if phase {
            while self.maze.in_bounds(target.x, target.y) && self.maze.is_wall(target.x, target.y)
            {
                target = offset(target, dir);
            }
        }
        if self.maze.is_wall(target.x, target.y) || self.ghost_at(target, idx).is_some() {
            return None;
        }
        Some(target)
    }

    fn seek_player(&mut self, idx: usize) {
        let phase = self.actors[idx].phase_capable && self.rng.chance(PHASE_THROUGH_WALL_CHANCE);
        let player = self.actors[PLAYER].pos;

        let mut best: Option<(Vec2, f64)> = None;
        for dir in Direction::ALL {
            let Some(target) = self.ghost_target(idx, dir, phase) else {
                continue;
            };
            let score = target.distance(player);
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((target, score));
            }
        }

        match best {
            Some((target, score)) if score < SEEKER_SENTINEL_DISTANCE => {
                let _ = self.move_to(idx, target);
            }
            _ => self.mark_stuck(idx),
        }
    }

    fn wander(&mut self, idx: usize) {
        if let Some(dir) = self.actors[idx].heading {
            if let Some(target) = self.ghost_target(idx, dir, false) {
                let _ = self.move_to(idx, target);
                return;
            }
        }
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| self.ghost_target(idx, *dir, false).is_some())
            .collect();
        let Some(dir) = self.rng.pick(&open) else {
            self.mark_stuck(idx);
            return;
        };
        self.actors[idx].heading = Some(dir);
        if let Some(target) = self.ghost_target(idx, dir, false) {
            let _ = self.move_to(idx, target);
        }
    }

    fn rotate_and_advance(&mut self, idx: usize, rotate: fn(Direction) -> Direction) {
        let mut dir = self.actors[idx].heading.unwrap_or(DEFAULT_HEADING);
        if self.rng.chance(EXTRA_ROTATION_CHANCE) {
            dir = rotate(dir);
        }
        for _ in 0..MAX_HEADING_ROTATIONS {
            if let Some(target) = self.ghost_target(idx, dir, false) {
                self.actors[idx].heading = Some(dir);
                let _ = self.move_to(idx, target);
                return;
            }
            dir = rotate(dir);
        }
        warn!("ghost {idx}: no open heading after {MAX_HEADING_ROTATIONS} rotations");
        self.actors[idx].heading = Some(DEFAULT_HEADING);
        self.mark_stuck(idx);
    }

    fn check_activation(&mut self, idx: usize) {
        let distance = self.actors[idx].pos.distance(self.actors[PLAYER].pos);
        if distance > DORMANT_ACTIVATION_RADIUS {
            return;
        }
        info!("ghost {idx} activated at distance {distance:.2}");
        self.actors[idx].role = Role::Ghost(GhostSpecies::Seeker);
        self.actors[idx].phase_capable = true;
        self.respawn_ghost_in_place(idx);
        self.events
            .push(SessionEvent::GhostActivated { ghost_id: idx });
    }

    fn mark_stuck(&mut self, idx: usize) {
        debug!("ghost {idx}: no valid move this tick");
        self.events.push(SessionEvent::GhostStuck { ghost_id: idx });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::session_from;

    const G: i32 = GUTTER_WIDTH;

    fn ghost(session: &GameSession, idx: usize) -> (i32, i32) {
        let pos = session.actors()[idx].pos;
        (pos.x - G, pos.y)
    }

    /// First seed whose opening draw satisfies `accept`.
    fn seed_where(accept: impl Fn(f32) -> bool) -> u32 {
        (0u32..)
            .find(|seed| accept(Rng::new(*seed).next_f32()))
            .expect("some seed satisfies the draw")
    }

    #[test]
    fn seeker_closes_distance_with_fixed_tie_order() {
        let mut session = session_from("#######\n#a    #\n#     #\n#    z#\n#######\np 1 1\n/0 3 3\n");
        session.tick_ghosts(5);
        // up and left both score sqrt(5); up is checked first
        assert_eq!(ghost(&session, 1), (3, 2));
        session.tick_ghosts(5);
        assert_eq!(ghost(&session, 1), (2, 2));
    }

    #[test]
    fn seeker_catching_player_loses() {
        let mut session = session_from("######\n#a  b#\n######\np 1 1\n/0 2 1\n");
        session.tick_ghosts(5);
        assert_eq!(session.outcome(), GameOutcome::Lost);
        let snapshot = session.build_snapshot(true);
        assert!(snapshot
            .events
            .contains(&SessionEvent::PlayerCaught { ghost_id: 1 }));
    }

    #[test]
    fn boxed_in_ghost_stays_put() {
        let mut session = session_from("#######\n#a #b##\n#######\np 1 1\n/0 4 1\n");
        session.tick_ghosts(5);
        assert_eq!(ghost(&session, 1), (4, 1));
        let snapshot = session.build_snapshot(true);
        assert!(snapshot
            .events
            .contains(&SessionEvent::GhostStuck { ghost_id: 1 }));
    }

    #[test]
    fn ghosts_never_share_a_cell() {
        let mut session =
            session_from("########\n#a    z#\n########\np 1 1\n/0 5 1\n/0 6 1\n");
        for _ in 0..3 {
            session.tick_ghosts(5);
            let positions = session.ghost_positions();
            assert_ne!(positions[0], positions[1]);
        }
    }

    #[test]
    fn ghost_waits_for_its_think_interval() {
        let mut session = session_from("#######\n#a   z#\n#######\np 1 1\n/0.1 5 1\n");
        session.tick_ghosts(50);
        assert_eq!(ghost(&session, 1), (5, 1));
        session.tick_ghosts(50);
        assert_eq!(ghost(&session, 1), (4, 1));
        session.tick_ghosts(50);
        assert_eq!(ghost(&session, 1), (4, 1));
    }

    #[test]
    fn lemming_keeps_heading_until_blocked() {
        let mut session = session_from("#########\n#a     z#\n#########\np 1 1\n/0 4 1 lemming\n");
        session.tick_ghosts(5);
        let heading = session.actors()[1].heading.expect("heading picked");
        let first = ghost(&session, 1);
        session.tick_ghosts(5);
        if session.is_in_progress() {
            let second = ghost(&session, 1);
            assert_eq!(second.0 - first.0, first.0 - 4);
            assert_eq!(session.actors()[1].heading, Some(heading));
        }
    }

    #[test]
    fn clockwise_lemming_keeps_an_open_heading() {
        let mut session = session_from("#####\n#a z#\n#   #\n#####\np 1 1\n/0 3 2 clockwise\n");
        session.actors[1].heading = Some(Direction::Up);
        session.rng = Rng::new(seed_where(|draw| draw >= EXTRA_ROTATION_CHANCE));
        session.think_ghost(1);
        assert_eq!(ghost(&session, 1), (3, 1));
        assert_eq!(session.actors()[1].heading, Some(Direction::Up));
    }

    #[test]
    fn extra_rotation_turns_before_looking_for_an_exit() {
        let mut session = session_from("#####\n#a z#\n#   #\n#####\np 1 1\n/0 3 2 clockwise\n");
        session.actors[1].heading = Some(Direction::Up);
        session.rng = Rng::new(seed_where(|draw| draw < EXTRA_ROTATION_CHANCE));
        session.think_ghost(1);
        // up turns to right, then right and down are walls
        assert_eq!(ghost(&session, 1), (2, 2));
        assert_eq!(session.actors()[1].heading, Some(Direction::Left));
    }

    #[test]
    fn rotating_lemming_with_no_exit_resets_heading() {
        let mut session = session_from("#####\n#a###\n###b#\n#####\np 1 1\n/0 3 2 anticlockwise\n");
        session.actors[1].heading = Some(Direction::Left);
        session.tick_ghosts(5);
        assert_eq!(ghost(&session, 1), (3, 2));
        assert_eq!(session.actors()[1].heading, Some(DEFAULT_HEADING));
    }

    #[test]
    fn dormant_ghost_activates_inside_radius() {
        let text = "############\n#a       z #\n############\np 1 1\n/0 10 1 dormant\n";
        let mut session = session_from(text);
        session.tick_ghosts(5);
        assert_eq!(ghost(&session, 1), (10, 1));
        assert_eq!(session.actors()[1].role, Role::Ghost(GhostSpecies::Dormant));

        let player = session.actors[PLAYER].pos;
        session.relocate(PLAYER, Vec2::new(player.x + 5, player.y));
        session.tick_ghosts(5);
        assert_eq!(ghost(&session, 1), (10, 1));
        assert_eq!(session.actors()[1].role, Role::Ghost(GhostSpecies::Seeker));
        let snapshot = session.build_snapshot(true);
        assert!(snapshot
            .events
            .contains(&SessionEvent::GhostActivated { ghost_id: 1 }));

        session.tick_ghosts(5);
        assert_eq!(ghost(&session, 1), (9, 1));
    }

    #[test]
    fn phasing_tunnels_through_wall_runs() {
        let session = session_from("########\n#a ## z#\n########\np 1 1\n/0 5 1\n");
        assert_eq!(session.ghost_target(1, Direction::Left, true), Some(Vec2::new(2 + G, 1)));
        assert_eq!(session.ghost_target(1, Direction::Left, false), None);
        assert_eq!(session.ghost_target(1, Direction::Up, true), None);
    }

    #[test]
    fn phase_capable_seeker_phases_only_when_the_draw_fires() {
        let text = "########\n#a ## z#\n########\np 1 1\n/0 5 1\n";

        let mut phased = session_from(text);
        phased.actors[1].phase_capable = true;
        phased.rng = Rng::new(seed_where(|draw| draw < PHASE_THROUGH_WALL_CHANCE));
        phased.think_ghost(1);
        assert_eq!(ghost(&phased, 1), (2, 1));

        let mut walked = session_from(text);
        walked.actors[1].phase_capable = true;
        walked.rng = Rng::new(seed_where(|draw| draw >= PHASE_THROUGH_WALL_CHANCE));
        walked.think_ghost(1);
        // the wall run blocks the way left, so right is the only step
        assert_eq!(ghost(&walked, 1), (6, 1));
        assert!(walked.is_in_progress());
    }

    #[test]
    fn unknown_species_is_skipped() {
        let mut session = session_from("######\n#a  z#\n######\np 1 1\n/0 3 1 wisp\n");
        session.tick_ghosts(5);
        assert_eq!(ghost(&session, 1), (3, 1));
        assert!(session.is_in_progress());
    }
}
