use super::*;

impl GameSession {
    pub(super) fn run_motion(&mut self, idx: usize, motion: Motion) -> MotionResult {
        match motion {
            Motion::Left => self.step(idx, Direction::Left),
            Motion::Down => self.step(idx, Direction::Down),
            Motion::Up => self.step(idx, Direction::Up),
            Motion::Right => self.step(idx, Direction::Right),
            Motion::WordForward { big } => {
                let target = self.plan_word_forward(self.actors[idx].pos, big);
                self.walk_row(idx, target)
            }
            Motion::WordBackward { big } => {
                let target = self.plan_word_backward(self.actors[idx].pos, big);
                self.walk_row(idx, target)
            }
            Motion::WordEnd { big } => {
                let target = self.plan_word_end(self.actors[idx].pos, big);
                self.walk_row(idx, target)
            }
            Motion::LineStart => self.jump_to_line_edge(idx, true),
            Motion::LineEnd => self.jump_to_line_edge(idx, false),
            Motion::FirstNonBlank => {
                self.jump_to_line_edge(idx, true)?;
                let pos = self.actors[idx].pos;
                if self.maze.char_at(pos.x, pos.y) == Some(' ') {
                    let target = self.plan_word_forward(pos, false);
                    return self.walk_row(idx, target);
                }
                Ok(())
            }
            Motion::BracketMatch => self.bracket_match(idx),
            Motion::Find(spec) => self.find_char(idx, spec, 1),
            Motion::RepeatFind { reverse } => {
                let spec = self
                    .state
                    .last_find
                    .ok_or(MotionError::InvalidMotion)?;
                self.find_char(idx, if reverse { spec.reversed() } else { spec }, 1)
            }
            Motion::FirstLine => self.jump_to_line(idx, 1, true),
            Motion::LastLine => self.jump_to_line(idx, self.maze.line_count(), false),
            Motion::MiddleLine => {
                self.jump_to_line(idx, (self.maze.line_count() + 1) / 2, true)
            }
            Motion::GotoLine(line) => {
                self.jump_to_line(idx, i32::try_from(line).unwrap_or(i32::MAX), false)
            }
            Motion::ToggleFreeze => {
                self.state.frozen = !self.state.frozen;
                info!("ghosts frozen: {}", self.state.frozen);
                self.events.push(SessionEvent::FreezeToggled {
                    frozen: self.state.frozen,
                });
                Ok(())
            }
        }
    }

    pub(super) fn step(&mut self, idx: usize, dir: Direction) -> MotionResult {
        let target = offset(self.actors[idx].pos, dir);
        self.move_to(idx, target)
    }

    /// Single read-validate-write move shared by every actor.
    pub(super) fn move_to(&mut self, idx: usize, target: Vec2) -> MotionResult {
        if !self.is_in_progress() || self.maze.is_wall(target.x, target.y) {
            return Err(MotionError::InvalidMotion);
        }
        match self.actors[idx].role {
            Role::Player => self.move_player_to(idx, target),
            Role::Ghost(_) => self.move_ghost_to(idx, target),
        }
    }

    fn move_player_to(&mut self, idx: usize, target: Vec2) -> MotionResult {
        // hazard is checked before ghost contact
        if self.maze.cell(target.x, target.y) == Some(CellKind::Hazard) {
            self.latch(
                GameOutcome::Lost,
                SessionEvent::HazardEntered {
                    x: target.x,
                    y: target.y,
                },
            );
            return Err(MotionError::InvalidMotion);
        }
        if let Some(ghost_id) = self.ghost_at(target, idx) {
            self.latch(GameOutcome::Lost, SessionEvent::PlayerCaught { ghost_id });
            return Err(MotionError::InvalidMotion);
        }
        self.relocate(idx, target);
        self.collect_at(target);
        Ok(())
    }

    fn move_ghost_to(&mut self, idx: usize, target: Vec2) -> MotionResult {
        if self.ghost_at(target, idx).is_some() {
            return Err(MotionError::InvalidMotion);
        }
        let catches_player = self.actors[PLAYER].pos == target;
        self.relocate(idx, target);
        if catches_player {
            self.latch(GameOutcome::Lost, SessionEvent::PlayerCaught { ghost_id: idx });
        }
        Ok(())
    }

    pub(super) fn ghost_at(&self, pos: Vec2, except: usize) -> Option<usize> {
        self.maze
            .occupant(pos.x, pos.y)
            .filter(|&other| other != except && self.actors[other].is_ghost())
    }

    pub(super) fn relocate(&mut self, idx: usize, target: Vec2) {
        let from = self.actors[idx].pos;
        self.maze.move_occupant(idx, from, target);
        self.actors[idx].pos = target;
    }

    pub(super) fn collect_at(&mut self, pos: Vec2) {
        if self.maze.cell(pos.x, pos.y) == Some(CellKind::Point)
            && self.state.collected.insert(pos)
        {
            self.state.score += 1;
            self.events
                .push(SessionEvent::PointCollected { x: pos.x, y: pos.y });
        }
        if self.state.score >= self.state.total_points {
            self.latch(GameOutcome::Won, SessionEvent::LevelCleared);
        }
    }

    /// Walks cell by cell so every crossed point is collected.
    fn walk_row(&mut self, idx: usize, target_x: Option<i32>) -> MotionResult {
        let target_x = target_x.ok_or(MotionError::InvalidMotion)?;
        let y = self.actors[idx].pos.y;
        while self.actors[idx].pos.x != target_x {
            let x = self.actors[idx].pos.x + (target_x - self.actors[idx].pos.x).signum();
            self.move_to(idx, Vec2::new(x, y))?;
        }
        Ok(())
    }

    fn class_at(&self, x: i32, y: i32, big: bool) -> Option<CharClass> {
        if self.maze.is_wall(x, y) {
            return None;
        }
        self.maze.char_at(x, y).map(|ch| char_class(ch, big))
    }

    pub(super) fn plan_word_forward(&self, from: Vec2, big: bool) -> Option<i32> {
        let y = from.y;
        let current = self.class_at(from.x, y, big)?;
        let mut x = from.x;
        if current != CharClass::Space {
            while self.class_at(x + 1, y, big) == Some(current) {
                x += 1;
            }
        }
        x += 1;
        loop {
            match self.class_at(x, y, big)? {
                CharClass::Space => x += 1,
                _ => return Some(x),
            }
        }
    }

    pub(super) fn plan_word_end(&self, from: Vec2, big: bool) -> Option<i32> {
        self.plan_word_edge(from, big, 1)
    }

    pub(super) fn plan_word_backward(&self, from: Vec2, big: bool) -> Option<i32> {
        self.plan_word_edge(from, big, -1)
    }

    /// Skips spaces from the neighbouring cell, then runs to the far edge of
    /// the token it lands on.
    fn plan_word_edge(&self, from: Vec2, big: bool, step: i32) -> Option<i32> {
        let y = from.y;
        let mut x = from.x + step;
        loop {
            match self.class_at(x, y, big)? {
                CharClass::Space => x += step,
                class => {
                    while self.class_at(x + step, y, big) == Some(class) {
                        x += step;
                    }
                    return Some(x);
                }
            }
        }
    }

    fn jump_to_line_edge(&mut self, idx: usize, start: bool) -> MotionResult {
        let y = self.actors[idx].pos.y;
        let x = if start {
            self.reachability.first_reachable_index(y)
        } else {
            self.reachability.last_reachable_index(y)
        };
        let x = x.ok_or(MotionError::InvalidMotion)?;
        self.move_to(idx, Vec2::new(x, y))
    }

    /// Clamps `line` to the navigable lines, then searches rows in the given
    /// direction for one with a reachable cell.
    pub(super) fn jump_to_line(&mut self, idx: usize, line: i32, forward: bool) -> MotionResult {
        let line = line.clamp(1, self.maze.line_count());
        let first = self.maze.first_navigable_row();
        let last = self.maze.last_row();
        let mut row = self.maze.row_for_line(line);
        while (first..=last).contains(&row) {
            if let Some(x) = self.reachability.first_reachable_index(row) {
                return self.move_to(idx, Vec2::new(x, row));
            }
            row += if forward { 1 } else { -1 };
        }
        debug!("line {line}: no reachable row found");
        Err(MotionError::UnreachableLineTarget)
    }

    pub(super) fn find_char(&mut self, idx: usize, spec: FindSpec, count: u32) -> MotionResult {
        let pos = self.actors[idx].pos;
        let step = if spec.forward { 1 } else { -1 };
        let mut x = pos.x;
        let mut seen = 0;
        let found = loop {
            x += step;
            if self.maze.is_wall(x, pos.y) {
                return Err(MotionError::InvalidMotion);
            }
            if self.maze.char_at(x, pos.y) == Some(spec.target) {
                seen += 1;
                if seen >= count {
                    break x;
                }
            }
        };
        let land = if spec.inclusive { found } else { found - step };
        if land == pos.x {
            return Err(MotionError::InvalidMotion);
        }
        self.move_to(idx, Vec2::new(land, pos.y))
    }

    pub(super) fn bracket_match(&mut self, idx: usize) -> MotionResult {
        let pos = self.actors[idx].pos;
        let mut source_x = pos.x;
        let (target, forward) = loop {
            if self.maze.is_wall(source_x, pos.y) {
                return Err(MotionError::InvalidMotion);
            }
            if let Some(pair) = self.maze.char_at(source_x, pos.y).and_then(bracket_pair) {
                break pair;
            }
            source_x += 1;
        };

        let step = if forward { 1 } else { -1 };
        let left_edge = GUTTER_WIDTH;
        let right_edge = self.maze.screen_width() - 1;
        let mut row = pos.y;
        while row >= self.maze.first_navigable_row() && row <= self.maze.last_row() {
            let mut x = if row == pos.y {
                source_x + step
            } else if forward {
                left_edge
            } else {
                right_edge
            };
            while self.maze.in_bounds(x, row) {
                if self.maze.char_at(x, row) == Some(target) {
                    return self.move_to(idx, Vec2::new(x, row));
                }
                x += step;
            }
            row += step;
        }
        Err(MotionError::InvalidMotion)
    }
}
