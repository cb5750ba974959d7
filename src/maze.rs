use log::warn;

use crate::constants::GUTTER_WIDTH;
use crate::error::LevelError;
use crate::types::Vec2;

pub const WALL_CHAR: char = '#';
pub const HAZARD_CHAR: char = '~';
pub const EMPTY_CHAR: char = ' ';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Hazard,
    Point,
    Empty,
    /// Empty cell under a declared spawn. Behaves like `Empty`.
    SpawnMarker,
}

impl CellKind {
    /// wall > hazard > point > empty
    pub fn classify(ch: char) -> Self {
        match ch {
            WALL_CHAR => Self::Wall,
            HAZARD_CHAR => Self::Hazard,
            EMPTY_CHAR => Self::Empty,
            _ => Self::Point,
        }
    }

    pub fn is_wall(self) -> bool {
        self == Self::Wall
    }
}

/// Finalized level grid. Every public coordinate is a screen coordinate:
/// x is the grid column shifted right by the line-number gutter.
#[derive(Clone, Debug)]
pub struct Maze {
    rows: Vec<String>,
    chars: Vec<Vec<char>>,
    kinds: Vec<Vec<CellKind>>,
    occupancy: Vec<Vec<Option<usize>>>,
    width: usize,
    first_navigable_row: i32,
    total_points: u32,
}

impl Maze {
    pub fn new<S: AsRef<str>>(rows: &[S]) -> Result<Self, LevelError> {
        if rows.is_empty() {
            return Err(LevelError::Empty);
        }
        let width = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        if width == 0 {
            return Err(LevelError::ZeroWidth);
        }

        let chars: Vec<Vec<char>> = rows
            .iter()
            .map(|row| {
                let mut line: Vec<char> = row.as_ref().chars().collect();
                line.resize(width, EMPTY_CHAR);
                line
            })
            .collect();
        let kinds: Vec<Vec<CellKind>> = chars
            .iter()
            .map(|line| line.iter().map(|&ch| CellKind::classify(ch)).collect())
            .collect();
        let total_points = kinds
            .iter()
            .flatten()
            .filter(|kind| **kind == CellKind::Point)
            .count() as u32;

        Ok(Self {
            rows: chars.iter().map(|line| line.iter().collect()).collect(),
            occupancy: vec![vec![None; width]; chars.len()],
            chars,
            kinds,
            width,
            first_navigable_row: 0,
            total_points,
        })
    }

    /// Padded grid rows, without the gutter.
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.chars.len()
    }

    pub fn screen_width(&self) -> i32 {
        self.width as i32 + GUTTER_WIDTH
    }

    pub fn first_navigable_row(&self) -> i32 {
        self.first_navigable_row
    }

    pub fn last_row(&self) -> i32 {
        self.height() as i32 - 1
    }

    pub fn set_first_navigable_row(&mut self, row: Option<i32>) {
        match row {
            Some(row) => {
                if row != 1 {
                    warn!(
                        "first navigable row is {row}, expected 1; line numbers will be incorrect"
                    );
                }
                self.first_navigable_row = row;
            }
            None => {
                warn!("maze has no navigable row; defaulting the first line to row 0");
                self.first_navigable_row = 0;
            }
        }
    }

    /// Lines are numbered from 1 starting at the first navigable row.
    pub fn line_count(&self) -> i32 {
        (self.last_row() - self.first_navigable_row + 1).max(1)
    }

    pub fn row_for_line(&self, line: i32) -> i32 {
        self.first_navigable_row + line - 1
    }

    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<CellKind> {
        self.index(x, y).map(|(col, row)| self.kinds[row][col])
    }

    pub fn char_at(&self, x: i32, y: i32) -> Option<char> {
        self.index(x, y).map(|(col, row)| self.chars[row][col])
    }

    /// Out-of-bounds cells count as walls.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).map_or(true, CellKind::is_wall)
    }

    pub fn mark_spawn(&mut self, at: Vec2) {
        if let Some((col, row)) = self.index(at.x, at.y) {
            if self.kinds[row][col] == CellKind::Empty {
                self.kinds[row][col] = CellKind::SpawnMarker;
            }
        }
    }

    pub fn occupant(&self, x: i32, y: i32) -> Option<usize> {
        self.index(x, y).and_then(|(col, row)| self.occupancy[row][col])
    }

    pub fn set_occupant(&mut self, at: Vec2, actor: Option<usize>) {
        if let Some((col, row)) = self.index(at.x, at.y) {
            self.occupancy[row][col] = actor;
        }
    }

    /// Clears `from` only if `actor` is the one recorded there.
    pub fn move_occupant(&mut self, actor: usize, from: Vec2, to: Vec2) {
        if self.occupant(from.x, from.y) == Some(actor) {
            self.set_occupant(from, None);
        }
        self.set_occupant(to, Some(actor));
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.width as i32 / 2 + GUTTER_WIDTH,
            self.height() as i32 / 2,
        )
    }

    fn index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let col = usize::try_from(x - GUTTER_WIDTH).ok()?;
        let row = usize::try_from(y).ok()?;
        if row >= self.chars.len() || col >= self.width {
            return None;
        }
        Some((col, row))
    }
}
