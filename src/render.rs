use crate::constants::GUTTER_WIDTH;
use crate::engine::GameSession;
use crate::maze::CellKind;
use crate::types::Vec2;

pub const PLAYER_GLYPH: char = '@';
pub const GHOST_GLYPH: char = 'G';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellStyle {
    Wall,
    Hazard,
    Point,
    Collected,
    Empty,
    Player,
    Ghost,
    LineNumber,
}

/// Write-only drawing target. x is a screen column, gutter included.
pub trait RenderSurface {
    fn set_cell(&mut self, x: i32, y: i32, ch: char, style: CellStyle);
    fn highlight_cell(&mut self, x: i32, y: i32);
}

pub fn render_session<S: RenderSurface + ?Sized>(session: &GameSession, surface: &mut S) {
    let maze = session.maze();
    let reachability = session.reachability();
    for y in 0..maze.height() as i32 {
        // the gutter labels grid rows; jump targets count from the first
        // navigable row, so the two agree only when that row is 1
        let label = Some(y).filter(|row| reachability.has_reachable_cell(*row));
        draw_gutter(surface, y, label);
        for x in GUTTER_WIDTH..maze.screen_width() {
            let ch = maze.char_at(x, y).unwrap_or(' ');
            let style = match maze.cell(x, y) {
                Some(CellKind::Wall) | None => CellStyle::Wall,
                Some(CellKind::Hazard) => CellStyle::Hazard,
                Some(CellKind::Point) if session.is_collected(Vec2::new(x, y)) => {
                    CellStyle::Collected
                }
                Some(CellKind::Point) => CellStyle::Point,
                Some(CellKind::Empty) | Some(CellKind::SpawnMarker) => CellStyle::Empty,
            };
            surface.set_cell(x, y, ch, style);
        }
    }
    for ghost in session.ghost_positions() {
        surface.set_cell(ghost.x, ghost.y, GHOST_GLYPH, CellStyle::Ghost);
    }
    let player = session.player_position();
    let under = maze.char_at(player.x, player.y).unwrap_or(' ');
    surface.set_cell(player.x, player.y, under, CellStyle::Player);
    surface.highlight_cell(player.x, player.y);
}

fn draw_gutter<S: RenderSurface + ?Sized>(surface: &mut S, y: i32, row: Option<i32>) {
    let label = match row {
        Some(row) => format!("{:>width$}", row % 100, width = GUTTER_WIDTH as usize),
        None => " ".repeat(GUTTER_WIDTH as usize),
    };
    for (x, ch) in label.chars().enumerate() {
        surface.set_cell(x as i32, y, ch, CellStyle::LineNumber);
    }
}

/// Plain-text surface; the player cell is drawn with [`PLAYER_GLYPH`].
#[derive(Clone, Debug, Default)]
pub struct TextSurface {
    cells: Vec<Vec<char>>,
    highlight: Option<(i32, i32)>,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.cells
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, &ch)| {
                        if self.highlight == Some((x as i32, y as i32)) {
                            PLAYER_GLYPH
                        } else {
                            ch
                        }
                    })
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }
}

impl RenderSurface for TextSurface {
    fn set_cell(&mut self, x: i32, y: i32, ch: char, _style: CellStyle) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if self.cells.len() <= y {
            self.cells.resize_with(y + 1, Vec::new);
        }
        let row = &mut self.cells[y];
        if row.len() <= x {
            row.resize(x + 1, ' ');
        }
        row[x] = ch;
    }

    fn highlight_cell(&mut self, x: i32, y: i32) {
        self.highlight = Some((x, y));
    }
}
