use std::fs;
use std::path::Path;

use log::warn;

use crate::error::LevelError;

const PLAYER_MARKER: char = 'p';
const GHOST_MARKER: char = '/';

#[derive(Clone, Debug, PartialEq)]
pub struct GhostDeclaration {
    pub think_seconds: f64,
    pub column: i32,
    pub row: i32,
    pub species_tag: Option<String>,
}

/// Raw level content: the playable rows plus what the marker rows declared.
/// Spawn coordinates are grid columns/rows, before the gutter shift.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDefinition {
    pub rows: Vec<String>,
    pub player_spawn: Option<(i32, i32)>,
    pub ghosts: Vec<GhostDeclaration>,
}

impl LevelDefinition {
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0)
    }
}

pub fn parse_level(text: &str) -> Result<LevelDefinition, LevelError> {
    let mut rows = Vec::new();
    let mut player_spawn = None;
    let mut ghosts = Vec::new();

    for (line_idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        match line.chars().next() {
            Some(PLAYER_MARKER) => {
                let values = marker_fields(line, line_idx, 2)?;
                let x = parse_coordinate(values[0], line_idx)?;
                let y = parse_coordinate(values[1], line_idx)?;
                if player_spawn.is_some() {
                    warn!("level line {line_idx}: duplicate player spawn, last one wins");
                }
                player_spawn = Some((x, y));
            }
            Some(GHOST_MARKER) => {
                let values = marker_fields(line, line_idx, 3)?;
                let think_seconds = values[0].parse::<f64>().map_err(|_| {
                    LevelError::MalformedMarker {
                        line: line_idx,
                        reason: format!("think time `{}` is not a number", values[0]),
                    }
                })?;
                ghosts.push(GhostDeclaration {
                    think_seconds,
                    column: parse_coordinate(values[1], line_idx)?,
                    row: parse_coordinate(values[2], line_idx)?,
                    species_tag: values.get(3).map(|tag| tag.to_string()),
                });
            }
            _ => rows.push(line.to_string()),
        }
    }

    if rows.is_empty() {
        return Err(LevelError::Empty);
    }
    let definition = LevelDefinition {
        rows,
        player_spawn,
        ghosts,
    };
    if definition.width() == 0 {
        return Err(LevelError::ZeroWidth);
    }
    Ok(definition)
}

pub fn load_level_file(path: &Path) -> Result<LevelDefinition, LevelError> {
    let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level(&text)
}

fn marker_fields(line: &str, line_idx: usize, required: usize) -> Result<Vec<&str>, LevelError> {
    let body = &line[1..];
    let values: Vec<&str> = body.split_whitespace().collect();
    if values.len() < required {
        return Err(LevelError::MalformedMarker {
            line: line_idx,
            reason: format!("expected {required} values, found {}", values.len()),
        });
    }
    Ok(values)
}

fn parse_coordinate(value: &str, line_idx: usize) -> Result<i32, LevelError> {
    value
        .parse::<i32>()
        .map_err(|_| LevelError::MalformedMarker {
            line: line_idx,
            reason: format!("coordinate `{value}` is not an integer"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_rows_are_removed_from_the_grid() {
        let text = "#####\n#ab #\n#####\n/1.5 2 1\np 1 1\n";
        let level = parse_level(text).expect("valid level");
        assert_eq!(level.rows.len(), 3);
        assert_eq!(level.player_spawn, Some((1, 1)));
        assert_eq!(level.ghosts.len(), 1);
        assert_eq!(level.ghosts[0].think_seconds, 1.5);
        assert_eq!(level.ghosts[0].column, 2);
        assert_eq!(level.ghosts[0].species_tag, None);
    }

    #[test]
    fn ghost_marker_accepts_spaced_form_and_species() {
        let level = parse_level("#..#\n/ 0.4 1 0 lemming\n").expect("valid level");
        assert_eq!(level.ghosts[0].think_seconds, 0.4);
        assert_eq!(level.ghosts[0].species_tag.as_deref(), Some("lemming"));
    }

    #[test]
    fn malformed_marker_reports_line() {
        let err = parse_level("#a#\np 1\n").expect_err("missing y");
        match err {
            LevelError::MalformedMarker { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_level("#a#\n/x 1 1\n").is_err());
    }

    #[test]
    fn empty_and_zero_width_levels_are_rejected() {
        assert!(matches!(parse_level(""), Err(LevelError::Empty)));
        assert!(matches!(parse_level("p 1 1\n"), Err(LevelError::Empty)));
        assert!(matches!(parse_level("\n\n"), Err(LevelError::ZeroWidth)));
    }

    #[test]
    fn load_level_file_reads_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("map0.txt");
        fs::write(&path, "####\n#ab#\n####\np 1 1\n").expect("write level");
        let level = load_level_file(&path).expect("load level");
        assert_eq!(level.width(), 4);

        let missing = load_level_file(&dir.path().join("missing.txt"));
        assert!(matches!(missing, Err(LevelError::Io { .. })));
    }
}
