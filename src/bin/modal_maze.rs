use std::fs::File;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::cursor::{Hide, MoveTo, SetCursorStyle, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::{error, info};
use modal_maze::campaign::{Campaign, CampaignStatus, Stage};
use modal_maze::config::SessionConfig;
use modal_maze::constants::{DEFAULT_LAST_LEVEL, TICK_MS};
use modal_maze::engine::GameSession;
use modal_maze::error::LevelError;
use modal_maze::input::KeySource;
use modal_maze::level::load_level_file;
use modal_maze::render::{CellStyle, RenderSurface};
use modal_maze::types::{Difficulty, GameOutcome};
use thiserror::Error;

const FRAME_MS: u64 = 33;
const BANNER_MS: u64 = 1_500;

#[derive(Parser, Debug)]
#[command(author, version, about = "Clear each maze with modal-editor motions")]
struct Cli {
    /// Level to start the campaign from.
    level: Option<u32>,
    /// `h` for hard, `n` for normal (ghosts think 20% slower).
    mode: Option<String>,
    #[arg(long, default_value = "maps")]
    maps_dir: PathBuf,
    #[arg(long, default_value_t = DEFAULT_LAST_LEVEL)]
    last_level: u32,
    #[arg(long)]
    seed: Option<u32>,
    /// JSON session config; CLI flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "modal-maze.log")]
    log_file: PathBuf,
    #[arg(long)]
    skip_tutorial: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
    #[error(transparent)]
    Level(#[from] LevelError),
}

enum LevelEnd {
    Finished(GameOutcome),
    Quit,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&cli.log_file) {
        eprintln!("cannot open log file {}: {err}", cli.log_file.display());
        std::process::exit(2);
    }

    let base = match base_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let mut campaign = match Campaign::new(
        cli.level.unwrap_or(0),
        cli.last_level,
        cli.skip_tutorial,
    ) {
        Ok(campaign) => campaign,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let result = with_terminal(|stdout| run(stdout, &mut campaign, &base, &cli.maps_dir));
    if let Err(err) = result {
        error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn base_config(cli: &Cli) -> Result<SessionConfig, LevelError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(mode) = cli.mode.as_deref() {
        config.difficulty = Difficulty::parse(mode).ok_or_else(|| {
            LevelError::Config(format!("invalid mode `{mode}`, only h/n allowed"))
        })?;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

fn with_terminal<F>(body: F) -> Result<(), AppError>
where
    F: FnOnce(&mut Stdout) -> Result<(), AppError>,
{
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = body(&mut stdout);

    stdout.execute(SetCursorStyle::DefaultUserShape)?;
    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(
    stdout: &mut Stdout,
    campaign: &mut Campaign,
    base: &SessionConfig,
    maps_dir: &Path,
) -> Result<(), AppError> {
    loop {
        let path = campaign.level_path(maps_dir);
        let level = load_level_file(&path)?;
        let mut session = GameSession::new(&level, &campaign.session_config(base))?;
        info!("playing {} (lives {})", path.display(), campaign.lives());

        let outcome = match play_level(stdout, &mut session, campaign)? {
            LevelEnd::Quit => return Ok(()),
            LevelEnd::Finished(outcome) => outcome,
        };
        let status = campaign.record(outcome);
        let banner = match (status, outcome) {
            (CampaignStatus::GameOver, _) => "GAME OVER",
            (_, GameOutcome::Won) => "LEVEL CLEARED",
            _ => "CAUGHT",
        };
        show_banner(stdout, &session, banner)?;
        if status == CampaignStatus::GameOver {
            info!("game over after {} loops", campaign.loops());
            return Ok(());
        }
    }
}

fn play_level(
    stdout: &mut Stdout,
    session: &mut GameSession,
    campaign: &Campaign,
) -> Result<LevelEnd, AppError> {
    stdout.queue(Clear(ClearType::All))?;
    draw_frame(stdout, session, campaign)?;

    let mut keys = TerminalKeys::default();
    let started = Instant::now();
    let mut last_draw = Instant::now();
    while session.is_in_progress() {
        let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let dt_ms = now_ms.saturating_sub(session.elapsed_ms());
        let applied = session.pump(&mut keys, dt_ms).is_some();

        if keys.quit {
            return Ok(LevelEnd::Quit);
        }
        if let Some(err) = keys.failure.take() {
            return Err(err.into());
        }
        if applied || last_draw.elapsed() >= Duration::from_millis(FRAME_MS) {
            draw_frame(stdout, session, campaign)?;
            last_draw = Instant::now();
        }
        thread::sleep(Duration::from_millis(TICK_MS));
    }
    draw_frame(stdout, session, campaign)?;
    Ok(LevelEnd::Finished(session.outcome()))
}

fn draw_frame(
    stdout: &mut Stdout,
    session: &GameSession,
    campaign: &Campaign,
) -> Result<(), AppError> {
    let mut surface = TerminalSurface::new(stdout);
    session.render_to(&mut surface);
    let cursor = surface.finish()?;

    let hud_row = u16::try_from(session.maze().height()).unwrap_or(u16::MAX);
    let stage = match campaign.stage() {
        Stage::Tutorial => "tutorial".to_string(),
        Stage::Level(level) => format!("level {level}"),
    };
    let hud = format!(
        "{stage}  points {}/{}  lives {}  {}",
        session.score(),
        session.total_points(),
        campaign.lives(),
        session.pending_keys()
    );
    stdout.queue(MoveTo(0, hud_row.saturating_add(1)))?;
    stdout.queue(Clear(ClearType::CurrentLine))?;
    stdout.queue(SetForegroundColor(Color::White))?;
    stdout.queue(Print(hud))?;
    stdout.queue(ResetColor)?;
    if let Some((col, row)) = cursor {
        stdout.queue(MoveTo(col, row))?;
        stdout.queue(SetCursorStyle::SteadyBlock)?;
        stdout.queue(Show)?;
    }
    stdout.flush()?;
    Ok(())
}

fn show_banner(stdout: &mut Stdout, session: &GameSession, text: &str) -> Result<(), AppError> {
    let row = u16::try_from(session.maze().height()).unwrap_or(u16::MAX);
    stdout.queue(Hide)?;
    stdout.queue(MoveTo(0, row.saturating_add(2)))?;
    stdout.queue(Clear(ClearType::CurrentLine))?;
    stdout.queue(SetForegroundColor(Color::Yellow))?;
    stdout.queue(Print(text))?;
    stdout.queue(ResetColor)?;
    stdout.flush()?;
    thread::sleep(Duration::from_millis(BANNER_MS));
    // keys typed during the banner belong to nobody
    while event::poll(Duration::ZERO)? {
        event::read()?;
    }
    Ok(())
}

/// Reads at most one character key per call without blocking.
#[derive(Default)]
struct TerminalKeys {
    quit: bool,
    failure: Option<io::Error>,
}

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> Option<char> {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(err) => {
                    self.failure = Some(err);
                    return None;
                }
            }
            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => key,
                Ok(_) => continue,
                Err(err) => {
                    self.failure = Some(err);
                    return None;
                }
            };
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                self.quit = true;
                return None;
            }
            match key.code {
                KeyCode::Char(ch) => return Some(ch),
                KeyCode::Esc => return Some('\u{1b}'),
                _ => continue,
            }
        }
    }
}

struct TerminalSurface<'a> {
    out: &'a mut Stdout,
    cursor: Option<(u16, u16)>,
    failure: Option<io::Error>,
}

impl<'a> TerminalSurface<'a> {
    fn new(out: &'a mut Stdout) -> Self {
        Self {
            out,
            cursor: None,
            failure: None,
        }
    }

    fn finish(self) -> io::Result<Option<(u16, u16)>> {
        match self.failure {
            Some(err) => Err(err),
            None => {
                self.out.queue(ResetColor)?;
                Ok(self.cursor)
            }
        }
    }

    fn queue_cell(&mut self, col: u16, row: u16, ch: char, color: Color) -> io::Result<()> {
        self.out.queue(MoveTo(col, row))?;
        self.out.queue(SetForegroundColor(color))?;
        self.out.queue(Print(ch))?;
        Ok(())
    }
}

impl RenderSurface for TerminalSurface<'_> {
    fn set_cell(&mut self, x: i32, y: i32, ch: char, style: CellStyle) {
        if self.failure.is_some() {
            return;
        }
        let (Ok(col), Ok(row)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        if let Err(err) = self.queue_cell(col, row, ch, style_color(style)) {
            self.failure = Some(err);
        }
    }

    fn highlight_cell(&mut self, x: i32, y: i32) {
        if let (Ok(col), Ok(row)) = (u16::try_from(x), u16::try_from(y)) {
            self.cursor = Some((col, row));
        }
    }
}

fn style_color(style: CellStyle) -> Color {
    match style {
        CellStyle::Wall => Color::Blue,
        CellStyle::Hazard => Color::Red,
        CellStyle::Point => Color::White,
        CellStyle::Collected => Color::DarkGrey,
        CellStyle::Empty => Color::Reset,
        CellStyle::Player => Color::Yellow,
        CellStyle::Ghost => Color::Magenta,
        CellStyle::LineNumber => Color::DarkYellow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("modal-maze").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn positional_level_and_mode_are_optional() {
        let parsed = cli(&[]);
        assert_eq!(parsed.level, None);
        assert_eq!(parsed.maps_dir, PathBuf::from("maps"));
        assert_eq!(parsed.last_level, DEFAULT_LAST_LEVEL);

        let parsed = cli(&["4", "n", "--seed", "7", "--skip-tutorial"]);
        assert_eq!(parsed.level, Some(4));
        assert_eq!(parsed.mode.as_deref(), Some("n"));
        assert!(parsed.skip_tutorial);
    }

    #[test]
    fn cli_flags_override_the_base_config() {
        let config = base_config(&cli(&["0", "n", "--seed", "11"])).expect("valid config");
        assert_eq!(config.difficulty, Difficulty::Normal);
        assert_eq!(config.seed, Some(11));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result = base_config(&cli(&["0", "x"]));
        assert!(matches!(result, Err(LevelError::Config(_))));
    }

    #[test]
    fn config_file_is_layered_under_flags() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"difficulty":"normal","seed":3}"#).expect("write config");
        let path_arg = path.to_string_lossy().to_string();
        let config =
            base_config(&cli(&["--config", &path_arg, "--seed", "9"])).expect("valid config");
        assert_eq!(config.difficulty, Difficulty::Normal);
        assert_eq!(config.seed, Some(9));
    }
}
