use chrono::{SecondsFormat, Utc};
use clap::Parser;
use modal_maze::config::SessionConfig;
use modal_maze::constants::TICK_MS;
use modal_maze::engine::GameSession;
use modal_maze::input::ScriptedKeys;
use modal_maze::level::load_level_file;
use modal_maze::render::TextSurface;
use modal_maze::types::{Difficulty, GameOutcome, SessionEvent};
use serde::Serialize;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_MAX_TICKS: u64 = 120_000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays a key script against one level")]
struct Cli {
    #[arg(long)]
    level: PathBuf,
    #[arg(long, default_value = "")]
    keys: String,
    #[arg(long, default_value_t = TICK_MS)]
    tick_ms: u64,
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value = "h")]
    mode: String,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize)]
struct RunCounters {
    #[serde(rename = "keysRead")]
    keys_read: usize,
    #[serde(rename = "commandsRun")]
    commands_run: usize,
    #[serde(rename = "commandsFailed")]
    commands_failed: usize,
    #[serde(rename = "pointsCollected")]
    points_collected: usize,
    #[serde(rename = "ghostStuck")]
    ghost_stuck: usize,
}

#[derive(Clone, Debug, Serialize)]
struct RunResult {
    #[serde(rename = "runId")]
    run_id: String,
    level: String,
    seed: u32,
    difficulty: Difficulty,
    outcome: GameOutcome,
    score: u32,
    #[serde(rename = "totalPoints")]
    total_points: u32,
    #[serde(rename = "elapsedMs")]
    elapsed_ms: u64,
    ticks: u64,
    #[serde(rename = "tickLimitReached")]
    tick_limit_reached: bool,
    #[serde(flatten)]
    counters: RunCounters,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    board: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let started_at_ms = now_ms();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(cli.seed.unwrap_or(0), started_at_ms));

    let Some(difficulty) = Difficulty::parse(&cli.mode) else {
        emit_log(
            "error",
            "invalid_mode",
            &run_id,
            None,
            json!({ "mode": cli.mode, "allowed": ["h", "n"] }),
        );
        std::process::exit(2);
    };

    let level = match load_level_file(&cli.level) {
        Ok(level) => level,
        Err(error) => {
            emit_log(
                "error",
                "level_load_failed",
                &run_id,
                None,
                json!({
                    "path": cli.level.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    };

    let config = SessionConfig {
        difficulty,
        seed: cli.seed,
        ..SessionConfig::default()
    };
    let mut session = match GameSession::new(&level, &config) {
        Ok(session) => session,
        Err(error) => {
            emit_log(
                "error",
                "session_start_failed",
                &run_id,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    emit_log(
        "info",
        "run_started",
        &run_id,
        None,
        json!({
            "level": cli.level.to_string_lossy(),
            "seed": session.seed(),
            "difficulty": difficulty,
            "keys": cli.keys.chars().count(),
            "totalPoints": session.total_points(),
        }),
    );

    let mut keys = ScriptedKeys::new(&cli.keys);
    let (ticks, counters) = run_session(&mut session, &mut keys, cli.tick_ms, cli.max_ticks, &run_id);
    let tick_limit_reached = session.is_in_progress() && ticks >= cli.max_ticks;
    if tick_limit_reached {
        emit_log(
            "warn",
            "tick_limit_reached",
            &run_id,
            Some(ticks),
            json!({ "maxTicks": cli.max_ticks }),
        );
    }

    let mut surface = TextSurface::new();
    session.render_to(&mut surface);
    let result = RunResult {
        run_id: run_id.clone(),
        level: cli.level.to_string_lossy().to_string(),
        seed: session.seed(),
        difficulty,
        outcome: session.outcome(),
        score: session.score(),
        total_points: session.total_points(),
        elapsed_ms: session.elapsed_ms(),
        ticks,
        tick_limit_reached,
        counters,
        finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        board: surface.lines(),
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &result) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    println!(
        "{}",
        serde_json::to_string(&result).expect("run result should serialize")
    );
    emit_log(
        "info",
        "run_finished",
        &run_id,
        Some(ticks),
        json!({
            "outcome": result.outcome,
            "score": result.score,
            "elapsedMs": result.elapsed_ms,
            "summaryOut": summary_out_written,
        }),
    );
}

fn run_session(
    session: &mut GameSession,
    keys: &mut ScriptedKeys,
    tick_ms: u64,
    max_ticks: u64,
    run_id: &str,
) -> (u64, RunCounters) {
    let mut counters = RunCounters::default();
    let mut ticks = 0u64;
    while session.is_in_progress() && ticks < max_ticks {
        if !keys.is_empty() {
            counters.keys_read += 1;
        }
        match session.pump(keys, tick_ms) {
            Some(Ok(())) => counters.commands_run += 1,
            Some(Err(_)) => {
                counters.commands_run += 1;
                counters.commands_failed += 1;
            }
            None => {}
        }
        ticks += 1;
        for event in session.build_snapshot(true).events {
            record_event(&mut counters, run_id, ticks, event);
        }
    }
    (ticks, counters)
}

fn record_event(counters: &mut RunCounters, run_id: &str, tick: u64, event: SessionEvent) {
    match event {
        SessionEvent::PointCollected { .. } => counters.points_collected += 1,
        SessionEvent::GhostStuck { .. } => counters.ghost_stuck += 1,
        other => emit_log(
            "info",
            "session_event",
            run_id,
            Some(tick),
            serde_json::to_value(&other).unwrap_or(Value::Null),
        ),
    }
}

fn emit_log(level: &str, event: &str, run_id: &str, tick: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("replay-{seed}-{timestamp_ms}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, result: &RunResult) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modal_maze::level::parse_level;

    fn make_session(text: &str) -> GameSession {
        let level = parse_level(text).expect("valid level");
        let config = SessionConfig {
            seed: Some(9),
            ..SessionConfig::default()
        };
        GameSession::new(&level, &config).expect("session starts")
    }

    fn make_result() -> RunResult {
        RunResult {
            run_id: "replay-1-1".to_string(),
            level: "maps/map0.txt".to_string(),
            seed: 1,
            difficulty: Difficulty::Hard,
            outcome: GameOutcome::Won,
            score: 3,
            total_points: 3,
            elapsed_ms: 15,
            ticks: 3,
            tick_limit_reached: false,
            counters: RunCounters::default(),
            finished_at: "2026-01-01T00:00:00.000Z".to_string(),
            board: Vec::new(),
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "replay-42-123456789");
    }

    #[test]
    fn run_session_stops_when_level_is_cleared() {
        let mut session = make_session("#####\n#abc#\n#####\np 1 1\n");
        let mut keys = ScriptedKeys::new("llhh");
        let (ticks, counters) = run_session(&mut session, &mut keys, TICK_MS, 100, "test");
        assert_eq!(session.outcome(), GameOutcome::Won);
        assert_eq!(ticks, 2);
        assert_eq!(counters.keys_read, 2);
        assert_eq!(counters.points_collected, 3);
        assert_eq!(keys.remaining(), 2);
    }

    #[test]
    fn run_session_respects_tick_limit() {
        let mut session = make_session("#####\n#abc#\n#####\np 1 1\n");
        let mut keys = ScriptedKeys::new("");
        let (ticks, counters) = run_session(&mut session, &mut keys, TICK_MS, 7, "test");
        assert_eq!(ticks, 7);
        assert_eq!(counters.commands_run, 0);
        assert_eq!(session.elapsed_ms(), 7 * TICK_MS);
    }

    #[test]
    fn result_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(make_result()).expect("result should serialize");
        assert_eq!(value["runId"], "replay-1-1");
        assert_eq!(value["totalPoints"], 3);
        assert_eq!(value["keysRead"], 0);
        assert_eq!(value["outcome"], "won");
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("missing").join("summary.json");
        let result = write_summary(&target, &make_result());
        assert!(result.is_err());

        let target = dir.path().join("summary.json");
        write_summary(&target, &make_result()).expect("summary written");
        assert!(target.exists());
    }
}
