use clap::Parser;
use pacman_engine::audio::{AudioCue, ScriptedAudio};
use pacman_engine::autopilot::Autopilot;
use pacman_engine::host::{FrameHost, FrameId, ManualFrameHost, RecordingObserver};
use pacman_engine::render::RecordingSurface;
use pacman_engine::session::{format_duration, SessionReport, SessionStatus};
use pacman_engine::types::{EngineSnapshot, PhaseKind};
use pacman_engine::{EngineConfig, GameEngine, Host};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Simulated seconds to run for.
    #[arg(long, default_value_t = 60.0)]
    seconds: f64,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 60)]
    fps: u32,
    #[arg(long)]
    lives: Option<u32>,
    /// Let the pellet-seeking bot drive the player.
    #[arg(long)]
    autopilot: bool,
    /// Pace frames against the wall clock instead of a manual clock.
    #[arg(long)]
    realtime: bool,
    /// Seconds of game time between progress reports. 0 disables them.
    #[arg(long, default_value_t = 10)]
    report_every: u32,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct SimOptions {
    seconds: f64,
    fps: u32,
    autopilot: bool,
    realtime: bool,
    report_every: u32,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    frame: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct SimulationResult {
    seed: u32,
    #[serde(rename = "framesRun")]
    frames_run: u64,
    #[serde(rename = "finalPhase")]
    final_phase: PhaseKind,
    #[serde(rename = "pelletsRemaining")]
    pellets_remaining: u32,
    #[serde(rename = "drawCallsLastFrame")]
    draw_calls_last_frame: usize,
    #[serde(rename = "cueCounts")]
    cue_counts: BTreeMap<String, usize>,
    #[serde(rename = "hudPushes")]
    hud_pushes: usize,
    report: SessionReport,
    anomalies: Vec<String>,
    #[serde(skip)]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    realtime: bool,
    autopilot: bool,
    fps: u32,
    #[serde(rename = "playTime")]
    play_time: String,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    result: SimulationResult,
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
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<u64>,
    details: Value,
}

#[derive(Debug)]
struct WallClockState {
    origin: Instant,
    next_id: FrameId,
    pending: Option<FrameId>,
}

/// Frame host backed by `Instant`. Clones share the same request slot.
#[derive(Clone, Debug)]
struct WallClockFrameHost {
    state: Rc<RefCell<WallClockState>>,
}

impl WallClockFrameHost {
    fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(WallClockState {
                origin: Instant::now(),
                next_id: 0,
                pending: None,
            })),
        }
    }

    fn fire(&self) -> Option<f64> {
        let now = self.now_ms();
        self.state.borrow_mut().pending.take().map(|_| now)
    }
}

impl FrameHost for WallClockFrameHost {
    fn now_ms(&self) -> f64 {
        self.state.borrow().origin.elapsed().as_secs_f64() * 1000.0
    }

    fn request_frame(&mut self) -> FrameId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.pending = Some(state.next_id);
        state.next_id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let mut state = self.state.borrow_mut();
        if state.pending == Some(id) {
            state.pending = None;
        }
    }
}

enum SimClock {
    Manual(ManualFrameHost),
    Wall(WallClockFrameHost),
}

impl SimClock {
    fn fire(&self, step_ms: f64) -> Option<f64> {
        match self {
            SimClock::Manual(frames) => frames.fire(step_ms),
            SimClock::Wall(frames) => frames.fire(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::load_or_default();
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(lives) = cli.lives {
        config.starting_lives = lives;
    }
    let seed = config.seed.unwrap_or_else(|| default_seed(now_ms()));
    config.seed = Some(seed);

    let options = SimOptions {
        seconds: cli.seconds.max(0.0),
        fps: cli.fps.clamp(1, 240),
        autopilot: cli.autopilot,
        realtime: cli.realtime,
        report_every: cli.report_every,
    };
    let run_started_at_ms = now_ms();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, run_started_at_ms));

    emit_log(
        "info",
        "simulation_started",
        &run_id,
        Some(seed),
        None,
        json!({
            "seconds": options.seconds,
            "fps": options.fps,
            "lives": config.starting_lives,
            "autopilot": options.autopilot,
            "realtime": options.realtime,
        }),
    );

    let result = run_simulation(config, &options, &run_id).await?;

    for anomaly in &result.anomaly_records {
        emit_log(
            "warn",
            "anomaly_detected",
            &run_id,
            Some(seed),
            Some(anomaly.frame),
            json!({
                "message": anomaly.message,
            }),
        );
    }

    println!("{}", serde_json::to_string(&result)?);

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        &options,
        result,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
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

    emit_log(
        "info",
        "simulation_finished",
        &run_id,
        Some(seed),
        Some(summary.result.frames_run),
        json!({
            "score": summary.result.report.score,
            "levelReached": summary.result.report.level_reached,
            "status": summary.result.report.status,
            "playTime": summary.play_time,
            "anomalyCount": summary.anomaly_count,
            "summaryOut": summary_out_written,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_simulation(
    config: EngineConfig,
    options: &SimOptions,
    run_id: &str,
) -> anyhow::Result<SimulationResult> {
    let starting_lives = config.starting_lives;
    let surface = RecordingSurface::new();
    let audio = ScriptedAudio::new();
    let observer = RecordingObserver::new();

    let (clock, host) = if options.realtime {
        let frames = WallClockFrameHost::new();
        (
            SimClock::Wall(frames.clone()),
            Host::new(surface.clone(), frames),
        )
    } else {
        let frames = ManualFrameHost::new();
        (
            SimClock::Manual(frames.clone()),
            Host::new(surface.clone(), frames),
        )
    };
    let host = host
        .with_audio(audio.clone())
        .with_observer(observer.clone());
    let mut engine = GameEngine::new(config, host)?;
    let seed = engine.seed();
    let initial_pellets = engine.maze().pellets_remaining();

    let mut pilot = options.autopilot.then(|| Autopilot::new(seed ^ 0x9E37_79B9));
    let frame_ms = 1000.0 / f64::from(options.fps);
    let total_frames = (options.seconds * f64::from(options.fps)).ceil() as u64;
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(frame_ms / 1000.0));

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut next_report = options.report_every;
    let mut frames_run = 0u64;

    engine.start();
    while frames_run < total_frames {
        if options.realtime {
            ticker.tick().await;
        }
        if let Some(pilot) = pilot.as_mut() {
            pilot.steer(&mut engine);
        }
        let Some(timestamp) = clock.fire(frame_ms) else {
            break;
        };
        engine.frame(timestamp);
        frames_run += 1;

        let snapshot = engine.snapshot();
        for message in collect_snapshot_anomalies(&snapshot, starting_lives, initial_pellets) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                frames_run,
                message,
            );
        }

        if options.report_every > 0 && snapshot.hud.time_seconds >= next_report {
            next_report = snapshot.hud.time_seconds + options.report_every;
            emit_log(
                "info",
                "session_progress",
                run_id,
                Some(seed),
                Some(frames_run),
                serde_json::to_value(engine.session_report(SessionStatus::InProgress))?,
            );
        }
    }

    let status = if engine.is_game_over() {
        SessionStatus::Completed
    } else {
        SessionStatus::Abandoned
    };
    let report = engine.session_report(status);
    let final_phase = engine.phase();
    let pellets_remaining = engine.maze().pellets_remaining();
    if let Some(pilot) = pilot.as_mut() {
        pilot.release(&mut engine);
    }
    engine.destroy();

    Ok(SimulationResult {
        seed,
        frames_run,
        final_phase,
        pellets_remaining,
        draw_calls_last_frame: surface.len(),
        cue_counts: count_cues(&audio.played()),
        hud_pushes: observer.hud_count(),
        report,
        anomalies,
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(
    snapshot: &EngineSnapshot,
    starting_lives: u32,
    initial_pellets: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.hud.lives > starting_lives {
        anomalies.push(format!(
            "lives above starting value: {}/{}",
            snapshot.hud.lives, starting_lives
        ));
    }
    if snapshot.pellets_remaining > initial_pellets {
        anomalies.push(format!(
            "pellets remaining grew: {}/{}",
            snapshot.pellets_remaining, initial_pellets
        ));
    }
    if snapshot.hud.lives == 0 && !matches!(snapshot.phase, PhaseKind::Dying | PhaseKind::GameOver)
    {
        anomalies.push(format!("no lives left in phase {:?}", snapshot.phase));
    }
    if !snapshot.player.x.is_finite() || !snapshot.player.y.is_finite() {
        anomalies.push("player position is not finite".to_string());
    }
    for ghost in &snapshot.ghosts {
        if !ghost.x.is_finite() || !ghost.y.is_finite() {
            anomalies.push(format!("ghost position is not finite: {:?}", ghost.name));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    frame: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        frame,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn count_cues(played: &[AudioCue]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for cue in played {
        *counts.entry(cue_key(*cue)).or_insert(0) += 1;
    }
    counts
}

fn cue_key(cue: AudioCue) -> String {
    match cue {
        AudioCue::Start => "start",
        AudioCue::Chomp => "chomp",
        AudioCue::PowerPellet => "power_pellet",
        AudioCue::EatGhost => "eat_ghost",
        AudioCue::Death => "death",
        AudioCue::Intermission => "intermission",
        AudioCue::GameOver => "game_over",
    }
    .to_string()
}

fn default_seed(timestamp_ms: u64) -> u32 {
    timestamp_ms as u32
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    options: &SimOptions,
    result: SimulationResult,
) -> RunSummary {
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        realtime: options.realtime,
        autopilot: options.autopilot,
        fps: options.fps,
        play_time: format_duration(result.report.duration_seconds),
        anomaly_count: result.anomaly_records.len(),
        result,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    seed: Option<u32>,
    frame: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        seed,
        frame,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => tracing::error!("structured log failed to serialize: {}", error),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seconds: f64, autopilot: bool) -> SimOptions {
        SimOptions {
            seconds,
            fps: 60,
            autopilot,
            realtime: false,
            report_every: 0,
        }
    }

    fn seeded(seed: u32) -> EngineConfig {
        EngineConfig {
            seed: Some(seed),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn cue_counts_use_snake_case_keys() {
        let counts = count_cues(&[AudioCue::Chomp, AudioCue::PowerPellet, AudioCue::Chomp]);
        assert_eq!(counts.get("chomp"), Some(&2));
        assert_eq!(counts.get("power_pellet"), Some(&1));
    }

    #[tokio::test]
    async fn idle_run_stays_clean() {
        let result = run_simulation(seeded(42), &options(2.0, false), "sim-test")
            .await
            .expect("simulation should run");
        assert_eq!(result.frames_run, 120);
        assert_eq!(result.report.score, 0);
        assert_eq!(result.report.status, SessionStatus::Abandoned);
        assert!(result.anomalies.is_empty());
        assert!(result.draw_calls_last_frame > 0);
        assert_eq!(result.cue_counts.get("start"), Some(&1));
    }

    #[tokio::test]
    async fn autopilot_run_scores_and_is_reproducible() {
        let first = run_simulation(seeded(7), &options(5.0, true), "sim-test")
            .await
            .expect("simulation should run");
        let second = run_simulation(seeded(7), &options(5.0, true), "sim-test")
            .await
            .expect("simulation should run");
        assert!(first.report.score > 0);
        assert_eq!(first.report.score, second.report.score);
        assert_eq!(first.pellets_remaining, second.pellets_remaining);
    }

    #[test]
    fn fresh_engine_snapshot_has_no_anomalies() {
        let host = Host::new(RecordingSurface::new(), ManualFrameHost::new());
        let engine = GameEngine::new(seeded(3), host).expect("engine should build");
        let snapshot = engine.snapshot();
        let anomalies =
            collect_snapshot_anomalies(&snapshot, 3, engine.maze().pellets_remaining());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn extra_lives_are_reported() {
        let host = Host::new(RecordingSurface::new(), ManualFrameHost::new());
        let engine = GameEngine::new(seeded(3), host).expect("engine should build");
        let anomalies = collect_snapshot_anomalies(&engine.snapshot(), 2, 1_000);
        assert_eq!(anomalies, vec!["lives above starting value: 3/2".to_string()]);
    }

    #[tokio::test]
    async fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("pacman-engine-missing-{now}"))
            .join("summary.json");
        let opts = options(0.5, false);
        let result = run_simulation(seeded(1), &opts, "sim-1-1")
            .await
            .expect("simulation should run");
        let summary = build_run_summary("sim-1-1".to_string(), 1, 2, &opts, result);
        assert_eq!(summary.play_time, "0:00");
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].frame, 10);
        assert_eq!(records[1].frame, 11);
    }
}
