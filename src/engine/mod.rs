use std::mem;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::audio::{AudioCue, AudioDirector};
use crate::config::EngineConfig;
use crate::constants::{PLAYER_SPAWN, SURFACE_HEIGHT, SURFACE_WIDTH};
use crate::error::EngineError;
use crate::ghost::Ghost;
use crate::host::{EngineObserver, FrameHost, FrameId, Host};
use crate::input::InputMapper;
use crate::maze::Maze;
use crate::player::Player;
use crate::render::{draw_frame, FloatingText, RenderTarget, Scene};
use crate::rng::Rng;
use crate::session::{SessionReport, SessionStatus};
use crate::types::{EngineSnapshot, GhostName, GridPos, HudStats, PhaseKind};

mod collision;
mod phase;
mod utils;

use self::collision::CollisionOutcome;
use self::phase::Phase;
use self::utils::{frame_delta_secs, grace_alpha, tick_floating_texts, whole_seconds};

fn spawn_ghosts() -> Vec<Ghost> {
    GhostName::ALL.into_iter().map(Ghost::new).collect()
}

pub struct GameEngine {
    config: EngineConfig,
    seed: u32,
    rng: Rng,
    maze: Maze,
    player: Player,
    ghosts: Vec<Ghost>,
    input: InputMapper,
    audio: AudioDirector,
    surface: Box<dyn RenderTarget>,
    frames: Box<dyn FrameHost>,
    observer: Box<dyn EngineObserver>,

    phase: Phase,
    frame_request: Option<FrameId>,
    last_frame_ms: Option<f64>,
    floating_texts: Vec<FloatingText>,

    score: u32,
    level: u32,
    lives: u32,
    ghosts_eaten: u32,
    power_ups_used: u32,
    elapsed_secs: f64,
    started_at: DateTime<Utc>,
    game_over_reported: bool,
    destroyed: bool,
}

impl GameEngine {
    pub fn new(config: EngineConfig, host: Host) -> Result<Self, EngineError> {
        config.validate()?;
        let Host {
            surface,
            audio,
            frames,
            observer,
        } = host;
        let surface = surface.ok_or(EngineError::MissingSurface)?;

        let (width, height) = surface.size();
        if width != SURFACE_WIDTH || height != SURFACE_HEIGHT {
            warn!(
                width,
                height,
                expected_width = SURFACE_WIDTH,
                expected_height = SURFACE_HEIGHT,
                "render surface size differs from the logical maze size"
            );
        }

        let seed = config.seed.unwrap_or_else(Rng::entropy_seed);
        let audio = AudioDirector::new(audio, config.muted, config.cue_timeout_secs);
        let lives = config.starting_lives;

        let mut engine = Self {
            config,
            seed,
            rng: Rng::new(seed),
            maze: Maze::new(),
            player: Player::new(PLAYER_SPAWN.into()),
            ghosts: spawn_ghosts(),
            input: InputMapper::new(),
            audio,
            surface,
            frames,
            observer,
            phase: Phase::Idle,
            frame_request: None,
            last_frame_ms: None,
            floating_texts: Vec::new(),
            score: 0,
            level: 1,
            lives,
            ghosts_eaten: 0,
            power_ups_used: 0,
            elapsed_secs: 0.0,
            started_at: Utc::now(),
            game_over_reported: false,
            destroyed: false,
        };
        debug!(seed, lives, "engine created");
        engine.render();
        engine.push_hud();
        Ok(engine)
    }

    pub fn start(&mut self) {
        if self.destroyed {
            warn!("start called on a destroyed engine");
            return;
        }
        if !matches!(self.phase, Phase::Idle) {
            debug!(phase = ?self.phase.kind(), "start ignored");
            return;
        }

        let cue = self.audio.play_awaited(AudioCue::Start);
        self.started_at = Utc::now();
        self.phase = Phase::Starting { cue };
        self.last_frame_ms = Some(self.frames.now_ms());
        self.request_frame();
        debug!("engine starting");
    }

    pub fn pause(&mut self) {
        if self.destroyed || !self.phase.is_running() {
            return;
        }
        self.cancel_frame();
        let previous = mem::replace(&mut self.phase, Phase::Idle);
        self.phase = Phase::Paused(Box::new(previous));
        self.audio.pause();
        debug!("paused");
    }

    pub fn resume(&mut self) {
        if self.destroyed {
            return;
        }
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Paused(previous) => {
                self.phase = *previous;
                self.last_frame_ms = Some(self.frames.now_ms());
                self.audio.resume();
                self.request_frame();
                debug!(phase = ?self.phase.kind(), "resumed");
            }
            other => self.phase = other,
        }
    }

    pub fn reset(&mut self) {
        self.cancel_frame();
        self.rng = Rng::new(self.seed);
        self.maze = Maze::new();
        self.player = Player::new(PLAYER_SPAWN.into());
        self.ghosts = spawn_ghosts();
        self.floating_texts.clear();
        self.score = 0;
        self.level = 1;
        self.lives = self.config.starting_lives;
        self.ghosts_eaten = 0;
        self.power_ups_used = 0;
        self.elapsed_secs = 0.0;
        self.started_at = Utc::now();
        self.game_over_reported = false;
        self.phase = Phase::Idle;
        self.last_frame_ms = None;
        debug!("engine reset");
        self.render();
        self.push_hud();
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.cancel_frame();
        self.input.detach();
        self.audio.release();
        self.destroyed = true;
        debug!("engine destroyed");
    }

    pub fn key_down(&mut self, key: &str) -> bool {
        self.input.key_down(key)
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    pub fn frame(&mut self, timestamp_ms: f64) {
        if self.frame_request.take().is_none() {
            return;
        }
        let dt = frame_delta_secs(self.last_frame_ms, timestamp_ms, self.config.max_frame_dt_secs);
        self.last_frame_ms = Some(timestamp_ms);

        let current = mem::replace(&mut self.phase, Phase::Idle);
        let from = current.kind();
        self.phase = self.advance(current, dt);
        let to = self.phase.kind();
        if from != to {
            debug!(?from, ?to, "phase change");
        }

        self.render();
        self.push_hud();
        if self.phase.is_running() {
            self.request_frame();
        }
    }

    fn advance(&mut self, phase: Phase, dt: f32) -> Phase {
        match phase {
            Phase::Starting { mut cue } => {
                if cue.poll(dt) {
                    Phase::Playing
                } else {
                    Phase::Starting { cue }
                }
            }
            Phase::Intermission { mut cue, elapsed } => {
                self.maze.update_flash(dt);
                let elapsed = elapsed + dt;
                if cue.poll(dt) && elapsed >= self.config.intermission_min_secs {
                    self.advance_level()
                } else {
                    Phase::Intermission { cue, elapsed }
                }
            }
            Phase::Dying {
                timer,
                mut cue,
                final_life,
            } => {
                self.elapsed_secs += f64::from(dt);
                self.player.update_melting(dt);
                tick_floating_texts(&mut self.floating_texts, dt);
                let timer = timer - dt;
                let cue_done = cue.poll(dt);
                if timer > 0.0 || !cue_done {
                    return Phase::Dying {
                        timer,
                        cue,
                        final_life,
                    };
                }
                if final_life {
                    self.finish_game()
                } else {
                    self.respawn_all();
                    Phase::RespawnGrace {
                        timer: self.config.respawn_grace_secs,
                    }
                }
            }
            Phase::EatingGhost { timer } => {
                self.elapsed_secs += f64::from(dt);
                tick_floating_texts(&mut self.floating_texts, dt);
                for ghost in &mut self.ghosts {
                    ghost.tick_respawn_delay(dt);
                }
                let timer = timer - dt;
                if timer > 0.0 {
                    Phase::EatingGhost { timer }
                } else {
                    Phase::Playing
                }
            }
            Phase::RespawnGrace { timer } => {
                self.elapsed_secs += f64::from(dt);
                tick_floating_texts(&mut self.floating_texts, dt);
                let timer = timer - dt;
                if timer > 0.0 {
                    Phase::RespawnGrace { timer }
                } else {
                    Phase::Playing
                }
            }
            Phase::Playing => {
                self.elapsed_secs += f64::from(dt);
                self.update_playing(dt)
            }
            other => other,
        }
    }

    // Ghosts chase the post-move player and collisions see post-move tiles.
    fn update_playing(&mut self, dt: f32) -> Phase {
        let player_before = self.player.grid();
        let ghosts_before: Vec<GridPos> = self.ghosts.iter().map(Ghost::grid).collect();

        self.player.update(dt, self.input.direction(), &self.maze);
        for ghost in &mut self.ghosts {
            ghost.update(dt, &self.maze, &self.player, &mut self.rng);
        }
        tick_floating_texts(&mut self.floating_texts, dt);

        self.resolve_pellet();
        let outcome = self.resolve_ghost_collisions(player_before, &ghosts_before);
        if outcome == CollisionOutcome::PlayerCaught {
            return self.begin_death();
        }
        if self.maze.is_complete() {
            return self.begin_intermission();
        }
        if outcome == CollisionOutcome::AteGhost {
            return Phase::EatingGhost {
                timer: self.config.eating_ghost_freeze_secs,
            };
        }
        Phase::Playing
    }

    fn begin_death(&mut self) -> Phase {
        self.lives = self.lives.saturating_sub(1);
        self.player.start_melting();
        let cue = self.audio.play_awaited(AudioCue::Death);
        debug!(lives = self.lives, "life lost");
        Phase::Dying {
            timer: self.config.death_animation_secs,
            cue,
            final_life: self.lives == 0,
        }
    }

    fn begin_intermission(&mut self) -> Phase {
        self.maze.start_flashing();
        let cue = self.audio.play_awaited(AudioCue::Intermission);
        debug!(level = self.level, "level cleared");
        Phase::Intermission { cue, elapsed: 0.0 }
    }

    fn advance_level(&mut self) -> Phase {
        self.level += 1;
        self.maze.reset();
        self.respawn_all();
        self.floating_texts.clear();
        self.last_frame_ms = Some(self.frames.now_ms());
        info!(level = self.level, score = self.score, "level started");
        Phase::Playing
    }

    fn respawn_all(&mut self) {
        self.player.respawn();
        for ghost in &mut self.ghosts {
            ghost.respawn();
        }
    }

    fn finish_game(&mut self) -> Phase {
        self.audio.play(AudioCue::GameOver);
        if !self.game_over_reported {
            self.game_over_reported = true;
            let report = self.session_report(SessionStatus::Completed);
            self.observer.on_game_over(&report);
        }
        info!(
            score = self.score,
            level = self.level,
            seconds = self.time_seconds(),
            "game over"
        );
        Phase::GameOver
    }

    fn request_frame(&mut self) {
        if self.destroyed || self.frame_request.is_some() {
            return;
        }
        self.frame_request = Some(self.frames.request_frame());
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.frame_request.take() {
            self.frames.cancel_frame(id);
        }
    }

    fn render(&mut self) {
        let active = self.phase.active();
        let entity_alpha = match active {
            Phase::RespawnGrace { timer } => grace_alpha(*timer, self.config.respawn_grace_secs),
            _ => 1.0,
        };
        let show_entities = !matches!(active, Phase::Intermission { .. });

        let scene = Scene {
            maze: &self.maze,
            player: &self.player,
            ghosts: &self.ghosts,
            floating_texts: &self.floating_texts,
            entity_alpha,
            show_entities,
        };
        draw_frame(self.surface.as_mut(), &scene);
    }

    fn push_hud(&mut self) {
        let hud = self.hud();
        self.observer.on_hud(&hud);
    }

    pub fn hud(&self) -> HudStats {
        HudStats {
            score: self.score,
            level: self.level,
            lives: self.lives,
            time_seconds: self.time_seconds(),
            ghosts_eaten: self.ghosts_eaten,
            power_ups_used: self.power_ups_used,
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase.kind(),
            paused: self.is_paused(),
            hud: self.hud(),
            pellets_remaining: self.maze.pellets_remaining(),
            player: self.player.view(),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
        }
    }

    pub fn session_report(&self, status: SessionStatus) -> SessionReport {
        let ended_at = match status {
            SessionStatus::InProgress => None,
            SessionStatus::Completed | SessionStatus::Abandoned => Some(Utc::now()),
        };
        SessionReport::from_hud(&self.hud(), status, self.started_at, ended_at)
    }

    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::Paused(_) | Phase::GameOver)
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn time_seconds(&self) -> u32 {
        whole_seconds(self.elapsed_secs)
    }

    pub fn ghosts_eaten(&self) -> u32 {
        self.ghosts_eaten
    }

    pub fn power_ups_used(&self) -> u32 {
        self.power_ups_used
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn ghost(&self, name: GhostName) -> Option<&Ghost> {
        self.ghosts.iter().find(|ghost| ghost.name() == name)
    }

    pub fn input(&self) -> &InputMapper {
        &self.input
    }

    #[doc(hidden)]
    pub fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
    }

    #[doc(hidden)]
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    #[doc(hidden)]
    pub fn ghost_mut(&mut self, name: GhostName) -> Option<&mut Ghost> {
        self.ghosts.iter_mut().find(|ghost| ghost.name() == name)
    }

    #[doc(hidden)]
    pub fn maze_mut(&mut self) -> &mut Maze {
        &mut self.maze
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ScriptedAudio;
    use crate::error::ConfigError;
    use crate::host::{ManualFrameHost, RecordingObserver};
    use crate::render::{DrawCall, RecordingSurface};
    use crate::types::GhostMode;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    struct Harness {
        engine: GameEngine,
        frames: ManualFrameHost,
        surface: RecordingSurface,
        audio: ScriptedAudio,
        observer: RecordingObserver,
    }

    impl Harness {
        fn run_frames(&mut self, count: usize) {
            for _ in 0..count {
                if let Some(ts) = self.frames.fire(FRAME_MS) {
                    self.engine.frame(ts);
                }
            }
        }

        fn run_secs(&mut self, secs: f32) {
            self.run_frames((secs * 60.0).round() as usize);
        }

        fn start_playing(&mut self) {
            self.engine.start();
            self.run_frames(1);
            assert_eq!(self.engine.phase(), PhaseKind::Playing);
        }
    }

    fn seeded(seed: u32) -> EngineConfig {
        EngineConfig {
            seed: Some(seed),
            ..EngineConfig::default()
        }
    }

    fn harness_with(config: EngineConfig, audio: ScriptedAudio) -> Harness {
        let frames = ManualFrameHost::new();
        let surface = RecordingSurface::new();
        let observer = RecordingObserver::new();
        let host = Host::new(surface.clone(), frames.clone())
            .with_audio(audio.clone())
            .with_observer(observer.clone());
        let engine = GameEngine::new(config, host).expect("engine should build");
        Harness {
            engine,
            frames,
            surface,
            audio,
            observer,
        }
    }

    fn harness() -> Harness {
        harness_with(seeded(42), ScriptedAudio::new())
    }

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn missing_surface_is_fatal() {
        let host = Host {
            surface: None,
            audio: Box::new(ScriptedAudio::new()),
            frames: Box::new(ManualFrameHost::new()),
            observer: Box::new(RecordingObserver::new()),
        };
        let result = GameEngine::new(EngineConfig::default(), host);
        assert!(matches!(result, Err(EngineError::MissingSurface)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let host = Host::new(RecordingSurface::new(), ManualFrameHost::new());
        let config = EngineConfig {
            starting_lives: 0,
            ..EngineConfig::default()
        };
        let result = GameEngine::new(config, host);
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::NoLives))
        ));
    }

    #[test]
    fn construction_renders_initial_frame() {
        let h = harness();
        assert!(!h.surface.is_empty());
        assert_eq!(h.engine.phase(), PhaseKind::Idle);
        assert_eq!(h.observer.last_hud().map(|hud| hud.lives), Some(3));
        assert_eq!(h.frames.pending(), None);
    }

    #[test]
    fn start_waits_for_start_cue() {
        let audio = ScriptedAudio::new();
        audio.hold(AudioCue::Start);
        let mut h = harness_with(seeded(1), audio);
        let blinky_start = h.engine.ghost(GhostName::Blinky).map(Ghost::pixel);

        h.engine.start();
        h.run_secs(1.0);
        assert_eq!(h.engine.phase(), PhaseKind::Starting);
        assert_eq!(h.engine.ghost(GhostName::Blinky).map(Ghost::pixel), blinky_start);
        assert_eq!(h.engine.time_seconds(), 0);

        h.audio.finish(AudioCue::Start);
        h.run_frames(1);
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
    }

    #[test]
    fn stuck_start_cue_times_out() {
        let audio = ScriptedAudio::new();
        audio.hold(AudioCue::Start);
        let mut h = harness_with(seeded(1), audio);
        h.engine.start();
        h.run_secs(4.5);
        assert_eq!(h.engine.phase(), PhaseKind::Starting);
        h.run_secs(0.7);
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let mut h = harness();
        h.engine.start();
        let requests = h.frames.request_count();
        h.engine.start();
        h.run_frames(3);
        h.engine.start();
        assert_eq!(h.audio.play_count(AudioCue::Start), 1);
        assert_eq!(h.frames.request_count(), requests + 3);
    }

    #[test]
    fn idle_player_scores_nothing() {
        let mut h = harness();
        h.start_playing();
        h.run_secs(3.0);
        assert_eq!(h.engine.score(), 0);
        assert_eq!(h.engine.lives(), 3);
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
        assert!(h.engine.time_seconds() >= 2);
    }

    #[test]
    fn moving_onto_pellet_scores_ten() {
        let mut h = harness();
        h.start_playing();
        assert!(h.engine.key_down("ArrowRight"));
        h.run_secs(0.2);
        h.engine.key_up("ArrowRight");

        assert_eq!(h.engine.score(), 10);
        assert_eq!(h.engine.player().grid(), GridPos::new(10, 17));
        let tile = h.engine.maze().tile(10, 17).expect("tile in bounds");
        assert!(tile.collected);
        assert_eq!(h.observer.last_hud().map(|hud| hud.score), Some(10));

        h.engine.reset();
        let tile = h.engine.maze().tile(10, 17).expect("tile in bounds");
        assert!(!tile.collected);
        assert_eq!(h.engine.score(), 0);
    }

    #[test]
    fn power_pellet_frightens_all_ghosts() {
        let mut h = harness();
        h.start_playing();
        h.engine.player_mut().place_at(GridPos::new(1, 12));
        h.engine.key_down("s");
        h.run_secs(0.3);

        // 10 for the pellet under the drop point, 50 for the power pellet.
        assert_eq!(h.engine.score(), 60);
        assert_eq!(h.engine.power_ups_used(), 1);
        assert!(h.engine.ghosts().iter().all(Ghost::is_frightened));
        assert_eq!(h.audio.play_count(AudioCue::PowerPellet), 1);
    }

    #[test]
    fn eating_frightened_ghost_scores_and_freezes_board() {
        let mut h = harness();
        h.start_playing();
        let spawn = h.engine.player().grid();
        {
            let blinky = h.engine.ghost_mut(GhostName::Blinky).expect("blinky");
            blinky.place_at(spawn);
            blinky.set_frightened(true);
        }
        h.run_frames(1);

        assert_eq!(h.engine.score(), 200);
        assert_eq!(h.engine.ghosts_eaten(), 1);
        let blinky = h.engine.ghost(GhostName::Blinky).expect("blinky");
        assert_eq!(blinky.mode(), GhostMode::Dead);
        assert!(!blinky.is_frightened());
        assert_eq!(h.engine.phase(), PhaseKind::EatingGhost);
        assert_eq!(h.surface.texts(), vec!["+200".to_string()]);

        h.engine.key_down("ArrowRight");
        let frozen = h.engine.player().pixel();
        h.run_secs(0.5);
        assert_eq!(h.engine.player().pixel(), frozen);
        assert_eq!(h.engine.phase(), PhaseKind::EatingGhost);

        h.run_secs(0.6);
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
        h.run_frames(2);
        assert_ne!(h.engine.player().pixel(), frozen);
    }

    #[test]
    fn last_life_ends_in_game_over() {
        let mut h = harness();
        h.start_playing();
        h.engine.set_lives(1);
        let spawn = h.engine.player().grid();
        h.engine
            .ghost_mut(GhostName::Blinky)
            .expect("blinky")
            .place_at(spawn);
        h.run_frames(1);

        assert_eq!(h.engine.lives(), 0);
        assert_eq!(h.engine.phase(), PhaseKind::Dying);
        assert!(!h.engine.is_paused());

        h.run_secs(2.0);
        assert!(h.engine.is_game_over());
        assert!(h.engine.is_paused());
        assert_eq!(h.observer.game_over_count(), 1);
        assert_eq!(h.frames.pending(), None);

        h.engine.pause();
        h.engine.resume();
        h.run_secs(1.0);
        assert_eq!(h.observer.game_over_count(), 1);
        assert_eq!(h.audio.play_count(AudioCue::GameOver), 1);
        let report = &h.observer.game_overs()[0];
        assert_eq!(report.status, SessionStatus::Completed);
        assert!(report.ended_at.is_some());
    }

    #[test]
    fn death_respawns_with_grace_window() {
        let mut h = harness();
        h.start_playing();
        let spawn = h.engine.player().grid();
        h.engine
            .ghost_mut(GhostName::Blinky)
            .expect("blinky")
            .place_at(spawn);
        h.run_frames(1);
        assert_eq!(h.engine.lives(), 2);
        assert!(h.engine.player().is_melting());

        h.run_secs(1.6);
        assert_eq!(h.engine.phase(), PhaseKind::RespawnGrace);
        assert!(!h.engine.player().is_melting());
        assert_eq!(h.engine.player().grid(), spawn);
        assert!(h.engine.ghost(GhostName::Blinky).is_some_and(Ghost::in_house));

        let alpha = h.surface.calls().iter().find_map(|call| match call {
            DrawCall::Alpha { alpha } if *alpha < 1.0 => Some(*alpha),
            _ => None,
        });
        assert!(alpha.is_some_and(|alpha| (0.5..1.0).contains(&alpha)));

        h.run_secs(1.0);
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
        assert_eq!(h.engine.lives(), 2);
    }

    #[test]
    fn death_waits_for_death_cue() {
        let audio = ScriptedAudio::new();
        audio.hold(AudioCue::Death);
        let mut h = harness_with(seeded(3), audio);
        h.start_playing();
        let spawn = h.engine.player().grid();
        h.engine
            .ghost_mut(GhostName::Blinky)
            .expect("blinky")
            .place_at(spawn);
        h.run_frames(1);

        h.run_secs(2.0);
        assert_eq!(h.engine.phase(), PhaseKind::Dying);
        h.audio.finish(AudioCue::Death);
        h.run_frames(1);
        assert_eq!(h.engine.phase(), PhaseKind::RespawnGrace);
    }

    fn clear_all_but(engine: &mut GameEngine, keep: GridPos) {
        let tiles: Vec<GridPos> = engine.maze().pellet_positions().collect();
        for tile in tiles {
            if tile != keep {
                engine.maze_mut().collect_pellet(tile.col, tile.row);
            }
        }
    }

    #[test]
    fn clearing_maze_advances_level_after_intermission() {
        let mut h = harness();
        h.start_playing();
        clear_all_but(&mut h.engine, GridPos::new(10, 17));
        h.engine.key_down("ArrowRight");
        h.run_secs(0.2);
        h.engine.key_up("ArrowRight");

        assert_eq!(h.engine.phase(), PhaseKind::Intermission);
        assert!(h.engine.maze().is_flashing());
        assert_eq!(h.surface.count_polygons(), 0);
        assert_eq!(h.audio.play_count(AudioCue::Intermission), 1);
        let time_at_clear = h.engine.time_seconds();

        h.run_secs(2.1);
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
        assert_eq!(h.engine.level(), 2);
        assert_eq!(h.engine.score(), 10);
        assert_eq!(h.engine.maze().pellets_remaining(), Maze::new().pellets_remaining());
        assert!(!h.engine.maze().is_flashing());
        assert_eq!(h.engine.player().grid(), GridPos::from(PLAYER_SPAWN));
        assert_eq!(h.engine.time_seconds(), time_at_clear);
    }

    #[test]
    fn intermission_waits_for_jingle() {
        let audio = ScriptedAudio::new();
        audio.hold(AudioCue::Intermission);
        let mut h = harness_with(seeded(5), audio);
        h.start_playing();
        clear_all_but(&mut h.engine, GridPos::new(8, 17));
        h.engine.key_down("ArrowLeft");
        h.run_secs(0.2);

        h.run_secs(3.0);
        assert_eq!(h.engine.phase(), PhaseKind::Intermission);
        assert_eq!(h.engine.level(), 1);
        h.audio.finish(AudioCue::Intermission);
        h.run_frames(1);
        assert_eq!(h.engine.level(), 2);
    }

    #[test]
    fn pause_freezes_and_resume_resyncs_clock() {
        let mut h = harness();
        h.start_playing();
        h.engine.key_down("ArrowRight");
        h.run_frames(5);

        h.engine.pause();
        assert!(h.engine.is_paused());
        assert_eq!(h.engine.phase(), PhaseKind::Paused);
        assert_eq!(h.frames.pending(), None);
        let (x_paused, _) = h.engine.player().pixel();
        let calls_paused = h.surface.len();

        h.frames.advance(10_000.0);
        h.run_frames(10);
        assert_eq!(h.engine.player().pixel().0, x_paused);
        assert_eq!(h.surface.len(), calls_paused);

        h.engine.resume();
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
        h.run_frames(1);
        let (x_resumed, _) = h.engine.player().pixel();
        assert!(approx_eq(x_resumed - x_paused, 4.8, 0.05));
        assert_eq!(h.engine.time_seconds(), 0);
        assert_eq!(h.audio.pause_count(), 1);
        assert_eq!(h.audio.resume_count(), 1);
    }

    #[test]
    fn long_frame_gap_is_clamped() {
        let mut h = harness();
        h.start_playing();
        h.engine.key_down("ArrowRight");
        let (x_before, _) = h.engine.player().pixel();
        h.frames.advance(5_000.0);
        h.run_frames(1);
        let (x_after, _) = h.engine.player().pixel();
        assert!(approx_eq(x_after - x_before, 28.8, 0.05));
    }

    #[test]
    fn destroy_is_idempotent_and_stops_frames() {
        let mut h = harness();
        h.start_playing();
        h.engine.destroy();
        h.engine.destroy();
        assert_eq!(h.frames.cancel_count(), 1);
        assert_eq!(h.frames.pending(), None);
        assert_eq!(h.audio.release_count(), 1);
        assert!(h.engine.is_destroyed());

        let huds = h.observer.hud_count();
        h.engine.frame(1_000_000.0);
        h.run_frames(5);
        assert_eq!(h.observer.hud_count(), huds);

        let requests = h.frames.request_count();
        h.engine.start();
        h.engine.resume();
        assert_eq!(h.frames.request_count(), requests);
        assert!(!h.engine.key_down("ArrowUp"));
    }

    #[test]
    fn destroy_without_start_is_safe() {
        let mut h = harness();
        h.engine.destroy();
        h.engine.destroy();
        assert_eq!(h.frames.cancel_count(), 0);
        assert_eq!(h.audio.release_count(), 1);
    }

    #[test]
    fn reset_restores_a_fresh_session() {
        let mut h = harness();
        h.start_playing();
        h.engine.key_down("ArrowRight");
        h.run_secs(1.0);
        h.engine.set_lives(1);
        h.engine.reset();

        assert_eq!(h.engine.phase(), PhaseKind::Idle);
        assert_eq!(h.frames.pending(), None);
        assert_eq!(h.engine.score(), 0);
        assert_eq!(h.engine.lives(), 3);
        assert_eq!(h.engine.level(), 1);
        assert_eq!(h.engine.time_seconds(), 0);
        assert_eq!(h.engine.player().grid(), GridPos::from(PLAYER_SPAWN));
        assert_eq!(
            h.engine.maze().pellets_remaining(),
            Maze::new().pellets_remaining()
        );
        assert_eq!(h.observer.last_hud(), Some(h.engine.hud()));

        h.engine.start();
        h.run_frames(1);
        assert_eq!(h.engine.phase(), PhaseKind::Playing);
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = harness_with(seeded(424_242), ScriptedAudio::new());
        let mut b = harness_with(seeded(424_242), ScriptedAudio::new());
        for h in [&mut a, &mut b] {
            h.start_playing();
            h.engine.player_mut().place_at(GridPos::new(1, 12));
            h.engine.key_down("ArrowDown");
        }

        for _ in 0..20 {
            a.run_secs(0.5);
            b.run_secs(0.5);
            let sa = serde_json::to_string(&a.engine.snapshot()).expect("snapshot");
            let sb = serde_json::to_string(&b.engine.snapshot()).expect("snapshot");
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn hud_is_pushed_every_frame() {
        let mut h = harness();
        h.start_playing();
        let before = h.observer.hud_count();
        h.run_frames(30);
        assert_eq!(h.observer.hud_count(), before + 30);
    }

    #[test]
    fn muted_engine_plays_no_cues() {
        let mut config = seeded(8);
        config.muted = true;
        let mut h = harness_with(config, ScriptedAudio::new());
        h.start_playing();
        h.engine.key_down("ArrowRight");
        h.run_secs(0.2);
        assert_eq!(h.engine.score(), 10);
        assert!(h.audio.played().is_empty());
    }

    #[test]
    fn in_progress_report_has_no_end() {
        let mut h = harness();
        h.start_playing();
        let report = h.engine.session_report(SessionStatus::InProgress);
        assert_eq!(report.level_reached, 1);
        assert!(report.ended_at.is_none());
        let report = h.engine.session_report(SessionStatus::Abandoned);
        assert!(report.ended_at.is_some());
    }
}
