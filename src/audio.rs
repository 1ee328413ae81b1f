use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Start,
    Chomp,
    PowerPellet,
    EatGhost,
    Death,
    Intermission,
    GameOver,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("playback rejected: {0}")]
    Rejected(String),
    #[error("audio output unavailable")]
    Unavailable,
}

pub type CueCompletion = oneshot::Receiver<Result<(), AudioError>>;

pub fn completed() -> CueCompletion {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(Ok(()));
    rx
}

pub trait AudioSink {
    fn play(&mut self, cue: AudioCue) -> Result<CueCompletion, AudioError>;
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn release(&mut self) {}
}

// Failed, dropped and overdue cues all count as finished.
#[derive(Debug)]
pub struct PendingCue {
    cue: AudioCue,
    completion: Option<CueCompletion>,
    waited: f32,
    timeout: f32,
    done: bool,
}

impl PendingCue {
    pub fn new(cue: AudioCue, completion: Option<CueCompletion>, timeout: f32) -> Self {
        Self {
            cue,
            done: completion.is_none(),
            completion,
            waited: 0.0,
            timeout,
        }
    }

    pub fn cue(&self) -> AudioCue {
        self.cue
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn poll(&mut self, dt: f32) -> bool {
        if self.done {
            return true;
        }
        self.waited += dt;
        let Some(completion) = self.completion.as_mut() else {
            self.done = true;
            return true;
        };

        match completion.try_recv() {
            Ok(Ok(())) => self.done = true,
            Ok(Err(err)) => {
                warn!(cue = ?self.cue, error = %err, "audio cue failed, continuing");
                self.done = true;
            }
            Err(TryRecvError::Closed) => {
                warn!(cue = ?self.cue, "audio cue dropped before finishing");
                self.done = true;
            }
            Err(TryRecvError::Empty) => {
                if self.waited >= self.timeout {
                    warn!(cue = ?self.cue, waited = self.waited, "audio cue timed out");
                    self.done = true;
                }
            }
        }

        if self.done {
            self.completion = None;
        }
        self.done
    }
}

pub struct AudioDirector {
    sink: Box<dyn AudioSink>,
    muted: bool,
    released: bool,
    cue_timeout: f32,
    chomp: Option<CueCompletion>,
}

impl AudioDirector {
    pub fn new(sink: Box<dyn AudioSink>, muted: bool, cue_timeout: f32) -> Self {
        Self {
            sink,
            muted,
            released: false,
            cue_timeout,
            chomp: None,
        }
    }

    pub fn play(&mut self, cue: AudioCue) {
        let _ = self.request(cue);
    }

    pub fn play_awaited(&mut self, cue: AudioCue) -> PendingCue {
        let completion = self.request(cue);
        PendingCue::new(cue, completion, self.cue_timeout)
    }

    fn request(&mut self, cue: AudioCue) -> Option<CueCompletion> {
        if self.muted || self.released {
            return None;
        }
        if cue == AudioCue::Chomp && self.chomp_sounding() {
            return None;
        }

        match self.sink.play(cue) {
            Ok(completion) if cue == AudioCue::Chomp => {
                self.chomp = Some(completion);
                None
            }
            Ok(completion) => Some(completion),
            Err(err) => {
                warn!(cue = ?cue, error = %err, "audio playback failed");
                None
            }
        }
    }

    fn chomp_sounding(&mut self) -> bool {
        let Some(completion) = self.chomp.as_mut() else {
            return false;
        };
        if matches!(completion.try_recv(), Err(TryRecvError::Empty)) {
            return true;
        }
        self.chomp = None;
        false
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn pause(&mut self) {
        if !self.released {
            self.sink.pause();
        }
    }

    pub fn resume(&mut self) {
        if !self.released {
            self.sink.resume();
        }
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.chomp = None;
        self.sink.release();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: AudioCue) -> Result<CueCompletion, AudioError> {
        Ok(completed())
    }
}

#[derive(Debug, Default)]
struct ScriptedState {
    played: Vec<AudioCue>,
    held: HashSet<AudioCue>,
    failing: HashSet<AudioCue>,
    rejecting: HashSet<AudioCue>,
    waiting: HashMap<AudioCue, Vec<oneshot::Sender<Result<(), AudioError>>>>,
    pauses: u32,
    resumes: u32,
    releases: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ScriptedAudio {
    state: Rc<RefCell<ScriptedState>>,
}

impl ScriptedAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&self, cue: AudioCue) {
        self.state.borrow_mut().held.insert(cue);
    }

    pub fn fail(&self, cue: AudioCue) {
        self.state.borrow_mut().failing.insert(cue);
    }

    pub fn reject(&self, cue: AudioCue) {
        self.state.borrow_mut().rejecting.insert(cue);
    }

    pub fn finish(&self, cue: AudioCue) {
        let mut state = self.state.borrow_mut();
        state.held.remove(&cue);
        for sender in state.waiting.remove(&cue).unwrap_or_default() {
            let _ = sender.send(Ok(()));
        }
    }

    pub fn played(&self) -> Vec<AudioCue> {
        self.state.borrow().played.clone()
    }

    pub fn play_count(&self, cue: AudioCue) -> usize {
        self.state
            .borrow()
            .played
            .iter()
            .filter(|played| **played == cue)
            .count()
    }

    pub fn pause_count(&self) -> u32 {
        self.state.borrow().pauses
    }

    pub fn resume_count(&self) -> u32 {
        self.state.borrow().resumes
    }

    pub fn release_count(&self) -> u32 {
        self.state.borrow().releases
    }
}

impl AudioSink for ScriptedAudio {
    fn play(&mut self, cue: AudioCue) -> Result<CueCompletion, AudioError> {
        let mut state = self.state.borrow_mut();
        if state.failing.contains(&cue) {
            return Err(AudioError::Rejected(format!("{cue:?} blocked")));
        }
        state.played.push(cue);

        let (tx, rx) = oneshot::channel();
        if state.rejecting.contains(&cue) {
            let _ = tx.send(Err(AudioError::Unavailable));
        } else if state.held.contains(&cue) {
            state.waiting.entry(cue).or_default().push(tx);
        } else {
            let _ = tx.send(Ok(()));
        }
        Ok(rx)
    }

    fn pause(&mut self) {
        self.state.borrow_mut().pauses += 1;
    }

    fn resume(&mut self) {
        self.state.borrow_mut().resumes += 1;
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        state.releases += 1;
        state.waiting.clear();
    }
}
