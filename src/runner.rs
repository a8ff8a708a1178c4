//! Frame driver
//!
//! Owns the game state and the input inbox, converts variable frame times
//! into fixed simulation ticks, and talks to the outside world only through
//! the [`Renderer`] and [`AudioSink`] traits.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::sim::{AudioCue, Command, GameEvent, GamePhase, GameState, TickInput, tick};

/// Draws the current state. Called once per frame in every phase.
pub trait Renderer {
    fn render(&mut self, state: &GameState, time: f64);

    /// Surface size changed
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Plays named sound cues; fire and forget
pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);

    /// Background loop on or off. Follows the Playing phase.
    fn music(&mut self, _playing: bool) {}
}

/// Renderer for headless runs
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl Renderer for NullRenderer {
    fn render(&mut self, _state: &GameState, _time: f64) {
        self.frames += 1;
    }
}

/// Audio sink that only logs
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, cue: AudioCue) {
        log::debug!("cue: {}", cue.name());
    }
}

pub struct Runner<R, A> {
    pub state: GameState,
    input: TickInput,
    accumulator: f32,
    renderer: R,
    audio: A,
}

impl<R: Renderer, A: AudioSink> Runner<R, A> {
    pub fn new(state: GameState, renderer: R, audio: A) -> Self {
        Self {
            state,
            input: TickInput::default(),
            accumulator: 0.0,
            renderer,
            audio,
        }
    }

    /// Queue a command for the next tick
    pub fn push(&mut self, command: Command) {
        self.input.push(command);
    }

    /// Queue a command with the seed for the run it may start
    pub fn push_with_seed(&mut self, command: Command, seed: u64) {
        self.input.push(command);
        self.input.seed = Some(seed);
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.input.autopilot = on;
    }

    pub fn autopilot(&self) -> bool {
        self.input.autopilot
    }

    /// Run one animation frame: simulate, forward audio cues, render.
    /// Returns the events produced this frame.
    pub fn frame(&mut self, dt: f32, time: f64) -> Vec<GameEvent> {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input);
            // Commands apply to the first tick only
            self.input.clear_commands();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        let events = self.state.drain_events();
        for event in &events {
            if let GameEvent::PhaseChanged { to, .. } = event {
                self.audio.music(*to == GamePhase::Playing);
            }
            if let Some(cue) = event.cue() {
                self.audio.play(cue);
            }
        }

        self.renderer.render(&self.state, time);
        events
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        log::info!("Resize to {}x{}", width, height);
        self.renderer.resize(width, height);
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[derive(Default)]
    struct Recorder {
        cues: Vec<AudioCue>,
        music: Vec<bool>,
    }

    impl AudioSink for Recorder {
        fn play(&mut self, cue: AudioCue) {
            self.cues.push(cue);
        }

        fn music(&mut self, playing: bool) {
            self.music.push(playing);
        }
    }

    fn runner() -> Runner<NullRenderer, Recorder> {
        let state = GameState::with_tuning(3, Tuning::calm());
        Runner::new(state, NullRenderer::default(), Recorder::default())
    }

    #[test]
    fn test_renders_every_frame_in_every_phase() {
        let mut r = runner();
        r.frame(SIM_DT, 0.0);
        assert_eq!(r.state.session.phase, GamePhase::Menu);
        r.push(Command::Start);
        r.frame(SIM_DT, 16.0);
        r.push(Command::Pause);
        r.frame(SIM_DT, 32.0);
        assert_eq!(r.state.session.phase, GamePhase::Paused);
        r.frame(SIM_DT, 48.0);
        assert_eq!(r.renderer().frames, 4);
    }

    #[test]
    fn test_one_tick_per_frame_at_sim_rate() {
        let mut r = runner();
        r.push(Command::Start);
        r.frame(SIM_DT, 0.0);
        for i in 0..100 {
            r.frame(SIM_DT, i as f64);
        }
        // Accumulator rounding can leave one tick pending
        assert!((99..=100).contains(&r.state.time_ticks));
    }

    #[test]
    fn test_long_frames_are_capped() {
        let mut r = runner();
        r.push(Command::Start);
        r.frame(SIM_DT, 0.0);
        let before = r.state.time_ticks;
        r.frame(5.0, 1.0);
        assert!(r.state.time_ticks - before <= MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_commands_wait_for_a_tick() {
        let mut r = runner();
        r.push(Command::Start);
        // Not enough time for a tick yet
        r.frame(SIM_DT / 4.0, 0.0);
        assert_eq!(r.state.session.phase, GamePhase::Menu);
        r.frame(SIM_DT, 1.0);
        assert_eq!(r.state.session.phase, GamePhase::Playing);
    }

    #[test]
    fn test_jump_cue_reaches_audio() {
        let mut r = runner();
        r.push(Command::Start);
        r.frame(SIM_DT, 0.0);
        r.push(Command::Jump);
        let events = r.frame(SIM_DT * 1.01, 1.0);
        assert!(events.contains(&GameEvent::Jump));
        assert_eq!(r.audio_mut().cues, vec![AudioCue::Jump]);
    }

    #[test]
    fn test_seeded_restart() {
        let mut r = runner();
        r.push_with_seed(Command::Start, 4242);
        r.frame(SIM_DT, 0.0);
        assert_eq!(r.state.seed, 4242);
    }

    #[test]
    fn test_music_follows_playing_phase() {
        let mut r = runner();
        r.frame(SIM_DT, 0.0);
        assert!(r.audio_mut().music.is_empty());

        r.push(Command::Start);
        r.frame(SIM_DT, 1.0);
        r.push(Command::Pause);
        r.frame(SIM_DT, 2.0);
        r.push(Command::Resume);
        r.frame(SIM_DT, 3.0);
        r.push(Command::Pause);
        r.frame(SIM_DT, 4.0);
        r.push(Command::Menu);
        r.frame(SIM_DT, 5.0);
        assert_eq!(r.audio_mut().music, vec![true, false, true, false, false]);
    }
}
