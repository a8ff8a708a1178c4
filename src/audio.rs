//! Audio cues using the Web Audio API
//!
//! Every cue is synthesized from a few oscillators, so there are no sound
//! files to fetch.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::runner::AudioSink;
use crate::settings::Settings;
use crate::sim::AudioCue;

/// Looping background drone: detuned low oscillators into one gain
struct Drone {
    oscs: Vec<OscillatorNode>,
    gain: GainNode,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    /// Whether the game wants the background loop (it stays silent while muted)
    music_wanted: bool,
    drone: Option<Drone>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            music_wanted: false,
            drone: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = Self::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);
        audio
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_background();
        } else if self.music_wanted {
            self.start_background();
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Start or stop the background loop
    pub fn set_music(&mut self, playing: bool) {
        self.music_wanted = playing;
        if playing && !self.muted {
            self.start_background();
        } else {
            self.stop_background();
        }
    }

    fn start_background(&mut self) {
        if self.drone.is_some() {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let vol = self.master_volume * 0.06;
        if vol <= 0.0 {
            return;
        }
        let Ok(gain) = ctx.create_gain() else { return };
        gain.gain().set_value(vol);
        if gain.connect_with_audio_node(&ctx.destination()).is_err() {
            return;
        }

        // Engine hum: a low fifth with a slight beat
        let mut oscs = Vec::new();
        for (freq, osc_type) in [
            (55.0, OscillatorType::Sawtooth),
            (82.8, OscillatorType::Triangle),
            (55.6, OscillatorType::Sine),
        ] {
            let Ok(osc) = ctx.create_oscillator() else { continue };
            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            if osc.connect_with_audio_node(&gain).is_ok() && osc.start().is_ok() {
                oscs.push(osc);
            }
        }
        log::debug!("Background loop started ({} voices)", oscs.len());
        self.drone = Some(Drone { oscs, gain });
    }

    fn stop_background(&mut self) {
        let Some(drone) = self.drone.take() else { return };
        let t = self.ctx.as_ref().map_or(0.0, |ctx| ctx.current_time());
        drone.gain.gain().set_value_at_time(drone.gain.gain().value(), t).ok();
        drone
            .gain
            .gain()
            .linear_ramp_to_value_at_time(0.0, t + 0.1)
            .ok();
        for osc in &drone.oscs {
            osc.stop_with_when(t + 0.12).ok();
        }
        log::debug!("Background loop stopped");
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a cue
    pub fn play_cue(&self, cue: AudioCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match cue {
            AudioCue::Jump => self.play_jump(ctx, vol),
            AudioCue::Crash => self.play_crash(ctx, vol),
            AudioCue::PowerUp => self.play_powerup(ctx, vol),
            AudioCue::Coin => self.play_coin(ctx, vol),
            AudioCue::LevelUp => self.play_level_up(ctx, vol),
            AudioCue::GameOver => self.play_game_over(ctx, vol),
            AudioCue::HighScore => self.play_high_score(ctx, vol),
        }
    }

    /// Create an oscillator routed through its own gain node
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Single note with an exponential fade, starting `delay` seconds from now
    fn blip(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
        level: f32,
        delay: f64,
        length: f64,
    ) {
        if let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) {
            let t = ctx.current_time() + delay;
            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + length * 0.8)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + length).ok();
        }
    }

    /// Jump - engine rev sweeping up
    fn play_jump(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.25)
            .ok();
        osc.frequency().set_value_at_time(180.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(520.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.3).ok();
    }

    /// Crash - grinding sawtooth over a bass thump
    fn play_crash(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 220.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.35, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.35)
                .ok();
            osc.frequency().set_value_at_time(220.0, t).ok();
            osc.frequency().set_value_at_time(90.0, t + 0.03).ok();
            osc.frequency().set_value_at_time(180.0, t + 0.06).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(40.0, t + 0.3)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.4).ok();
        }

        if let Some((osc, gain)) = self.create_osc(ctx, 70.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }
    }

    /// Power-up - quick rising arpeggio
    fn play_powerup(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [440.0, 554.0, 659.0, 880.0].iter().enumerate() {
            self.blip(ctx, *freq, OscillatorType::Square, vol * 0.15, i as f64 * 0.05, 0.12);
        }
    }

    /// Coin - two bright blips
    fn play_coin(&self, ctx: &AudioContext, vol: f32) {
        self.blip(ctx, 988.0, OscillatorType::Square, vol * 0.12, 0.0, 0.06);
        self.blip(ctx, 1319.0, OscillatorType::Square, vol * 0.12, 0.06, 0.15);
    }

    /// Level up - major triad
    fn play_level_up(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [523.0, 659.0, 784.0, 1047.0].iter().enumerate() {
            self.blip(ctx, *freq, OscillatorType::Triangle, vol * 0.25, i as f64 * 0.1, 0.25);
        }
    }

    /// Game over - sad descending
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            self.blip(ctx, *freq, OscillatorType::Sine, vol * 0.3, i as f64 * 0.2, 0.4);
        }
    }

    /// High score - celebratory
    fn play_high_score(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [500.0, 600.0, 700.0, 800.0, 1000.0].iter().enumerate() {
            self.blip(ctx, *freq, OscillatorType::Triangle, vol * 0.25, i as f64 * 0.08, 0.3);
        }
    }
}

impl AudioSink for AudioManager {
    fn play(&mut self, cue: AudioCue) {
        self.play_cue(cue);
    }

    fn music(&mut self, playing: bool) {
        self.set_music(playing);
    }
}
