//! Night Rider entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent};

    use night_rider::audio::AudioManager;
    use night_rider::consts::SIM_DT;
    use night_rider::sim::{Command, GameEvent, GamePhase, GameState};
    use night_rider::{HighScores, Renderer, Runner, Settings, Tuning};

    /// Writes the HUD into the page. The 3D scene is drawn by the host page.
    struct DomHud {
        document: Document,
        show_fps: bool,
        fps: u32,
    }

    impl DomHud {
        fn set_text(&self, selector: &str, text: &str) {
            if let Some(el) = self.document.query_selector(selector).ok().flatten() {
                if el.text_content().as_deref() != Some(text) {
                    el.set_text_content(Some(text));
                }
            }
        }

        fn set_class(&self, id: &str, class: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.set_attribute("class", class);
            }
        }
    }

    impl Renderer for DomHud {
        fn render(&mut self, state: &GameState, _time: f64) {
            let hud = state.snapshot();

            self.set_text("#hud-score .hud-value", &hud.score.to_string());
            self.set_text("#hud-high .hud-value", &hud.high_score.to_string());
            self.set_text("#hud-lives .hud-value", &hud.lives.to_string());
            self.set_text("#hud-level .hud-value", &hud.level.to_string());
            self.set_text("#hud-distance .hud-value", &format!("{:.0}m", hud.distance));
            self.set_text("#hud-speed .hud-value", &format!("{:.2}", hud.speed));

            // Combo only shows once it's actually a combo
            if hud.combo > 1 {
                self.set_class("hud-combo", "hud-item");
                self.set_text("#hud-combo .hud-value", &format!("x{}", hud.combo));
            } else {
                self.set_class("hud-combo", "hud-item hidden");
            }

            self.set_class(
                "hud-boost",
                if hud.boosted { "hud-item" } else { "hud-item hidden" },
            );
            self.set_class(
                "hud-shield",
                if hud.invincible { "hud-item" } else { "hud-item hidden" },
            );

            match hud.overlay {
                Some(text) => {
                    self.set_text("#overlay .overlay-text", text);
                    self.set_class("overlay", "");
                }
                None => self.set_class("overlay", "hidden"),
            }

            if self.show_fps {
                self.set_text("#hud-fps .hud-value", &self.fps.to_string());
            }
        }

        fn resize(&mut self, width: u32, height: u32) {
            if let Some(el) = self.document.get_element_by_id("canvas") {
                let _ = el.set_attribute("width", &width.to_string());
                let _ = el.set_attribute("height", &height.to_string());
            }
        }
    }

    /// Game instance holding all state
    struct Game {
        runner: Runner<DomHud, AudioManager>,
        settings: Settings,
        high_scores: HighScores,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
    }

    impl Game {
        fn new(document: Document, settings: Settings, high_scores: HighScores) -> Self {
            let mut tuning = Tuning::default();
            settings.apply_to(&mut tuning);
            log::info!("Quality preset: {}", settings.quality.as_str());

            let seed = js_sys::Date::now() as u64;
            let mut state = GameState::with_tuning(seed, tuning);
            state.session.high_score = high_scores.top_score().unwrap_or(0);
            log::info!("Game initialized with seed: {}", seed);

            let hud = DomHud {
                document,
                show_fps: settings.show_fps,
                fps: 0,
            };
            hud.set_class(
                "hud-fps",
                if hud.show_fps { "hud-item" } else { "hud-item hidden" },
            );
            Self {
                runner: Runner::new(state, hud, AudioManager::from_settings(&settings)),
                settings,
                high_scores,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
            }
        }

        fn phase(&self) -> GamePhase {
            self.runner.state.session.phase
        }

        /// Map a key to a command for the current phase
        fn handle_key(&mut self, key: &str) {
            let phase = self.phase();
            let seed = js_sys::Date::now() as u64;
            match key {
                " " => match phase {
                    GamePhase::Menu => self.runner.push_with_seed(Command::Start, seed),
                    GamePhase::GameOver => self.runner.push_with_seed(Command::Restart, seed),
                    _ => self.runner.push(Command::Jump),
                },
                "ArrowUp" | "w" | "W" => self.runner.push(Command::Jump),
                "ArrowLeft" | "a" | "A" => self.runner.push(Command::LaneLeft),
                "ArrowRight" | "d" | "D" => self.runner.push(Command::LaneRight),
                "Escape" | "p" | "P" => self.runner.push(Command::Pause),
                "Enter" | "r" | "R" => self.runner.push_with_seed(Command::Restart, seed),
                "m" | "M" => self.runner.push(Command::Menu),
                "i" | "I" => {
                    let on = !self.runner.autopilot();
                    self.runner.set_autopilot(on);
                    log::info!("Autopilot: {}", on);
                }
                "v" | "V" => {
                    let muted = !self.runner.audio_mut().is_muted();
                    self.runner.audio_mut().set_muted(muted);
                    self.settings.muted = muted;
                    self.settings.save();
                }
                "f" | "F" => {
                    let show = !self.settings.show_fps;
                    self.settings.show_fps = show;
                    let hud = self.runner.renderer_mut();
                    hud.show_fps = show;
                    hud.set_class("hud-fps", if show { "hud-item" } else { "hud-item hidden" });
                    self.settings.save();
                }
                _ => {}
            }
            // Any key counts as the gesture browsers want before playing audio
            self.runner.audio_mut().resume();
        }

        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;

            self.track_fps(time);

            for event in self.runner.frame(dt, time) {
                // Abandoned runs count toward the board just like crashes
                if let GameEvent::GameOver {
                    score,
                    level,
                    distance,
                    ..
                }
                | GameEvent::RunAbandoned {
                    score,
                    level,
                    distance,
                    ..
                } = event
                {
                    let rank = self
                        .high_scores
                        .add_score(score, level, distance, js_sys::Date::now());
                    if let Some(rank) = rank {
                        log::info!("Leaderboard rank #{}", rank);
                        self.high_scores.save();
                    }
                }
            }
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    let fps = (60000.0 / elapsed).round() as u32;
                    self.runner.renderer_mut().fps = fps;
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Night Rider starting...");

        let Some(window) = web_sys::window() else {
            web_sys::console::error_1(&"No window".into());
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let settings = Settings::load();
        let high_scores = HighScores::load();
        let pause_on_blur = settings.pause_on_blur;
        let game = Rc::new(RefCell::new(Game::new(
            document.clone(),
            settings,
            high_scores,
        )));

        // Size the canvas to the window once up front
        {
            let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            game.borrow_mut().runner.resize(width as u32, height as u32);
        }

        setup_input_handlers(game.clone());
        setup_resize(game.clone());
        if pause_on_blur {
            setup_auto_pause(game.clone());
        }

        request_animation_frame(game);

        log::info!("Night Rider running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let key = event.key();
            if matches!(key.as_str(), " " | "ArrowUp" | "ArrowLeft" | "ArrowRight") {
                // Keep the page from scrolling
                event.prevent_default();
            }
            game.borrow_mut().handle_key(&key);
        });
        let _ = window
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let win = window.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let width = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            let height = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            game.borrow_mut().runner.resize(width as u32, height as u32);
        });
        let _ = window
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.phase() == GamePhase::Playing {
                        g.runner.push(Command::Pause);
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.phase() == GamePhase::Playing {
                    g.runner.push(Command::Pause);
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window
                .add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Night Rider (native) starting...");
    log::info!("Native mode runs a headless autopilot ride - use `trunk serve` for the web version");

    let options = native::Options::from_args(std::env::args().skip(1));
    native::ride(&options);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use night_rider::consts::SIM_DT;
    use night_rider::runner::{LogAudio, NullRenderer};
    use night_rider::sim::{GameEvent, GamePhase, GameState};
    use night_rider::{QualityPreset, Runner, Settings, Tuning};

    /// Command line: `night-rider [--seed N] [--frames N] [--tuning FILE] [--quality low|medium|high]`
    #[derive(Debug)]
    pub struct Options {
        pub seed: u64,
        pub frames: u64,
        pub tuning: Tuning,
        pub settings: Settings,
    }

    impl Options {
        pub fn from_args(mut args: impl Iterator<Item = String>) -> Self {
            let mut options = Self {
                seed: 1,
                frames: 60 * 120,
                tuning: Tuning::default(),
                settings: Settings::default(),
            };
            while let Some(arg) = args.next() {
                let value = args.next();
                match (arg.as_str(), value) {
                    ("--seed", Some(v)) => match v.parse() {
                        Ok(seed) => options.seed = seed,
                        Err(e) => log::warn!("Bad --seed {:?}: {}", v, e),
                    },
                    ("--frames", Some(v)) => match v.parse() {
                        Ok(frames) => options.frames = frames,
                        Err(e) => log::warn!("Bad --frames {:?}: {}", v, e),
                    },
                    ("--tuning", Some(path)) => match std::fs::read_to_string(&path) {
                        Ok(json) => match Tuning::from_json(&json) {
                            Ok(tuning) => {
                                log::info!("Loaded tuning from {}", path);
                                options.tuning = tuning;
                            }
                            Err(e) => log::warn!("Bad tuning file {}: {}, using defaults", path, e),
                        },
                        Err(e) => log::warn!("Can't read {}: {}, using defaults", path, e),
                    },
                    ("--quality", Some(v)) => match QualityPreset::from_str(&v) {
                        Some(preset) => {
                            log::info!("Quality preset: {}", preset.as_str());
                            options.settings.apply_preset(preset);
                        }
                        None => log::warn!("Unknown quality {:?}", v),
                    },
                    (other, _) => log::warn!("Ignoring argument {:?}", other),
                }
            }
            options.settings.apply_to(&mut options.tuning);
            options
        }
    }

    /// Let the autopilot ride until it crashes out or the frame budget runs out
    pub fn ride(options: &Options) {
        let state = GameState::with_tuning(options.seed, options.tuning.clone());
        let mut runner = Runner::new(state, NullRenderer::default(), LogAudio);
        runner.set_autopilot(true);

        for frame in 0..options.frames {
            let events = runner.frame(SIM_DT, frame as f64 * SIM_DT as f64 * 1000.0);
            for event in &events {
                match event {
                    GameEvent::LevelUp { level } => log::info!("Frame {}: level {}", frame, level),
                    GameEvent::Crash { kind, lives } => {
                        log::info!("Frame {}: hit a {:?}, {} lives left", frame, kind, lives)
                    }
                    _ => {}
                }
            }
            if runner.state.session.phase == GamePhase::GameOver {
                break;
            }
        }

        let snapshot = runner.state.snapshot();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Couldn't serialize final state: {}", e),
        }
        log::info!(
            "Rendered {} frames, entity pool {:?}",
            runner.renderer().frames,
            runner.state.entity_pool_stats()
        );
    }
}
