//! Top-level screen state machine
//!
//! [`Game`] owns the session, the user settings and the collaborators. Each
//! call to [`Game::step`] is one 60 Hz frame: it runs the current screen's
//! logic (gameplay only while [`Screen::Playing`]), then hands the session to
//! the renderer.
//!
//! ```text
//! Splash -> TitleScreen -> OpeningVideo -> MainMenu -> SelectDifficulty -> Playing <-> Paused
//! Playing -> GameOver | Victory | EnterName
//! GameOver | Victory -> ShowRanking | Records
//! EnterName -> ShowRanking
//! ShowRanking | Records -> EndingVideo (campaign won) | MainMenu
//! EndingVideo -> FimScreen -> Credits -> MainMenu
//! ```

use serde::{Deserialize, Serialize};

use crate::audio::{AudioService, Cinematic, HeadlessAudio, SoundEffect};
use crate::config::GameConfig;
use crate::difficulty::Difficulty;
use crate::persistence::{MemoryStore, Persistence};
use crate::rankings::{RankingStore, Rankings};
use crate::render::{NullRenderer, Renderer};
use crate::settings::Settings;
use crate::sim::tick::autosave;
use crate::sim::{tick, GameSession, LevelGenerator, PlayOutcome, StandardLevelGenerator, TickContext, TickInput};

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    Splash,
    TitleScreen,
    OpeningVideo,
    MainMenu,
    SelectDifficulty,
    Playing,
    Paused,
    GameOver,
    Victory,
    EnterName,
    ShowRanking,
    Records,
    EndingVideo,
    FimScreen,
    Credits,
}

impl Screen {
    /// Screens during which per-level entities exist
    pub fn holds_level(self) -> bool {
        matches!(self, Screen::Playing | Screen::Paused)
    }
}

/// Main menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Continue,
    NewGame,
    Records,
    Credits,
}

/// Collaborators the state machine drives
pub struct Services {
    pub audio: Box<dyn AudioService>,
    pub renderer: Box<dyn Renderer>,
    pub rankings: Box<dyn RankingStore>,
    pub levels: Box<dyn LevelGenerator>,
    pub storage: Box<dyn Persistence>,
}

impl Services {
    /// Silent, in-memory collaborators with the standard level generator
    pub fn headless(seed: u64) -> Self {
        Self {
            audio: Box::new(HeadlessAudio::new()),
            renderer: Box::new(NullRenderer),
            rankings: Box::new(Rankings::new()),
            levels: Box::new(StandardLevelGenerator::new(seed)),
            storage: Box::new(MemoryStore::default()),
        }
    }
}

/// The running game
pub struct Game {
    pub session: GameSession,
    pub services: Services,
    pub settings: Settings,
    config: GameConfig,
    /// Frames spent on the current screen
    screen_ticks: u32,
    menu_cursor: usize,
    difficulty_choice: Difficulty,
    /// Campaign won: the result screens lead into the ending chain
    ending_pending: bool,
    /// Rank of the last name entered, for highlighting
    last_rank: Option<usize>,
}

impl Game {
    pub fn new(config: GameConfig, mut services: Services) -> Self {
        let settings = match services.storage.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings {
                difficulty: config.difficulty,
                ..Settings::default()
            },
            Err(err) => {
                log::warn!("Settings unreadable, using defaults: {}", err);
                Settings {
                    difficulty: config.difficulty,
                    ..Settings::default()
                }
            }
        };
        services.audio.apply_settings(&settings);

        let session = GameSession::new(&config);
        log::info!(
            "Game ready (seed {}, start level {}, {} rankings)",
            config.seed,
            config.start_level,
            services.rankings.get_rankings().len()
        );
        Self {
            session,
            services,
            difficulty_choice: settings.difficulty,
            settings,
            config,
            screen_ticks: 0,
            menu_cursor: 0,
            ending_pending: false,
            last_rank: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.session.screen
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn screen_ticks(&self) -> u32 {
        self.screen_ticks
    }

    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn difficulty_choice(&self) -> Difficulty {
        self.difficulty_choice
    }

    /// Entries currently offered by the main menu
    pub fn menu_items(&self) -> Vec<MenuItem> {
        let mut items = Vec::with_capacity(4);
        if self.services.storage.has_progress() {
            items.push(MenuItem::Continue);
        }
        items.extend([MenuItem::NewGame, MenuItem::Records, MenuItem::Credits]);
        items
    }

    pub fn selected_item(&self) -> MenuItem {
        let items = self.menu_items();
        items[self.menu_cursor.min(items.len() - 1)]
    }

    /// Advance one frame
    pub fn step(&mut self, input: &TickInput) {
        self.screen_ticks = self.screen_ticks.saturating_add(1);

        match self.session.screen {
            Screen::Splash => {
                if input.confirm || self.screen_ticks >= self.config.splash_frames {
                    self.set_screen(Screen::TitleScreen);
                }
            }
            Screen::TitleScreen => {
                if input.confirm {
                    if self.cinematics_enabled() {
                        self.set_screen(Screen::OpeningVideo);
                    } else {
                        self.set_screen(Screen::MainMenu);
                    }
                }
            }
            Screen::OpeningVideo => self.update_clip(input, Screen::MainMenu),
            Screen::MainMenu => self.update_main_menu(input),
            Screen::SelectDifficulty => self.update_select_difficulty(input),
            Screen::Playing => self.update_playing(input),
            Screen::Paused => {
                if input.pause || input.confirm {
                    self.services.audio.play_effect(SoundEffect::Pause);
                    self.set_screen(Screen::Playing);
                } else if input.back {
                    autosave(&self.session, self.services.storage.as_mut());
                    self.set_screen(Screen::MainMenu);
                }
            }
            Screen::GameOver | Screen::Victory => {
                self.tick_result_hold();
                if input.confirm {
                    self.set_screen(Screen::ShowRanking);
                } else if input.back {
                    self.set_screen(Screen::Records);
                }
            }
            Screen::EnterName => {
                self.tick_result_hold();
                if let Some(name) = &input.text {
                    self.submit_name(name);
                } else if input.confirm {
                    self.submit_name("");
                } else if input.back {
                    log::info!("Name entry skipped");
                    self.set_screen(Screen::ShowRanking);
                }
            }
            Screen::ShowRanking | Screen::Records => {
                self.tick_result_hold();
                if input.confirm || input.back {
                    if self.ending_pending {
                        self.set_screen(Screen::EndingVideo);
                    } else {
                        self.set_screen(Screen::MainMenu);
                    }
                }
            }
            Screen::EndingVideo => self.update_clip(input, Screen::FimScreen),
            Screen::FimScreen => {
                if input.confirm || self.screen_ticks >= self.config.fim_frames {
                    self.set_screen(Screen::Credits);
                }
            }
            Screen::Credits => {
                if input.confirm || input.back || self.screen_ticks >= self.config.credits_frames {
                    self.set_screen(Screen::MainMenu);
                }
            }
        }

        self.services.renderer.draw(self.session.screen, &self.session);
    }

    fn cinematics_enabled(&self) -> bool {
        self.settings.play_cinematics && !self.config.skip_cinematics
    }

    fn update_clip(&mut self, input: &TickInput, next: Screen) {
        if input.confirm || input.back {
            self.services.audio.stop_clip();
            self.set_screen(next);
        } else if self.services.audio.is_clip_finished() {
            self.set_screen(next);
        }
    }

    fn update_main_menu(&mut self, input: &TickInput) {
        let count = self.menu_items().len();
        self.menu_cursor = self.menu_cursor.min(count - 1);
        if input.move_right {
            self.menu_cursor = (self.menu_cursor + 1) % count;
            self.services.audio.play_effect(SoundEffect::MenuMove);
        } else if input.move_left {
            self.menu_cursor = (self.menu_cursor + count - 1) % count;
            self.services.audio.play_effect(SoundEffect::MenuMove);
        }
        if !input.confirm {
            return;
        }
        self.services.audio.play_effect(SoundEffect::MenuConfirm);
        match self.selected_item() {
            MenuItem::Continue => self.continue_saved_run(),
            MenuItem::NewGame => {
                self.difficulty_choice = self.settings.difficulty;
                self.set_screen(Screen::SelectDifficulty);
            }
            MenuItem::Records => self.set_screen(Screen::Records),
            MenuItem::Credits => self.set_screen(Screen::Credits),
        }
    }

    fn continue_saved_run(&mut self) {
        match self.services.storage.load_progress() {
            Ok(Some(snapshot)) => {
                let Services { audio, levels, .. } = &mut self.services;
                self.session.restore(&snapshot, levels.as_mut(), audio.as_mut());
                self.set_screen(Screen::Playing);
            }
            Ok(None) => log::warn!("Nothing to continue"),
            Err(err) => {
                log::warn!("Autosave unreadable, discarding: {}", err);
                if let Err(err) = self.services.storage.clear_progress() {
                    log::warn!("Could not clear autosave: {}", err);
                }
                self.menu_cursor = 0;
            }
        }
    }

    fn update_select_difficulty(&mut self, input: &TickInput) {
        if input.move_right {
            self.difficulty_choice = self.difficulty_choice.next();
            self.services.audio.play_effect(SoundEffect::MenuMove);
        } else if input.move_left {
            self.difficulty_choice = self.difficulty_choice.prev();
            self.services.audio.play_effect(SoundEffect::MenuMove);
        }
        if input.back {
            self.set_screen(Screen::MainMenu);
        } else if input.confirm {
            self.services.audio.play_effect(SoundEffect::MenuConfirm);
            self.settings.difficulty = self.difficulty_choice;
            if let Err(err) = self.services.storage.save_settings(&self.settings) {
                log::warn!("Could not save settings: {}", err);
            }
            let Services { audio, levels, .. } = &mut self.services;
            self.session.start_new_game(
                self.difficulty_choice,
                self.config.start_level,
                levels.as_mut(),
                audio.as_mut(),
            );
            self.ending_pending = false;
            self.last_rank = None;
            self.set_screen(Screen::Playing);
        }
    }

    fn update_playing(&mut self, input: &TickInput) {
        // Pause waits until a pending result or level advance is applied
        if input.pause && self.session.outcome.is_none() && !self.session.hold.freezes_gameplay() {
            self.services.audio.play_effect(SoundEffect::Pause);
            self.set_screen(Screen::Paused);
            return;
        }

        let Services {
            audio,
            rankings,
            levels,
            storage,
            ..
        } = &mut self.services;
        let mut ctx = TickContext {
            audio: audio.as_mut(),
            rankings: rankings.as_mut(),
            levels: levels.as_mut(),
            storage: storage.as_mut(),
        };
        tick(&mut self.session, input, &mut ctx);

        match self.session.take_outcome() {
            Some(PlayOutcome::GameOver { qualifies }) => {
                if let Err(err) = self.services.storage.clear_progress() {
                    log::warn!("Could not clear autosave: {}", err);
                }
                self.set_screen(if qualifies { Screen::EnterName } else { Screen::GameOver });
            }
            Some(PlayOutcome::CampaignComplete { qualifies }) => {
                self.ending_pending = true;
                self.set_screen(if qualifies { Screen::EnterName } else { Screen::Victory });
            }
            None => {}
        }
    }

    /// The game-over fade keeps running behind the result screens
    fn tick_result_hold(&mut self) {
        if self.session.hold.is_active() {
            self.session.hold.tick(self.services.audio.as_mut());
        }
    }

    fn submit_name(&mut self, name: &str) {
        let score = self.session.progression.score;
        self.last_rank =
            self.services
                .rankings
                .add_score(name, score, self.session.level, self.session.difficulty);
        match self.last_rank {
            Some(rank) => log::info!("Ranked #{} with {} points", rank, score),
            None => log::info!("{} points did not make the ranking", score),
        }
        self.set_screen(Screen::ShowRanking);
    }

    fn set_screen(&mut self, next: Screen) {
        let prev = self.session.screen;
        if prev == next {
            return;
        }
        log::info!("Screen {:?} -> {:?}", prev, next);

        if prev.holds_level() && !next.holds_level() {
            self.session.clear_level();
        }

        self.session.screen = next;
        self.screen_ticks = 0;

        match next {
            Screen::MainMenu => {
                self.session.hold.cancel(self.services.audio.as_mut());
                self.services.audio.play_menu_track();
                self.menu_cursor = 0;
            }
            Screen::OpeningVideo => self.start_clip(Cinematic::Opening, Screen::MainMenu),
            Screen::EndingVideo => {
                self.ending_pending = false;
                if self.cinematics_enabled() {
                    self.start_clip(Cinematic::Ending, Screen::FimScreen);
                } else {
                    self.set_screen(Screen::FimScreen);
                }
            }
            _ => {}
        }
    }

    /// Start a clip, or skip straight to `fallback` when it can't play
    fn start_clip(&mut self, clip: Cinematic, fallback: Screen) {
        self.services.audio.stop_music();
        if let Err(err) = self.services.audio.play_clip(clip) {
            log::warn!("Skipping {} cinematic: {}", clip.name(), err);
            self.set_screen(fallback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::error::MediaError;
    use crate::persistence::ProgressSnapshot;
    use crate::sim::{HoldAction, HoldKind};

    /// Headless audio that stays readable after being boxed into `Services`
    #[derive(Clone, Default)]
    struct SharedAudio(Rc<RefCell<HeadlessAudio>>);

    impl SharedAudio {
        fn count(&self, effect: SoundEffect) -> usize {
            self.0.borrow().count(effect)
        }
    }

    impl AudioService for SharedAudio {
        fn play_effect(&mut self, effect: SoundEffect) {
            self.0.borrow_mut().play_effect(effect);
        }
        fn effect_duration(&self, effect: SoundEffect) -> Option<f32> {
            self.0.borrow().effect_duration(effect)
        }
        fn play_level_track(&mut self, level: u32) {
            self.0.borrow_mut().play_level_track(level);
        }
        fn play_menu_track(&mut self) {
            self.0.borrow_mut().play_menu_track();
        }
        fn stop_music(&mut self) {
            self.0.borrow_mut().stop_music();
        }
        fn music_volume(&self) -> f32 {
            self.0.borrow().music_volume()
        }
        fn set_music_volume(&mut self, volume: f32) {
            self.0.borrow_mut().set_music_volume(volume);
        }
        fn play_clip(&mut self, clip: Cinematic) -> Result<(), MediaError> {
            self.0.borrow_mut().play_clip(clip)
        }
        fn is_clip_finished(&mut self) -> bool {
            self.0.borrow_mut().is_clip_finished()
        }
        fn stop_clip(&mut self) {
            self.0.borrow_mut().stop_clip();
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            splash_frames: 3,
            fim_frames: 2,
            credits_frames: 2,
            start_level: 4,
            ..GameConfig::default()
        }
    }

    fn game() -> Game {
        Game::new(config(), Services::headless(7))
    }

    fn game_with_audio(audio: HeadlessAudio) -> Game {
        Game::new(
            config(),
            Services {
                audio: Box::new(audio),
                ..Services::headless(7)
            },
        )
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn confirm() -> TickInput {
        TickInput {
            confirm: true,
            ..Default::default()
        }
    }

    fn back() -> TickInput {
        TickInput {
            back: true,
            ..Default::default()
        }
    }

    fn pause() -> TickInput {
        TickInput {
            pause: true,
            ..Default::default()
        }
    }

    fn right() -> TickInput {
        TickInput {
            move_right: true,
            ..Default::default()
        }
    }

    /// Drive from Splash into a running level
    fn to_playing(game: &mut Game) {
        game.step(&confirm()); // Splash -> Title
        game.step(&confirm()); // Title -> OpeningVideo
        game.step(&confirm()); // skip clip -> MainMenu
        assert_eq!(game.screen(), Screen::MainMenu);
        game.step(&confirm()); // New Game
        assert_eq!(game.screen(), Screen::SelectDifficulty);
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::Playing);
    }

    #[test]
    fn test_splash_times_out() {
        let mut game = game();
        assert_eq!(game.screen(), Screen::Splash);
        game.step(&idle());
        game.step(&idle());
        assert_eq!(game.screen(), Screen::Splash);
        game.step(&idle());
        assert_eq!(game.screen(), Screen::TitleScreen);
    }

    #[test]
    fn test_opening_clip_plays_to_the_end() {
        let mut audio = HeadlessAudio::new();
        audio.set_clip_length(2);
        let mut game = game_with_audio(audio);
        game.step(&confirm());
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::OpeningVideo);
        game.step(&idle());
        game.step(&idle());
        assert_eq!(game.screen(), Screen::OpeningVideo);
        game.step(&idle());
        assert_eq!(game.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_broken_opening_clip_degrades_to_menu() {
        let mut audio = HeadlessAudio::new();
        audio.mark_broken_clip(Cinematic::Opening);
        let mut game = game_with_audio(audio);
        game.step(&confirm());
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_skip_cinematics_config() {
        let mut game = Game::new(
            GameConfig {
                skip_cinematics: true,
                ..config()
            },
            Services::headless(7),
        );
        game.step(&confirm());
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_new_game_saves_difficulty_and_starts_level() {
        let mut game = game();
        game.step(&confirm());
        game.step(&confirm());
        game.step(&confirm());
        game.step(&confirm());
        game.step(&right()); // Normal -> Hard
        assert_eq!(game.difficulty_choice(), Difficulty::Hard);
        game.step(&confirm());

        assert_eq!(game.screen(), Screen::Playing);
        assert_eq!(game.session.level, 4);
        assert_eq!(game.session.difficulty, Difficulty::Hard);
        assert_eq!(game.session.progression.lives, 2);
        assert_eq!(game.settings.difficulty, Difficulty::Hard);
        let saved = game.services.storage.load_settings().unwrap();
        assert_eq!(saved.map(|s| s.difficulty), Some(Difficulty::Hard));
    }

    #[test]
    fn test_pause_freezes_and_resumes() {
        let mut game = game();
        to_playing(&mut game);
        game.step(&idle());
        game.step(&pause());
        assert_eq!(game.screen(), Screen::Paused);
        let ticks = game.session.time_ticks;
        for _ in 0..10 {
            game.step(&idle());
        }
        assert_eq!(game.session.time_ticks, ticks);
        game.step(&pause());
        assert_eq!(game.screen(), Screen::Playing);
        game.step(&idle());
        assert_eq!(game.session.time_ticks, ticks + 1);
    }

    #[test]
    fn test_pause_waits_for_level_advance() {
        let mut game = game();
        to_playing(&mut game);
        assert_eq!(game.session.level, 4);
        let Services { audio, .. } = &mut game.services;
        game.session
            .hold
            .start(HoldKind::LevelEnd, 10, HoldAction::AdvanceLevel, audio.as_mut());

        game.step(&pause());
        assert_eq!(game.screen(), Screen::Playing);
        for _ in 0..10 {
            game.step(&idle());
        }
        assert_eq!(game.session.level, 5);
        let saved = game.services.storage.load_progress().unwrap();
        assert_eq!(saved.map(|s| s.level), Some(5));

        // Quitting now resumes on the next level, never the finished one
        game.step(&pause());
        assert_eq!(game.screen(), Screen::Paused);
        game.step(&back());
        let saved = game.services.storage.load_progress().unwrap();
        assert_eq!(saved.map(|s| s.level), Some(5));
    }

    #[test]
    fn test_menu_and_pause_cues() {
        let audio = SharedAudio::default();
        let mut game = Game::new(
            config(),
            Services {
                audio: Box::new(audio.clone()),
                ..Services::headless(7)
            },
        );
        game.step(&confirm());
        game.step(&confirm());
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::MainMenu);
        assert_eq!(audio.count(SoundEffect::MenuConfirm), 0);

        game.step(&right());
        game.step(&TickInput {
            move_left: true,
            ..Default::default()
        });
        assert_eq!(audio.count(SoundEffect::MenuMove), 2);
        game.step(&confirm());
        game.step(&right());
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::Playing);
        assert_eq!(audio.count(SoundEffect::MenuMove), 3);
        assert_eq!(audio.count(SoundEffect::MenuConfirm), 2);

        game.step(&pause());
        game.step(&pause());
        assert_eq!(game.screen(), Screen::Playing);
        assert_eq!(audio.count(SoundEffect::Pause), 2);
    }

    #[test]
    fn test_game_over_fade_ends_on_ranking_screen() {
        let mut game = game();
        to_playing(&mut game);
        let volume = game.services.audio.music_volume();
        let Services { audio, .. } = &mut game.services;
        game.session
            .hold
            .start(HoldKind::GameOver, 5, HoldAction::None, audio.as_mut());
        game.session.outcome = Some(PlayOutcome::GameOver { qualifies: false });
        assert!(game.services.audio.music_volume() < volume);

        game.step(&idle());
        assert_eq!(game.screen(), Screen::GameOver);
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::ShowRanking);
        assert!(game.session.hold.is_active());
        for _ in 0..3 {
            game.step(&idle());
        }
        assert_eq!(game.screen(), Screen::ShowRanking);
        assert!(!game.session.hold.is_active());
        assert!((game.services.audio.music_volume() - volume).abs() < 1e-6);
    }

    #[test]
    fn test_quit_from_pause_saves_and_offers_continue() {
        let mut game = game();
        to_playing(&mut game);
        game.session.progression.score = 777;
        game.step(&pause());
        game.step(&back());
        assert_eq!(game.screen(), Screen::MainMenu);
        assert!(game.session.enemies.is_empty());
        assert_eq!(game.menu_items()[0], MenuItem::Continue);

        // Continue restores the saved run
        game.session.progression.score = 0;
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::Playing);
        assert_eq!(game.session.level, 4);
        assert_eq!(game.session.progression.score, 777);
    }

    #[test]
    fn test_menu_cursor_wraps() {
        let mut game = game();
        game.step(&confirm());
        game.step(&confirm());
        game.step(&confirm());
        assert_eq!(game.selected_item(), MenuItem::NewGame);
        game.step(&TickInput {
            move_left: true,
            ..Default::default()
        });
        assert_eq!(game.selected_item(), MenuItem::Credits);
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::Credits);
        game.step(&idle());
        game.step(&idle());
        assert_eq!(game.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_game_over_with_ranking_goes_to_name_entry() {
        let mut game = game();
        to_playing(&mut game);
        game.services
            .storage
            .save_progress(&game.session.snapshot())
            .unwrap();
        game.session.progression.score = 900;
        game.session.outcome = Some(PlayOutcome::GameOver { qualifies: true });
        game.step(&idle());

        assert_eq!(game.screen(), Screen::EnterName);
        assert!(!game.services.storage.has_progress());
        assert!(game.session.enemies.is_empty());

        game.step(&TickInput {
            text: Some("ana".to_string()),
            ..Default::default()
        });
        assert_eq!(game.screen(), Screen::ShowRanking);
        assert_eq!(game.last_rank(), Some(1));
        let top = &game.services.rankings.get_rankings()[0];
        assert_eq!((top.name.as_str(), top.score, top.level), ("ana", 900, 4));

        game.step(&confirm());
        assert_eq!(game.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_game_over_without_ranking() {
        let mut game = game();
        to_playing(&mut game);
        game.session.outcome = Some(PlayOutcome::GameOver { qualifies: false });
        game.step(&idle());
        assert_eq!(game.screen(), Screen::GameOver);
        game.step(&back());
        assert_eq!(game.screen(), Screen::Records);
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_campaign_win_runs_the_ending_chain() {
        let mut audio = HeadlessAudio::new();
        audio.set_clip_length(1);
        let mut game = game_with_audio(audio);
        to_playing(&mut game);
        game.session.outcome = Some(PlayOutcome::CampaignComplete { qualifies: false });
        game.step(&idle());
        assert_eq!(game.screen(), Screen::Victory);

        game.step(&confirm());
        assert_eq!(game.screen(), Screen::ShowRanking);
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::EndingVideo);
        game.step(&idle());
        assert_eq!(game.screen(), Screen::EndingVideo);
        game.step(&idle());
        assert_eq!(game.screen(), Screen::FimScreen);
        game.step(&idle());
        game.step(&idle());
        assert_eq!(game.screen(), Screen::Credits);
        game.step(&idle());
        game.step(&idle());
        assert_eq!(game.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_broken_ending_clip_degrades_to_fim_screen() {
        let mut audio = HeadlessAudio::new();
        audio.mark_broken_clip(Cinematic::Ending);
        let mut game = game_with_audio(audio);
        to_playing(&mut game);
        game.session.progression.score = 5_000;
        game.session.outcome = Some(PlayOutcome::CampaignComplete { qualifies: true });
        game.step(&idle());
        assert_eq!(game.screen(), Screen::EnterName);
        game.step(&back());
        assert_eq!(game.screen(), Screen::ShowRanking);
        assert!(game.services.rankings.get_rankings().is_empty());
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::FimScreen);
    }

    #[test]
    fn test_corrupt_autosave_is_discarded() {
        struct BrokenProgress(MemoryStore);
        impl Persistence for BrokenProgress {
            fn load_settings(&mut self) -> Result<Option<Settings>, crate::StorageError> {
                self.0.load_settings()
            }
            fn save_settings(&mut self, settings: &Settings) -> Result<(), crate::StorageError> {
                self.0.save_settings(settings)
            }
            fn load_progress(&mut self) -> Result<Option<ProgressSnapshot>, crate::StorageError> {
                let json = serde_json::from_str::<ProgressSnapshot>("{").unwrap_err();
                Err(crate::StorageError::Encode(json))
            }
            fn save_progress(&mut self, s: &ProgressSnapshot) -> Result<(), crate::StorageError> {
                self.0.save_progress(s)
            }
            fn clear_progress(&mut self) -> Result<(), crate::StorageError> {
                self.0.clear_progress()
            }
            fn has_progress(&self) -> bool {
                self.0.has_progress()
            }
        }

        let mut store = MemoryStore::default();
        let session = GameSession::new(&config());
        store.progress = Some(session.snapshot());
        let mut game = Game::new(
            config(),
            Services {
                storage: Box::new(BrokenProgress(store)),
                ..Services::headless(7)
            },
        );
        game.step(&confirm());
        game.step(&confirm());
        game.step(&confirm());
        assert_eq!(game.selected_item(), MenuItem::Continue);
        game.step(&confirm());
        assert_eq!(game.screen(), Screen::MainMenu);
        assert!(!game.services.storage.has_progress());
        assert_eq!(game.selected_item(), MenuItem::NewGame);
    }

    #[test]
    fn test_saved_settings_preselect_difficulty() {
        let mut store = MemoryStore::default();
        store.settings = Some(Settings {
            difficulty: Difficulty::Easy,
            ..Settings::default()
        });
        let game = Game::new(
            config(),
            Services {
                storage: Box::new(store),
                ..Services::headless(7)
            },
        );
        assert_eq!(game.difficulty_choice(), Difficulty::Easy);
    }
}
