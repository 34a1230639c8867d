//! Sky Dash entry point
//!
//! Runs the game headless: silent audio, a log renderer and an autopilot
//! standing in for the player.
//!
//! Usage: `sky-dash [--ticks N] [--config PATH]`

use std::path::PathBuf;

use sky_dash::audio::HeadlessAudio;
use sky_dash::clock::FrameClock;
use sky_dash::consts::SIM_DT;
use sky_dash::persistence::JsonFileStore;
use sky_dash::rankings::FileRankingStore;
use sky_dash::render::LogRenderer;
use sky_dash::sim::{demo_input, StandardLevelGenerator, TickInput};
use sky_dash::{Game, GameConfig, Screen, Services};

const DEFAULT_TICKS: u64 = 60 * 60 * 5;
const RANKINGS_FILE: &str = "rankings.json";

struct Args {
    ticks: u64,
    config: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        ticks: DEFAULT_TICKS,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ticks" => match iter.next().and_then(|v| v.parse().ok()) {
                Some(ticks) => args.ticks = ticks,
                None => log::warn!("--ticks needs a number, using {}", args.ticks),
            },
            "--config" => args.config = iter.next().map(PathBuf::from),
            other => log::warn!("Ignoring unknown argument {:?}", other),
        }
    }
    args
}

/// Autopilot: play with the demo AI, press through menus every half second
fn autopilot(game: &Game) -> TickInput {
    let beat = game.screen_ticks() % 30 == 29;
    match game.screen() {
        Screen::Playing => demo_input(&game.session),
        Screen::EnterName if beat => TickInput {
            text: Some("AUTO".to_string()),
            ..Default::default()
        },
        // Splash, fim screen and credits run on their own timers
        Screen::Splash | Screen::FimScreen | Screen::Credits => TickInput::default(),
        _ => TickInput {
            confirm: beat,
            ..Default::default()
        },
    }
}

fn main() {
    env_logger::init();
    log::info!("Sky Dash (headless) starting...");

    let args = parse_args();
    let config = GameConfig::from_env(args.config.as_deref());

    let services = Services {
        audio: Box::new(HeadlessAudio::new()),
        renderer: Box::new(LogRenderer::default()),
        rankings: Box::new(FileRankingStore::open(config.data_dir.join(RANKINGS_FILE))),
        levels: Box::new(StandardLevelGenerator::new(config.seed)),
        storage: Box::new(JsonFileStore::new(&config.data_dir)),
    };
    let mut game = Game::new(config, services);

    let mut clock = FrameClock::new();
    let mut best_level = 0;
    while clock.total_ticks() < args.ticks {
        // Headless hosts have no vsync: feed exactly one tick of time
        for _ in 0..clock.advance(SIM_DT) {
            let input = autopilot(&game);
            game.step(&input);
            if game.screen().holds_level() {
                best_level = best_level.max(game.session.level);
            }
        }
    }

    log::info!(
        "Stopped after {} ticks on {:?}: level {} reached, score {}",
        clock.total_ticks(),
        game.screen(),
        best_level,
        game.session.progression.score
    );
    for (i, entry) in game.services.rankings.get_rankings().iter().enumerate() {
        log::info!(
            "#{:<2} {:<12} {:>8} L{:<2} {}",
            i + 1,
            entry.name,
            entry.score,
            entry.level,
            entry.difficulty.as_str()
        );
    }
}
