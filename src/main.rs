//! Tilewalk headless runner.
//!
//! Loads the configured start area from JSON descriptors, optionally walks the
//! player along a path, runs the simulation for a number of ticks and logs
//! where the player ended up.
//!
//! # Running
//!
//! ```sh
//! cargo run -- --config tilewalk.ini --data ./data --walk ddrru --ticks 120
//! ```

use std::path::PathBuf;

use clap::Parser;
use log::{debug, error, info, warn};

use tilewalk::components::animation::ImageKey;
use tilewalk::coords::IVec2;
use tilewalk::descriptor::JsonAreaLoader;
use tilewalk::game::Game;
use tilewalk::resources::engineconfig::{EngineConfig, MovementMode};
use tilewalk::systems::movement;
use tilewalk::systems::redraw::Renderer;

/// Upper bound on ticks spent finishing one step of `--walk`.
const MAX_TICKS_PER_STEP: u32 = 1000;

#[derive(Parser)]
#[command(version, about = "Headless runner for the tilewalk map engine")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "tilewalk.ini")]
    config: PathBuf,

    /// Directory holding area descriptors. Overrides the config.
    #[arg(long, value_name = "DIR")]
    data: Option<PathBuf>,

    /// Start area. Overrides the config.
    #[arg(long)]
    area: Option<String>,

    /// Ticks to run after the walk.
    #[arg(long, default_value_t = 60)]
    ticks: u32,

    /// Milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Steps for the player, one letter each: u, d, l, r.
    #[arg(long, default_value = "")]
    walk: String,
}

/// Renderer that only counts what it is asked to draw.
#[derive(Default)]
struct CountingRenderer {
    images: usize,
}

impl Renderer for CountingRenderer {
    fn draw_image(&mut self, _image: &ImageKey, _x: f64, _y: f64, _z: f64) {
        self.images += 1;
    }
}

fn parse_walk(walk: &str) -> Vec<IVec2> {
    walk.chars()
        .filter_map(|c| match c.to_ascii_lowercase() {
            'u' => Some(IVec2::UP),
            'd' => Some(IVec2::DOWN),
            'l' => Some(IVec2::LEFT),
            'r' => Some(IVec2::RIGHT),
            other => {
                warn!("ignoring walk step '{}'", other);
                None
            }
        })
        .collect()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EngineConfig::with_path(&cli.config);
    match config.load_from_file() {
        Ok(()) => info!("loaded config from {}", cli.config.display()),
        Err(e) => warn!("{}; using defaults", e),
    }
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(config.verbosity.level_filter());
    }
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(area) = cli.area {
        config.start_area = area;
    }

    let loader = JsonAreaLoader::new(&config.data_path);
    let player = match loader.load_player(&config) {
        Ok(player) => player,
        Err(e) => {
            error!("could not load the player: {}", e);
            std::process::exit(1);
        }
    };
    let mut game = match Game::new(config, loader, player) {
        Ok(game) => game,
        Err(e) => {
            error!("could not start: {}", e);
            std::process::exit(1);
        }
    };

    let mut renderer = CountingRenderer::default();
    let mode = game.config().movement_mode;
    let tick_ms = cli.tick_ms;

    for dir in parse_walk(&cli.walk) {
        if !game.press(dir) {
            info!("step {} blocked", dir.direction_name());
        }
        if mode != MovementMode::Turn {
            game.release(dir);
            let mut spent = 0;
            while spent < MAX_TICKS_PER_STEP
                && movement::is_moving(game.area().world(), game.player())
            {
                game.tick(tick_ms);
                spent += 1;
            }
        }
        if game.needs_redraw() {
            game.draw(&mut renderer);
        }
    }

    for _ in 0..cli.ticks {
        if mode == MovementMode::Turn {
            game.turn();
        } else {
            game.tick(tick_ms);
        }
        if game.needs_redraw() {
            game.draw(&mut renderer);
        }
        for sound in game.drain_sounds() {
            debug!("sound: {}", sound);
        }
    }

    let position = movement::position_virt(game.area().world(), game.player());
    match position {
        Some(pos) => info!("player is in '{}' at {}", game.focus_name(), pos),
        None => warn!("player is gone from '{}'", game.focus_name()),
    }
    info!("{} images drawn", renderer.images);
}
