//! Engine configuration resource.
//!
//! Settings loaded from an INI configuration file. Defaults are safe for
//! startup; missing keys keep them.
//!
//! # Configuration File Format
//!
//! ```ini
//! [engine]
//! movement_mode = tile
//! halt_on_script_error = false
//! verbosity = normal
//!
//! [window]
//! width = 640
//! height = 480
//!
//! [world]
//! data_path = ./data
//! start_area = grove01
//! start_x = 0
//! start_y = 0
//! start_z = 0.0
//! player_speed = 1.0
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{LevelFilter, info};

use crate::coords::VICoord;
use crate::error::ConfigError;

const DEFAULT_WINDOW_WIDTH: u32 = 640;
const DEFAULT_WINDOW_HEIGHT: u32 = 480;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_DATA_PATH: &str = "./data";
const DEFAULT_PLAYER_SPEED: f64 = 1.0;

/// Movement timing discipline shared by every entity of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementMode {
    /// Moves are atomic and resolved inside the input call.
    Turn,
    /// Entities glide from tile to tile over time.
    #[default]
    Tile,
    /// Free-form gliding with no grid semantics.
    NoTile,
}

impl FromStr for MovementMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turn" => Ok(MovementMode::Turn),
            "tile" => Ok(MovementMode::Tile),
            "notile" => Ok(MovementMode::NoTile),
            _ => Err(ConfigError::InvalidValue {
                key: "engine.movement_mode".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MovementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MovementMode::Turn => "turn",
            MovementMode::Tile => "tile",
            MovementMode::NoTile => "notile",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Debug,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" => Ok(Verbosity::Quiet),
            "normal" => Ok(Verbosity::Normal),
            "debug" => Ok(Verbosity::Debug),
            _ => Err(ConfigError::InvalidValue {
                key: "engine.verbosity".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Debug => "debug",
        })
    }
}

/// Engine configuration resource.
///
/// Inserted into every area world so systems can read the movement
/// discipline and the script strictness setting.
#[derive(Resource, Debug, Clone)]
pub struct EngineConfig {
    pub movement_mode: MovementMode,
    /// Promote any script failure to a fatal error.
    pub halt_on_script_error: bool,
    pub verbosity: Verbosity,
    /// Viewport width in pixels.
    pub window_width: u32,
    /// Viewport height in pixels.
    pub window_height: u32,
    /// Directory holding area descriptors and scripts.
    pub data_path: PathBuf,
    pub start_area: String,
    pub start_coords: VICoord,
    /// Player base speed in tiles per second.
    pub player_speed: f64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            movement_mode: MovementMode::default(),
            halt_on_script_error: false,
            verbosity: Verbosity::default(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            start_area: String::new(),
            start_coords: VICoord::new(0, 0, 0.0),
            player_speed: DEFAULT_PLAYER_SPEED,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values. Values that are present but
    /// cannot be interpreted are an error.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(ConfigError::Load)?;
        self.apply(&config)?;

        info!(
            "Loaded config: mode={}, halt_on_script_error={}, {}x{} viewport, start '{}' at {}",
            self.movement_mode,
            self.halt_on_script_error,
            self.window_width,
            self.window_height,
            self.start_area,
            self.start_coords
        );
        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.read(text.to_string()).map_err(ConfigError::Load)?;
        self.apply(&config)
    }

    fn apply(&mut self, config: &Ini) -> Result<(), ConfigError> {
        // [engine] section
        if let Some(mode) = config.get("engine", "movement_mode") {
            self.movement_mode = mode.parse()?;
        }
        if let Some(halt) = get_bool(config, "engine", "halt_on_script_error")? {
            self.halt_on_script_error = halt;
        }
        if let Some(verbosity) = config.get("engine", "verbosity") {
            self.verbosity = verbosity.parse()?;
        }

        // [window] section
        if let Some(width) = get_uint(config, "window", "width")? {
            self.window_width = width as u32;
        }
        if let Some(height) = get_uint(config, "window", "height")? {
            self.window_height = height as u32;
        }

        // [world] section
        if let Some(path) = config.get("world", "data_path") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(area) = config.get("world", "start_area") {
            self.start_area = area;
        }
        if let Some(x) = get_int(config, "world", "start_x")? {
            self.start_coords.x = x as i32;
        }
        if let Some(y) = get_int(config, "world", "start_y")? {
            self.start_coords.y = y as i32;
        }
        if let Some(z) = get_float(config, "world", "start_z")? {
            self.start_coords.z = z;
        }
        if let Some(speed) = get_float(config, "world", "player_speed")? {
            self.player_speed = speed;
        }
        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        // [engine] section
        config.set("engine", "movement_mode", Some(self.movement_mode.to_string()));
        config.set(
            "engine",
            "halt_on_script_error",
            Some(self.halt_on_script_error.to_string()),
        );
        config.set("engine", "verbosity", Some(self.verbosity.to_string()));

        // [window] section
        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));

        // [world] section
        config.set("world", "data_path", Some(self.data_path.display().to_string()));
        config.set("world", "start_area", Some(self.start_area.clone()));
        config.set("world", "start_x", Some(self.start_coords.x.to_string()));
        config.set("world", "start_y", Some(self.start_coords.y.to_string()));
        config.set("world", "start_z", Some(self.start_coords.z.to_string()));
        config.set("world", "player_speed", Some(self.player_speed.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| ConfigError::Save(e.to_string()))?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }

    /// Viewport size in pixels.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

fn invalid(section: &str, key: &str, config: &Ini) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{section}.{key}"),
        value: config.get(section, key).unwrap_or_default(),
    }
}

fn get_bool(config: &Ini, section: &str, key: &str) -> Result<Option<bool>, ConfigError> {
    config
        .getbool(section, key)
        .map_err(|_| invalid(section, key, config))
}

fn get_uint(config: &Ini, section: &str, key: &str) -> Result<Option<u64>, ConfigError> {
    config
        .getuint(section, key)
        .map_err(|_| invalid(section, key, config))
}

fn get_int(config: &Ini, section: &str, key: &str) -> Result<Option<i64>, ConfigError> {
    config
        .getint(section, key)
        .map_err(|_| invalid(section, key, config))
}

fn get_float(config: &Ini, section: &str, key: &str) -> Result<Option<f64>, ConfigError> {
    config
        .getfloat(section, key)
        .map_err(|_| invalid(section, key, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let mut cfg = EngineConfig::new();
        cfg.load_from_str("[engine]\nmovement_mode = TURN\n").unwrap();
        assert_eq!(cfg.movement_mode, MovementMode::Turn);
        assert!(!cfg.halt_on_script_error);
        assert_eq!(cfg.window_size(), (640, 480));
    }

    #[test]
    fn world_section_sets_start_point() {
        let mut cfg = EngineConfig::new();
        cfg.load_from_str(
            "[world]\nstart_area = grove01\nstart_x = 3\nstart_y = -2\nstart_z = 1.5\nplayer_speed = 2.5\n",
        )
        .unwrap();
        assert_eq!(cfg.start_area, "grove01");
        assert_eq!(cfg.start_coords, VICoord::new(3, -2, 1.5));
        assert_eq!(cfg.player_speed, 2.5);
    }

    #[test]
    fn bad_values_are_reported() {
        let mut cfg = EngineConfig::new();
        let err = cfg
            .load_from_str("[engine]\nmovement_mode = sideways\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = cfg.load_from_str("[window]\nwidth = wide\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "window.width"));
    }

    #[test]
    fn verbosity_maps_to_level_filters() {
        assert_eq!(Verbosity::Quiet.level_filter(), LevelFilter::Error);
        assert_eq!("DEBUG".parse::<Verbosity>().unwrap(), Verbosity::Debug);
    }
}
