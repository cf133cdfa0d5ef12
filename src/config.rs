use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked for in the current directory
pub(crate) const DEFAULT_CONFIG_FILE: &str = "staycal.toml";

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct Room {
    pub(crate) id: String,
    pub(crate) name: String,
    /// Whole pesos
    pub(crate) price_per_night: u64,
    pub(crate) capacity: u8,
    /// Dates held back from sale, used when no bookings file is configured
    #[serde(default)]
    pub(crate) blocked: Vec<String>,
}

impl Room {
    fn new(id: &str, name: &str, price_per_night: u64, capacity: u8) -> Room {
        Room {
            id: id.to_owned(),
            name: name.to_owned(),
            price_per_night,
            capacity,
            blocked: Vec::new(),
        }
    }
}

pub(crate) fn default_rooms() -> Vec<Room> {
    vec![
        Room::new("1", "Oceanus Room", 3000, 2),
        Room::new("2", "Athena Room", 4500, 4),
        Room::new("3", "Ouranus Room", 9000, 10),
        Room::new("4", "Apollo Room", 4500, 4),
        Room::new("5", "Cronus Room", 7500, 10),
    ]
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) downpayment_percent: u8,
    pub(crate) bookings: Option<PathBuf>,
    pub(crate) rooms: Vec<Room>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            downpayment_percent: 50,
            bookings: None,
            rooms: default_rooms(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    #[error("room catalog is empty")]
    NoRooms,
    #[error("room id {0:?} appears more than once")]
    DuplicateRoom(String),
    #[error("room {0:?} has no nightly price")]
    FreeRoom(String),
    #[error("room {0:?} has no capacity")]
    NoCapacity(String),
    #[error("downpayment_percent must be between 1 and 100, got {0}")]
    DownpaymentPercent(u8),
}

impl Config {
    pub(crate) fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Config::parse(&content)
    }

    pub(crate) fn parse(content: &str) -> Result<Config, ConfigError> {
        let config = toml::from_str::<Config>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` if given, otherwise `staycal.toml` in the current
    /// directory if it exists, otherwise the built-in defaults
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        Config::load_from(explicit, Path::new("."))
    }

    /// Like [`Config::load`], but looks for `staycal.toml` in `dir`
    pub(crate) fn load_from(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "loading config");
            return Config::from_file(path);
        }
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            tracing::info!(path = %path.display(), "loading config");
            Config::from_file(&path)
        } else {
            tracing::info!("no config file found, using defaults");
            Ok(Config::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.downpayment_percent) {
            return Err(ConfigError::DownpaymentPercent(self.downpayment_percent));
        }
        if self.rooms.is_empty() {
            return Err(ConfigError::NoRooms);
        }
        let mut seen = HashSet::new();
        for room in &self.rooms {
            if !seen.insert(room.id.as_str()) {
                return Err(ConfigError::DuplicateRoom(room.id.clone()));
            }
            if room.price_per_night == 0 {
                return Err(ConfigError::FreeRoom(room.id.clone()));
            }
            if room.capacity == 0 {
                return Err(ConfigError::NoCapacity(room.id.clone()));
            }
        }
        Ok(())
    }

    /// Position of the room with the given id in the catalog
    pub(crate) fn room_index(&self, id: &str) -> Option<usize> {
        self.rooms.iter().position(|r| r.id == id)
    }
}
