//! Server configuration.
//!
//! Loaded from an optional TOML file (`--config <path>`); every section
//! falls back to defaults so a bare binary just runs.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetSection {
    pub bind_addr: String,
}

impl Default for NetSection {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoomSection {
    /// Seats per room
    pub max_players: usize,
    /// Idle age after which an unoccupied room is evicted
    pub idle_timeout_secs: u64,
    /// How often the eviction sweep runs
    pub sweep_interval_secs: u64,
}

impl Default for RoomSection {
    fn default() -> Self {
        Self {
            max_players: 6,
            idle_timeout_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub net: NetSection,
    pub room: RoomSection,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path.
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }
}

/// Parse CLI arguments and load config.
/// Supports: --config <path>
pub fn parse_cli_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(val) = args.get(i + 1) {
                    config_path = Some(val.as_str());
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    match ServerConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}
