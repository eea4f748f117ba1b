// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::responder::MoveRange;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_PATH: &str = "data/tsume.json";
pub const DEFAULT_API_BASE: &str = "https://api.line.me";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// JSON file holding the puzzle catalog.
    pub data_path: PathBuf,
    move_range: MoveRange,
    /// Secret used to verify webhook signatures.
    pub channel_secret: String,
    /// Bearer token for the messaging API.
    pub channel_access_token: String,
    /// Base URL of the messaging API.
    pub api_base: String,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 5000)
    /// - `TSUME_DATA_PATH` - puzzle data file (default: `data/tsume.json`)
    /// - `TSUME_MIN_MOVES` / `TSUME_MAX_MOVES` - inclusive move range (default: 7 to 19)
    /// - `LINE_CHANNEL_SECRET` - webhook signing secret (required)
    /// - `LINE_CHANNEL_ACCESS_TOKEN` - messaging API token (required)
    /// - `LINE_API_BASE` - messaging API base URL (default: `https://api.line.me`)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--data <PATH>` - Override the data file
    pub fn load() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_lookup(&args, |name| std::env::var(name).ok())
    }

    /// Move counts users may request.
    pub fn move_range(&self) -> MoveRange {
        self.move_range
    }

    /// Build a config from CLI args and an environment lookup function.
    pub fn from_lookup<F>(args: &[String], env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Port: CLI flag --port takes precedence, then env var, then default
        let port = match Self::parse_cli_value(args, "--port").or_else(|| env("PORT")) {
            Some(v) => parse_value("PORT", &v)?,
            None => DEFAULT_PORT,
        };

        let data_path = Self::parse_cli_value(args, "--data")
            .or_else(|| env("TSUME_DATA_PATH"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let defaults = MoveRange::default();
        let min = match env("TSUME_MIN_MOVES") {
            Some(v) => parse_value("TSUME_MIN_MOVES", &v)?,
            None => defaults.min(),
        };
        let max = match env("TSUME_MAX_MOVES") {
            Some(v) => parse_value("TSUME_MAX_MOVES", &v)?,
            None => defaults.max(),
        };
        let move_range = MoveRange::new(min, max)?;

        let channel_secret =
            env("LINE_CHANNEL_SECRET").ok_or(ConfigError::Missing("LINE_CHANNEL_SECRET"))?;
        let channel_access_token = env("LINE_CHANNEL_ACCESS_TOKEN")
            .ok_or(ConfigError::Missing("LINE_CHANNEL_ACCESS_TOKEN"))?;
        let api_base = env("LINE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Config {
            port,
            data_path,
            move_range,
            channel_secret,
            channel_access_token,
            api_base,
        })
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
