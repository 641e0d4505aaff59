//! Bot configuration.
//!
//! Settings are resolved per key: command-line flag, then environment
//! variable (both handled by `clap`), then the config file, then the
//! built-in default.
//!
//! The config file is YAML when it ends in `.yaml` or `.yml`. Any other file
//! is read as `KEY=VALUE` lines using the environment variable names, so
//! older `config.txt` deployments keep working.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use trebek_game::application::engine::DEFAULT_SKIP_VOTE_THRESHOLD;
use trebek_game::application::quizmaster::{
    DEFAULT_CORRECT_POINTS, DEFAULT_HINT_COST, GameSettings,
};
use trebek_game::application::scheduler::Pacing;
use trebek_game::application::timeout::DEFAULT_QUESTION_TIMEOUT;

use crate::error::AppError;
use crate::irc::IrcEndpoint;

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "trebek.yaml";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable text.
    Text,
}

/// Command-line arguments. Every setting can also come from the environment.
#[derive(Debug, Default, Parser)]
#[command(name = "trebek")]
#[command(version, about = "IRC trivia bot")]
pub struct Cli {
    /// Path to the config file (YAML, or KEY=VALUE lines)
    #[arg(short = 'c', long = "config", env = "TREBEK_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Nick the bot registers with
    #[arg(long, env = "BOT_NAME")]
    pub bot_name: Option<String>,

    /// IRC server as host:port
    #[arg(long, env = "IRC_SERVER")]
    pub irc_server: Option<String>,

    /// TLS IRC server as host:port; preferred over --irc-server
    #[arg(long, env = "IRC_SERVER_TLS")]
    pub irc_server_tls: Option<String>,

    /// Channel to join and play in
    #[arg(long, env = "IRC_CHANNEL")]
    pub irc_channel: Option<String>,

    /// Question archive (.json array or .jsonl)
    #[arg(long, env = "QUESTIONS_PATH", value_name = "PATH")]
    pub questions_path: Option<PathBuf>,

    /// Scoreboard file
    #[arg(long, env = "SCOREBOARD_PATH", value_name = "PATH")]
    pub scoreboard_path: Option<PathBuf>,

    /// Votes needed to skip a question
    #[arg(long, env = "SKIP_VOTE_THRESHOLD")]
    pub skip_vote_threshold: Option<usize>,

    /// Seconds allowed to answer a question
    #[arg(long, env = "QUESTION_TIMEOUT_SECS")]
    pub question_timeout_secs: Option<u64>,

    /// Pause between rounds in continuous play, in seconds
    #[arg(long, env = "BETWEEN_ROUNDS_SECS")]
    pub between_rounds_secs: Option<u64>,

    /// Continuous-play round window, in seconds
    #[arg(long, env = "ROUND_WINDOW_SECS")]
    pub round_window_secs: Option<u64>,

    /// Points deducted per hint
    #[arg(long, env = "HINT_COST", allow_negative_numbers = true)]
    pub hint_cost: Option<i64>,

    /// Points awarded per correct answer
    #[arg(long, env = "CORRECT_POINTS", allow_negative_numbers = true)]
    pub correct_points: Option<i64>,

    /// Address for the HTTP status server; disabled when unset
    #[arg(long, env = "HTTP_ADDR")]
    pub http_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Append logs to this file instead of stdout
    #[arg(long, env = "LOG_FILE_PATH", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Contents of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub bot_name: Option<String>,
    pub irc_server: Option<String>,
    pub irc_server_tls: Option<String>,
    pub irc_channel: Option<String>,
    pub questions_path: Option<PathBuf>,
    pub scoreboard_path: Option<PathBuf>,
    pub skip_vote_threshold: Option<usize>,
    pub question_timeout_secs: Option<u64>,
    pub between_rounds_secs: Option<u64>,
    pub round_window_secs: Option<u64>,
    pub hint_cost: Option<i64>,
    pub correct_points: Option<i64>,
    pub http_addr: Option<SocketAddr>,
    pub log_level: Option<String>,
    #[serde(alias = "log_file_path")]
    pub log_file: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    /// Reads `path`. A missing file yields an empty config.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigFile` if the file cannot be read and
    /// `AppError::Config` if it does not match this schema.
    pub fn read(path: &Path) -> Result<Self, AppError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(AppError::ConfigFile {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let parsed = if is_yaml {
            Self::parse(&text).map_err(|e| e.to_string())
        } else {
            Self::parse_key_values(&text)
        };
        parsed.map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Parses `KEY=VALUE` lines. Keys are the environment variable names
    /// (`BOT_NAME`, `IRC_SERVER_TLS`, ...); blank lines and `#` comments are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first malformed line or unknown key.
    pub fn parse_key_values(text: &str) -> Result<Self, String> {
        let mut map = serde_yaml::Mapping::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(format!("line {}: expected KEY=VALUE, got {line:?}", number + 1));
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value.parse::<i64>().map_or_else(
                |_| serde_yaml::Value::String(value.to_owned()),
                |n| serde_yaml::Value::Number(n.into()),
            );
            map.insert(serde_yaml::Value::String(key), value);
        }
        serde_yaml::from_value(serde_yaml::Value::Mapping(map)).map_err(|e| e.to_string())
    }

    /// Parses YAML text. An empty document yields an empty config.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the text does not match the schema.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

/// Fully resolved, validated settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bot_name: String,
    pub irc: IrcEndpoint,
    pub irc_channel: String,
    pub questions_path: PathBuf,
    pub scoreboard_path: PathBuf,
    pub skip_vote_threshold: usize,
    pub question_timeout: Duration,
    pub pacing: Pacing,
    pub hint_cost: i64,
    pub correct_points: i64,
    pub http_addr: Option<SocketAddr>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn required(value: Option<String>, key: &str) -> Result<String, AppError> {
    non_blank(value)
        .ok_or_else(|| AppError::Config(format!("{key} is not set in flags, environment or config file")))
}

/// The TLS address wins whenever one is set.
fn endpoint(plain: Option<String>, tls: Option<String>) -> Result<IrcEndpoint, AppError> {
    if let Some(address) = non_blank(tls) {
        return Ok(IrcEndpoint { address, tls: true });
    }
    if let Some(address) = non_blank(plain) {
        return Ok(IrcEndpoint { address, tls: false });
    }
    Err(AppError::Config(
        "at least one of irc_server or irc_server_tls must be set in flags, environment or config file"
            .into(),
    ))
}

impl Config {
    /// Reads the config file named by `cli` (or the default path) and
    /// resolves the final settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the file is unreadable or a setting is invalid.
    pub fn load(cli: Cli) -> Result<Self, AppError> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let file = FileConfig::read(&path)?;
        Self::resolve(cli, file)
    }

    /// Merges flags/environment over the file over defaults, then validates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first invalid setting.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, AppError> {
        let default_pacing = Pacing::default();
        let seconds = |cli: Option<u64>, file: Option<u64>, default: Duration| {
            cli.or(file).map_or(default, Duration::from_secs)
        };

        let config = Self {
            bot_name: required(cli.bot_name.or(file.bot_name), "bot_name")?,
            irc: endpoint(
                cli.irc_server.or(file.irc_server),
                cli.irc_server_tls.or(file.irc_server_tls),
            )?,
            irc_channel: required(cli.irc_channel.or(file.irc_channel), "irc_channel")?,
            questions_path: cli
                .questions_path
                .or(file.questions_path)
                .unwrap_or_else(|| PathBuf::from("questions.json")),
            scoreboard_path: cli
                .scoreboard_path
                .or(file.scoreboard_path)
                .unwrap_or_else(|| PathBuf::from("scoreboard.json")),
            skip_vote_threshold: cli
                .skip_vote_threshold
                .or(file.skip_vote_threshold)
                .unwrap_or(DEFAULT_SKIP_VOTE_THRESHOLD),
            question_timeout: seconds(
                cli.question_timeout_secs,
                file.question_timeout_secs,
                DEFAULT_QUESTION_TIMEOUT,
            ),
            pacing: Pacing {
                between_rounds: seconds(
                    cli.between_rounds_secs,
                    file.between_rounds_secs,
                    default_pacing.between_rounds,
                ),
                round_window: seconds(
                    cli.round_window_secs,
                    file.round_window_secs,
                    default_pacing.round_window,
                ),
            },
            hint_cost: cli.hint_cost.or(file.hint_cost).unwrap_or(DEFAULT_HINT_COST),
            correct_points: cli
                .correct_points
                .or(file.correct_points)
                .unwrap_or(DEFAULT_CORRECT_POINTS),
            http_addr: cli.http_addr.or(file.http_addr),
            log_level: cli
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_owned()),
            log_file: cli.log_file.or(file.log_file),
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !self.irc_channel.starts_with(['#', '&']) {
            return Err(AppError::Config(format!(
                "irc_channel must start with '#' or '&', got {:?}",
                self.irc_channel
            )));
        }
        if self.skip_vote_threshold == 0 {
            return Err(AppError::Config(
                "skip_vote_threshold must be at least 1".into(),
            ));
        }
        if self.question_timeout.is_zero() {
            return Err(AppError::Config(
                "question_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.pacing.between_rounds.is_zero() || self.pacing.round_window.is_zero() {
            return Err(AppError::Config(
                "between_rounds_secs and round_window_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Game settings derived from this config.
    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            channel: self.irc_channel.clone(),
            question_timeout: self.question_timeout,
            pacing: self.pacing,
            hint_cost: self.hint_cost,
            correct_points: self.correct_points,
        }
    }
}
