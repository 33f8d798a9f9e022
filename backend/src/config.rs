use std::env;
use std::path::PathBuf;
use std::time::Duration;
use chrono::Weekday;
use chrono_tz::Tz;
use dotenv::dotenv;
use log::{info, warn};

use crate::leaderboard::scheduler::SchedulerConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub chess: ChessApiConfig,
    pub slack: SlackConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Canonical location of the players file
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ChessApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub api_url: String,
    pub bot_token: Option<String>,
    pub timeout: Duration,
}

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

impl Config {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        // Check for ENV_FILE_PATH override
        match env::var("ENV_FILE_PATH") {
            Ok(env_file_path) if !env_file_path.is_empty() => {
                info!("Loading environment from ENV_FILE_PATH: {}", env_file_path);
                dotenv::from_filename(&env_file_path).ok();
            }
            _ => {
                // Base .env is optional; a non-development RUST_ENV layers .env.<env> on top
                dotenv().ok();
                let environment_hint = env::var("RUST_ENV")
                    .unwrap_or_else(|_| "development".to_string())
                    .parse()
                    .unwrap_or(Environment::Development);
                let env_file = format!(".env.{:?}", environment_hint).to_lowercase();
                if env_file != ".env.development" {
                    let _ = dotenv::from_filename(&env_file);
                }
            }
        }

        let environment = env::var("RUST_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()
            .unwrap_or(Environment::Development);

        info!("Loading configuration for environment: {:?}", environment);

        let config = Self::from_lookup(environment, |key| env::var(key).ok())?;
        config.validate()?;
        config.log_configuration();

        Ok(config)
    }

    /// Builds the configuration from a key lookup, so tests can supply variables
    /// without touching the process environment.
    pub fn from_lookup<F>(environment: Environment, lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            server: Self::load_server_config(&environment, &lookup),
            store: Self::load_store_config(&lookup),
            chess: Self::load_chess_config(&lookup),
            slack: Self::load_slack_config(&lookup),
            scheduler: Self::load_scheduler_config(&environment, &lookup)?,
            environment,
        })
    }

    fn load_server_config<F>(env: &Environment, lookup: &F) -> ServerConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_workers = match env {
            Environment::Production => 4,
            Environment::Development | Environment::Test => 1,
        };

        ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(lookup("SERVER_PORT"), 5000),
            workers: parse_or(lookup("SERVER_WORKERS"), default_workers),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
        }
    }

    fn load_store_config<F>(lookup: &F) -> StoreConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        StoreConfig {
            path: lookup("PLAYERS_JSON_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data").join("players.json")),
        }
    }

    fn load_chess_config<F>(lookup: &F) -> ChessApiConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        ChessApiConfig {
            base_url: lookup("CHESS_API_BASE_URL")
                .unwrap_or_else(|| "https://api.chess.com/pub/player".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parse_or(lookup("CHESS_API_TIMEOUT_SECONDS"), 5)),
            user_agent: lookup("CHESS_API_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    fn load_slack_config<F>(lookup: &F) -> SlackConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        SlackConfig {
            api_url: lookup("SLACK_API_URL")
                .unwrap_or_else(|| "https://slack.com/api".to_string())
                .trim_end_matches('/')
                .to_string(),
            bot_token: lookup("SLACK_BOT_TOKEN").filter(|token| !token.trim().is_empty()),
            timeout: Duration::from_secs(parse_or(lookup("SLACK_API_TIMEOUT_SECONDS"), 5)),
        }
    }

    fn load_scheduler_config<F>(env: &Environment, lookup: &F) -> Result<SchedulerConfig, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SchedulerConfig::default();

        let enabled = match lookup("SCHEDULER_ENABLED") {
            Some(value) => value.trim().eq_ignore_ascii_case("true"),
            None => *env != Environment::Test,
        };

        let working_days = match lookup("WORKING_DAYS") {
            Some(raw) => parse_weekdays(&raw)?,
            None => defaults.working_days.clone(),
        };

        let timezone = match lookup("SCHEDULER_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|e| format!("Invalid SCHEDULER_TIMEZONE '{}': {}", name, e))?,
            None => defaults.timezone,
        };

        Ok(SchedulerConfig {
            enabled,
            interval_minutes: parse_or(lookup("UPDATE_INTERVAL_MINUTES"), defaults.interval_minutes),
            rate_limit_delay_seconds: parse_or(
                lookup("RATE_LIMIT_DELAY_SECONDS"),
                defaults.rate_limit_delay_seconds,
            ),
            working_days,
            start_hour: parse_or(lookup("START_HOUR"), defaults.start_hour),
            timezone,
        })
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".into());
        }

        if self.chess.timeout.is_zero() || self.slack.timeout.is_zero() {
            return Err("Third-party API timeouts cannot be 0".into());
        }

        let scheduler = &self.scheduler;
        if scheduler.interval_minutes == 0 {
            return Err("Update interval cannot be 0 minutes".into());
        }
        if scheduler.start_hour > 23 {
            return Err(format!("Start hour must be between 0 and 23, got {}", scheduler.start_hour).into());
        }
        if scheduler.working_days.is_empty() {
            return Err("Working day set cannot be empty".into());
        }
        if !scheduler.rate_limit_delay_seconds.is_finite() || scheduler.rate_limit_delay_seconds < 0.0 {
            return Err("Rate limit delay must be a non-negative number of seconds".into());
        }

        if self.is_production() && self.slack.bot_token.is_none() {
            return Err("SLACK_BOT_TOKEN must be set in production".into());
        }

        Ok(())
    }

    fn log_configuration(&self) {
        info!("Configuration loaded successfully");
        info!("Environment: {:?}", self.environment);
        info!("Server: {}:{} (workers: {})", self.server.host, self.server.port, self.server.workers);
        info!("Store: {}", self.store.path.display());
        info!("Chess API: {} (timeout: {:?})", self.chess.base_url, self.chess.timeout);
        info!(
            "Scheduler: enabled={} every {} min, delay {}s, days {:?} from {}h ({})",
            self.scheduler.enabled,
            self.scheduler.interval_minutes,
            self.scheduler.rate_limit_delay_seconds,
            self.scheduler.working_days,
            self.scheduler.start_hour,
            self.scheduler.timezone
        );
        if self.slack.bot_token.is_none() {
            warn!("SLACK_BOT_TOKEN not configured - slash commands will fail");
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a comma separated weekday list such as "mon,tue,wed".
pub fn parse_weekdays(raw: &str) -> Result<Vec<Weekday>, String> {
    let mut days = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let day = token
            .parse::<Weekday>()
            .map_err(|_| format!("Invalid weekday in WORKING_DAYS: '{}'", token))?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}
