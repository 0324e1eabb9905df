use clap::{Parser, builder::BoolishValueParser};
use puca_core::category::Category;
use puca_core::clients::{
    DEFAULT_NOMINATIM_URL,
    DEFAULT_OSRM_URL,
    DEFAULT_OVERPASS_URL,
    DEFAULT_USER_AGENT,
    UpstreamConfig,
};
use puca_core::control::ControlSettings;
use puca_core::enrich::{DEFAULT_ENRICH_CONCURRENCY, EnrichmentConfig};
use puca_core::retry::RetryPolicy;
use puca_mcp::server::McpHttpServerConfig;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:3300";
const DEFAULT_DISTANCE_M: f64 = 100.0;
const DEFAULT_LOG_LEVEL: &str = "debug";
const DEFAULT_LOG_TO: &str = "stdout";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ENRICH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_LOCAL_CATEGORY: &str = "vacant_building";

#[derive(Parser, Debug)]
#[command(name = "puca-mcpd", version, about = "Puca geospatial MCP daemon.")]
struct CliArgs {
    #[arg(long, env = "PUCA_NOMINATIM_BASE_URL", default_value = DEFAULT_NOMINATIM_URL)]
    nominatim_base_url: String,

    #[arg(long, env = "PUCA_OSRM_BASE_URL", default_value = DEFAULT_OSRM_URL)]
    osrm_base_url: String,

    #[arg(long, env = "PUCA_OVERPASS_BASE_URL", default_value = DEFAULT_OVERPASS_URL)]
    overpass_base_url: String,

    /// Search radius in metres when a tool call does not give one.
    #[arg(long, env = "PUCA_DISTANCE", default_value_t = DEFAULT_DISTANCE_M)]
    distance: f64,

    #[arg(long, env = "PUCA_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// `stdout`, `stderr`, or a file path to append to.
    #[arg(long, env = "PUCA_LOG_TO", default_value = DEFAULT_LOG_TO)]
    log_to: String,

    #[arg(long, env = "PUCA_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    #[arg(
        long,
        env = "PUCA_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long,
        env = "PUCA_ENRICH_CONCURRENCY",
        default_value_t = DEFAULT_ENRICH_CONCURRENCY
    )]
    enrich_concurrency: usize,

    #[arg(
        long,
        env = "PUCA_ENRICH_TIMEOUT_SECS",
        default_value_t = DEFAULT_ENRICH_TIMEOUT_SECS
    )]
    enrich_timeout_secs: u64,

    #[arg(long, env = "PUCA_RETRY_ATTEMPTS", default_value_t = DEFAULT_RETRY_ATTEMPTS)]
    retry_attempts: u32,

    #[arg(
        long = "stdio",
        env = "PUCA_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(long, env = "PUCA_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    /// Serve streamable HTTP without per-client sessions.
    #[arg(
        long = "stateless-http",
        env = "PUCA_MCP_HTTP_STATELESS",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    stateless_http: bool,

    /// Print one report for `--address` and exit instead of serving.
    #[arg(long, default_value_t = false)]
    local: bool,

    #[arg(long)]
    address: Option<String>,

    #[arg(long, default_value = DEFAULT_LOCAL_CATEGORY)]
    category: String,
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
    File(PathBuf),
}

/// A single search run from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRequest {
    pub address: String,
    pub category: Category,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct PucaConfig {
    pub nominatim_url: String,
    pub osrm_url: String,
    pub overpass_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
    pub default_radius_m: f64,
    pub enrich_concurrency: usize,
    pub enrich_timeout: Duration,
    pub log_level: Level,
    pub log_to: LogTarget,
    pub enable_stdio: bool,
    pub mcp_http_addr: SocketAddr,
    pub mcp_http_stateful: bool,
    pub local: Option<LocalRequest>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl PucaConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            nominatim_url: self.nominatim_url.clone(),
            osrm_url: self.osrm_url.clone(),
            overpass_url: self.overpass_url.clone(),
            user_agent: self.user_agent.clone(),
            request_timeout: self.request_timeout,
            retry: RetryPolicy::new(self.retry_attempts),
        }
    }

    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            default_radius_m: self.default_radius_m,
            enrichment: EnrichmentConfig::default()
                .with_concurrency(self.enrich_concurrency)
                .with_call_timeout(self.enrich_timeout),
        }
    }

    pub fn http_server_config(&self) -> McpHttpServerConfig {
        McpHttpServerConfig::new(self.mcp_http_addr).with_stateful_mode(self.mcp_http_stateful)
    }

    /// Log destination, moved off stdout when stdout carries the protocol.
    pub fn effective_log_target(&self) -> LogTarget {
        if self.enable_stdio && self.local.is_none() && self.log_to == LogTarget::Stdout {
            LogTarget::Stderr
        } else {
            self.log_to.clone()
        }
    }
}

fn required_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingSetting(name));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ConfigError::InvalidSetting { name, value });
    }
    Ok(trimmed.to_string())
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidSetting {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_log_target(value: &str) -> Result<LogTarget, ConfigError> {
    match value.trim() {
        "" => Err(ConfigError::MissingSetting("PUCA_LOG_TO")),
        "stdout" => Ok(LogTarget::Stdout),
        "stderr" => Ok(LogTarget::Stderr),
        path => Ok(LogTarget::File(PathBuf::from(path))),
    }
}

impl TryFrom<CliArgs> for PucaConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let nominatim_url = required_url("PUCA_NOMINATIM_BASE_URL", args.nominatim_base_url)?;
        let osrm_url = required_url("PUCA_OSRM_BASE_URL", args.osrm_base_url)?;
        let overpass_url = required_url("PUCA_OVERPASS_BASE_URL", args.overpass_base_url)?;

        if !args.distance.is_finite() || args.distance <= 0.0 {
            return Err(ConfigError::InvalidSetting {
                name: "PUCA_DISTANCE",
                value: args.distance.to_string(),
            });
        }
        if args.enrich_concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PUCA_ENRICH_CONCURRENCY",
                value: args.enrich_concurrency.to_string(),
            });
        }
        if args.retry_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PUCA_RETRY_ATTEMPTS",
                value: args.retry_attempts.to_string(),
            });
        }
        if args.user_agent.trim().is_empty() {
            return Err(ConfigError::MissingSetting("PUCA_USER_AGENT"));
        }

        let log_level = args
            .log_level
            .trim()
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidSetting {
                name: "PUCA_LOG_LEVEL",
                value: args.log_level.clone(),
            })?;
        let log_to = parse_log_target(&args.log_to)?;

        let local = if args.local {
            let address = args
                .address
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingSetting("--address"))?;
            let category = args
                .category
                .parse::<Category>()
                .map_err(|_| ConfigError::InvalidSetting {
                    name: "--category",
                    value: args.category.clone(),
                })?;
            Some(LocalRequest { address, category })
        } else {
            None
        };

        Ok(Self {
            nominatim_url,
            osrm_url,
            overpass_url,
            user_agent: args.user_agent,
            request_timeout: positive_secs(
                "PUCA_REQUEST_TIMEOUT_SECS",
                args.request_timeout_secs,
            )?,
            retry_attempts: args.retry_attempts,
            default_radius_m: args.distance,
            enrich_concurrency: args.enrich_concurrency,
            enrich_timeout: positive_secs("PUCA_ENRICH_TIMEOUT_SECS", args.enrich_timeout_secs)?,
            log_level,
            log_to,
            enable_stdio: args.enable_stdio,
            mcp_http_addr: args.mcp_http_addr,
            mcp_http_stateful: !args.stateless_http,
            local,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            nominatim_base_url: DEFAULT_NOMINATIM_URL.to_string(),
            osrm_base_url: DEFAULT_OSRM_URL.to_string(),
            overpass_base_url: DEFAULT_OVERPASS_URL.to_string(),
            distance: DEFAULT_DISTANCE_M,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_to: DEFAULT_LOG_TO.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            enrich_concurrency: DEFAULT_ENRICH_CONCURRENCY,
            enrich_timeout_secs: DEFAULT_ENRICH_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            enable_stdio: false,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            stateless_http: false,
            local: false,
            address: None,
            category: DEFAULT_LOCAL_CATEGORY.to_string(),
        }
    }

    #[test]
    fn defaults_produce_a_valid_config() {
        let config = PucaConfig::try_from(base_args()).expect("config should parse");

        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.log_to, LogTarget::Stdout);
        assert!((config.control_settings().default_radius_m - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.upstream_config().retry.max_attempts, 3);
        assert!(config.local.is_none());
    }

    #[test]
    fn http_sessions_are_stateful_unless_disabled() {
        let config = PucaConfig::try_from(base_args()).expect("config should parse");
        let http = config.http_server_config();
        assert!(http.stateful_mode);
        assert_eq!(http.addr, DEFAULT_MCP_HTTP_ADDR.parse::<SocketAddr>().expect("addr"));

        let mut args = base_args();
        args.stateless_http = true;
        let config = PucaConfig::try_from(args).expect("config should parse");
        assert!(!config.http_server_config().stateful_mode);
    }

    #[test]
    fn rejects_empty_upstream_urls() {
        let mut args = base_args();
        args.overpass_base_url = "  ".to_string();

        let err = PucaConfig::try_from(args).expect_err("empty url should fail");
        assert!(matches!(err, ConfigError::MissingSetting("PUCA_OVERPASS_BASE_URL")));
    }

    #[test]
    fn rejects_non_positive_distance() {
        let mut args = base_args();
        args.distance = 0.0;

        let err = PucaConfig::try_from(args).expect_err("zero distance should fail");
        assert!(matches!(err, ConfigError::InvalidSetting { name: "PUCA_DISTANCE", .. }));
    }

    #[test]
    fn rejects_zero_concurrency_and_bad_log_levels() {
        let mut args = base_args();
        args.enrich_concurrency = 0;
        assert!(PucaConfig::try_from(args).is_err());

        let mut args = base_args();
        args.log_level = "verbose".to_string();
        let err = PucaConfig::try_from(args).expect_err("unknown level should fail");
        assert!(matches!(err, ConfigError::InvalidSetting { name: "PUCA_LOG_LEVEL", .. }));
    }

    #[test]
    fn local_mode_requires_an_address() {
        let mut args = base_args();
        args.local = true;

        let err = PucaConfig::try_from(args).expect_err("missing address should fail");
        assert!(matches!(err, ConfigError::MissingSetting("--address")));
    }

    #[test]
    fn local_mode_resolves_the_category() {
        let mut args = base_args();
        args.local = true;
        args.address = Some("Hill Street, Newry".to_string());
        args.category = "defibrillator".to_string();

        let config = PucaConfig::try_from(args).expect("config should parse");
        let local = config.local.expect("local request");
        assert_eq!(local.category, Category::Defibrillator);
    }

    #[test]
    fn stdio_moves_logging_off_stdout() {
        let mut args = base_args();
        args.enable_stdio = true;
        let config = PucaConfig::try_from(args).expect("config should parse");
        assert_eq!(config.effective_log_target(), LogTarget::Stderr);

        let mut args = base_args();
        args.enable_stdio = true;
        args.log_to = "/var/log/puca.log".to_string();
        let config = PucaConfig::try_from(args).expect("config should parse");
        assert_eq!(
            config.effective_log_target(),
            LogTarget::File(PathBuf::from("/var/log/puca.log"))
        );
    }
}
