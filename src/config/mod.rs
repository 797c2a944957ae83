//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "perf-tooling";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SITE_NAME: &str = "Performance tooling today";
const DEFAULT_REFRESH_CRON: &str = "0 0 */12 * * *";
const DEFAULT_CONSUME_INTERVAL_MS: u64 = 1000;
const DEFAULT_USER_AGENT: &str = "perf-tooling.today";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 20;

/// Platform vocabulary used for fuzzy tokens and the index page, unless the
/// deployment overrides it.
const DEFAULT_PLATFORMS: &[&str] = &[
    "bookmarklet",
    "chrome",
    "firefox",
    "internetExplorer",
    "safari",
    "mac",
    "windows",
    "linux",
    "cli",
    "module",
    "grunt",
    "gulp",
    "javascript",
    "php",
    "service",
];

/// Command-line arguments for the perf-tooling binary.
#[derive(Debug, Parser)]
#[command(name = "perf-tooling", version, about = "Performance tooling directory server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PERF_TOOLING_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Validate the flat-file store and report per-category counts.
    #[command(name = "check")]
    CheckStore(CheckArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the flat-file store directory.
    #[arg(long = "store-data-dir", value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Override the enrichment refresh cron expression.
    #[arg(long = "scheduler-refresh-cron", value_name = "CRON")]
    pub refresh_cron: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CheckArgs {
    /// Override the flat-file store directory.
    #[arg(long = "store-data-dir", value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
    pub site: SiteSettings,
    pub platforms: Vec<String>,
    pub scheduler: SchedulerSettings,
    pub providers: ProviderSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub name: String,
    pub cdn: String,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Cron expression for the enrichment refresh cycle.
    pub refresh_cron: String,
    /// Cadence of the backstop update-queue consume tick.
    pub consume_interval: Duration,
}

/// Provider credentials; a missing secret disables its provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub user_agent: String,
    pub timeout: Duration,
    pub github_token: Option<String>,
    /// `owner/name` slug whose contributors appear on the index page.
    pub github_repository: Option<String>,
    pub youtube_api_key: Option<String>,
    pub vimeo_access_token: Option<String>,
    pub twitter_bearer_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("PERF_TOOLING").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckStore(args)) => raw.apply_check_overrides(args),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
    site: RawSiteSettings,
    platforms: Option<Vec<String>>,
    scheduler: RawSchedulerSettings,
    providers: RawProviderSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(dir) = overrides.data_dir.as_ref() {
            self.store.data_dir = Some(dir.clone());
        }
        if let Some(cron) = overrides.refresh_cron.as_ref() {
            self.scheduler.refresh_cron = Some(cron.clone());
        }
    }

    fn apply_check_overrides(&mut self, args: &CheckArgs) {
        if let Some(dir) = args.data_dir.as_ref() {
            self.store.data_dir = Some(dir.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            store,
            site,
            platforms,
            scheduler,
            providers,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            store: build_store_settings(store)?,
            site: build_site_settings(site),
            platforms: platforms.unwrap_or_else(default_platforms),
            scheduler: build_scheduler_settings(scheduler)?,
            providers: build_provider_settings(providers)?,
        })
    }
}

fn default_platforms() -> Vec<String> {
    DEFAULT_PLATFORMS
        .iter()
        .map(|platform| platform.to_string())
        .collect()
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let candidate = format!("{host}:{port}");
    let addr = candidate
        .parse()
        .map_err(|err| LoadError::invalid("server.addr", format!("invalid `{candidate}`: {err}")))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let data_dir = store
        .data_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if data_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "store.data_dir",
            "path must not be empty",
        ));
    }
    Ok(StoreSettings { data_dir })
}

fn build_site_settings(site: RawSiteSettings) -> SiteSettings {
    SiteSettings {
        name: site.name.unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        cdn: site
            .cdn
            .map(|cdn| cdn.trim_end_matches('/').to_string())
            .unwrap_or_default(),
    }
}

fn build_scheduler_settings(
    scheduler: RawSchedulerSettings,
) -> Result<SchedulerSettings, LoadError> {
    let refresh_cron = scheduler
        .refresh_cron
        .unwrap_or_else(|| DEFAULT_REFRESH_CRON.to_string());
    if refresh_cron.trim().is_empty() {
        return Err(LoadError::invalid(
            "scheduler.refresh_cron",
            "expression must not be empty",
        ));
    }

    let consume_interval_ms = scheduler
        .consume_interval_ms
        .unwrap_or(DEFAULT_CONSUME_INTERVAL_MS);
    if consume_interval_ms == 0 {
        return Err(LoadError::invalid(
            "scheduler.consume_interval_ms",
            "must be greater than zero",
        ));
    }

    Ok(SchedulerSettings {
        refresh_cron,
        consume_interval: Duration::from_millis(consume_interval_ms),
    })
}

fn build_provider_settings(providers: RawProviderSettings) -> Result<ProviderSettings, LoadError> {
    let timeout_seconds = providers
        .timeout_seconds
        .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "providers.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ProviderSettings {
        user_agent: providers
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        timeout: Duration::from_secs(timeout_seconds),
        github_token: non_empty(providers.github_token),
        github_repository: non_empty(providers.github_repository),
        youtube_api_key: non_empty(providers.youtube_api_key),
        vimeo_access_token: non_empty(providers.vimeo_access_token),
        twitter_bearer_token: non_empty(providers.twitter_bearer_token),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    name: Option<String>,
    cdn: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSchedulerSettings {
    refresh_cron: Option<String>,
    consume_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawProviderSettings {
    user_agent: Option<String>,
    timeout_seconds: Option<u64>,
    github_token: Option<String>,
    github_repository: Option<String>,
    youtube_api_key: Option<String>,
    vimeo_access_token: Option<String>,
    twitter_bearer_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_a_valid_configuration() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.store.data_dir, PathBuf::from("data"));
        assert_eq!(settings.site.name, DEFAULT_SITE_NAME);
        assert_eq!(settings.scheduler.refresh_cron, DEFAULT_REFRESH_CRON);
        assert_eq!(settings.platforms.len(), DEFAULT_PLATFORMS.len());
        assert!(settings.providers.github_token.is_none());
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn blank_secrets_disable_their_provider() {
        let mut raw = RawSettings::default();
        raw.providers.github_token = Some("   ".to_string());
        raw.providers.youtube_api_key = Some("key".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.providers.github_token.is_none());
        assert_eq!(settings.providers.youtube_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn cdn_loses_its_trailing_slash() {
        let mut raw = RawSettings::default();
        raw.site.cdn = Some("https://cdn.example.com/".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.site.cdn, "https://cdn.example.com");
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(0);
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["perf-tooling"]);
        assert!(args.command.is_none());
    }

    #[test]
    fn parse_check_arguments() {
        let args = CliArgs::parse_from([
            "perf-tooling",
            "check",
            "--store-data-dir",
            "/srv/perf-data",
        ]);

        match args.command.expect("check command") {
            Command::CheckStore(check) => {
                assert_eq!(check.data_dir, Some(PathBuf::from("/srv/perf-data")));
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "perf-tooling",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--scheduler-refresh-cron",
            "0 0 */6 * * *",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.refresh_cron.as_deref(),
                    Some("0 0 */6 * * *")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
