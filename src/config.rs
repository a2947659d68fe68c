// Configuration management for the BIRD route sync daemon
// Supports CLI arguments, environment variables and a config file (TOML)

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use crate::bird::StaticRoute;
use crate::publisher::DEFAULT_NAMESPACE;

/// Publish the local BIRD routing table to a shared Redis store
#[derive(Parser, Debug, Clone)]
#[command(name = "bird-redis-sync")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub action: Action,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "BRS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, env = "BRS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Redis host
    #[arg(long, global = true, env = "BRS_REDIS_HOST")]
    pub redis_host: Option<String>,

    /// Redis port
    #[arg(long, global = true, env = "BRS_REDIS_PORT")]
    pub redis_port: Option<u16>,

    /// Redis database number
    #[arg(long, global = true, env = "BRS_REDIS_DB")]
    pub redis_db: Option<u32>,

    /// Node id used to namespace published routes (default: hostname)
    #[arg(long, global = true, env = "BRS_NODE_ID")]
    pub node_id: Option<String>,

    /// birdc binary
    #[arg(long, global = true, env = "BRS_BIRDC")]
    pub birdc: Option<String>,

    /// BIRD control socket
    #[arg(long, global = true, env = "BRS_BIRD_SOCKET")]
    pub bird_socket: Option<PathBuf>,

    /// Seconds between sync cycles
    #[arg(long, global = true, env = "BRS_INTERVAL")]
    pub interval: Option<u64>,

    /// Seconds a published route stays visible without a refresh
    #[arg(long, global = true, env = "BRS_TTL")]
    pub ttl: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Action {
    /// Continuously sync BIRD routes into the store
    Run,
    /// Run a single sync cycle and exit
    Once,
    /// Add a static route to BIRD and publish it
    Add(AddArgs),
    /// Withdraw a route from BIRD
    Delete {
        #[arg(long)]
        network: String,
    },
    /// Look up published routes
    Lookup {
        /// Network or glob pattern
        #[arg(long)]
        network: String,
        /// Node to query (default: this node)
        #[arg(long)]
        node: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub network: String,
    #[arg(long)]
    pub next_hop: String,
    #[arg(long)]
    pub interface: String,
    #[arg(long, default_value = "static")]
    pub source_protocol: String,
    #[arg(long, default_value = "200")]
    pub preference: u32,
}

impl From<AddArgs> for StaticRoute {
    fn from(args: AddArgs) -> Self {
        StaticRoute {
            network: args.network,
            next_hop: args.next_hop,
            interface: args.interface,
            source_protocol: args.source_protocol,
            preference: args.preference,
        }
    }
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub redis: RedisSettings,

    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub bird: BirdConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_host")]
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    #[serde(default)]
    pub db: u32,
}

impl RedisSettings {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    /// Defaults to the hostname
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirdConfig {
    #[serde(default = "default_birdc")]
    pub birdc: String,

    #[serde(default)]
    pub socket: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,

    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    #[serde(default = "default_namespace")]
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_redis_host() -> String {
    "redis".to_string()
}
fn default_redis_port() -> u16 {
    6379
}
fn default_birdc() -> String {
    "birdc".to_string()
}
fn default_interval() -> u64 {
    30
}
fn default_ttl() -> u64 {
    60
}
fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RedisSettings {
    fn default() -> Self {
        RedisSettings {
            host: default_redis_host(),
            port: default_redis_port(),
            db: 0,
        }
    }
}

impl Default for BirdConfig {
    fn default() -> Self {
        BirdConfig {
            birdc: default_birdc(),
            socket: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            interval_seconds: default_interval(),
            ttl_seconds: default_ttl(),
            namespace: default_namespace(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Merged configuration from all sources, handed to each component at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: Option<PathBuf>,
    pub log_level: Level,
    /// `EnvFilter` directives for the subscriber
    pub log_filter: String,
    pub redis: RedisSettings,
    pub node_id: String,
    pub birdc: String,
    pub bird_socket: Option<PathBuf>,
    pub sync_interval: Duration,
    pub ttl: Duration,
    pub namespace: String,
}

impl Config {
    /// Load configuration from all sources
    /// Priority: CLI args > Environment variables > Config file > Defaults
    ///
    /// For logging, `--log-level`/`BRS_LOG_LEVEL` win over `RUST_LOG`, which
    /// wins over the config file.
    pub fn load(cli_args: &CliArgs) -> anyhow::Result<Self> {
        let (config_path, config_file) =
            load_config_file(cli_args.config.as_ref(), &default_config_paths())?;
        Self::merge(
            cli_args,
            config_file,
            config_path,
            std::env::var("RUST_LOG").ok(),
        )
    }

    fn merge(
        cli_args: &CliArgs,
        file: ConfigFile,
        config_path: Option<PathBuf>,
        rust_log: Option<String>,
    ) -> anyhow::Result<Self> {
        let log_level = parse_log_level(cli_args.log_level.as_deref().unwrap_or(&file.logging.level))?;
        let log_filter = match rust_log.filter(|f| !f.trim().is_empty()) {
            Some(directives) if cli_args.log_level.is_none() => directives,
            _ => log_level.to_string().to_lowercase(),
        };

        let redis = RedisSettings {
            host: cli_args.redis_host.clone().unwrap_or(file.redis.host),
            port: cli_args.redis_port.unwrap_or(file.redis.port),
            db: cli_args.redis_db.unwrap_or(file.redis.db),
        };

        let node_id = cli_args
            .node_id
            .clone()
            .or(file.node.id)
            .unwrap_or_else(get_hostname);
        if node_id.is_empty() {
            anyhow::bail!("Node id must not be empty");
        }

        let interval = cli_args.interval.unwrap_or(file.sync.interval_seconds);
        if interval == 0 {
            anyhow::bail!("Sync interval must be at least one second");
        }
        let ttl = cli_args.ttl.unwrap_or(file.sync.ttl_seconds);
        if ttl == 0 {
            anyhow::bail!("TTL must be at least one second");
        }
        if i64::try_from(ttl).is_err() {
            anyhow::bail!("TTL of {} seconds is out of range", ttl);
        }

        Ok(Config {
            config_path,
            log_level,
            log_filter,
            redis,
            node_id,
            birdc: cli_args.birdc.clone().unwrap_or(file.bird.birdc),
            bird_socket: cli_args.bird_socket.clone().or(file.bird.socket),
            sync_interval: Duration::from_secs(interval),
            ttl: Duration::from_secs(ttl),
            namespace: file.sync.namespace,
        })
    }

    /// A route must survive until the next cycle refreshes it
    pub fn ttl_outlives_interval(&self) -> bool {
        self.ttl > self.sync_interval
    }
}

fn default_config_paths() -> [PathBuf; 2] {
    [
        PathBuf::from("bird-redis-sync.toml"),
        PathBuf::from("config.toml"),
    ]
}

/// An explicit path must exist; otherwise the first existing default path is used
fn load_config_file(
    explicit: Option<&PathBuf>,
    default_paths: &[PathBuf],
) -> anyhow::Result<(Option<PathBuf>, ConfigFile)> {
    if let Some(path) = explicit {
        return Ok((Some(path.clone()), read_config_file(path)?));
    }

    for path in default_paths {
        if path.exists() {
            return Ok((Some(path.clone()), read_config_file(path)?));
        }
    }

    Ok((None, ConfigFile::default()))
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str::<ConfigFile>(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_log_level(level_str: &str) -> anyhow::Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(anyhow::anyhow!("Invalid log level: {}", level_str)),
    }
}
