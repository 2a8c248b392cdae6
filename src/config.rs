use crate::error::{ModelbenchError, Result};
use crate::footprint::FootprintFormat;
use crate::sampler::SamplerOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The base config directory name under ~/.config/
const CONFIG_DIR_NAME: &str = "modelbench";

/// The filename for the global configuration file.
const GLOBAL_CONFIG_FILENAME: &str = "config.toml";

/// A config file in the working directory overrides the global one.
const LOCAL_CONFIG_FILENAME: &str = "modelbench.toml";

// ============================================================================
// Benchmark Configuration
// ============================================================================

/// Settings shared by every benchmark command.
///
/// Missing fields in a config file fall back to their defaults, so a partial
/// file only needs the values it changes.
///
/// # Example
///
/// ```toml
/// poll_interval_ms = 10
/// timeout_secs = 3600
/// static_dir = "./static"
/// session_dir = "./.modelbench"
/// partitions = 4
/// formats = ["binary", "parquet"]
/// keep_samples = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Delay between sampling passes, in milliseconds. 0 busy-polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on a sampling session, in seconds. Unbounded when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// The model's static directory holding the footprint files.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Where sampling sessions persist their samples and stop markers.
    #[serde(default = "default_session_dir")]
    pub session_dir: PathBuf,

    /// Number of `eve | modelpy` partitions to run side by side.
    #[serde(default = "default_partitions")]
    pub partitions: u32,

    /// Footprint formats compared by `modelbench formats`.
    #[serde(default = "default_formats")]
    pub formats: Vec<FootprintFormat>,

    /// Leave session artifacts on disk after reporting.
    #[serde(default)]
    pub keep_samples: bool,
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_session_dir() -> PathBuf {
    PathBuf::from("./.modelbench")
}

fn default_partitions() -> u32 {
    4
}

fn default_formats() -> Vec<FootprintFormat> {
    vec![FootprintFormat::Binary, FootprintFormat::Parquet]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: None,
            static_dir: default_static_dir(),
            session_dir: default_session_dir(),
            partitions: default_partitions(),
            formats: default_formats(),
            keep_samples: false,
        }
    }
}

impl Config {
    pub fn sampler_options(&self) -> SamplerOptions {
        SamplerOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

// ============================================================================
// Config Validation
// ============================================================================

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one partition is needed to run a model.
    ZeroPartitions,
    /// A zero timeout would stop every session after its first pass.
    ZeroTimeout,
    /// `modelbench formats` has nothing to compare.
    NoFormats,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroPartitions => write!(f, "`partitions` must be at least 1"),
            ConfigError::ZeroTimeout => write!(
                f,
                "`timeout_secs` must be greater than 0. Remove it to sample without a timeout"
            ),
            ConfigError::NoFormats => write!(f, "`formats` must list at least one format"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate a configuration for logical consistency.
///
/// ```
/// use modelbench::config::{Config, validate_config};
///
/// assert!(validate_config(&Config::default()).is_ok());
///
/// let invalid = Config { partitions: 0, ..Default::default() };
/// assert!(validate_config(&invalid).is_err());
/// ```
pub fn validate_config(config: &Config) -> std::result::Result<(), ConfigError> {
    if config.partitions == 0 {
        return Err(ConfigError::ZeroPartitions);
    }
    if config.timeout_secs == Some(0) {
        return Err(ConfigError::ZeroTimeout);
    }
    if config.formats.is_empty() {
        return Err(ConfigError::NoFormats);
    }
    Ok(())
}

// ============================================================================
// Config File Management
// ============================================================================

/// Get the modelbench config directory path (~/.config/modelbench/).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ModelbenchError::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR_NAME))
}

/// Get the path to the global config file.
pub fn global_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(GLOBAL_CONFIG_FILENAME))
}

/// Path of the working-directory override file.
pub fn local_config_path() -> PathBuf {
    PathBuf::from(LOCAL_CONFIG_FILENAME)
}

/// Load the global configuration, creating it with commented defaults if missing.
pub fn load_global_config() -> Result<Config> {
    load_or_create_at(&global_config_path()?)
}

/// Save the global configuration, overwriting any user comments.
pub fn save_global_config(config: &Config) -> Result<()> {
    save_at(&global_config_path()?, config)
}

/// Write `config` to `./modelbench.toml`, overriding the global config here.
pub fn save_local_config(config: &Config) -> Result<()> {
    save_at(&local_config_path(), config)
}

/// Load the configuration commands should run with, without validating it.
///
/// `./modelbench.toml` wins when present; otherwise the global config is
/// used. Commands that apply CLI overrides validate after applying them.
pub fn load_effective_config() -> Result<Config> {
    let local = local_config_path();
    if local.exists() {
        load_at(&local)
    } else {
        load_global_config()
    }
}

/// Same as [`load_effective_config`], validated.
pub fn get_effective_config() -> Result<Config> {
    let config = load_effective_config()?;
    validate_config(&config).map_err(|e| ModelbenchError::Config(e.to_string()))?;
    Ok(config)
}

fn load_at(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        ModelbenchError::Config(format!("Failed to parse config file at {:?}: {}", path, e))
    })
}

fn load_or_create_at(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        save_at(path, &config)?;
        return Ok(config);
    }
    load_at(path)
}

fn save_at(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, generate_config_with_comments(config))?;
    Ok(())
}

/// Generate config file content with explanatory comments.
fn generate_config_with_comments(config: &Config) -> String {
    let timeout = match config.timeout_secs {
        Some(secs) => format!("timeout_secs = {}", secs),
        None => "# timeout_secs = 3600".to_string(),
    };
    let formats: Vec<String> = config
        .formats
        .iter()
        .map(|f| format!("\"{}\"", toml_format_name(*f)))
        .collect();

    format!(
        r#"# modelbench configuration

# Delay between memory sampling passes in milliseconds
# - 0 polls continuously and keeps one core busy while sampling
poll_interval_ms = {}

# Stop sampling after this many seconds even if the model never finishes
# Leave commented out to sample until the model processes exit
{}

# Model static directory holding the footprint files
static_dir = {:?}

# Where sampling sessions write their samples and stop markers
session_dir = {:?}

# Number of eve/modelpy partitions run side by side
partitions = {}

# Footprint formats compared by `modelbench formats`
# - one of: "binary", "compressed-binary", "csv", "parquet"
formats = [{}]

# Keep session samples on disk after the report is printed
keep_samples = {}
"#,
        config.poll_interval_ms,
        timeout,
        config.static_dir.display().to_string(),
        config.session_dir.display().to_string(),
        config.partitions,
        formats.join(", "),
        config.keep_samples
    )
}

fn toml_format_name(format: FootprintFormat) -> &'static str {
    match format {
        FootprintFormat::Binary => "binary",
        FootprintFormat::CompressedBinary => "compressed-binary",
        FootprintFormat::Csv => "csv",
        FootprintFormat::Parquet => "parquet",
    }
}
