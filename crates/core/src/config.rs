use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::change::ChangeType;

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["changeorder.toml", "config/changeorder.toml"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub wizard: WizardConfig,
    pub drafts: DraftStoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardConfig {
    pub product_grid_enabled: bool,
    /// Running inside a host flow that expects a continue signal instead of navigation.
    pub embedded_in_host: bool,
    pub max_opportunities: usize,
    pub line_item_change_types: Vec<ChangeType>,
    pub price_change_warning_pct: u32,
    pub header_text: String,
}

impl WizardConfig {
    pub fn submit_label(&self) -> &'static str {
        if self.embedded_in_host {
            "Create & Continue"
        } else {
            "Create Change Order"
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            product_grid_enabled: true,
            embedded_in_host: false,
            max_opportunities: 10,
            line_item_change_types: vec![ChangeType::ChangeProduct, ChangeType::ChangePrice],
            price_change_warning_pct: 25,
            header_text: "Change Order Wizard".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftStoreConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub drafts_url: Option<String>,
    pub log_level: Option<String>,
    pub product_grid_enabled: Option<bool>,
    pub embedded_in_host: Option<bool>,
    pub max_opportunities: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wizard: WizardConfig::default(),
            drafts: DraftStoreConfig {
                url: "sqlite://changeorder-drafts.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(wizard) = patch.wizard {
            if let Some(product_grid_enabled) = wizard.product_grid_enabled {
                self.wizard.product_grid_enabled = product_grid_enabled;
            }
            if let Some(embedded_in_host) = wizard.embedded_in_host {
                self.wizard.embedded_in_host = embedded_in_host;
            }
            if let Some(max_opportunities) = wizard.max_opportunities {
                self.wizard.max_opportunities = max_opportunities;
            }
            if let Some(line_item_change_types) = wizard.line_item_change_types {
                self.wizard.line_item_change_types = line_item_change_types;
            }
            if let Some(price_change_warning_pct) = wizard.price_change_warning_pct {
                self.wizard.price_change_warning_pct = price_change_warning_pct;
            }
            if let Some(header_text) = wizard.header_text {
                self.wizard.header_text = header_text;
            }
        }

        if let Some(drafts) = patch.drafts {
            if let Some(url) = drafts.url {
                self.drafts.url = url;
            }
            if let Some(max_connections) = drafts.max_connections {
                self.drafts.max_connections = max_connections;
            }
            if let Some(timeout_secs) = drafts.timeout_secs {
                self.drafts.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CHANGEORDER_PRODUCT_GRID_ENABLED") {
            self.wizard.product_grid_enabled =
                parse_bool("CHANGEORDER_PRODUCT_GRID_ENABLED", &value)?;
        }
        if let Some(value) = read_env("CHANGEORDER_EMBEDDED_IN_HOST") {
            self.wizard.embedded_in_host = parse_bool("CHANGEORDER_EMBEDDED_IN_HOST", &value)?;
        }
        if let Some(value) = read_env("CHANGEORDER_MAX_OPPORTUNITIES") {
            self.wizard.max_opportunities = parse_usize("CHANGEORDER_MAX_OPPORTUNITIES", &value)?;
        }
        if let Some(value) = read_env("CHANGEORDER_LINE_ITEM_CHANGE_TYPES") {
            self.wizard.line_item_change_types =
                parse_change_types("CHANGEORDER_LINE_ITEM_CHANGE_TYPES", &value)?;
        }
        if let Some(value) = read_env("CHANGEORDER_PRICE_CHANGE_WARNING_PCT") {
            self.wizard.price_change_warning_pct =
                parse_u32("CHANGEORDER_PRICE_CHANGE_WARNING_PCT", &value)?;
        }
        if let Some(value) = read_env("CHANGEORDER_HEADER_TEXT") {
            self.wizard.header_text = value;
        }

        if let Some(value) = read_env("CHANGEORDER_DRAFTS_URL") {
            self.drafts.url = value;
        }
        if let Some(value) = read_env("CHANGEORDER_DRAFTS_MAX_CONNECTIONS") {
            self.drafts.max_connections = parse_u32("CHANGEORDER_DRAFTS_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CHANGEORDER_DRAFTS_TIMEOUT_SECS") {
            self.drafts.timeout_secs = parse_u64("CHANGEORDER_DRAFTS_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("CHANGEORDER_LOGGING_LEVEL").or_else(|| read_env("CHANGEORDER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CHANGEORDER_LOGGING_FORMAT").or_else(|| read_env("CHANGEORDER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(drafts_url) = overrides.drafts_url {
            self.drafts.url = drafts_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(product_grid_enabled) = overrides.product_grid_enabled {
            self.wizard.product_grid_enabled = product_grid_enabled;
        }
        if let Some(embedded_in_host) = overrides.embedded_in_host {
            self.wizard.embedded_in_host = embedded_in_host;
        }
        if let Some(max_opportunities) = overrides.max_opportunities {
            self.wizard.max_opportunities = max_opportunities;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_wizard(&self.wizard)?;
        validate_drafts(&self.drafts)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_wizard(wizard: &WizardConfig) -> Result<(), ConfigError> {
    if wizard.max_opportunities == 0 {
        return Err(ConfigError::Validation(
            "wizard.max_opportunities must be greater than zero".to_string(),
        ));
    }

    if wizard.line_item_change_types.is_empty() {
        return Err(ConfigError::Validation(
            "wizard.line_item_change_types must name at least one change type (e.g. `changeProduct`)"
                .to_string(),
        ));
    }

    if wizard.price_change_warning_pct == 0 || wizard.price_change_warning_pct > 1000 {
        return Err(ConfigError::Validation(
            "wizard.price_change_warning_pct must be in range 1..=1000".to_string(),
        ));
    }

    if wizard.header_text.trim().is_empty() {
        return Err(ConfigError::Validation("wizard.header_text must not be blank".to_string()));
    }

    Ok(())
}

fn validate_drafts(drafts: &DraftStoreConfig) -> Result<(), ConfigError> {
    let url = drafts.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "drafts.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if drafts.max_connections == 0 {
        return Err(ConfigError::Validation(
            "drafts.max_connections must be greater than zero".to_string(),
        ));
    }

    if drafts.timeout_secs == 0 || drafts.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "drafts.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| invalid(key, value))
}

fn parse_change_types(key: &str, value: &str) -> Result<Vec<ChangeType>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<ChangeType>().map_err(|_| invalid(key, value)))
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    wizard: Option<WizardPatch>,
    drafts: Option<DraftsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WizardPatch {
    product_grid_enabled: Option<bool>,
    embedded_in_host: Option<bool>,
    max_opportunities: Option<usize>,
    line_item_change_types: Option<Vec<ChangeType>>,
    price_change_warning_pct: Option<u32>,
    header_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DraftsPatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
