use crate::domain::money::{Currency, RoundingMode, RoundingPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "selforder.toml";
pub const ENV_PREFIX: &str = "SELFORDER_";

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub payment: PaymentConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub currency: Currency,
    pub minor_units: u32,
    pub rounding: RoundingMode,
}

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    /// Merchant identifier embedded in QR payment payloads.
    pub merchant_id: String,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub mode: AgentMode,
    pub name: String,
    pub model: String,
    pub description: String,
    pub instruction: String,
    pub max_tool_rounds: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    Hosted,
    Local,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for PricingConfig {
    fn default() -> Self {
        let policy = RoundingPolicy::default();
        Self {
            currency: Currency::default(),
            minor_units: policy.minor_units,
            rounding: policy.mode,
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            merchant_id: "SELFORDER".to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::Hosted,
            name: "self_order_agent".to_string(),
            model: "gemini-2.5-flash".to_string(),
            description: "A helpful assistant for self-ordering food.".to_string(),
            instruction: "Help customers browse the menu, apply promotions, place orders and \
                          pay. Greet them warmly, ask for their name, and use their order \
                          history to personalize suggestions."
                .to_string(),
            max_tool_rounds: 8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl std::str::FromStr for AgentMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(Self::Hosted),
            "local" => Ok(Self::Local),
            other => Err(ConfigError::Validation(format!(
                "unsupported agent mode `{other}` (expected hosted|local)"
            ))),
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

impl PricingConfig {
    pub fn rounding_policy(&self) -> RoundingPolicy {
        RoundingPolicy {
            minor_units: self.minor_units,
            mode: self.rounding,
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `SELFORDER_*` environment variables.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document on top of the defaults, ignoring the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let patch: ConfigPatch = toml::from_str(raw).map_err(|source| ConfigError::ParseFile {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let mut config = Self::default();
        config.apply_patch(patch)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(pricing) = patch.pricing {
            if let Some(currency) = pricing.currency {
                self.pricing.currency = parse_currency(&currency)?;
            }
            if let Some(minor_units) = pricing.minor_units {
                self.pricing.minor_units = minor_units;
            }
            if let Some(rounding) = pricing.rounding {
                self.pricing.rounding = rounding;
            }
        }

        if let Some(payment) = patch.payment
            && let Some(merchant_id) = payment.merchant_id
        {
            self.payment.merchant_id = merchant_id;
        }

        if let Some(agent) = patch.agent {
            if let Some(mode) = agent.mode {
                self.agent.mode = mode;
            }
            if let Some(name) = agent.name {
                self.agent.name = name;
            }
            if let Some(model) = agent.model {
                self.agent.model = model;
            }
            if let Some(description) = agent.description {
                self.agent.description = description;
            }
            if let Some(instruction) = agent.instruction {
                self.agent.instruction = instruction;
            }
            if let Some(max_tool_rounds) = agent.max_tool_rounds {
                self.agent.max_tool_rounds = max_tool_rounds;
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

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CURRENCY") {
            self.pricing.currency = parse_currency(&value)?;
        }
        if let Some(value) = read_env("MINOR_UNITS") {
            self.pricing.minor_units = value.parse().map_err(|_| invalid_env("MINOR_UNITS", &value))?;
        }
        if let Some(value) = read_env("ROUNDING") {
            self.pricing.rounding = value.parse().map_err(|_| invalid_env("ROUNDING", &value))?;
        }
        if let Some(value) = read_env("MERCHANT_ID") {
            self.payment.merchant_id = value;
        }
        if let Some(value) = read_env("AGENT_MODE") {
            self.agent.mode = value.parse()?;
        }
        if let Some(value) = read_env("FORCE_LOCAL_AGENT")
            && parse_bool("FORCE_LOCAL_AGENT", &value)?
        {
            self.agent.mode = AgentMode::Local;
        }
        if let Some(value) = read_env("AGENT_MAX_TOOL_ROUNDS") {
            self.agent.max_tool_rounds = value
                .parse()
                .map_err(|_| invalid_env("AGENT_MAX_TOOL_ROUNDS", &value))?;
        }
        if let Some(value) = read_env("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pricing.minor_units > 6 {
            return Err(ConfigError::Validation(format!(
                "pricing.minor_units must be at most 6, got {}",
                self.pricing.minor_units
            )));
        }
        if self.payment.merchant_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "payment.merchant_id must not be empty".to_string(),
            ));
        }
        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::Validation(
                "agent.max_tool_rounds must be at least 1".to_string(),
            ));
        }
        let level = self.logging.level.trim().to_ascii_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unsupported log level `{}`",
                self.logging.level
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    payment: Option<PaymentPatch>,
    agent: Option<AgentPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PricingPatch {
    currency: Option<String>,
    minor_units: Option<u32>,
    rounding: Option<RoundingMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PaymentPatch {
    merchant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentPatch {
    mode: Option<AgentMode>,
    name: Option<String>,
    model: Option<String>,
    description: Option<String>,
    instruction: Option<String>,
    max_tool_rounds: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

fn read_env(suffix: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{suffix}"))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid_env(suffix: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride {
        key: format!("{ENV_PREFIX}{suffix}"),
        value: value.to_string(),
    }
}

fn parse_bool(suffix: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_env(suffix, value)),
    }
}

fn parse_currency(value: &str) -> Result<Currency, ConfigError> {
    Currency::new(value).map_err(|e| ConfigError::Validation(e.to_string()))
}
