//! Domain types and validators for autoship configuration.
//!
//! Pure functions only; no I/O, no async, no filesystem access.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "AUTOSHIP_CONFIG";

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "aws.region",
    "aws.ami",
    "aws.ssh_user",
    "deploy.reachability_delay_secs",
    "deploy.connect_timeout_secs",
    "deploy.command_timeout_secs",
    "deploy.lock_poll_interval_secs",
    "deploy.lock_max_attempts",
    "terraform.binary",
    "terraform.apply_timeout_secs",
    "classifier.endpoint",
    "classifier.model",
    "classifier.api_key_env",
];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.autoship/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AutoshipConfig {
    pub aws: AwsConfig,
    pub deploy: DeploySettings,
    pub terraform: TerraformConfig,
    pub classifier: ClassifierConfig,
}

/// Cloud account settings for the AWS provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,
    /// Ubuntu image the instance boots from. Must exist in `region`.
    pub ami: String,
    /// Login user baked into the image.
    pub ssh_user: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            ami: "ami-08c40ec9ead489470".to_string(),
            ssh_user: "ubuntu".to_string(),
        }
    }
}

/// Timing and retry bounds of the remote deployer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    /// Flat wait before the single connection attempt.
    pub reachability_delay_secs: u64,
    pub connect_timeout_secs: u64,
    /// Upper bound for any single remote command.
    pub command_timeout_secs: u64,
    pub lock_poll_interval_secs: u64,
    pub lock_max_attempts: u32,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            reachability_delay_secs: 30,
            connect_timeout_secs: 30,
            command_timeout_secs: 900,
            lock_poll_interval_secs: 5,
            lock_max_attempts: 24,
        }
    }
}

/// Provisioning tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    pub binary: String,
    pub apply_timeout_secs: u64,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: "terraform".to_string(),
            apply_timeout_secs: 1800,
        }
    }
}

/// Chat-completions endpoint used for intent and structure classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key. When that
    /// variable is unset, the offline classifiers are used.
    pub api_key_env: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let mut scratch = AutoshipConfig::default();
    set_config_value(&mut scratch, key, value)
}

/// Assigns `value` to the setting named by `key`.
///
/// # Errors
///
/// Returns an error for unknown keys, values of the wrong type, or empty
/// strings.
pub fn set_config_value(config: &mut AutoshipConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "aws.region" => config.aws.region = non_empty(key, value)?,
        "aws.ami" => {
            if !value.starts_with("ami-") {
                return Err(invalid(key, value, "an AMI id such as ami-0123456789abcdef0"));
            }
            config.aws.ami = value.to_string();
        }
        "aws.ssh_user" => config.aws.ssh_user = non_empty(key, value)?,
        "deploy.reachability_delay_secs" => {
            config.deploy.reachability_delay_secs = parse_number(key, value)?;
        }
        "deploy.connect_timeout_secs" => {
            config.deploy.connect_timeout_secs = positive(key, value)?;
        }
        "deploy.command_timeout_secs" => {
            config.deploy.command_timeout_secs = positive(key, value)?;
        }
        "deploy.lock_poll_interval_secs" => {
            config.deploy.lock_poll_interval_secs = parse_number(key, value)?;
        }
        "deploy.lock_max_attempts" => {
            let attempts: u32 = parse_number(key, value)?;
            if attempts == 0 {
                return Err(invalid(key, value, "a positive integer"));
            }
            config.deploy.lock_max_attempts = attempts;
        }
        "terraform.binary" => config.terraform.binary = non_empty(key, value)?,
        "terraform.apply_timeout_secs" => {
            config.terraform.apply_timeout_secs = positive(key, value)?;
        }
        "classifier.endpoint" => {
            if !(value.starts_with("https://") || value.starts_with("http://")) {
                return Err(invalid(key, value, "an http(s) URL"));
            }
            config.classifier.endpoint = value.to_string();
        }
        "classifier.model" => config.classifier.model = non_empty(key, value)?,
        "classifier.api_key_env" => config.classifier.api_key_env = non_empty(key, value)?,
        _ => {
            return Err(ConfigError::UnknownKey {
                key: key.to_string(),
                valid: VALID_CONFIG_KEYS.join(", "),
            }
            .into());
        }
    }
    Ok(())
}

/// Current value of the setting named by `key`, formatted for display.
#[must_use]
pub fn config_value(config: &AutoshipConfig, key: &str) -> Option<String> {
    let value = match key {
        "aws.region" => config.aws.region.clone(),
        "aws.ami" => config.aws.ami.clone(),
        "aws.ssh_user" => config.aws.ssh_user.clone(),
        "deploy.reachability_delay_secs" => config.deploy.reachability_delay_secs.to_string(),
        "deploy.connect_timeout_secs" => config.deploy.connect_timeout_secs.to_string(),
        "deploy.command_timeout_secs" => config.deploy.command_timeout_secs.to_string(),
        "deploy.lock_poll_interval_secs" => config.deploy.lock_poll_interval_secs.to_string(),
        "deploy.lock_max_attempts" => config.deploy.lock_max_attempts.to_string(),
        "terraform.binary" => config.terraform.binary.clone(),
        "terraform.apply_timeout_secs" => config.terraform.apply_timeout_secs.to_string(),
        "classifier.endpoint" => config.classifier.endpoint.clone(),
        "classifier.model" => config.classifier.model.clone(),
        "classifier.api_key_env" => config.classifier.api_key_env.clone(),
        _ => return None,
    };
    Some(value)
}

fn invalid(key: &str, value: &str, expected: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .into()
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(key, value, "a non-empty string"));
    }
    Ok(trimmed.to_string())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value, "a non-negative integer"))
}

fn positive(key: &str, value: &str) -> Result<u64> {
    match parse_number::<u64>(key, value)? {
        0 => Err(invalid(key, value, "a positive integer")),
        n => Ok(n),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
