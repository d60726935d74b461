use std::{fs, path::Path, time::Duration};

use agent_tracing::LoggerSettings;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Demo account baked into the sandbox node image.
pub const DEMO_PUBLIC_KEY: &str = "B62qrPN5Y5yq8kGE3FbVKbGTdTAJNdtNtB5sNVpxyRwWGcDEhpMzc8g";
pub const DEMO_PASSWORD: &str = "naughty blue worm";
pub const DEFAULT_RECEIVER: &str = "B62qqJ1AqK3YQmEEALdJeMw49438Sh6zuQ5cNWUYfCgRsPkduFE2uLU";
/// Token id of the native currency.
pub const DEFAULT_TOKEN_ID: u64 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Payment {field} {value} does not fit a signed 64-bit amount")]
    AmountOutOfRange { field: &'static str, value: u64 },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub payment: PaymentSettings,
    #[serde(default)]
    pub scenario: ScenarioSettings,
    #[serde(default)]
    pub logging: LoggerSettings,
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        config.payment.signed_amounts()?;
        Ok(config)
    }
}

/// The payment the scenario submits and then looks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettings {
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_receiver")]
    pub receiver: String,
    /// Nanomina.
    #[serde(default = "default_fee")]
    pub fee: u64,
    /// Nanomina.
    #[serde(default = "default_amount")]
    pub amount: u64,
    #[serde(default = "default_token_id")]
    pub token_id: u64,
    #[serde(default)]
    pub memo: Option<String>,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            sender: default_sender(),
            password: default_password(),
            receiver: default_receiver(),
            fee: default_fee(),
            amount: default_amount(),
            token_id: default_token_id(),
            memo: None,
        }
    }
}

fn default_sender() -> String {
    DEMO_PUBLIC_KEY.to_owned()
}

fn default_password() -> String {
    DEMO_PASSWORD.to_owned()
}

fn default_receiver() -> String {
    DEFAULT_RECEIVER.to_owned()
}

impl PaymentSettings {
    /// Fee and amount as the signed values Rosetta reports them in.
    pub fn signed_amounts(&self) -> Result<(i64, i64), ConfigError> {
        let signed = |field: &'static str, value: u64| {
            i64::try_from(value).map_err(|_| ConfigError::AmountOutOfRange { field, value })
        };
        Ok((signed("fee", self.fee)?, signed("amount", self.amount)?))
    }
}

const fn default_fee() -> u64 {
    2_000_000_000
}

const fn default_amount() -> u64 {
    5_000_000_000
}

const fn default_token_id() -> u64 {
    DEFAULT_TOKEN_ID
}

/// Polling budgets for each waiting step.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSettings {
    #[serde(default = "default_sync_policy")]
    pub sync: RetryPolicy,
    #[serde(default = "default_mempool_policy")]
    pub mempool: RetryPolicy,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_settle_delay", rename = "settle_delay_ms")]
    pub settle_delay: Duration,
    /// Follow the payment into a block after the mempool checks.
    #[serde(default)]
    pub block_inclusion: bool,
    #[serde(default = "default_block_policy")]
    pub block: RetryPolicy,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            sync: default_sync_policy(),
            mempool: default_mempool_policy(),
            settle_delay: default_settle_delay(),
            block_inclusion: false,
            block: default_block_policy(),
        }
    }
}

const fn default_sync_policy() -> RetryPolicy {
    RetryPolicy::new(45, Duration::from_secs(2), Duration::from_secs(2))
}

const fn default_mempool_policy() -> RetryPolicy {
    RetryPolicy::new(5, Duration::from_millis(100), Duration::from_secs(1))
}

const fn default_settle_delay() -> Duration {
    Duration::from_secs(2)
}

const fn default_block_policy() -> RetryPolicy {
    RetryPolicy::new(90, Duration::ZERO, Duration::from_secs(2))
}
