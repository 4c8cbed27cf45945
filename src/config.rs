// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "PII_SCRUB";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub oracle: OracleConfig,
    pub throttle: ThrottleConfig,
    pub retry: RetryConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub has_header: bool,
    pub allow_ragged_rows: bool,
    pub csv_suffix: String,
    pub input_prefix: String,
    pub output_prefix: String,
    #[serde(default)]
    pub unprefixed_keys: UnprefixedKeyPolicy,
    pub parallel_documents: usize,
    pub max_object_size_mb: usize,
    #[serde(default)]
    pub invocation_timeout_secs: Option<u64>,
}

/// What to do with an eligible key that does not start with the input prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnprefixedKeyPolicy {
    /// Destination is the output prefix followed by the full source key.
    #[default]
    Prepend,
    Skip,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
    pub endpoint: String,
    pub region: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThrottleConfig {
    pub inter_call_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl PipelineConfig {
    pub fn batch_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.batch_size).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn max_object_bytes(&self) -> u64 {
        (self.max_object_size_mb as u64) * 1_048_576
    }

    pub fn invocation_timeout(&self) -> Option<Duration> {
        self.invocation_timeout_secs.map(Duration::from_secs)
    }
}

impl OracleConfig {
    /// Endpoint with the `{region}` placeholder filled in.
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint.replace("{region}", &self.region)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ThrottleConfig {
    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Config {
    /// Layers built-in defaults, the TOML file and `PII_SCRUB__*` variables, in that order.
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        match path {
            Some(path) => Self::from_sources(path, true, None),
            None => Self::from_sources(Path::new(DEFAULT_CONFIG_PATH), false, None),
        }
    }

    fn from_sources(
        path: &Path,
        required: bool,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            pipeline: PipelineConfig {
                batch_size: 20,
                has_header: true,
                allow_ragged_rows: false,
                csv_suffix: ".csv".to_string(),
                input_prefix: "incoming/".to_string(),
                output_prefix: "masked/".to_string(),
                unprefixed_keys: UnprefixedKeyPolicy::Prepend,
                parallel_documents: 1,
                max_object_size_mb: 50,
                invocation_timeout_secs: None,
            },
            oracle: OracleConfig {
                endpoint: "https://bedrock-runtime.{region}.amazonaws.com/openai/v1/chat/completions"
                    .to_string(),
                region: "us-east-1".to_string(),
                model: "openai.gpt-oss-120b-1:0".to_string(),
                api_key: None,
                max_tokens: 4096,
                timeout_secs: 60,
            },
            throttle: ThrottleConfig {
                inter_call_delay_ms: 500,
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 500,
                max_delay_ms: 8_000,
            },
            storage: StorageConfig {
                root: PathBuf::from("./data/buckets"),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        Validator::validate_batch_size(self.pipeline.batch_size)?;

        if self.pipeline.parallel_documents == 0 {
            return Err(PipelineError::Config(
                "parallel_documents must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.output_prefix.is_empty() {
            return Err(PipelineError::Config(
                "output_prefix must not be empty".to_string(),
            ));
        }

        if self.pipeline.input_prefix == self.pipeline.output_prefix {
            return Err(PipelineError::Config(
                "input_prefix and output_prefix must differ".to_string(),
            ));
        }

        if !self.pipeline.input_prefix.is_empty()
            && self
                .pipeline
                .input_prefix
                .starts_with(&self.pipeline.output_prefix)
        {
            return Err(PipelineError::Config(format!(
                "input_prefix {} lies under output_prefix {}",
                self.pipeline.input_prefix, self.pipeline.output_prefix
            )));
        }

        if self.oracle.max_tokens == 0 {
            return Err(PipelineError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.oracle.timeout_secs == 0 {
            return Err(PipelineError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_delay_ms == 0 {
            return Err(PipelineError::Config(
                "max_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(PipelineError::Config(format!(
                "max_delay_ms ({}) must not be below base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }

        Validator::validate_url(&self.oracle.resolved_endpoint())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(())
    }
}
