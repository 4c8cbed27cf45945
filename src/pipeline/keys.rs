// file: src/pipeline/keys.rs
// description: eligibility and destination naming for storage object keys
// reference: input/output prefix mirroring with an idempotence guard

use crate::config::{PipelineConfig, UnprefixedKeyPolicy};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotCsv,
    AlreadyRedacted,
    OutsideInputPrefix,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotCsv => write!(f, "object key does not have the csv suffix"),
            SkipReason::AlreadyRedacted => write!(f, "object already lies under the output prefix"),
            SkipReason::OutsideInputPrefix => {
                write!(f, "object key does not start with the input prefix")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Eligible { destination: String },
    Skip(SkipReason),
}

#[derive(Debug, Clone)]
pub struct KeyRouter {
    csv_suffix: String,
    input_prefix: String,
    output_prefix: String,
    unprefixed: UnprefixedKeyPolicy,
}

impl KeyRouter {
    pub fn new(
        csv_suffix: impl Into<String>,
        input_prefix: impl Into<String>,
        output_prefix: impl Into<String>,
        unprefixed: UnprefixedKeyPolicy,
    ) -> Self {
        Self {
            csv_suffix: csv_suffix.into(),
            input_prefix: input_prefix.into(),
            output_prefix: output_prefix.into(),
            unprefixed,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.csv_suffix.clone(),
            config.input_prefix.clone(),
            config.output_prefix.clone(),
            config.unprefixed_keys,
        )
    }

    /// Output-prefixed keys are never eligible, so a redacted copy cannot re-trigger itself.
    pub fn route(&self, key: &str) -> Route {
        if key.starts_with(&self.output_prefix) {
            return Route::Skip(SkipReason::AlreadyRedacted);
        }

        if !key.ends_with(&self.csv_suffix) {
            return Route::Skip(SkipReason::NotCsv);
        }

        match self.destination_key(key) {
            Some(destination) => Route::Eligible { destination },
            None => Route::Skip(SkipReason::OutsideInputPrefix),
        }
    }

    pub fn destination_key(&self, key: &str) -> Option<String> {
        if !self.input_prefix.is_empty()
            && let Some(rest) = key.strip_prefix(&self.input_prefix)
        {
            return Some(format!("{}{}", self.output_prefix, rest));
        }

        match (self.input_prefix.is_empty(), self.unprefixed) {
            (true, _) | (false, UnprefixedKeyPolicy::Prepend) => {
                Some(format!("{}{}", self.output_prefix, key))
            }
            (false, UnprefixedKeyPolicy::Skip) => None,
        }
    }
}
