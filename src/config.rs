// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylink Contributors

//! # Aggregator Configuration
//!
//! Configuration is loaded from the environment once, at client
//! construction, and is immutable afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AGGREGATOR_URL` | Base URL of the remote aggregator | Required |
//! | `NGN_PROVIDER_ID` | Provider id quoted for every currency except KES | Required |
//! | `KES_PROVIDER_ID` | Provider id quoted for KES | Required |
//! | `AGGREGATOR_TIMEOUT_SECS` | Per-request transport timeout | `15` |

use std::time::Duration;

use crate::error::AggregatorError;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Immutable aggregator settings, fixed at process start.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Base URL of the aggregator, without a trailing slash.
    pub base_url: String,
    /// Provider id used for every settlement currency except KES.
    pub ngn_provider_id: String,
    /// Provider id used for KES settlement.
    pub kes_provider_id: String,
    /// Transport-level timeout applied to every request.
    pub timeout: Duration,
}

impl AggregatorConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, AggregatorError> {
        let base_url = env_required("AGGREGATOR_URL")?;
        let ngn_provider_id = env_required("NGN_PROVIDER_ID")?;
        let kes_provider_id = env_required("KES_PROVIDER_ID")?;
        let timeout_secs = env_or_default(
            "AGGREGATOR_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|_| {
            AggregatorError::MissingConfig(
                "AGGREGATOR_TIMEOUT_SECS must be a positive integer".to_string(),
            )
        })?;

        Ok(Self::new(
            base_url,
            ngn_provider_id,
            kes_provider_id,
            Duration::from_secs(timeout_secs),
        ))
    }

    /// Build a configuration from explicit values. Used directly by tests
    /// pointing at a local mock aggregator.
    pub fn new(
        base_url: impl Into<String>,
        ngn_provider_id: impl Into<String>,
        kes_provider_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            ngn_provider_id: ngn_provider_id.into(),
            kes_provider_id: kes_provider_id.into(),
            timeout,
        }
    }

    /// Resolve the provider id for a settlement currency.
    ///
    /// Fixed lookup, not a policy: `KES` maps to the KES provider, every
    /// other currency maps to the default (NGN) provider. Exactly one id is
    /// selected per request.
    pub fn provider_for_currency(&self, currency: &str) -> &str {
        if currency.eq_ignore_ascii_case("KES") {
            &self.kes_provider_id
        } else {
            &self.ngn_provider_id
        }
    }
}

fn env_required(name: &str) -> Result<String, AggregatorError> {
    env_optional(name).ok_or_else(|| AggregatorError::MissingConfig(name.to_string()))
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}
