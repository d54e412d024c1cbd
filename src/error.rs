// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylink Contributors

//! Error taxonomy for aggregator calls.
//!
//! The client never recovers failures locally: every variant here is logged
//! at the call site and propagated to the caller. The single exception is a
//! `404` on the linked-address lookup, which is not an error at all and is
//! mapped to [`crate::models::LinkedAddressLookup::NotLinked`] before this
//! type ever comes into play.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// Required configuration was missing or empty at construction time.
    #[error("aggregator configuration missing: {0}")]
    MissingConfig(String),

    /// The caller supplied an argument the client refuses to send.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A bearer token was required but absent or blank. Raised locally,
    /// before any network I/O.
    #[error("authentication required: {0}")]
    Auth(String),

    /// The aggregator answered with a non-2xx status.
    #[error("aggregator returned {status}: {body}")]
    Remote { status: StatusCode, body: String },

    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("aggregator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The aggregator answered 2xx but the body was not what we expected.
    #[error("aggregator response was invalid: {0}")]
    InvalidResponse(String),
}

impl AggregatorError {
    /// HTTP status of a [`AggregatorError::Remote`] failure, if that is what
    /// this is. Lets callers branch on conflict/validation responses without
    /// string matching.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AggregatorError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_remote_failures_only() {
        let remote = AggregatorError::Remote {
            status: StatusCode::CONFLICT,
            body: "address already linked".to_string(),
        };
        assert_eq!(remote.status(), Some(StatusCode::CONFLICT));

        let auth = AggregatorError::Auth("no bearer token".to_string());
        assert_eq!(auth.status(), None);
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = AggregatorError::Remote {
            status: StatusCode::BAD_REQUEST,
            body: "unsupported institution".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("400"));
        assert!(rendered.contains("unsupported institution"));
    }
}
