// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylink Contributors

//! Remote aggregator client.
//!
//! Each method translates one domain operation into exactly one HTTP round
//! trip and normalizes the result. There is no caching, no retry and no
//! local business logic here; the one nontrivial branch is the 404-as-absence
//! mapping on [`AggregatorClient::get_linked_address`], which callers rely on
//! to tell "confirmed not linked" apart from "status unknown".

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{
    config::AggregatorConfig,
    error::AggregatorError,
    models::{
        ApiEnvelope, Institution, LinkAddressRequest, LinkedAddress, LinkedAddressLookup,
        RateQuote, TransactionFilters, TransactionPage, VerifyAccountRequest,
    },
    workflow::LinkedAddressApi,
};

/// Stateless client for the remote aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    config: AggregatorConfig,
    http: Client,
}

impl AggregatorClient {
    /// Build a client from explicit configuration.
    pub fn new(config: AggregatorConfig) -> Result<Self, AggregatorError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Build a client from the environment (see [`AggregatorConfig::from_env`]).
    pub fn from_env() -> Result<Self, AggregatorError> {
        Self::new(AggregatorConfig::from_env()?)
    }

    /// List the institutions serviced for one settlement currency.
    pub async fn list_institutions(
        &self,
        currency: &str,
    ) -> Result<Vec<Institution>, AggregatorError> {
        let currency = currency.trim();
        if currency.is_empty() {
            return Err(AggregatorError::InvalidRequest(
                "currency must not be empty".to_string(),
            ));
        }

        let url = format!("{}/institutions/{currency}", self.config.base_url);
        let response = self.http.get(&url).send().await.map_err(|e| {
            warn!(currency, error = %e, "Failed to fetch supported institutions");
            AggregatorError::from(e)
        })?;
        self.read_envelope("list_institutions", response).await
    }

    /// Resolve an account number to its holder's name.
    pub async fn verify_account(
        &self,
        payload: &VerifyAccountRequest,
    ) -> Result<String, AggregatorError> {
        let url = format!("{}/verify-account", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(institution = %payload.institution, error = %e, "Failed to verify account");
                AggregatorError::from(e)
            })?;
        self.read_envelope("verify_account", response).await
    }

    /// Fetch a rate quote for settling `amount` of `token` into `currency`.
    ///
    /// The provider id is resolved locally from the currency table and sent
    /// as a query parameter, never as part of the path.
    pub async fn fetch_rate(
        &self,
        token: &str,
        amount: f64,
        currency: &str,
    ) -> Result<RateQuote, AggregatorError> {
        let provider_id = self.config.provider_for_currency(currency).to_string();
        let url = format!("{}/rates/{token}/{amount}/{currency}", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("provider_id", provider_id.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(token, currency, error = %e, "Failed to fetch rate");
                AggregatorError::from(e)
            })?;

        let rate: String = self.read_envelope("fetch_rate", response).await?;
        let rate = rate.trim().parse::<f64>().map_err(|_| {
            warn!(token, currency, rate = %rate, "Rate response was not a number");
            AggregatorError::InvalidResponse(format!("rate `{rate}` is not a number"))
        })?;

        Ok(RateQuote {
            token: token.to_string(),
            amount,
            currency: currency.to_string(),
            provider_id,
            rate,
        })
    }

    /// Link the caller's on-chain address to a settlement account.
    ///
    /// Requires a non-empty bearer token; a blank token fails locally before
    /// any network I/O. A conflict (address already linked) surfaces as a
    /// [`AggregatorError::Remote`] like any other non-2xx; callers that care
    /// can inspect [`AggregatorError::status`].
    pub async fn link_address(
        &self,
        bearer_token: &str,
        payload: &LinkAddressRequest,
    ) -> Result<LinkedAddress, AggregatorError> {
        let bearer_token = bearer_token.trim();
        if bearer_token.is_empty() {
            return Err(AggregatorError::Auth(
                "a bearer token is required to link an address".to_string(),
            ));
        }

        let url = format!("{}/linked-addresses", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {bearer_token}"))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(institution = %payload.institution, error = %e, "Failed to link address");
                AggregatorError::from(e)
            })?;
        self.read_envelope("link_address", response).await
    }

    /// Look up the linked address for an owning on-chain address.
    ///
    /// A `404` is not a failure: it confirms no link exists and maps to
    /// [`LinkedAddressLookup::NotLinked`]. Every other non-2xx propagates as
    /// [`AggregatorError::Remote`].
    pub async fn get_linked_address(
        &self,
        owner_address: &str,
    ) -> Result<LinkedAddressLookup, AggregatorError> {
        let url = format!("{}/linked-addresses/", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("owner_address", owner_address)])
            .send()
            .await
            .map_err(|e| {
                warn!(owner_address, error = %e, "Failed to fetch linked address status");
                AggregatorError::from(e)
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(LinkedAddressLookup::NotLinked);
        }

        let linked: LinkedAddress = self.read_envelope("get_linked_address", response).await?;
        Ok(LinkedAddressLookup::Linked(linked))
    }

    /// Fetch one page of settlement history for a linked address.
    ///
    /// Filters are forwarded opaquely as query parameters; validating them
    /// is the aggregator's job.
    pub async fn list_transactions(
        &self,
        owner_address: &str,
        bearer_token: &str,
        filters: &TransactionFilters,
    ) -> Result<TransactionPage, AggregatorError> {
        let bearer_token = bearer_token.trim();
        if bearer_token.is_empty() {
            return Err(AggregatorError::Auth(
                "a bearer token is required to read transaction history".to_string(),
            ));
        }

        let url = format!(
            "{}/linked-addresses/{owner_address}/transactions",
            self.config.base_url
        );
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {bearer_token}"))
            .query(filters)
            .send()
            .await
            .map_err(|e| {
                warn!(owner_address, error = %e, "Failed to fetch transaction history");
                AggregatorError::from(e)
            })?;
        self.read_envelope("list_transactions", response).await
    }

    /// Unwrap a `{ status, message, data }` envelope, turning non-2xx
    /// statuses and malformed bodies into errors. Failures are logged here
    /// so every call site propagates without further ceremony.
    async fn read_envelope<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: Response,
    ) -> Result<T, AggregatorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, %status, body = %body, "Aggregator returned an error status");
            return Err(AggregatorError::Remote { status, body });
        }

        let envelope: ApiEnvelope<T> = response.json().await.map_err(|e| {
            warn!(operation, error = %e, "Aggregator response body was invalid");
            AggregatorError::InvalidResponse(format!("{operation}: {e}"))
        })?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl LinkedAddressApi for AggregatorClient {
    async fn get_linked_address(
        &self,
        owner_address: &str,
    ) -> Result<LinkedAddressLookup, AggregatorError> {
        AggregatorClient::get_linked_address(self, owner_address).await
    }

    async fn link_address(
        &self,
        bearer_token: &str,
        payload: &LinkAddressRequest,
    ) -> Result<LinkedAddress, AggregatorError> {
        AggregatorClient::link_address(self, bearer_token, payload).await
    }
}
