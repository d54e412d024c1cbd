// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylink Contributors

//! # Aggregator Data Models
//!
//! Wire types for the remote aggregator plus the domain value objects the
//! workflow operates on. The aggregator speaks camelCase JSON and wraps
//! every response body in a `{ status, message, data }` envelope.
//!
//! All of these are request-scoped values: nothing here is cached or
//! persisted by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard aggregator response envelope. Only `data` matters to us;
/// `status` and `message` are kept for diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    #[allow(dead_code)]
    pub status: Option<String>,
    #[allow(dead_code)]
    pub message: Option<String>,
    pub data: T,
}

/// A bank or mobile-money institution serviced for one currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    /// Stable institution code used in link and verify payloads.
    pub code: String,
    /// Human-readable institution name.
    pub name: String,
    /// `bank` or `mobile_money`.
    #[serde(rename = "type")]
    pub institution_type: String,
}

/// Payload for resolving an account number to its holder's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAccountRequest {
    /// Institution code, from [`Institution::code`].
    pub institution: String,
    /// Account number or mobile-money identifier to verify.
    pub account_identifier: String,
}

/// A quoted token-to-fiat rate from one settlement provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    /// Token symbol the quote was requested for (e.g. "USDC").
    pub token: String,
    /// Token amount the quote covers.
    pub amount: f64,
    /// Settlement currency.
    pub currency: String,
    /// Provider the quote was resolved against. Derived from the currency
    /// by the client, never supplied by the caller.
    pub provider_id: String,
    /// Units of `currency` per unit of `token`.
    pub rate: f64,
}

/// Payload for linking an on-chain address to a settlement account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkAddressRequest {
    /// Institution code, from [`Institution::code`].
    pub institution: String,
    /// Account number or mobile-money identifier to settle into.
    pub account_identifier: String,
    /// Verified account holder name.
    pub account_name: String,
    /// Settlement currency serviced by the institution.
    pub currency: String,
    /// Institution-specific routing fields, forwarded opaquely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// An on-chain address bound to exactly one off-chain settlement account.
///
/// Created once per owning address by a successful link call; this client
/// has no update or unlink operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAddress {
    /// The owning on-chain address.
    pub address: String,
    /// Institution code the address settles through.
    pub institution: String,
    /// Settlement account identifier at the institution.
    pub account_identifier: String,
    /// When the link was created, aggregator-side.
    pub created_at: DateTime<Utc>,
}

/// Outcome of a linked-address lookup.
///
/// Absence is a defined success value here, not an error: a `404` from the
/// aggregator means "confirmed not linked" and callers must be able to tell
/// that apart from "status unknown because the lookup failed".
#[derive(Debug, Clone, PartialEq)]
pub enum LinkedAddressLookup {
    /// The address has a settlement account linked.
    Linked(LinkedAddress),
    /// The aggregator confirmed no link exists for this address.
    NotLinked,
}

/// One settlement event recorded against a linked address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAddressTransaction {
    /// Aggregator-assigned order id.
    pub id: String,
    /// Token amount settled.
    pub amount: f64,
    /// Token symbol.
    pub token: String,
    /// Settlement currency.
    pub currency: String,
    /// Aggregator-side order status (e.g. "pending", "settled", "refunded").
    pub status: String,
    /// On-chain transaction hash, once available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// One page of settlement history for a linked address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// Total records matching the filters, across all pages.
    pub total: u64,
    /// Page number this response covers.
    pub page: u64,
    /// Records per page.
    pub page_size: u64,
    /// The records, in aggregator order.
    pub transactions: Vec<LinkedAddressTransaction>,
}

/// Filters for transaction history, forwarded opaquely as query parameters.
///
/// Nothing here is validated locally; an invalid combination is the
/// aggregator's to reject.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Inclusive lower bound on order creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on order creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}
