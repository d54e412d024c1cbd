// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylink Contributors

//! Paylink Client - Linked-Address & Payment-Link Workflow
//!
//! This crate links an end user's on-chain address to an off-chain
//! settlement account (bank or mobile money) through the remote payment
//! aggregator, and drives the workflow for creating a shareable payment
//! link against that address.
//!
//! ## Modules
//!
//! - `aggregator` - Stateless remote-call wrappers for the aggregator API
//! - `workflow` - The link-creation orchestrator state machine
//! - `models` - Wire types and domain value objects
//! - `config` - Environment-loaded aggregator settings
//! - `error` - Aggregator error taxonomy

pub mod aggregator;
pub mod config;
pub mod error;
pub mod models;
pub mod workflow;

pub use aggregator::AggregatorClient;
pub use config::AggregatorConfig;
pub use error::AggregatorError;
pub use models::{LinkedAddress, LinkedAddressLookup};
pub use workflow::{LinkWorkflow, WorkflowState};
