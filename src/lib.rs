//! CLEAR Search Relay Library
//!
//! Accepts simplified person and phone searches from one trusted web origin,
//! runs them against the CLEAR provider's XML search API (submit, fetch
//! results, fetch per-group detail) and returns flat JSON records sorted by
//! relevance.
//!
//! # Modules
//!
//! - `api`: HTTP boundary (handlers, origin check).
//! - `domain`: Search orchestration, XML building and flattening.
//! - `integrations`: External provider client.
//! - `clear_client`: CLEAR HTTP client (mutual TLS, Basic auth).
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `flattener`: Provider XML reply parsing.
//! - `handlers`: HTTP request handlers and router.
//! - `models`: Request, provider and record models.
//! - `origin`: Allowed-origin middleware.
//! - `request_builder`: Provider XML request documents.
//! - `search`: Search orchestration.

pub mod api;
pub mod domain;
pub mod integrations;

pub mod clear_client;
pub mod config;
pub mod errors;
pub mod flattener;
pub mod handlers;
pub mod models;
pub mod origin;
pub mod request_builder;
pub mod search;
