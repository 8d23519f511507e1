//! # SnackFund API Server Library
//!
//! HTTP surface of SnackFund: team-scoped tracking of snack purchases,
//! fund payments, expenses, house rules and the fines for breaking them.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration loaded from the environment
//! - `error`: Error type and its HTTP response mapping
//! - `extract`: Extractors that reject with the JSON error envelope
//! - `middleware`: Bearer authentication and current-team resolution
//! - `response`: Success envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
