//! Core domain + application logic for the Morse chat gateway.
//!
//! This crate is intentionally framework-agnostic. HTTP and the model provider
//! live in adapter crates; the model is reached through the
//! [`model::client::ModelClient`] port.

pub mod chat;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod language;
pub mod logging;
pub mod model;
pub mod morse;
pub mod prompt;
pub mod rate_limit;

pub use errors::{Error, Result};
