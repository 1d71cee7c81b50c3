//! # Writing Relay
//!
//! A streaming relay for a form-driven AI writing assistant, plus the
//! client-side consumer for its wire format.
//!
//! ## Overview
//!
//! The relay accepts generation requests, forwards them to the Anthropic
//! Messages API, and re-emits the provider's text deltas as line-framed
//! events (`data: <text>`, terminated by `data: [DONE]`, with failures
//! surfaced in-band as `data: [ERROR] ...`).
//!
//! The consumer side issues the request, incrementally decodes the framed
//! byte stream, classifies each frame, and folds text deltas into one
//! accumulating result per request:
//!
//! ```rust,no_run
//! use writing_relay::models::api::WritingParams;
//! use writing_relay::orchestrator::{ConsumerConfig, Orchestrator};
//!
//! # async fn run() -> writing_relay::Result<()> {
//! let mut orch = Orchestrator::new(ConsumerConfig::new("http://localhost:8000"))?;
//! let request = WritingParams {
//!     prompt: "Write a haiku about rain".to_string(),
//!     writing_type: "poetry".to_string(),
//!     tone: "playful".to_string(),
//! };
//! let text = orch
//!     .submit_streaming(&request, |partial| println!("{partial}"))
//!     .await?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types and handling
//! - [`models`] - Request/response shapes and provider wire types
//! - [`streaming`] - Framer, event classifier, and stream consumer
//! - [`orchestrator`] - Client-side request lifecycle
//! - [`handler`] - Relay HTTP endpoints

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod streaming;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
