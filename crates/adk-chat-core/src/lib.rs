//! Core library for adk-chat
//!
//! A thin streaming client for deployed Vertex AI Reasoning Engines:
//! authenticate, POST one message, decode the NDJSON event stream, and
//! reduce the assistant's growing answer into display updates.

pub mod auth;
pub mod config;
pub mod engine;
pub mod session;

pub use config::Config;
pub use engine::{EngineError, ReasoningEngineClient, StreamMode, NO_TEXT_FALLBACK};
