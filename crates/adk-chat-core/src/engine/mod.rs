//! Streaming client for deployed Reasoning Engines
//!
//! Pipeline per turn: region resolution → streaming POST → NDJSON event
//! decoding → cumulative-text extraction → delta reduction.

pub mod client;
pub mod delta;
pub mod error;
pub mod event;
pub mod ndjson;
pub mod region;

pub use client::{QueryStream, ReasoningEngineClient};
pub use delta::{DeltaReducer, StreamMode, NO_TEXT_FALLBACK};
pub use error::EngineError;
pub use event::extract_text;
pub use ndjson::EventLineDecoder;
pub use region::{infer_region, DEFAULT_REGION};
