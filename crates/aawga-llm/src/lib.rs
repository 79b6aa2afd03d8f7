//! # aawga-llm
//!
//! Text-generation backends for the artifact pipeline.
//!
//! [`Provider`] is the seam the generation stages call through: one prompt in,
//! one completion string out. [`OpenAiProvider`] implements it against any
//! OpenAI-compatible `/chat/completions` endpoint, with a per-call deadline
//! and a typed error taxonomy ([`ProviderError`]).

#![deny(unsafe_code)]

pub mod error_parsing;
pub mod openai;
pub mod provider;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{CompletionOptions, Provider, ProviderError, ProviderResult};
