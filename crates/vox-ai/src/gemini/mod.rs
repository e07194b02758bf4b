//! Google Gemini API client.
//!
//! Implements the `AiClient` trait via the Generative Language API's
//! `generateContent` method, with function calling.

mod api;
mod client;
mod config;

pub use client::GeminiClient;
pub use config::GeminiConfig;
