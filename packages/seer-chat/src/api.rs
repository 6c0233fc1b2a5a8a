//! HTTP client for the text-generation service.
//!
//! The oracle talks to a single `generateContent` endpoint; everything it
//! needs from the wire lives here.

pub mod client;
pub mod types;

pub use client::*;
