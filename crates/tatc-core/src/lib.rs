//! Core of the adaptive chat translation pipeline.
//!
//! This crate is framework-agnostic. Translation providers and chat
//! connections live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod detection;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod pipeline;
pub mod ports;
pub mod registry;
pub mod sanitizer;
pub mod store;
pub mod translation;
pub mod utils;

pub use errors::{Error, Result};
