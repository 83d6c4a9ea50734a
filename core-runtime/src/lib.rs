//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for catalog synchronization:
//! - Logging and tracing infrastructure
//! - Configuration management (builder and TOML file loading)
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other crates depend on. It
//! establishes the logging conventions and the validated configuration that
//! must exist before any catalog is contacted.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
