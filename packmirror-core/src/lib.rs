//! packmirror core library: domain types, persisted configuration, errors.
//!
//! Public API surface:
//! - [`types`]: mirror pairs and the watched process target
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / save / exists for `config.json`

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::ConfigError;
pub use types::{MirrorPair, PairLabel, ProcessTarget, DEFAULT_TARGET_PROCESS};
