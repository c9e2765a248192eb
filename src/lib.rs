//! XDental - client core of the dental X-ray viewer
//!
//! Finding geometry normalization, reducer-style state stores with optional
//! persistence, the upload tracker, the layout registry, the notification
//! feed and the edge request gate.

pub mod config;
pub mod constants;
pub mod error;
pub mod gate;
pub mod geometry;
pub mod ids;
pub mod model;
pub mod state;
pub mod store;

pub use config::{AppConfig, ConfigError, LogLevel};
pub use error::StoreError;
pub use gate::{GateConfig, GateDecision, RequestGate};
pub use geometry::{Finding, NormalizedBox, ShapeSource, normalize, normalize_value};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
