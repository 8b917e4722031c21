//! Kernel utilities shared across entry points.
//! Keep this crate lightweight; it resolves and validates [`Settings`] before anything else runs.
//!
//! ## Settings loading
//! ```rust,ignore
//! use trellis_kernel::config::load_settings;
//!
//! let settings = load_settings(Some("config/local"))?;
//! assert!(!settings.secret_key.is_empty());
//! ```
pub mod config;

pub use trellis_domain as domain;
pub use trellis_domain::settings::Settings;
