//! # Domain Models
//!
//! This crate contains pure domain types with minimal dependencies (`serde`, `bitflags`).
//! Keep it lean: no I/O, no locking, no registry logic, just data and simple helpers.

pub mod constants;
pub mod filter;
pub mod model;
pub mod settings;
