//! Smart-manufacturing sensor dashboard.
//!
//! The `data` module is the whole pipeline (load, clean, filter, aggregate)
//! and has no GUI dependency; the binary wraps it in an egui window.

pub mod config;
pub mod data;
