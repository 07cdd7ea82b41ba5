#![cfg_attr(not(test), no_std)]

//! # flora-rs
//! ## A flower-aware plant watering firmware in Rust
//!
//! Features:
//! - Debounced push-button trigger
//! - RGB565 camera capture and on-device flower classification
//! - Daisy, dandelion, rose, sunflower and tulip recognition
//! - Species-specific pump timing
//! - Stage timing and score diagnostics over defmt

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod arducam;
pub mod camera;
pub mod classify;
pub mod config;
pub mod error;
pub mod frame;
pub mod inference;
pub mod pipeline;
pub mod pixel;
pub mod timer;
pub mod trigger;
pub mod watering;

#[cfg(test)]
mod mock;
