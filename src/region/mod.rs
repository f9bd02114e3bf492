//! Crop region handling.
//!
//! This module provides:
//! - Crop intent types loaded from config (`CropSpec`, `Anchor`)
//! - The resolved pixel rectangle (`CropRectangle`)
//! - Conversion from intent to a clamped rectangle (`resolve`)

pub mod coords;
pub mod crop;

pub use coords::resolve;
pub use crop::{Anchor, CropRectangle, CropSpec};
