//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `pins`: Adapters over `embedded-hal` 1.0 input pins and PWM channels

pub mod mock;
pub mod pins;

pub use mock::*;
pub use pins::*;
