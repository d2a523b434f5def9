//! Timing constants for the simulator.
//!
//! These use `std::time::Duration`, which the `no_std` engine cannot, so
//! they live here rather than in the common crate.

use std::time::Duration;

/// Target frame time (~50 FPS). The main loop sleeps if a frame finishes early.
pub const FRAME_TIME: Duration = Duration::from_millis(20);
