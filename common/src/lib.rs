//! Split-flap clock engine.
//!
//! This crate contains the platform-agnostic core of a six-panel split-flap
//! clock. Each panel ("cell") shows one glyph and changes glyphs by playing a
//! flap animation that mimics a physical card rotating over a hinge:
//!
//! - [`character_loop`]: shortest forward path of glyphs between two glyphs
//! - [`flapper`]: one flip between a "before" and an "after" snapshot
//! - [`flap_sequence`]: one flip per glyph of a path, advanced on completion
//! - [`clock`]: time-of-day diffing and the left-to-right stagger cascade
//! - [`compositor`]: the per-scanline perspective compositing of a flip
//! - [`render`]: dirty tracking and strip-wise pixel pushes
//! - [`timers`]: single-threaded deferred and periodic events
//!
//! # Execution model
//!
//! Everything runs on one thread. The host loop calls [`clock::Clock::poll`]
//! with a monotonic millisecond timestamp and [`clock::Clock::render`] with a
//! [`render::PixelSink`] once per frame. Nothing blocks; all waiting is
//! expressed as timers.
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p flapclock-common
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), while firmware builds use
//! the crate as `no_std` + `alloc`.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

// Glyph model
pub mod character_loop;
pub mod glyph;

// Animation
pub mod animation;
pub mod easing;
pub mod flap_sequence;
pub mod flapper;

// Pixels
pub mod cell;
pub mod colors;
pub mod compositor;
pub mod render;
pub mod snapshot;

// Orchestration
pub mod clock;
pub mod clock_text;
pub mod config;
pub mod error;
pub mod timers;

// Re-export commonly used items
pub use clock::{Clock, ClockEvent};
pub use config::ClockConfig;
pub use error::{Error, Result};
pub use glyph::Glyph;
