//! Split-flap clock simulator for desktop.
//!
//! Runs the clock engine against the system time and shows the six panels
//! in an `embedded-graphics-simulator` window.
//!
//! | Key | Action |
//! |-----|--------|
//! | `S` | shuffle |
//! | `R` | resync with the system time |
//! | `N` | skip ahead one minute |
//! | `Q` / `Esc` | quit |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

mod panel;
mod system_time;
mod timing;

use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use flapclock_common::colors::BLACK;
use flapclock_common::{Clock, ClockConfig, Result};

use crate::panel::{PanelSink, WINDOW_SCALE, display_size};
use crate::system_time::SystemClock;
use crate::timing::FRAME_TIME;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("clock stopped: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = ClockConfig::default();
    let time_source = SystemClock::new();
    let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(display_size(config.cell_size));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Split-Flap Clock", &output_settings);

    display.clear(BLACK).ok();
    window.update(&display);

    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;

    let mut clock = Clock::new(config, time_source, now_ms())?;
    clock.update(now_ms())?;

    loop {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => return Ok(()),
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    if repeat {
                        continue;
                    }
                    match keycode {
                        Keycode::S => {
                            clock.shuffle(now_ms())?;
                        }
                        Keycode::R => {
                            log::info!("resync");
                            clock.time_source_mut().reset_skew();
                            clock.update(now_ms())?;
                        }
                        Keycode::N => {
                            clock.time_source_mut().advance_minutes(1);
                            clock.update(now_ms())?;
                        }
                        Keycode::Q | Keycode::Escape => return Ok(()),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        clock.poll(now_ms())?;
        clock.render(&mut PanelSink::new(&mut display, config.cell_size))?;
        window.update(&display);

        if let Some(remaining) = FRAME_TIME.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
}
