//! Clock orchestration.
//!
//! [`Clock`] owns the six cells, one flapper per cell and the event queue.
//! On every refresh it formats the current time, compares each cell's live
//! glyph with the text and, for every cell that differs, schedules a flap
//! sequence. Changed cells start [`ClockConfig::flip_spacing_ms`] apart,
//! left to right, so a change ripples across the board; unchanged cells
//! take no slot in the stagger.
//!
//! # Events
//!
//! All progress goes through [`ClockEvent`]s on one [`Timers`] queue:
//!
//! | Event | Source | Effect |
//! |-------|--------|--------|
//! | `Refresh` | minute timer | [`Clock::update`] |
//! | `StartSequence` | stagger timer | first flip of the cell's sequence |
//! | `FlipFinished` | flapper completion | next flip, or drop the sequence |
//!
//! A completion carries the id of the sequence that registered it. When a
//! sequence is replaced mid-flight its registration is withdrawn, and any
//! notice still naming it is ignored.

use heapless::Vec;

use crate::cell::{CellText, CellView};
use crate::character_loop::{GlyphPath, resolve};
use crate::clock_text::{ClockText, TimeSource};
use crate::config::{CELL_COUNT, COLON_CELL, ClockConfig, MERIDIEM_CELL, MINUTE_MS};
use crate::error::{Error, Result};
use crate::flap_sequence::{FlapSequence, SequenceId, SequenceStep};
use crate::flapper::Flapper;
use crate::glyph::Glyph;
use crate::render::{CellRenderer, DirtyArea, PixelSink};
use crate::timers::{Repeat, TimerHandle, Timers};

/// Everything the clock reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    Refresh,
    StartSequence { cell: usize },
    FlipFinished { cell: usize, sequence: SequenceId },
}

/// One cell's part of a cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledCascade {
    pub cell: usize,
    pub delay_ms: u32,
    pub flips: usize,
}

/// Cascades scheduled by one update, left to right.
pub type CascadePlan = Vec<ScheduledCascade, CELL_COUNT>;

// =============================================================================
// Filler
// =============================================================================

/// xorshift32 source of shuffle glyphs.
#[derive(Clone, Copy, Debug)]
struct FillerRng(u32);

impl FillerRng {
    const fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

// =============================================================================
// Clock
// =============================================================================

pub struct Clock<T> {
    config: ClockConfig,
    time_source: T,
    cells: [CellView; CELL_COUNT],
    flappers: [Flapper<ClockEvent>; CELL_COUNT],
    sequences: [Option<FlapSequence<CellView>>; CELL_COUNT],
    delayed_starts: [Option<TimerHandle>; CELL_COUNT],
    timers: Timers<ClockEvent>,
    refresh: TimerHandle,
    renderer: CellRenderer,
    filler: FillerRng,
    next_sequence: SequenceId,
}

impl<T: TimeSource> Clock<T> {
    /// Build an idle clock with blank cells at `now_ms`.
    ///
    /// Nothing is shown until the first [`Clock::update`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] or [`Error::OutOfMemory`] for the render
    /// scratch buffer.
    pub fn new(
        config: ClockConfig,
        time_source: T,
        now_ms: u64,
    ) -> Result<Self> {
        config.validate()?;

        let size = config.cell_size;
        let mut timers = Timers::new();
        let refresh = timers.schedule(now_ms, MINUTE_MS, Repeat::Forever, ClockEvent::Refresh);

        Ok(Self {
            config,
            time_source,
            cells: core::array::from_fn(|cell| {
                if cell == MERIDIEM_CELL {
                    CellView::new_meridiem(size)
                } else {
                    CellView::new_digit(size)
                }
            }),
            flappers: core::array::from_fn(|_| Flapper::new(size, config.flip_duration_ms)),
            sequences: core::array::from_fn(|_| None),
            delayed_starts: [None; CELL_COUNT],
            timers,
            refresh,
            renderer: CellRenderer::new(size.width, config.strip_rows)?,
            filler: FillerRng(config.shuffle_seed),
            next_sequence: SequenceId::default(),
        })
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Diff the current time against the cells and schedule a cascade.
    ///
    /// Also moves the refresh timer to the next minute boundary.
    ///
    /// # Errors
    ///
    /// [`Error::GlyphNotInLoop`] if a cell shows a glyph its loop lacks.
    pub fn update(
        &mut self,
        now_ms: u64,
    ) -> Result<CascadePlan> {
        let time = self.time_source.now();
        let text = ClockText::from_time(time);
        let mut plan = CascadePlan::new();
        let mut delay_ms = 0;

        for cell in 0..CELL_COUNT {
            let target = text.cell_glyph(cell);
            let current = self.cells[cell].text();
            if current == target {
                if self.abandon(cell) {
                    log::debug!("cell {cell}: already shows \"{target}\", sequence dropped");
                }
                continue;
            }

            let path = if cell == MERIDIEM_CELL {
                let mut path = GlyphPath::new();
                path.push(target).ok();
                path
            } else {
                resolve(current, target)?
            };

            self.abandon(cell);

            let id = self.next_sequence;
            self.next_sequence = id.next();
            let flips = path.len();
            self.sequences[cell] = Some(FlapSequence::new(id, path));
            self.delayed_starts[cell] =
                Some(self.timers.schedule(now_ms, delay_ms, Repeat::Times(1), ClockEvent::StartSequence { cell }));

            log::debug!("cell {cell}: \"{current}\" -> \"{target}\" in {flips} flips after {delay_ms} ms");
            plan.push(ScheduledCascade { cell, delay_ms, flips }).ok();
            delay_ms += self.config.flip_spacing_ms;
        }

        let period_ms = (60 - u32::from(time.second())) * 1000;
        self.timers.set_period(self.refresh, period_ms);
        self.timers.reset(self.refresh, now_ms);

        log::info!("showing {text}: {} of {CELL_COUNT} cells change", plan.len());
        Ok(plan)
    }

    /// Drop `cell`'s pending start and sequence. A flip already running
    /// finishes on screen but reports nothing. Returns whether anything was
    /// dropped.
    fn abandon(
        &mut self,
        cell: usize,
    ) -> bool {
        let pending = self.delayed_starts[cell].take().is_some_and(|handle| self.timers.cancel(handle));
        let running = self.sequences[cell].take().is_some();
        if running {
            self.flappers[cell].clear_finished_callback();
        }
        pending || running
    }

    /// Scramble every cell without animation, then flip back to the time.
    ///
    /// Digit cells get random digits; the colon and meridiem cells go blank.
    ///
    /// # Errors
    ///
    /// As [`Clock::update`].
    pub fn shuffle(
        &mut self,
        now_ms: u64,
    ) -> Result<CascadePlan> {
        for (cell, view) in self.cells.iter_mut().enumerate() {
            let filler = match cell {
                COLON_CELL | MERIDIEM_CELL => Glyph::BLANK,
                _ => Glyph::digit(self.filler.next() % 10).unwrap_or(Glyph::BLANK),
            };
            view.set_text(filler);
        }
        log::info!("shuffle");
        self.update(now_ms)
    }

    // =========================================================================
    // Event Loop
    // =========================================================================

    /// Advance animations to `now_ms` and handle every due event.
    ///
    /// # Errors
    ///
    /// Resolver and compositing errors. Snapshot allocation failures abort
    /// only the affected flip.
    pub fn poll(
        &mut self,
        now_ms: u64,
    ) -> Result<()> {
        for flapper in &mut self.flappers {
            flapper.tick(now_ms, &mut self.timers);
        }
        while let Some(event) = self.timers.pop_due(now_ms) {
            self.handle(now_ms, event)?;
        }
        Ok(())
    }

    fn handle(
        &mut self,
        now_ms: u64,
        event: ClockEvent,
    ) -> Result<()> {
        match event {
            ClockEvent::Refresh => {
                self.update(now_ms)?;
            }
            ClockEvent::StartSequence { cell } => {
                if let Some(slot) = self.delayed_starts.get_mut(cell) {
                    *slot = None;
                }
                self.advance(now_ms, cell)?;
            }
            ClockEvent::FlipFinished { cell, sequence } => {
                let current = self.sequences.get(cell).and_then(Option::as_ref).map(FlapSequence::id);
                if current != Some(sequence) {
                    log::trace!("cell {cell}: ignoring completion of replaced sequence {sequence:?}");
                    return Ok(());
                }
                self.advance(now_ms, cell)?;
            }
        }
        Ok(())
    }

    /// Run the next step of `cell`'s sequence.
    fn advance(
        &mut self,
        now_ms: u64,
        cell: usize,
    ) -> Result<()> {
        let (Some(slot), Some(flapper), Some(view)) = (
            self.sequences.get_mut(cell),
            self.flappers.get_mut(cell),
            self.cells.get_mut(cell),
        ) else {
            return Ok(());
        };
        let Some(sequence) = slot.as_mut() else {
            return Ok(());
        };

        let message = ClockEvent::FlipFinished { cell, sequence: sequence.id() };
        match sequence.next_step(now_ms, flapper, view, message) {
            Ok(SequenceStep::Flipping { glyph, is_last }) => {
                log::debug!("cell {cell}: flip to \"{glyph}\" (last: {is_last})");
            }
            Ok(SequenceStep::Finished) => {
                log::debug!("cell {cell}: sequence done");
                *slot = None;
            }
            Err(Error::OutOfMemory { bytes }) => {
                log::warn!("cell {cell}: flip aborted, {bytes} byte snapshot allocation failed");
                flapper.stop();
                *slot = None;
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Push every dirty cell area to `sink`. Returns the number of pushes.
    ///
    /// # Errors
    ///
    /// [`Error::PixelPush`] or compositing errors.
    pub fn render<P: PixelSink>(
        &mut self,
        sink: &mut P,
    ) -> Result<usize> {
        let mut pushes = 0;
        for (cell, (view, flapper)) in self.cells.iter_mut().zip(self.flappers.iter_mut()).enumerate() {
            let mut dirty = DirtyArea::new();
            if let Some(area) = view.take_dirty() {
                dirty.add(area);
            }
            if let Some(area) = flapper.take_dirty() {
                dirty.add(area);
            }
            if let Some(area) = dirty.take() {
                pushes += self.renderer.render(cell, &*view, &*flapper, area, sink)?;
            }
        }
        Ok(pushes)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// No cascade is pending or running.
    pub fn is_idle(&self) -> bool {
        self.sequences.iter().all(Option::is_none)
            && self.delayed_starts.iter().all(Option::is_none)
            && !self.flappers.iter().any(Flapper::is_animating)
    }

    /// Earliest timer deadline. Running flips need a poll every frame on top.
    pub fn next_deadline(&self) -> Option<u64> { self.timers.next_deadline() }

    /// Glyphs the cells show right now.
    pub fn displayed(&self) -> [Glyph; CELL_COUNT] { core::array::from_fn(|cell| self.cells[cell].text()) }

    #[inline]
    pub const fn cells(&self) -> &[CellView; CELL_COUNT] { &self.cells }

    pub fn cell(
        &self,
        cell: usize,
    ) -> Option<&CellView> {
        self.cells.get(cell)
    }

    pub fn flapper(
        &self,
        cell: usize,
    ) -> Option<&Flapper<ClockEvent>> {
        self.flappers.get(cell)
    }

    #[inline]
    pub const fn config(&self) -> &ClockConfig { &self.config }

    #[inline]
    pub const fn time_source(&self) -> &T { &self.time_source }

    #[inline]
    pub const fn time_source_mut(&mut self) -> &mut T { &mut self.time_source }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::Rgb565;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;

    use super::*;
    use crate::cell::Surface;
    use crate::config::{CELL_HEIGHT, CELL_WIDTH, STRIP_ROWS};

    struct FixedTime(time::Time);

    impl TimeSource for FixedTime {
        fn now(&self) -> time::Time { self.0 }
    }

    fn at(
        hour: u8,
        minute: u8,
        second: u8,
    ) -> FixedTime {
        FixedTime(time::Time::from_hms(hour, minute, second).unwrap())
    }

    fn clock(time: FixedTime) -> Clock<FixedTime> { Clock::new(ClockConfig::default(), time, 0).unwrap() }

    fn text_of(clock: &Clock<FixedTime>) -> [Glyph; CELL_COUNT] {
        let text = ClockText::from_time(clock.time_source().0);
        core::array::from_fn(|cell| text.cell_glyph(cell))
    }

    /// Poll every 10 ms until the board settles. Returns the settle time.
    fn run_until_idle(
        clock: &mut Clock<FixedTime>,
        mut now: u64,
    ) -> u64 {
        for _ in 0..100_000 {
            clock.poll(now).unwrap();
            if clock.is_idle() {
                return now;
            }
            now += 10;
        }
        panic!("clock never settled");
    }

    struct CountingSink(usize);

    impl PixelSink for CountingSink {
        type Error = core::convert::Infallible;

        fn push_pixels(
            &mut self,
            _cell: usize,
            area: Rectangle,
            pixels: &[Rgb565],
        ) -> Result<(), Self::Error> {
            assert_eq!(pixels.len(), (area.size.width * area.size.height) as usize);
            assert!(area.size.height <= STRIP_ROWS);
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn test_initial_update_changes_every_cell() {
        let mut clock = clock(at(10, 59, 0));
        let plan = clock.update(0).unwrap();

        let cells: alloc::vec::Vec<_> = plan.iter().map(|c| (c.cell, c.delay_ms)).collect();
        assert_eq!(cells, [(0, 0), (1, 700), (2, 1400), (3, 2100), (4, 2800), (5, 3500)]);
        assert_eq!(plan[COLON_CELL].flips, 1);
        assert_eq!(plan[MERIDIEM_CELL].flips, 1);

        run_until_idle(&mut clock, 0);
        assert_eq!(clock.displayed(), text_of(&clock));
        assert_eq!(clock.cells()[MERIDIEM_CELL].sublabel(), Glyph::M);
    }

    #[test]
    fn test_stagger_counts_only_changed_cells() {
        let mut clock = clock(at(10, 59, 0));
        clock.update(0).unwrap();
        let t0 = run_until_idle(&mut clock, 0) + 10;

        clock.time_source_mut().0 = time::Time::from_hms(11, 0, 0).unwrap();
        let plan = clock.update(t0).unwrap();
        let cells: alloc::vec::Vec<_> = plan.iter().map(|c| (c.cell, c.delay_ms)).collect();
        assert_eq!(cells, [(1, 0), (3, 700), (4, 1400)]);

        clock.poll(t0).unwrap();
        let animating = |clock: &Clock<FixedTime>, cell| clock.flapper(cell).unwrap().is_animating();
        assert!(animating(&clock, 1));
        assert!(!animating(&clock, 3));

        clock.poll(t0 + 699).unwrap();
        assert!(!animating(&clock, 3));
        clock.poll(t0 + 700).unwrap();
        assert!(animating(&clock, 3));
        assert!(!animating(&clock, 4));
        clock.poll(t0 + 1400).unwrap();
        assert!(animating(&clock, 4));
        for cell in [0, 2, 5] {
            assert!(!animating(&clock, cell));
        }

        run_until_idle(&mut clock, t0 + 1400);
        assert_eq!(clock.displayed(), text_of(&clock));
    }

    #[test]
    fn test_no_change_schedules_nothing() {
        let mut clock = clock(at(7, 30, 0));
        clock.update(0).unwrap();
        let now = run_until_idle(&mut clock, 0);

        assert!(clock.update(now).unwrap().is_empty());
        assert!(clock.is_idle());
    }

    #[test]
    fn test_shuffle_round_trip_matches_direct_update() {
        let mut shuffled = clock(at(12, 34, 0));
        shuffled.update(0).unwrap();
        let now = run_until_idle(&mut shuffled, 0);
        let plan = shuffled.shuffle(now).unwrap();
        assert!(plan.iter().any(|c| c.cell == COLON_CELL));
        assert!(plan.iter().any(|c| c.cell == MERIDIEM_CELL));
        run_until_idle(&mut shuffled, now);

        let mut direct = clock(at(12, 34, 0));
        direct.update(0).unwrap();
        run_until_idle(&mut direct, 0);

        assert_eq!(shuffled.displayed(), direct.displayed());
        assert_eq!(shuffled.displayed(), text_of(&direct));
    }

    #[test]
    fn test_replacing_in_flight_sequence_converges() {
        let mut clock = clock(at(10, 59, 0));
        clock.update(0).unwrap();
        let t0 = run_until_idle(&mut clock, 0) + 10;

        clock.time_source_mut().0 = time::Time::from_hms(11, 0, 0).unwrap();
        clock.update(t0).unwrap();
        clock.poll(t0 + 800).unwrap();
        assert!(clock.flapper(3).unwrap().is_animating());

        clock.time_source_mut().0 = time::Time::from_hms(11, 10, 0).unwrap();
        let plan = clock.update(t0 + 800).unwrap();
        assert_eq!(plan.first().map(|c| (c.cell, c.delay_ms)), Some((3, 0)));
        assert!(!clock.flapper(3).unwrap().has_finished_callback());

        run_until_idle(&mut clock, t0 + 800);
        assert_eq!(clock.displayed(), text_of(&clock));
    }

    #[test]
    fn test_sequence_dropped_when_cell_already_matches() {
        let mut clock = clock(at(10, 59, 0));
        clock.update(0).unwrap();
        let t0 = run_until_idle(&mut clock, 0) + 10;

        // 9 -> 5 walks cell 4 through blank, ':', 0, 1, 2, 3, 4, 5.
        clock.time_source_mut().0 = time::Time::from_hms(11, 5, 0).unwrap();
        clock.update(t0).unwrap();
        for offset in [0, 700, 1400, 2400, 3400] {
            clock.poll(t0 + offset).unwrap();
        }
        assert_eq!(clock.displayed()[4], Glyph::from_char('0'));
        assert!(clock.flapper(4).unwrap().has_finished_callback());

        clock.time_source_mut().0 = time::Time::from_hms(11, 0, 0).unwrap();
        let plan = clock.update(t0 + 3400).unwrap();
        assert!(plan.iter().all(|c| c.cell != 4));
        assert!(!clock.flapper(4).unwrap().has_finished_callback());

        run_until_idle(&mut clock, t0 + 3400);
        assert_eq!(clock.displayed(), text_of(&clock));
    }

    #[test]
    fn test_snapshot_allocation_failure_aborts_only_the_flip() {
        // Scratch strips stay one row; every snapshot is far beyond any heap.
        let config = ClockConfig::new()
            .with_cell_size(Size::new(1 << 20, u32::MAX))
            .with_strip_rows(1);
        let mut clock = Clock::new(config, at(10, 59, 0), 0).unwrap();
        clock.update(0).unwrap();

        assert_eq!(clock.poll(0), Ok(()));
        assert!(clock.sequences[0].is_none());
        assert!(!clock.flapper(0).unwrap().is_animating());
        assert_eq!(clock.displayed()[0], Glyph::BLANK);
        assert!(clock.sequences[1].is_some());

        assert_eq!(clock.poll(700), Ok(()));
        assert!(clock.sequences[1].is_none());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut clock = clock(at(1, 23, 0));
        clock.update(0).unwrap();
        clock.poll(0).unwrap();
        assert!(clock.flapper(0).unwrap().is_animating());
        let text = clock.displayed();

        clock
            .handle(0, ClockEvent::FlipFinished { cell: 0, sequence: SequenceId::new(999) })
            .unwrap();
        assert_eq!(clock.displayed(), text);
        assert!(clock.flapper(0).unwrap().is_animating());
    }

    #[test]
    fn test_refresh_aligns_to_minute() {
        let mut clock = clock(at(10, 59, 30));
        clock.update(0).unwrap();
        let now = run_until_idle(&mut clock, 0);
        assert!(now < 30_000);
        assert_eq!(clock.next_deadline(), Some(30_000));

        clock.time_source_mut().0 = time::Time::from_hms(11, 0, 0).unwrap();
        clock.poll(30_000).unwrap();
        assert!(!clock.is_idle());
        // Cell 1 started on the refresh poll; cell 3 is next in the stagger.
        assert!(clock.flapper(1).unwrap().is_animating());
        assert_eq!(clock.next_deadline(), Some(30_700));
    }

    #[test]
    fn test_render_pushes_dirty_strips_only() {
        let mut clock = clock(at(9, 41, 0));
        let mut sink = CountingSink(0);

        // Blank cells start fully dirty.
        let strips_per_cell = CELL_HEIGHT.div_ceil(STRIP_ROWS) as usize;
        assert_eq!(clock.render(&mut sink).unwrap(), CELL_COUNT * strips_per_cell);
        assert_eq!(clock.render(&mut sink).unwrap(), 0);

        clock.update(0).unwrap();
        clock.poll(0).unwrap();
        assert_eq!(clock.render(&mut sink).unwrap(), strips_per_cell);

        clock.poll(50).unwrap();
        let pushes = clock.render(&mut sink).unwrap();
        assert!(pushes > 0 && pushes <= strips_per_cell);
        assert_eq!(clock.cell(0).unwrap().size(), Size::new(CELL_WIDTH, CELL_HEIGHT));
    }

    #[test]
    fn test_filler_is_deterministic() {
        let mut a = FillerRng(ClockConfig::default().shuffle_seed);
        let mut b = FillerRng(ClockConfig::default().shuffle_seed);
        for _ in 0..16 {
            let value = a.next();
            assert_eq!(value, b.next());
            assert_ne!(value, 0);
        }
    }
}
