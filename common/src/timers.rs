//! Deferred and periodic events on one thread.
//!
//! Nothing here sleeps or spawns. A [`Timers`] queue stores events with a
//! due time; the owner drains it with [`Timers::pop_due`] from its loop and
//! dispatches each event itself. Deferred events are delivered before any
//! timer, in the order they were deferred, so a completion posted during
//! one poll is handled on the same poll but outside the code that posted it.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// Identifies a scheduled timer. Handles are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u32);

/// How many times a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    Forever,
    Times(u32),
}

#[derive(Debug)]
struct Timer<E> {
    handle: TimerHandle,
    period_ms: u32,
    last_run_ms: u64,
    repeat: Repeat,
    event: E,
}

impl<E> Timer<E> {
    const fn due_at(&self) -> u64 { self.last_run_ms + self.period_ms as u64 }
}

/// Queue of timed and deferred events.
#[derive(Debug)]
pub struct Timers<E> {
    timers: Vec<Timer<E>>,
    deferred: VecDeque<E>,
    next_handle: u32,
}

impl<E: Clone> Timers<E> {
    pub const fn new() -> Self {
        Self {
            timers: Vec::new(),
            deferred: VecDeque::new(),
            next_handle: 0,
        }
    }

    /// Fire `event` every `period_ms` starting `period_ms` after `now_ms`.
    pub fn schedule(
        &mut self,
        now_ms: u64,
        period_ms: u32,
        repeat: Repeat,
        event: E,
    ) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.timers.push(Timer {
            handle,
            period_ms,
            last_run_ms: now_ms,
            repeat,
            event,
        });
        handle
    }

    /// Remove a timer. Returns `false` if it already fired its last time.
    pub fn cancel(
        &mut self,
        handle: TimerHandle,
    ) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }

    pub fn set_period(
        &mut self,
        handle: TimerHandle,
        period_ms: u32,
    ) {
        if let Some(timer) = self.find_mut(handle) {
            timer.period_ms = period_ms;
        }
    }

    /// Restart the period from `now_ms`.
    pub fn reset(
        &mut self,
        handle: TimerHandle,
        now_ms: u64,
    ) {
        if let Some(timer) = self.find_mut(handle) {
            timer.last_run_ms = now_ms;
        }
    }

    pub fn is_pending(
        &self,
        handle: TimerHandle,
    ) -> bool {
        self.timers.iter().any(|timer| timer.handle == handle)
    }

    #[inline]
    pub fn has_deferred(&self) -> bool { !self.deferred.is_empty() }

    /// Queue `event` for the next [`Timers::pop_due`], ahead of all timers.
    pub fn defer(
        &mut self,
        event: E,
    ) {
        self.deferred.push_back(event);
    }

    /// Next event to handle at `now_ms`, if any.
    ///
    /// Deferred events come first. Among due timers the earliest deadline
    /// wins; a timer on its last repetition is removed as it fires.
    pub fn pop_due(
        &mut self,
        now_ms: u64,
    ) -> Option<E> {
        if let Some(event) = self.deferred.pop_front() {
            return Some(event);
        }

        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due_at() <= now_ms)
            .min_by_key(|(_, timer)| timer.due_at())
            .map(|(index, _)| index)?;

        let timer = self.timers.get_mut(index)?;
        timer.last_run_ms = now_ms;
        let event = timer.event.clone();
        match timer.repeat {
            Repeat::Forever => {}
            Repeat::Times(remaining) if remaining > 1 => timer.repeat = Repeat::Times(remaining - 1),
            Repeat::Times(_) => {
                self.timers.remove(index);
            }
        }
        Some(event)
    }

    /// Earliest time something is due. Deferred events are due immediately.
    pub fn next_deadline(&self) -> Option<u64> {
        if self.has_deferred() {
            return Some(0);
        }
        self.timers.iter().map(Timer::due_at).min()
    }

    fn find_mut(
        &mut self,
        handle: TimerHandle,
    ) -> Option<&mut Timer<E>> {
        self.timers.iter_mut().find(|timer| timer.handle == handle)
    }
}

impl<E: Clone> Default for Timers<E> {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Defer
// =============================================================================

/// Post a message to be handled after the current call returns.
pub trait Defer<M> {
    fn defer(
        &mut self,
        message: M,
    );
}

impl<E: Clone> Defer<E> for Timers<E> {
    fn defer(
        &mut self,
        message: E,
    ) {
        self.deferred.push_back(message);
    }
}

impl<M> Defer<M> for Vec<M> {
    fn defer(
        &mut self,
        message: M,
    ) {
        self.push(message);
    }
}
