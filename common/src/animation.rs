//! Timed scalar animations.

use crate::easing::AnimationPath;

/// A value animated from `from` to `to` over `duration_ms`, starting at
/// `start_ms` on the caller's monotonic clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Animation {
    start_ms: u64,
    duration_ms: u32,
    from: i32,
    to: i32,
    path: AnimationPath,
}

impl Animation {
    pub const fn new(
        start_ms: u64,
        duration_ms: u32,
        from: i32,
        to: i32,
        path: AnimationPath,
    ) -> Self {
        Self {
            start_ms,
            duration_ms,
            from,
            to,
            path,
        }
    }

    #[inline]
    pub const fn path(&self) -> AnimationPath { self.path }

    #[inline]
    pub const fn end_value(&self) -> i32 { self.to }

    /// Value at `now_ms`. Times before the start yield `from`.
    pub fn value_at(
        &self,
        now_ms: u64,
    ) -> i32 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        self.path.value(elapsed, self.duration_ms, self.from, self.to)
    }

    pub const fn is_finished(
        &self,
        now_ms: u64,
    ) -> bool {
        now_ms >= self.start_ms + self.duration_ms as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_follows_clock() {
        let anim = Animation::new(500, 1000, 0, 100, AnimationPath::Linear);
        assert_eq!(anim.value_at(0), 0);
        assert_eq!(anim.value_at(500), 0);
        assert_eq!(anim.value_at(1000), 50);
        assert_eq!(anim.value_at(1500), 100);
    }

    #[test]
    fn test_finished_at_duration() {
        let anim = Animation::new(100, 1000, 0, 162, AnimationPath::Bounce);
        assert!(!anim.is_finished(1099));
        assert!(anim.is_finished(1100));
        assert_eq!(anim.value_at(1100), anim.end_value());
    }
}
