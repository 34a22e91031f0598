//! Victim selection when every frame is occupied.
//!
//! Both policies share one rotating clock hand over the frame pool.
//!
//! * [`ReplacementPolicy::Legacy`] scans for a free frame only. It exists for
//!   parity with the earlier simulator, whose scan could never succeed once
//!   the pool was full. Here the scan gives up after one circuit and takes the
//!   frame under the hand, which degrades to FIFO order.
//! * [`ReplacementPolicy::WsClock`] is the working-set clock: referenced
//!   frames get a second chance, unreferenced frames older than the recency
//!   threshold are evicted.

use std::fmt;
use std::str::FromStr;

use crate::memory::{FrameIndex, FramePool};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Legacy,
    #[default]
    WsClock,
}

impl FromStr for ReplacementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(ReplacementPolicy::Legacy),
            "wsclock" => Ok(ReplacementPolicy::WsClock),
            other => Err(format!("unknown replacement policy: {} (expected legacy or wsclock)", other)),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementPolicy::Legacy => write!(f, "legacy"),
            ReplacementPolicy::WsClock => write!(f, "wsclock"),
        }
    }
}

/// Rotating hand over the frame pool
#[derive(Debug)]
pub struct ClockHand {
    policy: ReplacementPolicy,
    recent_age: u64,
    position: FrameIndex,
}

impl ClockHand {
    pub fn new(policy: ReplacementPolicy, recent_age: u64) -> Self {
        ClockHand {
            policy,
            recent_age,
            position: 0,
        }
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    /// Frame the hand currently points at
    pub fn position(&self) -> FrameIndex {
        self.position
    }

    /// Pick a frame to reuse; the result is always within the pool.
    ///
    /// The pool must not be empty.
    pub fn select_victim(&mut self, pool: &mut FramePool, now: u64) -> FrameIndex {
        assert!(!pool.is_empty(), "replacement requested on an empty frame pool");
        match self.policy {
            ReplacementPolicy::Legacy => self.legacy_scan(pool),
            ReplacementPolicy::WsClock => self.ws_clock(pool, now),
        }
    }

    fn legacy_scan(&mut self, pool: &FramePool) -> FrameIndex {
        for _ in 0..pool.len() {
            let candidate = self.advance(pool.len());
            if pool.get(candidate).is_free() {
                return candidate;
            }
        }
        self.advance(pool.len())
    }

    fn ws_clock(&mut self, pool: &mut FramePool, now: u64) -> FrameIndex {
        // first circuit clears reference bits, second can then find a victim
        for _ in 0..2 * pool.len() {
            let candidate = self.advance(pool.len());
            let frame = pool.get_mut(candidate);

            if frame.is_free() {
                return candidate;
            }
            if frame.referenced() {
                frame.clear_referenced();
                continue;
            }
            if frame.age(now) > self.recent_age {
                log::debug!(
                    "wsclock: frame {} idle for {} ticks, evicting",
                    candidate,
                    frame.age(now)
                );
                return candidate;
            }
        }

        // every frame is in the working set
        log::debug!("wsclock: no frame outside the working set, taking frame {}", self.position);
        self.advance(pool.len())
    }

    /// Return the frame under the hand and move the hand past it
    fn advance(&mut self, len: usize) -> FrameIndex {
        let current = self.position;
        self.position = (self.position + 1) % len;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_pool(count: usize) -> FramePool {
        let mut pool = FramePool::new(count);
        for frame in 0..count {
            pool.mark_occupied(frame, frame as u64, frame as u64 + 1);
        }
        pool
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("legacy".parse::<ReplacementPolicy>(), Ok(ReplacementPolicy::Legacy));
        assert_eq!("WSClock".parse::<ReplacementPolicy>(), Ok(ReplacementPolicy::WsClock));
        assert!("lru".parse::<ReplacementPolicy>().is_err());
        assert_eq!(ReplacementPolicy::WsClock.to_string(), "wsclock");
    }

    #[test]
    fn test_legacy_finds_free_frame_from_hand() {
        let mut pool = full_pool(4);
        pool.mark_free(2);
        let mut hand = ClockHand::new(ReplacementPolicy::Legacy, 10);

        assert_eq!(hand.select_victim(&mut pool, 5), 2);
        assert_eq!(hand.position(), 3);
    }

    #[test]
    fn test_legacy_full_pool_is_fifo() {
        let mut pool = full_pool(3);
        let mut hand = ClockHand::new(ReplacementPolicy::Legacy, 10);

        assert_eq!(hand.select_victim(&mut pool, 4), 0);
        assert_eq!(hand.select_victim(&mut pool, 5), 1);
        assert_eq!(hand.select_victim(&mut pool, 6), 2);
        assert_eq!(hand.select_victim(&mut pool, 7), 0);
    }

    #[test]
    fn test_legacy_ignores_reference_bits() {
        let mut pool = full_pool(2);
        let mut hand = ClockHand::new(ReplacementPolicy::Legacy, 1);

        hand.select_victim(&mut pool, 10);
        assert!(pool.get(0).referenced());
        assert!(pool.get(1).referenced());
    }

    #[test]
    fn test_wsclock_all_recent_falls_back_to_hand() {
        // every frame referenced and young: two circuits, then frame 0
        let mut pool = full_pool(4);
        let mut hand = ClockHand::new(ReplacementPolicy::WsClock, 10);

        assert_eq!(hand.select_victim(&mut pool, 5), 0);
        assert_eq!(hand.position(), 1);
        assert!(pool.iter().all(|f| !f.referenced()));
    }

    #[test]
    fn test_wsclock_evicts_oldest_unreferenced() {
        let mut pool = full_pool(4);
        let mut hand = ClockHand::new(ReplacementPolicy::WsClock, 2);

        // frame 0 loaded at t=1, so at t=5 it is 4 ticks old after losing its bit
        assert_eq!(hand.select_victim(&mut pool, 5), 0);
    }

    #[test]
    fn test_wsclock_gives_second_chance() {
        let mut pool = full_pool(3);
        for frame in 0..3 {
            pool.get_mut(frame).clear_referenced();
        }
        // frame 0 was just used
        pool.touch(0, 20, None);
        let mut hand = ClockHand::new(ReplacementPolicy::WsClock, 5);

        assert_eq!(hand.select_victim(&mut pool, 21), 1);
        assert!(!pool.get(0).referenced());
    }

    #[test]
    fn test_wsclock_skips_young_unreferenced() {
        let mut pool = full_pool(3);
        for frame in 0..3 {
            pool.get_mut(frame).clear_referenced();
        }
        pool.touch(0, 19, None);
        pool.touch(1, 20, None);
        for frame in 0..2 {
            pool.get_mut(frame).clear_referenced();
        }
        let mut hand = ClockHand::new(ReplacementPolicy::WsClock, 5);

        // frames 0 and 1 are within the window, frame 2 (t=3) is not
        assert_eq!(hand.select_victim(&mut pool, 21), 2);
        assert_eq!(hand.position(), 0);
    }

    #[test]
    fn test_wsclock_takes_free_frame() {
        let mut pool = full_pool(3);
        pool.mark_free(1);
        let mut hand = ClockHand::new(ReplacementPolicy::WsClock, 5);

        assert_eq!(hand.select_victim(&mut pool, 9), 1);
    }
}
