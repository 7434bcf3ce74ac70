//! Stride detector driving the L1 hardware prefetcher.
//!
//! The detector watches the raw access stream (reads and writes alike) and
//! compares each stride against the previous one. Three consecutive
//! identical strides arm it; three consecutive differing strides disarm it.
//! While armed, every access yields a prefetch target one stride ahead.
//!
//! Strides are tracked in `i64` so that 32-bit wraparound arithmetic on
//! addresses compares and composes exactly.

/// Consecutive identical strides required to arm; differing strides to disarm.
const STREAK_THRESHOLD: u32 = 3;

/// Constant-stride pattern detector.
#[derive(Debug, Clone, Default)]
pub struct StrideDetector {
    prev_addr: u32,
    prev_stride: i64,
    same_streak: u32,
    diff_streak: u32,
    active: bool,
}

impl StrideDetector {
    /// Creates a detector in the disarmed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one access; returns the address to prefetch while armed.
    ///
    /// The returned target is `addr + stride`, truncated to 32 bits the way
    /// the address arithmetic of the caches truncates.
    pub fn observe(&mut self, addr: u32) -> Option<u32> {
        let stride = i64::from(addr) - i64::from(self.prev_addr);
        if stride == self.prev_stride {
            self.same_streak += 1;
            self.diff_streak = 0;
        } else {
            self.same_streak = 0;
            self.diff_streak += 1;
        }
        self.prev_addr = addr;
        self.prev_stride = stride;

        if !self.active && self.same_streak >= STREAK_THRESHOLD {
            self.active = true;
        }
        if self.active && self.diff_streak >= STREAK_THRESHOLD {
            self.active = false;
        }
        self.active.then(|| (i64::from(addr) + stride) as u32)
    }

    /// True while the detector is armed.
    pub fn is_active(&self) -> bool {
        self.active
    }
}
