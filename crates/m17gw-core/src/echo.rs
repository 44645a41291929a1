//! Echo engine: a single-shot record-and-replay buffer. See `spec.md` §4.E.

use crate::timer::{Stopwatch, Timer};

/// Hold delay between `end()` and the start of playback.
pub const HOLD_TIMER_MS: u64 = 1_000;
/// Stream frame cadence; playback is paced to one frame per this interval.
pub const FRAME_PERIOD_MS: u64 = 40;
/// Length of one stored frame.
pub const FRAME_LENGTH: usize = 54;

/// Echo engine lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EchoStatus {
    /// Idle; buffer empty.
    None,
    /// Accepting frames via [`EchoEngine::write`].
    Recording,
    /// `end()` called; waiting out the hold timer before playback.
    Waiting,
    /// Replaying buffered frames via [`EchoEngine::read`].
    Playing,
}

/// Result of a single [`EchoEngine::read`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EchoReadResult {
    /// Not playing, or not yet time for the next frame.
    None,
    /// One 54-byte frame is ready; see the returned slice.
    Data,
    /// Playback just finished; the engine has returned to `None`.
    End,
}

/// A bounded byte pool recording inbound stream frames and replaying them
/// at wall-clock-paced readout after a short hold delay.
pub struct EchoEngine {
    capacity_frames: usize,
    buffer: Vec<u8>,
    used_frames: usize,
    sent_frames: usize,
    status: EchoStatus,
    hold_timer: Timer,
    stopwatch: Stopwatch,
}

impl EchoEngine {
    /// Construct an engine sized to hold `timeout_seconds * 25` frames.
    #[must_use]
    pub fn new(timeout_seconds: u32) -> Self {
        let capacity_frames = timeout_seconds as usize * 25;
        Self {
            capacity_frames,
            buffer: Vec::with_capacity(capacity_frames * FRAME_LENGTH),
            used_frames: 0,
            sent_frames: 0,
            status: EchoStatus::None,
            hold_timer: Timer::new(HOLD_TIMER_MS),
            stopwatch: Stopwatch::new(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> EchoStatus {
        self.status
    }

    /// Append a frame to the buffer if space remains. Returns `false` (and
    /// drops the frame) on overflow; already-stored frames are left intact.
    pub fn write(&mut self, frame: &[u8]) -> bool {
        if self.used_frames >= self.capacity_frames {
            return false;
        }
        self.buffer.extend_from_slice(frame);
        self.used_frames += 1;
        self.status = EchoStatus::Recording;
        true
    }

    /// Signal end-of-input; starts the hold timer before playback begins.
    pub fn end(&mut self) {
        self.sent_frames = 0;
        self.status = EchoStatus::Waiting;
        self.hold_timer.start();
    }

    /// Discard everything and return to `None`.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.used_frames = 0;
        self.sent_frames = 0;
        self.status = EchoStatus::None;
        self.hold_timer.stop();
    }

    /// Advance timers by `ms` milliseconds.
    pub fn clock(&mut self, ms: u64) {
        if self.status == EchoStatus::Waiting && self.hold_timer.clock(ms) {
            self.status = EchoStatus::Playing;
            self.sent_frames = 0;
            self.stopwatch.start();
        }
        if self.status == EchoStatus::Playing {
            self.stopwatch.clock(ms);
        }
    }

    /// Pace one frame of playback. Returns [`EchoReadResult::Data`] with
    /// the frame copied into `out` (must be at least [`FRAME_LENGTH`]
    /// bytes), [`EchoReadResult::End`] when playback has just finished, or
    /// [`EchoReadResult::None`] if it isn't time for the next frame yet.
    pub fn read(&mut self, out: &mut [u8]) -> EchoReadResult {
        if self.status != EchoStatus::Playing {
            return EchoReadResult::None;
        }

        if self.used_frames == 0 {
            self.status = EchoStatus::None;
            return EchoReadResult::End;
        }

        let wanted = self.stopwatch.elapsed_ms() / FRAME_PERIOD_MS;
        if (self.sent_frames as u64) >= wanted {
            return EchoReadResult::None;
        }

        let ptr = self.sent_frames * FRAME_LENGTH;
        if ptr >= self.used_frames * FRAME_LENGTH {
            self.used_frames = 0;
            self.status = EchoStatus::None;
            return EchoReadResult::End;
        }

        out[0..FRAME_LENGTH].copy_from_slice(&self.buffer[ptr..ptr + FRAME_LENGTH]);
        self.sent_frames += 1;
        EchoReadResult::Data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(byte: u8) -> Vec<u8> {
        vec![byte; FRAME_LENGTH]
    }

    #[test]
    fn write_transitions_to_recording() {
        let mut echo = EchoEngine::new(240);
        assert!(echo.write(&frame(1)));
        assert_eq!(echo.status(), EchoStatus::Recording);
    }

    #[test]
    fn overflow_returns_false_and_keeps_stored_frames() {
        let mut echo = EchoEngine::new(0); // capacity 0 frames
        assert!(!echo.write(&frame(1)));
    }

    #[test]
    fn full_record_end_playback_cycle() {
        let mut echo = EchoEngine::new(240);
        for i in 0..10u8 {
            assert!(echo.write(&frame(i)));
        }
        echo.end();
        assert_eq!(echo.status(), EchoStatus::Waiting);

        // Hold timer hasn't expired yet.
        echo.clock(500);
        let mut out = [0u8; FRAME_LENGTH];
        assert_eq!(echo.read(&mut out), EchoReadResult::None);

        // Cross the 1s hold threshold.
        echo.clock(600);
        assert_eq!(echo.status(), EchoStatus::Playing);

        let mut received = 0;
        let mut ended = false;
        for _ in 0..50 {
            echo.clock(FRAME_PERIOD_MS);
            loop {
                match echo.read(&mut out) {
                    EchoReadResult::Data => received += 1,
                    EchoReadResult::End => {
                        ended = true;
                        break;
                    }
                    EchoReadResult::None => break,
                }
            }
            if ended {
                break;
            }
        }

        assert_eq!(received, 10);
        assert!(ended);
        assert_eq!(echo.status(), EchoStatus::None);
    }

    #[test]
    fn clear_resets_everything() {
        let mut echo = EchoEngine::new(240);
        echo.write(&frame(1));
        echo.end();
        echo.clear();
        assert_eq!(echo.status(), EchoStatus::None);
        let mut out = [0u8; FRAME_LENGTH];
        assert_eq!(echo.read(&mut out), EchoReadResult::None);
    }
}
