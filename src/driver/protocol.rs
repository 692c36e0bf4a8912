//! Frame encodings for the two controller families.
//!
//! Both families share the pulse model in [`StageDriver`](super::StageDriver);
//! a [`StageProtocol`] only decides how frames look and how replies are read.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::motion::Direction;

/// One ASCII frame, without terminator.
pub type Frame = String<64>;

/// Frames produced for one operation.
pub type Frames = Vec<Frame, 4>;

/// How command frames are acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    /// Fire-and-forget; moves are paced by their estimated duration.
    None,
    /// Every frame waits for `OK` within the read timeout.
    Required,
    /// Every frame waits for `OK`; on timeout the frame is sent once more.
    RequiredWithRetry,
}

/// Controller-specific framing.
pub trait StageProtocol {
    /// Name for logging.
    const NAME: &'static str;

    /// Acknowledgement handling given the configured response flag.
    fn ack_policy(&self, enable_response: bool) -> AckPolicy;

    /// Frames sent right after the port opens.
    fn open_frames(&self) -> Frames;

    /// Frames that start a return to reference.
    ///
    /// `positive` holds the home direction of the X and Y axes.
    fn home_frames(&self, positive: [bool; 2]) -> Frames;

    /// Status query answered with [`is_ready`](Self::is_ready) replies.
    fn ready_query(&self) -> Frame {
        frame("!:")
    }

    /// Whether a status reply means motion is complete.
    fn is_ready(&self, reply: &str) -> bool {
        reply.trim().eq_ignore_ascii_case("R")
    }

    /// Whether a reply acknowledges a command frame.
    fn is_ack(&self, reply: &str) -> bool {
        reply.trim().eq_ignore_ascii_case("OK")
    }

    /// Frames for a relative move of `pulses` on X and Y. Empty when both are zero.
    fn move_frames(&self, pulses: [i64; 2]) -> Frames;

    /// Frames that program the speed table.
    fn speed_frames(&self, pulses_per_sec: u32, ramp_ms: u32) -> Frames;
}

fn frame(text: &str) -> Frame {
    crate::error::truncated(text)
}

fn push(frames: &mut Frames, f: Frame) {
    // Capacity covers the largest operation of either family.
    let _ = frames.push(f);
}

/// Pulse-count controller (GSC-02 style).
///
/// `H:W+-` then `G` to home, `M:W+P<n>-P<m>` or `M:1+P<n>` then `G` to move,
/// `D:1S<s>F<f>R<r>S<s>F<f>R<r>` for speed. Axes are `1` (X), `2` (Y) and
/// `W` (both). Acknowledgements are optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct GscProtocol;

impl StageProtocol for GscProtocol {
    const NAME: &'static str = "gsc02";

    fn ack_policy(&self, enable_response: bool) -> AckPolicy {
        if enable_response {
            AckPolicy::Required
        } else {
            AckPolicy::None
        }
    }

    fn open_frames(&self) -> Frames {
        Frames::new()
    }

    fn home_frames(&self, positive: [bool; 2]) -> Frames {
        let sign = |p: bool| if p { '+' } else { '-' };
        let mut f = Frame::new();
        let _ = write!(f, "H:W{}{}", sign(positive[0]), sign(positive[1]));

        let mut frames = Frames::new();
        push(&mut frames, f);
        push(&mut frames, frame("G"));
        frames
    }

    fn move_frames(&self, pulses: [i64; 2]) -> Frames {
        let mut frames = Frames::new();
        let mut f = Frame::new();
        let [x, y] = pulses;
        let dx = Direction::from_pulses(x).sign_char();
        let dy = Direction::from_pulses(y).sign_char();

        match (x != 0, y != 0) {
            (false, false) => return frames,
            (true, true) => {
                let _ = write!(f, "M:W{}P{}{}P{}", dx, x.unsigned_abs(), dy, y.unsigned_abs());
            }
            (true, false) => {
                let _ = write!(f, "M:1{}P{}", dx, x.unsigned_abs());
            }
            (false, true) => {
                let _ = write!(f, "M:2{}P{}", dy, y.unsigned_abs());
            }
        }

        push(&mut frames, f);
        push(&mut frames, frame("G"));
        frames
    }

    fn speed_frames(&self, pulses_per_sec: u32, ramp_ms: u32) -> Frames {
        let mut f = Frame::new();
        let s = pulses_per_sec;
        let _ = write!(f, "D:1S{}F{}R{}S{}F{}R{}", s, s, ramp_ms, s, s, ramp_ms);

        let mut frames = Frames::new();
        push(&mut frames, f);
        frames
    }
}

/// Controller with `MGO:` relative moves (QT-BMM2 style).
///
/// `X:1` enables replies at open, `H:A B` homes, `MGO:A<n> B<m>` moves and
/// `D:A,<low>,<high>,<ramp>` sets speed per axis. Every frame is acknowledged.
#[derive(Debug, Clone, Copy, Default)]
pub struct QtProtocol;

impl StageProtocol for QtProtocol {
    const NAME: &'static str = "chuo";

    fn ack_policy(&self, _enable_response: bool) -> AckPolicy {
        AckPolicy::RequiredWithRetry
    }

    fn open_frames(&self) -> Frames {
        let mut frames = Frames::new();
        push(&mut frames, frame("X:1"));
        frames
    }

    fn home_frames(&self, _positive: [bool; 2]) -> Frames {
        let mut frames = Frames::new();
        push(&mut frames, frame("H:A B"));
        frames
    }

    fn move_frames(&self, pulses: [i64; 2]) -> Frames {
        let mut frames = Frames::new();
        let [a, b] = pulses;
        let mut f = Frame::new();
        let _ = f.push_str("MGO:");

        match (a != 0, b != 0) {
            (false, false) => return frames,
            (true, true) => {
                let _ = write!(f, "A{} B{}", a, b);
            }
            (true, false) => {
                let _ = write!(f, "A{}", a);
            }
            (false, true) => {
                let _ = write!(f, "B{}", b);
            }
        }

        push(&mut frames, f);
        frames
    }

    fn speed_frames(&self, pulses_per_sec: u32, ramp_ms: u32) -> Frames {
        let mut frames = Frames::new();
        for axis in ['A', 'B'] {
            let mut f = Frame::new();
            let _ = write!(f, "D:{},{},{},{}", axis, pulses_per_sec, pulses_per_sec, ramp_ms);
            push(&mut frames, f);
        }
        frames
    }
}
