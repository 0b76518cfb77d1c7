/*!
 * Subtitle interval detection.
 *
 * - `signal`: frame signal records and the analyzer capability
 * - `interval`: the per-channel state machine turning signals into intervals
 */

pub use self::interval::{
    ChannelState, DEFAULT_SCORE_THRESHOLD, Interval, IntervalDetector, StateAction, detect_intervals,
};
pub use self::signal::{ChannelSignal, FrameAnalyzer, FrameSignal, FrameSignals, SignalFile};

pub mod interval;
pub mod signal;
