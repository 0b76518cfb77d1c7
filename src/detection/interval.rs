/*!
 * Per-channel interval state machine.
 *
 * Each channel is either idle or holding an open interval. Open signals
 * (re)start the interval, close signals emit it. Frames scoring below the
 * threshold never change state.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;

use super::signal::{FrameSignal, FrameSignals};

/// Default minimum subtitle-presence score for a frame to count
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.9;

/// A contiguous frame range with subtitle text on one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start_frame: u64,
    pub end_frame: u64,
    pub channel: Channel,
}

/// State of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Idle,
    Open { start_frame: u64 },
}

/// What a single frame did to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    /// No state change
    Continue,
    /// An interval was opened at this frame
    Open,
    /// An already open interval had its start moved to this frame
    Reopen { previous_start: u64 },
    /// The open interval was closed at this frame
    Close { start_frame: u64, end_frame: u64 },
}

impl ChannelState {
    /// Apply one frame's signal. Open takes precedence when a frame carries both flags.
    pub fn transition(&self, signal: &FrameSignal, threshold: f32) -> (ChannelState, StateAction) {
        if signal.score < threshold {
            return (*self, StateAction::Continue);
        }

        match *self {
            ChannelState::Idle => {
                if signal.scene_change_prev {
                    (
                        ChannelState::Open { start_frame: signal.frame_index },
                        StateAction::Open,
                    )
                } else {
                    // a close while idle is a stray signal
                    (ChannelState::Idle, StateAction::Continue)
                }
            }
            ChannelState::Open { start_frame } => {
                if signal.scene_change_prev {
                    (
                        ChannelState::Open { start_frame: signal.frame_index },
                        StateAction::Reopen { previous_start: start_frame },
                    )
                } else if signal.scene_change_next && signal.frame_index > start_frame {
                    (
                        ChannelState::Idle,
                        StateAction::Close {
                            start_frame,
                            end_frame: signal.frame_index,
                        },
                    )
                } else {
                    (*self, StateAction::Continue)
                }
            }
        }
    }
}

/// Tracking data for one channel
#[derive(Debug, Clone, Copy, Default)]
struct ChannelTracker {
    state: ChannelState,
    last_frame: Option<u64>,
}

/// Interval detector holding one state machine per channel
#[derive(Debug, Clone)]
pub struct IntervalDetector {
    threshold: f32,
    bottom: ChannelTracker,
    top: ChannelTracker,
}

impl Default for IntervalDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_THRESHOLD)
    }
}

impl IntervalDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            bottom: ChannelTracker::default(),
            top: ChannelTracker::default(),
        }
    }

    fn tracker_mut(&mut self, channel: Channel) -> &mut ChannelTracker {
        match channel {
            Channel::Bottom => &mut self.bottom,
            Channel::Top => &mut self.top,
        }
    }

    /// Current state of a channel
    pub fn state(&self, channel: Channel) -> ChannelState {
        match channel {
            Channel::Bottom => self.bottom.state,
            Channel::Top => self.top.state,
        }
    }

    /// Feed one channel's signal for one frame; returns the interval it closes, if any
    pub fn process(&mut self, channel: Channel, signal: &FrameSignal) -> Option<Interval> {
        let threshold = self.threshold;
        let tracker = self.tracker_mut(channel);

        if let Some(last) = tracker.last_frame {
            if signal.frame_index <= last {
                warn!(
                    "Ignoring out-of-order frame {} on {} channel (last was {})",
                    signal.frame_index, channel, last
                );
                return None;
            }
        }
        tracker.last_frame = Some(signal.frame_index);

        let (next, action) = tracker.state.transition(signal, threshold);
        tracker.state = next;

        match action {
            StateAction::Close { start_frame, end_frame } => Some(Interval {
                start_frame,
                end_frame,
                channel,
            }),
            StateAction::Reopen { previous_start } => {
                debug!(
                    "{} channel re-triggered at frame {} (was open since {})",
                    channel, signal.frame_index, previous_start
                );
                None
            }
            StateAction::Open | StateAction::Continue => None,
        }
    }

    /// Feed every channel present in one frame record
    pub fn process_frame(&mut self, frame: &FrameSignals) -> Vec<Interval> {
        Channel::ALL
            .iter()
            .filter_map(|&channel| {
                let signal = frame.signal(channel)?;
                self.process(channel, &signal)
            })
            .collect()
    }

    /// End the stream; intervals still open have no end and are dropped
    pub fn finish(self) -> Vec<(Channel, u64)> {
        let mut dangling = Vec::new();
        for (channel, tracker) in [(Channel::Bottom, self.bottom), (Channel::Top, self.top)] {
            if let ChannelState::Open { start_frame } = tracker.state {
                debug!(
                    "Dropping unterminated {} interval opened at frame {}",
                    channel, start_frame
                );
                dangling.push((channel, start_frame));
            }
        }
        dangling
    }
}

/// Run the detector over a whole signal stream
pub fn detect_intervals<'a, I>(frames: I, threshold: f32) -> Vec<Interval>
where
    I: IntoIterator<Item = &'a FrameSignals>,
{
    let mut detector = IntervalDetector::new(threshold);
    let mut intervals = Vec::new();

    for frame in frames {
        intervals.extend(detector.process_frame(frame));
    }

    detector.finish();
    intervals
}
