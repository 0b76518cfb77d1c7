/*!
 * Tests for per-channel interval detection
 */

use hardsub_ocr::channel::Channel;
use hardsub_ocr::detection::{
    ChannelSignal, ChannelState, DEFAULT_SCORE_THRESHOLD, FrameAnalyzer, FrameSignals, Interval, IntervalDetector,
    SignalFile, detect_intervals,
};

use crate::common;

fn channel(score: f32, prev: bool, next: bool) -> Option<ChannelSignal> {
    Some(ChannelSignal {
        score,
        scene_change_prev: prev,
        scene_change_next: next,
    })
}

fn top_frames(range: std::ops::RangeInclusive<u64>, open_at: u64, close_at: u64) -> Vec<FrameSignals> {
    range
        .map(|frame| FrameSignals {
            frame,
            bot: None,
            top: channel(0.95, frame == open_at, frame == close_at),
        })
        .collect()
}

/// Test the canonical top-channel scenario
#[test]
fn test_detectIntervals_topOpenAt10CloseAt40_shouldEmitOneInterval() {
    let frames = top_frames(0..=50, 10, 40);

    let intervals = detect_intervals(&frames, DEFAULT_SCORE_THRESHOLD);

    assert_eq!(
        intervals,
        vec![Interval {
            start_frame: 10,
            end_frame: 40,
            channel: Channel::Top,
        }]
    );
}

/// Test that a second open signal moves the start
#[test]
fn test_detectIntervals_secondOpenSignal_shouldOverwriteStart() {
    let mut frames = top_frames(0..=50, 10, 40);
    frames[25].top = channel(0.95, true, false);

    let intervals = detect_intervals(&frames, DEFAULT_SCORE_THRESHOLD);

    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].start_frame, 25);
    assert_eq!(intervals[0].end_frame, 40);
}

/// Test that low scores never change state
#[test]
fn test_detectIntervals_belowThreshold_shouldIgnoreSignals() {
    let frames: Vec<FrameSignals> = (0..20)
        .map(|frame| FrameSignals {
            frame,
            bot: channel(0.5, frame == 2, frame == 10),
            top: None,
        })
        .collect();

    assert!(detect_intervals(&frames, DEFAULT_SCORE_THRESHOLD).is_empty());
}

/// Test that channels are tracked independently and can overlap
#[test]
fn test_detectIntervals_bothChannelsOpen_shouldEmitIndependently() {
    let frames: Vec<FrameSignals> = (0..=30)
        .map(|frame| FrameSignals {
            frame,
            bot: channel(0.99, frame == 5, frame == 20),
            top: channel(0.99, frame == 10, frame == 30),
        })
        .collect();

    let intervals = detect_intervals(&frames, DEFAULT_SCORE_THRESHOLD);

    assert_eq!(intervals.len(), 2);
    assert!(intervals.contains(&Interval {
        start_frame: 5,
        end_frame: 20,
        channel: Channel::Bottom,
    }));
    assert!(intervals.contains(&Interval {
        start_frame: 10,
        end_frame: 30,
        channel: Channel::Top,
    }));
}

/// Test that a close while idle is a no-op and a dangling open is dropped
#[test]
fn test_detector_closeWhileIdleAndDanglingOpen_shouldEmitNothing() {
    let mut detector = IntervalDetector::default();

    let frames = vec![
        FrameSignals {
            frame: 1,
            bot: channel(0.95, false, true),
            top: None,
        },
        FrameSignals {
            frame: 2,
            bot: channel(0.95, true, false),
            top: None,
        },
    ];

    for frame in &frames {
        assert!(detector.process_frame(frame).is_empty());
    }
    assert_eq!(detector.state(Channel::Bottom), ChannelState::Open { start_frame: 2 });
    assert_eq!(detector.finish(), vec![(Channel::Bottom, 2)]);
}

/// Test reading an analyzer file written as JSON lines
#[test]
fn test_signalFile_jsonLines_shouldFeedDetector() {
    let temp_dir = common::create_temp_dir().unwrap();
    let content = r#"{"frame": 3, "bot": {"score": 0.97, "scene_change_next": true}}
{"frame": 1, "bot": {"score": 0.97, "scene_change_prev": true}}
{"frame": 2, "bot": {"score": 0.97}}
"#;
    let path = common::create_test_file(temp_dir.path(), "signals.jsonl", content).unwrap();

    let frames = SignalFile::new(&path).signals().unwrap();
    let intervals = detect_intervals(&frames, DEFAULT_SCORE_THRESHOLD);

    assert_eq!(frames.iter().map(|f| f.frame).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(
        intervals,
        vec![Interval {
            start_frame: 1,
            end_frame: 3,
            channel: Channel::Bottom,
        }]
    );
}
