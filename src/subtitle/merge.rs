/*!
 * Deduplication of consecutive captures.
 *
 * The same caption is usually captured by several adjacent intervals. Within
 * a channel, candidates are visited in start order and a candidate whose text
 * matches the previous retained event (ignoring case) only extends that
 * event's end. Blank candidates are dropped.
 */

use log::debug;

use crate::channel::Channel;

use super::event::SubtitleEvent;

/// Merge one channel's candidates. All candidates are assumed to share a channel.
pub fn merge_channel(mut candidates: Vec<SubtitleEvent>) -> Vec<SubtitleEvent> {
    // stable, so equal starts keep their input order
    candidates.sort_by_key(|event| event.start_time);

    let mut merged: Vec<SubtitleEvent> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if candidate.is_blank() {
            continue;
        }

        match merged.last_mut() {
            Some(previous) if previous.same_text(&candidate) => {
                previous.end_time = candidate.end_time;
            }
            Some(previous) if candidate.start_time <= previous.start_time => {
                // same instant read twice; the first reading stays
                debug!(
                    "Discarding {} text {:?} at {}: {:?} already starts there",
                    candidate.channel, candidate.text, candidate.start_time, previous.text
                );
                previous.end_time = previous.end_time.max(candidate.end_time);
            }
            _ => merged.push(candidate),
        }
    }

    merged
}

/// Merge every channel independently; bottom events come first, then top
pub fn merge_events(candidates: Vec<SubtitleEvent>) -> Vec<SubtitleEvent> {
    let (bottom, top): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|event| event.channel == Channel::Bottom);

    let mut merged = merge_channel(bottom);
    merged.extend(merge_channel(top));
    merged
}
