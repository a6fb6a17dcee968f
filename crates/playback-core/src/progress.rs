use crate::Chunk;

/// Position on the global timeline. `total` only counts chunks whose
/// duration is known, so it grows as chunks become ready.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct Progress {
    pub elapsed: f64,
    pub total: f64,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.elapsed / self.total).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SeekTarget {
    pub index: usize,
    pub offset: f64,
}

pub fn total_known_duration(queue: &[Chunk]) -> f64 {
    queue.iter().filter_map(Chunk::known_duration).sum()
}

/// Elapsed time is the sum of known durations before `current` plus the
/// local time inside it. Unknown durations count as zero.
pub fn global_progress(queue: &[Chunk], current: Option<usize>, local_time: f64) -> Progress {
    let total = total_known_duration(queue);
    let Some(current) = current else {
        return Progress {
            elapsed: 0.0,
            total,
        };
    };

    let before: f64 = queue
        .iter()
        .take(current)
        .filter_map(Chunk::known_duration)
        .sum();
    let local = if local_time.is_finite() {
        local_time.max(0.0)
    } else {
        0.0
    };

    Progress {
        elapsed: before + local,
        total,
    }
}

/// Map a global time onto a chunk and a local offset. Chunks without a known
/// duration are skipped, so they can never be a seek target. Returns `None`
/// when the target lies beyond the known timeline.
pub fn resolve_seek(queue: &[Chunk], target: f64) -> Option<SeekTarget> {
    if !target.is_finite() {
        return None;
    }
    let target = target.max(0.0);

    let mut cumulative = 0.0;
    for chunk in queue {
        let Some(duration) = chunk.known_duration() else {
            continue;
        };
        if cumulative + duration >= target {
            return Some(SeekTarget {
                index: chunk.index,
                offset: target - cumulative,
            });
        }
        cumulative += duration;
    }
    None
}

/// `MM:SS`, minutes unbounded. Non-finite or negative input renders as
/// `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use narrate_segmenter::Segment;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::{ChunkStatus, build_queue};

    fn queue_with(durations: &[Option<f64>]) -> Vec<Chunk> {
        let mut queue = build_queue(
            (0..durations.len())
                .map(|i| Segment {
                    text: format!("w{i}"),
                    start_word: i,
                    end_word: i,
                })
                .collect(),
        );
        for (chunk, duration) in queue.iter_mut().zip(durations) {
            if let Some(d) = duration {
                chunk.status = ChunkStatus::Ready;
                chunk.duration = Some(*d);
            }
        }
        queue
    }

    #[test]
    fn seek_lands_in_second_chunk() {
        let queue = queue_with(&[Some(10.0), Some(15.0), None]);
        let target = resolve_seek(&queue, 12.0).unwrap();

        assert_eq!(target.index, 1);
        assert_relative_eq!(target.offset, 2.0);
    }

    #[test]
    fn seek_past_known_timeline_is_noop() {
        let queue = queue_with(&[Some(10.0), Some(15.0), None]);
        assert_eq!(resolve_seek(&queue, 30.0), None);
        assert_eq!(resolve_seek(&queue, f64::NAN), None);
    }

    #[test]
    fn seek_skips_unknown_chunks() {
        let queue = queue_with(&[None, Some(4.0)]);
        let target = resolve_seek(&queue, 1.0).unwrap();
        assert_eq!(target.index, 1);
        assert_relative_eq!(target.offset, 1.0);
    }

    #[test]
    fn progress_undercounts_unknown_durations() {
        let queue = queue_with(&[Some(10.0), None, Some(5.0)]);
        let progress = global_progress(&queue, Some(2), 1.5);

        assert_relative_eq!(progress.elapsed, 11.5);
        assert_relative_eq!(progress.total, 15.0);
    }

    #[test]
    fn idle_progress_has_no_elapsed_time() {
        let queue = queue_with(&[Some(3.0)]);
        let progress = global_progress(&queue, None, 2.0);
        assert_relative_eq!(progress.elapsed, 0.0);
        assert_relative_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(75.9), "01:15");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(f64::NAN), "00:00");
    }

    #[quickcheck]
    fn seek_then_progress_round_trips(durations: Vec<u8>, pick: u16) -> TestResult {
        if durations.is_empty() {
            return TestResult::discard();
        }
        let durations: Vec<Option<f64>> = durations
            .iter()
            .map(|d| Some(f64::from(*d) / 4.0 + 0.25))
            .collect();
        let queue = queue_with(&durations);
        let total = total_known_duration(&queue);
        let target = total * f64::from(pick) / f64::from(u16::MAX);

        let Some(seek) = resolve_seek(&queue, target) else {
            return TestResult::failed();
        };
        let progress = global_progress(&queue, Some(seek.index), seek.offset);

        TestResult::from_bool((progress.elapsed - target).abs() < 1e-9)
    }
}
