use crate::error::SyncError;
use crate::types::{ActivityTimeline, DialogueSet, TimeInterval};

/// Seconds of `speech` covered by `dialog`.
///
/// Disjoint pairs contribute nothing; otherwise the first matching case wins.
pub fn overlap_seconds(speech: &TimeInterval, dialog: &TimeInterval) -> f64 {
    if speech.start > dialog.end || dialog.start > speech.end {
        return 0.0;
    }
    if dialog.start <= speech.start && dialog.end >= speech.end {
        speech.end - speech.start
    } else if dialog.start >= speech.start && speech.end >= dialog.end {
        dialog.end - dialog.start
    } else if dialog.start <= speech.start
        && speech.start <= dialog.end
        && dialog.end <= speech.end
    {
        dialog.end - speech.start
    } else if speech.start <= dialog.start
        && dialog.start <= speech.end
        && speech.end <= dialog.end
    {
        speech.end - dialog.start
    } else {
        0.0
    }
}

/// Overlapped seconds divided by the reference's total duration.
///
/// Every dialogue line is measured against the reference on its own, so lines
/// overlapping the same speech second are all counted. A zero-duration
/// reference scores `0.0`.
pub fn score_overlap(
    reference: &ActivityTimeline,
    candidate: &DialogueSet,
) -> Result<f64, SyncError> {
    for (idx, interval) in candidate.intervals.iter().enumerate() {
        interval.check().map_err(|msg| {
            SyncError::invalid_dialogue(format!("{} line {}: {msg}", candidate.id, idx + 1))
        })?;
    }

    let total = reference.total_duration();
    if total <= 0.0 {
        tracing::debug!(
            candidate = candidate.id.as_str(),
            "overlap: reference has no speech, scoring 0"
        );
        return Ok(0.0);
    }

    let spans = reference.intervals();
    let mut matched = 0.0f64;
    for dialog in &candidate.intervals {
        // spans are sorted with increasing ends, so everything before `first`
        // ends before the line starts
        let first = spans.partition_point(|speech| speech.end < dialog.start);
        for speech in &spans[first..] {
            if speech.start > dialog.end {
                break;
            }
            matched += overlap_seconds(speech, dialog);
        }
    }

    Ok(matched / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: f64, end: f64) -> TimeInterval {
        TimeInterval::new(start, end)
    }

    fn timeline(seconds: &[u64]) -> ActivityTimeline {
        ActivityTimeline::from_active_seconds(seconds).unwrap()
    }

    fn score_all_pairs(reference: &ActivityTimeline, candidate: &DialogueSet) -> f64 {
        let matched: f64 = candidate
            .intervals
            .iter()
            .flat_map(|d| reference.intervals().iter().map(move |s| overlap_seconds(s, d)))
            .sum();
        matched / reference.total_duration()
    }

    #[test]
    fn disjoint_pair_contributes_nothing() {
        assert_eq!(overlap_seconds(&span(10.0, 11.0), &span(0.0, 1.0)), 0.0);
        assert_eq!(overlap_seconds(&span(0.0, 1.0), &span(10.0, 11.0)), 0.0);
    }

    #[test]
    fn speech_inside_dialog_counts_fully() {
        assert_eq!(overlap_seconds(&span(2.0, 3.0), &span(1.0, 4.0)), 1.0);
    }

    #[test]
    fn dialog_inside_speech_counts_dialog_length() {
        assert_eq!(overlap_seconds(&span(2.0, 5.0), &span(3.0, 3.5)), 0.5);
    }

    #[test]
    fn partial_overlap_dialog_ends_inside_speech() {
        assert_eq!(overlap_seconds(&span(2.0, 3.0), &span(1.0, 2.5)), 0.5);
    }

    #[test]
    fn partial_overlap_dialog_starts_inside_speech() {
        assert_eq!(overlap_seconds(&span(5.0, 6.0), &span(5.5, 7.0)), 0.5);
    }

    #[test]
    fn touching_intervals_contribute_zero() {
        assert_eq!(overlap_seconds(&span(2.0, 3.0), &span(3.0, 4.0)), 0.0);
        assert_eq!(overlap_seconds(&span(2.0, 3.0), &span(1.0, 2.0)), 0.0);
    }

    #[test]
    fn identical_sets_score_one() {
        let reference = timeline(&[0, 5, 9]);
        let candidate = DialogueSet::new("same", reference.intervals().to_vec());
        assert_eq!(score_overlap(&reference, &candidate).unwrap(), 1.0);
    }

    #[test]
    fn empty_candidate_scores_zero() {
        let reference = timeline(&[0, 5, 9]);
        let candidate = DialogueSet::new("empty", Vec::new());
        assert_eq!(score_overlap(&reference, &candidate).unwrap(), 0.0);
    }

    #[test]
    fn zero_duration_reference_scores_zero() {
        let candidate = DialogueSet::from_pairs("a", &[(0.0, 10.0)]);
        assert_eq!(
            score_overlap(&ActivityTimeline::empty(), &candidate).unwrap(),
            0.0
        );
    }

    #[test]
    fn three_second_scenario() {
        let reference = timeline(&[0, 5, 9]);
        let a = DialogueSet::from_pairs("a", &[(0.0, 1.0), (5.0, 6.0)]);
        let b = DialogueSet::from_pairs("b", &[(2.0, 4.0), (11.0, 12.5)]);
        let score_a = score_overlap(&reference, &a).unwrap();
        assert!((score_a - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(score_overlap(&reference, &b).unwrap(), 0.0);
    }

    #[test]
    fn overlapping_lines_are_counted_twice() {
        let reference = timeline(&[0]);
        let candidate = DialogueSet::from_pairs("dense", &[(0.0, 1.0), (0.0, 1.0)]);
        assert_eq!(score_overlap(&reference, &candidate).unwrap(), 2.0);
    }

    #[test]
    fn malformed_line_is_rejected() {
        let reference = timeline(&[0]);
        for pairs in [[(2.0, 1.0)], [(-1.0, 1.0)], [(f64::NAN, 1.0)]] {
            let candidate = DialogueSet::from_pairs("bad", &pairs);
            assert!(matches!(
                score_overlap(&reference, &candidate),
                Err(SyncError::InvalidDialogue { .. })
            ));
        }
    }

    #[test]
    fn pruned_scan_matches_all_pairs() {
        let reference = timeline(&[0, 1, 2, 6, 7, 12, 20, 21, 30]);
        let candidate = DialogueSet::from_pairs(
            "mixed",
            &[
                (0.5, 2.2),
                (1.0, 1.0),
                (5.9, 6.1),
                (6.0, 7.0),
                (11.0, 13.0),
                (19.5, 40.0),
                (3.0, 4.0),
                (0.0, 0.5),
            ],
        );
        let pruned = score_overlap(&reference, &candidate).unwrap();
        let exhaustive = score_all_pairs(&reference, &candidate);
        assert!((pruned - exhaustive).abs() < 1e-12);
    }
}
