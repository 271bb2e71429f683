//! Overlay frame selection: attention-ranked with graceful degradation

mod test_helpers;

use swing_analysis::constants::{NUM_FEATURES, NUM_KEYPOINTS};
use swing_analysis::features::SwingFeatures;
use swing_analysis::keypoints::Keypoint;
use swing_analysis::overlay::select_frames;
use swing_analysis::scoring::AttentionWeights;
use swing_analysis::segmentation::PhaseBoundaries;
use test_helpers::base_keypoints;

fn features(seq_len: usize, source_len: usize) -> SwingFeatures {
    SwingFeatures {
        matrix: ndarray::Array2::zeros((seq_len, NUM_FEATURES)),
        boundaries: PhaseBoundaries {
            backswing_start: 0,
            contact: 1,
        },
        source_len,
    }
}

fn frames(count: usize) -> Vec<swing_analysis::keypoints::FrameData> {
    (0..count)
        .map(|_| swing_analysis::keypoints::FrameData {
            timestamp: 0.0,
            keypoints: base_keypoints(),
            velocities: None,
            accelerations: None,
            joint_angles: [90.0; 8],
        })
        .collect()
}

#[test]
fn test_single_dominant_peak_selects_that_frame() {
    let mut attention = AttentionWeights::uniform(60, NUM_KEYPOINTS);
    attention.temporal = vec![0.0; 60];
    attention.temporal[37] = 1.0;

    let selected = select_frames(&attention, &features(60, 60), &frames(60), 0.3, 8, 1);
    assert_eq!(selected, vec![37]);
}

#[test]
fn test_unusable_peak_falls_back_to_next_by_rank() {
    let mut attention = AttentionWeights::uniform(10, NUM_KEYPOINTS);
    attention.temporal = vec![0.01; 10];
    attention.temporal[4] = 0.5; // dominant but unusable
    attention.temporal[7] = 0.3; // next best

    let mut segment_frames = frames(10);
    for kp in segment_frames[4].keypoints.iter_mut() {
        *kp = Keypoint::default();
    }

    let selected = select_frames(&attention, &features(10, 10), &segment_frames, 0.3, 8, 1);
    assert_eq!(selected, vec![7]);
}

#[test]
fn test_top_k_returns_distinct_source_frames() {
    // With a 90-long attention vector over a 30-frame segment, neighboring
    // resampled indices collapse onto the same source frame; selection must
    // not report duplicates
    let mut attention = AttentionWeights::uniform(90, NUM_KEYPOINTS);
    attention.temporal = vec![0.0; 90];
    attention.temporal[60] = 0.4;
    attention.temporal[61] = 0.35; // same source frame as 60 after mapping
    attention.temporal[15] = 0.25;

    let selected = select_frames(&attention, &features(90, 30), &frames(30), 0.3, 8, 2);
    assert_eq!(selected.len(), 2);
    assert_ne!(selected[0], selected[1]);
    assert_eq!(selected[0], 20); // resampled 60 of 90 -> source 20 of 30
}

#[test]
fn test_all_frames_unusable_returns_empty() {
    let attention = AttentionWeights::uniform(10, NUM_KEYPOINTS);
    let mut segment_frames = frames(10);
    for frame in &mut segment_frames {
        for kp in frame.keypoints.iter_mut() {
            kp.confidence = 0.0;
        }
    }
    let selected = select_frames(&attention, &features(10, 10), &segment_frames, 0.3, 8, 3);
    assert!(selected.is_empty());
}
