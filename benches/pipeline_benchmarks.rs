//! Benchmarks for the numeric pipeline stages (no model inference)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector2;
use std::sync::Arc;
use swing_analysis::config::{SegmentationConfig, SmoothingConfig};
use swing_analysis::constants::NUM_KEYPOINTS;
use swing_analysis::features::FeatureExtractor;
use swing_analysis::filters::{
    exponential::ExponentialFilter, hampel::HampelFilter, kalman::KalmanFilter, low_pass::LowPassFilter,
    median::MedianFilter, moving_average::MovingAverageFilter, NoFilter, TrajectoryFilter,
};
use swing_analysis::keypoints::{JointId, Keypoint};
use swing_analysis::reference_stats::ReferenceStats;
use swing_analysis::scoring::{HeuristicScorer, SwingScorer};
use swing_analysis::segmentation::{Handedness, StrokeType, SwingSegmenter};
use swing_analysis::smoothing::{RawFrame, TrajectorySmoother};

/// Synthetic 300-frame video with a fast wrist burst in the middle
fn synthetic_video() -> Vec<RawFrame> {
    (0..300)
        .map(|t| {
            let mut keypoints = [Keypoint::new(0.5, 0.45, 0.9); NUM_KEYPOINTS];
            keypoints[JointId::LeftShoulder.index()] = Keypoint::new(0.44, 0.32, 0.9);
            keypoints[JointId::RightShoulder.index()] = Keypoint::new(0.56, 0.32, 0.9);
            keypoints[JointId::LeftHip.index()] = Keypoint::new(0.46, 0.58, 0.9);
            keypoints[JointId::RightHip.index()] = Keypoint::new(0.54, 0.58, 0.9);
            let phase = (t as f32 / 30.0) * std::f32::consts::TAU;
            let amplitude = if (100..180).contains(&t) { 0.25 } else { 0.01 };
            keypoints[JointId::RightWrist.index()] =
                Keypoint::new(0.6 + amplitude * phase.sin(), 0.5, if t % 13 == 0 { 0.1 } else { 0.9 });
            RawFrame {
                timestamp: t as f64 / 30.0,
                keypoints,
            }
        })
        .collect()
}

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("trajectory_filters");

    let test_data: Vec<Vector2<f64>> = (0..100)
        .map(|i| {
            let t = i as f64 * 0.1;
            Vector2::new(0.5 + 0.2 * t.sin(), 0.5 + 0.15 * t.cos())
        })
        .collect();

    let filter_configs: Vec<(&str, Box<dyn TrajectoryFilter>)> = vec![
        ("no_filter", Box::new(NoFilter)),
        ("moving_average_5", Box::new(MovingAverageFilter::new(5))),
        ("median_5", Box::new(MedianFilter::new(5))),
        ("exponential_0.5", Box::new(ExponentialFilter::new(0.5))),
        ("low_pass_0.5", Box::new(LowPassFilter::new(0.5))),
        ("hampel_5", Box::new(HampelFilter::new(5, 3.0))),
        ("kalman", Box::new(KalmanFilter::new())),
    ];

    for (name, mut filter) in filter_configs {
        group.bench_with_input(BenchmarkId::new("sequence_100", name), &test_data, |b, data| {
            b.iter(|| {
                filter.reset();
                for &point in data {
                    black_box(filter.apply(black_box(point)));
                }
            });
        });
    }
    group.finish();
}

fn benchmark_smoothing(c: &mut Criterion) {
    let raw = synthetic_video();
    let config = SmoothingConfig::default();
    let smoother = TrajectorySmoother::new(0.3, &config).unwrap();

    c.bench_function("smoothing_300_frames", |b| {
        b.iter(|| black_box(smoother.smooth(black_box(&raw), 30.0).unwrap()));
    });
}

fn benchmark_segmentation(c: &mut Criterion) {
    let raw = synthetic_video();
    let smoother = TrajectorySmoother::new(0.3, &SmoothingConfig::default()).unwrap();
    let frames = smoother.smooth(&raw, 30.0).unwrap();
    let segmenter = SwingSegmenter::new(SegmentationConfig::default());

    c.bench_function("segmentation_300_frames", |b| {
        b.iter(|| black_box(segmenter.detect_segments(black_box(&frames), Handedness::Right, None)));
    });
}

fn benchmark_feature_extraction_and_scoring(c: &mut Criterion) {
    let raw = synthetic_video();
    let smoother = TrajectorySmoother::new(0.3, &SmoothingConfig::default()).unwrap();
    let frames = smoother.smooth(&raw, 30.0).unwrap();
    let segmenter = SwingSegmenter::new(SegmentationConfig::default());
    let segments = segmenter.detect_segments(&frames, Handedness::Right, None);
    let segment = segments.first().copied().expect("synthetic burst must segment");
    let boundaries = segmenter.label_phases(&frames, &segment, Handedness::Right);
    let extractor = FeatureExtractor::new(90).unwrap();

    c.bench_function("feature_extraction", |b| {
        b.iter(|| {
            black_box(
                extractor
                    .extract(black_box(&frames[segment.start..segment.end]), boundaries, Handedness::Right)
                    .unwrap(),
            )
        });
    });

    let features = extractor
        .extract(&frames[segment.start..segment.end], boundaries, Handedness::Right)
        .unwrap();
    let scorer = HeuristicScorer::new(Arc::new(ReferenceStats::uniform()));

    c.bench_function("heuristic_scoring", |b| {
        b.iter(|| black_box(scorer.score(black_box(&features), StrokeType::Forehand).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_filters,
    benchmark_smoothing,
    benchmark_segmentation,
    benchmark_feature_extraction_and_scoring
);
criterion_main!(benches);
