//! Swing analysis command-line tool: score tennis strokes in one or more videos.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use swing_analysis::config::{AnalysisConfig, EXAMPLE_CONFIG};
use swing_analysis::pipeline::{AnalysisRequest, CancelToken, SwingAnalyzer, VideoAnalysis};
use swing_analysis::segmentation::{Handedness, StrokeType};
use swing_analysis::video;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video file(s) to analyze
    #[arg(required_unless_present = "example_config")]
    videos: Vec<PathBuf>,

    /// Stroke type label (forehand, backhand, serve)
    #[arg(short, long, default_value = "forehand")]
    stroke: String,

    /// Player handedness (left, right); inferred from the video when omitted
    #[arg(long)]
    handedness: Option<String>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for overlays, clips, and reports
    #[arg(short, long, default_value = "analysis_out")]
    output: PathBuf,

    /// Write a JSON report per video
    #[arg(long)]
    json: bool,

    /// Export each detected swing as an .mp4 clip
    #[arg(long)]
    export_clips: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            AnalysisConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    let request = AnalysisRequest {
        stroke: args.stroke.parse::<StrokeType>()?,
        handedness: match args.handedness.as_deref() {
            Some("left") => Some(Handedness::Left),
            Some("right") => Some(Handedness::Right),
            Some(other) => anyhow::bail!("Unknown handedness: {other} (expected left or right)"),
            None => None,
        },
    };

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating output directory {}", args.output.display()))?;

    if args.videos.len() == 1 {
        let analyzer = SwingAnalyzer::new(config)?;
        process_video(&analyzer, &args.videos[0], &request, &args)?;
    } else {
        // Independent videos are embarrassingly parallel. Each worker builds
        // its own analyzer so inference sessions are never shared across
        // threads.
        info!("Processing {} videos across the worker pool", args.videos.len());
        let failures: Vec<String> = args
            .videos
            .par_iter()
            .filter_map(|path| {
                let run = || -> Result<()> {
                    let analyzer = SwingAnalyzer::new(config.clone())?;
                    process_video(&analyzer, path, &request, &args)
                };
                run().err().map(|e| format!("{}: {e:#}", path.display()))
            })
            .collect();

        if !failures.is_empty() {
            for failure in &failures {
                warn!("Failed: {failure}");
            }
            anyhow::bail!("{} of {} videos failed", failures.len(), args.videos.len());
        }
    }

    Ok(())
}

fn process_video(analyzer: &SwingAnalyzer, path: &Path, request: &AnalysisRequest, args: &Args) -> Result<()> {
    let analysis = analyzer
        .analyze_file(path, request, &CancelToken::new())
        .with_context(|| format!("analyzing {}", path.display()))?;

    print_summary(path, &analysis);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());

    for (i, report) in analysis.reports.iter().enumerate() {
        for overlay in &report.overlays {
            let out = args.output.join(format!("{stem}_swing_{i}_frame_{}.png", overlay.frame_index));
            std::fs::write(&out, &overlay.png).with_context(|| format!("writing {}", out.display()))?;
            info!("Wrote overlay {}", out.display());
        }
    }

    if args.export_clips && !analysis.reports.is_empty() {
        let decoded = video::load_video(path)?;
        for (i, report) in analysis.reports.iter().enumerate() {
            let clip = &decoded.frames[report.segment.start..report.segment.end];
            let out = args.output.join(format!("{stem}_swing_{i}.mp4"));
            video::save_clip(clip, &out, decoded.fps)?;
            info!("Wrote clip {}", out.display());
        }
    }

    if args.json {
        let out = args.output.join(format!("{stem}_analysis.json"));
        let report = serde_json::to_string_pretty(&analysis)?;
        std::fs::write(&out, report).with_context(|| format!("writing {}", out.display()))?;
        info!("Wrote report {}", out.display());
    }

    Ok(())
}

fn print_summary(path: &Path, analysis: &VideoAnalysis) {
    println!(
        "{}: {} swing(s) in {} frames @ {:.1} fps",
        path.display(),
        analysis.reports.len(),
        analysis.frame_count,
        analysis.fps
    );

    if analysis.handedness.inferred {
        println!(
            "  handedness: {:?} (inferred{})",
            analysis.handedness.handedness,
            if analysis.handedness.low_confidence {
                ", LOW CONFIDENCE — confirm with the player"
            } else {
                ""
            }
        );
    }

    if analysis.reports.is_empty() {
        println!("  no swings detected");
        return;
    }

    for (i, report) in analysis.reports.iter().enumerate() {
        let score = &report.score;
        println!(
            "  swing {i}: frames {}..{} score {:.0}{}",
            report.segment.start,
            report.segment.end,
            score.overall,
            if score.heuristic { " (heuristic)" } else { "" }
        );
        println!(
            "    phases: prep {:.0} / backswing {:.0} / contact {:.0} / follow-through {:.0}",
            score.phase_scores.preparation,
            score.phase_scores.backswing,
            score.phase_scores.contact,
            score.phase_scores.follow_through
        );
        for deviation in &score.feature_deviations {
            println!("    {}", deviation.describe());
        }
    }
}
