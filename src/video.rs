//! Video decoding and clip export.
//!
//! The pipeline consumes decoded frames; this module is the thin boundary
//! between container formats and the analysis core.

use crate::constants::DEFAULT_FPS;
use crate::{Error, Result};
use log::{debug, warn};
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoWriter, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT};
use std::path::{Path, PathBuf};

/// Basic container metadata
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    pub fps: f64,
    pub frame_count: usize,
    pub duration_secs: f64,
}

/// Decoded frames plus the source frame rate
pub struct DecodedVideo {
    pub frames: Vec<Mat>,
    pub fps: f64,
}

/// Decode every frame of a video file into memory.
///
/// A container that reports no frame rate gets the default assumption; a
/// file yielding zero frames is a video error, not an empty result.
pub fn load_video<P: AsRef<Path>>(path: P) -> Result<DecodedVideo> {
    let path = path.as_ref();
    let mut capture = VideoCapture::from_file(
        path.to_str()
            .ok_or_else(|| Error::Video(format!("Non-UTF8 video path: {}", path.display())))?,
        videoio::CAP_ANY,
    )?;
    if !capture.is_opened()? {
        return Err(Error::Video(format!("Failed to open video: {}", path.display())));
    }

    let mut fps = capture.get(CAP_PROP_FPS)?;
    if !fps.is_finite() || fps <= 0.0 {
        warn!("Video reports no frame rate, assuming {DEFAULT_FPS} fps");
        fps = DEFAULT_FPS;
    }

    let mut frames = Vec::new();
    loop {
        let mut frame = Mat::default();
        if !capture.read(&mut frame)? || frame.empty() {
            break;
        }
        frames.push(frame);
    }
    debug!("Decoded {} frames at {:.2} fps from {}", frames.len(), fps, path.display());

    if frames.is_empty() {
        return Err(Error::Video(format!("No decodable frames in {}", path.display())));
    }

    Ok(DecodedVideo { frames, fps })
}

/// Decode raw video bytes. OpenCV only decodes containers from a path, so
/// the bytes are staged through a temporary file that is removed afterwards.
pub fn load_video_bytes(bytes: &[u8]) -> Result<DecodedVideo> {
    let tmp: PathBuf = std::env::temp_dir().join(format!("swing-analysis-{}.bin", std::process::id()));
    std::fs::write(&tmp, bytes)?;
    let result = load_video(&tmp);
    let _ = std::fs::remove_file(&tmp);
    result
}

/// Probe container metadata without decoding frames
pub fn video_info<P: AsRef<Path>>(path: P) -> Result<VideoInfo> {
    let path = path.as_ref();
    let capture = VideoCapture::from_file(
        path.to_str()
            .ok_or_else(|| Error::Video(format!("Non-UTF8 video path: {}", path.display())))?,
        videoio::CAP_ANY,
    )?;
    if !capture.is_opened()? {
        return Err(Error::Video(format!("Failed to open video: {}", path.display())));
    }

    let mut fps = capture.get(CAP_PROP_FPS)?;
    if !fps.is_finite() || fps <= 0.0 {
        fps = DEFAULT_FPS;
    }
    let frame_count = capture.get(CAP_PROP_FRAME_COUNT)?.max(0.0) as usize;

    Ok(VideoInfo {
        fps,
        frame_count,
        duration_secs: frame_count as f64 / fps,
    })
}

/// Write a frame range back out as an .mp4 clip (used to export detected swings)
pub fn save_clip<P: AsRef<Path>>(frames: &[Mat], path: P, fps: f64) -> Result<()> {
    let Some(first) = frames.first() else {
        return Ok(());
    };
    let size = Size::new(first.cols(), first.rows());
    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;

    let mut writer = VideoWriter::new(
        path.as_ref()
            .to_str()
            .ok_or_else(|| Error::Video("Non-UTF8 clip path".to_string()))?,
        fourcc,
        fps,
        size,
        true,
    )?;
    if !writer.is_opened()? {
        return Err(Error::Video(format!(
            "Failed to open clip writer: {}",
            path.as_ref().display()
        )));
    }

    for frame in frames {
        writer.write(frame)?;
    }
    writer.release()?;
    Ok(())
}
