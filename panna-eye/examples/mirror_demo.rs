//! Live demo: stream camera frames through the vision pipeline
//!
//! Prints ball and mirror state for a few hundred frames, then exits.

use anyhow::Result;
use chrono::Utc;
use panna_core::{DetectionRequest, FrameMeta};
use panna_eye::{CameraConfig, CameraSource, DetectionConfig, VisionPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let source = CameraSource::new(CameraConfig::default())?;
    let mut frames = source.start_stream()?;
    let mut pipeline = VisionPipeline::new(DetectionConfig::default())?;

    let mut frame_id = 0u64;
    while let Some(frame) = frames.recv().await {
        frame_id += 1;
        let meta = FrameMeta::new(frame_id, Utc::now());
        let bundle = pipeline.process(&frame, meta, DetectionRequest::all())?;

        if bundle.ball.detected {
            println!(
                "frame {}: ball h={:+.3} v={:+.3} r={} close={} centered={}",
                frame_id,
                bundle.ball.horizontal_error,
                bundle.ball.vertical_error,
                bundle.ball.radius,
                bundle.ball.is_close,
                bundle.ball.is_centered_horizontally,
            );
        } else {
            println!(
                "frame {}: no ball (mirror detected: {})",
                frame_id, bundle.mirror_detected
            );
        }

        if frame_id >= 300 {
            break;
        }
    }

    source.stop();
    Ok(())
}
