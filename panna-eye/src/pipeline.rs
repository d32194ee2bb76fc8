//! Detection pipeline orchestrator
//!
//! One `VisionPipeline` per frame producer: `process` mutates the mirror
//! track in place, so calls must stay sequential on a single instance. The
//! pipeline crops and converts the frame once and feeds the shared HSV
//! buffer to whichever classifiers the request names.

use crate::config::DetectionConfig;
use crate::error::VisionError;
use crate::processing::{ball, goal, segmentation, MirrorTracker};
use opencv::{core::Mat, prelude::*};
use panna_core::{DetectionBundle, DetectionRequest, FrameMeta, GoalColor};
use tracing::debug;

/// Synchronous per-frame detection pipeline
pub struct VisionPipeline {
    config: DetectionConfig,
    mirror: MirrorTracker,
}

impl VisionPipeline {
    /// Create a pipeline, failing fast on invalid configuration
    pub fn new(config: DetectionConfig) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;
        let mirror = MirrorTracker::new(config.mirror);
        Ok(Self { config, mirror })
    }

    /// Process one frame and return a fully-populated bundle
    ///
    /// An empty frame is a valid no-op input: the bundle comes back with
    /// every `detected` flag false and no error. Detection absence is never
    /// an error; `Err` means an OpenCV-level fault.
    pub fn process(
        &mut self,
        frame: &Mat,
        meta: FrameMeta,
        request: DetectionRequest,
    ) -> Result<DetectionBundle, VisionError> {
        let mut bundle = DetectionBundle::empty(meta);
        if frame.empty() {
            debug!("Empty frame {}, skipping detection", meta.frame_id);
            return Ok(bundle);
        }

        // The mirror track advances exactly once per invocation, no matter
        // how many classifiers run afterwards
        self.mirror.update(frame)?;
        bundle.mirror_detected = self.mirror.detected();
        if let Some(circle) = self.mirror.circle() {
            bundle.mirror_center = Some((circle.cx, circle.cy));
            bundle.mirror_radius = Some(circle.radius);
        }

        if request.is_empty() {
            return Ok(bundle);
        }

        let cropped = self.mirror.crop(frame)?;
        let hsv = segmentation::to_hsv(&cropped)?;
        let center = self.mirror.frame_local_center();

        if request.ball {
            bundle.ball = ball::classify(&hsv, center, &self.config)?;
        }
        if request.blue_goal {
            bundle.blue_goal = goal::classify(
                &hsv,
                center,
                &self.config.blue_goal,
                &self.config.goal,
                GoalColor::Blue,
            )?;
        }
        if request.yellow_goal {
            bundle.yellow_goal = goal::classify(
                &hsv,
                center,
                &self.config.yellow_goal,
                &self.config.goal,
                GoalColor::Yellow,
            )?;
        }

        Ok(bundle)
    }

    /// Operator-triggered redetect: drop the mirror track and start over
    pub fn reset_mirror(&mut self) {
        self.mirror.reset();
    }

    /// Mirror tracker, for callers that need cropped or masked imagery
    /// (overlay rendering lives outside this crate)
    pub fn mirror(&self) -> &MirrorTracker {
        &self.mirror
    }

    /// Active configuration
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }
}
