//! Ball classification on the cropped mirror image

use crate::config::DetectionConfig;
use crate::error::VisionError;
use crate::processing::{contours, mapper, segmentation};
use opencv::{
    core::{Mat, Point2f},
    imgproc,
    prelude::*,
};
use panna_core::BallDetection;
use tracing::debug;

/// Fitted circles below this radius are noise, independent of configuration
const MIN_RADIUS_PX: f32 = 2.0;

/// Classify the ball in the shared cropped HSV buffer
///
/// Area filtering is upper-bound-only: small blobs are handled by the fixed
/// minimum-radius check on the fitted circle, not by a minimum area.
pub fn classify(
    hsv: &Mat,
    frame_local_center: (i32, i32),
    config: &DetectionConfig,
) -> Result<BallDetection, VisionError> {
    let mask = segmentation::hsv_mask(hsv, &config.ball)?;
    let found = contours::largest_matching(&contours::external_contours(&mask)?, |area| {
        area < config.ball.max_area
    })?;
    let Some((contour, _)) = found else {
        return Ok(BallDetection::default());
    };

    let mut center = Point2f::default();
    let mut radius = 0.0f32;
    imgproc::min_enclosing_circle(&contour, &mut center, &mut radius)?;
    if radius < MIN_RADIUS_PX {
        debug!("Ball candidate radius {:.2} below minimum, rejected", radius);
        return Ok(BallDetection::default());
    }

    let area = std::f64::consts::PI * f64::from(radius).powi(2);
    let (horizontal_error, vertical_error) = mapper::to_errors(
        f64::from(center.x),
        f64::from(center.y),
        frame_local_center,
    );

    let is_close = area >= config.proximity_threshold;
    let is_centered_horizontally = horizontal_error.abs() <= config.angle_tolerance;

    Ok(BallDetection {
        detected: true,
        center_x: center.x.round() as i32,
        center_y: center.y.round() as i32,
        radius: radius.round() as i32,
        area,
        horizontal_error,
        vertical_error,
        is_close,
        is_centered_horizontally,
        is_close_and_centered: is_close && is_centered_horizontally,
    })
}
