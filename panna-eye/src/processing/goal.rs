//! Goal classification on the cropped mirror image
//!
//! Runs once per goal color against the HSV buffer the pipeline converted
//! once; the two colors share every acceptance window except the HSV range.

use crate::config::{GoalConfig, HsvRange};
use crate::error::VisionError;
use crate::processing::{contours, mapper, segmentation};
use opencv::{core::Mat, imgproc, prelude::*};
use panna_core::{GoalColor, GoalDetection};
use tracing::debug;

/// Classify one goal color in the shared cropped HSV buffer
pub fn classify(
    hsv: &Mat,
    frame_local_center: (i32, i32),
    range: &HsvRange,
    goal: &GoalConfig,
    color: GoalColor,
) -> Result<GoalDetection, VisionError> {
    let mask = segmentation::hsv_mask(hsv, range)?;
    let found = contours::largest_matching(&contours::external_contours(&mask)?, |area| {
        area >= range.min_area && area <= range.max_area
    })?;
    let Some((contour, area)) = found else {
        return Ok(GoalDetection::default());
    };

    let rect = imgproc::bounding_rect(&contour)?;
    if rect.width < goal.min_width || rect.height < goal.min_height {
        debug!(
            "{} goal candidate {}x{} below minimum size, rejected",
            color, rect.width, rect.height
        );
        return Ok(GoalDetection::default());
    }

    let aspect_ratio = if rect.height == 0 {
        0.0
    } else {
        f64::from(rect.width) / f64::from(rect.height)
    };
    if aspect_ratio < goal.aspect_ratio_min || aspect_ratio > goal.aspect_ratio_max {
        debug!(
            "{} goal candidate aspect {:.2} outside window, rejected",
            color, aspect_ratio
        );
        return Ok(GoalDetection::default());
    }

    let center_x = f64::from(rect.x) + f64::from(rect.width) / 2.0;
    let center_y = f64::from(rect.y) + f64::from(rect.height) / 2.0;
    let (horizontal_error, vertical_error) =
        mapper::to_errors(center_x, center_y, frame_local_center);

    Ok(GoalDetection {
        detected: true,
        center_x: center_x.round() as i32,
        center_y: center_y.round() as i32,
        width: rect.width,
        height: rect.height,
        area,
        horizontal_error,
        vertical_error,
        is_centered_horizontally: horizontal_error.abs() <= goal.center_tolerance,
    })
}
