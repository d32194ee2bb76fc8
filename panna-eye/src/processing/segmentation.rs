//! HSV color segmentation

use crate::config::HsvRange;
use crate::error::VisionError;
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
};

/// Convert a BGR image to HSV
pub fn to_hsv(bgr: &Mat) -> Result<Mat, VisionError> {
    let mut hsv = Mat::default();
    imgproc::cvt_color(bgr, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;
    Ok(hsv)
}

/// Inclusive HSV threshold producing a single-channel binary mask
///
/// Pure function: no state, no side effects.
pub fn hsv_mask(hsv: &Mat, range: &HsvRange) -> Result<Mat, VisionError> {
    let lower = Scalar::new(
        range.lower[0] as f64,
        range.lower[1] as f64,
        range.lower[2] as f64,
        0.0,
    );
    let upper = Scalar::new(
        range.upper[0] as f64,
        range.upper[1] as f64,
        range.upper[2] as f64,
        0.0,
    );
    let mut mask = Mat::default();
    core::in_range(hsv, &lower, &upper, &mut mask)?;
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_bgr(b: f64, g: f64, r: f64) -> Mat {
        Mat::new_rows_cols_with_default(4, 4, core::CV_8UC3, Scalar::new(b, g, r, 0.0)).unwrap()
    }

    #[test]
    fn test_to_hsv_shape() {
        let bgr = solid_bgr(255.0, 0.0, 0.0);
        let hsv = to_hsv(&bgr).unwrap();
        assert_eq!(hsv.rows(), 4);
        assert_eq!(hsv.cols(), 4);
        assert_eq!(hsv.channels(), 3);
    }

    #[test]
    fn test_mask_matches_blue() {
        // Pure blue lands at hue 120 in OpenCV's 0-180 scale
        let hsv = to_hsv(&solid_bgr(255.0, 0.0, 0.0)).unwrap();
        let range = HsvRange {
            lower: [100, 150, 50],
            upper: [130, 255, 255],
            min_area: 0.0,
            max_area: 1e9,
        };
        let mask = hsv_mask(&hsv, &range).unwrap();
        assert_eq!(core::count_non_zero(&mask).unwrap(), 16);
    }

    #[test]
    fn test_mask_rejects_out_of_range() {
        // White has zero saturation, so any range with a saturation floor
        // excludes it
        let hsv = to_hsv(&solid_bgr(255.0, 255.0, 255.0)).unwrap();
        let range = HsvRange {
            lower: [0, 180, 170],
            upper: [50, 255, 255],
            min_area: 0.0,
            max_area: 1e9,
        };
        let mask = hsv_mask(&hsv, &range).unwrap();
        assert_eq!(core::count_non_zero(&mask).unwrap(), 0);
    }

    #[test]
    fn test_mask_bounds_inclusive() {
        // A pixel exactly on the lower bound must be kept
        let hsv = Mat::new_rows_cols_with_default(
            2,
            2,
            core::CV_8UC3,
            Scalar::new(10.0, 180.0, 170.0, 0.0),
        )
        .unwrap();
        let range = HsvRange {
            lower: [0, 180, 170],
            upper: [50, 255, 255],
            min_area: 0.0,
            max_area: 1e9,
        };
        let mask = hsv_mask(&hsv, &range).unwrap();
        assert_eq!(core::count_non_zero(&mask).unwrap(), 4);
    }
}
