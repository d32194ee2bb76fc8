//! Circular field-of-view tracking for the catadioptric mirror
//!
//! The omnidirectional lens projects the usable field of view into one
//! circular region of the frame. `MirrorTracker` owns the only persistent
//! state of the vision pipeline: the last known circle, the crop rectangle
//! derived from it, and a full-frame binary mask. Re-detection runs every
//! `detection_interval` frames; a missed re-detection keeps the previous
//! track instead of discarding it, so a single bad frame never drops a good
//! lock.

use crate::config::{MirrorConfig, MirrorMethod};
use crate::error::VisionError;
use crate::processing::contours;
use opencv::{
    core::{self, Mat, Point, Point2f, Rect, Scalar, Vec3f, Vector},
    imgproc,
    prelude::*,
};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Contours must score above this to be accepted as the mirror circle
const CIRCULARITY_THRESHOLD: f64 = 0.7;

/// A circle in full-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circle {
    pub cx: i32,
    pub cy: i32,
    pub radius: i32,
}

/// Half-open crop rectangle in full-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl CropRect {
    /// Bounding box of a circle, clamped to the frame
    fn around(circle: &Circle, frame_width: i32, frame_height: i32) -> Self {
        Self {
            x1: (circle.cx - circle.radius).max(0),
            y1: (circle.cy - circle.radius).max(0),
            x2: (circle.cx + circle.radius).min(frame_width),
            y2: (circle.cy + circle.radius).min(frame_height),
        }
    }

    fn full_frame(frame_width: i32, frame_height: i32) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: frame_width,
            y2: frame_height,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    fn to_rect(self) -> Rect {
        Rect::new(self.x1, self.y1, self.width(), self.height())
    }
}

/// Persistent tracking state, mutated only by `MirrorTracker::update`
struct RoiState {
    circle: Option<Circle>,
    crop_rect: Option<CropRect>,
    mask: Mat,
    frame_local_center: (i32, i32),
    frames_since_redetect: u32,
}

impl RoiState {
    fn new(fallback_center: (i32, i32)) -> Self {
        Self {
            circle: None,
            crop_rect: None,
            mask: Mat::default(),
            frame_local_center: fallback_center,
            frames_since_redetect: 0,
        }
    }
}

/// Tracks the mirror circle across frames with hysteresis
pub struct MirrorTracker {
    config: MirrorConfig,
    state: RoiState,
}

impl MirrorTracker {
    /// Create a tracker with no circle held yet
    pub fn new(config: MirrorConfig) -> Self {
        let state = RoiState::new(config.fallback_center);
        Self { config, state }
    }

    /// Advance the track by one frame
    ///
    /// Detection must always see the original uncropped frame: running it on
    /// a previous crop shrinks the search space and can permanently lose the
    /// mirror once one bad crop is adopted.
    pub fn update(&mut self, frame: &Mat) -> Result<(), VisionError> {
        self.state.frames_since_redetect += 1;
        let due = self.state.circle.is_none()
            || self.state.frames_since_redetect >= self.config.detection_interval;
        if !due {
            return Ok(());
        }
        self.state.frames_since_redetect = 0;

        let found = match self.config.method {
            MirrorMethod::Hough => self.detect_hough(frame)?,
            MirrorMethod::Contour => self.detect_contour(frame)?,
        };

        match found {
            Some(circle) => self.adopt(circle, frame),
            None => {
                if self.state.circle.is_some() {
                    // Hysteresis: a missed re-detection keeps the old track
                    debug!("Mirror re-detection missed, keeping previous circle");
                    Ok(())
                } else {
                    self.fall_back(frame)
                }
            }
        }
    }

    /// Crop an image to the stored crop rectangle
    ///
    /// Returns the input unchanged when no crop rectangle is held yet.
    pub fn crop(&self, image: &Mat) -> Result<Mat, VisionError> {
        match self.state.crop_rect {
            Some(rect) => {
                let view = Mat::roi(image, rect.to_rect())?;
                Ok(view.try_clone()?)
            }
            None => Ok(image.clone()),
        }
    }

    /// Zero every pixel outside the mirror circle, in full-frame coordinates
    pub fn apply_mask(&self, image: &Mat) -> Result<Mat, VisionError> {
        if self.state.mask.empty() {
            return Ok(image.clone());
        }
        let mut masked = Mat::default();
        core::bitwise_and(image, image, &mut masked, &self.state.mask)?;
        Ok(masked)
    }

    /// Drop the held circle and force a fresh detection on the next update
    ///
    /// Operator-triggered: this is the only path that ever clears an adopted
    /// circle.
    pub fn reset(&mut self) {
        info!("Mirror tracker reset, forcing re-detection");
        self.state = RoiState::new(self.config.fallback_center);
    }

    /// Last successfully detected circle, if any
    pub fn circle(&self) -> Option<Circle> {
        self.state.circle
    }

    /// Whether a mirror circle has ever been detected
    pub fn detected(&self) -> bool {
        self.state.circle.is_some()
    }

    /// Current crop rectangle (None before the first update)
    pub fn crop_rect(&self) -> Option<CropRect> {
        self.state.crop_rect
    }

    /// Mirror center in crop-local coordinates
    pub fn frame_local_center(&self) -> (i32, i32) {
        self.state.frame_local_center
    }

    fn adopt(&mut self, circle: Circle, frame: &Mat) -> Result<(), VisionError> {
        let crop = CropRect::around(&circle, frame.cols(), frame.rows());
        if self.state.circle.is_none() {
            info!(
                "Mirror locked at ({}, {}) r={}",
                circle.cx, circle.cy, circle.radius
            );
        } else {
            debug!(
                "Mirror re-detected at ({}, {}) r={}",
                circle.cx, circle.cy, circle.radius
            );
        }
        self.state.mask = circle_mask(frame.size()?, &circle)?;
        self.state.frame_local_center = (circle.cx - crop.x1, circle.cy - crop.y1);
        self.state.circle = Some(circle);
        self.state.crop_rect = Some(crop);
        Ok(())
    }

    /// Static stand-in used until the first successful detection
    fn fall_back(&mut self, frame: &Mat) -> Result<(), VisionError> {
        let (cx, cy) = self.config.fallback_center;
        let circle = Circle {
            cx,
            cy,
            radius: self.config.fallback_radius,
        };
        debug!(
            "Mirror not found, using fallback circle at ({}, {}) r={}",
            cx, cy, circle.radius
        );
        self.state.mask = circle_mask(frame.size()?, &circle)?;
        self.state.crop_rect = Some(CropRect::full_frame(frame.cols(), frame.rows()));
        self.state.frame_local_center = (cx, cy);
        // The circle stays None: the mirror has not actually been seen
        Ok(())
    }

    fn detect_hough(&self, frame: &Mat) -> Result<Option<Circle>, VisionError> {
        let gray = grayscale(frame)?;
        let mut blurred = Mat::default();
        imgproc::gaussian_blur(
            &gray,
            &mut blurred,
            core::Size::new(9, 9),
            2.0,
            2.0,
            core::BORDER_DEFAULT,
        )?;

        // Half the frame height keeps the transform to a single circle
        let min_dist = f64::from(blurred.rows()) / 2.0;
        let mut circles: Vector<Vec3f> = Vector::new();
        imgproc::hough_circles(
            &blurred,
            &mut circles,
            imgproc::HOUGH_GRADIENT,
            1.0,
            min_dist,
            self.config.hough.param1,
            self.config.hough.param2,
            self.config.min_radius,
            self.config.max_radius,
        )?;

        let best = circles
            .iter()
            .max_by(|a, b| a[2].partial_cmp(&b[2]).unwrap_or(Ordering::Equal));
        Ok(best.map(|c| Circle {
            cx: c[0].round() as i32,
            cy: c[1].round() as i32,
            radius: c[2].round() as i32,
        }))
    }

    fn detect_contour(&self, frame: &Mat) -> Result<Option<Circle>, VisionError> {
        let gray = grayscale(frame)?;
        let mut edges = Mat::default();
        imgproc::canny(
            &gray,
            &mut edges,
            self.config.canny.threshold1,
            self.config.canny.threshold2,
            3,
            false,
        )?;

        let min_area = std::f64::consts::PI * f64::from(self.config.min_radius).powi(2);
        let max_area = std::f64::consts::PI * f64::from(self.config.max_radius).powi(2);

        let mut best: Option<(Vector<Point>, f64)> = None;
        for contour in contours::external_contours(&edges)?.iter() {
            let area = imgproc::contour_area(&contour, false)?;
            if area < min_area || area > max_area {
                continue;
            }
            let score = contours::circularity(&contour)?;
            match &best {
                Some((_, best_score)) if *best_score >= score => {}
                _ => best = Some((contour, score)),
            }
        }

        let Some((contour, score)) = best else {
            return Ok(None);
        };
        if score <= CIRCULARITY_THRESHOLD {
            debug!("Best mirror candidate circularity {:.3} too low", score);
            return Ok(None);
        }

        let mut center = Point2f::default();
        let mut radius = 0.0f32;
        imgproc::min_enclosing_circle(&contour, &mut center, &mut radius)?;
        let radius = radius.round() as i32;
        if radius < self.config.min_radius || radius > self.config.max_radius {
            return Ok(None);
        }
        Ok(Some(Circle {
            cx: center.x.round() as i32,
            cy: center.y.round() as i32,
            radius,
        }))
    }
}

fn grayscale(frame: &Mat) -> Result<Mat, VisionError> {
    let mut gray = Mat::default();
    imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
    Ok(gray)
}

fn circle_mask(size: core::Size, circle: &Circle) -> Result<Mat, VisionError> {
    let mut mask =
        Mat::new_rows_cols_with_default(size.height, size.width, core::CV_8UC1, Scalar::all(0.0))?;
    imgproc::circle(
        &mut mask,
        Point::new(circle.cx, circle.cy),
        circle.radius,
        Scalar::all(255.0),
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )?;
    Ok(mask)
}
