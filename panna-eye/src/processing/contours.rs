//! Contour extraction and scoring shared by the ball and goal classifiers

use crate::error::VisionError;
use opencv::{
    core::{Mat, Point, Vector},
    imgproc,
    prelude::*,
};

/// External contours of a binary mask
pub fn external_contours(mask: &Mat) -> Result<Vector<Vector<Point>>, VisionError> {
    let mut contours: Vector<Vector<Point>> = Vector::new();
    imgproc::find_contours(
        mask,
        &mut contours,
        imgproc::RETR_EXTERNAL,
        imgproc::CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )?;
    Ok(contours)
}

/// Largest contour whose area the predicate accepts, with its area
///
/// The ball classifier passes an upper-bound-only predicate, the goal
/// classifier a two-sided window; both then take the biggest survivor.
pub fn largest_matching(
    contours: &Vector<Vector<Point>>,
    accept: impl Fn(f64) -> bool,
) -> Result<Option<(Vector<Point>, f64)>, VisionError> {
    let mut best: Option<(Vector<Point>, f64)> = None;
    for contour in contours.iter() {
        let area = imgproc::contour_area(&contour, false)?;
        if !accept(area) {
            continue;
        }
        match &best {
            Some((_, best_area)) if *best_area >= area => {}
            _ => best = Some((contour, area)),
        }
    }
    Ok(best)
}

/// Circularity score `4π·area / perimeter²`
///
/// 1.0 for an ideal disk, lower for anything else. Zero-perimeter contours
/// score 0.0 instead of dividing by zero.
pub fn circularity(contour: &Vector<Point>) -> Result<f64, VisionError> {
    let perimeter = imgproc::arc_length(contour, true)?;
    if perimeter <= 0.0 {
        return Ok(0.0);
    }
    let area = imgproc::contour_area(contour, false)?;
    Ok(4.0 * std::f64::consts::PI * area / (perimeter * perimeter))
}
