//! Configuration for panna-eye
//!
//! The whole tree is fully typed and immutable after construction: a running
//! `VisionPipeline` never re-reads configuration, and changing any value
//! means building a new pipeline instance. File loading and profile merging
//! are owned by the robot's supervisor process, which hands a finished
//! `DetectionConfig` to this crate.

use serde::{Deserialize, Serialize};

/// Inclusive HSV threshold window plus contour area bounds for one color class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvRange {
    /// Lower HSV bound, channels 0-255 (OpenCV hue is 0-180)
    pub lower: [u8; 3],
    /// Upper HSV bound, channels 0-255
    pub upper: [u8; 3],
    /// Minimum accepted contour area in px² (ignored by the ball classifier)
    pub min_area: f64,
    /// Maximum accepted contour area in px²
    pub max_area: f64,
}

impl HsvRange {
    fn validate(&self, name: &str) -> Result<(), String> {
        for i in 0..3 {
            if self.lower[i] > self.upper[i] {
                return Err(format!(
                    "{} HSV range: lower bound {} exceeds upper bound {} in channel {}",
                    name, self.lower[i], self.upper[i], i
                ));
            }
        }
        if self.min_area < 0.0 {
            return Err(format!("{} HSV range: min_area must be non-negative", name));
        }
        if self.max_area <= 0.0 {
            return Err(format!("{} HSV range: max_area must be positive", name));
        }
        if self.min_area > self.max_area {
            return Err(format!("{} HSV range: min_area exceeds max_area", name));
        }
        Ok(())
    }
}

/// Strategy for locating the circular mirror region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirrorMethod {
    /// Hough circle transform on the blurred grayscale frame
    Hough,
    /// Canny edges, circularity-scored contours, minimum enclosing circle
    Contour,
}

/// Hough circle transform thresholds
///
/// `min_dist` is not configurable: it is always derived as half the frame
/// height, which assumes exactly one mirror circle per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoughConfig {
    /// Upper Canny threshold used internally by the transform
    pub param1: f64,
    /// Accumulator vote threshold
    pub param2: f64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            param1: 100.0,
            param2: 30.0,
        }
    }
}

/// Canny edge thresholds for the contour mirror strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannyConfig {
    pub threshold1: f64,
    pub threshold2: f64,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            threshold1: 50.0,
            threshold2: 150.0,
        }
    }
}

/// Mirror (circular field-of-view) tracking configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub method: MirrorMethod,
    /// Smallest acceptable mirror radius in px
    pub min_radius: i32,
    /// Largest acceptable mirror radius in px
    pub max_radius: i32,
    pub hough: HoughConfig,
    pub canny: CannyConfig,
    /// Re-detection runs every this many frames once a circle is held
    pub detection_interval: u32,
    /// Radius of the static circle used before the first successful detection
    pub fallback_radius: i32,
    /// Center of the static fallback circle, px in frame coordinates
    pub fallback_center: (i32, i32),
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            method: MirrorMethod::Hough,
            min_radius: 100,
            max_radius: 300,
            hough: HoughConfig::default(),
            canny: CannyConfig::default(),
            detection_interval: 30,
            fallback_radius: 200,
            fallback_center: (320, 240),
        }
    }
}

impl MirrorConfig {
    fn validate(&self) -> Result<(), String> {
        if self.min_radius < 1 {
            return Err("mirror min_radius must be at least 1".to_string());
        }
        if self.max_radius < self.min_radius {
            return Err("mirror max_radius must not be below min_radius".to_string());
        }
        if self.detection_interval == 0 {
            return Err("mirror detection_interval must be at least 1".to_string());
        }
        if self.fallback_radius < 1 {
            return Err("mirror fallback_radius must be at least 1".to_string());
        }
        // A zero component would divide by zero in the error mapping once the
        // fallback circle becomes the frame-local center.
        if self.fallback_center.0 < 1 || self.fallback_center.1 < 1 {
            return Err("mirror fallback_center components must be positive".to_string());
        }
        if self.hough.param1 <= 0.0 || self.hough.param2 <= 0.0 {
            return Err("mirror Hough parameters must be positive".to_string());
        }
        if self.canny.threshold1 <= 0.0 || self.canny.threshold2 <= 0.0 {
            return Err("mirror Canny thresholds must be positive".to_string());
        }
        Ok(())
    }
}

/// Goal shape acceptance windows shared by both goal colors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    /// Normalized horizontal error below which a goal counts as centered
    pub center_tolerance: f64,
    /// Inclusive lower bound on bounding-box width/height ratio
    pub aspect_ratio_min: f64,
    /// Inclusive upper bound on bounding-box width/height ratio
    pub aspect_ratio_max: f64,
    /// Minimum bounding-box width in px
    pub min_width: i32,
    /// Minimum bounding-box height in px
    pub min_height: i32,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            center_tolerance: 0.15,
            aspect_ratio_min: 1.0,
            aspect_ratio_max: 4.0,
            min_width: 20,
            min_height: 10,
        }
    }
}

impl GoalConfig {
    fn validate(&self) -> Result<(), String> {
        if self.center_tolerance < 0.0 {
            return Err("goal center_tolerance must be non-negative".to_string());
        }
        if self.aspect_ratio_min <= 0.0 {
            return Err("goal aspect_ratio_min must be positive".to_string());
        }
        if self.aspect_ratio_max < self.aspect_ratio_min {
            return Err("goal aspect_ratio_max must not be below aspect_ratio_min".to_string());
        }
        if self.min_width < 1 || self.min_height < 1 {
            return Err("goal min_width and min_height must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Camera acquisition configuration for the default `CameraSource`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Camera device index (0, 1, 2, ...)
    pub camera_id: u32,
    /// Target frame rate (frames per second)
    pub frame_rate: u32,
    /// Capture resolution (width, height)
    pub resolution: (u32, u32),
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_id: 0,
            frame_rate: 30,
            resolution: (640, 480),
        }
    }
}

impl CameraConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate == 0 || self.frame_rate > 120 {
            return Err("Frame rate must be between 1 and 120".to_string());
        }
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err("Resolution must be non-zero".to_string());
        }
        Ok(())
    }
}

/// Full detection configuration, supplied once at pipeline construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// HSV window for the ball (the classifier only applies its max_area)
    pub ball: HsvRange,
    pub blue_goal: HsvRange,
    pub yellow_goal: HsvRange,
    /// Ball area in px² at which the ball counts as close
    pub proximity_threshold: f64,
    /// Threshold compared directly against the normalized horizontal error
    /// of the ball. The historical default of 15 is kept as-is even though
    /// the error it is compared against rarely leaves [-1, 1].
    pub angle_tolerance: f64,
    pub goal: GoalConfig,
    pub mirror: MirrorConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ball: HsvRange {
                lower: [0, 180, 170],
                upper: [50, 255, 255],
                min_area: 0.0,
                max_area: 50_000.0,
            },
            blue_goal: HsvRange {
                lower: [100, 150, 50],
                upper: [130, 255, 255],
                min_area: 500.0,
                max_area: 100_000.0,
            },
            yellow_goal: HsvRange {
                lower: [20, 100, 100],
                upper: [35, 255, 255],
                min_area: 500.0,
                max_area: 100_000.0,
            },
            proximity_threshold: 5_000.0,
            angle_tolerance: 15.0,
            goal: GoalConfig::default(),
            mirror: MirrorConfig::default(),
        }
    }
}

impl DetectionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.ball.validate("ball")?;
        self.blue_goal.validate("blue goal")?;
        self.yellow_goal.validate("yellow goal")?;
        if self.proximity_threshold < 0.0 {
            return Err("proximity_threshold must be non-negative".to_string());
        }
        if self.angle_tolerance < 0.0 {
            return Err("angle_tolerance must be non-negative".to_string());
        }
        self.goal.validate()?;
        self.mirror.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_valid() {
        let config = DetectionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.mirror.detection_interval, 30);
        assert_eq!(config.mirror.fallback_radius, 200);
        assert_eq!(config.mirror.method, MirrorMethod::Hough);
        assert_eq!(config.ball.lower, [0, 180, 170]);
        assert_eq!(config.ball.upper, [50, 255, 255]);
    }

    #[test]
    fn test_hsv_range_inverted_bounds_rejected() {
        let mut config = DetectionConfig::default();
        config.ball.lower = [60, 180, 170];
        config.ball.upper = [50, 255, 255];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hsv_range_negative_min_area_rejected() {
        let mut config = DetectionConfig::default();
        config.blue_goal.min_area = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hsv_range_zero_max_area_rejected() {
        let mut config = DetectionConfig::default();
        config.yellow_goal.max_area = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mirror_zero_fallback_center_rejected() {
        let mut config = DetectionConfig::default();
        config.mirror.fallback_center = (0, 240);
        assert!(config.validate().is_err());

        config.mirror.fallback_center = (320, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mirror_radius_bounds_rejected() {
        let mut config = DetectionConfig::default();
        config.mirror.min_radius = 0;
        assert!(config.validate().is_err());

        config.mirror.min_radius = 200;
        config.mirror.max_radius = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mirror_zero_interval_rejected() {
        let mut config = DetectionConfig::default();
        config.mirror.detection_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_goal_aspect_window_rejected() {
        let mut config = DetectionConfig::default();
        config.goal.aspect_ratio_min = 0.0;
        assert!(config.validate().is_err());

        config.goal.aspect_ratio_min = 3.0;
        config.goal.aspect_ratio_max = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_goal_min_dimensions_rejected() {
        let mut config = DetectionConfig::default();
        config.goal.min_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_tolerances_rejected() {
        let mut config = DetectionConfig::default();
        config.angle_tolerance = -0.1;
        assert!(config.validate().is_err());

        let mut config = DetectionConfig::default();
        config.proximity_threshold = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_camera_config_validation() {
        let config = CameraConfig::default();
        assert!(config.validate().is_ok());

        let mut config = CameraConfig::default();
        config.frame_rate = 0;
        assert!(config.validate().is_err());

        let mut config = CameraConfig::default();
        config.resolution = (0, 480);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = DetectionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_mirror_method_serde() {
        let json = serde_json::to_string(&MirrorMethod::Contour).unwrap();
        let back: MirrorMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MirrorMethod::Contour);
    }
}
