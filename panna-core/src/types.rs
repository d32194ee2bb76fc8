use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied identity of a processed frame
///
/// The vision pipeline never reads clocks or counters itself; the frame
/// acquisition loop stamps each frame before handing it over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    pub frame_id: u64,
    pub timestamp: DateTime<Utc>,
}

impl FrameMeta {
    pub fn new(frame_id: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            frame_id,
            timestamp,
        }
    }
}

/// Which goal color a detection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalColor {
    Blue,
    Yellow,
}

impl fmt::Display for GoalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalColor::Blue => write!(f, "blue"),
            GoalColor::Yellow => write!(f, "yellow"),
        }
    }
}

/// Selects which objects a single pipeline invocation should classify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub ball: bool,
    pub blue_goal: bool,
    pub yellow_goal: bool,
}

impl DetectionRequest {
    /// Request every supported object
    pub fn all() -> Self {
        Self {
            ball: true,
            blue_goal: true,
            yellow_goal: true,
        }
    }

    /// Request only the ball
    pub fn ball_only() -> Self {
        Self {
            ball: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.ball && !self.blue_goal && !self.yellow_goal
    }
}

/// Ball detection result in robot-centric normalized coordinates
///
/// All fields besides `detected` are zero/false when `detected` is false.
/// `horizontal_error`/`vertical_error` are the ball center's offset from the
/// mirror center divided by the crop half-extent; they are not clamped and
/// may leave [-1, 1] near the crop edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BallDetection {
    pub detected: bool,
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
    pub area: f64,
    pub horizontal_error: f64,
    pub vertical_error: f64,
    pub is_close: bool,
    pub is_centered_horizontally: bool,
    pub is_close_and_centered: bool,
}

/// Goal detection result for one goal color
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GoalDetection {
    pub detected: bool,
    pub center_x: i32,
    pub center_y: i32,
    pub width: i32,
    pub height: i32,
    pub area: f64,
    pub horizontal_error: f64,
    pub vertical_error: f64,
    pub is_centered_horizontally: bool,
}

/// One immutable result bundle per processed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBundle {
    pub frame_id: u64,
    pub timestamp: DateTime<Utc>,
    pub ball: BallDetection,
    pub blue_goal: GoalDetection,
    pub yellow_goal: GoalDetection,
    pub mirror_detected: bool,
    pub mirror_center: Option<(i32, i32)>,
    pub mirror_radius: Option<i32>,
}

impl DetectionBundle {
    /// Bundle with every detection flag false, used for empty frames and
    /// as the starting point of each invocation
    pub fn empty(meta: FrameMeta) -> Self {
        Self {
            frame_id: meta.frame_id,
            timestamp: meta.timestamp,
            ball: BallDetection::default(),
            blue_goal: GoalDetection::default(),
            yellow_goal: GoalDetection::default(),
            mirror_detected: false,
            mirror_center: None,
            mirror_radius: None,
        }
    }

    /// Goal detection for the given color
    pub fn goal(&self, color: GoalColor) -> &GoalDetection {
        match color {
            GoalColor::Blue => &self.blue_goal,
            GoalColor::Yellow => &self.yellow_goal,
        }
    }
}
