//! Frame acquisition for the vision pipeline
//!
//! Physical capture is a collaborator concern: the pipeline itself only
//! consumes `Mat` frames. `FrameSource` is the seam behind which capture
//! hardware is chosen at composition time; `CameraSource` is the default
//! implementation over an OpenCV `VideoCapture` device.

use crate::config::CameraConfig;
use crate::error::VisionError;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Consecutive failed reads before the stream gives up
const MAX_READ_ERRORS: u32 = 10;

/// Bounded frame queue, about one second at 30 fps
const FRAME_BUFFER_SIZE: usize = 30;

/// Capability to produce BGR frames for the pipeline
pub trait FrameSource: Send {
    /// Capture a single frame
    fn capture_frame(&self) -> Result<Mat, VisionError>;
}

/// USB camera frame source
pub struct CameraSource {
    config: CameraConfig,
    capture: Arc<Mutex<Option<VideoCapture>>>,
    is_running: Arc<RwLock<bool>>,
}

impl CameraSource {
    /// Create a camera source, failing fast on invalid configuration
    pub fn new(config: CameraConfig) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;
        Ok(Self {
            config,
            capture: Arc::new(Mutex::new(None)),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Open the device and apply resolution and frame rate
    ///
    /// Idempotent: an already-open device is left alone.
    pub fn initialize(&self) -> Result<(), VisionError> {
        let mut guard = self.capture.lock();
        if guard.is_some() {
            return Ok(());
        }

        let mut capture = VideoCapture::new(self.config.camera_id as i32, CAP_ANY).map_err(|e| {
            VisionError::Camera(format!(
                "Failed to open camera {}: {}",
                self.config.camera_id, e
            ))
        })?;
        if !capture.is_opened().map_err(|e| {
            VisionError::Camera(format!("Camera {} not opened: {}", self.config.camera_id, e))
        })? {
            return Err(VisionError::Camera(format!(
                "Camera {} failed to open",
                self.config.camera_id
            )));
        }

        capture
            .set(CAP_PROP_FRAME_WIDTH, f64::from(self.config.resolution.0))
            .map_err(|e| VisionError::Camera(format!("Failed to set width: {}", e)))?;
        capture
            .set(CAP_PROP_FRAME_HEIGHT, f64::from(self.config.resolution.1))
            .map_err(|e| VisionError::Camera(format!("Failed to set height: {}", e)))?;
        capture
            .set(CAP_PROP_FPS, f64::from(self.config.frame_rate))
            .map_err(|e| VisionError::Camera(format!("Failed to set FPS: {}", e)))?;

        *guard = Some(capture);
        info!(
            "Camera {} initialized at {}x{} @ {}fps",
            self.config.camera_id,
            self.config.resolution.0,
            self.config.resolution.1,
            self.config.frame_rate
        );
        Ok(())
    }

    /// Start a paced frame stream on the tokio runtime
    ///
    /// Frames arrive on a bounded channel at the configured rate until
    /// `stop` is called, the receiver is dropped, or too many consecutive
    /// reads fail.
    pub fn start_stream(&self) -> Result<mpsc::Receiver<Mat>, VisionError> {
        {
            let mut is_running = self.is_running.write();
            if *is_running {
                return Err(VisionError::Camera(
                    "Camera stream already running".to_string(),
                ));
            }
            *is_running = true;
        }
        self.initialize()?;

        let (tx, rx) = mpsc::channel(FRAME_BUFFER_SIZE);
        let capture = self.capture.clone();
        let is_running = self.is_running.clone();
        let frame_rate = self.config.frame_rate.max(1);

        tokio::spawn(async move {
            let frame_interval = Duration::from_secs_f64(1.0 / f64::from(frame_rate));
            let mut consecutive_errors = 0u32;

            loop {
                if !*is_running.read() {
                    break;
                }
                let started = Instant::now();

                let frame = {
                    let mut guard = capture.lock();
                    match guard.as_mut() {
                        Some(cap) => {
                            let mut frame = Mat::default();
                            match cap.read(&mut frame) {
                                Ok(true) => Some(frame),
                                Ok(false) => None,
                                Err(e) => {
                                    error!("Camera read error: {}", e);
                                    None
                                }
                            }
                        }
                        None => None,
                    }
                };

                match frame {
                    Some(frame) => {
                        consecutive_errors = 0;
                        if tx.send(frame).await.is_err() {
                            warn!("Frame receiver dropped, stopping camera stream");
                            break;
                        }
                    }
                    None => {
                        consecutive_errors += 1;
                        if consecutive_errors > MAX_READ_ERRORS {
                            error!(
                                "Too many camera read errors ({}), stopping stream",
                                consecutive_errors
                            );
                            break;
                        }
                        let backoff = (100u64 << consecutive_errors.min(5)).min(5_000);
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                        continue;
                    }
                }

                let elapsed = started.elapsed();
                if elapsed < frame_interval {
                    tokio::time::sleep(frame_interval - elapsed).await;
                }
            }

            *is_running.write() = false;
            info!("Camera stream stopped");
        });

        info!("Camera stream started");
        Ok(rx)
    }

    /// Stop the stream and release the device
    pub fn stop(&self) {
        *self.is_running.write() = false;
        *self.capture.lock() = None;
        info!("Camera stopped");
    }

    /// Whether the stream task is active
    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }
}

impl FrameSource for CameraSource {
    fn capture_frame(&self) -> Result<Mat, VisionError> {
        let mut guard = self.capture.lock();
        let capture = guard
            .as_mut()
            .ok_or_else(|| VisionError::Camera("Camera not initialized".to_string()))?;

        let mut frame = Mat::default();
        capture
            .read(&mut frame)
            .map_err(|e| VisionError::Camera(format!("Failed to read frame: {}", e)))?;
        Ok(frame)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.stop();
    }
}
