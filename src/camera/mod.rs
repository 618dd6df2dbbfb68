//! Webcam feed
//!
//! Owns the camera stream for the lifetime of a connection. A capture thread
//! publishes the latest RGBA frame into a shared slot; the app pulls it at
//! the classifier poll cadence, downscales it and compresses it to JPEG.
//! Nothing here feeds the render path, so one latest-frame slot is enough.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use parking_lot::Mutex;

/// A captured camera frame (RGBA)
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub number: u64,
}

impl Frame {
    /// Downscale to the target size with nearest-neighbor sampling,
    /// dropping the alpha channel
    pub fn downscale_rgb(&self, target_width: u32, target_height: u32) -> Vec<u8> {
        let mut output = Vec::with_capacity((target_width * target_height * 3) as usize);
        let x_ratio = self.width as f32 / target_width as f32;
        let y_ratio = self.height as f32 / target_height as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                let src_x = ((x as f32 * x_ratio) as u32).min(self.width.saturating_sub(1));
                let src_y = ((y as f32 * y_ratio) as u32).min(self.height.saturating_sub(1));
                let src_idx = ((src_y * self.width + src_x) * 4) as usize;
                if src_idx + 2 < self.data.len() {
                    output.push(self.data[src_idx]);
                    output.push(self.data[src_idx + 1]);
                    output.push(self.data[src_idx + 2]);
                } else {
                    output.extend_from_slice(&[0, 0, 0]);
                }
            }
        }

        output
    }

    /// Compress a downscaled copy of the frame to JPEG for the classifier
    pub fn encode_jpeg(
        &self,
        target_width: u32,
        target_height: u32,
        quality: u8,
    ) -> Result<Vec<u8>, String> {
        if self.width == 0 || self.height == 0 {
            return Err("empty frame".to_string());
        }

        let rgb = self.downscale_rgb(target_width, target_height);
        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
        encoder
            .encode(
                &rgb,
                target_width,
                target_height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| format!("jpeg encode failed: {}", e))?;
        Ok(jpeg)
    }
}

/// Information about an available camera
#[derive(Clone, Debug)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
}

/// Webcam capture handle
pub struct CameraFeed {
    latest: Arc<Mutex<Option<Frame>>>,
    /// Stream opened successfully; drives the status indicator
    active: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    frame_count: Arc<AtomicU64>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl CameraFeed {
    /// List available cameras
    pub fn list_cameras() -> Vec<CameraInfo> {
        match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
            Ok(list) => list
                .iter()
                .enumerate()
                .map(|(idx, info)| CameraInfo {
                    index: idx as u32,
                    name: info.human_name().to_string(),
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Open a camera and start capturing
    pub fn new(camera_index: u32) -> Result<Self, String> {
        let latest = Arc::new(Mutex::new(None));
        let active = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let frame_count = Arc::new(AtomicU64::new(0));

        let latest_clone = latest.clone();
        let active_clone = active.clone();
        let running_clone = running.clone();
        let frame_count_clone = frame_count.clone();

        let thread_handle = std::thread::Builder::new()
            .name("camera-feed".to_string())
            .spawn(move || {
                Self::capture_thread(
                    camera_index,
                    latest_clone,
                    active_clone,
                    running_clone,
                    frame_count_clone,
                );
            })
            .map_err(|e| format!("Failed to spawn capture thread: {}", e))?;

        Ok(Self {
            latest,
            active,
            running,
            frame_count,
            thread_handle: Some(thread_handle),
        })
    }

    fn capture_thread(
        camera_index: u32,
        latest: Arc<Mutex<Option<Frame>>>,
        active: Arc<AtomicBool>,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
    ) {
        log::info!("Starting camera feed (camera {})", camera_index);

        let index = CameraIndex::Index(camera_index);

        // Classifier payloads are 320x240, so a modest stream is plenty
        let requested = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(640, 480),
        ));

        let mut camera = match Camera::new(index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open camera at 640x480: {:?}", e);
                let fallback = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None);
                match Camera::new(index, fallback) {
                    Ok(c) => c,
                    Err(e2) => {
                        log::error!("Failed to open camera: {:?}", e2);
                        return;
                    }
                }
            }
        };

        if let Err(e) = camera.open_stream() {
            log::error!("Failed to open camera stream: {:?}", e);
            return;
        }

        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );
        active.store(true, Ordering::Release);

        while running.load(Ordering::Acquire) {
            match camera.frame() {
                Ok(frame) => match frame.decode_image::<RgbAFormat>() {
                    Ok(image) => {
                        let number = frame_count.fetch_add(1, Ordering::Relaxed);
                        let width = frame.resolution().width();
                        let height = frame.resolution().height();
                        *latest.lock() = Some(Frame {
                            data: image.into_raw(),
                            width,
                            height,
                            number,
                        });
                    }
                    Err(e) => {
                        log::warn!("Failed to decode frame: {:?}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to capture frame: {:?}", e);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }

        active.store(false, Ordering::Release);
        log::info!("Camera feed stopped");
    }

    /// Latest captured frame, if any
    pub fn latest_frame(&self) -> Option<Frame> {
        self.latest.lock().clone()
    }

    /// Stream is open and delivering frames
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Total frames captured
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Stop capturing and release the camera
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> Frame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&rgba);
        }
        Frame {
            data,
            width,
            height,
            number: 0,
        }
    }

    #[test]
    fn test_downscale_dimensions() {
        let frame = solid_frame(640, 480, [10, 20, 30, 255]);
        let rgb = frame.downscale_rgb(320, 240);
        assert_eq!(rgb.len(), 320 * 240 * 3);
        assert_eq!(&rgb[0..3], &[10, 20, 30]);
        assert_eq!(&rgb[rgb.len() - 3..], &[10, 20, 30]);
    }

    #[test]
    fn test_downscale_upsample() {
        // Upscaling must not read out of bounds
        let frame = solid_frame(16, 12, [200, 100, 50, 255]);
        let rgb = frame.downscale_rgb(64, 48);
        assert_eq!(rgb.len(), 64 * 48 * 3);
        assert_eq!(&rgb[0..3], &[200, 100, 50]);
    }

    #[test]
    fn test_encode_jpeg_soi_marker() {
        let frame = solid_frame(64, 48, [0, 128, 0, 255]);
        let jpeg = frame.encode_jpeg(32, 24, 60).unwrap();
        assert!(!jpeg.is_empty());
        // JPEG start-of-image marker
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_jpeg_empty_frame() {
        let frame = Frame {
            data: Vec::new(),
            width: 0,
            height: 0,
            number: 0,
        };
        assert!(frame.encode_jpeg(32, 24, 60).is_err());
    }
}
