use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use tracing::{debug, info, warn};

/// Anything that yields RGB frames. An `Err` from `capture` means the
/// source is exhausted or gone; the tracker stops on it.
pub trait FrameSource {
    fn capture(&mut self) -> Result<RgbImage>;
}

/// Webcam stream. The stream is stopped when the value is dropped.
pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn new(index: u32) -> Result<Self> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .context("Failed to create camera instance")?;

        camera
            .open_stream()
            .map_err(|e| anyhow!(e))
            .context("Failed to open camera stream")?;

        info!(
            "Opened camera {}: {} ({})",
            index,
            camera.info().human_name(),
            camera.camera_format()
        );

        Ok(Self { camera })
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }
}

impl FrameSource for CameraSource {
    fn capture(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame().map_err(|e| anyhow!(e)).context("Failed to get frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| anyhow!(e))
            .context("Failed to decode frame")?;
        Ok(decoded)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(()) => debug!("Camera stream stopped"),
            Err(e) => warn!("Failed to stop camera stream: {}", e),
        }
    }
}

/// Print the cameras the platform backend can see.
pub fn print_cameras() -> Result<()> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| anyhow!(e))?;
    println!("Available Cameras:");
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {}", cam.index().to_string(), cam.human_name(), cam.misc());
    }
    Ok(())
}
