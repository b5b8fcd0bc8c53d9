//! Debug images of the occlusion raster.
//!
//! Encoding and writing happen on a background thread so the occlusion pass
//! never waits on disk. Requests are dropped while the writer is busy.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender, TrySendError};
use image::{GrayImage, Luma};
use tracing::{debug, info, warn};

use crate::constants::{PIXEL_HEIGHT, PIXEL_WIDTH};
use crate::error::{OcclusionError, Result};
use crate::rasterizer::Rasterizer;

/// Render the coverage buffer as an image: covered pixels white, empty black.
///
/// The raster stores row 0 at the bottom, so rows are mirrored to put the
/// top of the screen at the top of the image.
pub fn raster_image(raster: &Rasterizer) -> GrayImage {
    GrayImage::from_fn(PIXEL_WIDTH as u32, PIXEL_HEIGHT as u32, |x, y| {
        let raster_y = PIXEL_HEIGHT - 1 - y as i32;
        if raster.test_pixel(x as i32, raster_y) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Synchronously write the coverage buffer to an image file, creating
/// missing parent directories.
pub fn save_raster_image(raster: &Rasterizer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    raster_image(raster).save(path)?;
    info!("Occlusion raster saved: {}", path.display());
    Ok(())
}

enum DumpRequest {
    Write { image: GrayImage, path: PathBuf },
    Shutdown,
}

/// Handle to the background image writer thread.
struct DumpWorker {
    request_tx: Sender<DumpRequest>,
    thread: Option<JoinHandle<()>>,
}

impl DumpWorker {
    fn spawn() -> Result<Self> {
        let (request_tx, request_rx) = channel::bounded::<DumpRequest>(2);

        let thread = thread::Builder::new()
            .name("occlusion-raster-writer".to_string())
            .spawn(move || {
                while let Ok(DumpRequest::Write { image, path }) = request_rx.recv() {
                    match image.save(&path) {
                        Ok(()) => debug!("Occlusion raster saved: {}", path.display()),
                        Err(e) => warn!("Couldn't save occluder image {}: {e}", path.display()),
                    }
                }
            })
            .map_err(|e| OcclusionError::WorkerUnavailable(e.to_string()))?;

        Ok(Self {
            request_tx,
            thread: Some(thread),
        })
    }

    fn shutdown(&mut self) {
        let _ = self.request_tx.send(DumpRequest::Shutdown);

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for DumpWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Rate-limited, non-blocking raster image output.
pub struct RasterDump {
    interval: Duration,
    next_output: Option<Instant>,
    worker: Option<DumpWorker>,
}

impl RasterDump {
    /// The writer thread is started on first use.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_output: None,
            worker: None,
        }
    }

    /// Whether an output should happen now. Unforced outputs are limited to
    /// one per interval; forced outputs do not reset the interval.
    pub fn due(&mut self, now: Instant, force: bool) -> bool {
        if force {
            return true;
        }

        match self.next_output {
            Some(next) if now < next => false,
            _ => {
                self.next_output = Some(now + self.interval);
                true
            }
        }
    }

    /// Queue an image for writing without blocking.
    ///
    /// Returns `Ok(false)` when the writer is busy and the image was dropped.
    pub fn submit(&mut self, image: GrayImage, path: PathBuf) -> Result<bool> {
        if self.worker.is_none() {
            self.worker = Some(DumpWorker::spawn()?);
        }

        let Some(worker) = self.worker.as_ref() else {
            return Ok(false);
        };

        match worker.request_tx.try_send(DumpRequest::Write { image, path }) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                debug!("Occlusion raster writer busy, dropping image");
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.worker = None;
                Err(OcclusionError::WorkerUnavailable(
                    "writer thread exited".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_raster_is_black() {
        let image = raster_image(&Rasterizer::new());
        assert_eq!(image.dimensions(), (PIXEL_WIDTH as u32, PIXEL_HEIGHT as u32));
        assert!(image.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn output_is_rate_limited() {
        let mut dump = RasterDump::new(Duration::from_secs(1));
        let t0 = Instant::now();

        assert!(dump.due(t0, false));
        assert!(!dump.due(t0 + Duration::from_millis(500), false));
        assert!(dump.due(t0 + Duration::from_millis(500), true));
        assert!(dump.due(t0 + Duration::from_millis(1000), false));
        assert!(!dump.due(t0 + Duration::from_millis(1500), false));
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = std::env::temp_dir().join(format!("terracull_raster_dir_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("raster.png");

        save_raster_image(&Rasterizer::new(), &path).unwrap();
        let saved = image::open(&path).unwrap().to_luma8();
        assert_eq!(saved.dimensions(), (PIXEL_WIDTH as u32, PIXEL_HEIGHT as u32));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_reports_io_errors() {
        let file = std::env::temp_dir().join(format!("terracull_raster_file_{}", std::process::id()));
        std::fs::write(&file, b"not a directory").unwrap();

        // a regular file cannot be a parent directory
        let result = save_raster_image(&Rasterizer::new(), file.join("raster.png"));
        assert!(matches!(result, Err(OcclusionError::Io(_))));

        let _ = std::fs::remove_file(&file);
    }

    #[test]
    fn submitted_image_is_written_in_background() {
        let path = std::env::temp_dir().join(format!(
            "terracull_raster_test_{}.png",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut dump = RasterDump::new(Duration::from_secs(1));
        let queued = dump
            .submit(raster_image(&Rasterizer::new()), path.clone())
            .unwrap();
        assert!(queued);

        // dropping joins the writer after it drains the queue
        drop(dump);
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
