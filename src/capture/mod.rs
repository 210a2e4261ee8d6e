//! # Capture Service
//!
//! Takes exactly one photo per call: acquire the camera, read one frame,
//! release the camera, persist the frame. The camera is held only for the
//! duration of the read; [`CameraLease`] closes it on every exit path.
//!
//! The photo is written to a sibling temporary file, synced and renamed over
//! the target, so a reader never sees a half-written image.

pub mod error;

pub use error::*;

use crate::hardware::{Camera, CameraHandle, Frame};
use crate::model::PhotoRef;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Open camera handle that is closed when dropped.
pub struct CameraLease<'a> {
    camera: &'a dyn Camera,
    handle: Option<CameraHandle>,
}

impl<'a> CameraLease<'a> {
    pub fn acquire(camera: &'a dyn Camera, device_index: u32) -> Result<Self, CaptureError> {
        let handle = camera
            .open(device_index)
            .map_err(|e| CaptureError::CameraUnavailable(e.to_string()))?;
        Ok(Self {
            camera,
            handle: Some(handle),
        })
    }

    pub fn read_frame(&self) -> Option<Frame> {
        self.handle
            .as_ref()
            .and_then(|handle| self.camera.read_frame(handle))
    }
}

impl Drop for CameraLease<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.camera.close(handle);
        }
    }
}

#[derive(Clone)]
pub struct CaptureService {
    camera: Arc<dyn Camera>,
    device_index: u32,
    photo_path: PathBuf,
}

impl CaptureService {
    pub fn new(camera: Arc<dyn Camera>, device_index: u32, photo_path: impl Into<PathBuf>) -> Self {
        Self {
            camera,
            device_index,
            photo_path: photo_path.into(),
        }
    }

    /// Takes one photo and returns a reference to it once it is on disk.
    #[instrument(skip(self), fields(path = %self.photo_path.display()))]
    pub async fn capture(&self) -> Result<PhotoRef, CaptureError> {
        let camera = self.camera.clone();
        let device_index = self.device_index;
        let photo_path = self.photo_path.clone();

        tokio::task::spawn_blocking(move || capture_blocking(camera.as_ref(), device_index, &photo_path))
            .await
            .map_err(|e| CaptureError::CameraUnavailable(format!("capture task failed: {}", e)))?
    }
}

fn capture_blocking(
    camera: &dyn Camera,
    device_index: u32,
    photo_path: &Path,
) -> Result<PhotoRef, CaptureError> {
    let frame = {
        let lease = CameraLease::acquire(camera, device_index)?;
        lease.read_frame()
    };

    let frame = match frame {
        Some(frame) if !frame.bytes.is_empty() => frame,
        _ => {
            warn!(device_index, "No frame from camera");
            return Err(CaptureError::CameraUnavailable(
                "camera returned no frame".to_string(),
            ));
        }
    };

    persist(photo_path, &frame.bytes).map_err(|e| {
        warn!(path = %photo_path.display(), error = %e, "Photo write failed");
        CaptureError::WriteFailed(format!("{}: {}", photo_path.display(), e))
    })?;

    info!(path = %photo_path.display(), bytes = frame.bytes.len(), "Photo saved");
    Ok(PhotoRef::new(photo_path, frame.bytes.len() as u64))
}

fn persist(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(target);
    let written = File::create(&temp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    fs::rename(&temp, target).inspect_err(|_| {
        let _ = fs::remove_file(&temp);
    })?;
    debug!(path = %target.display(), "Photo renamed into place");
    Ok(())
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "photo".into());
    name.push(".tmp");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCamera;

    #[tokio::test]
    async fn frame_is_persisted_and_camera_released() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photos").join("image.jpg");

        let camera = MockCamera::new();
        camera.expect_read().return_frame(b"jpeg-data".to_vec());

        let service = CaptureService::new(Arc::new(camera.clone()), 0, &path);
        let photo = service.capture().await.unwrap();

        assert_eq!(photo.path(), path.as_path());
        assert_eq!(photo.len(), 9);
        assert_eq!(fs::read(&path).unwrap(), b"jpeg-data");
        assert!(!temp_path(&path).exists());
        assert_eq!(camera.open_count(), 1);
        assert_eq!(camera.close_count(), 1);
        camera.verify();
    }

    #[tokio::test]
    async fn previous_photo_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.jpg");
        fs::write(&path, b"old old old").unwrap();

        let camera = MockCamera::new();
        camera.expect_read().return_frame(b"new".to_vec());

        let service = CaptureService::new(Arc::new(camera), 0, &path);
        service.capture().await.unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn no_frame_is_camera_unavailable_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.jpg");

        let camera = MockCamera::new();
        camera.expect_read().return_none();

        let service = CaptureService::new(Arc::new(camera.clone()), 0, &path);
        let result = service.capture().await;

        assert!(matches!(result, Err(CaptureError::CameraUnavailable(_))));
        assert!(!path.exists());
        assert_eq!(camera.close_count(), 1);
    }

    #[tokio::test]
    async fn open_failure_is_camera_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let camera = MockCamera::new();
        camera.fail_open("no camera attached");

        let service = CaptureService::new(Arc::new(camera.clone()), 0, dir.path().join("image.jpg"));
        let result = service.capture().await;

        assert!(matches!(result, Err(CaptureError::CameraUnavailable(_))));
        assert_eq!(camera.open_count(), 1);
        assert_eq!(camera.close_count(), 0);
    }

    #[tokio::test]
    async fn unwritable_path_is_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let camera = MockCamera::new();
        camera.expect_read().return_frame(b"jpeg".to_vec());

        let service = CaptureService::new(Arc::new(camera.clone()), 0, blocker.join("image.jpg"));
        let result = service.capture().await;

        assert!(matches!(result, Err(CaptureError::WriteFailed(_))));
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn temp_file_sits_next_to_target() {
        assert_eq!(
            temp_path(Path::new("/home/pi/image.jpg")),
            PathBuf::from("/home/pi/image.jpg.tmp")
        );
    }
}
