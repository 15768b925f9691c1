//! xcap capture backend for X11 and macOS desktops
//!
//! - **Enumeration**: `xcap::Window::all()`; a window counts as visible when
//!   it is not minimized
//! - **Window capture**: `Window::capture_image()`, composited by the window
//!   system where supported
//! - **Screen region**: capture the monitor under the window's top-left
//!   corner and crop the window rectangle out of it
//!
//! xcap has no lookup by id, so every call re-enumerates and finds the
//! window by its id. All xcap calls run on the blocking pool; only plain ids
//! and coordinates cross the thread boundary.
//!
//! Wayland sessions usually refuse window enumeration; the enumerator then
//! reports an empty list and the locator fails with `WindowNotFound`.

use async_trait::async_trait;
use image::{DynamicImage, RgbImage, imageops};

use super::{
    constants::{CAPTURE_TIMEOUT_MS, LIST_WINDOWS_TIMEOUT_MS},
    run_blocking,
    traits::{CaptureStrategy, WindowEnumerator},
};
use crate::{
    error::{DetectError, DetectResult},
    model::{LocatedWindow, WindowHandle, WindowInfo, WindowRect},
};

/// Checks that a display server is reachable before building the backend
pub fn check_display() -> DetectResult<()> {
    display_check_with_env(|key| std::env::var(key).ok())
}

fn display_check_with_env<F>(_env_provider: F) -> DetectResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    #[cfg(target_os = "linux")]
    {
        let has_display = ["DISPLAY", "WAYLAND_DISPLAY"]
            .iter()
            .any(|key| _env_provider(key).is_some_and(|v| !v.is_empty()));
        if !has_display {
            return Err(DetectError::BackendNotAvailable {
                reason: "neither DISPLAY nor WAYLAND_DISPLAY is set".to_string(),
            });
        }
    }

    Ok(())
}

/// Looks a window up by id; `fail` builds the error for the calling stage
fn find_window(id: u32, fail: fn(String) -> DetectError) -> DetectResult<xcap::Window> {
    let windows =
        xcap::Window::all().map_err(|e| fail(format!("failed to enumerate windows: {e}")))?;

    windows
        .into_iter()
        .find(|w| w.id().ok() == Some(id))
        .ok_or_else(|| fail(format!("window {id} no longer exists")))
}

fn window_id(handle: WindowHandle) -> DetectResult<u32> {
    u32::try_from(handle.as_raw()).map_err(|_| DetectError::InvalidParameter {
        parameter: "handle".to_string(),
        reason: format!("{handle} is not an xcap window id"),
    })
}

fn enumerate_windows_sync() -> DetectResult<Vec<WindowInfo>> {
    let windows = xcap::Window::all()
        .map_err(|e| DetectError::enumeration(format!("failed to enumerate windows: {e}")))?;

    let infos = windows
        .iter()
        .filter_map(|window| {
            let id = window.id().ok()?;
            let title = window.title().ok().filter(|t| !t.is_empty())?;
            let visible = !window.is_minimized().unwrap_or(true);
            Some(WindowInfo {
                handle: WindowHandle::new(id as isize),
                title,
                visible,
            })
        })
        .collect();
    Ok(infos)
}

fn window_rect_sync(id: u32) -> DetectResult<WindowRect> {
    let window = find_window(id, DetectError::enumeration)?;

    Ok(WindowRect::from_origin_size(
        window.x().map_err(|e| read_error("x", id, e))?,
        window.y().map_err(|e| read_error("y", id, e))?,
        window.width().map_err(|e| read_error("width", id, e))?,
        window.height().map_err(|e| read_error("height", id, e))?,
    ))
}

fn read_error(what: &str, id: u32, e: impl std::fmt::Display) -> DetectError {
    DetectError::enumeration(format!("failed to read {what} of window {id}: {e}"))
}

/// Window enumeration through xcap
#[derive(Debug, Default)]
pub struct XcapEnumerator {
    _private: (),
}

impl XcapEnumerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WindowEnumerator for XcapEnumerator {
    #[tracing::instrument(skip(self), fields(backend = "xcap"))]
    async fn list_windows(&self) -> DetectResult<Vec<WindowInfo>> {
        run_blocking(
            "list_windows",
            LIST_WINDOWS_TIMEOUT_MS,
            DetectError::enumeration,
            enumerate_windows_sync,
        )
        .await
    }

    async fn window_rect(&self, handle: WindowHandle) -> DetectResult<WindowRect> {
        let id = window_id(handle)?;
        run_blocking(
            "window_rect",
            LIST_WINDOWS_TIMEOUT_MS,
            DetectError::enumeration,
            move || window_rect_sync(id),
        )
        .await
    }
}

/// Window-level capture
#[derive(Debug, Clone, Copy, Default)]
pub struct XcapWindowCapture;

#[async_trait]
impl CaptureStrategy for XcapWindowCapture {
    fn name(&self) -> &'static str {
        "xcap-window"
    }

    async fn capture(&self, window: &LocatedWindow) -> DetectResult<RgbImage> {
        let id = window_id(window.handle)?;
        run_blocking(self.name(), CAPTURE_TIMEOUT_MS, DetectError::capture, move || {
            let window = find_window(id, DetectError::capture)?;
            let image = window
                .capture_image()
                .map_err(|e| DetectError::capture(format!("xcap window capture failed: {e}")))?;
            Ok(DynamicImage::ImageRgba8(image).to_rgb8())
        })
        .await
    }
}

/// Copy of the window's rectangle from its monitor
///
/// Only sees what is on screen: occluding windows end up in the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct XcapScreenRegionCapture;

#[async_trait]
impl CaptureStrategy for XcapScreenRegionCapture {
    fn name(&self) -> &'static str {
        "xcap-screen-region"
    }

    async fn capture(&self, window: &LocatedWindow) -> DetectResult<RgbImage> {
        let rect = window.rect;
        run_blocking(self.name(), CAPTURE_TIMEOUT_MS, DetectError::capture, move || {
            let monitor = xcap::Monitor::from_point(rect.left, rect.top).map_err(|e| {
                DetectError::capture(format!("no monitor at ({}, {}): {e}", rect.left, rect.top))
            })?;
            let origin = (
                monitor.x().map_err(|e| DetectError::capture(e.to_string()))?,
                monitor.y().map_err(|e| DetectError::capture(e.to_string()))?,
            );
            let screen = monitor
                .capture_image()
                .map_err(|e| DetectError::capture(format!("xcap monitor capture failed: {e}")))?;

            let screen = DynamicImage::ImageRgba8(screen).to_rgb8();
            crop_window(&screen, origin, &rect)
        })
        .await
    }
}

/// Crops `rect` (absolute) out of a monitor image whose top-left corner is
/// at `origin`
///
/// Fails unless the window lies entirely on the monitor.
fn crop_window(screen: &RgbImage, origin: (i32, i32), rect: &WindowRect) -> DetectResult<RgbImage> {
    let x = rect.left - origin.0;
    let y = rect.top - origin.1;
    let (width, height) = (rect.width(), rect.height());

    let fits = x >= 0
        && y >= 0
        && width > 0
        && height > 0
        && (x + width) as u32 <= screen.width()
        && (y + height) as u32 <= screen.height();
    if !fits {
        return Err(DetectError::capture(format!(
            "window {:?} is not fully on the monitor at {:?}",
            rect, origin
        )));
    }

    Ok(imageops::crop_imm(screen, x as u32, y as u32, width as u32, height as u32).to_image())
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_crop_inside_monitor() {
        let screen = RgbImage::from_fn(100, 80, |x, y| Rgb([x as u8, y as u8, 0]));
        let rect = WindowRect::new(1930, 20, 1950, 50);

        let cropped = crop_window(&screen, (1920, 0), &rect).unwrap();
        assert_eq!(cropped.dimensions(), (20, 30));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([10, 20, 0]));
    }

    #[test]
    fn test_crop_partially_off_monitor() {
        let screen = RgbImage::new(100, 80);

        let err = crop_window(&screen, (0, 0), &WindowRect::new(90, 10, 120, 30)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CaptureFailed);

        assert!(crop_window(&screen, (0, 0), &WindowRect::new(-5, 0, 10, 10)).is_err());
    }

    #[test]
    fn test_window_id_conversion() {
        assert_eq!(window_id(WindowHandle::new(42)).unwrap(), 42);
        let err = window_id(WindowHandle::new(-1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_display_check_requires_display() {
        assert!(display_check_with_env(|_| None).is_err());
        assert!(display_check_with_env(|key| (key == "DISPLAY").then(|| ":0".to_string())).is_ok());
        assert!(
            display_check_with_env(|key| (key == "WAYLAND_DISPLAY").then(|| "wayland-0".to_string()))
                .is_ok()
        );
        assert!(display_check_with_env(|_| Some(String::new())).is_err());
    }

    #[cfg(feature = "integration-tests")]
    #[tokio::test]
    async fn test_list_windows_live() {
        let windows = XcapEnumerator::new().list_windows().await.unwrap();
        assert!(windows.iter().all(|w| !w.title.is_empty()));
    }
}
