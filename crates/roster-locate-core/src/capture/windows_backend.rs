//! Windows capture backend using Win32 + GDI
//!
//! This module implements window discovery and capture for Windows using:
//! - **Win32 API**: `EnumWindows`, `IsWindowVisible`, `GetWindowTextW` and
//!   `GetWindowRect`
//! - **`PrintWindow`** with `PW_RENDERFULLCONTENT`: asks the window (through
//!   DWM) to render itself into a memory DC, which works while the window is
//!   occluded
//! - **`BitBlt`** from the window DC: plain copy of what is on screen, used
//!   when `PrintWindow` fails
//!
//! Both strategies read pixels back with `GetDIBits` as 32-bit top-down BGRA
//! and convert to RGB. GDI handles are owned by [`GdiSurface`], which
//! releases them on drop.
//!
//! # Threading Model
//!
//! All Win32 calls run under `spawn_blocking`. `HWND` is not `Send`, so it
//! crosses the thread boundary as `isize` and is converted back inside the
//! closure.

use std::{ffi::OsString, mem, os::windows::ffi::OsStringExt, ptr};

use async_trait::async_trait;
use image::RgbImage;
use windows_sys::Win32::{
    Foundation::{HWND, RECT},
    Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CAPTUREBLT, CreateCompatibleBitmap,
        CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDIBits, GetWindowDC,
        HBITMAP, HDC, HGDIOBJ, ReleaseDC, SRCCOPY, SelectObject,
    },
    Storage::Xps::PrintWindow,
    UI::WindowsAndMessaging::{
        EnumWindows, GetWindowRect, GetWindowTextLengthW, GetWindowTextW, IsWindow,
        IsWindowVisible,
    },
};

#[allow(clippy::upper_case_acronyms)]
type BOOL = i32;
const TRUE: BOOL = 1;
const FALSE: BOOL = 0;

/// Render DWM-composited content (Windows 8.1+)
const PW_RENDERFULLCONTENT: u32 = 0x0000_0002;

/// Cap title length to prevent unbounded allocation from hostile windows
const MAX_TITLE_LEN: i32 = 32768;

use super::{
    constants::{CAPTURE_TIMEOUT_MS, LIST_WINDOWS_TIMEOUT_MS},
    run_blocking,
    traits::{CaptureStrategy, WindowEnumerator},
};
use crate::{
    error::{DetectError, DetectResult},
    model::{LocatedWindow, WindowHandle, WindowInfo, WindowRect},
};

/// Enumerates all top-level windows with non-empty titles
fn enumerate_window_handles() -> Vec<HWND> {
    let mut handles: Vec<HWND> = Vec::new();

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: isize) -> BOOL {
        // SAFETY: lparam is a valid pointer to Vec<HWND> passed from
        // enumerate_window_handles
        let handles = unsafe { &mut *(lparam as *mut Vec<HWND>) };

        // SAFETY: hwnd is a valid window handle from EnumWindows
        if unsafe { GetWindowTextLengthW(hwnd) } > 0 {
            handles.push(hwnd);
        }
        TRUE // Continue enumeration
    }

    unsafe {
        EnumWindows(Some(enum_callback), &mut handles as *mut Vec<HWND> as isize);
    }

    handles
}

/// Gets the title of a window
///
/// `GetWindowTextLengthW` excludes the null terminator, so the buffer is
/// `len + 1` wide characters.
fn get_window_title(hwnd: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(hwnd).min(MAX_TITLE_LEN);
        if len == 0 {
            return String::new();
        }

        let mut buffer: Vec<u16> = vec![0; (len + 1) as usize];
        let copied = GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32);
        if copied == 0 {
            return String::new();
        }

        buffer.truncate(copied as usize);
        OsString::from_wide(&buffer).to_string_lossy().into_owned()
    }
}

fn enumerate_windows_sync() -> DetectResult<Vec<WindowInfo>> {
    let windows = enumerate_window_handles()
        .into_iter()
        .filter_map(|hwnd| {
            let title = get_window_title(hwnd);
            if title.is_empty() {
                return None;
            }
            // SAFETY: hwnd came from EnumWindows
            let visible = unsafe { IsWindowVisible(hwnd) } != FALSE;
            Some(WindowInfo {
                handle: WindowHandle::new(hwnd as isize),
                title,
                visible,
            })
        })
        .collect();
    Ok(windows)
}

fn window_rect_sync(hwnd: HWND) -> DetectResult<WindowRect> {
    unsafe {
        if IsWindow(hwnd) == FALSE {
            return Err(DetectError::enumeration(format!(
                "window {:#x} no longer exists",
                hwnd as isize
            )));
        }

        let mut rect: RECT = mem::zeroed();
        if GetWindowRect(hwnd, &mut rect) == FALSE {
            return Err(DetectError::enumeration("GetWindowRect failed"));
        }
        Ok(WindowRect::new(rect.left, rect.top, rect.right, rect.bottom))
    }
}

/// Window DC plus a compatible memory DC and bitmap sized to the window
///
/// Dropping the surface restores the memory DC's original bitmap and frees
/// every GDI object in reverse order of creation.
struct GdiSurface {
    hwnd: HWND,
    window_dc: HDC,
    memory_dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
    width: i32,
    height: i32,
}

impl GdiSurface {
    fn new(hwnd: HWND, width: i32, height: i32) -> DetectResult<Self> {
        unsafe {
            let window_dc = GetWindowDC(hwnd);
            if window_dc.is_null() {
                return Err(DetectError::capture("GetWindowDC failed"));
            }

            let memory_dc = CreateCompatibleDC(window_dc);
            if memory_dc.is_null() {
                ReleaseDC(hwnd, window_dc);
                return Err(DetectError::capture("CreateCompatibleDC failed"));
            }

            let bitmap = CreateCompatibleBitmap(window_dc, width, height);
            if bitmap.is_null() {
                DeleteDC(memory_dc);
                ReleaseDC(hwnd, window_dc);
                return Err(DetectError::capture("CreateCompatibleBitmap failed"));
            }

            let previous = SelectObject(memory_dc, bitmap as HGDIOBJ);

            Ok(Self {
                hwnd,
                window_dc,
                memory_dc,
                bitmap,
                previous,
                width,
                height,
            })
        }
    }

    /// Reads the bitmap as RGB
    ///
    /// The bitmap is deselected first; `GetDIBits` requires that it is not
    /// selected into any DC.
    fn read_pixels(&mut self) -> DetectResult<RgbImage> {
        unsafe {
            SelectObject(self.memory_dc, self.previous);
            self.previous = ptr::null_mut();

            let mut info: BITMAPINFO = mem::zeroed();
            info.bmiHeader = BITMAPINFOHEADER {
                biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: self.width,
                // Negative height requests top-down rows
                biHeight: -self.height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB,
                biSizeImage: 0,
                biXPelsPerMeter: 0,
                biYPelsPerMeter: 0,
                biClrUsed: 0,
                biClrImportant: 0,
            };

            let mut bgra: Vec<u8> = vec![0; self.width as usize * self.height as usize * 4];
            let lines = GetDIBits(
                self.window_dc,
                self.bitmap,
                0,
                self.height as u32,
                bgra.as_mut_ptr().cast(),
                &mut info,
                DIB_RGB_COLORS,
            );
            if lines != self.height {
                return Err(DetectError::capture(format!(
                    "GetDIBits copied {} of {} rows",
                    lines, self.height
                )));
            }

            bgra_to_rgb(self.width as u32, self.height as u32, &bgra)
        }
    }
}

impl Drop for GdiSurface {
    fn drop(&mut self) {
        unsafe {
            if !self.previous.is_null() {
                SelectObject(self.memory_dc, self.previous);
            }
            DeleteObject(self.bitmap as HGDIOBJ);
            DeleteDC(self.memory_dc);
            ReleaseDC(self.hwnd, self.window_dc);
        }
    }
}

/// Converts packed BGRA rows to an RGB image, dropping alpha
fn bgra_to_rgb(width: u32, height: u32, bgra: &[u8]) -> DetectResult<RgbImage> {
    let rgb: Vec<u8> = bgra
        .chunks_exact(4)
        .flat_map(|px| [px[2], px[1], px[0]])
        .collect();
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| DetectError::capture("pixel buffer does not match window size"))
}

/// Which GDI call fills the memory bitmap
#[derive(Debug, Clone, Copy)]
enum GdiMethod {
    PrintWindow,
    ScreenCopy,
}

fn capture_sync(hwnd: HWND, rect: WindowRect, method: GdiMethod) -> DetectResult<RgbImage> {
    let (width, height) = (rect.width(), rect.height());
    if width <= 0 || height <= 0 {
        return Err(DetectError::capture(format!("window has empty extent {rect:?}")));
    }

    let mut surface = GdiSurface::new(hwnd, width, height)?;

    let ok = unsafe {
        match method {
            GdiMethod::PrintWindow => PrintWindow(hwnd, surface.memory_dc, PW_RENDERFULLCONTENT),
            GdiMethod::ScreenCopy => BitBlt(
                surface.memory_dc,
                0,
                0,
                width,
                height,
                surface.window_dc,
                0,
                0,
                SRCCOPY | CAPTUREBLT,
            ),
        }
    };
    if ok == FALSE {
        return Err(DetectError::capture(format!("{method:?} returned FALSE")));
    }

    surface.read_pixels()
}

/// Window enumeration through Win32
#[derive(Debug, Default)]
pub struct WindowsEnumerator {
    _private: (),
}

impl WindowsEnumerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WindowEnumerator for WindowsEnumerator {
    #[tracing::instrument(skip(self), fields(backend = "windows"))]
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
        let raw = handle.as_raw();
        run_blocking(
            "window_rect",
            LIST_WINDOWS_TIMEOUT_MS,
            DetectError::enumeration,
            move || window_rect_sync(raw as HWND),
        )
        .await
    }
}

/// Compositor-aware capture through `PrintWindow`
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintWindowCapture;

#[async_trait]
impl CaptureStrategy for PrintWindowCapture {
    fn name(&self) -> &'static str {
        "print-window"
    }

    async fn capture(&self, window: &LocatedWindow) -> DetectResult<RgbImage> {
        let raw = window.handle.as_raw();
        let rect = window.rect;
        run_blocking(self.name(), CAPTURE_TIMEOUT_MS, DetectError::capture, move || {
            capture_sync(raw as HWND, rect, GdiMethod::PrintWindow)
        })
        .await
    }
}

/// On-screen copy through `BitBlt`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenCopyCapture;

#[async_trait]
impl CaptureStrategy for ScreenCopyCapture {
    fn name(&self) -> &'static str {
        "screen-copy"
    }

    async fn capture(&self, window: &LocatedWindow) -> DetectResult<RgbImage> {
        let raw = window.handle.as_raw();
        let rect = window.rect;
        run_blocking(self.name(), CAPTURE_TIMEOUT_MS, DetectError::capture, move || {
            capture_sync(raw as HWND, rect, GdiMethod::ScreenCopy)
        })
        .await
    }
}
