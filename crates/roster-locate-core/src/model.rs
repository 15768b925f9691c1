//! Data models shared by the detection stages
//!
//! Coordinates are `i32` throughout. [`Rectangle`] is used both for
//! window-relative and absolute screen positions; the detector only converts
//! between the two in [`Rectangle::translate`].

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Opaque reference to a top-level window
///
/// Holds the platform identifier (an `HWND` on Windows, an xcap window id
/// elsewhere). Only meaningful within the attempt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(isize);

impl WindowHandle {
    pub fn new(raw: isize) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> isize {
        self.0
    }
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Placement of a window in absolute screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Builds a rect from an origin and a size
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(
            x,
            y,
            x.saturating_add(width as i32),
            y.saturating_add(height as i32),
        )
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True if the rect covers at least one pixel
    pub fn is_capturable(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}

/// A visible top-level window as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub visible: bool,
}

/// The window chosen by the locator, with its placement at lookup time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedWindow {
    pub handle: WindowHandle,
    pub title: String,
    pub rect: WindowRect,
}

/// Axis-aligned rectangle, window-relative or absolute depending on context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Converts a window-relative rectangle to absolute screen coordinates
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_locate_core::model::{Rectangle, WindowRect};
    ///
    /// let window = WindowRect::new(100, 50, 900, 650);
    /// let relative = Rectangle::new(30, 40, 200, 150);
    /// assert_eq!(relative.translate(&window), Rectangle::new(130, 90, 200, 150));
    /// ```
    pub fn translate(&self, origin: &WindowRect) -> Rectangle {
        Rectangle {
            x: origin.left + self.x,
            y: origin.top + self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// True if `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Identifies the visual line a fragment belongs to
///
/// Tesseract numbers lines within paragraphs within blocks, so all three
/// numbers together identify one line on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct LineKey {
    pub block: i32,
    pub paragraph: i32,
    pub line: i32,
}

/// One recognized token with its window-relative geometry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextFragment {
    pub line: LineKey,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f32,
    pub text: String,
}

impl TextFragment {
    /// Fragments without positive extent never contribute to a region
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.left, self.top, self.width, self.height)
    }
}

/// Final result of the detection loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// Roster rectangle in absolute screen coordinates
    Found(Rectangle),
    /// Every attempt failed or the deadline passed
    NotDetected {
        attempts: u32,
        last_error: Option<ErrorKind>,
    },
}

impl DetectionOutcome {
    pub fn rectangle(&self) -> Option<Rectangle> {
        match self {
            DetectionOutcome::Found(rect) => Some(*rect),
            DetectionOutcome::NotDetected { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, DetectionOutcome::Found(_))
    }
}
