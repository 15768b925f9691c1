//! Window title matching and location
//!
//! The target window is the first *visible* window, in OS enumeration
//! order, whose title contains any of the configured substrings.
//! Matching is case-sensitive: the game client's title is fixed and the
//! localized variant has no case.
//!
//! When several windows qualify, which one wins depends on the OS order.
//! That is accepted; the first match is deterministic for a given order.

use super::traits::WindowEnumerator;
use crate::{
    error::{DetectError, DetectResult},
    model::{LocatedWindow, WindowInfo},
};

/// Substring matcher over window titles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatcher {
    patterns: Vec<String>,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::new(crate::config::default_title_patterns())
    }
}

impl TitleMatcher {
    /// Creates a matcher; empty patterns are dropped since they match
    /// every title.
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns the first pattern contained in `title`
    pub fn matching_pattern(&self, title: &str) -> Option<&str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .find(|pattern| title.contains(pattern))
    }

    pub fn is_match(&self, window: &WindowInfo) -> bool {
        window.visible && self.matching_pattern(&window.title).is_some()
    }

    /// First qualifying window, consuming no more of `windows` than needed
    pub fn find<I>(&self, windows: I) -> Option<WindowInfo>
    where
        I: IntoIterator<Item = WindowInfo>,
    {
        windows.into_iter().find(|window| self.is_match(window))
    }
}

/// Finds the target window and reads its placement
///
/// # Errors
///
/// `WindowNotFound` if no visible title matches. Errors from the
/// enumerator pass through unchanged.
pub async fn locate_window(
    enumerator: &dyn WindowEnumerator,
    matcher: &TitleMatcher,
) -> DetectResult<LocatedWindow> {
    let windows = enumerator.list_windows().await?;
    tracing::debug!("Enumerated {} windows", windows.len());

    let window = matcher
        .find(windows)
        .ok_or_else(|| DetectError::WindowNotFound {
            patterns: matcher.patterns().to_vec(),
        })?;

    let rect = enumerator.window_rect(window.handle).await?;
    tracing::debug!(
        "Located window {} {:?} at {:?}",
        window.handle,
        window.title,
        rect
    );

    Ok(LocatedWindow {
        handle: window.handle,
        title: window.title,
        rect,
    })
}
