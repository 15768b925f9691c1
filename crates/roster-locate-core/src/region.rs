//! Roster region inference
//!
//! Decides which OCR fragments belong to the roster list and unions their
//! boxes into one padded, window-relative rectangle.
//!
//! A fragment matches when its text satisfies any [`MatchRule`]. The default
//! rules, in order:
//!
//! | Rule | Pattern | Catches |
//! |------|---------|---------|
//! | `header` | `Rank` | the list's column header |
//! | `minutes` | `分` | remaining time in minutes |
//! | `hours` | `時間` | remaining time in hours |
//! | `digit` | `[0-9]` | any other numeric cell |
//!
//! Rule order only affects which name is reported in logs; inclusion is the
//! OR of all rules.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::{
    config::RegionConfig,
    error::{DetectError, DetectResult},
    model::{LineKey, Rectangle, TextFragment},
};

/// Compiled size limit for user-supplied patterns
const MAX_RULE_SIZE: usize = 1_048_576;

static DEFAULT_RULES: Lazy<Vec<MatchRule>> = Lazy::new(|| {
    [
        ("header", "Rank"),
        ("minutes", "分"),
        ("hours", "時間"),
        ("digit", "[0-9]"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| MatchRule::new(name, pattern).ok())
    .collect()
});

/// A named predicate over fragment text
#[derive(Debug, Clone)]
pub struct MatchRule {
    name: String,
    pattern: Regex,
}

impl MatchRule {
    /// Compiles `pattern` into a rule
    ///
    /// Returns `InvalidParameter` for invalid or oversized patterns.
    pub fn new(name: impl Into<String>, pattern: &str) -> DetectResult<Self> {
        let name = name.into();
        let pattern = RegexBuilder::new(pattern)
            .size_limit(MAX_RULE_SIZE)
            .build()
            .map_err(|e| DetectError::InvalidParameter {
                parameter: format!("rule:{name}"),
                reason: e.to_string(),
            })?;
        Ok(Self { name, pattern })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// The built-in roster rules
pub fn default_rules() -> Vec<MatchRule> {
    DEFAULT_RULES.clone()
}

/// Turns fragments into a padded window-relative rectangle
#[derive(Debug, Clone)]
pub struct RegionInferencer {
    rules: Vec<MatchRule>,
    config: RegionConfig,
}

impl Default for RegionInferencer {
    fn default() -> Self {
        Self::new(RegionConfig::default())
    }
}

impl RegionInferencer {
    pub fn new(config: RegionConfig) -> Self {
        Self::with_rules(default_rules(), config)
    }

    pub fn with_rules(rules: Vec<MatchRule>, config: RegionConfig) -> Self {
        Self { rules, config }
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// First rule satisfied by `text`, if any
    pub fn classify(&self, text: &str) -> Option<&MatchRule> {
        self.rules.iter().find(|rule| rule.matches(text))
    }

    /// Fragments selected for the union, in input order
    ///
    /// With line grouping enabled, every fragment on a line that holds at
    /// least one rule match is selected too.
    pub fn select<'a>(&self, fragments: &'a [TextFragment]) -> Vec<&'a TextFragment> {
        let direct: Vec<bool> = fragments
            .iter()
            .map(|fragment| self.classify(&fragment.text).is_some())
            .collect();

        if !self.config.group_lines {
            return fragments
                .iter()
                .zip(&direct)
                .filter_map(|(fragment, &hit)| hit.then_some(fragment))
                .collect();
        }

        let lines: HashSet<LineKey> = fragments
            .iter()
            .zip(&direct)
            .filter_map(|(fragment, &hit)| hit.then_some(fragment.line))
            .collect();

        fragments
            .iter()
            .zip(&direct)
            .filter_map(|(fragment, &hit)| (hit || lines.contains(&fragment.line)).then_some(fragment))
            .collect()
    }

    /// Infers the roster rectangle from `fragments`
    ///
    /// Fails with `RegionNotFound` when no selected fragment has positive
    /// extent, or the union lies entirely left of or above the window.
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_locate_core::{model::{Rectangle, TextFragment}, region::RegionInferencer};
    ///
    /// let fragments = vec![
    ///     TextFragment { left: 10, top: 20, width: 30, height: 15, text: "Rank".into(), ..Default::default() },
    ///     TextFragment { left: 10, top: 40, width: 30, height: 15, text: "12分".into(), ..Default::default() },
    /// ];
    /// let region = RegionInferencer::default().infer(&fragments).unwrap();
    /// assert_eq!(region, Rectangle::new(2, 12, 46, 51));
    /// ```
    pub fn infer(&self, fragments: &[TextFragment]) -> DetectResult<Rectangle> {
        let selected = self.select(fragments);
        let not_found = || DetectError::RegionNotFound {
            fragments: fragments.len(),
            matched: selected.len(),
        };

        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for fragment in selected.iter().filter(|f| f.has_area()) {
            let right = fragment.left.saturating_add(fragment.width);
            let bottom = fragment.top.saturating_add(fragment.height);
            bounds = Some(match bounds {
                None => (fragment.left, fragment.top, right, bottom),
                Some((l, t, r, b)) => (
                    l.min(fragment.left),
                    t.min(fragment.top),
                    r.max(right),
                    b.max(bottom),
                ),
            });
        }

        let (left, top, right, bottom) = bounds.ok_or_else(not_found)?;
        if right <= 0 || bottom <= 0 || right <= left || bottom <= top {
            return Err(not_found());
        }

        let pad = self.config.padding;
        let x = left.saturating_sub(pad).max(0);
        let y = top.saturating_sub(pad).max(0);
        let region = Rectangle::new(
            x,
            y,
            right.saturating_add(pad) - x,
            bottom.saturating_add(pad) - y,
        );

        tracing::debug!(
            "Region {:?} from {} of {} fragments",
            region,
            selected.len(),
            fragments.len()
        );
        Ok(region)
    }
}
