//! Heading hierarchy assignment.
//!
//! Assigns H1..H6 levels to lines an external classifier has already
//! identified as headings. Font-size clustering carries most of the weight;
//! the document outline and explicit numbering ("2.1.") refine it, and two
//! fallbacks (relative position, fixed ratio bands) catch headings the
//! clustering never saw. Every step degrades toward the next rather than
//! failing, and a final pass clamps skipped levels so the hierarchy always
//! nests.

use crate::config::HeadingConfig;
use crate::outline::{flatten_outline, FlatOutlineEntry, OutlineItem};
use crate::utils::safe_float_cmp;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Leading enumeration of a numbered heading: "3.", "2.1)", "1.2.3.".
    /// The marker must be followed by whitespace or end the line, so
    /// "3.14 is pi" does not read as a numbered heading.
    static ref NUMBERING_REGEX: Regex =
        Regex::new(r"^\s*((?:\d+\.){0,2}\d+)[.)](?:\s+|$)").expect("numbering regex is valid");
}

/// A heading line awaiting a level, as identified by the external
/// classifier.
#[derive(Debug, Clone)]
pub struct HeadingCandidate {
    /// The heading text
    pub text: String,
    /// Dominant font size of the heading line
    pub font_size: f32,
    /// Whether the line is bold
    pub is_bold: bool,
    /// Whether the line is italic
    pub is_italic: bool,
}

impl HeadingCandidate {
    /// Convenience constructor for a plain candidate.
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            is_bold: false,
            is_italic: false,
        }
    }
}

/// A heading with its assigned level.
#[derive(Debug, Clone)]
pub struct LeveledHeading {
    /// The heading text
    pub text: String,
    /// Font size carried through from the candidate
    pub font_size: f32,
    /// Number of numeric groups in a leading enumeration, when present
    pub numbering_depth: Option<usize>,
    /// Assigned level, 1..=6
    pub level: u8,
}

impl LeveledHeading {
    /// Whether this heading sits at the top of the hierarchy.
    pub fn is_top_level(&self) -> bool {
        self.level == 1
    }
}

/// Mapping from rounded font size to hierarchy level, built by clustering.
#[derive(Debug, Clone, Default)]
pub struct FontSizeHierarchy {
    /// Half-point font-size key to level, in descending size order
    levels: IndexMap<i64, u8>,
}

impl FontSizeHierarchy {
    /// Cluster a set of heading font sizes into levels.
    ///
    /// Sizes are sorted descending and grouped greedily while consecutive
    /// and group-average differences stay within tolerance; singleton
    /// groups merge into their nearest compatible neighbor. Group rank
    /// (largest first) becomes the level, capped at 6.
    pub fn from_sizes(sizes: &[f32], config: &HeadingConfig) -> Self {
        let mut valid: Vec<f32> = sizes
            .iter()
            .copied()
            .filter(|s| s.is_finite() && *s > 0.0)
            .collect();
        if valid.is_empty() {
            return Self::default();
        }
        valid.sort_by(|a, b| safe_float_cmp(*b, *a));

        // A wide size spread means a clear hierarchy; tighten the grouping
        let n = valid.len() as f32;
        let mean = valid.iter().sum::<f32>() / n;
        let std_dev = (valid.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n).sqrt();
        let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };
        let (rel_tol, abs_ratio) = if cv > config.spread_tighten_cv {
            (
                config.relative_tolerance_tight,
                config.absolute_tolerance_ratio_tight,
            )
        } else {
            (config.relative_tolerance, config.absolute_tolerance_ratio)
        };

        // Greedy grouping over descending sizes
        let mut groups: Vec<Vec<f32>> = Vec::new();
        for size in valid {
            let fits = groups.last().is_some_and(|group| {
                let last = *group.last().expect("groups are non-empty");
                let avg = group.iter().sum::<f32>() / group.len() as f32;
                last - size <= rel_tol * last && avg - size <= abs_ratio * avg
            });
            if fits {
                groups.last_mut().expect("checked non-empty").push(size);
            } else {
                groups.push(vec![size]);
            }
        }

        // Merge singletons into the nearest compatible group
        let mut merged: Vec<Vec<f32>> = Vec::new();
        for group in groups {
            if group.len() == 1 && !merged.is_empty() {
                let size = group[0];
                let neighbor = merged.last_mut().expect("checked non-empty");
                let avg = neighbor.iter().sum::<f32>() / neighbor.len() as f32;
                if (avg - size).abs() <= abs_ratio * avg * config.singleton_merge_factor {
                    neighbor.push(size);
                    continue;
                }
            }
            merged.push(group);
        }

        let mut levels = IndexMap::new();
        for (rank, group) in merged.iter().enumerate() {
            let level = (rank + 1).min(6) as u8;
            for &size in group {
                levels.entry(half_point_key(size)).or_insert(level);
            }
        }
        Self { levels }
    }

    /// Level for a font size, when the clustering covered it.
    pub fn level_for(&self, font_size: f32) -> Option<u8> {
        self.levels.get(&half_point_key(font_size)).copied()
    }

    /// Whether clustering produced any levels at all.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn half_point_key(size: f32) -> i64 {
    (size * 2.0).round() as i64
}

/// Assign levels to a document's heading candidates.
///
/// Builds the font-size hierarchy from the candidates themselves, then
/// resolves each heading through the override chain. For multi-pass
/// processing (document-level hierarchy, per-page assignment) build the
/// hierarchy once and call [`assign_with_hierarchy`] directly.
pub fn assign_heading_levels(
    candidates: &[HeadingCandidate],
    base_font_size: f32,
    outline: Option<&[OutlineItem]>,
    config: &HeadingConfig,
) -> Vec<LeveledHeading> {
    let valid = validate_candidates(candidates, config);
    let sizes: Vec<f32> = valid.iter().map(|c| c.font_size).collect();
    let hierarchy = FontSizeHierarchy::from_sizes(&sizes, config);
    assign_validated(&valid, &hierarchy, base_font_size, outline, config)
}

/// Assign levels against a pre-built hierarchy.
///
/// Resolution order per heading: font-size clustering, outline override,
/// numbering override, relative-position fallback, ratio-band fallback.
/// A final pass enforces the nesting invariant
/// `level[i+1] <= max(level[0..=i]) + 1`.
pub fn assign_with_hierarchy(
    candidates: &[HeadingCandidate],
    hierarchy: &FontSizeHierarchy,
    base_font_size: f32,
    outline: Option<&[OutlineItem]>,
    config: &HeadingConfig,
) -> Vec<LeveledHeading> {
    let valid = validate_candidates(candidates, config);
    assign_validated(&valid, hierarchy, base_font_size, outline, config)
}

/// Validate/clamp font sizes; entries outside the accepted range drop out.
fn validate_candidates(
    candidates: &[HeadingCandidate],
    config: &HeadingConfig,
) -> Vec<HeadingCandidate> {
    candidates
        .iter()
        .filter(|c| c.font_size.is_finite() && c.font_size > config.font_size_min)
        .map(|c| {
            let mut c = c.clone();
            c.font_size = c.font_size.min(config.font_size_max);
            c
        })
        .collect()
}

fn assign_validated(
    valid: &[HeadingCandidate],
    hierarchy: &FontSizeHierarchy,
    base_font_size: f32,
    outline: Option<&[OutlineItem]>,
    config: &HeadingConfig,
) -> Vec<LeveledHeading> {
    if valid.is_empty() {
        return Vec::new();
    }

    let flat_outline = outline.map(flatten_outline).unwrap_or_default();

    let mut headings: Vec<LeveledHeading> = Vec::new();
    let mut previous_level: Option<u8> = None;

    for candidate in valid {
        let clustered = hierarchy.level_for(candidate.font_size);
        let depth = numbering_depth(&candidate.text);
        let mut level = clustered;

        // Outline corroboration, bounded by the clustered level
        if let Some(outline_level) = outline_level(&candidate.text, &flat_outline, config) {
            let acceptable = clustered.map_or(true, |c| {
                outline_level.abs_diff(c) <= config.outline_max_divergence
            });
            if acceptable {
                level = Some(outline_level);
            } else {
                log::debug!(
                    "outline level {} for {:?} diverges from clustered {:?}; ignored",
                    outline_level,
                    candidate.text,
                    clustered
                );
            }
        }

        // Explicit numbering: depth d means level d+1, so a lone "1." is
        // level 2, never level 1. Multi-part numbering is authoritative;
        // single-part wins only when it deepens the current answer.
        if let Some(depth) = depth {
            let numbered = ((depth + 1).min(6)) as u8;
            match level {
                Some(current) if depth < 2 && numbered <= current => {},
                _ => level = Some(numbered),
            }
        }

        // Relative position: one deeper than the previous heading, taken
        // when clustering has nothing better to say
        if level.is_none() {
            if let Some(prev) = previous_level {
                let relative = (prev + 1).min(6);
                let acceptable = clustered.map_or(true, |c| relative.abs_diff(c) <= 1);
                if acceptable {
                    level = Some(relative);
                }
            }
        }

        // Last resort: fixed ratio bands against the base font size
        let level = level
            .unwrap_or_else(|| ratio_band_level(candidate.font_size, base_font_size, config));

        previous_level = Some(level);
        headings.push(LeveledHeading {
            text: candidate.text.clone(),
            font_size: candidate.font_size,
            numbering_depth: depth,
            level,
        });
    }

    enforce_nesting(&mut headings);
    headings
}

/// Count of numeric groups in a leading enumeration.
///
/// "3." has depth 1, "2.1." depth 2, "1.2.3)" depth 3; absent enumerations
/// yield `None`.
pub fn numbering_depth(text: &str) -> Option<usize> {
    NUMBERING_REGEX
        .captures(text)
        .map(|captures| captures[1].split('.').count())
}

/// Fixed ratio bands of `font_size / base_font_size`, the terminal
/// fallback when every other signal is absent.
pub fn ratio_band_level(font_size: f32, base_font_size: f32, config: &HeadingConfig) -> u8 {
    let base = if base_font_size > 0.0 {
        base_font_size
    } else {
        12.0
    };
    let ratio = font_size / base;
    for &(threshold, level) in &config.ratio_bands {
        if ratio >= threshold {
            return level;
        }
    }
    6
}

/// Find a heading's level in the flattened outline.
///
/// Exact title match first; otherwise the best substring containment with
/// similarity (shorter length over longer) at or above the threshold.
fn outline_level(text: &str, outline: &[FlatOutlineEntry], config: &HeadingConfig) -> Option<u8> {
    if outline.is_empty() {
        return None;
    }

    let needle = normalize(text);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<(f32, u8)> = None;
    for entry in outline {
        let title = normalize(&entry.title);
        if title.is_empty() {
            continue;
        }
        if title == needle {
            return Some(entry.depth);
        }

        let similarity = if title.contains(&needle) || needle.contains(&title) {
            title.len().min(needle.len()) as f32 / title.len().max(needle.len()) as f32
        } else {
            0.0
        };
        if similarity >= config.outline_similarity_min
            && best.map_or(true, |(s, _)| similarity > s)
        {
            best = Some((similarity, entry.depth));
        }
    }

    best.map(|(_, depth)| depth)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Clamp levels so no heading skips past `max(seen) + 1`.
fn enforce_nesting(headings: &mut [LeveledHeading]) {
    let mut max_seen: Option<u8> = None;
    for heading in headings {
        if let Some(max) = max_seen {
            if heading.level > max + 1 {
                heading.level = max + 1;
            }
        }
        max_seen = Some(max_seen.map_or(heading.level, |m| m.max(heading.level)));
    }
}
