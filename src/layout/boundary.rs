//! Paragraph boundary decision.
//!
//! Decides whether the gap between two consecutive lines closes the current
//! block. The decision layers three mechanisms, checked in order:
//!
//! 1. a table of named override rules (list markers, heading release, font
//!    shifts) that short-circuit everything else;
//! 2. an outlier-only path for homogeneous profiles, where regular spacing
//!    means almost no gap is a boundary;
//! 3. a weighted score of visual, semantic, and contextual evidence for the
//!    ambiguous band between the profile's two thresholds.
//!
//! Each override rule is a `(name, predicate)` pair so individual rules stay
//! independently testable rather than a chain of inline booleans.

use crate::config::BoundaryConfig;
use crate::layout::gap_profile::{DocumentType, GapProfile};
use crate::layout::text_line::PositionedLine;

/// Running state of the block currently being accumulated.
#[derive(Debug, Clone)]
pub struct BlockState {
    /// Total characters across the block's lines
    pub char_count: usize,
    /// Number of lines in the block
    pub line_count: usize,
    /// Mean intra-block gap observed so far (0.0 for a single-line block)
    pub average_gap: f32,
    /// Mean font size of the block's lines
    pub average_font_size: f32,
    /// Whether the block opened with a list marker
    pub in_list_item: bool,
}

impl BlockState {
    /// State for a block freshly seeded with one line.
    pub fn seeded(line: &PositionedLine) -> Self {
        Self {
            char_count: line.text.chars().count(),
            line_count: 1,
            average_gap: 0.0,
            average_font_size: line.font_size,
            in_list_item: line.starts_list_marker(),
        }
    }
}

/// Everything the boundary decision can see for one line pair.
#[derive(Debug)]
pub struct BoundaryContext<'a> {
    /// Last line of the open block
    pub current: &'a PositionedLine,
    /// First line of the would-be next block
    pub next: &'a PositionedLine,
    /// Vertical gap between the two lines
    pub gap: f32,
    /// The column's gap profile
    pub profile: &'a GapProfile,
    /// State of the open block
    pub block: &'a BlockState,
    /// Gap preceding `current`, when one exists
    pub prev_gap: Option<f32>,
    /// Gap following `next`, when one exists
    pub next_gap: Option<f32>,
    /// Boundary tuning constants
    pub config: &'a BoundaryConfig,
}

/// A named override rule.
///
/// Returns `Some(true)` to force a break, `Some(false)` to force
/// continuation, `None` to defer to the next rule.
pub struct OverrideRule {
    /// Rule name, for logs and tests
    pub name: &'static str,
    /// The predicate
    pub check: fn(&BoundaryContext) -> Option<bool>,
}

/// Priority-zero rules, evaluated before any statistics.
pub const OVERRIDE_RULES: &[OverrideRule] = &[
    OverrideRule {
        name: "list-marker",
        check: list_marker_break,
    },
    OverrideRule {
        name: "list-continuation",
        check: list_continuation,
    },
    OverrideRule {
        name: "heading-release",
        check: heading_release,
    },
    OverrideRule {
        name: "font-shift",
        check: font_shift_break,
    },
];

/// A line opening a list item always starts a new block.
fn list_marker_break(ctx: &BoundaryContext) -> Option<bool> {
    if ctx.next.starts_list_marker() {
        Some(true)
    } else {
        None
    }
}

/// Wrapped continuation of an active list item stays in the block.
fn list_continuation(ctx: &BoundaryContext) -> Option<bool> {
    if ctx.block.in_list_item
        && ctx.next.starts_lowercase()
        && ctx.gap <= ctx.config.list_continuation_gap_factor * ctx.profile.paragraph_gap_min
    {
        Some(false)
    } else {
        None
    }
}

/// A short block that does not end a sentence, followed by a near-paragraph
/// gap and a capitalized line, reads as a heading releasing into body text.
fn heading_release(ctx: &BoundaryContext) -> Option<bool> {
    if ctx.block.char_count < ctx.config.short_block_chars
        && !ctx.current.ends_sentence()
        && ctx.gap >= ctx.config.heading_release_gap_factor * ctx.profile.paragraph_gap_min
        && ctx.next.starts_capitalized()
    {
        Some(true)
    } else {
        None
    }
}

/// A sizeable font-size change combined with a substantial gap breaks.
fn font_shift_break(ctx: &BoundaryContext) -> Option<bool> {
    if font_size_change(ctx.current, ctx.next) > ctx.config.font_change_ratio
        && ctx.gap >= ctx.config.font_change_gap_factor * ctx.profile.paragraph_gap_min
    {
        Some(true)
    } else {
        None
    }
}

/// Relative font-size change between two lines.
pub fn font_size_change(a: &PositionedLine, b: &PositionedLine) -> f32 {
    if a.font_size > 0.0 {
        (b.font_size - a.font_size).abs() / a.font_size
    } else {
        0.0
    }
}

/// Decide whether the gap between `current` and `next` is a paragraph
/// boundary.
pub fn is_paragraph_boundary(ctx: &BoundaryContext) -> bool {
    for rule in OVERRIDE_RULES {
        if let Some(decision) = (rule.check)(ctx) {
            log::trace!("boundary override {}: {}", rule.name, decision);
            return decision;
        }
    }

    if ctx.profile.is_homogeneous() {
        return homogeneous_boundary(ctx);
    }

    if ctx.gap >= ctx.profile.paragraph_gap_min {
        return true;
    }
    if ctx.gap <= ctx.profile.normal_gap_max {
        return false;
    }

    scored_boundary(ctx)
}

/// Homogeneous spacing breaks only on outliers.
///
/// Either the gap dwarfs the mean outright, or a smaller outlier is
/// confirmed by sentence-end plus capitalization semantics, or a clear font
/// jump closes a short block.
fn homogeneous_boundary(ctx: &BoundaryContext) -> bool {
    let profile = ctx.profile;
    let config = ctx.config;

    if ctx.gap >= profile.mean * config.homogeneous_outlier_factor {
        return true;
    }

    let confirmed_cutoff = profile
        .p95
        .max(profile.mean * config.homogeneous_confirmed_factor);
    if ctx.gap >= confirmed_cutoff
        && ctx.current.ends_sentence()
        && ctx.next.starts_capitalized()
    {
        return true;
    }

    font_size_change(ctx.current, ctx.next) > config.font_change_ratio
        && ctx.block.char_count < config.short_block_chars
}

/// Weighted scoring for gaps inside the ambiguous band.
fn scored_boundary(ctx: &BoundaryContext) -> bool {
    let visual = visual_score(ctx);
    let semantic = semantic_score(ctx);
    let contextual = contextual_score(ctx);

    let (wv, ws, wc) = score_weights(ctx.profile.document_type);
    let combined = wv * visual + ws * semantic + wc * contextual;

    log::trace!(
        "ambiguous gap {:.2}: visual={:.2} semantic={:.2} contextual={:.2} combined={:.2}",
        ctx.gap,
        visual,
        semantic,
        contextual,
        combined
    );

    if combined > ctx.config.break_score {
        true
    } else if combined < ctx.config.continue_score {
        false
    } else {
        // Tie-breaker: break only when visual and semantic evidence agree;
        // the default is continuation
        visual >= 0.5 && semantic >= 0.5
    }
}

/// Document-type-dependent weights for (visual, semantic, contextual).
fn score_weights(document_type: DocumentType) -> (f32, f32, f32) {
    match document_type {
        DocumentType::Bimodal => (0.5, 0.3, 0.2),
        DocumentType::Gradual => (0.4, 0.35, 0.25),
        DocumentType::Unknown => (0.34, 0.33, 0.33),
        // The homogeneous family never reaches scoring; keep sane weights
        DocumentType::Homogeneous | DocumentType::MostlyHomogeneous => (0.4, 0.35, 0.25),
    }
}

/// Position of the gap inside the ambiguous band, boosted when the gap
/// towers over both neighbors.
fn visual_score(ctx: &BoundaryContext) -> f32 {
    let band = ctx.profile.paragraph_gap_min - ctx.profile.normal_gap_max;
    let mut score = if band > 0.0 {
        ((ctx.gap - ctx.profile.normal_gap_max) / band).clamp(0.0, 1.0)
    } else {
        0.5
    };

    let ratio = ctx.config.neighbor_outlier_ratio;
    let towers_prev = ctx.prev_gap.map_or(false, |g| ctx.gap >= g * ratio);
    let towers_next = ctx.next_gap.map_or(false, |g| ctx.gap >= g * ratio);
    if towers_prev && towers_next {
        score += ctx.config.neighbor_outlier_boost;
    }

    score.clamp(0.0, 1.0)
}

/// Linguistic evidence: hyphenation and lowercase continuations argue
/// against a break, sentence end plus a capitalized opener argues for one.
fn semantic_score(ctx: &BoundaryContext) -> f32 {
    if ctx.current.ends_hyphenated() {
        return 0.05;
    }
    if ctx.next.starts_lowercase() {
        return 0.2;
    }
    if ctx.current.ends_sentence() && ctx.next.starts_capitalized() {
        return 0.85;
    }
    if ctx.next.starts_capitalized() {
        return 0.6;
    }
    0.5
}

/// Structural evidence: block length, font-size drift, and the gap's place
/// in the local gap sequence.
fn contextual_score(ctx: &BoundaryContext) -> f32 {
    let mut score: f32 = 0.5;

    // A long open block is more likely to be ending
    let length_ratio = (ctx.block.char_count as f32 / 300.0).min(1.0);
    score += 0.15 * length_ratio;

    // Font drift between the lines
    score += font_size_change(ctx.current, ctx.next).min(0.25);

    // Locally largest gap in the sequence
    if let (Some(prev), Some(next)) = (ctx.prev_gap, ctx.next_gap) {
        if ctx.gap > prev && ctx.gap > next {
            score += 0.1;
        }
    }

    score.clamp(0.0, 1.0)
}
