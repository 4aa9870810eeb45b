//! Document metrics estimation.
//!
//! Measures base font size and dominant line spacing from a sample of
//! positioned lines, and derives the default paragraph-gap threshold every
//! downstream analyzer starts from. Documents vary wildly (6pt footnotes to
//! 72pt titles, single and double spacing), so fixed thresholds work poorly;
//! measured ones adapt.

use crate::config::MetricsConfig;
use crate::layout::text_line::PositionedLine;
use crate::utils::safe_float_cmp;
use indexmap::IndexMap;

/// Measured document metrics used to seed every downstream threshold.
#[derive(Debug, Clone)]
pub struct DocumentMetrics {
    /// Most frequent font size, rounded to the nearest 0.5pt.
    ///
    /// Ties break toward the size seen first in the sample.
    pub base_font_size: f32,

    /// Median font size across the sample.
    pub median_font_size: f32,

    /// Most frequent integer-rounded gap between Y-sorted lines.
    ///
    /// Gaps at or above `base_font_size * page_break_gap_factor` are
    /// excluded as page-break noise.
    pub mode_spacing: f32,

    /// Default paragraph-gap threshold:
    /// `max(mode_spacing * 1.5, base_font_size * 1.2)`.
    pub paragraph_gap_threshold: f32,
}

impl DocumentMetrics {
    /// Estimate metrics from a line sample.
    ///
    /// The sample normally spans the document's leading pages (see
    /// [`sample_lines`]). An empty or entirely invalid sample yields the
    /// documented defaults; this function never fails.
    pub fn from_sample(sample: &[PositionedLine], config: &MetricsConfig) -> Self {
        let valid: Vec<&PositionedLine> =
            sample.iter().filter(|l| l.has_valid_geometry()).collect();

        if valid.is_empty() {
            return Self::fallback(config);
        }

        let base_font_size = mode_font_size(&valid, config);
        let median_font_size = median_font_size(&valid);
        let mode_spacing = mode_spacing(&valid, base_font_size, config);

        let paragraph_gap_threshold = (mode_spacing * config.paragraph_mode_factor)
            .max(base_font_size * config.paragraph_font_factor);

        Self {
            base_font_size,
            median_font_size,
            mode_spacing,
            paragraph_gap_threshold,
        }
    }

    /// Documented defaults for an empty or invalid sample: 12pt text with
    /// single line spacing.
    pub fn fallback(config: &MetricsConfig) -> Self {
        let base = config.default_base_font_size;
        let spacing = base * config.paragraph_font_factor;
        Self {
            base_font_size: base,
            median_font_size: base,
            mode_spacing: spacing,
            paragraph_gap_threshold: (spacing * config.paragraph_mode_factor)
                .max(base * config.paragraph_font_factor),
        }
    }
}

/// Select the metrics sample: all lines on the leading pages.
///
/// `page_count` bounds the sample window so short documents contribute
/// everything they have.
pub fn sample_lines<'a>(
    lines: &'a [PositionedLine],
    page_count: usize,
    config: &MetricsConfig,
) -> Vec<&'a PositionedLine> {
    let window = config.sample_pages.min(page_count.max(1)) as u32;
    lines.iter().filter(|l| l.page < window).collect()
}

/// Most frequent font size after rounding to the nearest 0.5pt.
///
/// Counting runs over an insertion-ordered map so that ties break toward
/// the first-seen size.
fn mode_font_size(lines: &[&PositionedLine], config: &MetricsConfig) -> f32 {
    let mut counts: IndexMap<i64, usize> = IndexMap::new();
    for line in lines {
        // Key in half-points: 12.25 and 12.3 both land on 12.5
        let key = (line.font_size * 2.0).round() as i64;
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut best: Option<(i64, usize)> = None;
    for (&key, &count) in &counts {
        // Strictly greater keeps the first-seen winner on ties
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }

    best.map(|(key, _)| key as f32 / 2.0)
        .unwrap_or(config.default_base_font_size)
}

fn median_font_size(lines: &[&PositionedLine]) -> f32 {
    let mut sizes: Vec<f32> = lines.iter().map(|l| l.font_size).collect();
    sizes.sort_by(|a, b| safe_float_cmp(*a, *b));
    sizes[sizes.len() / 2]
}

/// Most frequent integer-rounded gap between Y-sorted lines of each page.
///
/// Gaps are only measured between lines sharing a page; cross-page deltas
/// are meaningless. Gaps that round to zero (fragments on one baseline) and
/// gaps past the page-break cutoff are skipped.
fn mode_spacing(lines: &[&PositionedLine], base_font_size: f32, config: &MetricsConfig) -> f32 {
    let cutoff = base_font_size * config.page_break_gap_factor;

    let mut ys_by_page: IndexMap<u32, Vec<f32>> = IndexMap::new();
    for line in lines {
        ys_by_page.entry(line.page).or_default().push(line.y);
    }

    let mut counts: IndexMap<i64, usize> = IndexMap::new();
    for ys in ys_by_page.values_mut() {
        ys.sort_by(|a, b| safe_float_cmp(*a, *b));
        for pair in ys.windows(2) {
            let gap = pair[1] - pair[0];
            let rounded = gap.round() as i64;
            if rounded > 0 && gap < cutoff {
                *counts.entry(rounded).or_insert(0) += 1;
            }
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for (&key, &count) in &counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }

    best.map(|(key, _)| key as f32)
        .unwrap_or(base_font_size * config.paragraph_font_factor)
}
