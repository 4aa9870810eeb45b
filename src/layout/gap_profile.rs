//! Inter-line gap distribution statistics and classification.
//!
//! Builds a [`GapProfile`] from the vertical gaps between Y-adjacent lines
//! and classifies how uniform the document's spacing is. The classification
//! drives how aggressively the block builder treats a gap as a paragraph
//! boundary: a homogeneous document breaks only on extreme outliers, a
//! bimodal one breaks cleanly between its two gap clusters.
//!
//! Two hard rules hold throughout:
//! - gaps are measured only between lines sharing a page;
//! - a profile is built from one column's gaps only, never a mix. Mixing
//!   columns folds the column gap into the paragraph-gap signal and
//!   destroys both.

use crate::config::GapConfig;
use crate::layout::metrics::DocumentMetrics;
use crate::layout::text_line::PositionedLine;
use crate::utils::safe_float_cmp;

/// How uniform a gap distribution is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    /// Essentially constant line spacing
    Homogeneous,
    /// Constant spacing with a small noisy tail
    MostlyHomogeneous,
    /// Two clearly separated gap clusters (line spacing vs paragraph spacing)
    Bimodal,
    /// A smooth spread with no clear structure
    Gradual,
    /// Too few gaps to classify
    Unknown,
}

/// Statistical profile of one column's inter-line gaps.
#[derive(Debug, Clone)]
pub struct GapProfile {
    /// Distribution shape classification
    pub document_type: DocumentType,
    /// Uniformity score in `[0, 1]`; 1.0 is perfectly regular spacing
    pub homogeneity_level: f32,
    /// Largest gap still considered normal line spacing
    pub normal_gap_max: f32,
    /// Smallest gap considered a paragraph break
    pub paragraph_gap_min: f32,
    /// Mean gap
    pub mean: f32,
    /// Median gap
    pub median: f32,
    /// Gap standard deviation
    pub std_dev: f32,
    /// 25th percentile
    pub p25: f32,
    /// 75th percentile
    pub p75: f32,
    /// 90th percentile
    pub p90: f32,
    /// 95th percentile
    pub p95: f32,
    /// 99th percentile
    pub p99: f32,
    /// Fraction of gaps within one standard deviation of the mean
    pub close_to_mean_ratio: f32,
    /// Sample-size confidence in `[0, 1]`
    pub confidence: f32,
}

impl GapProfile {
    /// Build a profile from the same-page gaps of a line set.
    ///
    /// Lines are sorted by `(page, y)`; only deltas between consecutive
    /// lines of the same page contribute. Call this once per column.
    pub fn from_lines(
        lines: &[&PositionedLine],
        metrics: &DocumentMetrics,
        config: &GapConfig,
    ) -> Self {
        Self::from_gaps(collect_gaps(lines), metrics, config)
    }

    /// Build a profile from pre-collected gaps.
    ///
    /// Non-finite and non-positive gaps are filtered out; too few survivors
    /// yield an [`DocumentType::Unknown`] profile seeded from the document
    /// metrics. Never fails.
    pub fn from_gaps(gaps: Vec<f32>, metrics: &DocumentMetrics, config: &GapConfig) -> Self {
        let mut gaps: Vec<f32> = gaps
            .into_iter()
            .filter(|g| g.is_finite() && *g > 0.0)
            .collect();
        gaps.sort_by(|a, b| safe_float_cmp(*a, *b));

        if gaps.len() < config.min_samples {
            return Self::unknown(metrics, gaps.len(), config);
        }

        let n = gaps.len() as f32;
        let mean = gaps.iter().sum::<f32>() / n;
        let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f32>() / n;
        let std_dev = variance.sqrt();
        let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

        let median = percentile(&gaps, 50.0);
        let p25 = percentile(&gaps, 25.0);
        let p75 = percentile(&gaps, 75.0);
        let p90 = percentile(&gaps, 90.0);
        let p95 = percentile(&gaps, 95.0);
        let p99 = percentile(&gaps, 99.0);

        let close_to_mean_ratio =
            gaps.iter().filter(|g| (*g - mean).abs() <= std_dev).count() as f32 / n;

        let confidence = (gaps.len() as f32 / config.confidence_saturation as f32).min(1.0);
        let homogeneity_level =
            ((1.0 - cv.min(1.0)) * 0.5 + close_to_mean_ratio * 0.5).clamp(0.0, 1.0);

        // Classification, in priority order
        let (document_type, normal_gap_max, paragraph_gap_min) = if cv < config.cv_homogeneous
            || (std_dev < config.stddev_homogeneous
                && close_to_mean_ratio > config.close_ratio_homogeneous)
        {
            (
                DocumentType::Homogeneous,
                mean * config.homogeneous_normal_factor,
                mean * config.homogeneous_paragraph_factor,
            )
        } else if cv < config.cv_mostly_homogeneous
            || (cv < config.cv_mostly_homogeneous_max
                && close_to_mean_ratio > config.close_ratio_mostly)
        {
            (
                DocumentType::MostlyHomogeneous,
                mean * config.mostly_normal_factor,
                p95.max(mean * config.mostly_paragraph_factor),
            )
        } else if let Some((small, large, small_count)) = bimodal_split(&gaps, config) {
            let spread = large - small;
            let normal = small + spread * 0.25;
            let mut paragraph = large - spread * 0.25;
            if paragraph < normal * config.bimodal_enforced_separation {
                paragraph = normal * config.bimodal_enforced_separation;
            }
            log::debug!(
                "bimodal gaps: small={:.2} ({} pts), large={:.2}",
                small,
                small_count,
                large
            );
            (DocumentType::Bimodal, normal, paragraph)
        } else {
            let normal = p75;
            let mut paragraph = p90;
            if paragraph - normal < std_dev {
                paragraph = normal + std_dev;
            }
            (DocumentType::Gradual, normal, paragraph)
        };

        Self {
            document_type,
            homogeneity_level,
            normal_gap_max,
            paragraph_gap_min,
            mean,
            median,
            std_dev,
            p25,
            p75,
            p90,
            p95,
            p99,
            close_to_mean_ratio,
            confidence,
        }
    }

    /// Whether the profile is in the homogeneous family.
    pub fn is_homogeneous(&self) -> bool {
        matches!(
            self.document_type,
            DocumentType::Homogeneous | DocumentType::MostlyHomogeneous
        )
    }

    fn unknown(metrics: &DocumentMetrics, samples: usize, config: &GapConfig) -> Self {
        let normal = metrics.mode_spacing * 1.1;
        let paragraph = metrics.paragraph_gap_threshold.max(normal * 1.5);
        Self {
            document_type: DocumentType::Unknown,
            homogeneity_level: 0.5,
            normal_gap_max: normal,
            paragraph_gap_min: paragraph,
            mean: metrics.mode_spacing,
            median: metrics.mode_spacing,
            std_dev: 0.0,
            p25: metrics.mode_spacing,
            p75: metrics.mode_spacing,
            p90: metrics.mode_spacing,
            p95: metrics.mode_spacing,
            p99: metrics.mode_spacing,
            close_to_mean_ratio: 0.0,
            confidence: (samples as f32 / config.confidence_saturation as f32).min(0.2),
        }
    }
}

/// Collect same-page gaps from a line set, sorted by `(page, y)`.
///
/// Cross-page adjacency never contributes: the gap between the last line of
/// one page and the first line of the next is undefined.
pub fn collect_gaps(lines: &[&PositionedLine]) -> Vec<f32> {
    let mut sorted: Vec<&PositionedLine> =
        lines.iter().copied().filter(|l| l.has_valid_geometry()).collect();
    sorted.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then_with(|| safe_float_cmp(a.y, b.y))
            .then_with(|| safe_float_cmp(a.x, b.x))
    });

    sorted
        .windows(2)
        .filter(|pair| pair[0].page == pair[1].page)
        .map(|pair| pair[1].y - pair[0].y)
        .collect()
}

/// Nearest-rank percentile of an ascending-sorted slice.
fn percentile(sorted: &[f32], p: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * (sorted.len() - 1) as f32).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// 2-means split of the gap set into small and large clusters.
///
/// Returns `(small_mean, large_mean, small_count)` when the clusters are
/// separated enough and the small cluster carries at least half the points
/// (regular line spacing must dominate for the split to mean anything).
fn bimodal_split(sorted_gaps: &[f32], config: &GapConfig) -> Option<(f32, f32, usize)> {
    let first = *sorted_gaps.first()?;
    let last = *sorted_gaps.last()?;
    if last <= first {
        return None;
    }

    let mut small_center = first;
    let mut large_center = last;

    for _ in 0..config.split_max_iterations {
        let mut small_sum = 0.0;
        let mut small_n = 0usize;
        let mut large_sum = 0.0;
        let mut large_n = 0usize;

        for &gap in sorted_gaps {
            if (gap - small_center).abs() <= (gap - large_center).abs() {
                small_sum += gap;
                small_n += 1;
            } else {
                large_sum += gap;
                large_n += 1;
            }
        }

        if small_n == 0 || large_n == 0 {
            return None;
        }

        let new_small = small_sum / small_n as f32;
        let new_large = large_sum / large_n as f32;
        let moved = (new_small - small_center).abs().max((new_large - large_center).abs());
        small_center = new_small;
        large_center = new_large;

        if moved < config.split_epsilon {
            break;
        }
    }

    let small_count = sorted_gaps
        .iter()
        .filter(|g| (**g - small_center).abs() <= (**g - large_center).abs())
        .count();

    let separation = (large_center - small_center) / large_center.max(f32::EPSILON);
    let small_share = small_count as f32 / sorted_gaps.len() as f32;

    if separation > config.bimodal_separation_min && small_share >= config.bimodal_small_share_min {
        Some((small_center, large_center, small_count))
    } else {
        None
    }
}
