//! Configuration for layout analysis.
//!
//! Every empirically tuned constant in the analysis pipeline lives here as a
//! named, documented field with its default value. The defaults were hand-fit
//! against sample documents; treat them as calibration targets for a
//! regression corpus, not as analytically derived values.

use crate::error::{Error, Result};

/// Top-level configuration for the layout analysis pipeline.
///
/// Follows a builder style for the commonly adjusted knobs:
///
/// ```
/// use docstrata::config::LayoutConfig;
///
/// let config = LayoutConfig::new().with_sample_pages(5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutConfig {
    /// Document metrics estimation (base font size, mode spacing).
    pub metrics: MetricsConfig,
    /// Gap distribution statistics and classification.
    pub gaps: GapConfig,
    /// Paragraph boundary decision rules.
    pub boundary: BoundaryConfig,
    /// Vertical strip density analysis.
    pub strips: StripConfig,
    /// Column detection and reconciliation.
    pub columns: ColumnConfig,
    /// Block segmentation rules.
    pub blocks: BlockConfig,
    /// Heading hierarchy assignment.
    pub headings: HeadingConfig,
}

impl LayoutConfig {
    /// Create a configuration with the calibrated defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of leading pages sampled for document metrics.
    pub fn with_sample_pages(mut self, pages: usize) -> Self {
        self.metrics.sample_pages = pages;
        self
    }

    /// Set the minimum number of lines required to keep a column candidate.
    pub fn with_min_column_lines(mut self, lines: usize) -> Self {
        self.columns.min_cluster_lines = lines;
        self
    }

    /// Check every numeric field for finiteness and sign.
    ///
    /// The analyzers themselves never validate configuration; a bad value
    /// would silently skew thresholds, so the check happens once at
    /// construction of the document analyzer.
    pub fn validate(&self) -> Result<()> {
        let positive: &[(&'static str, f32)] = &[
            ("metrics.default_base_font_size", self.metrics.default_base_font_size),
            ("metrics.page_break_gap_factor", self.metrics.page_break_gap_factor),
            ("metrics.paragraph_mode_factor", self.metrics.paragraph_mode_factor),
            ("metrics.paragraph_font_factor", self.metrics.paragraph_font_factor),
            ("gaps.split_epsilon", self.gaps.split_epsilon),
            ("boundary.break_score", self.boundary.break_score),
            ("boundary.continue_score", self.boundary.continue_score),
            ("strips.bucket_min_width", self.strips.bucket_min_width),
            ("strips.bucket_font_factor", self.strips.bucket_font_factor),
            ("strips.coverage_quantum", self.strips.coverage_quantum),
            ("columns.cluster_tolerance_factor", self.columns.cluster_tolerance_factor),
            ("columns.accept_score", self.columns.accept_score),
            ("blocks.blank_line_font_factor", self.blocks.blank_line_font_factor),
            ("headings.outline_similarity_min", self.headings.outline_similarity_min),
        ];

        for &(field, value) in positive {
            if !value.is_finite() {
                return Err(Error::InvalidConfig {
                    field,
                    value,
                    reason: "must be finite",
                });
            }
            if value <= 0.0 {
                return Err(Error::InvalidConfig {
                    field,
                    value,
                    reason: "must be positive",
                });
            }
        }

        if self.boundary.continue_score >= self.boundary.break_score {
            return Err(Error::InvalidConfig {
                field: "boundary.continue_score",
                value: self.boundary.continue_score,
                reason: "must be below break_score",
            });
        }

        Ok(())
    }
}

/// Constants for document metrics estimation.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Leading pages sampled when estimating document metrics.
    pub sample_pages: usize,
    /// Base font size assumed when the sample is empty or invalid.
    pub default_base_font_size: f32,
    /// Gaps at or above `base_font_size * this` are treated as page-break
    /// noise and excluded from the spacing mode.
    pub page_break_gap_factor: f32,
    /// Paragraph threshold contribution from the spacing mode.
    pub paragraph_mode_factor: f32,
    /// Paragraph threshold contribution from the base font size.
    pub paragraph_font_factor: f32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sample_pages: 3,
            default_base_font_size: 12.0,
            page_break_gap_factor: 10.0,
            paragraph_mode_factor: 1.5,
            paragraph_font_factor: 1.2,
        }
    }
}

/// Constants for gap distribution classification.
#[derive(Debug, Clone)]
pub struct GapConfig {
    /// Minimum number of gaps required before a profile is classified.
    pub min_samples: usize,
    /// Coefficient of variation below which spacing is homogeneous.
    pub cv_homogeneous: f32,
    /// Alternative homogeneous trigger: absolute deviation ceiling.
    pub stddev_homogeneous: f32,
    /// Alternative homogeneous trigger: close-to-mean ratio floor.
    pub close_ratio_homogeneous: f32,
    /// CV below which spacing is mostly homogeneous.
    pub cv_mostly_homogeneous: f32,
    /// Upper CV edge of the mostly-homogeneous band, requiring a high
    /// close-to-mean ratio to qualify.
    pub cv_mostly_homogeneous_max: f32,
    /// Close-to-mean ratio floor for the upper mostly-homogeneous band.
    pub close_ratio_mostly: f32,
    /// Homogeneous: normal gap ceiling as a multiple of the mean.
    pub homogeneous_normal_factor: f32,
    /// Homogeneous: paragraph gap floor as a multiple of the mean.
    pub homogeneous_paragraph_factor: f32,
    /// Mostly homogeneous: normal gap ceiling as a multiple of the mean.
    pub mostly_normal_factor: f32,
    /// Mostly homogeneous: paragraph gap floor as a multiple of the mean
    /// (the p95 wins when larger).
    pub mostly_paragraph_factor: f32,
    /// Bimodal: minimum relative separation between the two gap clusters.
    pub bimodal_separation_min: f32,
    /// Bimodal: minimum share of gaps in the small cluster.
    pub bimodal_small_share_min: f32,
    /// Bimodal: enforced minimum ratio between paragraph and normal
    /// thresholds when the derived values sit too close.
    pub bimodal_enforced_separation: f32,
    /// Maximum iterations of the 2-means gap split.
    pub split_max_iterations: usize,
    /// Convergence epsilon of the 2-means gap split.
    pub split_epsilon: f32,
    /// Gap count at which profile confidence saturates.
    pub confidence_saturation: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            cv_homogeneous: 0.02,
            stddev_homogeneous: 0.1,
            close_ratio_homogeneous: 0.9,
            cv_mostly_homogeneous: 0.10,
            cv_mostly_homogeneous_max: 0.15,
            close_ratio_mostly: 0.85,
            homogeneous_normal_factor: 0.99,
            homogeneous_paragraph_factor: 3.0,
            mostly_normal_factor: 1.1,
            mostly_paragraph_factor: 2.0,
            bimodal_separation_min: 0.3,
            bimodal_small_share_min: 0.5,
            bimodal_enforced_separation: 1.5,
            split_max_iterations: 10,
            split_epsilon: 0.01,
            confidence_saturation: 30,
        }
    }
}

/// Constants for the paragraph boundary decision.
#[derive(Debug, Clone)]
pub struct BoundaryConfig {
    /// List continuation keeps the block while the gap stays at or below
    /// `paragraph_gap_min * this`.
    pub list_continuation_gap_factor: f32,
    /// Heading release fires once the gap reaches `paragraph_gap_min * this`.
    pub heading_release_gap_factor: f32,
    /// Relative font-size change that counts as a style shift.
    pub font_change_ratio: f32,
    /// Gap floor for a style-shift break, as a multiple of paragraph_gap_min.
    pub font_change_gap_factor: f32,
    /// Homogeneous profiles break only at gaps of `mean * this` or larger.
    pub homogeneous_outlier_factor: f32,
    /// Homogeneous profiles also break at `max(p95, mean * this)` when
    /// sentence-end and capitalization agree.
    pub homogeneous_confirmed_factor: f32,
    /// Character count under which an open block counts as short.
    pub short_block_chars: usize,
    /// Combined score above which the ambiguous band breaks.
    pub break_score: f32,
    /// Combined score below which the ambiguous band continues.
    pub continue_score: f32,
    /// Visual score boost applied when the gap towers over both neighbors.
    pub neighbor_outlier_boost: f32,
    /// Neighbor-gap ratio that counts as towering.
    pub neighbor_outlier_ratio: f32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            list_continuation_gap_factor: 0.9,
            heading_release_gap_factor: 0.9,
            font_change_ratio: 0.20,
            font_change_gap_factor: 0.7,
            homogeneous_outlier_factor: 3.0,
            homogeneous_confirmed_factor: 2.0,
            short_block_chars: 150,
            break_score: 0.65,
            continue_score: 0.35,
            neighbor_outlier_boost: 0.15,
            neighbor_outlier_ratio: 1.5,
        }
    }
}

/// Constants for vertical strip density analysis.
#[derive(Debug, Clone)]
pub struct StripConfig {
    /// Absolute floor on bucket width, in page units.
    pub bucket_min_width: f32,
    /// Bucket width as a fraction of the base font size.
    pub bucket_font_factor: f32,
    /// Quantization granularity of the Y-coverage set, in page units.
    pub coverage_quantum: f32,
    /// A bucket is dense when its line count reaches `average * this`.
    pub dense_line_count_factor: f32,
    /// A bucket is dense when its Y coverage reaches this fraction of the
    /// page height.
    pub dense_coverage_ratio: f32,
    /// A bucket with any lines is dense once coverage reaches this fraction.
    pub weak_coverage_ratio: f32,
    /// A bucket is dense when its width density reaches this fraction of the
    /// page's maximum bucket density.
    pub dense_density_ratio: f32,
    /// Column gap width floor as a multiple of the base font size.
    pub gap_font_factor: f32,
    /// Column gap width floor as a multiple of the bucket width.
    pub gap_bucket_factor: f32,
    /// A run this wide qualifies even without dense buckets on both sides.
    pub wide_gap_font_factor: f32,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            bucket_min_width: 10.0,
            bucket_font_factor: 0.5,
            coverage_quantum: 5.0,
            dense_line_count_factor: 1.5,
            dense_coverage_ratio: 0.08,
            weak_coverage_ratio: 0.03,
            dense_density_ratio: 0.30,
            gap_font_factor: 1.2,
            gap_bucket_factor: 2.0,
            wide_gap_font_factor: 2.5,
        }
    }
}

/// Constants for column detection.
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    /// Left-edge clustering tolerance as a multiple of the base font size.
    pub cluster_tolerance_factor: f32,
    /// Absolute floor on lines per column candidate.
    pub min_cluster_lines: usize,
    /// Relative floor on lines per column candidate (share of total lines).
    pub min_cluster_share: f32,
    /// Percentile of member right edges used as the column's right bound.
    pub right_edge_percentile: f32,
    /// Right margin added to the column bound, as a multiple of base font.
    pub right_margin_factor: f32,
    /// Weight of the horizontal overlap score during line assignment.
    pub horizontal_weight: f32,
    /// Weight of the vertical proximity score during line assignment.
    pub proximity_weight: f32,
    /// Weight of line-relative overlap inside the horizontal score.
    pub overlap_line_weight: f32,
    /// Weight of column-relative overlap inside the horizontal score.
    pub overlap_column_weight: f32,
    /// Proximity radius (in base font sizes) scoring 1.0.
    pub proximity_near_factor: f32,
    /// Proximity radius (in base font sizes) scoring 0.7.
    pub proximity_mid_factor: f32,
    /// Minimum combined score to accept an assignment outright.
    pub accept_score: f32,
    /// Fallback assignment radius as a multiple of the column width.
    pub fallback_width_factor: f32,
    /// Fraction of a line's width that must overlap a visual span for
    /// membership.
    pub span_overlap_min: f32,
    /// Columns separated by less than `base * this` are flagged.
    pub min_separation_factor: f32,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            cluster_tolerance_factor: 2.0,
            min_cluster_lines: 3,
            min_cluster_share: 0.05,
            right_edge_percentile: 0.90,
            right_margin_factor: 0.5,
            horizontal_weight: 0.7,
            proximity_weight: 0.3,
            overlap_line_weight: 0.7,
            overlap_column_weight: 0.3,
            proximity_near_factor: 3.0,
            proximity_mid_factor: 10.0,
            accept_score: 0.40,
            fallback_width_factor: 2.0,
            span_overlap_min: 0.5,
            min_separation_factor: 1.5,
        }
    }
}

/// Constants for block segmentation.
#[derive(Debug, Clone)]
pub struct BlockConfig {
    /// Substitute gap for two fragments sharing a baseline.
    pub zero_gap_substitute: f32,
    /// Gap at `block average * this` closes the block regardless of profile.
    pub intra_gap_outlier_factor: f32,
    /// Gap at `average font size * this` reads as a blank line.
    pub blank_line_font_factor: f32,
    /// Relative font-size change that closes a block.
    pub font_change_ratio: f32,
    /// Character count under which a block counts as short.
    pub short_block_chars: usize,
    /// Font-size change that closes a short block.
    pub short_block_font_change: f32,
    /// Character count above which a block counts as long.
    pub long_block_chars: usize,
    /// Character count under which a line reads as a heading candidate.
    pub short_line_chars: usize,
    /// Character count above which a following line reads as body text.
    pub long_line_chars: usize,
    /// Gap floor (multiple of mean) for the paragraph-to-heading break.
    pub heading_gap_factor: f32,
    /// Gap floor (multiple of mean) for the bold-heading break.
    pub bold_heading_gap_factor: f32,
    /// Gap floor band (multiples of mean) for the plain-heading break;
    /// scaled between the two ends by how short the candidate line is.
    pub plain_heading_gap_min: f32,
    /// Upper end of the plain-heading gap band.
    pub plain_heading_gap_max: f32,
    /// Trailing free space (in base font sizes) required for the
    /// bold-heading break.
    pub trailing_space_factor: f32,
    /// Fraction of column width the plain-heading candidate must leave free.
    pub plain_trailing_ratio: f32,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            zero_gap_substitute: 0.1,
            intra_gap_outlier_factor: 3.0,
            blank_line_font_factor: 8.0,
            font_change_ratio: 0.20,
            short_block_chars: 150,
            short_block_font_change: 0.15,
            long_block_chars: 300,
            short_line_chars: 60,
            long_line_chars: 60,
            heading_gap_factor: 1.5,
            bold_heading_gap_factor: 0.5,
            plain_heading_gap_min: 0.3,
            plain_heading_gap_max: 0.5,
            trailing_space_factor: 2.0,
            plain_trailing_ratio: 0.25,
        }
    }
}

/// Constants for heading hierarchy assignment.
#[derive(Debug, Clone)]
pub struct HeadingConfig {
    /// Smallest accepted font size; entries at or below are dropped.
    pub font_size_min: f32,
    /// Largest accepted font size; larger entries are clamped.
    pub font_size_max: f32,
    /// Relative clustering tolerance between consecutive sizes.
    pub relative_tolerance: f32,
    /// Tightened relative tolerance when the size spread is wide.
    pub relative_tolerance_tight: f32,
    /// Absolute-difference tolerance as a fraction of the group average.
    pub absolute_tolerance_ratio: f32,
    /// Tightened absolute tolerance for wide size spreads.
    pub absolute_tolerance_ratio_tight: f32,
    /// Size CV above which the tightened tolerances apply.
    pub spread_tighten_cv: f32,
    /// Singleton groups merge into a neighbor within `tolerance * this`.
    pub singleton_merge_factor: f32,
    /// Minimum text similarity for an outline match.
    pub outline_similarity_min: f32,
    /// Maximum accepted divergence between outline and clustered levels.
    pub outline_max_divergence: u8,
    /// Ratio bands of `font_size / base_font_size` mapped to levels 1..=6.
    /// Checked top-down; the first band at or below the ratio wins.
    pub ratio_bands: [(f32, u8); 6],
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            font_size_min: 0.1,
            font_size_max: 1000.0,
            relative_tolerance: 0.08,
            relative_tolerance_tight: 0.07,
            absolute_tolerance_ratio: 0.15,
            absolute_tolerance_ratio_tight: 0.12,
            spread_tighten_cv: 0.20,
            singleton_merge_factor: 1.5,
            outline_similarity_min: 0.70,
            outline_max_divergence: 2,
            ratio_bands: [
                (2.0, 1),
                (1.5, 1),
                (1.3, 2),
                (1.2, 3),
                (1.1, 4),
                (1.05, 5),
            ],
        }
    }
}
