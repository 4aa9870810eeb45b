//! Vertical strip density analysis.
//!
//! Divides the page width into fixed-width buckets, measures how much text
//! lands in each, and scans for runs of empty or sparse buckets wide enough
//! to be column gaps. The midpoints of qualifying runs become candidate
//! column boundaries for the visual column-detection strategy.

use crate::config::StripConfig;
use crate::geometry::interval_overlap;
use crate::layout::metrics::DocumentMetrics;
use crate::layout::text_line::{PositionedLine, Viewport};
use std::collections::HashSet;

/// A fixed-width vertical slice of the page.
#[derive(Debug, Clone)]
pub struct Strip {
    /// Left edge of the bucket
    pub x_start: f32,
    /// Right edge of the bucket
    pub x_end: f32,
    /// Number of lines whose span intersects the bucket
    pub line_count: usize,
    /// Accumulated horizontal overlap of those lines
    pub total_line_width: f32,
    /// Fraction of the page height covered by the bucket's lines
    pub coverage_ratio: f32,
    /// Stacking density: accumulated width per bucket width
    pub density: f32,
    /// Whether the bucket holds enough text to anchor a column
    pub is_dense: bool,
    /// Whether the bucket holds no text at all
    pub is_empty: bool,
}

impl Strip {
    /// Whether the bucket is empty or only weakly covered.
    pub fn is_empty_or_sparse(&self) -> bool {
        !self.is_dense
    }
}

/// The page's strip profile: all buckets plus the derived geometry.
#[derive(Debug, Clone)]
pub struct StripProfile {
    /// The buckets, left to right
    pub strips: Vec<Strip>,
    /// Width of each bucket
    pub bucket_width: f32,
}

impl StripProfile {
    /// Build the strip profile of one page.
    ///
    /// Bucket width is `max(bucket_min_width, base_font_size * 0.5)`. Each
    /// line adds its horizontal overlap to every bucket it intersects, and
    /// marks the bucket's quantized-Y coverage row.
    pub fn build(
        lines: &[&PositionedLine],
        viewport: Viewport,
        metrics: &DocumentMetrics,
        config: &StripConfig,
    ) -> Self {
        let bucket_width = config
            .bucket_min_width
            .max(metrics.base_font_size * config.bucket_font_factor);
        let bucket_count = ((viewport.width / bucket_width).ceil() as usize).max(1);

        let mut line_counts = vec![0usize; bucket_count];
        let mut widths = vec![0.0f32; bucket_count];
        let mut coverage: Vec<HashSet<i64>> = vec![HashSet::new(); bucket_count];

        for line in lines.iter().filter(|l| l.has_valid_geometry()) {
            let row = (line.y / config.coverage_quantum).round() as i64;
            let first = ((line.x / bucket_width).floor().max(0.0) as usize).min(bucket_count - 1);
            let last = ((line.right() / bucket_width).floor().max(0.0) as usize)
                .min(bucket_count - 1);

            for bucket in first..=last {
                let b0 = bucket as f32 * bucket_width;
                let overlap = interval_overlap(line.x, line.right(), b0, b0 + bucket_width);
                if overlap > 0.0 {
                    line_counts[bucket] += 1;
                    widths[bucket] += overlap;
                    coverage[bucket].insert(row);
                }
            }
        }

        let occupied = line_counts.iter().filter(|&&c| c > 0).count().max(1);
        let average_line_count =
            line_counts.iter().sum::<usize>() as f32 / occupied as f32;
        let max_density = widths
            .iter()
            .map(|w| w / bucket_width)
            .fold(0.0f32, f32::max);
        let page_height = viewport.height.max(1.0);

        let strips = (0..bucket_count)
            .map(|i| {
                let line_count = line_counts[i];
                let density = widths[i] / bucket_width;
                let coverage_ratio =
                    coverage[i].len() as f32 * config.coverage_quantum / page_height;

                let is_dense = line_count as f32
                    >= config.dense_line_count_factor * average_line_count
                    || coverage_ratio >= config.dense_coverage_ratio
                    || (line_count > 0 && coverage_ratio >= config.weak_coverage_ratio)
                    || (max_density > 0.0 && density >= config.dense_density_ratio * max_density);

                Strip {
                    x_start: i as f32 * bucket_width,
                    x_end: (i + 1) as f32 * bucket_width,
                    line_count,
                    total_line_width: widths[i],
                    coverage_ratio,
                    density,
                    // A bucket with no lines can never be dense, whatever
                    // the averages say
                    is_dense: is_dense && line_count > 0,
                    is_empty: line_count == 0,
                }
            })
            .collect();

        Self {
            strips,
            bucket_width,
        }
    }

    /// Find candidate column boundaries: midpoints of qualifying gap runs.
    ///
    /// A run of empty/sparse buckets qualifies when it is at least
    /// `max(base_font_size * 1.2, bucket_width * 2)` wide and either sits
    /// between two dense buckets or is wide enough on its own
    /// (`base_font_size * 2.5`). A trailing run at the right page edge
    /// qualifies when its left neighbor is dense. Boundaries closer than
    /// one base font size to the previous one are dropped as duplicates.
    pub fn column_boundaries(
        &self,
        metrics: &DocumentMetrics,
        config: &StripConfig,
    ) -> Vec<f32> {
        let base = metrics.base_font_size;
        let min_gap_width = (base * config.gap_font_factor)
            .max(self.bucket_width * config.gap_bucket_factor);
        let wide_gap_width = base * config.wide_gap_font_factor;

        let mut boundaries = Vec::new();
        let mut run_start: Option<usize> = None;

        let flush = |start: usize, end: usize, boundaries: &mut Vec<f32>| {
            // `end` is exclusive
            let left_dense = start > 0 && self.strips[start - 1].is_dense;
            let right_dense = end < self.strips.len() && self.strips[end].is_dense;
            let at_right_edge = end == self.strips.len();

            let width = (end - start) as f32 * self.bucket_width;
            if width < min_gap_width {
                return;
            }

            let qualifies = (left_dense && right_dense)
                || width >= wide_gap_width
                || (at_right_edge && left_dense);
            if !qualifies {
                return;
            }

            let midpoint = (self.strips[start].x_start + self.strips[end - 1].x_end) / 2.0;
            if boundaries
                .last()
                .is_some_and(|&prev: &f32| (midpoint - prev).abs() < base)
            {
                return;
            }
            boundaries.push(midpoint);
        };

        for (i, strip) in self.strips.iter().enumerate() {
            if strip.is_empty_or_sparse() {
                run_start.get_or_insert(i);
            } else if let Some(start) = run_start.take() {
                flush(start, i, &mut boundaries);
            }
        }
        if let Some(start) = run_start {
            flush(start, self.strips.len(), &mut boundaries);
        }

        boundaries
    }
}
