//! Stacked streamgraph layout: layer ordering, baseline offset and
//! per-bucket `(baseline, top)` bands.

use crate::bucketer::BucketedCount;
use chrono::NaiveDate;
use scrobble_common::{Result, ScrobbleError, StackOffset, StackOrder};
use serde::Serialize;
use tracing::{debug, error, instrument};

/// One layer's band at one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StackPoint {
    /// Bucket start.
    pub bucket: NaiveDate,
    /// Raw count, zero when the category has no events in the bucket.
    pub count: u64,
    /// Lower edge of the band.
    pub baseline: f64,
    /// Upper edge, `baseline + count`.
    pub top: f64,
}

/// One category's band across every bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackLayer {
    /// Category key.
    pub key: String,
    /// Stack position, 0 at the bottom.
    pub position: usize,
    /// Count over the whole window.
    pub total: u64,
    /// One point per bucket, aligned with [`StackedSeries::buckets`].
    pub points: Vec<StackPoint>,
}

/// The laid-out streamgraph. Layers are listed bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedSeries {
    /// Bucket starts shared by every layer.
    pub buckets: Vec<NaiveDate>,
    /// Layers in stack order.
    pub layers: Vec<StackLayer>,
}

impl StackedSeries {
    /// Layer for a category key.
    pub fn layer(&self, key: &str) -> Option<&StackLayer> {
        self.layers.iter().find(|layer| layer.key == key)
    }

    /// Lowest baseline and highest top over all points.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        self.layers
            .iter()
            .flat_map(|layer| &layer.points)
            .fold(None, |acc, p| match acc {
                None => Some((p.baseline, p.top)),
                Some((lo, hi)) => Some((f64::min(lo, p.baseline), f64::max(hi, p.top))),
            })
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Layout policy pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamLayout {
    order: StackOrder,
    offset: StackOffset,
}

impl StreamLayout {
    /// Layout with the given policies.
    pub const fn new(order: StackOrder, offset: StackOffset) -> Self {
        Self { order, offset }
    }

    /// Ordering policy.
    pub const fn order(&self) -> StackOrder {
        self.order
    }

    /// Offset policy.
    pub const fn offset(&self) -> StackOffset {
        self.offset
    }

    /// Stack the given categories of `counts`.
    ///
    /// A category with no events in `counts` becomes an all-zero layer.
    /// Within each bucket the bottom layer's baseline is the offset and
    /// each following layer starts exactly where the previous one ends.
    ///
    /// A series whose length differs from the bucket count is a defect in
    /// the caller and fails loudly.
    #[instrument(level = "debug", skip_all, fields(order = ?self.order, offset = ?self.offset, layers = categories.len()))]
    pub fn layout<S: AsRef<str>>(&self, counts: &BucketedCount, categories: &[S]) -> Result<StackedSeries> {
        let buckets = counts.buckets();
        let width = buckets.len();

        let mut values: Vec<&[u64]> = Vec::with_capacity(categories.len());
        let zeros = vec![0u64; width];
        for category in categories {
            let series = counts.series(category.as_ref()).unwrap_or(zeros.as_slice());
            if series.len() != width {
                return Err(invariant_violation(format!(
                    "series '{}' has {} points for {width} buckets",
                    category.as_ref(),
                    series.len()
                )));
            }
            values.push(series);
        }

        let totals: Vec<u64> = values.iter().map(|series| series.iter().sum()).collect();
        let order = stack_order(self.order, &totals);
        let baselines = stack_offset(self.offset, &values, &order, width);

        let mut layers: Vec<StackLayer> = order
            .iter()
            .enumerate()
            .map(|(position, &i)| StackLayer {
                key: categories[i].as_ref().to_string(),
                position,
                total: totals[i],
                points: Vec::with_capacity(width),
            })
            .collect();

        for (b, &bucket) in buckets.iter().enumerate() {
            let mut acc = baselines[b];
            for (layer, &i) in layers.iter_mut().zip(&order) {
                let count = values[i][b];
                let baseline = acc;
                acc += count as f64;
                layer.points.push(StackPoint {
                    bucket,
                    count,
                    baseline,
                    top: acc,
                });
            }
        }

        debug!(buckets = width, "Stacked layers");
        Ok(StackedSeries {
            buckets: buckets.to_vec(),
            layers,
        })
    }
}

/// Fail on a broken alignment between laid-out buckets and the window.
pub fn ensure_aligned(actual: &[NaiveDate], expected: &[NaiveDate]) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(invariant_violation(format!(
            "layout has {} buckets, window spans {}",
            actual.len(),
            expected.len()
        )))
    }
}

fn invariant_violation(message: String) -> ScrobbleError {
    error!(%message, "Layout invariant violated");
    if cfg!(debug_assertions) {
        panic!("layout invariant violated: {message}");
    }
    ScrobbleError::layout_invariant(message)
}

/// Permutation of layer indices, bottom first.
///
/// Equal totals keep input order in every policy.
pub fn stack_order(order: StackOrder, totals: &[u64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..totals.len()).collect();
    match order {
        StackOrder::None => indices,
        StackOrder::Ascending => {
            indices.sort_by_key(|&i| totals[i]);
            indices
        }
        StackOrder::Descending => {
            indices.sort_by(|&a, &b| totals[b].cmp(&totals[a]));
            indices
        }
        StackOrder::InsideOut => {
            indices.sort_by(|&a, &b| totals[b].cmp(&totals[a]));
            let mut tops = Vec::new();
            let mut bottoms = Vec::new();
            let (mut top, mut bottom) = (0u64, 0u64);
            for i in indices {
                if top < bottom {
                    top += totals[i];
                    tops.push(i);
                } else {
                    bottom += totals[i];
                    bottoms.push(i);
                }
            }
            bottoms.reverse();
            bottoms.extend(tops);
            bottoms
        }
    }
}

/// Baseline of the bottom layer at every bucket.
fn stack_offset(offset: StackOffset, values: &[&[u64]], order: &[usize], width: usize) -> Vec<f64> {
    match offset {
        StackOffset::Zero => vec![0.0; width],
        StackOffset::Silhouette => (0..width)
            .map(|b| -(values.iter().map(|series| series[b]).sum::<u64>() as f64) / 2.0)
            .collect(),
        StackOffset::Wiggle => wiggle(values, order, width),
    }
}

/// Wiggle baselines are rounded to multiples of `1 / WIGGLE_GRID`. Counts
/// stacked on a baseline from this grid keep `top - baseline == count` exact.
const WIGGLE_GRID: f64 = 65536.0;

/// Minimum-wiggle baseline.
///
/// Starts at zero and moves the baseline between consecutive buckets so the
/// weighted slope of all layers, taken in stack order, is minimised. One
/// layer or one bucket has nothing to balance and stays at zero.
fn wiggle(values: &[&[u64]], order: &[usize], width: usize) -> Vec<f64> {
    let mut baseline = vec![0.0; width];
    if order.len() <= 1 || width <= 1 {
        return baseline;
    }

    let mut y = 0.0;
    for j in 1..width {
        let mut s1 = 0.0;
        let mut s2 = 0.0;
        let mut below = 0.0;
        for &i in order {
            let current = values[i][j] as f64;
            let previous = values[i][j - 1] as f64;
            let delta = current - previous;
            s2 += current * (delta / 2.0 + below);
            below += delta;
            s1 += current;
        }
        if s1 != 0.0 {
            y = ((y - s2 / s1) * WIGGLE_GRID).round() / WIGGLE_GRID;
        }
        baseline[j] = y;
    }
    baseline
}
