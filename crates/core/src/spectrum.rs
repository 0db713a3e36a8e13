use crate::error::{Result, SpectrumError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Upper bound on the number of buckets in one spectrum.
///
/// A tiny minimum-interval weight would otherwise ask for an unbounded
/// allocation.
pub const MAX_BUCKETS: usize = 1 << 16;

/// How a sample sitting exactly on a bucket boundary is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// `lo <= x < hi`, with the last bucket closed on the right.
    /// Every sample is counted exactly once.
    #[default]
    HalfOpen,
    /// `lo <= x <= hi` on every bucket. A value on a shared boundary is
    /// counted in both neighbours, so raw counts can sum to more than N.
    Inclusive,
}

impl FromStr for BoundaryMode {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "halfopen" | "half-open" => Ok(Self::HalfOpen),
            "inclusive" => Ok(Self::Inclusive),
            other => Err(SpectrumError::InvalidParameter(format!(
                "unknown boundary mode '{other}' (expected 'halfopen' or 'inclusive')"
            ))),
        }
    }
}

/// Tuning knobs for [`build_spectrum`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumParams {
    /// Fraction of the full value range below which width shrinking stops.
    pub min_interval_weight: f64,
    /// Divisor applied to the candidate width on every shrink step.
    pub split_factor: f64,
    pub boundary: BoundaryMode,
}

impl SpectrumParams {
    pub fn new(min_interval_weight: f64, split_factor: f64) -> Self {
        Self {
            min_interval_weight,
            split_factor,
            boundary: BoundaryMode::default(),
        }
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Reject parameters that would make the width search degenerate.
    ///
    /// A split factor `<= 1` never shrinks the width, so the search would
    /// not terminate; a weight outside `(0, 1)` yields either a single
    /// bucket or an unbounded bucket count.
    pub fn validate(&self) -> Result<()> {
        let w = self.min_interval_weight;
        if !w.is_finite() || w <= 0.0 || w >= 1.0 {
            return Err(SpectrumError::InvalidParameter(format!(
                "minimum-interval weight must lie in (0, 1), got {w}"
            )));
        }
        let s = self.split_factor;
        if !s.is_finite() || s <= 1.0 {
            return Err(SpectrumError::InvalidParameter(format!(
                "split factor must be a finite value > 1, got {s}"
            )));
        }
        Ok(())
    }
}

/// One interval of the value range together with its occupancy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub lo: f64,
    pub hi: f64,
    /// Samples counted into this bucket.
    pub count: u64,
    /// `count` minus the smallest count of the spectrum.
    pub normalized: u64,
}

impl Bucket {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// Whether `x` belongs to this bucket under `mode`.
    ///
    /// `closed_right` marks the last bucket, which also takes `x == hi`
    /// when half-open.
    #[must_use]
    pub fn contains(&self, x: f64, mode: BoundaryMode, closed_right: bool) -> bool {
        match mode {
            BoundaryMode::HalfOpen => {
                x >= self.lo && (x < self.hi || (closed_right && x <= self.hi))
            }
            BoundaryMode::Inclusive => x >= self.lo && x <= self.hi,
        }
    }
}

/// Ordered, contiguous buckets of equal width covering `[min, max]` of the
/// input samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    width: f64,
    boundary: BoundaryMode,
    buckets: Vec<Bucket>,
}

impl Spectrum {
    /// Common width of every bucket. Zero when all samples are equal.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bucket> {
        self.buckets.iter()
    }

    /// Sum of the raw (pre-normalisation) counts.
    pub fn total_raw(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn min_normalized(&self) -> u64 {
        self.buckets.iter().map(|b| b.normalized).min().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Spectrum {
    type Item = &'a Bucket;
    type IntoIter = std::slice::Iter<'a, Bucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// Pick the bucket width for a value range.
///
/// Starting from the full range, the width is divided by `split_factor`
/// until it drops to or below `min_interval_weight * range`; the last width
/// still above that threshold is returned. A zero range yields zero.
pub fn bucket_width(range: f64, min_interval_weight: f64, split_factor: f64) -> f64 {
    let limit = min_interval_weight * range;
    let mut width = range;
    let mut previous = range;
    while width > limit {
        previous = width;
        width /= split_factor;
    }
    previous
}

/// Summarise `values` into an adaptive histogram.
pub fn build_spectrum(values: &[f64], params: &SpectrumParams) -> Result<Spectrum> {
    params.validate()?;
    if values.is_empty() {
        return Err(SpectrumError::EmptySamples);
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(SpectrumError::InvalidParameter(format!(
            "sample {bad} is not a finite number"
        )));
    }

    let (vmin, vmax) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = (vmax - vmin).abs();
    let width = bucket_width(range, params.min_interval_weight, params.split_factor);
    let slots = if width > 0.0 {
        let wanted = (range / width).ceil().max(1.0);
        if wanted > MAX_BUCKETS as f64 {
            return Err(SpectrumError::InvalidParameter(format!(
                "minimum-interval weight {} needs {wanted} buckets (limit {MAX_BUCKETS})",
                params.min_interval_weight
            )));
        }
        wanted as usize
    } else {
        1
    };

    // Each upper bound is reused as the next lower bound so neighbouring
    // buckets share their edge exactly.
    let mut buckets = Vec::with_capacity(slots);
    let mut lo = vmin;
    for _ in 0..slots {
        let hi = lo + width;
        buckets.push(Bucket {
            lo,
            hi,
            count: 0,
            normalized: 0,
        });
        lo = hi;
    }

    let last = buckets.len() - 1;
    for &x in values {
        match params.boundary {
            BoundaryMode::HalfOpen => {
                let idx = buckets.partition_point(|b| b.hi <= x).min(last);
                buckets[idx].count += 1;
            }
            BoundaryMode::Inclusive => {
                for (i, bucket) in buckets.iter_mut().enumerate() {
                    if bucket.contains(x, BoundaryMode::Inclusive, i == last) {
                        bucket.count += 1;
                    }
                }
            }
        }
    }

    let floor = buckets.iter().map(|b| b.count).min().unwrap_or(0);
    for bucket in &mut buckets {
        bucket.normalized = bucket.count - floor;
    }

    tracing::debug!(
        samples = values.len(),
        buckets = buckets.len(),
        width,
        "spectrum built over [{vmin}, {vmax}]"
    );

    Ok(Spectrum {
        width,
        boundary: params.boundary,
        buckets,
    })
}
