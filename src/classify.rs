//! Latency and status-code classification
//!
//! Pure functions mapping a completed request onto the (status class, span
//! bucket) grid maintained by the counter store.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Coarse grouping of HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// Number of status classes (rows in the counter grid)
    pub const COUNT: usize = 4;

    pub const ALL: [StatusClass; StatusClass::COUNT] = [
        StatusClass::Success,
        StatusClass::Redirect,
        StatusClass::ClientError,
        StatusClass::ServerError,
    ];

    /// Map an HTTP status code to its class.
    ///
    /// Codes outside the 2xx-5xx ranges fold into `ServerError`.
    pub fn from_status_code(code: u16) -> StatusClass {
        match code {
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirect,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }

    /// Row index in the counter grid
    pub fn index(self) -> usize {
        match self {
            StatusClass::Success => 0,
            StatusClass::Redirect => 1,
            StatusClass::ClientError => 2,
            StatusClass::ServerError => 3,
        }
    }
}

/// One configured latency range, half-open `[lower, upper)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanBucket {
    pub lower_ms: u64,
    /// `None` marks the final unbounded bucket
    pub upper_ms: Option<u64>,
    pub label: String,
}

/// The ordered latency buckets, tiling `[0, ∞)` without gaps or overlaps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanBuckets {
    buckets: Vec<SpanBucket>,
}

impl SpanBuckets {
    /// Build buckets from the ascending list of upper boundaries.
    ///
    /// Boundaries `[50, 200, 1000]` produce `[0,50) [50,200) [200,1000)
    /// [1000,∞)`. An empty list yields the single unbounded bucket.
    pub fn from_boundaries(boundaries: &[u64]) -> Result<SpanBuckets, ConfigError> {
        let mut buckets = Vec::with_capacity(boundaries.len() + 1);
        let mut lower = 0u64;

        for &boundary in boundaries {
            if boundary <= lower {
                return Err(ConfigError::UnorderedSpanBoundaries {
                    previous: lower,
                    next: boundary,
                });
            }

            buckets.push(SpanBucket {
                lower_ms: lower,
                upper_ms: Some(boundary),
                label: format!("{}-{} ms", lower, boundary - 1),
            });
            lower = boundary;
        }

        buckets.push(SpanBucket {
            lower_ms: lower,
            upper_ms: None,
            label: format!("{lower}+ ms"),
        });

        Ok(SpanBuckets { buckets })
    }

    /// Index of the unique bucket containing `elapsed_ms`.
    ///
    /// Total over all durations: a duration exactly on a boundary falls into
    /// the higher bucket, and everything at or above the last boundary lands
    /// in the final unbounded bucket.
    pub fn classify(&self, elapsed_ms: u64) -> usize {
        for (index, bucket) in self.buckets.iter().enumerate() {
            match bucket.upper_ms {
                Some(upper) if elapsed_ms < upper => return index,
                Some(_) => continue,
                None => return index,
            }
        }

        // the last bucket is always unbounded
        self.buckets.len() - 1
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        // there is always at least the unbounded bucket
        false
    }

    pub fn get(&self, index: usize) -> Option<&SpanBucket> {
        self.buckets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpanBucket> {
        self.buckets.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|bucket| bucket.label.clone()).collect()
    }
}
