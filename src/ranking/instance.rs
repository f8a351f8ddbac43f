//! Instances and their latency samples.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel for a latency the feed did not report.
pub const MISSING: f64 = -1.0;

/// Map an effectively-unset feed value (zero within one ULP of 1.0) to
/// [`MISSING`]; any other value passes through unchanged.
pub fn missing_if_unset(value: f64) -> f64 {
    if value.abs() <= f64::EPSILON {
        MISSING
    } else {
        value
    }
}

/// Response times of one instance, in seconds.
///
/// Also used for per-dimension population means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Initial page load.
    pub initial: f64,
    /// Generic search.
    pub search: f64,
    /// Search served by Google.
    pub google: f64,
    /// Search served by Wikipedia.
    pub wikipedia: f64,
}

impl Timings {
    /// All four dimensions missing.
    pub const MISSING: Timings = Timings {
        initial: MISSING,
        search: MISSING,
        google: MISSING,
        wikipedia: MISSING,
    };

    pub fn new(initial: f64, search: f64, google: f64, wikipedia: f64) -> Self {
        Self {
            initial,
            search,
            google,
            wikipedia,
        }
    }

    /// Samples in dimension order: initial, search, google, wikipedia.
    pub fn as_array(&self) -> [f64; 4] {
        [self.initial, self.search, self.google, self.wikipedia]
    }

    pub fn from_array([initial, search, google, wikipedia]: [f64; 4]) -> Self {
        Self::new(initial, search, google, wikipedia)
    }
}

impl fmt::Display for Timings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "( I={:.2}, S={:.2}, G={:.2}, W={:.2} )",
            self.initial, self.search, self.google, self.wikipedia
        )
    }
}

/// A backend endpoint discovered from the health feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub url: String,
    pub timings: Timings,
}

impl Instance {
    pub fn new(url: impl Into<String>, timings: Timings) -> Self {
        Self {
            url: url.into(),
            timings,
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\": {}", self.url, self.timings)
    }
}

/// Instances that passed the static policy filters in one ingestion pass.
///
/// Kept in discovery order. A URL is accepted at most once.
#[derive(Debug, Clone, Default)]
pub struct InstanceSet {
    instances: Vec<Instance>,
    seen: HashSet<String>,
}

impl InstanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance. Returns false (and keeps the first entry) when the
    /// URL is already present.
    pub fn push(&mut self, instance: Instance) -> bool {
        if !self.seen.insert(instance.url.clone()) {
            tracing::warn!(url = %instance.url, "Duplicate instance in feed, keeping first entry");
            return false;
        }
        self.instances.push(instance);
        true
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.instances.iter()
    }

    /// Per-dimension mean over positive samples only.
    ///
    /// Each dimension is averaged independently; a dimension with no positive
    /// sample has mean 0.
    pub fn means(&self) -> Timings {
        let mut sums = [0.0f64; 4];
        let mut counts = [0u32; 4];

        for instance in &self.instances {
            for (dim, sample) in instance.timings.as_array().into_iter().enumerate() {
                if sample > 0.0 {
                    sums[dim] += sample;
                    counts[dim] += 1;
                }
            }
        }

        let mut means = [0.0f64; 4];
        for dim in 0..4 {
            if counts[dim] > 0 {
                means[dim] = sums[dim] / f64::from(counts[dim]);
            }
        }
        Timings::from_array(means)
    }
}

impl FromIterator<Instance> for InstanceSet {
    fn from_iter<I: IntoIterator<Item = Instance>>(iter: I) -> Self {
        let mut set = InstanceSet::new();
        for instance in iter {
            set.push(instance);
        }
        set
    }
}

impl<'a> IntoIterator for &'a InstanceSet {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}
