//! The ranking pass.
//!
//! # Responsibilities
//! - Drop instances with an outlying or missing sample in any dimension
//! - Score survivors by weighted latency
//! - Verify survivors are reachable (light probe, intensive re-check)
//! - Order best-first

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::AdvancedConfig;
use crate::health::{probe_all, ProbeTier, Prober};
use crate::ranking::candidate::{Candidate, CandidateList};
use crate::ranking::instance::{InstanceSet, Timings};
use crate::ranking::outlier::is_outlier;

/// Ranks an [`InstanceSet`] into a [`CandidateList`].
pub struct Judge {
    weights: Timings,
    outlier_multiplier: f64,
    prober: Arc<dyn Prober>,
}

impl Judge {
    pub fn new(advanced: &AdvancedConfig, prober: Arc<dyn Prober>) -> Self {
        Self {
            weights: Timings::new(
                advanced.initial_resp_weight,
                advanced.search_resp_weight,
                advanced.google_search_resp_weight,
                advanced.wikipedia_search_resp_weight,
            ),
            outlier_multiplier: advanced.outlier_multiplier,
            prober,
        }
    }

    /// Filter, score, verify and sort. May return an empty list; the caller
    /// substitutes the default instance.
    pub async fn rank(&self, instances: &InstanceSet) -> CandidateList {
        let scored = self.score_candidates(instances);
        tracing::debug!(
            instances = instances.len(),
            scored = scored.len(),
            "Outliers removed"
        );

        let mut verified = self.verify(scored).await;
        verified.sort_by_score();
        verified
    }

    /// Outlier filtering and scoring, in discovery order.
    pub fn score_candidates(&self, instances: &InstanceSet) -> CandidateList {
        let means = instances.means().as_array();
        let weights = self.weights.as_array();

        instances
            .iter()
            .filter(|instance| {
                let samples = instance.timings.as_array();
                let outlier = (0..4).any(|dim| {
                    is_outlier(means[dim], samples[dim], weights[dim], self.outlier_multiplier)
                });
                if outlier {
                    tracing::trace!(url = %instance.url, timings = %instance.timings, "Dropping outlier");
                }
                !outlier
            })
            .map(|instance| Candidate::new(instance.clone(), self.score(&instance.timings)))
            .collect()
    }

    /// Sum of `sample / weight` over the four dimensions, floored to two
    /// decimal places. Lower is better.
    pub fn score(&self, timings: &Timings) -> f64 {
        let raw: f64 = timings
            .as_array()
            .iter()
            .zip(self.weights.as_array())
            .map(|(sample, weight)| sample / weight)
            .sum();
        (raw * 100.0).floor() / 100.0
    }

    /// Keep candidates that answer the light probe, or failing that the
    /// intensive one.
    pub async fn verify(&self, mut candidates: CandidateList) -> CandidateList {
        if candidates.is_empty() {
            return candidates;
        }

        let urls: Vec<String> = candidates.iter().map(|c| c.url().to_string()).collect();
        let mut alive: HashSet<String> = probe_all(&self.prober, &urls, ProbeTier::Light)
            .await
            .into_iter()
            .filter(|r| r.is_alive)
            .map(|r| r.url)
            .collect();

        let retry: Vec<String> = urls.into_iter().filter(|u| !alive.contains(u)).collect();
        if !retry.is_empty() {
            tracing::info!(hosts = retry.len(), "Re-checking unresponsive hosts");
            for result in probe_all(&self.prober, &retry, ProbeTier::Intensive).await {
                if result.is_alive {
                    alive.insert(result.url);
                } else {
                    tracing::info!(url = %result.url, "Instance unreachable, excluding");
                }
            }
        }

        candidates.retain(|c| alive.contains(c.url()));
        candidates
    }
}
