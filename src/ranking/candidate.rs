//! Scored candidates and the ordered candidate list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ranking::instance::{Instance, Timings};

/// An instance annotated with its composite score. Lower scores are better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub instance: Instance,
    pub score: f64,
    #[serde(default)]
    pub is_current: bool,
}

impl Candidate {
    pub fn new(instance: Instance, score: f64) -> Self {
        Self {
            instance,
            score,
            is_current: false,
        }
    }

    /// Synthetic candidate wrapping the configured default instance.
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self::new(Instance::new(url, Timings::MISSING), 0.0)
    }

    pub fn url(&self) -> &str {
        &self.instance.url
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}] {}", self.score, self.instance)
    }
}

/// Candidates ordered best-first.
///
/// Built whole by the ranking pass and published as a unit; see
/// [`crate::load_balancer::RoutingState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateList(Vec<Candidate>);

impl CandidateList {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self(candidates)
    }

    /// Single-entry list holding the default instance with score 0.
    pub fn fallback(default_instance: &str) -> Self {
        Self(vec![Candidate::placeholder(default_instance)])
    }

    /// Stable ascending sort by score; equal scores keep discovery order.
    pub fn sort_by_score(&mut self) {
        self.0.sort_by(|a, b| a.score.total_cmp(&b.score));
    }

    pub fn front(&self) -> Option<&Candidate> {
        self.0.first()
    }

    /// Clear any current marker, mark the front candidate current and
    /// return its URL.
    pub fn rotate_current(&mut self) -> Option<&str> {
        for candidate in self.0.iter_mut() {
            candidate.is_current = false;
        }
        let front = self.0.first_mut()?;
        front.is_current = true;
        Some(front.url())
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.0.iter().find(|c| c.is_current)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.0.iter()
    }

    pub fn retain<F: FnMut(&Candidate) -> bool>(&mut self, f: F) {
        self.0.retain(f);
    }
}

impl FromIterator<Candidate> for CandidateList {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, score: f64) -> Candidate {
        Candidate::new(Instance::new(url, Timings::new(1.0, 1.0, 1.0, 1.0)), score)
    }

    #[test]
    fn test_sort_is_stable() {
        let mut list: CandidateList = vec![
            candidate("https://c.example/", 3.0),
            candidate("https://a1.example/", 1.0),
            candidate("https://b.example/", 2.0),
            candidate("https://a2.example/", 1.0),
        ]
        .into_iter()
        .collect();

        list.sort_by_score();
        let urls: Vec<_> = list.iter().map(Candidate::url).collect();
        assert_eq!(
            urls,
            vec![
                "https://a1.example/",
                "https://a2.example/",
                "https://b.example/",
                "https://c.example/"
            ]
        );
    }

    #[test]
    fn test_rotate_current_is_exclusive() {
        let mut list: CandidateList = vec![
            candidate("https://a.example/", 1.0),
            candidate("https://b.example/", 2.0),
        ]
        .into_iter()
        .collect();

        // Simulate a stale marker on a non-front entry
        list.0[1].is_current = true;

        assert_eq!(list.rotate_current(), Some("https://a.example/"));
        assert_eq!(list.iter().filter(|c| c.is_current).count(), 1);
        assert_eq!(list.current().map(Candidate::url), Some("https://a.example/"));
    }

    #[test]
    fn test_rotate_on_empty_list() {
        let mut list = CandidateList::default();
        assert_eq!(list.rotate_current(), None);
    }

    #[test]
    fn test_fallback() {
        let list = CandidateList::fallback("https://paulgo.io");
        assert_eq!(list.len(), 1);
        assert_eq!(list.front().unwrap().score, 0.0);
        assert_eq!(list.front().unwrap().url(), "https://paulgo.io");
    }

    #[test]
    fn test_serialized_shape() {
        let mut list = CandidateList::new(vec![candidate("https://a.example/", 1.5)]);
        list.rotate_current();

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json[0]["url"], "https://a.example/");
        assert_eq!(json[0]["score"], 1.5);
        assert_eq!(json[0]["is_current"], true);
        assert_eq!(json[0]["timings"]["wikipedia"], 1.0);

        let back: CandidateList = serde_json::from_value(json).unwrap();
        assert_eq!(back, list);
    }
}
