//! Shared routing state.
//!
//! # Responsibilities
//! - Hold the published candidate list
//! - Hand out the current best instance per request
//! - Provide snapshots for diagnostics
//!
//! # Design Decisions
//! - One writer (the refresh scheduler), many readers (request handlers)
//! - Lists are built outside the lock and swapped in whole
//! - The lock is held only for the swap or the flag rotation

use parking_lot::Mutex;

use crate::ranking::CandidateList;

/// The candidate list the redirector reads from.
#[derive(Debug, Default)]
pub struct RoutingState {
    candidates: Mutex<CandidateList>,
}

impl RoutingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with the default instance, marked current, so requests
    /// have a target before the first refresh completes.
    pub fn seeded(default_instance: &str) -> Self {
        let mut list = CandidateList::fallback(default_instance);
        list.rotate_current();
        Self {
            candidates: Mutex::new(list),
        }
    }

    /// Replace the published list.
    pub fn publish(&self, list: CandidateList) {
        let previous = std::mem::replace(&mut *self.candidates.lock(), list);
        // Dropped outside the lock
        drop(previous);
    }

    /// URL of the best candidate, marking it current. `None` only before the
    /// state has been seeded.
    pub fn current_best(&self) -> Option<String> {
        self.candidates.lock().rotate_current().map(str::to_string)
    }

    /// Copy of the published list, best first.
    pub fn snapshot(&self) -> CandidateList {
        self.candidates.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.candidates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{Candidate, Instance, Timings};
    use std::sync::Arc;

    fn list(urls: &[&str]) -> CandidateList {
        urls.iter()
            .enumerate()
            .map(|(i, url)| {
                Candidate::new(Instance::new(*url, Timings::new(1.0, 1.0, 1.0, 1.0)), i as f64)
            })
            .collect()
    }

    #[test]
    fn test_unseeded_has_no_target() {
        let state = RoutingState::new();
        assert!(state.is_empty());
        assert_eq!(state.current_best(), None);
    }

    #[test]
    fn test_seeded_placeholder_is_current() {
        let state = RoutingState::seeded("https://paulgo.io");
        let snapshot = state.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.front().unwrap().is_current);
        assert_eq!(snapshot.front().unwrap().score, 0.0);
        assert_eq!(state.current_best().as_deref(), Some("https://paulgo.io"));
    }

    #[test]
    fn test_publish_swaps_whole_list() {
        let state = RoutingState::seeded("https://paulgo.io");
        state.publish(list(&["https://a.example/", "https://b.example/"]));

        assert_eq!(state.len(), 2);
        assert_eq!(state.current_best().as_deref(), Some("https://a.example/"));

        let snapshot = state.snapshot();
        let current: Vec<_> = snapshot.iter().filter(|c| c.is_current).map(Candidate::url).collect();
        assert_eq!(current, vec!["https://a.example/"]);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let state = Arc::new(RoutingState::seeded("https://paulgo.io"));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let url = state.current_best().unwrap();
                        assert!(url.starts_with("https://"));
                        let snapshot = state.snapshot();
                        assert!(snapshot.iter().filter(|c| c.is_current).count() <= 1);
                    }
                })
            })
            .collect();

        for i in 0..100 {
            if i % 2 == 0 {
                state.publish(list(&["https://a.example/", "https://b.example/"]));
            } else {
                state.publish(list(&["https://c.example/"]));
            }
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert!(!state.is_empty());
    }
}
